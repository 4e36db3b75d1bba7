//! Console summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::model::metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
use crate::model::selection::{CvSummary, GridPoint, ModelResult};
use crate::pipeline::aggregate::GroupStat;
use crate::pipeline::features::FeatureSummary;
use crate::pipeline::labels::LabelSummary;
use crate::pipeline::TargetSummary;
use crate::report::dashboard::DepartmentSummary;
use crate::report::risk::{BucketCount, CostAnalysis, FactorComparison, LetGoShare};
use crate::utils::format_currency;

fn section_title(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| Cell::new(l).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(labels: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(labels));
    table
}

fn right(value: impl ToString) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

fn print_table(table: &Table) {
    // Indent the table
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn auc_color(auc: f64) -> Color {
    if auc >= 0.8 {
        Color::Green
    } else if auc >= 0.7 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Attrition class balance of the loaded dataset
pub fn display_target_summary(summary: &TargetSummary) {
    section_title("🎯", "ATTRITION DISTRIBUTION");
    let mut table = new_table(&["Status", "Employees", "Share"]);
    table.add_row(vec![
        Cell::new("Stayed (No)"),
        right(summary.non_events),
        right(format!("{:.2}%", summary.non_event_pct())),
    ]);
    table.add_row(vec![
        Cell::new("Left (Yes)").fg(Color::Red),
        right(summary.events),
        right(format!("{:.2}%", summary.event_pct())),
    ]);
    print_table(&table);
}

/// Columns with null values
pub fn display_missing_values(missing: &[(String, usize)]) {
    section_title("🕳️", "MISSING VALUES");
    let mut table = new_table(&["Column", "Nulls"]);
    for (name, count) in missing {
        table.add_row(vec![Cell::new(name), right(count).fg(Color::Red)]);
    }
    print_table(&table);
}

/// Column count per data type
pub fn display_dtype_summary(dtypes: &[(String, usize)]) {
    let mut table = new_table(&["Data Type", "Columns"]);
    for (dtype, count) in dtypes {
        table.add_row(vec![Cell::new(dtype), right(count)]);
    }
    print_table(&table);
}

/// Attrition rate per group, as printed during exploration
pub fn display_group_rates(title: &str, group_header: &str, stats: &[GroupStat]) {
    section_title("📊", title);
    let mut table = new_table(&[group_header, "Employees", "Attrition Rate"]);
    for s in stats {
        table.add_row(vec![
            Cell::new(&s.group),
            right(s.count),
            right(format!("{:.2}%", s.mean)),
        ]);
    }
    print_table(&table);
}

/// Engineered features with their statistics and target correlation
pub fn display_feature_summary(features: &[FeatureSummary]) {
    section_title("🧪", "ENGINEERED FEATURES");
    let mut table = new_table(&["Feature", "Mean", "Std", "Corr. w/ Target"]);
    for f in features {
        let corr = f
            .target_correlation
            .map_or_else(|| "n/a".to_string(), |c| format!("{:+.4}", c));
        table.add_row(vec![
            Cell::new(&f.name),
            right(format!("{:.2}", f.mean)),
            right(format!("{:.2}", f.std)),
            right(corr),
        ]);
    }
    print_table(&table);
}

/// Keep / Let Go counts of the synthesized labels
pub fn display_label_summary(summary: &LabelSummary) {
    section_title("🏷️", "DECISION LABELS");
    let mut table = new_table(&["Decision", "Employees", "Share"]);
    let total = (summary.keep + summary.let_go).max(1) as f64;
    table.add_row(vec![
        Cell::new("Keep").fg(Color::Green),
        right(summary.keep),
        right(format!("{:.1}%", summary.keep as f64 / total * 100.0)),
    ]);
    table.add_row(vec![
        Cell::new("Let Go").fg(Color::Red),
        right(summary.let_go),
        right(format!("{:.1}%", summary.let_go_pct())),
    ]);
    print_table(&table);
    println!(
        "      {} {}",
        style("Potential annual cost savings:").dim(),
        style(format_currency(summary.potential_savings)).green().bold()
    );
}

/// Test-split AUC of every evaluated candidate, best highlighted
pub fn display_model_comparison(results: &[ModelResult], best: usize) {
    section_title("🏆", "MODEL COMPARISON");
    let mut table = new_table(&["Model", "ROC AUC", "Accuracy", "F1 (positive)"]);
    for (i, r) in results.iter().enumerate() {
        let name = if i == best {
            Cell::new(format!("★ {}", r.name))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(&r.name)
        };
        table.add_row(vec![
            name,
            right(format!("{:.4}", r.auc)).fg(auc_color(r.auc)),
            right(format!("{:.4}", r.report.accuracy)),
            right(format!("{:.4}", r.report.positive.f1)),
        ]);
    }
    print_table(&table);
}

fn metrics_row(label: &str, m: &ClassMetrics) -> Vec<Cell> {
    vec![
        Cell::new(label),
        right(format!("{:.2}", m.precision)),
        right(format!("{:.2}", m.recall)),
        right(format!("{:.2}", m.f1)),
        right(m.support),
    ]
}

/// Per-class precision/recall/F1 plus the confusion matrix
pub fn display_classification_report(
    report: &ClassificationReport,
    confusion: &ConfusionMatrix,
    negative_label: &str,
    positive_label: &str,
) {
    let mut table = new_table(&["Class", "Precision", "Recall", "F1", "Support"]);
    table.add_row(metrics_row(negative_label, &report.negative));
    table.add_row(metrics_row(positive_label, &report.positive));
    table.add_row(vec![
        Cell::new("accuracy").add_attribute(Attribute::Italic),
        right(""),
        right(""),
        right(format!("{:.2}", report.accuracy)),
        right(report.weighted_avg.support),
    ]);
    table.add_row(metrics_row("macro avg", &report.macro_avg));
    table.add_row(metrics_row("weighted avg", &report.weighted_avg));
    print_table(&table);

    let mut cm = new_table(&["", &format!("Pred {}", negative_label), &format!("Pred {}", positive_label)]);
    cm.add_row(vec![
        Cell::new(format!("True {}", negative_label)),
        right(confusion.true_negative),
        right(confusion.false_positive),
    ]);
    cm.add_row(vec![
        Cell::new(format!("True {}", positive_label)),
        right(confusion.false_negative),
        right(confusion.true_positive),
    ]);
    print_table(&cm);
}

/// Fold scores of a cross-validation run
pub fn display_cv_summary(cv: &CvSummary) {
    let scores: Vec<String> = cv.scores.iter().map(|s| format!("{:.4}", s)).collect();
    println!(
        "      {} [{}]",
        style(format!("{} CV ROC AUC scores:", cv.model)).dim(),
        scores.join(", ")
    );
    println!(
        "      {} {:.4} ± {:.4}",
        style("Mean CV ROC AUC:").dim(),
        style(cv.mean).yellow().bold(),
        cv.std
    );
}

/// The best `limit` grid points by mean CV AUC
pub fn display_grid_points(points: &[GridPoint], limit: usize) {
    let mut ranked: Vec<&GridPoint> = points.iter().collect();
    ranked.sort_by(|a, b| b.mean_auc.total_cmp(&a.mean_auc));

    let mut table = new_table(&["Parameters", "Mean CV AUC", "Std"]);
    for p in ranked.into_iter().take(limit) {
        table.add_row(vec![
            Cell::new(&p.params),
            right(format!("{:.4}", p.mean_auc)).fg(auc_color(p.mean_auc)),
            right(format!("{:.4}", p.std_auc)),
        ]);
    }
    print_table(&table);
}

/// Ranked feature importances (or mean |SHAP| values)
pub fn display_top_features(title: &str, ranked: &[(String, f64)], limit: usize) {
    section_title("🔑", title);
    let mut table = new_table(&["#", "Feature", "Importance"]);
    for (i, (name, value)) in ranked.iter().take(limit).enumerate() {
        table.add_row(vec![right(i + 1), Cell::new(name), right(format!("{:.4}", value))]);
    }
    print_table(&table);
}

/// Employees per risk bucket
pub fn display_risk_distribution(title: &str, buckets: &[BucketCount]) {
    section_title("🚦", title);
    let colors = [Color::Green, Color::Yellow, Color::Red];
    let mut table = new_table(&["Category", "Employees", "Share"]);
    for (i, b) in buckets.iter().enumerate() {
        table.add_row(vec![
            Cell::new(&b.label).fg(colors[i.min(colors.len() - 1)]),
            right(b.count),
            right(format!("{:.1}%", b.percentage)),
        ]);
    }
    print_table(&table);
}

/// Mean predicted probability per group
pub fn display_group_risk(title: &str, group_header: &str, stats: &[GroupStat], limit: usize) {
    section_title("🏢", title);
    let mut table = new_table(&[group_header, "Average Risk", "Employees"]);
    for s in stats.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&s.group),
            right(format!("{:.4}", s.mean)),
            right(s.count),
        ]);
    }
    print_table(&table);
}

/// High-risk employees compared with the whole workforce
pub fn display_factor_comparisons(comparisons: &[FactorComparison]) {
    section_title("🔍", "HIGH RISK VS OVERALL");
    let mut table = new_table(&["Factor", "Overall", "High Risk", "Difference"]);
    for c in comparisons {
        let unit = if c.is_percentage { "%" } else { "" };
        table.add_row(vec![
            Cell::new(&c.factor),
            right(format!("{:.2}{}", c.overall, unit)),
            right(format!("{:.2}{}", c.high_risk, unit)),
            right(format!("{:+.1}%", c.difference_pct)),
        ]);
    }
    print_table(&table);
}

/// Let Go percentage per group
pub fn display_let_go_shares(title: &str, group_header: &str, shares: &[LetGoShare]) {
    section_title("🏢", title);
    let mut table = new_table(&[group_header, "Employees", "Let Go %"]);
    for s in shares {
        table.add_row(vec![
            Cell::new(&s.group),
            right(s.employees),
            right(format!("{:.1}%", s.let_go_pct)),
        ]);
    }
    print_table(&table);
}

/// Annual cost before and after the recommendations
pub fn display_cost_analysis(cost: &CostAnalysis) {
    section_title("💰", "COST ANALYSIS");
    let mut table = new_table(&["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Current Annual Cost"),
        right(format_currency(cost.current_cost)),
    ]);
    table.add_row(vec![
        Cell::new("Cost After Optimization"),
        right(format_currency(cost.retained_cost)),
    ]);
    table.add_row(vec![
        Cell::new("Annual Savings").add_attribute(Attribute::Bold),
        right(format!(
            "{} ({:.2}%)",
            format_currency(cost.savings),
            cost.savings_pct
        ))
        .fg(Color::Green)
        .add_attribute(Attribute::Bold),
    ]);
    print_table(&table);
}

/// Department aggregates of the dashboard document
pub fn display_department_summaries(departments: &[DepartmentSummary]) {
    section_title("🏢", "DEPARTMENTS");
    let mut table = new_table(&[
        "Department",
        "Keep",
        "Let Go",
        "Attrition %",
        "Satisfaction",
        "Performance",
        "Savings",
    ]);
    for d in departments {
        table.add_row(vec![
            Cell::new(&d.name),
            right(d.keep),
            right(d.let_go),
            right(format!("{:.1}%", d.attrition_rate)),
            right(format!("{:.1}", d.avg_satisfaction)),
            right(format!("{:.1}", d.avg_performance)),
            right(format_currency(d.cost_savings)),
        ]);
    }
    print_table(&table);
}

/// Output artifacts written by a run
pub fn display_artifacts(paths: &[std::path::PathBuf]) {
    section_title("📁", "OUTPUT FILES");
    for p in paths {
        println!("      {} {}", style("•").dim(), p.display());
    }
}
