//! CLI module - argument parsing and run configuration

mod args;
mod config;

pub use args::{scored_output_path, Cli, Commands, TrainArgs, DEFAULT_INPUT};
pub use config::RunConfig;
