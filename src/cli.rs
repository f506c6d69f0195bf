//! Command-line interface definition.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

use crate::explorer::{ExploreConfig, DEFAULT_QUEUE_CAPACITY, MAX_WORKERS};

/// How the grid is shown while and after exploring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RenderMode {
    /// Print only the result message.
    #[value(name = "none")]
    Hidden,
    /// Print the explored grid once the search is over.
    #[default]
    Final,
    /// Print the grid after every step, separated by blank lines.
    Steps,
    /// Animate the search in a full-screen terminal view.
    Tui,
}

/// Concurrent maze explorer.
///
/// Explores a maze from its entrance (`e`) until some explorer reaches an exit (`s`), walking
/// open cells (`x`) and marking them visited (`.`). Branch points are explored in parallel.
#[derive(Clone, Debug, Parser)]
#[command(name = "maze-runner", version, about, long_about = None)]
pub struct Cli {
    /// Maze description file: a `rows cols` header followed by one line per row.
    #[arg(value_name = "MAZE_FILE")]
    pub maze: PathBuf,

    /// Number of explorer threads.
    #[arg(
        short,
        long,
        value_name = "NUM",
        default_value_t = ExploreConfig::default().workers,
        value_parser = parse_workers
    )]
    pub workers: usize,

    /// Maximum number of branches waiting for a free explorer.
    #[arg(
        long,
        value_name = "NUM",
        default_value_t = DEFAULT_QUEUE_CAPACITY,
        value_parser = parse_capacity
    )]
    pub queue_capacity: usize,

    /// How to show the grid.
    #[arg(long, value_enum, default_value_t = RenderMode::Final)]
    pub render: RenderMode,

    /// Pause after each rendered step, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub delay_ms: u64,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Builds the search configuration selected on the command line.
    pub fn explore_config(&self) -> ExploreConfig {
        ExploreConfig::default()
            .with_workers(self.workers)
            .with_queue_capacity(self.queue_capacity)
            .with_frame_delay(Duration::from_millis(self.delay_ms))
    }
}

/// Parses a worker count between one and [`MAX_WORKERS`].
fn parse_workers(value: &str) -> Result<usize, String> {
    let workers: usize = value
        .parse()
        .map_err(|_err| format!("'{value}' is not a number"))?;

    if (1..=MAX_WORKERS).contains(&workers) {
        Ok(workers)
    } else {
        Err(format!("must be between 1 and {MAX_WORKERS}"))
    }
}

/// Parses a queue capacity of at least one.
fn parse_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(capacity) => Ok(capacity),
        Err(_err) => Err(format!("'{value}' is not a number")),
    }
}
