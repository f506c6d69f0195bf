//! Core application flow: load a maze, explore it and report the result.

use std::{
    io::{self, Write},
    process::ExitCode,
};

use color_eyre::eyre::{eyre, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Cli, RenderMode},
    display::{Render, Silent, TerminalRenderer, TextRenderer},
    explorer::{ExploreConfig, ExploreReport, Explorer},
    file_loader,
    grid::Grid,
    types::Position,
};

/// Result of a complete run, as seen by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Some explorer reached an exit.
    ExitFound,
    /// Every reachable cell was visited without reaching an exit.
    ExitNotFound,
    /// The maze could not be loaded; no search was attempted.
    LoadFailed,
}

impl Outcome {
    /// Returns the process exit code for this outcome.
    ///
    /// Finishing a search is a success whether or not the exit was found.
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::ExitFound | Self::ExitNotFound => ExitCode::SUCCESS,
            Self::LoadFailed => ExitCode::FAILURE,
        }
    }
}

/// Application state for a single run of the explorer.
#[derive(Debug)]
pub struct App {
    /// Parsed command-line arguments.
    cli: Cli,
}

impl App {
    /// Creates an application from parsed command-line arguments.
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Runs the application against the process's standard streams.
    ///
    /// # Errors
    ///
    /// - [`std::io::Error`] if writing to the standard streams fails
    /// - terminal setup or teardown errors in [`RenderMode::Tui`]
    pub fn run(&self) -> Result<Outcome> {
        self.run_with(&mut io::stdout(), &mut io::stderr())
    }

    /// Runs the application, writing results to `out` and load errors to `err`.
    ///
    /// # Errors
    ///
    /// This function returns an error if writing to either stream fails.
    pub fn run_with<W: Write + Send, E: Write>(&self, out: &mut W, err: &mut E) -> Result<Outcome> {
        let (grid, entrance) = match file_loader::load_file(&self.cli.maze) {
            Ok(loaded) => loaded,
            Err(load_error) => {
                error!(error = %load_error, "Failed to load maze");
                writeln!(err, "error: {load_error}")?;
                return Ok(Outcome::LoadFailed);
            }
        };
        info!(
            rows = grid.rows(),
            cols = grid.cols(),
            row = entrance.row,
            col = entrance.col,
            "Loaded maze"
        );

        let config = self.cli.explore_config();
        let report = match self.cli.render {
            RenderMode::Hidden | RenderMode::Final => search(&grid, entrance, &Silent, config),
            RenderMode::Steps => search(&grid, entrance, &TextRenderer::new(&mut *out), config),
            RenderMode::Tui => {
                let renderer = TerminalRenderer::new(ratatui::init());
                let report = search(&grid, entrance, &renderer, config);
                ratatui::restore();
                report
            }
        };

        info!(
            found = report.found,
            visited = report.cells_visited,
            queued = report.branches_queued,
            inlined = report.branches_inlined,
            failed = report.branches_failed,
            elapsed = ?report.elapsed,
            "Search summary"
        );

        if self.cli.render != RenderMode::Hidden {
            write!(out, "{}", grid.render())?;
        }

        if report.found {
            writeln!(out, "Exit found!")?;
            Ok(Outcome::ExitFound)
        } else {
            writeln!(out, "Could not find the exit.")?;
            Ok(Outcome::ExitNotFound)
        }
    }
}

/// Explores `grid` from `entrance` and returns the summary of the search.
fn search(
    grid: &Grid,
    entrance: Position,
    renderer: &dyn Render,
    config: ExploreConfig,
) -> ExploreReport {
    let explorer = Explorer::new(grid, renderer, config);
    let found = explorer.explore(entrance);

    ExploreReport {
        found,
        ..explorer.report()
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence when set; otherwise `verbosity` selects the level, from warnings
/// only at zero up to tracing at three and above.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| {
        EnvFilter::new(match verbosity {
            0 => "warn",
            1 => "maze_runner=info,warn",
            2 => "maze_runner=debug,warn",
            _ => "maze_runner=trace,warn",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| eyre!("failed to initialize logging: {err}"))
}
