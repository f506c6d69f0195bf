//! This crate contains the source code for the binary of the maze explorer.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]
#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use std::process::ExitCode;

use clap::Parser as _;
use color_eyre::{eyre::Result, install};
use maze_runner::{app, cli::Cli, App};

fn main() -> Result<ExitCode> {
    install()?;

    let cli = Cli::parse();
    app::init_logging(cli.verbose)?;

    let outcome = App::new(cli).run()?;

    Ok(outcome.exit_code())
}
