//! This crate contains a concurrent maze explorer.
//!
//! A maze is loaded from a text description into a shared [`Grid`], and an [`Explorer`] walks it
//! depth-first from the entrance with a bounded pool of worker threads until one of them reaches an
//! exit or every reachable cell has been visited.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]

pub mod app;
pub mod cli;
pub mod display;
pub mod explorer;
pub mod file_loader;
pub mod grid;
mod pool;
pub mod types;
mod ui;

// Only the binary's integration tests use these.
#[cfg(test)]
use {assert_cmd as _, predicates as _};

pub use app::App;
pub use explorer::Explorer;
pub use grid::Grid;
