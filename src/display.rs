//! Frame sinks the explorer reports progress to.
//!
//! After claiming a cell, an explorer hands the grid to a [`Render`] implementation. Rendering is
//! purely presentational: a sink never mutates the grid and may be called from several worker
//! threads at once, so every sink serializes its own output.

use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use ratatui::{backend::Backend, Terminal};

use crate::{grid::Grid, types::Position, ui};

/// Destination for intermediate renders of the grid.
pub trait Render: Sync {
    /// Renders the grid right after the cell at `at` was claimed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the frame could not be written. The explorer treats this as a
    /// failure of the branch that requested the frame only.
    fn frame(&self, grid: &Grid, at: Position) -> io::Result<()>;
}

/// Sink that discards every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Render for Silent {
    fn frame(&self, _grid: &Grid, _at: Position) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that prints every frame as plain text, followed by a blank line.
#[derive(Debug)]
pub struct TextRenderer<W> {
    /// Output stream, locked for the duration of each frame.
    out: Mutex<W>,
}

impl<W: Write> TextRenderer<W> {
    /// Creates a text sink writing to `out`.
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consumes the sink and returns the output stream.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Render for TextRenderer<W> {
    fn frame(&self, grid: &Grid, _at: Position) -> io::Result<()> {
        let rendered = grid.render();
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);

        out.write_all(rendered.as_bytes())?;
        writeln!(out)?;
        out.flush()
    }
}

/// Sink that redraws a ratatui terminal on every frame.
pub struct TerminalRenderer<B: Backend> {
    /// Terminal handle, locked for the duration of each draw.
    terminal: Mutex<Terminal<B>>,
}

impl<B: Backend> TerminalRenderer<B> {
    /// Creates a terminal sink drawing to `terminal`.
    pub const fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal: Mutex::new(terminal),
        }
    }

    /// Consumes the sink and returns the terminal.
    pub fn into_inner(self) -> Terminal<B> {
        self.terminal
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: Backend + Send> Render for TerminalRenderer<B> {
    fn frame(&self, grid: &Grid, at: Position) -> io::Result<()> {
        let mut terminal = self.terminal.lock().unwrap_or_else(PoisonError::into_inner);

        let _ = terminal.try_draw(|frame| ui::draw(frame, grid, at).map_err(io::Error::other))?;

        Ok(())
    }
}
