//! Shared grid store.
//!
//! This module contains the [`Grid`] structure, the only mutation and inspection surface for maze
//! cells. Cells are stored as one atomic byte each, so explorers running on different threads can
//! inspect and claim cells without a grid-wide lock.

use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;

use crate::types::{Cell, Direction, Position};

/// Access outside the bounds of the grid.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("position {position} is outside the {rows}x{cols} grid")]
pub struct BoundsError {
    /// Offending position.
    pub position: Position,
    /// Number of rows in the grid.
    pub rows: usize,
    /// Number of columns in the grid.
    pub cols: usize,
}

/// Outcome of an attempt to claim a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the cell, which held the given marker before it became visited.
    Claimed(Cell),
    /// The cell could not be claimed; it holds the given marker.
    ///
    /// This is either a wall or a cell some other explorer claimed first.
    Unavailable(Cell),
}

/// Fixed-size, row-major maze grid shared between explorers.
///
/// The dimensions never change after construction. Every cell moves at most once from a claimable
/// marker to [`Cell::Visited`] and never back.
#[derive(Debug)]
pub struct Grid {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Cell markers in row-major order, one atomic byte per cell.
    cells: Box<[AtomicU8]>,
}

impl Grid {
    /// Builds a grid from row-major cells.
    ///
    /// Returns `None` if the number of cells is not `rows * cols`.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Option<Self> {
        if rows.checked_mul(cols)? != cells.len() {
            return None;
        }

        let cells = cells
            .into_iter()
            .map(|cell| {
                let byte = cell.to_byte();
                // A wall spelled like an active marker would decode as that marker.
                if Cell::from_byte(byte) == cell {
                    AtomicU8::new(byte)
                } else {
                    AtomicU8::new(Cell::DEFAULT_WALL)
                }
            })
            .collect();

        Some(Self { rows, cols, cells })
    }

    /// Returns the number of rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` if `position` lies inside the grid.
    pub const fn contains(&self, position: Position) -> bool {
        position.row < self.rows && position.col < self.cols
    }

    /// Resolves the atomic slot backing `position`.
    fn slot(&self, position: Position) -> Result<&AtomicU8, BoundsError> {
        let out_of_bounds = BoundsError {
            position,
            rows: self.rows,
            cols: self.cols,
        };

        if !self.contains(position) {
            return Err(out_of_bounds);
        }

        self.cells
            .get(position.row * self.cols + position.col)
            .ok_or(out_of_bounds)
    }

    /// Returns the marker currently held by the cell at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if `position` is outside the grid.
    pub fn cell(&self, position: Position) -> Result<Cell, BoundsError> {
        Ok(Cell::from_byte(self.slot(position)?.load(Ordering::Acquire)))
    }

    /// Returns `true` iff `position` is inside the grid and holds an open or exit cell.
    ///
    /// The answer may be stale by the time the caller acts on it. Use [`Grid::try_claim`] to
    /// actually enter a cell.
    pub fn is_enterable(&self, position: Position) -> bool {
        self.cell(position).is_ok_and(Cell::is_enterable)
    }

    /// Atomically moves a claimable cell to [`Cell::Visited`].
    ///
    /// Exactly one caller observes [`Claim::Claimed`] for a given cell; every later or concurrent
    /// caller gets [`Claim::Unavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if `position` is outside the grid.
    pub fn try_claim(&self, position: Position) -> Result<Claim, BoundsError> {
        let slot = self.slot(position)?;
        let visited = Cell::Visited.to_byte();

        let claim = match slot.fetch_update(Ordering::AcqRel, Ordering::Acquire, |byte| {
            Cell::from_byte(byte).is_claimable().then_some(visited)
        }) {
            Ok(previous) => Claim::Claimed(Cell::from_byte(previous)),
            Err(current) => Claim::Unavailable(Cell::from_byte(current)),
        };

        Ok(claim)
    }

    /// Marks the cell at `position` as visited.
    ///
    /// Returns `true` if the cell changed. Marking a visited cell again, or a wall, leaves the grid
    /// untouched and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if `position` is outside the grid.
    pub fn mark_visited(&self, position: Position) -> Result<bool, BoundsError> {
        Ok(matches!(self.try_claim(position)?, Claim::Claimed(_)))
    }

    /// Returns the in-bounds orthogonal neighbors of `position`, in exploration order.
    pub fn neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| position.step(direction))
            .filter(|neighbor| self.contains(*neighbor))
    }

    /// Returns the neighbors of `position` that are currently enterable, in exploration order.
    pub fn enterable_neighbors(&self, position: Position) -> Vec<Position> {
        self.neighbors(position)
            .filter(|neighbor| self.is_enterable(*neighbor))
            .collect()
    }

    /// Returns a copy of every cell in row-major order.
    pub fn snapshot(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .map(|slot| Cell::from_byte(slot.load(Ordering::Acquire)))
            .collect()
    }

    /// Returns how many cells currently hold `cell`.
    pub fn count(&self, cell: Cell) -> usize {
        self.snapshot()
            .into_iter()
            .filter(|current| *current == cell)
            .count()
    }

    /// Renders the grid as text, one line per row and one character per cell.
    ///
    /// Every cell is read with a single atomic load, so a cell is never observed half-written even
    /// while explorers keep claiming cells.
    pub fn render(&self) -> String {
        let mut rendered = String::with_capacity(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            let start = row * self.cols;
            let slots = self.cells.get(start..start + self.cols).unwrap_or_default();
            rendered.extend(
                slots
                    .iter()
                    .map(|slot| char::from(slot.load(Ordering::Acquire))),
            );
            rendered.push('\n');
        }

        rendered
    }
}
