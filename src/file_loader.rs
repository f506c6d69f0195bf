//! Loading and validation of maze description files.
//!
//! A maze file starts with a header holding the number of rows and columns, followed by one line
//! per row with one character per cell. Whitespace inside a row is ignored, so both `e x x` and
//! `exx` describe the same row, and blank lines are skipped.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    grid::Grid,
    types::{Cell, Position},
};

/// Fatal problem found while loading a maze; no search is attempted after one of these.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The maze file could not be opened or read.
    #[error("could not open maze file '{}': {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The text does not match the declared dimensions or is otherwise malformed.
    #[error("malformed maze: {0}")]
    Format(#[from] FormatError),
    /// The maze contains no entrance marker.
    #[error("start position not found: the maze has no entrance ('e')")]
    MissingEntrance,
}

/// Specific way in which maze text is malformed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The input holds no header line.
    #[error("missing 'rows cols' header")]
    MissingHeader,
    /// The header does not consist of exactly two non-negative integers.
    #[error("invalid header '{header}', expected two non-negative integers")]
    InvalidHeader {
        /// Header line as read.
        header: String,
    },
    /// The declared dimensions overflow the addressable cell count.
    #[error("dimensions {rows}x{cols} are too large")]
    TooLarge {
        /// Declared number of rows.
        rows: usize,
        /// Declared number of columns.
        cols: usize,
    },
    /// The number of rows differs from the header.
    #[error("expected {expected} rows, found {found}")]
    RowCount {
        /// Declared number of rows.
        expected: usize,
        /// Number of rows present.
        found: usize,
    },
    /// A row holds a different number of cells than the header declares.
    #[error("row {row} has {found} cells, expected {expected}")]
    ColumnCount {
        /// Zero-based index of the offending row.
        row: usize,
        /// Declared number of columns.
        expected: usize,
        /// Number of cells present in the row.
        found: usize,
    },
}

/// Reads and parses the maze file at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, and otherwise the errors of [`parse`].
pub fn load_file(path: &Path) -> Result<(Grid, Position), LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read maze file");

    // Undecodable bytes become replacement characters, which load as walls.
    parse(&String::from_utf8_lossy(&bytes))
}

/// Parses maze text into a grid and the position of its entrance.
///
/// When several entrances are present the first one in row-major order is used.
///
/// # Errors
///
/// Returns [`LoadError::Format`] if the header is missing or invalid or if the rows do not match
/// the declared dimensions, and [`LoadError::MissingEntrance`] if no cell is an entrance.
pub fn parse(input: &str) -> Result<(Grid, Position), LoadError> {
    let mut lines = input.lines().filter(|line| !line.trim().is_empty());

    let header = lines.next().ok_or(FormatError::MissingHeader)?;
    let (rows, cols) = parse_header(header)?;
    let total = rows
        .checked_mul(cols)
        .ok_or(FormatError::TooLarge { rows, cols })?;

    // The header is untrusted; the rows can never hold more cells than the input has characters.
    let mut cells = Vec::with_capacity(total.min(input.len()));
    let mut found_rows = 0;
    for (row, line) in lines.enumerate() {
        found_rows += 1;
        if row >= rows {
            continue;
        }

        let before = cells.len();
        cells.extend(
            line.chars()
                .filter(|token| !token.is_whitespace())
                .map(Cell::from_input),
        );

        let found = cells.len() - before;
        if found != cols {
            return Err(FormatError::ColumnCount {
                row,
                expected: cols,
                found,
            }
            .into());
        }
    }

    if found_rows != rows {
        return Err(FormatError::RowCount {
            expected: rows,
            found: found_rows,
        }
        .into());
    }

    let mut entrances = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| **cell == Cell::Entrance)
        .map(|(index, _)| Position::new(index / cols, index % cols));
    let entrance = entrances.next().ok_or(LoadError::MissingEntrance)?;
    let extra = entrances.count();
    if extra > 0 {
        warn!(
            extra,
            row = entrance.row,
            col = entrance.col,
            "Maze has several entrances, using the first one"
        );
    }

    let grid = Grid::from_cells(rows, cols, cells).ok_or(FormatError::TooLarge { rows, cols })?;
    debug!(rows, cols, row = entrance.row, col = entrance.col, "Parsed maze");

    Ok((grid, entrance))
}

/// Parses the `rows cols` header line.
fn parse_header(header: &str) -> Result<(usize, usize), FormatError> {
    let invalid = || FormatError::InvalidHeader {
        header: header.trim().to_owned(),
    };

    let mut tokens = header.split_whitespace();
    let rows = tokens.next().ok_or_else(invalid)?;
    let cols = tokens.next().ok_or_else(invalid)?;
    if tokens.next().is_some() {
        return Err(invalid());
    }

    Ok((
        rows.parse().map_err(|_err| invalid())?,
        cols.parse().map_err(|_err| invalid())?,
    ))
}
