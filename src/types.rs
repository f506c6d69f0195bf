//! Value types shared by the grid store and the explorer.

use std::fmt;

/// Marker held by a single maze cell.
///
/// This enumeration holds every state a cell can be in during a run. The byte representation of
/// each variant is also the character used when rendering the grid, which lets the grid store keep
/// cells as plain atomic bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Impassable cell.
    ///
    /// This variant keeps the character the wall was written with so rendering reproduces the
    /// input. Characters that would clash with another marker are normalized to `#`.
    Wall(u8),
    /// Passable, unvisited cell, written `x`.
    Open,
    /// Starting cell of the search, written `e`.
    Entrance,
    /// Target cell of the search, written `s`.
    Exit,
    /// Cell already claimed by some explorer, rendered `.`.
    ///
    /// This is a terminal state: nothing ever moves a cell out of it.
    Visited,
}

impl Cell {
    /// Byte used for walls whose original character cannot be rendered as-is.
    pub const DEFAULT_WALL: u8 = b'#';

    /// Decodes a cell from its marker byte.
    ///
    /// Any byte outside the active alphabet is a wall. Non-printable bytes and the visited marker
    /// itself are folded into [`Cell::DEFAULT_WALL`] so a freshly loaded grid never looks visited.
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            b'x' => Self::Open,
            b'e' => Self::Entrance,
            b's' => Self::Exit,
            b'.' => Self::Visited,
            other if other.is_ascii_graphic() => Self::Wall(other),
            _ => Self::Wall(Self::DEFAULT_WALL),
        }
    }

    /// Decodes a cell from an input character.
    ///
    /// Unlike [`Cell::from_byte`], this is the entry point for untrusted text: a `.` in the input
    /// is a wall, not a visited cell, and non-ASCII characters become the default wall.
    pub fn from_input(token: char) -> Self {
        match u8::try_from(token) {
            Ok(b'.') | Err(_) => Self::Wall(Self::DEFAULT_WALL),
            Ok(byte) => Self::from_byte(byte),
        }
    }

    /// Returns the marker byte of this cell.
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Wall(byte) => byte,
            Self::Open => b'x',
            Self::Entrance => b'e',
            Self::Exit => b's',
            Self::Visited => b'.',
        }
    }

    /// Returns `true` if an explorer may walk into this cell from a neighbor.
    pub const fn is_enterable(self) -> bool {
        matches!(self, Self::Open | Self::Exit)
    }

    /// Returns `true` if this cell can still be claimed by an explorer.
    ///
    /// The entrance is claimable even though it is not enterable: the search claims it when it
    /// starts there.
    pub const fn is_claimable(self) -> bool {
        matches!(self, Self::Open | Self::Entrance | Self::Exit)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", char::from(self.to_byte()))
    }
}

/// Orthogonal step direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// One row towards the top of the grid.
    Up,
    /// One row towards the bottom of the grid.
    Down,
    /// One column towards the left edge of the grid.
    Left,
    /// One column towards the right edge of the grid.
    Right,
}

impl Direction {
    /// All directions in exploration order.
    ///
    /// The order decides which neighbor an explorer keeps for itself and which ones it hands off,
    /// so it indirectly decides which branch tends to win a race.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Returns the `(row, col)` offset of a single step in this direction.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}

/// Coordinates of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Zero-based row index, counted from the top.
    pub row: usize,
    /// Zero-based column index, counted from the left.
    pub col: usize,
}

impl Position {
    /// Builds a position from a row and a column.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the position one step away in `direction`.
    ///
    /// This returns `None` when the step would leave the top or left edge. The bottom and right
    /// edges depend on the grid size and are checked by the grid store.
    pub const fn step(self, direction: Direction) -> Option<Self> {
        let (row_offset, col_offset) = direction.offset();
        let Some(row) = self.row.checked_add_signed(row_offset) else {
            return None;
        };
        let Some(col) = self.col.checked_add_signed(col_offset) else {
            return None;
        };

        Some(Self { row, col })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_from_byte_markers() {
        assert_eq!(Cell::from_byte(b'x'), Cell::Open);
        assert_eq!(Cell::from_byte(b'e'), Cell::Entrance);
        assert_eq!(Cell::from_byte(b's'), Cell::Exit);
        assert_eq!(Cell::from_byte(b'.'), Cell::Visited);
        assert_eq!(Cell::from_byte(b'#'), Cell::Wall(b'#'));
        assert_eq!(Cell::from_byte(b'2'), Cell::Wall(b'2'));
        assert_eq!(Cell::from_byte(b'\t'), Cell::Wall(Cell::DEFAULT_WALL));
    }

    #[test]
    fn test_cell_from_input_never_yields_visited() {
        assert_eq!(Cell::from_input('.'), Cell::Wall(b'#'));
        assert_eq!(Cell::from_input('\u{2588}'), Cell::Wall(b'#'));
        assert_eq!(Cell::from_input('x'), Cell::Open);
        assert_eq!(Cell::from_input('*'), Cell::Wall(b'*'));
    }

    #[test]
    fn test_cell_byte_round_trip_for_markers() {
        for cell in [
            Cell::Open,
            Cell::Entrance,
            Cell::Exit,
            Cell::Visited,
            Cell::Wall(b'#'),
        ] {
            assert_eq!(Cell::from_byte(cell.to_byte()), cell);
        }
    }

    #[test]
    fn test_cell_enterable_and_claimable() {
        assert!(Cell::Open.is_enterable());
        assert!(Cell::Exit.is_enterable());
        assert!(!Cell::Entrance.is_enterable());
        assert!(!Cell::Visited.is_enterable());
        assert!(!Cell::Wall(b'#').is_enterable());

        assert!(Cell::Entrance.is_claimable());
        assert!(!Cell::Visited.is_claimable());
        assert!(!Cell::Wall(b'#').is_claimable());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Visited.to_string(), ".");
        assert_eq!(Cell::Wall(b'+').to_string(), "+");
    }

    #[test]
    fn test_direction_order() {
        assert_eq!(
            Direction::ALL,
            [
                Direction::Up,
                Direction::Down,
                Direction::Left,
                Direction::Right
            ]
        );
    }

    #[test]
    fn test_position_step() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.step(Direction::Up), None);
        assert_eq!(origin.step(Direction::Left), None);
        assert_eq!(origin.step(Direction::Down), Some(Position::new(1, 0)));
        assert_eq!(origin.step(Direction::Right), Some(Position::new(0, 1)));

        let inner = Position::new(2, 3);
        assert_eq!(inner.step(Direction::Up), Some(Position::new(1, 3)));
        assert_eq!(inner.step(Direction::Left), Some(Position::new(2, 2)));
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(4, 7).to_string(), "(4, 7)");
    }
}
