//! Terminal drawing of the maze for the live view.

use color_eyre::eyre::{OptionExt as _, Result};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Points},
        Block, BorderType, Borders, Clear,
    },
    Frame,
};

use crate::{
    grid::Grid,
    types::{Cell, Position},
};

/// Draws the grid centered in the frame, with a status line underneath.
///
/// Walls are drawn in green, visited cells in red, open exits in yellow and the cell an explorer
/// has just claimed in white.
///
/// # Errors
///
/// This function may return errors from layout lookups or when the grid does not fit in the
/// coordinate range of the terminal.
pub(crate) fn draw(frame: &mut Frame, grid: &Grid, at: Position) -> Result<()> {
    frame.render_widget(Clear, frame.area());

    let overall_layout = Layout::vertical([
        Constraint::Min(1),    // Maze and padding area
        Constraint::Length(3), // Status block
    ])
    .split(frame.area());

    let maze_content_area = *overall_layout
        .first()
        .ok_or_eyre("failed to get maze content area from layout")?;
    let status_full_area = *overall_layout
        .last()
        .ok_or_eyre("failed to get status area from layout")?;

    let maze_area = centered(maze_content_area, grid.rows(), grid.cols())?;
    let status_area = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(u16::try_from(grid.cols().max(20))?),
        Constraint::Min(1),
    ])
    .split(status_full_area)
    .get(1)
    .copied()
    .ok_or_eyre("failed to get centered status area from horizontal layout")?;

    let mut walls = Vec::new();
    let mut visited = Vec::new();
    let mut exits = Vec::new();
    for (index, cell) in grid.snapshot().into_iter().enumerate() {
        let position = Position::new(index / grid.cols(), index % grid.cols());
        match cell {
            Cell::Wall(_) => walls.push(position),
            Cell::Visited => visited.push(position),
            Cell::Exit => exits.push(position),
            Cell::Open | Cell::Entrance => {}
        }
    }

    let layers = [
        (transform_maze_to_screen_coords(&walls, grid)?, Color::Green),
        (transform_maze_to_screen_coords(&visited, grid)?, Color::Red),
        (transform_maze_to_screen_coords(&exits, grid)?, Color::Yellow),
        (transform_maze_to_screen_coords(&[at], grid)?, Color::White),
    ];

    for (coords, color) in &layers {
        let layer = Canvas::default()
            .x_bounds([
                (-rounded_div::i32(maze_area.width.into(), 2)).into(),
                (rounded_div::i32(maze_area.width.into(), 2)).into(),
            ])
            .y_bounds([
                (-rounded_div::i32(maze_area.height.into(), 2)).into(),
                (rounded_div::i32(maze_area.height.into(), 2)).into(),
            ])
            .marker(Marker::Dot)
            .paint(|ctx| {
                ctx.draw(&Points {
                    coords,
                    color: *color,
                });
            });
        frame.render_widget(layer, maze_area);
    }

    let status_block = Block::bordered()
        .title(format!("exploring {at}"))
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(Color::Green))
        .border_type(BorderType::Plain)
        .borders(Borders::TOP);
    frame.render_widget(status_block, status_area);

    Ok(())
}

/// Computes the area of `rows` by `cols` cells centered inside `area`.
fn centered(area: Rect, rows: usize, cols: usize) -> Result<Rect> {
    let vertical = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(u16::try_from(rows)?),
        Constraint::Min(1),
    ])
    .split(area)
    .get(1)
    .copied()
    .ok_or_eyre("failed to get maze area from layout")?;

    Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(u16::try_from(cols)?),
        Constraint::Min(1),
    ])
    .split(vertical)
    .get(1)
    .copied()
    .ok_or_eyre("failed to get maze space from horizontal layout")
}

/// Transforms grid positions to screen coordinates for canvas rendering.
///
/// Rows map to `y = (n - 1) / 2 - row`, so the first row is drawn at the top, and columns map to
/// `x = col - (n - 1) / 2`.
///
/// # Errors
///
/// This function may return errors if a dimension or coordinate does not fit in a `u16`.
pub(crate) fn transform_maze_to_screen_coords(
    positions: &[Position],
    grid: &Grid,
) -> Result<Vec<(f64, f64)>> {
    let rows_n = f64::from(u16::try_from(grid.rows())?);
    let cols_n = f64::from(u16::try_from(grid.cols())?);

    positions
        .iter()
        .map(|position| {
            let screen_y = (rows_n - 1.) / 2. - f64::from(u16::try_from(position.row)?);
            let screen_x = f64::from(u16::try_from(position.col)?) - (cols_n - 1.) / 2.;

            Ok((screen_x, screen_y))
        })
        .collect()
}
