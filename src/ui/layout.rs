use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy)]
pub struct UiAreas {
    pub size: Rect,
    pub header: Rect,
    pub body: Rect,
    pub status_line: Rect,
    pub help_line: Rect,
}

pub fn areas(size: Rect) -> UiAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(size);

    let footer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(vertical[2]);

    UiAreas {
        size,
        header: vertical[0],
        body: vertical[1],
        status_line: footer_chunks[0],
        help_line: footer_chunks[1],
    }
}

/// Split `area` into a grid of `columns` cells per row, each `row_height`
/// tall, enough for `count` cells. Cells that do not fit are omitted.
pub fn grid_cells(area: Rect, columns: usize, row_height: u16, count: usize) -> Vec<Rect> {
    if columns == 0 || row_height == 0 || area.width == 0 {
        return Vec::new();
    }
    let cell_width = area.width / columns as u16;
    let rows_fit = (area.height / row_height) as usize;

    (0..count)
        .take(rows_fit * columns)
        .map(|i| {
            let row = (i / columns) as u16;
            let col = (i % columns) as u16;
            Rect {
                x: area.x + col * cell_width,
                y: area.y + row * row_height,
                width: cell_width,
                height: row_height,
            }
        })
        .collect()
}

/// Centered rect of the given percentage size, for popups
pub fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_cells_two_columns() {
        let area = Rect::new(0, 0, 80, 20);
        let cells = grid_cells(area, 2, 6, 5);
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0], Rect::new(0, 0, 40, 6));
        assert_eq!(cells[1], Rect::new(40, 0, 40, 6));
        assert_eq!(cells[4], Rect::new(0, 12, 40, 6));
    }

    #[test]
    fn test_grid_cells_clip_to_height() {
        let area = Rect::new(0, 0, 80, 10);
        assert_eq!(grid_cells(area, 2, 6, 9).len(), 2);
        assert!(grid_cells(area, 0, 6, 9).is_empty());
    }
}
