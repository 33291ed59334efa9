//! Grid cell for one keyboard record

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{block::Title, Block, Borders, Paragraph, Widget},
};

use crate::domain::{Keyboard, KeyboardKind, TileAction};

/// Rows needed to draw a tile, borders included
pub const TILE_HEIGHT: u16 = 6;

pub struct KeyboardTile<'a> {
    index: usize,
    keyboard: &'a Keyboard,
    action: TileAction,
    selected: bool,
}

impl<'a> KeyboardTile<'a> {
    pub fn new(index: usize, keyboard: &'a Keyboard, action: TileAction) -> Self {
        Self {
            index,
            keyboard,
            action,
            selected: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for KeyboardTile<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 4 || area.height < 3 {
            return;
        }

        let badge = match self.action {
            TileAction::OwnerBadge => Span::styled(
                " ● yours ",
                Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
            ),
            TileAction::Tip => Span::styled(" [t] tip ", Style::default().fg(Color::Green)),
        };

        let border_style = if self.selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" #{} {} ", self.index, self.keyboard.kind.label()))
            .title(Title::from(badge).alignment(Alignment::Right));

        let art_style = filter_style(&self.keyboard.filter);
        let lines = vec![
            Line::from(Span::styled(key_row(self.keyboard.kind), art_style)),
            Line::from(Span::styled(space_row(self.keyboard.kind), art_style)),
            Line::from(vec![
                Span::styled("keycaps ", Style::default().fg(Color::DarkGray)),
                Span::raw(self.keyboard.keycaps()),
                Span::styled("  filter ", Style::default().fg(Color::DarkGray)),
                Span::raw(self.keyboard.filter_label().to_string()),
            ]),
        ];

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

fn key_row(kind: KeyboardKind) -> String {
    let keys = match kind {
        KeyboardKind::SixtyPercent => 12,
        KeyboardKind::SeventyFivePercent => 14,
        KeyboardKind::EightyPercent => 16,
        KeyboardKind::Iso105 => 20,
        KeyboardKind::Unknown(_) => 10,
    };
    "▪".repeat(keys)
}

fn space_row(kind: KeyboardKind) -> String {
    let pad = match kind {
        KeyboardKind::Iso105 => 4,
        _ => 2,
    };
    format!("{}{}", " ".repeat(pad), "▬".repeat(8))
}

/// Approximate the CSS filter tags with terminal colors
fn filter_style(filter: &str) -> Style {
    match filter.trim() {
        "sepia" => Style::default().fg(Color::Yellow),
        "grayscale" => Style::default().fg(Color::Gray),
        "invert" => Style::default().add_modifier(Modifier::REVERSED),
        "hue-rotate-90" => Style::default().fg(Color::Magenta),
        "hue-rotate-180" => Style::default().fg(Color::Blue),
        _ => Style::default().fg(Color::White),
    }
}
