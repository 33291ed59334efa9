use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;
pub mod widgets;

use crate::app::{describe_draft, App, StatusLevel, GRID_COLUMNS};
use crate::domain::{format_ether, keyboard::short_addr, Screen};
use widgets::{KeyboardTile, TILE_HEIGHT};

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_body(f, areas.body, app);
    draw_status_line(f, areas.status_line, app);
    draw_help_line(f, areas.help_line, app);

    if !app.notifications.is_empty() {
        draw_toasts(f, areas.body, app);
    }
    if app.create_form.is_some() {
        draw_create_popup(f, areas.size, app);
    }
    if let Some(alert) = app.alert.as_deref() {
        draw_alert(f, areas.size, alert);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let wallet = match (&app.provider, app.account) {
        (None, _) => Span::styled("no wallet", Style::default().fg(Color::Red)),
        (Some(_), None) => Span::styled("not connected", Style::default().fg(Color::Yellow)),
        (Some(_), Some(account)) => {
            Span::styled(short_addr(&account), Style::default().fg(Color::Green))
        }
    };
    let endpoint = app.provider.clone().unwrap_or_else(|| "-".to_string());

    let line = Line::from(vec![
        Span::styled(
            "⌨ Keyboards",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::styled("wallet ", Style::default().fg(Color::DarkGray)),
        wallet,
        Span::raw("  │  "),
        Span::styled("rpc ", Style::default().fg(Color::DarkGray)),
        Span::raw(endpoint),
        Span::raw("  │  "),
        Span::styled("contract ", Style::default().fg(Color::DarkGray)),
        Span::raw(short_addr(&app.contract)),
    ]);

    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
    match app.screen() {
        Screen::InstallWallet => {
            let mut lines = vec![
                Line::from("Please connect a wallet provider to use this app."),
                Line::from(""),
                Line::from(Span::styled(
                    "Start with --rpc <url>, --ws <url> or --ipc <path>, or set [wallet] in the config file.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            if let Some(note) = app.provider_note.as_deref() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    note.to_string(),
                    Style::default().fg(Color::Red),
                )));
            }
            draw_centered_message(f, area, lines);
        }
        Screen::Connect => {
            let button = Span::styled(
                " [c] Connect Wallet ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
            draw_centered_message(f, area, vec![Line::from(button)]);
        }
        Screen::Grid(tiles) => {
            let body = with_create_action(f, area);

            // Scroll by whole rows so the selected tile stays on screen
            let rows_fit = ((body.height / TILE_HEIGHT) as usize).max(1);
            let selected_row = app.selected / GRID_COLUMNS;
            let first = selected_row.saturating_sub(rows_fit - 1) * GRID_COLUMNS;
            let cells = layout::grid_cells(
                body,
                GRID_COLUMNS,
                TILE_HEIGHT,
                tiles.len().saturating_sub(first),
            );

            for (cell, tile) in cells.iter().zip(tiles.iter().skip(first)) {
                let widget = KeyboardTile::new(tile.index, tile.keyboard, tile.action)
                    .selected(tile.index == app.selected);
                f.render_widget(widget, *cell);
            }
        }
        Screen::Loading => {
            let body = with_create_action(f, area);
            draw_centered_message(f, body, vec![Line::from("Loading Keyboards...")]);
        }
        Screen::Empty => {
            let body = with_create_action(f, area);
            draw_centered_message(f, body, vec![Line::from("No keyboards yet!")]);
        }
    }
}

/// Draws the create action on the first body row and returns the rest
fn with_create_action(f: &mut Frame, area: Rect) -> Rect {
    if area.height < 2 {
        return area;
    }
    let action = Paragraph::new(Line::from(vec![Span::styled(
        " [n] Create a Keyboard! ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .alignment(Alignment::Center);
    f.render_widget(action, Rect { height: 1, ..area });

    Rect {
        y: area.y + 2,
        height: area.height.saturating_sub(2),
        ..area
    }
}

fn draw_centered_message(f: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16;
    let target = layout::centered(area, 90, height);
    let paragraph = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, target);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let Some((text, level)) = app.status_text() else {
        let loading = if app.keyboards_loading { "loading…" } else { "" };
        f.render_widget(
            Paragraph::new(Span::styled(loading, Style::default().fg(Color::DarkGray))),
            area,
        );
        return;
    };
    let color = match level {
        StatusLevel::Info => Color::Green,
        StatusLevel::Warn => Color::Yellow,
        StatusLevel::Error => Color::Red,
    };
    f.render_widget(
        Paragraph::new(Span::styled(text.to_string(), Style::default().fg(color))),
        area,
    );
}

fn draw_help_line(f: &mut Frame, area: Rect, app: &App) {
    let help = if app.alert.is_some() {
        "Enter/Esc dismiss".to_string()
    } else if app.create_form.is_some() {
        "←/→ kind  Space keycaps  ↑/↓ filter  Enter create  Esc cancel".to_string()
    } else {
        match app.screen() {
            Screen::InstallWallet | Screen::Connect => "c connect  q quit".to_string(),
            Screen::Grid(_) => format!(
                "arrows move  t tip ({} eth)  n create  r refresh  q quit",
                format_ether(app.tip_amount)
            ),
            Screen::Loading | Screen::Empty => "n create  r refresh  q quit".to_string(),
        }
    };
    f.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
        area,
    );
}

fn draw_toasts(f: &mut Frame, area: Rect, app: &App) {
    let width = area.width.min(48);
    let mut y = area.y;
    for toast in app.notifications.iter() {
        if y + 3 > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width - width,
            y,
            width,
            height: 3,
        };
        let body = Paragraph::new(Line::from(vec![
            Span::styled(
                toast.at.format("%H:%M:%S ").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw(toast.text.clone()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(Clear, rect);
        f.render_widget(body, rect);
        y += 3;
    }
}

fn draw_create_popup(f: &mut Frame, size: Rect, app: &App) {
    let Some(form) = app.create_form.as_ref() else {
        return;
    };
    let rect = layout::centered(size, 60, 8);
    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:<9}"), Style::default().fg(Color::DarkGray)),
            Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
        ])
    };
    let filter = if form.draft.filter.is_empty() {
        "none".to_string()
    } else {
        form.draft.filter.clone()
    };
    let lines = vec![
        field("kind", form.draft.kind.label()),
        field("keycaps", if form.draft.is_pbt { "PBT" } else { "ABS" }.to_string()),
        field("filter", filter),
        Line::from(""),
        Line::from(Span::styled(
            describe_draft(&form.draft),
            Style::default().fg(Color::Cyan),
        )),
    ];
    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Create a Keyboard ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(popup, rect);
}

fn draw_alert(f: &mut Frame, size: Rect, message: &str) {
    let rect = layout::centered(size, 50, 5);
    let popup = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Alert ")
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(popup, rect);
}
