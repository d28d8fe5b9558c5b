use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::Stylize,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, FormField, Mode};
use crate::records::{Client, ClientId};
use crate::swipe::{RowPhase, SwipeRowController};

/// Terminal lines taken by one client row (name, subtitle, spacer)
pub const ROW_HEIGHT: u16 = 3;

const EDIT_COLOR: Color = Color::Rgb(0, 122, 255);
const DELETE_COLOR: Color = Color::Rgb(220, 38, 38);

fn screen_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Client list
            Constraint::Length(3), // Footer
        ])
        .split(area)
}

/// Inner area of the bordered client list
pub fn list_area(area: Rect) -> Rect {
    let chunks = screen_chunks(area);
    Block::default().borders(Borders::ALL).inner(chunks[1])
}

pub fn visible_rows(list: Rect) -> usize {
    (list.height / ROW_HEIGHT) as usize
}

/// Index of the client row under a terminal cell, if any
pub fn row_at(list: Rect, scroll_offset: usize, column: u16, row: u16) -> Option<usize> {
    let inside = column >= list.x && column < list.right() && row >= list.y && row < list.bottom();
    if !inside {
        return None;
    }
    let slot = ((row - list.y) / ROW_HEIGHT) as usize;
    if slot >= visible_rows(list) {
        return None;
    }
    Some(scroll_offset + slot)
}

/// Split the revealed action area into the Edit and Delete buttons.
///
/// Drawing and tap hit-testing both go through here so they always agree.
pub fn action_buttons(actions: Rect) -> (Rect, Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(actions);
    (halves[0], halves[1])
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = screen_chunks(f.area());

    let title = Paragraph::new(vec![
        Line::from("Clients".bold()),
        Line::from("Manage your customer directory".fg(Color::Gray)),
    ])
    .block(Block::default().borders(Borders::BOTTOM))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(title, chunks[0]);

    draw_list(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    match &app.mode {
        Mode::Browse => {}
        Mode::ConfirmDelete { name, .. } => draw_prompt(
            f,
            "Delete client",
            vec![
                Line::from(format!("Delete {}? This cannot be undone.", name)),
                Line::from(vec![
                    "y".fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    " delete   ".into(),
                    "n".fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    " keep".into(),
                ]),
            ],
        ),
        Mode::EditName { input, .. } => {
            let lines = vec![Line::from("Name:"), Line::from(format!("{}_", input))];
            draw_prompt(f, "Edit client", lines)
        }
        Mode::AddClient { form, field } => {
            let lines = FormField::ALL
                .iter()
                .map(|&each| {
                    let value = each.value(form);
                    if each == *field {
                        Line::from(vec![
                            format!("{:>8}: ", each.label()).fg(Color::Yellow),
                            format!("{}_", value).into(),
                        ])
                    } else {
                        Line::from(format!("{:>8}: {}", each.label(), value))
                    }
                })
                .collect();
            draw_prompt(f, "New client (Tab: next field, Enter: save)", lines)
        }
    }
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Clients");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.clients().is_empty() {
        let empty = Paragraph::new("No clients found. Add one!")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, inner);
        return;
    }

    let list = app.list();
    let now = list.now();
    let animation = app.config.ui.animation;
    let column_width = app.config.ui.column_width;
    let max_shift = app.action_columns().min(inner.width);

    let visible = app
        .clients()
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(visible_rows(inner));
    for (slot, (index, client)) in visible.enumerate() {
        let Some(row) = list.row(&client.id) else {
            continue;
        };
        let y = inner.y + slot as u16 * ROW_HEIGHT;
        let rect = Rect::new(inner.x, y, inner.width, ROW_HEIGHT - 1);
        let offset = row.visual_offset(now, animation);
        let shift = ((-offset / column_width).round() as u16).min(max_shift);
        draw_row(f, client, row, rect, shift, index == app.selected);
    }
}

fn draw_row(
    f: &mut Frame,
    client: &Client,
    row: &SwipeRowController<ClientId>,
    rect: Rect,
    shift: u16,
    selected: bool,
) {
    let content = Rect::new(rect.x, rect.y, rect.width - shift, rect.height);
    let mut style = Style::default().fg(Color::White);
    if selected {
        style = style.bg(Color::Rgb(30, 41, 59));
    }
    if row.display_phase() == RowPhase::Dragging {
        style = style.add_modifier(Modifier::ITALIC);
    }
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            client.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(client.subtitle(), Style::default().fg(Color::Gray))),
    ])
    .style(style)
    .scroll((0, shift));
    f.render_widget(text, content);

    if shift == 0 {
        return;
    }
    let actions = Rect::new(rect.x + rect.width - shift, rect.y, shift, rect.height);
    let (edit, delete) = action_buttons(actions);
    let button = |label: &'static str, color: Color| {
        Paragraph::new(vec![Line::from(""), Line::from(label)])
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).bg(color).add_modifier(Modifier::BOLD))
    };
    f.render_widget(button("Edit", EDIT_COLOR), edit);
    f.render_widget(button("Delete", DELETE_COLOR), delete);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        "drag ←".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        "/".into(),
        "h".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " reveal, ".into(),
        "e".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " edit, ".into(),
        "d".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " delete, ".into(),
        "a".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " add, ".into(),
        "q".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " quit".into(),
    ];
    if let Some(status) = &app.status {
        let color = if status.starts_with("[x]") {
            Color::Red
        } else {
            Color::Green
        };
        spans.push("   ".into());
        spans.push(Span::styled(status.clone(), Style::default().fg(color)));
    }
    let footer = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray));
    f.render_widget(footer, area);
}

fn draw_prompt(f: &mut Frame, title: &str, lines: Vec<Line<'_>>) {
    let area = centered_rect(50, 6, f.area());
    f.render_widget(Clear, area);
    let prompt = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(prompt, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
