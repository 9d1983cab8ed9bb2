//! Dashboard rendering
//!
//! Four zones:
//! - Header: screen tabs, user, refresh status
//! - Body: favourites, open/closed signals or the admin overview
//! - Status: current notification or key hints
//! - Logs: scrollable log entries

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{DashboardState, Screen};
use crate::api::types::Instrument;
use crate::view::{
    NotificationLevel, SignalCard, SubscriptionCard, NO_CLOSED_SIGNALS, NO_FAVOURITES,
    NO_OPEN_SIGNALS, NO_SUBSCRIPTIONS,
};

/// Main draw function - renders the entire UI
pub fn draw(frame: &mut Frame, state: &DashboardState, now: DateTime<Utc>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Body
            Constraint::Length(3), // Status
            Constraint::Length(8), // Logs
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);
    match state.screen {
        Screen::Home => draw_home(frame, chunks[1], state, now),
        Screen::Markets => draw_markets(frame, chunks[1], state, now),
        Screen::Admin => draw_admin(frame, chunks[1], state),
    }
    draw_status(frame, chunks[2], state);
    draw_logs(frame, chunks[3], state);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let mut spans = Vec::new();
    for (idx, screen) in Screen::ALL.iter().enumerate() {
        let style = if *screen == state.screen {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("[{}] {}", idx + 1, screen.title()), style));
        spans.push(Span::raw("  "));
    }

    spans.push(Span::raw("│  "));
    let user = state
        .user_id
        .map(|id| format!("user #{}", id))
        .unwrap_or_else(|| "not logged in".to_string());
    spans.push(Span::styled(user, Style::default().fg(Color::Cyan)));

    let refresh = if state.is_loading() {
        "  │  Loading...".to_string()
    } else {
        state
            .last_refresh
            .map(|at| {
                format!(
                    "  │  Updated {}",
                    at.with_timezone(&state.zone).format("%-I:%M:%S %p")
                )
            })
            .unwrap_or_default()
    };
    spans.push(Span::styled(refresh, Style::default().fg(Color::DarkGray)));

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("ARROW SIGNALS"));
    frame.render_widget(header, area);
}

/// Card lines for a list of instruments, styled like the web cards
fn card_lines(
    instruments: &[&Instrument],
    favourite: impl Fn(&Instrument) -> bool,
    state: &DashboardState,
    now: DateTime<Utc>,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for inst in instruments.iter().copied() {
        let Some(card) = SignalCard::build(inst, favourite(inst), now, &state.zone) else {
            continue;
        };

        let action_color = match card.fields[0].1.as_str() {
            "Buy" => Color::Green,
            "Sell" => Color::Red,
            _ => Color::White,
        };
        lines.push(Line::from(vec![Span::styled(
            card.title(),
            Style::default()
                .fg(action_color)
                .add_modifier(Modifier::BOLD),
        )]));

        for chunk in card.fields.chunks(4) {
            let mut spans = vec![Span::raw("  ")];
            for (label, value) in chunk {
                spans.push(Span::styled(
                    format!("{}: ", label),
                    Style::default().fg(Color::DarkGray),
                ));
                spans.push(Span::styled(value.clone(), Style::default().fg(Color::White)));
                spans.push(Span::raw("   "));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(Span::styled(
            format!("  {}", card.footer()),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::default());
    }
    lines
}

fn cards_panel(
    frame: &mut Frame,
    area: Rect,
    title: String,
    lines: Vec<Line<'static>>,
    empty: &'static str,
    scroll: usize,
) {
    let body = if lines.is_empty() {
        vec![Line::from(Span::styled(empty, Style::default().fg(Color::DarkGray)))]
    } else {
        lines
    };
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    let panel = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(panel, area);
}

fn draw_home(frame: &mut Frame, area: Rect, state: &DashboardState, now: DateTime<Utc>) {
    let favourites: Vec<&Instrument> = state.favourites.iter().collect();
    let lines = card_lines(&favourites, |_| true, state, now);
    cards_panel(
        frame,
        area,
        format!("Favourites ({})", favourites.len()),
        lines,
        NO_FAVOURITES,
        state.card_scroll,
    );
}

fn filter_summary(state: &DashboardState) -> String {
    format!(
        "Market: {} (c/f/s)  │  Action: {} (b)  │  Time: {} (w)",
        state.filter.market.as_deref().unwrap_or("All"),
        state.filter.action.as_deref().unwrap_or("All"),
        state.window.map(|w| w.label()).unwrap_or("Any time"),
    )
}

fn draw_markets(frame: &mut Frame, area: Rect, state: &DashboardState, now: DateTime<Utc>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let filters = Paragraph::new(Line::from(Span::styled(
        filter_summary(state),
        Style::default().fg(Color::Yellow),
    )))
    .block(Block::default().borders(Borders::ALL).title("Filters"));
    frame.render_widget(filters, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let parts = state.signal_partition(now);
    let open = card_lines(&parts.open, |i| i.is_favourite, state, now);
    let closed = card_lines(&parts.closed, |i| i.is_favourite, state, now);

    cards_panel(
        frame,
        columns[0],
        format!("Open Signals ({})", parts.open.len()),
        open,
        NO_OPEN_SIGNALS,
        state.card_scroll,
    );
    cards_panel(
        frame,
        columns[1],
        format!("Closed Signals ({})", parts.closed.len()),
        closed,
        NO_CLOSED_SIGNALS,
        state.card_scroll,
    );
}

fn draw_admin(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    let markets: Vec<ListItem> = state
        .markets
        .iter()
        .map(|m| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("#{:<4}", m.id), Style::default().fg(Color::DarkGray)),
                Span::raw(m.name.clone()),
            ]))
        })
        .collect();
    let markets = List::new(markets).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Markets ({})", state.markets.len())),
    );
    frame.render_widget(markets, columns[0]);

    let mut lines = Vec::new();
    for row in &state.subscriptions {
        let card = SubscriptionCard::build(row, &state.zone);
        let days_color = if card.days_left <= 7 {
            Color::Red
        } else {
            Color::Green
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("({}) ", card.initial),
                Style::default().fg(Color::LightRed),
            ),
            Span::styled(card.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled(format!("[{}]", card.plan), Style::default().fg(Color::Green)),
        ]));
        lines.push(Line::from(vec![
            Span::raw("  Days Left: "),
            Span::styled(card.days_left.to_string(), Style::default().fg(days_color)),
            Span::raw(format!(
                "   Subscription Start: {}   Subscription End: {}",
                card.start, card.end
            )),
        ]));
        lines.push(Line::default());
    }
    cards_panel(
        frame,
        columns[1],
        format!("Subscriptions ({})", state.subscriptions.len()),
        lines,
        NO_SUBSCRIPTIONS,
        state.card_scroll,
    );
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let line = match state.active_notification() {
        Some(note) => {
            let color = match note.level {
                NotificationLevel::Success => Color::Green,
                NotificationLevel::Error => Color::Red,
            };
            Line::from(Span::styled(
                note.message.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => Line::from(Span::styled(
            "1/2/3 or Tab: screens   r: refresh   j/k: scroll cards   q: quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    let status = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, area);
}

/// Draw scrollable log panel
fn draw_logs(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let log_items: Vec<ListItem> = state
        .recent_logs
        .iter()
        .rev() // Most recent first
        .skip(state.log_scroll_offset)
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let level_color = match entry.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                "INFO" => Color::Cyan,
                "DEBUG" => Color::DarkGray,
                _ => Color::White,
            };

            ListItem::new(Line::from(vec![
                Span::styled(entry.timestamp.clone(), Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(format!("{:5}", entry.level), Style::default().fg(level_color)),
                Span::raw(" "),
                Span::raw(entry.message.clone()),
            ]))
        })
        .collect();

    let debug_indicator = if state.show_debug_logs {
        " [DEBUG ON]"
    } else {
        ""
    };
    let dropped = if state.dropped_logs_count > 0 {
        format!(" [{} dropped]", state.dropped_logs_count)
    } else {
        String::new()
    };
    let title = format!("Logs (↑/↓ scroll, L=debug){}{}", debug_indicator, dropped);

    let logs = List::new(log_items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(logs, area);
}
