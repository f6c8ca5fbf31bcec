//! Overlay rendering: command palette and key binding help.
//!
//! Overlays paint after the active workflow so they sit on top; the
//! [`ratatui::widgets::Clear`] widget punches out the backdrop first.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

use crate::keys::GlobalAction;
use crate::palette::PanelPalette;
use crate::theme::Theme;

/// Center a `width` x `height` box inside `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(horizontal[1]);
    vertical[1]
}

/// Draw the command palette: a filter line above the matching panel types.
pub fn render_palette(frame: &mut Frame<'_>, area: Rect, palette: &PanelPalette, theme: &Theme) {
    if !palette.is_visible() {
        return;
    }

    let entries = palette.filtered();
    let height = u16::try_from(entries.len() + 4).unwrap_or(u16::MAX).min(16);
    let overlay = centered(area, 60, height.max(5));
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Open Panel (Enter to select, Esc to cancel) ")
        .border_style(theme.border_style(true));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let filter = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(theme.accent)),
        Span::raw(palette.query().to_string()),
    ]));
    frame.render_widget(filter, rows[0]);

    let items: Vec<ListItem<'_>> = entries
        .iter()
        .map(|entry| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    entry.type_name,
                    Style::default().fg(theme.fg),
                )),
                Line::from(Span::styled(
                    format!("  {}", entry.description),
                    theme.muted_style(),
                )),
            ])
        })
        .collect();

    let mut state = ListState::default();
    if !entries.is_empty() {
        state.select(Some(palette.selected().min(entries.len() - 1)));
    }
    let list = List::new(items).highlight_style(theme.highlight_style());
    frame.render_stateful_widget(list, rows[1], &mut state);
}

/// Draw the key binding help overlay.
pub fn render_help(frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
    let height = u16::try_from(GlobalAction::HINTS.len() + 2).unwrap_or(u16::MAX);
    let overlay = centered(area, 52, height);
    frame.render_widget(Clear, overlay);

    let lines: Vec<Line<'_>> = GlobalAction::HINTS
        .iter()
        .map(|(keys, effect)| {
            Line::from(vec![
                Span::styled(format!(" {keys:<24}"), Style::default().fg(theme.accent)),
                Span::styled((*effect).to_string(), Style::default().fg(theme.fg)),
            ])
        })
        .collect();

    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Key Bindings ")
            .border_style(theme.border_style(true)),
    );
    frame.render_widget(help, overlay);
}
