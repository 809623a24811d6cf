use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::Spinner;
use crate::app::{App, View};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Header;

impl Header {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(20),
                Constraint::Min(20),
                Constraint::Length(22),
            ])
            .split(area);

        let logo = Paragraph::new(Line::from(vec![
            Span::styled(
                "Uni-Bot ",
                Style::default()
                    .fg(theme.foreground())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("v{}", VERSION),
                Style::default().fg(theme.foreground_dim()),
            ),
        ]))
        .block(Block::default().borders(Borders::NONE))
        .style(Style::default().bg(theme.background()));
        frame.render_widget(logo, chunks[0]);

        let tab_titles: Vec<Line> = View::all()
            .iter()
            .map(|v| {
                let style = if *v == app.current_view {
                    Style::default()
                        .fg(theme.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.foreground_dim())
                };
                Line::from(Span::styled(v.name(), style))
            })
            .collect();

        let tabs = Tabs::new(tab_titles)
            .block(Block::default().borders(Borders::NONE))
            .style(Style::default().bg(theme.background()))
            .highlight_style(Style::default().fg(theme.accent()))
            .select(
                View::all()
                    .iter()
                    .position(|v| *v == app.current_view)
                    .unwrap_or(0),
            )
            .divider(Span::raw(" │ "));
        frame.render_widget(tabs, chunks[1]);

        let status = &app.session.display_status;
        let mut spans = Vec::new();
        if app.session.busy {
            spans.push(Spinner::new().span(theme, app.animation_tick));
            spans.push(Span::raw(" "));
        }
        if status.running {
            spans.push(Span::styled(
                "● Running",
                Style::default()
                    .fg(theme.success())
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled("○ Idle", Style::default().fg(theme.warning())));
        }

        let indicator = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Right)
            .block(Block::default().borders(Borders::NONE))
            .style(Style::default().bg(theme.background()));
        frame.render_widget(indicator, chunks[2]);
    }
}
