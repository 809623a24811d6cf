use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use serde_json::Value;
use unibot_core::Question;

use crate::app::App;

pub struct QuestionsView;

impl QuestionsView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(8)])
            .split(area);

        Self::render_table(frame, chunks[0], app);
        Self::render_details(frame, chunks[1], app);
    }

    fn render_table(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let state = &app.questions;

        let pages = state.data.as_ref().map_or(1, |d| d.page_count());
        let total = state.data.as_ref().map_or(0, |d| d.total);
        let suffix = if state.loading { " · loading…" } else { "" };
        let title = format!(
            " Questions · page {}/{} · {} total{} ",
            state.page, pages, total, suffix
        );

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.surface()));

        if let Some(message) = &state.error {
            let error = Paragraph::new(Line::from(Span::styled(
                format!(" {}", message),
                Style::default().fg(theme.error()),
            )))
            .block(block);
            frame.render_widget(error, area);
            return;
        }

        let questions = state
            .data
            .as_ref()
            .map(|d| d.questions.as_slice())
            .unwrap_or_default();

        if questions.is_empty() {
            let text = if state.loading {
                " Loading…"
            } else {
                " No questions recorded yet"
            };
            let empty = Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(theme.foreground_dim()),
            )))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let header = Row::new(["ID", "Lesson", "Question", "Answer", "Recorded"].map(|h| {
            Cell::from(h).style(
                Style::default()
                    .fg(theme.accent())
                    .add_modifier(Modifier::BOLD),
            )
        }));

        let rows: Vec<Row> = questions
            .iter()
            .map(|q| {
                Row::new(vec![
                    Cell::from(id_text(q.id.as_ref())),
                    Cell::from(id_text(q.lesson_id.as_ref())),
                    Cell::from(q.question.clone().unwrap_or_default()),
                    Cell::from(q.answer.clone().unwrap_or_default())
                        .style(Style::default().fg(theme.success())),
                    Cell::from(q.created_at.clone().unwrap_or_default())
                        .style(Style::default().fg(theme.foreground_dim())),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(8),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
                Constraint::Length(20),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(theme.border())
                .add_modifier(Modifier::BOLD),
        );

        let mut table_state = TableState::default().with_selected(Some(state.selected));
        frame.render_stateful_widget(table, area, &mut table_state);
    }

    fn render_details(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let block = Block::default()
            .title(" Details ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.surface()));

        let selected: Option<&Question> = app
            .questions
            .data
            .as_ref()
            .and_then(|d| d.questions.get(app.questions.selected));

        let lines = match selected {
            Some(q) => vec![
                Line::from(vec![
                    Span::styled("Q: ", Style::default().fg(theme.accent())),
                    Span::raw(q.question.clone().unwrap_or_default()),
                ]),
                Line::from(vec![
                    Span::styled("A: ", Style::default().fg(theme.success())),
                    Span::raw(q.answer.clone().unwrap_or_default()),
                ]),
            ],
            None => vec![Line::from(Span::styled(
                "Nothing selected",
                Style::default().fg(theme.foreground_dim()),
            ))],
        };

        let details = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(details, area);
    }
}

fn id_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "—".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_text() {
        assert_eq!(id_text(Some(&Value::from(7))), "7");
        assert_eq!(id_text(Some(&Value::Null)), "—");
    }
}
