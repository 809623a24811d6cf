use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use unibot_core::StartMode;

use crate::app::App;
use crate::form::Focus;
use crate::theme::Theme;

pub struct DashboardView;

impl DashboardView {
    fn split(area: Rect) -> [Rect; 3] {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);
        [chunks[0], chunks[1], chunks[2]]
    }

    pub fn logs_area(area: Rect) -> Rect {
        Self::split(area)[2]
    }

    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let [top, notice, logs] = Self::split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(top);

        Self::render_form(frame, columns[0], app);
        Self::render_status(frame, columns[1], app);
        Self::render_notice(frame, notice, app);
        Self::render_logs(frame, logs, app);
    }

    fn panel<'a>(title: &'a str, focused: bool, theme: &dyn Theme) -> Block<'a> {
        let border = if focused {
            theme.border_focused()
        } else {
            theme.border()
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(theme.surface()))
    }

    fn render_form(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let form = &app.form;

        let block = Self::panel(" Start ", app.focus != Focus::Logs, theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lesson_label = match form.mode {
            StartMode::Single => "Lesson",
            StartMode::Batch => "Lessons",
        };
        let password = form.masked_password();
        let skip = if form.skip_video { "[x]" } else { "[ ]" };

        let field = |label: &str, value: &str, focus: Focus| -> Line<'static> {
            let focused = app.focus == focus;
            let marker = if focused { "›" } else { " " };
            let value_style = if focused {
                Style::default()
                    .fg(theme.foreground())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.foreground())
            };
            let cursor = if focused && focus.is_text() { "▏" } else { "" };
            Line::from(vec![
                Span::styled(marker.to_string(), Style::default().fg(theme.accent())),
                Span::styled(
                    format!("{:<9}", label),
                    Style::default().fg(theme.foreground_dim()),
                ),
                Span::styled(format!("{}{}", value, cursor), value_style),
            ])
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(" Mode     ", Style::default().fg(theme.foreground_dim())),
                Span::styled(
                    form.mode.label(),
                    Style::default()
                        .fg(theme.accent())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("  (F2)", Style::default().fg(theme.foreground_dim())),
            ]),
            field("Email", &form.email, Focus::Email),
            field("Password", &password, Focus::Password),
            field(lesson_label, form.lessons(), Focus::Lessons),
            field("No video", skip, Focus::SkipVideo),
        ];

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_status(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let status = &app.session.display_status;

        let block = Self::panel(" Agent ", false, theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let state = if status.running {
            Span::styled(
                "Running",
                Style::default()
                    .fg(theme.success())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("Idle", Style::default().fg(theme.warning()))
        };

        let row = |label: &str, value: Span<'static>| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<10}", label),
                    Style::default().fg(theme.foreground_dim()),
                ),
                value,
            ])
        };
        let text = |value: Option<&str>| {
            Span::styled(
                value.unwrap_or("—").to_string(),
                Style::default().fg(theme.foreground()),
            )
        };

        let session = app.session.session.as_ref().map(|s| s.to_string());
        let lines = vec![
            row("State", state),
            row("Lesson", text(status.current_lesson.as_deref())),
            row("Last run", text(status.last_run.as_deref())),
            row("Log lines", text(Some(&status.log_count.to_string()))),
            row("Session", text(session.as_deref())),
        ];

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_notice(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        let line = match &app.session.error {
            Some(message) => Line::from(vec![
                Span::styled(
                    " ✗ ",
                    Style::default()
                        .fg(theme.error())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(message.clone(), Style::default().fg(theme.error())),
                Span::styled("  (Esc)", Style::default().fg(theme.foreground_dim())),
            ]),
            None if !app.start_enabled && !app.session.display_status.running => {
                Line::from(Span::styled(
                    " Waiting for agent status…",
                    Style::default().fg(theme.foreground_dim()),
                ))
            }
            None => Line::default(),
        };

        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let viewport = &app.viewport;
        let logs = &app.session.logs;

        let follow = if viewport.auto_follow() {
            "following"
        } else {
            "paused"
        };
        let title = format!(" Logs ({}) · {} ", logs.len(), follow);
        let block = Self::panel(&title, app.focus == Focus::Logs, theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if logs.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                " No logs yet",
                Style::default().fg(theme.foreground_dim()),
            )));
            frame.render_widget(empty, inner);
            return;
        }

        let range = viewport.visible_range();
        let lines: Vec<Line> = logs
            .get(range.start..range.end.min(logs.len()))
            .unwrap_or_default()
            .iter()
            .map(|line| Line::from(Span::styled(line.clone(), Style::default().fg(theme.foreground()))))
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);

        if viewport.content_height() > viewport.viewport_height() {
            let mut state = ScrollbarState::new(viewport.content_height())
                .viewport_content_length(viewport.viewport_height())
                .position(viewport.scroll_top());
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .style(Style::default().fg(theme.border())),
                area.inner(Margin::new(0, 1)),
                &mut state,
            );
        }
    }
}
