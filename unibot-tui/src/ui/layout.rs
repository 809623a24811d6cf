use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::Style,
    widgets::Block,
    Frame,
};

use crate::app::{App, View};
use crate::ui::views::{DashboardView, QuestionsView};
use crate::ui::widgets::{Footer, Header};

pub struct MainLayout;

impl MainLayout {
    pub fn render(frame: &mut Frame, app: &App) {
        let theme = app.current_theme();
        let size = frame.area();

        frame.render_widget(
            Block::default().style(
                Style::default()
                    .bg(theme.background())
                    .fg(theme.foreground()),
            ),
            size,
        );

        let chunks = Self::split(size);

        Header::render(frame, chunks[0], app);

        match app.current_view {
            View::Dashboard => DashboardView::render(frame, chunks[1], app),
            View::Questions => QuestionsView::render(frame, chunks[1], app),
        }

        Footer::render(frame, chunks[2], app);
    }

    fn split(screen: Rect) -> [Rect; 3] {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(1),
            ])
            .split(screen);
        [chunks[0], chunks[1].inner(Margin::new(1, 0)), chunks[2]]
    }

    /// Rows available to log lines on a screen of this size.
    pub fn log_rows(screen: Rect) -> usize {
        let content = Self::split(screen)[1];
        DashboardView::logs_area(content).height.saturating_sub(2) as usize
    }
}
