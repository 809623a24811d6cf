use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::theme::Theme;

/// Braille activity indicator driven by the UI tick counter.
pub struct Spinner {
    frames: &'static [&'static str],
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            frames: &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
        }
    }

    pub fn frame(&self, tick: u64) -> &'static str {
        let idx = (tick as usize) % self.frames.len();
        self.frames[idx]
    }

    pub fn span(&self, theme: &dyn Theme, tick: u64) -> Span<'static> {
        Span::styled(
            self.frame(tick),
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        )
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}
