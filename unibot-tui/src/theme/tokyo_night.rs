use ratatui::style::Color;

use super::{hex_to_color, Theme};

pub struct TokyoNight;

impl Theme for TokyoNight {
    fn name(&self) -> &'static str {
        "Tokyo Night"
    }

    fn background(&self) -> Color {
        hex_to_color(0x1a1b26)
    }

    fn foreground(&self) -> Color {
        hex_to_color(0xc0caf5)
    }

    fn foreground_dim(&self) -> Color {
        hex_to_color(0x565f89)
    }

    fn surface(&self) -> Color {
        hex_to_color(0x24283b)
    }

    fn border(&self) -> Color {
        hex_to_color(0x414868)
    }

    fn border_focused(&self) -> Color {
        hex_to_color(0xbb9af7)
    }

    fn accent(&self) -> Color {
        hex_to_color(0x7aa2f7)
    }

    fn success(&self) -> Color {
        hex_to_color(0x9ece6a)
    }

    fn warning(&self) -> Color {
        hex_to_color(0xe0af68)
    }

    fn error(&self) -> Color {
        hex_to_color(0xf7768e)
    }
}
