use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NextFocus,
    PrevFocus,
    ToggleMode,
    SwitchView,
    Start,
    Stop,
    ClearLogs,
    DismissError,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollTop,
    ScrollBottom,
    NextPage,
    PrevPage,
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn with_ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Plain printable keys double as text input in form fields.
    pub fn is_printable(&self) -> bool {
        matches!(self.code, KeyCode::Char(_))
            && self.modifiers.difference(KeyModifiers::SHIFT).is_empty()
    }
}

/// Key to action table. Printable bindings only fire when no text field
/// has focus.
pub struct Keybinds {
    bindings: HashMap<KeyBinding, Action>,
}

impl Default for Keybinds {
    fn default() -> Self {
        let table = [
            (KeyBinding::with_ctrl(KeyCode::Char('c')), Action::Quit),
            (KeyBinding::new(KeyCode::Char('q')), Action::Quit),
            (KeyBinding::new(KeyCode::Tab), Action::NextFocus),
            (
                KeyBinding {
                    code: KeyCode::BackTab,
                    modifiers: KeyModifiers::SHIFT,
                },
                Action::PrevFocus,
            ),
            (KeyBinding::new(KeyCode::BackTab), Action::PrevFocus),
            (KeyBinding::new(KeyCode::F(2)), Action::ToggleMode),
            (KeyBinding::new(KeyCode::F(3)), Action::SwitchView),
            (KeyBinding::new(KeyCode::Enter), Action::Start),
            (KeyBinding::with_ctrl(KeyCode::Char('s')), Action::Stop),
            (KeyBinding::with_ctrl(KeyCode::Char('l')), Action::ClearLogs),
            (KeyBinding::new(KeyCode::Esc), Action::DismissError),
            (KeyBinding::new(KeyCode::Up), Action::ScrollUp),
            (KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp),
            (KeyBinding::new(KeyCode::Down), Action::ScrollDown),
            (KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown),
            (KeyBinding::new(KeyCode::PageUp), Action::PageUp),
            (KeyBinding::new(KeyCode::PageDown), Action::PageDown),
            (KeyBinding::new(KeyCode::Home), Action::ScrollTop),
            (KeyBinding::new(KeyCode::End), Action::ScrollBottom),
            (KeyBinding::new(KeyCode::Right), Action::NextPage),
            (KeyBinding::new(KeyCode::Char('n')), Action::NextPage),
            (KeyBinding::new(KeyCode::Left), Action::PrevPage),
            (KeyBinding::new(KeyCode::Char('p')), Action::PrevPage),
            (KeyBinding::new(KeyCode::Char('r')), Action::Reload),
        ];

        Self {
            bindings: table.into_iter().collect(),
        }
    }
}

impl Keybinds {
    pub fn action_for(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        self.bindings.get(&KeyBinding { code, modifiers }).copied()
    }

    /// Footer hints for the dashboard.
    pub fn dashboard_hints() -> &'static [(&'static str, &'static str)] {
        &[
            ("Enter", "Start"),
            ("^S", "Stop"),
            ("^L", "Clear"),
            ("Tab", "Focus"),
            ("F2", "Mode"),
            ("F3", "Questions"),
            ("^C", "Quit"),
        ]
    }

    pub fn questions_hints() -> &'static [(&'static str, &'static str)] {
        &[
            ("←/→", "Page"),
            ("r", "Reload"),
            ("F3", "Dashboard"),
            ("q", "Quit"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let keybinds = Keybinds::default();
        assert_eq!(
            keybinds.action_for(KeyCode::Char('s'), KeyModifiers::CONTROL),
            Some(Action::Stop)
        );
        assert_eq!(
            keybinds.action_for(KeyCode::Enter, KeyModifiers::NONE),
            Some(Action::Start)
        );
        assert_eq!(keybinds.action_for(KeyCode::Char('x'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_printable() {
        assert!(KeyBinding::new(KeyCode::Char('q')).is_printable());
        assert!(KeyBinding {
            code: KeyCode::Char('Q'),
            modifiers: KeyModifiers::SHIFT
        }
        .is_printable());
        assert!(!KeyBinding::with_ctrl(KeyCode::Char('s')).is_printable());
        assert!(!KeyBinding::new(KeyCode::Enter).is_printable());
    }
}
