mod keybinds;

pub use keybinds::{Action, KeyBinding, Keybinds};
