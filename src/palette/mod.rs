//! The palette itself: mode state machine, chain actions and the controller
//! that wires parser, sessions, debouncer, clipboard and history together.

pub mod action;
pub mod chain;
pub mod controller;
pub mod state;

pub use action::{ActionExecutor, JsonLineExecutor, ResolvedAction};
pub use chain::chain_actions;
pub use controller::{Palette, PaletteEvent, PaletteView};
pub use state::{EscapeAction, HotkeyAction, PaletteMode, PaletteState};
