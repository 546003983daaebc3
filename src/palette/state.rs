//! Mode state machine of a single palette lifecycle.
//!
//! ```text
//!            toggle_recent / clear input
//!   Recent <-----------------------------> Command
//!                                          |    ^
//!                          select(result)  |    | escape / sentinel removed
//!                                          v    |
//!                                        ChainAction
//! ```
//!
//! Escape outside `ChainAction`, or an explicit close, ends the lifecycle.
//! Reopening always starts again in `Command` with empty input.

use serde::Serialize;

use crate::models::SearchSuggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMode {
    #[default]
    Command,
    Recent,
    ChainAction,
}

/// Result of the open/close hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Opened,
    Closed,
}

/// Result of an escape key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeAction {
    /// Left chain mode, the palette stays open
    ExitedChain,
    Closed,
    /// Palette was not open
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct PaletteState {
    open: bool,
    mode: PaletteMode,
    input: String,
    selected_entity: Option<SearchSuggestion>,
}

impl PaletteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> PaletteMode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn selected_entity(&self) -> Option<&SearchSuggestion> {
        self.selected_entity.as_ref()
    }

    /// Open in `Command` mode with empty input. Returns false if already open.
    pub fn open(&mut self) -> bool {
        if self.open {
            return false;
        }
        *self = Self { open: true, ..Self::default() };
        true
    }

    /// Returns false if already closed
    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        self.selected_entity = None;
        true
    }

    pub fn on_hotkey(&mut self) -> HotkeyAction {
        if self.open {
            self.close();
            HotkeyAction::Closed
        } else {
            self.open();
            HotkeyAction::Opened
        }
    }

    pub fn on_escape(&mut self) -> EscapeAction {
        if !self.open {
            return EscapeAction::Ignored;
        }
        if self.mode == PaletteMode::ChainAction {
            self.exit_chain(String::new());
            return EscapeAction::ExitedChain;
        }
        self.close();
        EscapeAction::Closed
    }

    /// Switch between `Command` and `Recent`, clearing the input.
    /// Does nothing in chain mode or while closed.
    pub fn toggle_recent(&mut self) -> bool {
        if !self.open {
            return false;
        }
        match self.mode {
            PaletteMode::Command => {
                self.mode = PaletteMode::Recent;
                self.input.clear();
                true
            }
            PaletteMode::Recent => {
                self.mode = PaletteMode::Command;
                true
            }
            PaletteMode::ChainAction => false,
        }
    }

    /// Replace the input with what the user typed. Returns the resulting mode.
    pub fn set_input(&mut self, text: &str) -> PaletteMode {
        if !self.open {
            return self.mode;
        }
        match self.mode {
            PaletteMode::Recent if !text.is_empty() => self.mode = PaletteMode::Command,
            PaletteMode::ChainAction => {
                let kept = self.sentinel().is_some_and(|sentinel| text.starts_with(&sentinel));
                if !kept {
                    self.exit_chain(text.to_string());
                    return self.mode;
                }
            }
            _ => {}
        }
        self.input = text.to_string();
        self.mode
    }

    /// Enter chain mode on `entity`. Only allowed from `Command`.
    pub fn select(&mut self, entity: SearchSuggestion) -> bool {
        if !self.open || self.mode != PaletteMode::Command {
            return false;
        }
        self.input = chain_sentinel(&entity);
        self.selected_entity = Some(entity);
        self.mode = PaletteMode::ChainAction;
        true
    }

    /// Prefix marking chain mode in the input
    pub fn sentinel(&self) -> Option<String> {
        self.selected_entity.as_ref().map(chain_sentinel)
    }

    /// Text typed after the sentinel while in chain mode
    pub fn chain_filter(&self) -> Option<&str> {
        let sentinel = self.sentinel()?;
        self.input.strip_prefix(sentinel.as_str()).map(str::trim)
    }

    fn exit_chain(&mut self, input: String) {
        self.mode = PaletteMode::Command;
        self.selected_entity = None;
        self.input = input;
    }
}

fn chain_sentinel(entity: &SearchSuggestion) -> String {
    format!("@{} ", entity.title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dupont() -> SearchSuggestion {
        SearchSuggestion::new("42", "person", "Jean Dupont", "/people/42")
    }

    fn opened() -> PaletteState {
        let mut state = PaletteState::new();
        state.open();
        state
    }

    #[test]
    fn test_hotkey_toggles_open() {
        let mut state = PaletteState::new();
        assert!(!state.is_open());
        assert_eq!(state.on_hotkey(), HotkeyAction::Opened);
        assert!(state.is_open());
        assert_eq!(state.mode(), PaletteMode::Command);
        assert_eq!(state.on_hotkey(), HotkeyAction::Closed);
        assert!(!state.is_open());
    }

    #[test]
    fn test_reopen_resets_to_command_with_empty_input() {
        let mut state = opened();
        state.set_input("dup");
        state.select(dupont());
        state.close();

        assert!(state.open());
        assert_eq!(state.mode(), PaletteMode::Command);
        assert_eq!(state.input(), "");
        assert!(state.selected_entity().is_none());
    }

    #[test]
    fn test_open_twice_is_noop() {
        let mut state = opened();
        state.set_input("abc");
        assert!(!state.open());
        assert_eq!(state.input(), "abc");
    }

    #[test]
    fn test_recent_toggle_clears_input() {
        let mut state = opened();
        state.set_input("dupont");
        assert!(state.toggle_recent());
        assert_eq!(state.mode(), PaletteMode::Recent);
        assert_eq!(state.input(), "");

        assert!(state.toggle_recent());
        assert_eq!(state.mode(), PaletteMode::Command);
    }

    #[test]
    fn test_typing_leaves_recent() {
        let mut state = opened();
        state.toggle_recent();
        assert_eq!(state.set_input(""), PaletteMode::Recent);
        assert_eq!(state.set_input("d"), PaletteMode::Command);
        assert_eq!(state.input(), "d");
    }

    #[test]
    fn test_select_enters_chain_mode() {
        let mut state = opened();
        state.set_input("dupont");
        assert!(state.select(dupont()));

        assert_eq!(state.mode(), PaletteMode::ChainAction);
        assert_eq!(state.selected_entity().unwrap().id, "42");
        assert_eq!(state.input(), "@Jean Dupont ");
        assert_eq!(state.chain_filter(), Some(""));
    }

    #[test]
    fn test_select_only_from_command() {
        let mut state = opened();
        state.toggle_recent();
        assert!(!state.select(dupont()));
        assert_eq!(state.mode(), PaletteMode::Recent);

        let mut closed = PaletteState::new();
        assert!(!closed.select(dupont()));
    }

    #[test]
    fn test_typing_after_sentinel_filters() {
        let mut state = opened();
        state.select(dupont());
        assert_eq!(state.set_input("@Jean Dupont tâche"), PaletteMode::ChainAction);
        assert_eq!(state.chain_filter(), Some("tâche"));
    }

    #[test]
    fn test_removing_sentinel_returns_to_command() {
        let mut state = opened();
        state.select(dupont());
        assert_eq!(state.set_input("@Jean Dupon"), PaletteMode::Command);
        assert!(state.selected_entity().is_none());
        assert_eq!(state.input(), "@Jean Dupon");
        assert!(state.chain_filter().is_none());
    }

    #[test]
    fn test_escape_leaves_chain_then_closes() {
        let mut state = opened();
        state.select(dupont());

        assert_eq!(state.on_escape(), EscapeAction::ExitedChain);
        assert!(state.is_open());
        assert_eq!(state.mode(), PaletteMode::Command);
        assert!(state.selected_entity().is_none());
        assert_eq!(state.input(), "");

        assert_eq!(state.on_escape(), EscapeAction::Closed);
        assert!(!state.is_open());
        assert_eq!(state.on_escape(), EscapeAction::Ignored);
    }

    #[test]
    fn test_escape_closes_from_recent() {
        let mut state = opened();
        state.toggle_recent();
        assert_eq!(state.on_escape(), EscapeAction::Closed);
    }

    #[test]
    fn test_recent_toggle_ignored_in_chain_mode() {
        let mut state = opened();
        state.select(dupont());
        assert!(!state.toggle_recent());
        assert_eq!(state.mode(), PaletteMode::ChainAction);
    }
}
