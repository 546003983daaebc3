//! Command Palette - the interpreter core of a CRM command palette
//!
//! Turns free-text input into structured intents and drives the searches,
//! clipboard hints and history that surround them:
//!
//! - Parsing input into search, task creation, calculation or navigation
//! - Running one cancellable query per search source, discarding stale answers
//! - Debouncing keystrokes before anything reaches a provider
//! - Classifying clipboard content (email, phone number, URL)
//! - Keeping a bounded, deduplicated, persisted history
//! - Tracking the palette mode (command, recent, chain action)
//!
//! # Example
//!
//! ```
//! use command_palette::{Intent, parse};
//!
//! let command = parse("50000 * 0.02");
//! assert_eq!(command.intent, Intent::Calculate);
//! assert_eq!(command.calculation(), Some(1000.0));
//! ```

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod debounce;
pub mod history;
pub mod intent;
pub mod models;
pub mod palette;
pub mod search;

// Re-export commonly used types
pub use clipboard::classify;
pub use config::PaletteConfig;
pub use history::HistoryStore;
pub use intent::{IntentParser, parse};
pub use models::{
    ClipboardSuggestion, DetectedKind, HistoryEntry, HistoryKind, Intent, ParsedCommand,
    SearchSuggestion,
};
pub use palette::{Palette, PaletteMode, PaletteState};
pub use search::{SearchProvider, SessionManager};
