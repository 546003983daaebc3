//! Data models shared by every palette component.
//!
//! - [`ParsedCommand`] - Classified intent for a piece of free text
//! - [`SearchSuggestion`] - One result produced by a search provider
//! - [`HistoryEntry`] - Persisted record of a past palette invocation
//! - [`ClipboardSuggestion`] - Action offered for structured clipboard content
//!
//! All of them are plain values; they derive serde traits so they can be
//! persisted (history) or printed by the CLI (everything else).

pub mod command;
pub mod history;
pub mod suggestion;

pub use command::{DueDate, EntityValue, Intent, ParsedCommand, entity_keys};
pub use history::{HistoryEntry, HistoryKind};
pub use suggestion::{ClipboardSuggestion, DetectedKind, SearchSuggestion, SuggestedAction};
