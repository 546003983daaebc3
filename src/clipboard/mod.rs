//! Clipboard inspection: read the system clipboard once per palette open and
//! turn structured content (email, phone number, URL) into a suggestion.
//!
//! Reading is best-effort. A missing clipboard, a denied permission or
//! non-text content all read as an empty string, which classifies to nothing.

use std::sync::OnceLock;

use arboard::Clipboard;
use regex::Regex;
use tracing::debug;

use crate::models::{ClipboardSuggestion, DetectedKind, SuggestedAction};

/// Longer clipboard content is never classified
const MAX_CLASSIFY_CHARS: usize = 2048;

/// Phone numbers carry between this many digits, separators excluded
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 9..=15;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email regex must compile")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\+?[0-9(][0-9 .\-()]*[0-9]$").expect("phone regex must compile")
    })
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:https?|ftp)://[^\s/$.?#][^\s]*$").expect("url regex must compile")
    })
}

/// Source of clipboard text (allows mocking in tests)
pub trait ClipboardReader {
    /// Current clipboard text, or an empty string when unavailable
    fn read(&mut self) -> String;
}

/// Real clipboard implementation using arboard
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let clipboard = match Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                debug!(error = %e, "clipboard unavailable");
                None
            }
        };
        Self { clipboard }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardReader for SystemClipboard {
    fn read(&mut self) -> String {
        let Some(clipboard) = self.clipboard.as_mut() else {
            return String::new();
        };
        match clipboard.get_text() {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "clipboard read failed");
                String::new()
            }
        }
    }
}

/// Classify clipboard text.
///
/// First match wins: email, then phone number, then scheme-qualified URL.
/// Unstructured text yields `None`.
pub fn classify(text: &str) -> Option<ClipboardSuggestion> {
    let value = text.trim();
    if value.is_empty() || value.chars().count() > MAX_CLASSIFY_CHARS {
        return None;
    }

    let kind = if email_re().is_match(value) {
        DetectedKind::Email
    } else if is_phone(value) {
        DetectedKind::Phone
    } else if url_re().is_match(value) {
        DetectedKind::Url
    } else {
        return None;
    };

    Some(ClipboardSuggestion {
        detected_kind: kind,
        suggested_action: action_for(kind),
        source_value: value.to_string(),
    })
}

/// Read `reader` once and classify what it returned
pub fn inspect(reader: &mut dyn ClipboardReader) -> Option<ClipboardSuggestion> {
    classify(&reader.read())
}

fn is_phone(value: &str) -> bool {
    if !phone_re().is_match(value) {
        return false;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    PHONE_DIGITS.contains(&digits)
}

fn action_for(kind: DetectedKind) -> SuggestedAction {
    let (label, description, action_ref) = match kind {
        DetectedKind::Email => (
            "Find contact by email",
            "Look up the person with the copied email address",
            "clipboard.search_email",
        ),
        DetectedKind::Phone => (
            "Find contact by phone",
            "Look up the person with the copied phone number",
            "clipboard.search_phone",
        ),
        DetectedKind::Url => ("Open link", "Open the copied URL", "clipboard.open_url"),
        DetectedKind::PlainText => ("Search", "Search for the copied text", "clipboard.search_text"),
    };

    SuggestedAction {
        label: label.to_string(),
        description: description.to_string(),
        action_ref: action_ref.to_string(),
    }
}
