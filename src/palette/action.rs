use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{ClipboardSuggestion, ParsedCommand, SearchSuggestion};

/// What the palette hands to the host once the user commits to something.
/// The palette never performs the effect itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedAction {
    /// A structured intent (task creation, navigation, calculation)
    Command { command: ParsedCommand },
    /// A chain action on the selected entity
    Chain { entity: SearchSuggestion, action_ref: String },
    /// The action offered for the clipboard content
    Clipboard { suggestion: ClipboardSuggestion },
}

/// Performs the real-world effect of a resolved action
pub trait ActionExecutor {
    fn execute(&mut self, action: &ResolvedAction) -> Result<()>;
}

/// Writes each action as one JSON line
pub struct JsonLineExecutor<W: Write> {
    out: W,
}

impl<W: Write> JsonLineExecutor<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ActionExecutor for JsonLineExecutor<W> {
    fn execute(&mut self, action: &ResolvedAction) -> Result<()> {
        serde_json::to_writer(&mut self.out, action).context("Failed to serialize action")?;
        writeln!(self.out).context("Failed to write action")?;
        Ok(())
    }
}
