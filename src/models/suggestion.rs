use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result returned by a search provider.
///
/// `id` is only unique within a provider and `entity_type` pair. Suggestions
/// are created per query and discarded once a newer query resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub id: String,
    pub entity_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Opaque reference resolved by the action executor (route, record link...)
    pub action_ref: String,
    /// Passthrough payload for chain actions
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SearchSuggestion {
    pub fn new(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        title: impl Into<String>,
        action_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            title: title.into(),
            subtitle: None,
            action_ref: action_ref.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedKind {
    Email,
    Phone,
    Url,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub label: String,
    pub description: String,
    pub action_ref: String,
}

/// Action offered for the clipboard content, recomputed on every palette open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardSuggestion {
    pub detected_kind: DetectedKind,
    pub suggested_action: SuggestedAction,
    #[serde(default, skip_serializing)]
    pub source_value: String,
}
