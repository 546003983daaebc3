use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Action,
    Search,
    Navigation,
}

/// One past palette invocation, persisted by the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub kind: HistoryKind,
    /// Unix epoch in milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(query: impl Into<String>, kind: HistoryKind) -> Self {
        Self::at(query, kind, Utc::now().timestamp_millis())
    }

    pub fn at(query: impl Into<String>, kind: HistoryKind, timestamp: i64) -> Self {
        Self { query: query.into(), kind, timestamp, metadata: None }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
