use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::intent::fold;
use crate::models::SearchSuggestion;

/// Maximum suggestions returned by [`StaticProvider`]
const STATIC_RESULT_LIMIT: usize = 20;

/// Failure of a single provider call. `Display` is the inline message shown
/// next to that source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Failed(String),
    #[error("search service responded with status {0}")]
    Status(u16),
    #[error("search timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

/// Asynchronous source of suggestions (people, organisations, full text...).
///
/// Implementations should watch `cancel` and stop early once it fires; the
/// session manager discards the result of a cancelled call either way.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable identifier of this source
    fn id(&self) -> &str;

    async fn search(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<SearchSuggestion>, ProviderError>;
}

/// In-memory provider over a fixed catalogue of suggestions.
pub struct StaticProvider {
    id: String,
    catalog: Vec<SearchSuggestion>,
}

impl StaticProvider {
    pub fn new(id: impl Into<String>, catalog: Vec<SearchSuggestion>) -> Self {
        Self { id: id.into(), catalog }
    }

    /// Load a JSON array of suggestions
    pub fn from_json_file(id: impl Into<String>, path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog: Vec<SearchSuggestion> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
        Ok(Self::new(id, catalog))
    }

    pub fn lookup(&self, query: &str) -> Vec<SearchSuggestion> {
        let needle = fold(query.trim());
        if needle.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &SearchSuggestion)> = self
            .catalog
            .iter()
            .filter_map(|item| score(item, &needle).map(|score| (score, item)))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.title.cmp(&b.1.title))
        });

        scored.into_iter().take(STATIC_RESULT_LIMIT).map(|(_, item)| item.clone()).collect()
    }
}

fn score(item: &SearchSuggestion, needle: &str) -> Option<f32> {
    let title = fold(&item.title);
    if title == needle {
        return Some(1.0);
    }
    if title.starts_with(needle) || title.split_whitespace().any(|word| word.starts_with(needle)) {
        return Some(0.8);
    }
    if title.contains(needle) {
        return Some(0.4);
    }
    item.subtitle.as_deref().filter(|subtitle| fold(subtitle).contains(needle)).map(|_| 0.2)
}

#[async_trait]
impl SearchProvider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn search(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<SearchSuggestion>, ProviderError> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        Ok(self.lookup(query))
    }
}
