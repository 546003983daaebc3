//! Search sessions: one in-flight query per source.
//!
//! Every [`SessionManager::submit`] bumps the source's sequence id and cancels
//! whatever that source still had pending. When a response comes back, its
//! sequence id is compared with the source's current one and the response is
//! dropped if a newer query has been issued since. Results for a source are
//! therefore presented in the order queries were issued, whatever order the
//! responses arrive in. Sources never affect each other.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::provider::{ProviderError, SearchProvider};
use crate::config::PaletteConfig;
use crate::models::SearchSuggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Pending,
    Resolved,
    Errored,
    Cancelled,
}

/// Observable state of one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub source_id: String,
    pub sequence_id: u64,
    pub status: SessionStatus,
    /// Query the current status refers to
    pub query: Option<String>,
    pub results: Vec<SearchSuggestion>,
    pub error: Option<String>,
}

/// What happened to one submitted query
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Resolved(Vec<SearchSuggestion>),
    Errored(String),
    /// A newer query or a close replaced this one; its result was discarded
    Superseded,
    /// Query below the minimum length, no request was issued
    Skipped,
    UnknownSource,
}

#[derive(Debug)]
struct Session {
    sequence_id: u64,
    status: SessionStatus,
    query: Option<String>,
    results: Vec<SearchSuggestion>,
    error: Option<String>,
    cancel: Option<CancellationToken>,
}

impl Session {
    fn new() -> Self {
        Self {
            sequence_id: 0,
            status: SessionStatus::Idle,
            query: None,
            results: Vec::new(),
            error: None,
            cancel: None,
        }
    }

    /// Start a new sequence, cancelling the pending request if there is one
    fn supersede(&mut self) -> u64 {
        self.sequence_id += 1;
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if self.status == SessionStatus::Pending {
            self.status = SessionStatus::Cancelled;
        }
        self.sequence_id
    }

    fn reset(&mut self) {
        self.status = SessionStatus::Idle;
        self.query = None;
        self.results.clear();
        self.error = None;
    }

    fn snapshot(&self, source_id: &str) -> SessionSnapshot {
        SessionSnapshot {
            source_id: source_id.to_string(),
            sequence_id: self.sequence_id,
            status: self.status,
            query: self.query.clone(),
            results: self.results.clone(),
            error: self.error.clone(),
        }
    }
}

struct Pending {
    sequence_id: u64,
    query: String,
    cancel: CancellationToken,
    provider: Arc<dyn SearchProvider>,
}

/// Owns the per-source sessions. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    providers: Arc<Vec<Arc<dyn SearchProvider>>>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    min_query_len: usize,
    timeout: Duration,
}

impl SessionManager {
    pub fn new(
        providers: Vec<Arc<dyn SearchProvider>>,
        min_query_len: usize,
        timeout: Duration,
    ) -> Self {
        let sessions =
            providers.iter().map(|provider| (provider.id().to_string(), Session::new())).collect();
        Self {
            providers: Arc::new(providers),
            sessions: Arc::new(Mutex::new(sessions)),
            min_query_len,
            timeout,
        }
    }

    pub fn from_config(config: &PaletteConfig, providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self::new(providers, config.min_query_len, config.provider_timeout())
    }

    /// Source ids in registration order
    pub fn source_ids(&self) -> Vec<String> {
        self.providers.iter().map(|provider| provider.id().to_string()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue `query` to `source_id`.
    ///
    /// Bookkeeping happens immediately: the previous request for the source is
    /// cancelled before this returns. The returned future performs the call and
    /// commits its result only if no newer query was issued in the meantime.
    pub fn submit(
        &self,
        source_id: &str,
        query: &str,
    ) -> impl Future<Output = SubmitOutcome> + Send + 'static {
        let prepared = self.prepare(source_id, query);
        let manager = self.clone();
        let source_id = source_id.to_string();

        async move {
            let pending = match prepared {
                Ok(pending) => pending,
                Err(outcome) => return outcome,
            };

            let timeout = manager.timeout;
            let cancel = pending.cancel.clone();
            let response = tokio::select! {
                biased;

                _ = cancel.cancelled() => None,

                result = tokio::time::timeout(
                    timeout,
                    pending.provider.search(&pending.query, pending.cancel.clone()),
                ) => Some(result.unwrap_or(Err(ProviderError::Timeout(timeout)))),
            };

            manager.commit(&source_id, pending.sequence_id, response)
        }
    }

    /// Issue `query` to every source at once and wait for all of them.
    /// Outcomes come back in completion order.
    pub async fn submit_all(&self, query: &str) -> Vec<SubmitOutcome> {
        let mut in_flight = JoinSet::new();
        for source_id in self.source_ids() {
            in_flight.spawn(self.submit(&source_id, query));
        }

        let mut outcomes = Vec::with_capacity(in_flight.len());
        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => warn!(error = %error, "search task failed"),
            }
        }
        outcomes
    }

    fn prepare(&self, source_id: &str, query: &str) -> Result<Pending, SubmitOutcome> {
        let Some(provider) = self.providers.iter().find(|provider| provider.id() == source_id)
        else {
            warn!(source = source_id, "query submitted to unknown source");
            return Err(SubmitOutcome::UnknownSource);
        };

        let query = query.trim();
        let mut sessions = self.lock();
        let session = sessions.entry(source_id.to_string()).or_insert_with(Session::new);
        let sequence_id = session.supersede();

        if query.chars().count() < self.min_query_len {
            session.reset();
            debug!(source = source_id, sequence = sequence_id, "query below minimum length");
            return Err(SubmitOutcome::Skipped);
        }

        let cancel = CancellationToken::new();
        session.cancel = Some(cancel.clone());
        session.status = SessionStatus::Pending;
        session.query = Some(query.to_string());
        session.error = None;
        debug!(
            source = source_id,
            sequence = sequence_id,
            query_len = query.chars().count(),
            "search submitted"
        );

        Ok(Pending { sequence_id, query: query.to_string(), cancel, provider: Arc::clone(provider) })
    }

    fn commit(
        &self,
        source_id: &str,
        sequence_id: u64,
        response: Option<Result<Vec<SearchSuggestion>, ProviderError>>,
    ) -> SubmitOutcome {
        let mut sessions = self.lock();
        let Some(session) = sessions.get_mut(source_id) else {
            return SubmitOutcome::Superseded;
        };

        if session.sequence_id != sequence_id {
            debug!(
                source = source_id,
                sequence = sequence_id,
                current = session.sequence_id,
                "discarding stale response"
            );
            return SubmitOutcome::Superseded;
        }

        let Some(response) = response else {
            return SubmitOutcome::Superseded;
        };

        session.cancel = None;
        match response {
            Ok(results) => {
                debug!(source = source_id, sequence = sequence_id, count = results.len(), "search resolved");
                session.status = SessionStatus::Resolved;
                session.results = results.clone();
                session.error = None;
                SubmitOutcome::Resolved(results)
            }
            Err(error) => {
                warn!(source = source_id, sequence = sequence_id, error = %error, "search failed");
                let message = error.to_string();
                session.status = SessionStatus::Errored;
                session.results.clear();
                session.error = Some(message.clone());
                SubmitOutcome::Errored(message)
            }
        }
    }

    pub fn current_state(&self, source_id: &str) -> Option<SessionSnapshot> {
        self.lock().get(source_id).map(|session| session.snapshot(source_id))
    }

    /// Snapshots of every source, in registration order
    pub fn states(&self) -> Vec<SessionSnapshot> {
        let sessions = self.lock();
        self.providers
            .iter()
            .filter_map(|provider| {
                let id = provider.id();
                sessions.get(id).map(|session| session.snapshot(id))
            })
            .collect()
    }

    /// Cancel every pending request. Late responses are discarded.
    pub fn cancel_all(&self) {
        for (source_id, session) in self.lock().iter_mut() {
            if session.status == SessionStatus::Pending {
                debug!(source = source_id.as_str(), "cancelling pending search");
            }
            session.supersede();
        }
    }

    /// Cancel everything and return every source to `Idle` with no results
    pub fn reset_all(&self) {
        for session in self.lock().values_mut() {
            session.supersede();
            session.reset();
        }
    }
}
