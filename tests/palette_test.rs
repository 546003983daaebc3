//! End-to-end palette behaviour through the public API, on virtual time
mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use command_palette::clipboard::ClipboardReader;
use command_palette::history::MemoryStorage;
use command_palette::palette::{Palette, PaletteEvent, PaletteMode, ResolvedAction};
use command_palette::search::{
    ProviderError, SearchProvider, SessionManager, SessionStatus, StaticProvider, SubmitOutcome,
};
use command_palette::{Intent, PaletteConfig, SearchSuggestion};
use common::{organisation_catalog, people_catalog};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Answers each query after a fixed delay, ignoring cancellation
struct DelayedProvider {
    id: &'static str,
    delays: HashMap<&'static str, u64>,
}

#[async_trait]
impl SearchProvider for DelayedProvider {
    fn id(&self) -> &str {
        self.id
    }

    async fn search(
        &self,
        query: &str,
        _cancel: CancellationToken,
    ) -> Result<Vec<SearchSuggestion>, ProviderError> {
        let delay = self.delays.get(query).copied().unwrap_or(10);
        sleep(Duration::from_millis(delay)).await;
        if query == "boom" {
            return Err(ProviderError::Failed("service unavailable".into()));
        }
        Ok(vec![SearchSuggestion::new(query, "person", query.to_uppercase(), "/people")])
    }
}

struct EmptyClipboard;

impl ClipboardReader for EmptyClipboard {
    fn read(&mut self) -> String {
        String::new()
    }
}

fn delayed(delays: &[(&'static str, u64)]) -> Arc<dyn SearchProvider> {
    Arc::new(DelayedProvider { id: "people", delays: delays.iter().copied().collect() })
}

fn catalog_palette() -> Palette {
    Palette::new(
        &PaletteConfig::default(),
        vec![
            Arc::new(StaticProvider::new("people", people_catalog())),
            Arc::new(StaticProvider::new("organisations", organisation_catalog())),
        ],
        Box::new(MemoryStorage::new()),
        Box::new(EmptyClipboard),
    )
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_discarded_in_both_orders() {
    // (delay of A, delay of B): B resolves first, then A resolves first
    for (delay_a, delay_b) in [(500, 100), (100, 500)] {
        let sessions = SessionManager::new(
            vec![delayed(&[("aaa", delay_a), ("bbb", delay_b)])],
            2,
            Duration::from_secs(8),
        );

        let a = tokio::spawn(sessions.submit("people", "aaa"));
        sleep(Duration::from_millis(10)).await;
        let b = tokio::spawn(sessions.submit("people", "bbb"));

        assert_eq!(a.await.unwrap(), SubmitOutcome::Superseded);
        assert!(matches!(b.await.unwrap(), SubmitOutcome::Resolved(_)));

        // Give any straggler time to land
        sleep(Duration::from_secs(1)).await;
        let state = sessions.current_state("people").unwrap();
        assert_eq!(state.status, SessionStatus::Resolved);
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].title, "BBB", "delays {delay_a}/{delay_b}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_provider_failure_shown_inline_per_source() {
    let failing: Arc<dyn SearchProvider> = Arc::new(DelayedProvider {
        id: "fulltext",
        delays: HashMap::new(),
    });
    let sessions = SessionManager::new(
        vec![failing, Arc::new(StaticProvider::new("people", people_catalog()))],
        2,
        Duration::from_secs(8),
    );

    let (fulltext, people) =
        tokio::join!(sessions.submit("fulltext", "boom"), sessions.submit("people", "boom"));
    assert_eq!(fulltext, SubmitOutcome::Errored("service unavailable".into()));
    assert_eq!(people, SubmitOutcome::Resolved(Vec::new()));

    let states = sessions.states();
    assert_eq!(states[0].status, SessionStatus::Errored);
    assert_eq!(states[0].error.as_deref(), Some("service unavailable"));
    assert_eq!(states[1].status, SessionStatus::Resolved);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_timing_through_palette() {
    let mut palette = catalog_palette();
    palette.open();
    let start = Instant::now();

    for (offset, text) in [(0, "d"), (50, "du"), (100, "dup"), (150, "dupo")] {
        tokio::time::sleep_until(start + Duration::from_millis(offset)).await;
        palette.input(text);
    }

    assert_eq!(palette.next_event().await, Some(PaletteEvent::Committed("dupo".into())));
    assert_eq!(Instant::now() - start, Duration::from_millis(450));

    palette.settle().await;
    let view = palette.view();
    assert!(view.results.iter().any(|r| r.suggestion.title == "Jean Dupont"));
}

#[tokio::test(start_paused = true)]
async fn test_full_session_select_chain_and_history() {
    let mut palette = catalog_palette();

    palette.open();
    palette.input("dupont");
    palette.settle().await;

    let view = palette.view();
    let index = view
        .results
        .iter()
        .position(|r| r.suggestion.title == "Dupont SA")
        .expect("organisation result");
    let selected = palette.select_result(index).unwrap();
    assert_eq!(selected.entity_type, "organisation");
    assert_eq!(palette.state().mode(), PaletteMode::ChainAction);

    palette.input("@Dupont SA contacts");
    let view = palette.view();
    assert_eq!(view.chain_actions.len(), 1);
    assert_eq!(view.chain_actions[0].action_ref, "chain.list_people");

    let action = palette.select_chain_action(0).unwrap();
    assert_eq!(
        action,
        ResolvedAction::Chain { entity: selected, action_ref: "chain.list_people".into() }
    );

    // Reopening starts fresh, with the selection remembered in history
    palette.open();
    let view = palette.view();
    assert_eq!(view.mode, PaletteMode::Command);
    assert_eq!(view.input, "");
    assert_eq!(view.history[0].query, "dupont");
    assert!(view.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_task_command_resolves_date_later() {
    let mut palette = catalog_palette();
    palette.open();
    palette.input("créer tâche appeler Dupont demain");

    let view = palette.view();
    let intent = view.intent.expect("actionable task");
    assert_eq!(intent.intent, Intent::CreateTask);

    let Some(ResolvedAction::Command { command }) = palette.execute_command() else {
        panic!("expected a command");
    };
    let today = chrono::NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    assert_eq!(
        command.due_date().and_then(|due| due.resolve(today)),
        chrono::NaiveDate::from_ymd_opt(2025, 2, 1)
    );
    assert_eq!(palette.history().list()[0].query, "créer tâche appeler Dupont demain");
}
