use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use super::action::ResolvedAction;
use super::chain::chain_actions;
use super::state::{EscapeAction, HotkeyAction, PaletteMode, PaletteState};
use crate::clipboard::{self, ClipboardReader};
use crate::config::PaletteConfig;
use crate::debounce::Debouncer;
use crate::history::{HistoryStore, Storage};
use crate::intent::IntentParser;
use crate::models::{
    ClipboardSuggestion, HistoryEntry, HistoryKind, Intent, ParsedCommand, SearchSuggestion,
    SuggestedAction,
};
use crate::search::{
    RankedSuggestion, SearchProvider, SessionManager, SessionSnapshot, SubmitOutcome,
    merge_results,
};

/// Maximum merged results presented at once
const RESULT_LIMIT: usize = 30;

/// Something [`Palette::next_event`] waited for
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteEvent {
    /// Input went quiet; the query was sent to every source
    Committed(String),
    /// A source answered (or its request was superseded)
    Settled(SubmitOutcome),
}

/// Everything a front end needs to draw the palette
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaletteView {
    pub open: bool,
    pub mode: PaletteMode,
    pub input: String,
    /// Structured intent strong enough to act on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<ParsedCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<ClipboardSuggestion>,
    pub history: Vec<HistoryEntry>,
    pub sources: Vec<SessionSnapshot>,
    pub results: Vec<RankedSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_entity: Option<SearchSuggestion>,
    pub chain_actions: Vec<SuggestedAction>,
}

/// The command palette: keystrokes in, views and resolved actions out.
///
/// Input is parsed on every keystroke. Provider queries go through the
/// debouncer and are only issued by [`Palette::next_event`], which the host
/// awaits alongside its own input events. Calculations never reach the
/// providers.
pub struct Palette {
    parser: IntentParser,
    history: HistoryStore,
    sessions: SessionManager,
    debouncer: Debouncer<String>,
    in_flight: JoinSet<SubmitOutcome>,
    state: PaletteState,
    clipboard: Box<dyn ClipboardReader>,
    clipboard_suggestion: Option<ClipboardSuggestion>,
    parsed: ParsedCommand,
}

impl Palette {
    pub fn new(
        config: &PaletteConfig,
        providers: Vec<Arc<dyn SearchProvider>>,
        storage: Box<dyn Storage>,
        clipboard: Box<dyn ClipboardReader>,
    ) -> Self {
        Self {
            parser: IntentParser::from_config(config),
            history: HistoryStore::from_config(storage, config),
            sessions: SessionManager::from_config(config, providers),
            debouncer: Debouncer::new(config.debounce()),
            in_flight: JoinSet::new(),
            state: PaletteState::new(),
            clipboard,
            clipboard_suggestion: None,
            parsed: ParsedCommand::unknown(""),
        }
    }

    pub fn state(&self) -> &PaletteState {
        &self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Latest parse of the input
    pub fn parsed(&self) -> &ParsedCommand {
        &self.parsed
    }

    /// Open the palette and inspect the clipboard. Returns false if already open.
    pub fn open(&mut self) -> bool {
        if !self.state.open() {
            return false;
        }
        self.reset_pipeline();
        self.clipboard_suggestion = clipboard::inspect(self.clipboard.as_mut());
        debug!(clipboard = self.clipboard_suggestion.is_some(), "palette opened");
        true
    }

    /// Close the palette, cancelling pending searches and the debounce timer
    pub fn close(&mut self) -> bool {
        if !self.state.close() {
            return false;
        }
        self.teardown();
        debug!("palette closed");
        true
    }

    pub fn hotkey(&mut self) -> HotkeyAction {
        if self.state.is_open() {
            self.close();
            HotkeyAction::Closed
        } else {
            self.open();
            HotkeyAction::Opened
        }
    }

    pub fn escape(&mut self) -> EscapeAction {
        let action = self.state.on_escape();
        match action {
            EscapeAction::Closed => self.teardown(),
            EscapeAction::ExitedChain => self.parsed = ParsedCommand::unknown(""),
            EscapeAction::Ignored => {}
        }
        action
    }

    pub fn toggle_recent(&mut self) -> bool {
        if !self.state.toggle_recent() {
            return false;
        }
        if self.state.mode() == PaletteMode::Recent {
            self.reset_pipeline();
        } else {
            self.on_command_input();
        }
        true
    }

    /// The input now reads `text`
    pub fn input(&mut self, text: &str) {
        if !self.state.is_open() {
            return;
        }
        match self.state.set_input(text) {
            PaletteMode::Command => self.on_command_input(),
            PaletteMode::Recent | PaletteMode::ChainAction => {
                self.debouncer.cancel();
            }
        }
    }

    fn on_command_input(&mut self) {
        let text = self.state.input().trim().to_string();
        self.parsed = self.parser.parse(self.state.input());

        if self.parsed.intent == Intent::Calculate {
            self.debouncer.cancel();
            self.sessions.reset_all();
            return;
        }
        self.debouncer.push(text, Instant::now());
    }

    /// Wait for the next debounce commit or provider answer.
    ///
    /// Returns `None` once nothing is pending.
    pub async fn next_event(&mut self) -> Option<PaletteEvent> {
        let deadline = self.debouncer.deadline();
        tokio::select! {
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let query = self.debouncer.poll(Instant::now())?;
                self.commit(&query);
                Some(PaletteEvent::Committed(query))
            }
            Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                let outcome = joined.unwrap_or_else(|e| {
                    debug!(error = %e, "search task ended without a result");
                    SubmitOutcome::Superseded
                });
                Some(PaletteEvent::Settled(outcome))
            }
            else => None,
        }
    }

    /// Drive the palette until no commit or search is pending
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    fn commit(&mut self, query: &str) {
        debug!(query_len = query.chars().count(), "query committed");
        for source_id in self.sessions.source_ids() {
            self.in_flight.spawn(self.sessions.submit(&source_id, query));
        }
    }

    fn reset_pipeline(&mut self) {
        self.debouncer.cancel();
        self.sessions.reset_all();
        self.in_flight = JoinSet::new();
        self.parsed = ParsedCommand::unknown("");
    }

    fn teardown(&mut self) {
        self.debouncer.cancel();
        self.sessions.cancel_all();
        self.in_flight = JoinSet::new();
        self.parsed = ParsedCommand::unknown("");
        self.clipboard_suggestion = None;
    }

    fn merged_results(&self) -> Vec<RankedSuggestion> {
        let snapshots = self.sessions.states();
        let sets: Vec<(&str, &[SearchSuggestion])> = snapshots
            .iter()
            .map(|snapshot| (snapshot.source_id.as_str(), snapshot.results.as_slice()))
            .collect();
        merge_results(self.state.input(), &sets, RESULT_LIMIT)
    }

    fn current_chain_actions(&self) -> Vec<SuggestedAction> {
        match self.state.selected_entity() {
            Some(entity) => chain_actions(entity, self.state.chain_filter().unwrap_or("")),
            None => Vec::new(),
        }
    }

    pub fn view(&self) -> PaletteView {
        if !self.state.is_open() {
            return PaletteView::default();
        }

        let mut view = PaletteView {
            open: true,
            mode: self.state.mode(),
            input: self.state.input().to_string(),
            ..PaletteView::default()
        };

        match self.state.mode() {
            PaletteMode::Command => {
                let threshold = self.parser.threshold();
                view.intent =
                    self.parsed.is_actionable(threshold).then(|| self.parsed.clone());
                view.calculation = self.parsed.calculation();
                view.clipboard = self.clipboard_suggestion.clone();
                if view.input.trim().is_empty() {
                    view.history = self.history.list().to_vec();
                }
                if view.calculation.is_none() {
                    view.sources = self.sessions.states();
                    view.results = self.merged_results();
                }
            }
            PaletteMode::Recent => view.history = self.history.list().to_vec(),
            PaletteMode::ChainAction => {
                view.selected_entity = self.state.selected_entity().cloned();
                view.chain_actions = self.current_chain_actions();
            }
        }
        view
    }

    /// Pick entry `index` of the merged results and enter chain mode on it
    pub fn select_result(&mut self, index: usize) -> Option<SearchSuggestion> {
        if !self.state.is_open() || self.state.mode() != PaletteMode::Command {
            return None;
        }
        let suggestion = self.merged_results().into_iter().nth(index)?.suggestion;

        let query = match self.state.input().trim() {
            "" => suggestion.title.clone(),
            typed => typed.to_string(),
        };
        let mut metadata = Map::new();
        metadata.insert("entity_type".into(), Value::String(suggestion.entity_type.clone()));
        metadata.insert("id".into(), Value::String(suggestion.id.clone()));
        metadata.insert("title".into(), Value::String(suggestion.title.clone()));
        self.history.add(HistoryEntry::new(query, HistoryKind::Search).with_metadata(metadata));

        self.debouncer.cancel();
        self.sessions.cancel_all();
        self.state.select(suggestion.clone());
        self.parsed = ParsedCommand::unknown("");
        Some(suggestion)
    }

    /// Run entry `index` of the chain actions. Closes the palette.
    pub fn select_chain_action(&mut self, index: usize) -> Option<ResolvedAction> {
        let entity = self.state.selected_entity()?.clone();
        let action = self.current_chain_actions().into_iter().nth(index)?;
        self.close();
        Some(ResolvedAction::Chain { entity, action_ref: action.action_ref })
    }

    /// Act on the structured intent of the current input. Closes the palette.
    pub fn execute_command(&mut self) -> Option<ResolvedAction> {
        if !self.state.is_open()
            || self.state.mode() != PaletteMode::Command
            || !self.parsed.is_actionable(self.parser.threshold())
        {
            return None;
        }
        let command = self.parsed.clone();
        let kind = match command.intent {
            Intent::Navigate => HistoryKind::Navigation,
            _ => HistoryKind::Action,
        };
        self.history.add(HistoryEntry::new(command.raw_text.trim(), kind));
        self.close();
        Some(ResolvedAction::Command { command })
    }

    /// Take the action offered for the clipboard content. Closes the palette.
    pub fn accept_clipboard(&mut self) -> Option<ResolvedAction> {
        if self.state.mode() != PaletteMode::Command {
            return None;
        }
        let suggestion = self.clipboard_suggestion.clone()?;
        self.close();
        Some(ResolvedAction::Clipboard { suggestion })
    }

    /// In recent mode, put history entry `index` back into the input
    pub fn recall(&mut self, index: usize) -> Option<String> {
        if self.state.mode() != PaletteMode::Recent {
            return None;
        }
        let query = self.history.list().get(index)?.query.clone();
        self.input(&query);
        Some(query)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::history::MemoryStorage;
    use crate::models::DetectedKind;
    use crate::search::{SessionStatus, StaticProvider};

    struct FixedClipboard(&'static str);

    impl ClipboardReader for FixedClipboard {
        fn read(&mut self) -> String {
            self.0.to_string()
        }
    }

    fn people() -> Arc<dyn SearchProvider> {
        Arc::new(StaticProvider::new(
            "people",
            vec![
                SearchSuggestion::new("1", "person", "Jean Dupont", "/people/1")
                    .with_subtitle("ACME"),
                SearchSuggestion::new("2", "person", "Marie Curie", "/people/2"),
            ],
        ))
    }

    fn organisations() -> Arc<dyn SearchProvider> {
        Arc::new(StaticProvider::new(
            "organisations",
            vec![SearchSuggestion::new("9", "organisation", "Dupont SA", "/organisations/9")],
        ))
    }

    fn palette(clipboard: &'static str) -> Palette {
        Palette::new(
            &PaletteConfig::default(),
            vec![people(), organisations()],
            Box::new(MemoryStorage::new()),
            Box::new(FixedClipboard(clipboard)),
        )
    }

    fn result_titles(view: &PaletteView) -> Vec<&str> {
        view.results.iter().map(|r| r.suggestion.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_open_classifies_clipboard_once() {
        let mut palette = palette("jean@acme.fr");
        assert!(palette.open());

        let view = palette.view();
        assert!(view.open);
        assert_eq!(view.mode, PaletteMode::Command);
        assert_eq!(view.clipboard.unwrap().detected_kind, DetectedKind::Email);

        let action = palette.accept_clipboard().unwrap();
        assert!(matches!(action, ResolvedAction::Clipboard { .. }));
        assert!(!palette.state().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_commits_once_and_merges_sources() {
        let mut palette = palette("");
        palette.open();

        for text in ["d", "du", "dup", "dupont"] {
            palette.input(text);
            tokio::time::advance(Duration::from_millis(50)).await;
        }
        assert!(palette.sessions().states().iter().all(|s| s.status == SessionStatus::Idle));

        assert_eq!(palette.next_event().await, Some(PaletteEvent::Committed("dupont".into())));
        palette.settle().await;

        let view = palette.view();
        assert!(view.intent.is_none());
        assert_eq!(view.sources.len(), 2);
        assert!(view.sources.iter().all(|s| s.status == SessionStatus::Resolved));
        let titles = result_titles(&view);
        assert!(titles.contains(&"Jean Dupont"));
        assert!(titles.contains(&"Dupont SA"));
        assert!(!titles.contains(&"Marie Curie"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calculation_skips_providers() {
        let mut palette = palette("");
        palette.open();
        palette.input("12 * 3");

        assert_eq!(palette.next_event().await, None);
        let view = palette.view();
        assert_eq!(view.calculation, Some(36.0));
        assert_eq!(view.intent.unwrap().intent, Intent::Calculate);
        assert!(view.results.is_empty());
        assert!(palette.sessions().states().iter().all(|s| s.status == SessionStatus::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_before_debounce_emits_nothing() {
        let mut palette = palette("");
        palette.open();
        palette.input("dupont");
        palette.close();

        assert_eq!(palette.next_event().await, None);
        assert!(palette.sessions().states().iter().all(|s| s.status == SessionStatus::Idle));
        assert!(!palette.view().open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_result_then_chain_action() {
        let mut palette = palette("");
        palette.open();
        palette.input("jean dupont");
        palette.settle().await;

        let selected = palette.select_result(0).unwrap();
        assert_eq!(selected.title, "Jean Dupont");

        let view = palette.view();
        assert_eq!(view.mode, PaletteMode::ChainAction);
        assert_eq!(view.input, "@Jean Dupont ");
        assert_eq!(view.selected_entity.unwrap().id, "1");
        assert!(!view.chain_actions.is_empty());

        let history = palette.history().list();
        assert_eq!(history[0].query, "jean dupont");
        assert_eq!(history[0].kind, HistoryKind::Search);

        palette.input("@Jean Dupont email");
        let action = palette.select_chain_action(0).unwrap();
        assert_eq!(
            action,
            ResolvedAction::Chain { entity: selected, action_ref: "chain.send_email".into() }
        );
        assert!(!palette.state().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleting_sentinel_resumes_search() {
        let mut palette = palette("");
        palette.open();
        palette.input("dupont");
        palette.settle().await;
        palette.select_result(0).unwrap();

        palette.input("dupont sa");
        assert_eq!(palette.state().mode(), PaletteMode::Command);
        assert!(palette.state().selected_entity().is_none());
        assert_eq!(palette.next_event().await, Some(PaletteEvent::Committed("dupont sa".into())));
    }

    #[tokio::test]
    async fn test_execute_navigation_records_history() {
        let mut palette = palette("");
        palette.open();
        palette.input("/tasks");

        let Some(ResolvedAction::Command { command }) = palette.execute_command() else {
            panic!("expected a command");
        };
        assert_eq!(command.intent, Intent::Navigate);
        assert_eq!(palette.history().list()[0].query, "/tasks");
        assert_eq!(palette.history().list()[0].kind, HistoryKind::Navigation);
        assert!(!palette.state().is_open());
    }

    #[tokio::test]
    async fn test_plain_search_is_not_executable() {
        let mut palette = palette("");
        palette.open();
        palette.input("dupont");
        assert!(palette.execute_command().is_none());
        assert!(palette.state().is_open());
    }

    #[tokio::test]
    async fn test_recent_mode_lists_and_recalls_history() {
        let mut palette = palette("");
        palette.open();
        palette.input("/tasks");
        palette.execute_command();

        palette.open();
        assert_eq!(palette.view().history.len(), 1);
        assert!(palette.toggle_recent());
        let view = palette.view();
        assert_eq!(view.mode, PaletteMode::Recent);
        assert_eq!(view.history[0].query, "/tasks");

        assert_eq!(palette.recall(0).as_deref(), Some("/tasks"));
        assert_eq!(palette.state().mode(), PaletteMode::Command);
        assert_eq!(palette.parsed().intent, Intent::Navigate);
    }

    #[tokio::test]
    async fn test_escape_in_chain_mode_keeps_palette_open() {
        let mut palette = palette("");
        palette.open();
        palette.state.set_input("x");
        palette.state.select(SearchSuggestion::new("1", "person", "Jean Dupont", "/people/1"));

        assert_eq!(palette.escape(), EscapeAction::ExitedChain);
        assert!(palette.view().open);
        assert_eq!(palette.escape(), EscapeAction::Closed);
        assert!(!palette.view().open);
    }
}
