//! Search Session Manager: providers, per-source sessions and result merging.

pub mod merge;
pub mod provider;
pub mod session;

pub use merge::{RankedSuggestion, merge_results};
pub use provider::{ProviderError, SearchProvider, StaticProvider};
pub use session::{SessionManager, SessionSnapshot, SessionStatus, SubmitOutcome};
