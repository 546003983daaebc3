//! Intent parser: free text to [`ParsedCommand`](crate::models::ParsedCommand).
//!
//! Pure and synchronous. The grammar lives in [`parser`], with the arithmetic
//! sub-grammar in [`calculator`] and date phrases in [`dates`].

pub mod calculator;
pub mod dates;
pub mod parser;
mod text;

pub use calculator::{CalcError, evaluate};
pub use parser::{IntentParser, parse};
pub(crate) use text::fold;
