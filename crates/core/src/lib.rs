#![allow(clippy::result_large_err)]
//! deckhand-core: Eclipse deck parser and schedule state engine.
//!
//! Reads keyword-driven reservoir simulation input decks into a typed
//! [`Deck`], then folds the SCHEDULE section into per-report-step state.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Parser`] -- turn deck text or files into a [`Deck`]
//! - [`ParseContext`] -- error policy registry consulted during parsing
//! - [`MessageContainer`] -- warnings and delayed errors from a parse
//! - [`Schedule`] -- well, group and tuning state per report step
//! - [`DynamicState`] / [`TimeMap`] -- piecewise-constant time series
//! - [`OrderedMap`] -- insertion-ordered map used throughout
//! - [`DeckError`] -- the single error type
//!
//! A typical run:
//!
//! ```no_run
//! use deckhand_core::{MessageContainer, ParseContext, Parser, Schedule};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), deckhand_core::DeckError> {
//! let parser = Parser::with_builtin()?;
//! let context = ParseContext::new();
//! let mut messages = MessageContainer::new();
//! let deck = parser.parse_file(Path::new("CASE.DATA"), &context, &mut messages)?;
//! let schedule = Schedule::new(&deck, &context, &mut messages)?;
//! println!("{} report steps", schedule.time_map().num_steps());
//! # Ok(())
//! # }
//! ```

pub mod deck;
pub mod dynamic_state;
pub mod error;
pub mod intervals;
pub mod item;
pub mod lexer;
pub mod messages;
pub mod ordered_map;
pub mod parse_context;
pub mod parser;
pub mod pattern;
pub mod schedule;
pub mod schema;
pub mod source;
pub mod time_map;
pub mod value;

// ── Convenience re-exports: key types ────────────────────────────────

pub use deck::{Deck, DeckKeyword, DeckRecord, Location, Section};
pub use dynamic_state::DynamicState;
pub use error::DeckError;
pub use item::{DeckItem, ValueStatus};
pub use messages::{Message, MessageContainer, Severity};
pub use ordered_map::OrderedMap;
pub use parse_context::{Action, ParseContext};
pub use schedule::{Events, Schedule};
pub use schema::{KeywordDictionary, KeywordSize, ParserItem, ParserKeyword, SizeType};
pub use time_map::TimeMap;
pub use value::{DeckValue, ValueType};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use parser::Parser;
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
