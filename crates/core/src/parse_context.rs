//! Named error categories and the action taken when one is raised.
//!
//! Every recoverable anomaly the parser or the schedule builder meets is
//! reported under a string key. The context maps each key to an
//! [`Action`]; keys must be registered before they can be raised or
//! queried.

use crate::deck::Location;
use crate::error::DeckError;
use crate::messages::MessageContainer;
use crate::ordered_map::OrderedMap;
use crate::pattern::{has_wildcard, wildcard_match};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ThrowException,
    Warn,
    Ignore,
    /// Record as an error and fail once the whole input has been read.
    Delay,
}

/// Environment variables read by [`ParseContext::new`], applied in this
/// order.
pub const ENV_OVERRIDES: [(&str, Action); 3] = [
    ("DECKHAND_ERRORS_EXCEPTION", Action::ThrowException),
    ("DECKHAND_ERRORS_WARN", Action::Warn),
    ("DECKHAND_ERRORS_IGNORE", Action::Ignore),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParseContext {
    actions: OrderedMap<String, Action>,
    ignored_keywords: BTreeSet<String>,
}

impl ParseContext {
    /// Data lines after a keyword that sized itself from another keyword.
    pub const PARSE_EXTRA_RECORDS: &'static str = "PARSE_EXTRA_RECORDS";
    pub const PARSE_UNKNOWN_KEYWORD: &'static str = "PARSE_UNKNOWN_KEYWORD";
    /// Text between keywords that is neither a keyword nor data.
    pub const PARSE_RANDOM_TEXT: &'static str = "PARSE_RANDOM_TEXT";
    /// A lone `/` between keywords.
    pub const PARSE_RANDOM_SLASH: &'static str = "PARSE_RANDOM_SLASH";
    pub const PARSE_MISSING_DIMS_KEYWORD: &'static str = "PARSE_MISSING_DIMS_KEYWORD";
    /// Tokens left over after every item of a record was scanned.
    pub const PARSE_EXTRA_DATA: &'static str = "PARSE_EXTRA_DATA";
    pub const PARSE_MISSING_INCLUDE: &'static str = "PARSE_MISSING_INCLUDE";
    /// Keyword name longer than eight characters.
    pub const PARSE_LONG_KEYWORD: &'static str = "PARSE_LONG_KEYWORD";
    /// Well or group name with embedded whitespace.
    pub const PARSE_WGNAME_SPACE: &'static str = "PARSE_WGNAME_SPACE";
    pub const SCHEDULE_UNKNOWN_WELL: &'static str = "SCHEDULE_UNKNOWN_WELL";
    pub const SCHEDULE_UNKNOWN_GROUP: &'static str = "SCHEDULE_UNKNOWN_GROUP";
    pub const SCHEDULE_INVALID_CONTROL: &'static str = "SCHEDULE_INVALID_CONTROL";
    pub const SCHEDULE_UNHANDLED_KEYWORD: &'static str = "SCHEDULE_UNHANDLED_KEYWORD";

    pub const BUILTIN_KEYS: [&'static str; 13] = [
        Self::PARSE_EXTRA_RECORDS,
        Self::PARSE_UNKNOWN_KEYWORD,
        Self::PARSE_RANDOM_TEXT,
        Self::PARSE_RANDOM_SLASH,
        Self::PARSE_MISSING_DIMS_KEYWORD,
        Self::PARSE_EXTRA_DATA,
        Self::PARSE_MISSING_INCLUDE,
        Self::PARSE_LONG_KEYWORD,
        Self::PARSE_WGNAME_SPACE,
        Self::SCHEDULE_UNKNOWN_WELL,
        Self::SCHEDULE_UNKNOWN_GROUP,
        Self::SCHEDULE_INVALID_CONTROL,
        Self::SCHEDULE_UNHANDLED_KEYWORD,
    ];

    /// A context with no registered keys.
    pub fn empty() -> Self {
        ParseContext {
            actions: OrderedMap::new(),
            ignored_keywords: BTreeSet::new(),
        }
    }

    /// Every built-in key set to `ThrowException`; the environment is not
    /// consulted.
    pub fn with_defaults() -> Self {
        let mut ctx = Self::empty();
        for key in Self::BUILTIN_KEYS {
            ctx.add_key(key);
        }
        ctx
    }

    /// Built-in keys with the `DECKHAND_ERRORS_*` environment overrides
    /// applied.
    pub fn new() -> Self {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    /// Like [`ParseContext::new`] with a caller-supplied variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ctx = Self::with_defaults();
        ctx.apply_env_with(lookup);
        ctx
    }

    /// Apply the `DECKHAND_ERRORS_*` overrides on top of the current
    /// actions.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, action) in ENV_OVERRIDES {
            if let Some(pattern) = lookup(var) {
                tracing::debug!(var, pattern = %pattern, ?action, "error policy override");
                self.update(&pattern, action);
            }
        }
    }

    /// Register `key` with `ThrowException`. An existing key is untouched.
    pub fn add_key(&mut self, key: &str) {
        if !self.actions.contains_key(key) {
            self.actions.insert(key.to_owned(), Action::ThrowException);
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Result<Action, DeckError> {
        self.actions
            .get(key)
            .copied()
            .ok_or_else(|| DeckError::InvalidArgument(format!("unknown error key '{}'", key)))
    }

    /// Set `action` for every registered key matching `pattern`.
    ///
    /// The pattern is a `:` or `|` separated list; each element may use `*`
    /// and `?`. Elements that match nothing are ignored.
    pub fn update(&mut self, pattern: &str, action: Action) {
        for element in pattern.split([':', '|']).map(str::trim) {
            if element.is_empty() {
                continue;
            }
            if has_wildcard(element) {
                for (key, slot) in self.actions.iter_mut() {
                    if wildcard_match(element, key) {
                        *slot = action;
                    }
                }
            } else if let Some(slot) = self.actions.get_mut(element) {
                *slot = action;
            }
        }
    }

    pub fn update_all(&mut self, action: Action) {
        for (_, slot) in self.actions.iter_mut() {
            *slot = action;
        }
    }

    /// Unknown keywords with this name are skipped silently.
    pub fn ignore_keyword(&mut self, name: &str) {
        self.ignored_keywords.insert(name.to_ascii_uppercase());
    }

    pub fn is_keyword_ignored(&self, name: &str) -> bool {
        self.ignored_keywords.contains(name)
    }

    /// Apply the action registered for `key`.
    pub fn handle_error(
        &self,
        key: &str,
        message: &str,
        location: Option<&Location>,
        messages: &mut MessageContainer,
    ) -> Result<(), DeckError> {
        match self.get(key)? {
            Action::Ignore => Ok(()),
            Action::Warn => {
                match location {
                    Some(loc) => tracing::warn!(key, location = %loc, "{}", message),
                    None => tracing::warn!(key, "{}", message),
                }
                messages.warning(key, message, location);
                Ok(())
            }
            Action::Delay => {
                messages.error(key, message, location);
                Ok(())
            }
            Action::ThrowException => Err(DeckError::Schema {
                key: key.to_owned(),
                location: location.cloned(),
                message: message.to_owned(),
            }),
        }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::with_defaults()
    }
}
