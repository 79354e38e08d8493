//! Warnings and delayed errors collected during a parse or schedule build.

use crate::deck::Location;
use crate::error::DeckError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub severity: Severity,
    pub key: String,
    pub text: String,
    pub location: Option<Location>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}[{}]: {}", severity, self.key, self.text)?;
        if let Some(loc) = &self.location {
            write!(f, " (at {})", loc)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MessageContainer {
    messages: Vec<Message>,
}

impl MessageContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn warning(&mut self, key: &str, text: impl Into<String>, location: Option<&Location>) {
        self.push(Message {
            severity: Severity::Warning,
            key: key.to_owned(),
            text: text.into(),
            location: location.cloned(),
        });
    }

    pub fn error(&mut self, key: &str, text: impl Into<String>, location: Option<&Location>) {
        self.push(Message {
            severity: Severity::Error,
            key: key.to_owned(),
            text: text.into(),
            location: location.cloned(),
        });
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Messages recorded under `key`.
    pub fn with_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Message> {
        self.messages.iter().filter(move |m| m.key == key)
    }

    /// Fail with [`DeckError::Delayed`] when errors have been recorded.
    pub fn check_delayed(&self) -> Result<(), DeckError> {
        let mut errors = self.errors();
        match errors.next() {
            None => Ok(()),
            Some(first) => Err(DeckError::Delayed {
                count: 1 + errors.count(),
                first: first.to_string(),
            }),
        }
    }
}

impl<'a> IntoIterator for &'a MessageContainer {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
