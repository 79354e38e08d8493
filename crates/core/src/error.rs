use crate::deck::Location;
use crate::value::ValueType;

/// All errors produced while parsing a deck or assembling a schedule.
///
/// `Lexical` and `TypeCoercion` are always fatal. `Schema` is what a
/// [`crate::ParseContext`] raises for a category whose action is
/// `ThrowException`; under other actions the same problem only lands in the
/// [`crate::MessageContainer`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeckError {
    /// Malformed text: unbalanced quote, unterminated keyword, bad repeat count.
    #[error("{location}: {message}")]
    Lexical { location: Location, message: String },

    /// A token that cannot be read as the declared item type.
    #[error("{location}: could not convert '{token}' to {expected} for item {item}")]
    TypeCoercion {
        location: Location,
        item: String,
        token: String,
        expected: ValueType,
    },

    /// Policy-controlled problem escalated to an error.
    #[error("{key}: {message}{}", at(.location))]
    Schema {
        key: String,
        location: Option<Location>,
        message: String,
    },

    /// Problems recorded with the `Delay` action, reported after the whole
    /// deck has been read.
    #[error("{count} delayed error(s), first: {first}")]
    Delayed { count: usize, first: String },

    /// Typed access with the wrong accessor.
    #[error("item {item} holds {found} values, not {expected}")]
    Type {
        item: String,
        expected: ValueType,
        found: ValueType,
    },

    /// Access to an element that was never given a value and has no default.
    #[error("item {item} has no value at index {index}")]
    Value { item: String, index: usize },

    #[error("key not found: {key}{}", did_you_mean(.suggestion))]
    KeyNotFound {
        key: String,
        suggestion: Option<String>,
    },

    #[error("index {index} out of range (size {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{message}")]
    Time { message: String },

    #[error("{path}: {message}")]
    Io { path: String, message: String },
}

fn at(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" (at {})", loc),
        None => String::new(),
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

impl DeckError {
    pub fn lexical(location: &Location, message: impl Into<String>) -> Self {
        DeckError::Lexical {
            location: location.clone(),
            message: message.into(),
        }
    }

    pub fn time(message: impl Into<String>) -> Self {
        DeckError::Time {
            message: message.into(),
        }
    }

    /// Short category name used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            DeckError::Lexical { .. } => "lexical",
            DeckError::TypeCoercion { .. } => "type_coercion",
            DeckError::Schema { .. } => "schema",
            DeckError::Delayed { .. } => "delayed",
            DeckError::Type { .. } => "type",
            DeckError::Value { .. } => "value",
            DeckError::KeyNotFound { .. } => "key_not_found",
            DeckError::IndexOutOfRange { .. } => "index_out_of_range",
            DeckError::InvalidArgument(_) => "invalid_argument",
            DeckError::Time { .. } => "time",
            DeckError::Io { .. } => "io",
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            DeckError::Lexical { location, .. } | DeckError::TypeCoercion { location, .. } => {
                Some(location)
            }
            DeckError::Schema { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Serialize for tool output. Every field is always present (null when
    /// unknown) so consumers can rely on a fixed shape.
    pub fn to_json_value(&self) -> serde_json::Value {
        let loc = self.location();
        serde_json::json!({
            "file":    loc.map(|l| l.file.clone()),
            "keyword": loc.map(|l| l.keyword.clone()),
            "kind":    self.kind(),
            "line":    loc.map(|l| l.line),
            "message": self.to_string(),
        })
    }
}
