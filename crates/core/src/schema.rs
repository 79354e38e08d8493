//! Keyword dictionary: per-keyword size policy and record item schemas.
//!
//! Schemas are read from JSON. The built-in dictionary covers the section
//! markers, the include machinery and the keywords the schedule interprets;
//! more keywords can be loaded with [`KeywordDictionary::load_json_str`] or
//! [`KeywordDictionary::load_file`].

use crate::deck::Section;
use crate::error::DeckError;
use crate::lexer::valid_deck_name;
use crate::ordered_map::OrderedMap;
use crate::value::{DeckValue, ValueType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest keyword name the deck format allows.
pub const MAX_KEYWORD_LENGTH: usize = 8;

const BUILTIN_KEYWORDS: &str = include_str!("../keywords/builtin.json");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeType {
    #[default]
    Single,
    All,
}

/// How many records a keyword has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSize {
    /// Records until a lone `/`.
    SlashTerminated,
    /// Exactly this many records and no terminator.
    Fixed(usize),
    /// Record count read from an item of the last occurrence of another
    /// keyword, plus `shift`.
    OtherKeyword {
        keyword: String,
        item: String,
        #[serde(default)]
        shift: i64,
    },
    /// Records until the next recognized keyword.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParserItem {
    pub name: String,
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DeckValue>,
    pub size_type: SizeType,
}

impl ParserItem {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        ParserItem {
            name: name.into(),
            value_type,
            default: None,
            size_type: SizeType::Single,
        }
    }

    pub fn with_default(mut self, default: DeckValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_size_type(mut self, size_type: SizeType) -> Self {
        self.size_type = size_type;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParserKeyword {
    pub name: String,
    pub size: KeywordSize,
    /// Sections the keyword may appear in; empty means anywhere.
    pub sections: Vec<Section>,
    pub records: Vec<Vec<ParserItem>>,
}

// ── JSON shape ───────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    name: String,
    value_type: ValueType,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    size_type: SizeType,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKeyword {
    name: String,
    #[serde(default = "default_size")]
    size: KeywordSize,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    items: Option<Vec<RawItem>>,
    #[serde(default)]
    records: Option<Vec<Vec<RawItem>>>,
}

fn default_size() -> KeywordSize {
    KeywordSize::SlashTerminated
}

fn schema_error(keyword: &str, message: impl Into<String>) -> DeckError {
    DeckError::InvalidArgument(format!("keyword schema {}: {}", keyword, message.into()))
}

fn convert_item(keyword: &str, raw: RawItem) -> Result<ParserItem, DeckError> {
    let default = match raw.default {
        None | Some(serde_json::Value::Null) => None,
        Some(json) => Some(DeckValue::from_json(&json, raw.value_type).ok_or_else(|| {
            schema_error(
                keyword,
                format!(
                    "default {} of item {} is not a {}",
                    json, raw.name, raw.value_type
                ),
            )
        })?),
    };
    Ok(ParserItem {
        name: raw.name,
        value_type: raw.value_type,
        default,
        size_type: raw.size_type,
    })
}

impl ParserKeyword {
    fn from_raw(raw: RawKeyword) -> Result<Self, DeckError> {
        let name = raw.name;
        if !valid_deck_name(&name) || name.len() > MAX_KEYWORD_LENGTH {
            return Err(schema_error(&name, "invalid keyword name"));
        }
        let raw_records = match (raw.items, raw.records) {
            (Some(_), Some(_)) => {
                return Err(schema_error(&name, "both 'items' and 'records' given"))
            }
            (Some(items), None) => vec![items],
            (None, Some(records)) => records,
            (None, None) => Vec::new(),
        };
        let mut records = Vec::with_capacity(raw_records.len());
        for raw_items in raw_records {
            let items = raw_items
                .into_iter()
                .map(|i| convert_item(&name, i))
                .collect::<Result<Vec<_>, _>>()?;
            records.push(items);
        }
        Ok(ParserKeyword {
            name,
            size: raw.size,
            sections: raw.sections,
            records,
        })
    }

    /// Parse one keyword schema from JSON text.
    pub fn from_json(text: &str) -> Result<Self, DeckError> {
        let raw: RawKeyword = serde_json::from_str(text)
            .map_err(|e| DeckError::InvalidArgument(format!("keyword schema: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Item schema for record `index`. Records past the last declared
    /// schema reuse the last one.
    pub fn record_schema(&self, index: usize) -> &[ParserItem] {
        match self.records.get(index).or_else(|| self.records.last()) {
            Some(items) => items,
            None => &[],
        }
    }

    pub fn valid_in(&self, section: Section) -> bool {
        self.sections.is_empty() || self.sections.contains(&section)
    }

    pub fn is_fixed_empty(&self) -> bool {
        self.size == KeywordSize::Fixed(0)
    }
}

/// Name-to-schema lookup table handed to the parser.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KeywordDictionary {
    keywords: OrderedMap<String, ParserKeyword>,
}

impl KeywordDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded dictionary.
    pub fn builtin() -> Result<Self, DeckError> {
        let mut dict = KeywordDictionary::new();
        dict.load_json_str(BUILTIN_KEYWORDS)?;
        Ok(dict)
    }

    /// Add or replace a keyword schema.
    pub fn add(&mut self, keyword: ParserKeyword) {
        self.keywords.insert(keyword.name.clone(), keyword);
    }

    /// Load a JSON array of keyword schemas (or a single schema object).
    /// Returns the number of keywords added.
    pub fn load_json_str(&mut self, text: &str) -> Result<usize, DeckError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| DeckError::InvalidArgument(format!("keyword schema: {}", e)))?;
        let entries = match value {
            serde_json::Value::Array(entries) => entries,
            single => vec![single],
        };
        let count = entries.len();
        for entry in entries {
            let raw: RawKeyword = serde_json::from_value(entry)
                .map_err(|e| DeckError::InvalidArgument(format!("keyword schema: {}", e)))?;
            self.add(ParserKeyword::from_raw(raw)?);
        }
        Ok(count)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize, DeckError> {
        let text = std::fs::read_to_string(path).map_err(|e| DeckError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.load_json_str(&text)
    }

    pub fn get(&self, name: &str) -> Option<&ParserKeyword> {
        self.keywords.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keywords.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParserKeyword> {
        self.keywords.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_dictionary_loads() {
        let dict = KeywordDictionary::builtin().unwrap();
        for name in [
            "RUNSPEC", "SCHEDULE", "INCLUDE", "START", "DATES", "TSTEP", "WELSPECS", "COMPDAT",
            "WCONPROD", "WCONINJE", "WELOPEN", "WELTARG", "GCONPROD", "TUNING", "NUPCOL",
        ] {
            assert!(dict.contains(name), "missing {}", name);
        }
        let wconprod = dict.get("WCONPROD").unwrap();
        assert_eq!(wconprod.size, KeywordSize::SlashTerminated);
        assert!(wconprod.valid_in(Section::Schedule));
        assert!(!wconprod.valid_in(Section::Grid));
        let bhp = wconprod
            .record_schema(0)
            .iter()
            .find(|i| i.name == "BHP")
            .unwrap();
        assert_eq!(bhp.default, Some(DeckValue::Double(1.01325)));
    }

    #[test]
    fn size_policies_deserialize() {
        let kw = ParserKeyword::from_json(
            r#"{"name":"EQUIL","size":{"other_keyword":{"keyword":"EQLDIMS","item":"NTEQUL"}},
                "items":[{"name":"DATUM_DEPTH","value_type":"DOUBLE","default":0}]}"#,
        )
        .unwrap();
        assert_eq!(
            kw.size,
            KeywordSize::OtherKeyword {
                keyword: "EQLDIMS".into(),
                item: "NTEQUL".into(),
                shift: 0
            }
        );
        assert_eq!(kw.record_schema(0)[0].default, Some(DeckValue::Double(0.0)));

        let kw = ParserKeyword::from_json(r#"{"name":"GRID","size":{"fixed":0}}"#).unwrap();
        assert!(kw.is_fixed_empty());
        assert!(kw.record_schema(0).is_empty());

        let kw = ParserKeyword::from_json(r#"{"name":"FREE","size":"unknown"}"#).unwrap();
        assert_eq!(kw.size, KeywordSize::Unknown);
    }

    #[test]
    fn later_records_reuse_last_schema() {
        let kw = ParserKeyword::from_json(
            r#"{"name":"MULTI","size":{"fixed":3},"records":[
                [{"name":"A","value_type":"INT"}],
                [{"name":"B","value_type":"STRING"}]]}"#,
        )
        .unwrap();
        assert_eq!(kw.record_schema(0)[0].name, "A");
        assert_eq!(kw.record_schema(1)[0].name, "B");
        assert_eq!(kw.record_schema(2)[0].name, "B");
    }

    #[test]
    fn mistyped_default_is_rejected() {
        let err = ParserKeyword::from_json(
            r#"{"name":"BAD","items":[{"name":"N","value_type":"INT","default":"X"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DeckError::InvalidArgument(_)));
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(ParserKeyword::from_json(r#"{"name":"TOOLONGNAME"}"#).is_err());
        assert!(ParserKeyword::from_json(r#"{"name":"1ABC"}"#).is_err());
        assert!(ParserKeyword::from_json(
            r#"{"name":"AB","items":[],"records":[[]]}"#
        )
        .is_err());
    }

    #[test]
    fn load_replaces_existing_schema() {
        let mut dict = KeywordDictionary::builtin().unwrap();
        let before = dict.len();
        let added = dict
            .load_json_str(r#"[{"name":"PORO","size":{"fixed":1},"items":[{"name":"X","value_type":"INT","size_type":"all"}]}]"#)
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(dict.len(), before);
        assert_eq!(dict.get("PORO").unwrap().record_schema(0)[0].size_type, SizeType::All);
    }
}
