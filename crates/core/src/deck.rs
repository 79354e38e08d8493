//! Parsed deck model: keyword occurrences, records and the accumulated
//! per-keyword store.

use crate::error::DeckError;
use crate::item::DeckItem;
use crate::ordered_map::OrderedMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Record text that marks a keyword occurrence as a reset of everything
/// accumulated so far under the same name.
pub const RESET_MARKER: &str = "__RESET__";

/// Where a keyword was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub keyword: String,
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(keyword: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Location {
            keyword: keyword.into(),
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Section {
    Runspec,
    Grid,
    Edit,
    Props,
    Regions,
    Solution,
    Summary,
    Schedule,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Runspec,
        Section::Grid,
        Section::Edit,
        Section::Props,
        Section::Regions,
        Section::Solution,
        Section::Summary,
        Section::Schedule,
    ];

    /// The section a marker keyword opens, if `name` is one.
    pub fn from_keyword(name: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Section::Runspec => "RUNSPEC",
            Section::Grid => "GRID",
            Section::Edit => "EDIT",
            Section::Props => "PROPS",
            Section::Regions => "REGIONS",
            Section::Solution => "SOLUTION",
            Section::Summary => "SUMMARY",
            Section::Schedule => "SCHEDULE",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The typed items of one slash-terminated record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckRecord {
    items: Vec<DeckItem>,
}

impl DeckRecord {
    pub fn new(items: Vec<DeckItem>) -> Self {
        DeckRecord { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.items.iter().any(|i| i.name() == name)
    }

    /// Item by name.
    pub fn get(&self, name: &str) -> Result<&DeckItem, DeckError> {
        self.items
            .iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| DeckError::KeyNotFound {
                key: name.to_owned(),
                suggestion: self
                    .items
                    .iter()
                    .find(|i| i.name().eq_ignore_ascii_case(name))
                    .map(|i| i.name().to_owned()),
            })
    }

    /// Item by position.
    pub fn item(&self, index: usize) -> Result<&DeckItem, DeckError> {
        self.items.get(index).ok_or(DeckError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeckItem> {
        self.items.iter()
    }
}

/// One occurrence of a keyword in the deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckKeyword {
    pub name: String,
    pub location: Location,
    pub section: Section,
    pub records: Vec<DeckRecord>,
    /// Set for an occurrence whose only record was [`RESET_MARKER`].
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reset: bool,
}

impl DeckKeyword {
    pub fn new(location: Location, section: Section) -> Self {
        DeckKeyword {
            name: location.keyword.clone(),
            location,
            section,
            records: Vec::new(),
            reset: false,
        }
    }

    pub fn reset_marker(location: Location, section: Section) -> Self {
        DeckKeyword {
            reset: true,
            ..DeckKeyword::new(location, section)
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, index: usize) -> Result<&DeckRecord, DeckError> {
        self.records.get(index).ok_or(DeckError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeckRecord> {
        self.records.iter()
    }
}

/// A parsed deck.
///
/// `keywords` holds every occurrence in encounter order. `accumulated`
/// merges the records of repeated keywords under their first occurrence;
/// a reset marker clears what has been merged so far.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Deck {
    data_file: Option<PathBuf>,
    keywords: Vec<DeckKeyword>,
    #[serde(skip)]
    accumulated: OrderedMap<String, DeckKeyword>,
}

impl Deck {
    pub fn new(data_file: Option<PathBuf>) -> Self {
        Deck {
            data_file,
            ..Deck::default()
        }
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn add_keyword(&mut self, keyword: DeckKeyword) {
        match self.accumulated.get_mut(&keyword.name) {
            Some(merged) if keyword.reset => merged.records.clear(),
            Some(merged) => merged.records.extend(keyword.records.iter().cloned()),
            None => {
                let mut merged = keyword.clone();
                merged.reset = false;
                self.accumulated.insert(keyword.name.clone(), merged);
            }
        }
        self.keywords.push(keyword);
    }

    /// Number of keyword occurrences.
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[DeckKeyword] {
        &self.keywords
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.accumulated.contains_key(name)
    }

    /// Accumulated records of every occurrence of `name`.
    pub fn get(&self, name: &str) -> Result<&DeckKeyword, DeckError> {
        self.accumulated.at(name)
    }

    pub fn accumulated(&self) -> &OrderedMap<String, DeckKeyword> {
        &self.accumulated
    }

    pub fn occurrences<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DeckKeyword> {
        self.keywords.iter().filter(move |k| k.name == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.occurrences(name).count()
    }

    pub fn last(&self, name: &str) -> Option<&DeckKeyword> {
        self.keywords.iter().rev().find(|k| k.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DeckValue, ValueType};

    fn keyword(name: &str, line: u32, values: &[i64]) -> DeckKeyword {
        let mut kw = DeckKeyword::new(Location::new(name, "T.DATA", line), Section::Grid);
        for v in values {
            let mut item = DeckItem::new("N", ValueType::Int);
            item.push_value(DeckValue::Int(*v));
            kw.records.push(DeckRecord::new(vec![item]));
        }
        kw
    }

    #[test]
    fn repeated_keywords_accumulate() {
        let mut deck = Deck::new(None);
        deck.add_keyword(keyword("MULTX", 1, &[1, 2]));
        deck.add_keyword(keyword("PORO", 3, &[5]));
        deck.add_keyword(keyword("MULTX", 5, &[3]));
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.count("MULTX"), 2);
        let merged = deck.get("MULTX").unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.location.line, 1);
        let order: Vec<_> = deck.accumulated().keys().cloned().collect();
        assert_eq!(order, vec!["MULTX", "PORO"]);
        assert_eq!(deck.last("MULTX").unwrap().location.line, 5);
    }

    #[test]
    fn reset_marker_clears_accumulated_records() {
        let mut deck = Deck::new(None);
        deck.add_keyword(keyword("MULTX", 1, &[1, 2]));
        deck.add_keyword(DeckKeyword::reset_marker(
            Location::new("MULTX", "T.DATA", 4),
            Section::Grid,
        ));
        deck.add_keyword(keyword("MULTX", 6, &[7]));
        let merged = deck.get("MULTX").unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged.record(0).unwrap().get("N").unwrap().get_int(0).unwrap(),
            7
        );
        assert_eq!(deck.len(), 3);
    }

    #[test]
    fn missing_keyword_is_key_not_found() {
        let mut deck = Deck::new(None);
        deck.add_keyword(keyword("WCONPROD", 1, &[]));
        match deck.get("CONPROD") {
            Err(DeckError::KeyNotFound { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("WCONPROD"))
            }
            other => panic!("expected KeyNotFound, got {:?}", other),
        }
    }

    #[test]
    fn record_lookup_by_name_and_position() {
        let kw = keyword("X", 1, &[4]);
        let record = kw.record(0).unwrap();
        assert!(record.has_item("N"));
        assert!(record.get("M").is_err());
        assert_eq!(record.item(0).unwrap().name(), "N");
        assert!(record.item(1).is_err());
        assert!(kw.record(1).is_err());
    }

    #[test]
    fn section_names_round_trip() {
        for s in Section::ALL {
            assert_eq!(Section::from_keyword(s.name()), Some(s));
        }
        assert_eq!(Section::from_keyword("WELSPECS"), None);
    }
}
