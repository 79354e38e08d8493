//! Typed items and the record scanner.
//!
//! [`scan`] consumes raw tokens from the front of a record according to one
//! [`ParserItem`]; [`parse_record`] runs it for every item of a record
//! schema.

use crate::deck::{DeckRecord, Location};
use crate::error::DeckError;
use crate::lexer::{RawRecord, StarToken};
use crate::messages::MessageContainer;
use crate::parse_context::ParseContext;
use crate::schema::{ParserItem, SizeType};
use crate::value::{DeckValue, FromDeckValue, ValueType};
use serde::Serialize;

/// Where an element's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueStatus {
    /// Given explicitly in the deck.
    Deck,
    /// Filled from the item's schema default.
    Default,
    /// No input and no schema default; reading it is an error.
    DummyDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckItem {
    name: String,
    value_type: ValueType,
    values: Vec<DeckValue>,
    status: Vec<ValueStatus>,
}

impl DeckItem {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        DeckItem {
            name: name.into(),
            value_type,
            values: Vec::new(),
            status: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push_value(&mut self, value: DeckValue) {
        self.values.push(value);
        self.status.push(ValueStatus::Deck);
    }

    pub fn push_default(&mut self, value: DeckValue) {
        self.values.push(value);
        self.status.push(ValueStatus::Default);
    }

    pub fn push_dummy_default(&mut self) {
        self.values.push(DeckValue::dummy(self.value_type));
        self.status.push(ValueStatus::DummyDefault);
    }

    fn check_index(&self, index: usize) -> Result<(), DeckError> {
        if index >= self.values.len() {
            return Err(DeckError::IndexOutOfRange {
                index,
                len: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn value_status(&self, index: usize) -> Result<ValueStatus, DeckError> {
        self.check_index(index)?;
        Ok(self.status[index])
    }

    /// Whether element `index` exists and holds a readable value.
    pub fn has_value(&self, index: usize) -> bool {
        matches!(
            self.status.get(index),
            Some(ValueStatus::Deck | ValueStatus::Default)
        )
    }

    /// Whether element `index` was filled without explicit input.
    pub fn default_applied(&self, index: usize) -> Result<bool, DeckError> {
        Ok(self.value_status(index)? != ValueStatus::Deck)
    }

    pub fn all_defaulted(&self) -> bool {
        self.status.iter().all(|s| *s != ValueStatus::Deck)
    }

    pub fn get<T: FromDeckValue>(&self, index: usize) -> Result<T, DeckError> {
        if T::VALUE_TYPE != self.value_type {
            return Err(DeckError::Type {
                item: self.name.clone(),
                expected: T::VALUE_TYPE,
                found: self.value_type,
            });
        }
        if self.value_status(index)? == ValueStatus::DummyDefault {
            return Err(DeckError::Value {
                item: self.name.clone(),
                index,
            });
        }
        T::from_deck_value(&self.values[index]).ok_or_else(|| {
            DeckError::InvalidArgument(format!(
                "value {} of item {} does not fit the requested type",
                self.values[index], self.name
            ))
        })
    }

    pub fn get_int(&self, index: usize) -> Result<i64, DeckError> {
        self.get(index)
    }

    pub fn get_double(&self, index: usize) -> Result<f64, DeckError> {
        self.get(index)
    }

    pub fn get_string(&self, index: usize) -> Result<String, DeckError> {
        self.get(index)
    }

    /// String value with surrounding whitespace removed.
    pub fn get_trimmed_string(&self, index: usize) -> Result<String, DeckError> {
        self.get_string(index).map(|s| s.trim().to_owned())
    }

    /// Every element; fails on the first unreadable one.
    pub fn get_all<T: FromDeckValue>(&self) -> Result<Vec<T>, DeckError> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    pub fn raw_values(&self) -> &[DeckValue] {
        &self.values
    }
}

fn coerce(
    item: &ParserItem,
    token: &str,
    location: &Location,
) -> Result<DeckValue, DeckError> {
    DeckValue::coerce(token, item.value_type).ok_or_else(|| DeckError::TypeCoercion {
        location: location.clone(),
        item: item.name.clone(),
        token: token.to_owned(),
        expected: item.value_type,
    })
}

fn push_defaulted(deck_item: &mut DeckItem, item: &ParserItem) {
    match &item.default {
        Some(default) => deck_item.push_default(default.clone()),
        None => deck_item.push_dummy_default(),
    }
}

/// Scan one item from the front of `record`.
pub fn scan(
    item: &ParserItem,
    record: &mut RawRecord,
    location: &Location,
) -> Result<DeckItem, DeckError> {
    let mut deck_item = DeckItem::new(item.name.clone(), item.value_type);

    match item.size_type {
        SizeType::All => {
            while let Some(token) = record.pop_front() {
                if StarToken::is_star_token(&token) {
                    let star =
                        StarToken::parse(&token).map_err(|m| DeckError::lexical(location, m))?;
                    match &star.value {
                        Some(text) => {
                            let value = coerce(item, text, location)?;
                            for _ in 0..star.count {
                                deck_item.push_value(value.clone());
                            }
                        }
                        None => {
                            for _ in 0..star.count {
                                push_defaulted(&mut deck_item, item);
                            }
                        }
                    }
                } else {
                    deck_item.push_value(coerce(item, &token, location)?);
                }
            }
        }
        SizeType::Single => match record.pop_front() {
            None => push_defaulted(&mut deck_item, item),
            Some(token) if StarToken::is_star_token(&token) => {
                let star =
                    StarToken::parse(&token).map_err(|m| DeckError::lexical(location, m))?;
                if star.count > 1 {
                    record.push_front(star.with_count(star.count - 1));
                }
                match &star.value {
                    Some(text) => deck_item.push_value(coerce(item, text, location)?),
                    None => push_defaulted(&mut deck_item, item),
                }
            }
            Some(token) => deck_item.push_value(coerce(item, &token, location)?),
        },
    }

    Ok(deck_item)
}

/// Scan a full record against `schema`. Leftover tokens are reported as
/// `PARSE_EXTRA_DATA`.
pub fn parse_record(
    schema: &[ParserItem],
    mut record: RawRecord,
    location: &Location,
    context: &ParseContext,
    messages: &mut MessageContainer,
) -> Result<DeckRecord, DeckError> {
    let items = schema
        .iter()
        .map(|item| scan(item, &mut record, location))
        .collect::<Result<Vec<_>, _>>()?;

    if !record.is_empty() {
        let leftover: Vec<&str> = record.tokens.iter().map(String::as_str).collect();
        context.handle_error(
            ParseContext::PARSE_EXTRA_DATA,
            &format!(
                "too much data in record of keyword {}: {}",
                location.keyword,
                leftover.join(" ")
            ),
            Some(location),
            messages,
        )?;
    }

    Ok(DeckRecord::new(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new("TEST", "T.DATA", 1)
    }

    fn raw(text: &str) -> RawRecord {
        RawRecord::parse(text).unwrap()
    }

    #[test]
    fn single_item_reads_one_token() {
        let item = ParserItem::new("N", ValueType::Int);
        let mut record = raw("10 20");
        let scanned = scan(&item, &mut record, &loc()).unwrap();
        assert_eq!(scanned.get_int(0).unwrap(), 10);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn runaway_repeat_count_is_a_lexical_error() {
        let item = ParserItem::new("data", ValueType::Double).with_size_type(SizeType::All);
        let mut record = raw("999999999*1");
        let err = scan(&item, &mut record, &loc()).unwrap_err();
        assert_eq!(err.kind(), "lexical");
    }

    #[test]
    fn repeat_with_value_expands_for_all_items() {
        let item = ParserItem::new("data", ValueType::Double).with_size_type(SizeType::All);
        let mut record = raw("3*2.5");
        let scanned = scan(&item, &mut record, &loc()).unwrap();
        assert_eq!(scanned.get_all::<f64>().unwrap(), vec![2.5, 2.5, 2.5]);
        assert!(!scanned.default_applied(2).unwrap());
    }

    #[test]
    fn bare_repeat_uses_default() {
        let item = ParserItem::new("data", ValueType::Double)
            .with_default(DeckValue::Double(9.9))
            .with_size_type(SizeType::All);
        let mut record = raw("3*");
        let scanned = scan(&item, &mut record, &loc()).unwrap();
        assert_eq!(scanned.len(), 3);
        for i in 0..3 {
            assert_eq!(scanned.get_double(i).unwrap(), 9.9);
            assert!(scanned.default_applied(i).unwrap());
            assert!(scanned.has_value(i));
        }
    }

    #[test]
    fn repeat_run_spans_single_items() {
        let a = ParserItem::new("A", ValueType::Int).with_default(DeckValue::Int(1));
        let b = ParserItem::new("B", ValueType::Int);
        let c = ParserItem::new("C", ValueType::Int);
        let mut record = raw("2* 7");
        let ia = scan(&a, &mut record, &loc()).unwrap();
        let ib = scan(&b, &mut record, &loc()).unwrap();
        let ic = scan(&c, &mut record, &loc()).unwrap();
        assert_eq!(ia.get_int(0).unwrap(), 1);
        assert_eq!(ib.value_status(0).unwrap(), ValueStatus::DummyDefault);
        assert!(!ib.has_value(0));
        assert_eq!(ic.get_int(0).unwrap(), 7);
    }

    #[test]
    fn exhausted_record_defaults_trailing_items() {
        let item = ParserItem::new("S", ValueType::String).with_default(DeckValue::String("OPEN".into()));
        let mut record = raw("");
        let scanned = scan(&item, &mut record, &loc()).unwrap();
        assert_eq!(scanned.get_string(0).unwrap(), "OPEN");
        assert_eq!(scanned.value_status(0).unwrap(), ValueStatus::Default);
    }

    #[test]
    fn dummy_default_access_is_value_error() {
        let item = ParserItem::new("X", ValueType::Double);
        let mut record = raw("1*");
        let scanned = scan(&item, &mut record, &loc()).unwrap();
        assert!(matches!(
            scanned.get_double(0),
            Err(DeckError::Value { index: 0, .. })
        ));
    }

    #[test]
    fn accessor_type_mismatch() {
        let item = ParserItem::new("X", ValueType::Int);
        let mut record = raw("4");
        let scanned = scan(&item, &mut record, &loc()).unwrap();
        assert!(matches!(
            scanned.get_double(0),
            Err(DeckError::Type {
                expected: ValueType::Double,
                found: ValueType::Int,
                ..
            })
        ));
        assert!(matches!(
            scanned.get_int(1),
            Err(DeckError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn bad_token_is_type_coercion_error() {
        let item = ParserItem::new("N", ValueType::Int);
        let mut record = raw("1.5");
        match scan(&item, &mut record, &loc()) {
            Err(DeckError::TypeCoercion { token, expected, .. }) => {
                assert_eq!(token, "1.5");
                assert_eq!(expected, ValueType::Int);
            }
            other => panic!("expected TypeCoercion, got {:?}", other),
        }
    }

    #[test]
    fn quoted_strings_are_unquoted_and_trimmed_on_request() {
        let item = ParserItem::new("W", ValueType::String);
        let mut record = raw("' OP 1 '");
        let scanned = scan(&item, &mut record, &loc()).unwrap();
        assert_eq!(scanned.get_string(0).unwrap(), " OP 1 ");
        assert_eq!(scanned.get_trimmed_string(0).unwrap(), "OP 1");
    }

    #[test]
    fn leftover_tokens_follow_policy() {
        let schema = vec![ParserItem::new("A", ValueType::Int)];
        let mut ctx = ParseContext::with_defaults();
        let mut messages = MessageContainer::new();
        let err = parse_record(&schema, raw("1 2"), &loc(), &ctx, &mut messages).unwrap_err();
        assert!(matches!(err, DeckError::Schema { ref key, .. } if key == "PARSE_EXTRA_DATA"));

        ctx.update(ParseContext::PARSE_EXTRA_DATA, crate::parse_context::Action::Warn);
        let record = parse_record(&schema, raw("1 2"), &loc(), &ctx, &mut messages).unwrap();
        assert_eq!(record.get("A").unwrap().get_int(0).unwrap(), 1);
        assert_eq!(messages.with_key("PARSE_EXTRA_DATA").count(), 1);
    }
}
