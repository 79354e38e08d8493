//! Piecewise-constant time series over report steps.
//!
//! A [`DynamicState`] holds exactly one value per [`TimeMap`] entry. Values
//! persist forward: setting a control at step 5 keeps it in force at steps
//! 6, 7, ... until a later update changes it.

use crate::error::DeckError;
use crate::time_map::TimeMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicState<T> {
    data: Vec<T>,
    /// Length of the prefix that no explicit `update` has touched yet.
    initial_range: usize,
}

impl<T: Clone + PartialEq> DynamicState<T> {
    /// One slot per report-step boundary of `time_map`, uniformly filled.
    pub fn new(time_map: &TimeMap, initial: T) -> Self {
        Self::with_len(time_map.len(), initial)
    }

    pub fn with_len(len: usize, initial: T) -> Self {
        DynamicState {
            data: vec![initial; len],
            initial_range: len,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn initial_range(&self) -> usize {
        self.initial_range
    }

    pub fn get(&self, index: usize) -> Result<&T, DeckError> {
        self.data.get(index).ok_or(DeckError::IndexOutOfRange {
            index,
            len: self.data.len(),
        })
    }

    pub fn back(&self) -> Option<&T> {
        self.data.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    fn check_index(&self, index: usize) -> Result<(), DeckError> {
        if index >= self.data.len() {
            return Err(DeckError::IndexOutOfRange {
                index,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    /// Set `value` from `index` to the end if it differs from the current
    /// value at `index`. Returns whether anything changed.
    pub fn update(&mut self, index: usize, value: T) -> Result<bool, DeckError> {
        self.check_index(index)?;
        self.initial_range = self.initial_range.min(index);
        if self.data[index] == value {
            return Ok(false);
        }
        for slot in &mut self.data[index..] {
            *slot = value.clone();
        }
        Ok(true)
    }

    /// Overwrite only the prefix that no `update` has reached.
    pub fn update_initial(&mut self, value: T) {
        for slot in &mut self.data[..self.initial_range] {
            *slot = value.clone();
        }
    }

    /// Overwrite a single slot without propagating.
    pub fn update_elm(&mut self, index: usize, value: T) -> Result<(), DeckError> {
        self.check_index(index)?;
        self.data[index] = value;
        Ok(())
    }

    /// Overwrite the run of slots starting at `index` that share the value
    /// currently at `index`. The scan only goes forward.
    pub fn update_equal(&mut self, index: usize, value: T) -> Result<bool, DeckError> {
        self.check_index(index)?;
        let previous = self.data[index].clone();
        if previous == value {
            return Ok(false);
        }
        for slot in &mut self.data[index..] {
            if *slot != previous {
                break;
            }
            *slot = value.clone();
        }
        Ok(true)
    }

    /// Fill every slot. `initial_range` is left alone.
    pub fn global_reset(&mut self, value: T) {
        for slot in &mut self.data {
            *slot = value.clone();
        }
    }

    pub fn find(&self, value: &T) -> Option<usize> {
        self.data.iter().position(|v| v == value)
    }

    pub fn find_not(&self, value: &T) -> Option<usize> {
        self.data.iter().position(|v| v != value)
    }

    pub fn find_if<F: FnMut(&T) -> bool>(&self, pred: F) -> Option<usize> {
        self.data.iter().position(pred)
    }

    /// `(index, value)` at every position where the value differs from its
    /// predecessor; index 0 is always included.
    pub fn unique(&self) -> Vec<(usize, T)> {
        let mut runs: Vec<(usize, T)> = Vec::new();
        for (i, v) in self.data.iter().enumerate() {
            match runs.last() {
                Some((_, last)) if last == v => {}
                _ => runs.push((i, v.clone())),
            }
        }
        runs
    }
}

/// Serialized as the run list from [`DynamicState::unique`].
impl<T: Serialize + Clone + PartialEq> Serialize for DynamicState<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let runs = self.unique();
        let mut seq = serializer.serialize_seq(Some(runs.len()))?;
        for (step, value) in &runs {
            seq.serialize_element(&serde_json::json!({
                "step": step,
                "value": value,
            }))?;
        }
        seq.end()
    }
}
