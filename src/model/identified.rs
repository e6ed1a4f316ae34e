// src/model/identified.rs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A value tagged with its id, as it appears in serialized configs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tagged<T> {
    pub id: usize,
    pub value: T,
}

/// Ordered values with unique, caller-assignable ids.
///
/// Position is meaningful (it is the atom index); ids are stable metadata
/// that survive insertions and removals elsewhere in the sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentifiedSequence<T> {
    entries: Vec<Tagged<T>>,
}

impl<T> Default for IdentifiedSequence<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> IdentifiedSequence<T> {
    /// Plain values get ids `0..n` in order.
    pub fn new(values: Vec<T>) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(id, value)| Tagged { id, value })
            .collect();
        Self { entries }
    }

    pub fn from_tagged(entries: Vec<Tagged<T>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(Error::DuplicateId(entry.id));
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|e| &e.value)
    }

    pub fn index_of_id(&self, id: usize) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn get_by_id(&self, id: usize) -> Option<&T> {
        self.index_of_id(id).map(|i| &self.entries[i].value)
    }

    pub fn get_by_id_mut(&mut self, id: usize) -> Option<&mut T> {
        self.index_of_id(id).map(move |i| &mut self.entries[i].value)
    }

    pub fn ids(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.value)
    }

    /// `(id, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries.iter().map(|e| (e.id, &e.value))
    }

    pub fn entries(&self) -> &[Tagged<T>] {
        &self.entries
    }

    fn next_id(&self) -> usize {
        self.entries.iter().map(|e| e.id + 1).max().unwrap_or(0)
    }

    /// Appends with a freshly minted id and returns it.
    pub fn add(&mut self, value: T) -> usize {
        let id = self.next_id();
        self.entries.push(Tagged { id, value });
        id
    }

    /// Removes the entry with `id` if present, otherwise the first entry
    /// matching `pred`. Nothing matching is a no-op.
    pub fn remove_where<F>(&mut self, pred: F, id: Option<usize>) -> Option<Tagged<T>>
    where
        F: Fn(&T) -> bool,
    {
        let idx = id
            .and_then(|id| self.index_of_id(id))
            .or_else(|| self.entries.iter().position(|e| pred(&e.value)))?;
        Some(self.entries.remove(idx))
    }

    pub fn remove_by_id(&mut self, id: usize) -> Option<Tagged<T>> {
        let idx = self.index_of_id(id)?;
        Some(self.entries.remove(idx))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn map_in_place<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T),
    {
        for entry in &mut self.entries {
            f(&mut entry.value);
        }
    }

    /// Same ids, values mapped through `f`
    pub fn map<U, F>(&self, mut f: F) -> IdentifiedSequence<U>
    where
        F: FnMut(&T) -> U,
    {
        IdentifiedSequence {
            entries: self
                .entries
                .iter()
                .map(|e| Tagged { id: e.id, value: f(&e.value) })
                .collect(),
        }
    }
}

impl<T: PartialEq> IdentifiedSequence<T> {
    pub fn remove(&mut self, value: &T, id: Option<usize>) -> Option<Tagged<T>> {
        self.remove_where(|v| v == value, id)
    }
}
