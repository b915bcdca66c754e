//! Persistence hand-off.
//!
//! A sink upserts accepted records by uniqueness key: insert if absent,
//! full overwrite if present. Later records at the same key are corrections.

use std::collections::BTreeMap;

use crate::error::{SinkError, SinkResult};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Destination for accepted records.
pub trait RecordSink<T> {
    fn upsert(&mut self, key: &str, record: T) -> SinkResult<Upsert>;
}

/// In-memory sink ordered by key.
#[derive(Debug, Clone)]
pub struct MemorySink<T> {
    records: BTreeMap<String, T>,
    replaced: usize,
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self { records: BTreeMap::new(), replaced: 0 }
    }
}

impl<T> MemorySink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of upserts that overwrote an existing record.
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &T)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_records(self) -> Vec<T> {
        self.records.into_values().collect()
    }
}

impl<T> RecordSink<T> for MemorySink<T> {
    fn upsert(&mut self, key: &str, record: T) -> SinkResult<Upsert> {
        if key.trim().is_empty() {
            return Err(SinkError::EmptyKey);
        }
        match self.records.insert(key.to_string(), record) {
            Some(_) => {
                self.replaced += 1;
                Ok(Upsert::Replaced)
            }
            None => Ok(Upsert::Inserted),
        }
    }
}
