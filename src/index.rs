//! # Key Index
//!
//! One-to-many bucket mapping from an arbitrary key attribute to the records
//! that share it. This is the substrate for every comparison in the crate:
//! the same record collection gets indexed by name, by MAC, by place, or by
//! coordinate pair depending on the question being asked.
//!
//! Records with a missing key are never dropped; they land in a designated
//! unknown bucket so callers can detect and report ownerless records.

use crate::error::ReconcileError;
use crate::mac::Mac;
use crate::model::{Coordinates, Photometer};
use hashbrown::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::debug;

/// Index of records bucketed by a key attribute.
///
/// Bucket contents keep source order, which for store readers is
/// chronological. A bucket with more than one record signals ambiguity or
/// history; resolving that is deliberately left to the caller.
#[derive(Debug, Clone)]
pub struct KeyIndex<K, R = Photometer> {
    buckets: HashMap<K, Vec<R>>,
    unknown: Vec<R>,
}

impl<K: Eq + Hash + Clone + fmt::Debug, R> KeyIndex<K, R> {
    /// Build an index from a record collection and a key extractor.
    ///
    /// Pure partition: every input record appears in exactly one bucket,
    /// selected by `key_fn`; records yielding `None` go to the unknown
    /// bucket.
    pub fn build<I, F>(records: I, key_fn: F) -> Self
    where
        I: IntoIterator<Item = R>,
        F: Fn(&R) -> Option<K>,
    {
        let mut buckets: HashMap<K, Vec<R>> = HashMap::new();
        let mut unknown = Vec::new();
        let mut total = 0usize;
        for record in records {
            total += 1;
            match key_fn(&record) {
                Some(key) => buckets.entry(key).or_default().push(record),
                None => unknown.push(record),
            }
        }
        debug!(
            records = total,
            keys = buckets.len(),
            unknown = unknown.len(),
            "built key index"
        );
        Self { buckets, unknown }
    }

    /// Records sharing `key`, in source order.
    pub fn get(&self, key: &K) -> Option<&[R]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Records whose key attribute was missing.
    pub fn unknown(&self) -> &[R] {
        &self.unknown
    }

    /// All present keys, in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.buckets.keys()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.buckets.contains_key(key)
    }

    /// Number of distinct keys (the unknown bucket not included).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets holding more than one record.
    pub fn ambiguous(&self) -> impl Iterator<Item = (&K, &[R])> {
        self.buckets
            .iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|(key, records)| (key, records.as_slice()))
    }

    /// The single record under `key`, or an [`ReconcileError::AmbiguousKey`]
    /// when the bucket holds several. Missing keys return `Ok(None)`.
    pub fn singleton(&self, key: &K) -> Result<Option<&R>, ReconcileError> {
        match self.buckets.get(key) {
            None => Ok(None),
            Some(records) if records.len() == 1 => Ok(Some(&records[0])),
            Some(records) => Err(ReconcileError::AmbiguousKey {
                key: format!("{key:?}"),
                count: records.len(),
            }),
        }
    }

    /// Iterate over all buckets.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[R])> {
        self.buckets
            .iter()
            .map(|(key, records)| (key, records.as_slice()))
    }
}

/// Index photometers by device name.
pub fn by_name<I: IntoIterator<Item = Photometer>>(records: I) -> KeyIndex<String> {
    KeyIndex::build(records, |record| Some(record.name.clone()))
}

/// Index photometers by normalized MAC. Records without one go to the
/// unknown bucket.
pub fn by_mac<I: IntoIterator<Item = Photometer>>(records: I) -> KeyIndex<Mac> {
    KeyIndex::build(records, |record| record.mac.clone())
}

/// Index photometers by place label.
pub fn by_place<I: IntoIterator<Item = Photometer>>(records: I) -> KeyIndex<String> {
    KeyIndex::build(records, |record| record.place.clone())
}

/// Index photometers by exact coordinate pair.
pub fn by_coordinates<I: IntoIterator<Item = Photometer>>(records: I) -> KeyIndex<Coordinates> {
    KeyIndex::build(records, |record| record.coordinates)
}
