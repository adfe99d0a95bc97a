//! # Set Reconciler
//!
//! Key-set operations over two indexes built on the same key domain: which
//! keys exist in both stores, and which are exclusive to one side. Both
//! indexes must be keyed on the same attribute; comparing a name index
//! against a place index is a caller bug this module cannot detect.
//!
//! Ambiguous buckets (more than one record per key) still participate at the
//! key-set level; picking the right record inside such a bucket is the
//! change planner's concern, not this module's.

use crate::index::KeyIndex;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use tracing::info;

/// Keys common to both indexes.
pub fn common<K, R>(a: &KeyIndex<K, R>, b: &KeyIndex<K, R>) -> HashSet<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    a.keys().filter(|key| b.contains(key)).cloned().collect()
}

/// Keys present in `a` but not in `b`. Directional; swap the arguments for
/// the other direction.
pub fn only_in<K, R>(a: &KeyIndex<K, R>, b: &KeyIndex<K, R>) -> HashSet<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    a.keys().filter(|key| !b.contains(key)).cloned().collect()
}

/// Three-way split of two stores' key sets.
#[derive(Debug, Clone)]
pub struct Reconciliation<K> {
    pub common: HashSet<K>,
    pub only_primary: HashSet<K>,
    pub only_secondary: HashSet<K>,
}

/// Compute the full three-way reconciliation between a primary-side and a
/// secondary-side index.
pub fn reconcile<K, R>(primary: &KeyIndex<K, R>, secondary: &KeyIndex<K, R>) -> Reconciliation<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    let result = Reconciliation {
        common: common(primary, secondary),
        only_primary: only_in(primary, secondary),
        only_secondary: only_in(secondary, primary),
    };
    info!(
        common = result.common.len(),
        only_primary = result.only_primary.len(),
        only_secondary = result.only_secondary.len(),
        "reconciled key sets"
    );
    result
}
