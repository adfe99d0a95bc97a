//! # Change Planner
//!
//! Turns matched cross-store pairs into an explicit, auditable plan of
//! changes against the secondary store, with the primary store as the
//! source of truth. Nothing here mutates anything: the output is a value a
//! caller can inspect, serialize, or feed to an applier.
//!
//! Pairs the planner cannot safely act on are not dropped silently; they
//! are collected as typed skip reasons alongside the plan.

use crate::error::ReconcileError;
use crate::geo::distance_between;
use crate::index::KeyIndex;
use crate::mac::Mac;
use crate::model::{Coordinates, MatchedPair, Photometer};
use serde::Serialize;
use tracing::{debug, info};

/// One field whose value differs between the stores. `before` is the
/// secondary store's value, `after` the primary's.
///
/// Plans flow out of this crate for review, never back in, so the plan
/// types are serialize-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub field: &'static str,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// What kind of write the secondary store needs for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChangeAction {
    /// Stores agree; nothing to write.
    NoOp,
    /// Same spot, differing descriptive fields: update metadata in place.
    MetadataUpdate,
    /// Coordinates drifted but stayed within the same-place radius: snap
    /// the secondary coordinates to the primary's, plus any metadata.
    CoordinateUpdate,
    /// The device is far from where the secondary store believes it is:
    /// record a brand-new location rather than editing the old one.
    NewLocationInsert,
}

/// A planned write against the secondary store for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub name: String,
    pub mac: Mac,
    pub action: ChangeAction,
    /// Distance between the stores' coordinates for this device.
    pub distance_m: f64,
    pub primary_coordinates: Coordinates,
    pub diffs: Vec<FieldDiff>,
}

/// Full planning outcome over a batch of pairs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangePlan {
    pub changes: Vec<Change>,
    /// Pairs excluded from the plan, each with the reason.
    pub skipped: Vec<ReconcileError>,
}

impl ChangePlan {
    /// Changes that would actually write something.
    pub fn effective(&self) -> impl Iterator<Item = &Change> {
        self.changes
            .iter()
            .filter(|change| change.action != ChangeAction::NoOp)
    }
}

const COMPARED_FIELDS: [(&str, fn(&Photometer) -> Option<String>); 7] = [
    ("place", |r| r.place.clone()),
    ("town", |r| r.town.clone()),
    ("sub_region", |r| r.sub_region.clone()),
    ("region", |r| r.region.clone()),
    ("country", |r| r.country.clone()),
    ("timezone", |r| r.timezone.clone()),
    ("zero_point", |r| r.zero_point.map(|zp| zp.to_string())),
];

fn field_diffs(primary: &Photometer, secondary: &Photometer) -> Vec<FieldDiff> {
    COMPARED_FIELDS
        .iter()
        .filter_map(|(field, extract)| {
            let after = extract(primary);
            let before = extract(secondary);
            (before != after).then(|| FieldDiff {
                field,
                before,
                after,
            })
        })
        .collect()
}

/// Plan the write for one matched pair.
///
/// Guards, in order: both sides must carry a MAC and the MACs must agree
/// (a disagreement means the match itself is wrong), and both sides must
/// carry coordinates. Then the distance decides the action:
/// zero and no diffs is a no-op, zero with diffs a metadata update, under
/// `nearby_distance` a coordinate snap, and anything farther a new
/// location insert.
pub fn plan_pair(pair: &MatchedPair, nearby_distance: f64) -> Result<Change, ReconcileError> {
    let primary = &pair.primary;
    let secondary = &pair.secondary;

    let mac = match (&primary.mac, &secondary.mac) {
        (Some(p), Some(s)) if p == s => p.clone(),
        (Some(p), Some(s)) => {
            return Err(ReconcileError::MismatchedCounterpart {
                key: primary.name.clone(),
                primary: p.clone(),
                secondary: s.clone(),
            });
        }
        _ => {
            return Err(ReconcileError::precondition(
                &primary.name,
                "both stores must carry a MAC before planning",
            ));
        }
    };

    let (primary_coordinates, distance_m) =
        match (primary.coordinates, distance_between(primary.coordinates, secondary.coordinates))
        {
            (Some(coords), Some(d)) => (coords, d),
            _ => {
                return Err(ReconcileError::precondition(
                    &primary.name,
                    "both stores must carry coordinates before planning",
                ));
            }
        };

    let diffs = field_diffs(primary, secondary);
    let action = if distance_m == 0.0 {
        if diffs.is_empty() {
            ChangeAction::NoOp
        } else {
            ChangeAction::MetadataUpdate
        }
    } else if distance_m < nearby_distance {
        ChangeAction::CoordinateUpdate
    } else {
        ChangeAction::NewLocationInsert
    };

    debug!(
        name = %primary.name,
        ?action,
        distance_m,
        diffs = diffs.len(),
        "planned change"
    );

    Ok(Change {
        name: primary.name.clone(),
        mac,
        action,
        distance_m,
        primary_coordinates,
        diffs,
    })
}

/// Plan a whole batch. Unplannable pairs land in `skipped`; one bad pair
/// never aborts the batch.
pub fn plan_changes(pairs: &[MatchedPair], nearby_distance: f64) -> ChangePlan {
    let mut plan = ChangePlan::default();
    for pair in pairs {
        match plan_pair(pair, nearby_distance) {
            Ok(change) => plan.changes.push(change),
            Err(reason) => plan.skipped.push(reason),
        }
    }
    info!(
        planned = plan.changes.len(),
        skipped = plan.skipped.len(),
        "change planning finished"
    );
    plan
}

/// Pair up records from two name indexes over their common keys.
///
/// Only unambiguous buckets pair; a name with several records on either
/// side is skipped with the ambiguity recorded, since there is no safe way
/// to choose which record to compare.
pub fn pair_by_name(
    primary: &KeyIndex<String>,
    secondary: &KeyIndex<String>,
) -> (Vec<MatchedPair>, Vec<ReconcileError>) {
    let mut pairs = Vec::new();
    let mut skipped = Vec::new();
    for name in primary.keys() {
        if !secondary.contains(name) {
            continue;
        }
        match (primary.singleton(name), secondary.singleton(name)) {
            (Ok(Some(p)), Ok(Some(s))) => pairs.push(MatchedPair::exact(p.clone(), s.clone())),
            (Err(reason), _) | (_, Err(reason)) => skipped.push(reason),
            _ => {}
        }
    }
    (pairs, skipped)
}
