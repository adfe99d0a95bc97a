//! # Single-Store Audits
//!
//! Consistency checks that need only one store's records: places whose
//! coordinates disagree between entries, distinct places sharing exact
//! coordinates, duplicated entries under one key, records missing
//! coordinates, and implausible calibration values. Each check reports
//! typed findings; nothing is mutated.

use crate::index::{by_coordinates, by_place, KeyIndex};
use crate::mac::Mac;
use crate::model::{Coordinates, Photometer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Calibration zero points outside this open interval are treated as
/// uncalibrated placeholders, not real measurements.
pub const ZERO_POINT_LOW: f64 = 18.5;
pub const ZERO_POINT_HIGH: f64 = 20.5;

/// One audit finding over a single store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Finding {
    /// Entries under one place label carry different coordinate pairs.
    InconsistentPlaceCoordinates {
        place: String,
        coordinates: Vec<Coordinates>,
    },
    /// One exact coordinate pair serves several distinct place labels.
    SharedCoordinates {
        coordinates: Coordinates,
        places: Vec<String>,
    },
    /// Several records share one key where a single one was expected.
    DuplicatedEntries { key: String, count: usize },
    /// A record carries no coordinates at all.
    MissingCoordinates { name: String },
    /// The same device name resolves to different MACs across the stores.
    MacMismatch {
        name: String,
        primary: Mac,
        secondary: Mac,
    },
}

/// Places whose entries disagree on coordinates.
pub fn audit_places(records: &[Photometer]) -> Vec<Finding> {
    let index = by_place(records.to_vec());
    let mut findings = Vec::new();
    for (place, entries) in index.iter() {
        let coords: BTreeSet<(u64, u64)> = entries
            .iter()
            .filter_map(|r| r.coordinates)
            .map(|c| (c.longitude.to_bits(), c.latitude.to_bits()))
            .collect();
        if coords.len() > 1 {
            findings.push(Finding::InconsistentPlaceCoordinates {
                place: place.clone(),
                coordinates: coords
                    .into_iter()
                    .map(|(lon, lat)| {
                        Coordinates::new(f64::from_bits(lon), f64::from_bits(lat))
                    })
                    .collect(),
            });
        }
    }
    findings
}

/// Coordinate pairs claimed by more than one place label, plus records with
/// no coordinates at all.
pub fn audit_coordinates(records: &[Photometer]) -> Vec<Finding> {
    let index = by_coordinates(records.to_vec());
    let mut findings = Vec::new();
    for (coordinates, entries) in index.iter() {
        let places: BTreeSet<String> = entries
            .iter()
            .filter_map(|r| r.place.clone())
            .collect();
        if places.len() > 1 {
            findings.push(Finding::SharedCoordinates {
                coordinates: *coordinates,
                places: places.into_iter().collect(),
            });
        }
    }
    for record in index.unknown() {
        findings.push(Finding::MissingCoordinates {
            name: record.name.clone(),
        });
    }
    findings
}

/// Keys whose bucket holds more than one record.
pub fn audit_duplicates<K, R>(index: &KeyIndex<K, R>) -> Vec<Finding>
where
    K: Eq + std::hash::Hash + Clone + std::fmt::Debug + std::fmt::Display,
{
    index
        .ambiguous()
        .map(|(key, records)| Finding::DuplicatedEntries {
            key: key.to_string(),
            count: records.len(),
        })
        .collect()
}

/// Device names whose MAC differs across two name-indexed stores. Names
/// with ambiguous buckets or a missing MAC on either side are skipped;
/// they surface through other checks.
pub fn mac_differences(
    primary: &KeyIndex<String>,
    secondary: &KeyIndex<String>,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for name in primary.keys() {
        let (Ok(Some(p)), Ok(Some(s))) = (primary.singleton(name), secondary.singleton(name))
        else {
            continue;
        };
        if let (Some(pm), Some(sm)) = (&p.mac, &s.mac) {
            if pm != sm {
                findings.push(Finding::MacMismatch {
                    name: name.clone(),
                    primary: pm.clone(),
                    secondary: sm.clone(),
                });
            }
        }
    }
    findings
}

/// Whether a calibration zero point looks like a real measurement.
pub fn plausible_zero_point(zero_point: f64) -> bool {
    zero_point > ZERO_POINT_LOW && zero_point < ZERO_POINT_HIGH
}

/// Drop records whose zero point falls outside the plausible window.
/// Records without a zero point pass through untouched.
pub fn drop_implausible_zero_points(records: Vec<Photometer>) -> Vec<Photometer> {
    records
        .into_iter()
        .filter(|record| match record.zero_point {
            Some(zp) if !plausible_zero_point(zp) => {
                warn!(name = %record.name, zero_point = zp, "implausible zero point, dropping record");
                false
            }
            _ => true,
        })
        .collect()
}
