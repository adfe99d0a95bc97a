//! # Data Model
//!
//! Typed records for cross-store reconciliation. Each store reader builds
//! these once at its boundary; everything downstream works on the typed
//! shapes instead of re-deriving fields from raw rows or documents.

use crate::mac::Mac;
use crate::temporal::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which store a record snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreSide {
    /// The authoritative relational store of device and location history.
    Primary,
    /// The remote document store reached over its HTTP API.
    Secondary,
}

impl fmt::Display for StoreSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSide::Primary => f.write_str("primary"),
            StoreSide::Secondary => f.write_str("secondary"),
        }
    }
}

/// Validity state of a temporal binding in the primary store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidState {
    Current,
    Expired,
}

/// A WGS84 coordinate pair.
///
/// Equality and hashing use the exact bit pattern of both components, which
/// matches how the stores treat coordinates: two places are "the same
/// coordinates" only when the stored values are identical. Approximate
/// closeness is the geo module's job, not equality's.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.longitude.to_bits() == other.longitude.to_bits()
            && self.latitude.to_bits() == other.latitude.to_bits()
    }
}

impl Eq for Coordinates {}

impl std::hash::Hash for Coordinates {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.longitude.to_bits().hash(state);
        self.latitude.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lon={}, lat={})", self.longitude, self.latitude)
    }
}

/// One photometer metadata snapshot from either store.
///
/// Optional fields are genuinely optional in the wild: historical rows miss
/// coordinates, secondary-store documents miss the zero point, and a record
/// whose MAC failed normalization never makes it this far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photometer {
    /// Human-readable device name, e.g. `stars201`.
    pub name: String,
    /// Normalized hardware identifier.
    pub mac: Option<Mac>,
    pub coordinates: Option<Coordinates>,
    pub place: Option<String>,
    pub town: Option<String>,
    pub sub_region: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    /// Calibration zero point, when the store carries one.
    pub zero_point: Option<f64>,
    pub side: StoreSide,
}

impl Photometer {
    /// A minimal snapshot; callers fill in whatever their store provides.
    pub fn new(name: impl Into<String>, side: StoreSide) -> Self {
        Self {
            name: name.into(),
            mac: None,
            coordinates: None,
            place: None,
            town: None,
            sub_region: None,
            region: None,
            country: None,
            timezone: None,
            zero_point: None,
            side,
        }
    }
}

/// A time-bounded binding between a tracked key and its counterpart key.
///
/// The orientation is the caller's choice: tracking a name means `key` is
/// the name and `counterpart` the MAC; tracking a MAC flips the two. The
/// chain reconstructor only cares that `key` is the attribute whose history
/// is being walked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityInterval {
    pub key: String,
    pub counterpart: String,
    pub valid_since: Timestamp,
    pub valid_until: Timestamp,
    pub valid_state: ValidState,
}

impl IdentityInterval {
    pub fn new(
        key: impl Into<String>,
        counterpart: impl Into<String>,
        valid_since: Timestamp,
        valid_until: Timestamp,
        valid_state: ValidState,
    ) -> Self {
        Self {
            key: key.into(),
            counterpart: counterpart.into(),
            valid_since,
            valid_until,
            valid_state,
        }
    }

    /// Swap key and counterpart, to walk the same history from the other
    /// attribute's point of view.
    pub fn flipped(&self) -> Self {
        Self {
            key: self.counterpart.clone(),
            counterpart: self.key.clone(),
            valid_since: self.valid_since,
            valid_until: self.valid_until,
            valid_state: self.valid_state,
        }
    }
}

/// How a match candidate was proposed, carried into planning as confidence
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchOrigin {
    /// Both records share the exact key the indexes were built on.
    ExactKey,
    /// The records were paired by coordinate proximity.
    WithinRadius { meters: f64 },
}

/// A proposed cross-store pairing of records believed to describe the same
/// physical device or place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub primary: Photometer,
    pub secondary: Photometer,
    pub origin: MatchOrigin,
}

impl MatchedPair {
    pub fn exact(primary: Photometer, secondary: Photometer) -> Self {
        Self {
            primary,
            secondary,
            origin: MatchOrigin::ExactKey,
        }
    }
}
