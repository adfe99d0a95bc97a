//! # Proximity Matcher
//!
//! Approximate great-circle distances between coordinate pairs and the
//! near-duplicate scans built on them. The distance uses an equirectangular
//! small-angle approximation with a mean-latitude correction; it is accurate
//! for the short distances this crate cares about (meters to a few
//! kilometers) and knowingly wrong across continents. That is a documented
//! limitation, not a bug: the only question ever asked is "are these two
//! points the same place".

use crate::index::KeyIndex;
use crate::model::{Coordinates, Photometer};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Approximate distance in meters between two coordinate pairs.
///
/// Equirectangular approximation: both angular offsets are projected onto a
/// plane tangent at the pair's mean latitude.
pub fn distance(a: Coordinates, b: Coordinates) -> f64 {
    let mean_lat = ((a.latitude + b.latitude) / 2.0).to_radians();
    let d_lat = (a.latitude - b.latitude).to_radians();
    let d_lon = (a.longitude - b.longitude).to_radians();
    EARTH_RADIUS * (d_lat.powi(2) + (mean_lat.cos() * d_lon).powi(2)).sqrt()
}

/// Distance between two optional coordinate pairs. A missing coordinate on
/// either side yields `None`: unmatchable, never "distance 0".
pub fn distance_between(a: Option<Coordinates>, b: Option<Coordinates>) -> Option<f64> {
    Some(distance(a?, b?))
}

/// Filter `candidates` down to those whose distance to `origin` falls in
/// `[lower, upper]` meters. Candidates without coordinates never match.
pub fn within_radius<'a>(
    origin: Coordinates,
    candidates: &'a [Photometer],
    lower: f64,
    upper: f64,
) -> Vec<&'a Photometer> {
    candidates
        .iter()
        .filter(|candidate| {
            distance_between(Some(origin), candidate.coordinates)
                .is_some_and(|d| d >= lower && d <= upper)
        })
        .collect()
}

/// A pair of distinct coordinate keys found closer than a limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPair {
    pub a: Coordinates,
    pub b: Coordinates,
    pub meters: f64,
}

/// All-pairs scan over the distinct coordinate keys of an index, reporting
/// pairs closer than `limit` meters.
///
/// O(n²) over distinct coordinates; fine for the hundreds of places the
/// stores hold. Callers with larger inputs should pre-bucket by coarse
/// region first. Input order does not matter.
pub fn nearby_pairs<R>(index: &KeyIndex<Coordinates, R>, limit: f64) -> Vec<NearbyPair> {
    let coords: Vec<Coordinates> = index.keys().copied().collect();
    let mut pairs = Vec::new();
    for (i, &a) in coords.iter().enumerate() {
        for &b in &coords[i + 1..] {
            let meters = distance(a, b);
            if meters < limit {
                pairs.push(NearbyPair { a, b, meters });
            }
        }
    }
    debug!(
        coordinates = coords.len(),
        pairs = pairs.len(),
        limit_m = limit,
        "nearby pair scan"
    );
    pairs
}
