//! # Tessmatch
//!
//! A cross-store reconciliation engine for photometer metadata: two stores
//! describe the same fleet of sky-quality photometers, and this crate
//! answers which devices exist where, whether the two descriptions agree,
//! how a device's identity evolved over time, and what changes would bring
//! the stores back into agreement.
//!
//! Everything is pure computation over typed records; reading the stores
//! and applying planned changes happen outside this crate.

pub mod audit;
pub mod chain;
pub mod config;
pub mod error;
pub mod geo;
pub mod index;
pub mod mac;
pub mod model;
pub mod planner;
pub mod reconcile;
pub mod temporal;

// Re-export main types for convenience
pub use chain::{ChainReport, Classification, HistoryUniverse, RelatedHistory};
pub use config::ReconcileConfig;
pub use error::ReconcileError;
pub use index::KeyIndex;
pub use mac::Mac;
pub use model::{Coordinates, IdentityInterval, MatchedPair, Photometer, StoreSide, ValidState};
pub use planner::{Change, ChangeAction, ChangePlan};
pub use reconcile::Reconciliation;
pub use temporal::Timestamp;

use tracing::info;

/// Main API for cross-store reconciliation.
///
/// A thin facade over the per-module functions, wiring the configured
/// thresholds through so callers do not pass raw numbers around.
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Three-way key-set reconciliation between two name-indexed stores.
    pub fn reconcile(
        &self,
        primary: &KeyIndex<String>,
        secondary: &KeyIndex<String>,
    ) -> Reconciliation<String> {
        reconcile::reconcile(primary, secondary)
    }

    /// Pair common names across stores and plan the secondary-store writes.
    pub fn plan_changes(
        &self,
        primary: &KeyIndex<String>,
        secondary: &KeyIndex<String>,
    ) -> ChangePlan {
        let (pairs, skipped) = planner::pair_by_name(primary, secondary);
        let mut plan = planner::plan_changes(&pairs, self.config.nearby_distance);
        plan.skipped.extend(skipped);
        info!(
            changes = plan.changes.len(),
            skipped = plan.skipped.len(),
            "reconciliation plan built"
        );
        plan
    }

    /// Reconstruct and classify one key's identity history.
    pub fn classify_history(
        &self,
        universe: &HistoryUniverse,
        key: &str,
    ) -> Result<ChainReport, ReconcileError> {
        universe.classify(key)
    }

    /// Photometers within the configured radius window around `origin`.
    pub fn nearby<'a>(
        &self,
        origin: Coordinates,
        candidates: &'a [Photometer],
    ) -> Vec<&'a Photometer> {
        geo::within_radius(
            origin,
            candidates,
            self.config.radius.lower,
            self.config.radius.upper,
        )
    }
}
