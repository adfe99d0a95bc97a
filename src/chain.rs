//! # Identity Chain Reconstructor
//!
//! A device's name-to-MAC binding changes over time: hardware gets swapped
//! under a kept name (a repair), or a box keeps its MAC but is redeployed
//! under a new name (a renaming). The primary store records each binding as
//! a validity interval. This module rebuilds the full temporal identity of
//! one tracked key from those intervals: orders them, finds boundary breaks,
//! walks outward to adjacent chains of other keys sharing a boundary
//! timestamp, and classifies the result.
//!
//! Ambiguity is a first-class outcome here, not an assertion failure: a
//! boundary walk that finds several candidate predecessors stops and reports
//! them, leaving resolution to a human.

use crate::error::ReconcileError;
use crate::model::{IdentityInterval, ValidState};
use crate::temporal::{is_open_ended, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Derived label for a tracked key's identity history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// 1:1 binding, never reassigned, fully contiguous.
    Easy,
    /// One name, several MACs over a contiguous unrelated chain: hardware
    /// swapped under a fixed name.
    Repaired,
    /// The key's counterpart also served under other keys over a contiguous
    /// chain: the counterpart was reassigned.
    Renamed,
    /// Both kinds of reassignment, broken chains, or unresolved ambiguity.
    Complicated,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Classification::Easy => "easy",
            Classification::Repaired => "repaired",
            Classification::Renamed => "renamed",
            Classification::Complicated => "complicated",
        };
        f.write_str(text)
    }
}

/// A boundary inside a chain where two adjacent intervals do not abut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPoint {
    /// End timestamp of the interval before the gap.
    pub ended: Timestamp,
    /// Start timestamp of its successor.
    pub resumed: Timestamp,
}

/// Outcome of walking outward from a chain boundary through other keys'
/// intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedHistory {
    /// No interval of any key abuts this boundary.
    None,
    /// An unambiguous run of adjacent intervals, in chronological order.
    Chain(Vec<IdentityInterval>),
    /// The walk hit a boundary shared by several candidate intervals. What
    /// was collected unambiguously is kept; the candidates are reported,
    /// never guessed between.
    Uncertain {
        resolved: Vec<IdentityInterval>,
        candidates: Vec<IdentityInterval>,
    },
}

impl RelatedHistory {
    pub fn is_uncertain(&self) -> bool {
        matches!(self, RelatedHistory::Uncertain { .. })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RelatedHistory::None)
    }
}

/// Full reconstruction result for one tracked key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub key: String,
    /// The key's own intervals, ordered by `valid_since`.
    pub intervals: Vec<IdentityInterval>,
    pub break_points: Vec<BreakPoint>,
    /// True iff every interval's end meets its successor's start.
    pub contiguous: bool,
    /// True when the chain's head has expired without a successor: the last
    /// interval is `Expired`, or claims to be current without the
    /// open-ended end timestamp. Advisory, not an error.
    pub truncated: bool,
    /// Walk backward from the chain's earliest start.
    pub previous: RelatedHistory,
    /// Walk forward from the chain's latest end.
    pub next: RelatedHistory,
    /// Forward walks from each break point's end timestamp, parallel to
    /// `break_points`.
    pub break_histories: Vec<RelatedHistory>,
    /// True when any outward walk stopped on an ambiguous boundary.
    pub uncertain: bool,
    pub label: Classification,
}

/// All identity intervals known to the primary store, indexed for boundary
/// walks and counterpart cross-referencing.
#[derive(Debug, Clone)]
pub struct HistoryUniverse {
    intervals: Vec<IdentityInterval>,
    by_key: HashMap<String, Vec<usize>>,
    by_counterpart: HashMap<String, Vec<usize>>,
}

impl HistoryUniverse {
    pub fn new(intervals: Vec<IdentityInterval>) -> Self {
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_counterpart: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, interval) in intervals.iter().enumerate() {
            by_key.entry(interval.key.clone()).or_default().push(i);
            by_counterpart
                .entry(interval.counterpart.clone())
                .or_default()
                .push(i);
        }
        Self {
            intervals,
            by_key,
            by_counterpart,
        }
    }

    /// Tracked keys present in the universe.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    /// The key's own intervals, ordered by `valid_since`.
    fn chain_of(&self, key: &str) -> Vec<IdentityInterval> {
        let mut chain: Vec<IdentityInterval> = self
            .by_key
            .get(key)
            .map(|indices| indices.iter().map(|&i| self.intervals[i].clone()).collect())
            .unwrap_or_default();
        chain.sort_by_key(|interval| interval.valid_since);
        chain
    }

    fn matching<F: Fn(&IdentityInterval) -> bool>(&self, pred: F) -> Vec<IdentityInterval> {
        self.intervals
            .iter()
            .filter(|interval| pred(interval))
            .cloned()
            .collect()
    }

    /// Walk backward from `boundary`, repeatedly looking for the interval
    /// (of any key) whose `valid_until` equals the current timestamp.
    pub fn related_before(&self, boundary: Timestamp) -> RelatedHistory {
        self.walk(boundary, Direction::Backward)
    }

    /// Walk forward from `boundary`, repeatedly looking for the interval
    /// (of any key) whose `valid_since` equals the current timestamp.
    pub fn related_after(&self, boundary: Timestamp) -> RelatedHistory {
        self.walk(boundary, Direction::Forward)
    }

    fn walk(&self, boundary: Timestamp, direction: Direction) -> RelatedHistory {
        let mut collected: Vec<IdentityInterval> = Vec::new();
        let mut cursor = boundary;
        // An adversarial universe with equal-length zero-gap cycles could
        // loop forever; each step consumes at least one distinct interval,
        // so the universe size bounds the walk.
        for _ in 0..=self.intervals.len() {
            let matches = match direction {
                Direction::Backward => self.matching(|i| i.valid_until == cursor),
                Direction::Forward => self.matching(|i| i.valid_since == cursor),
            };
            let mut matches = matches.into_iter();
            match (matches.next(), matches.len()) {
                (None, _) => break,
                (Some(step), 0) => {
                    cursor = match direction {
                        Direction::Backward => step.valid_since,
                        Direction::Forward => step.valid_until,
                    };
                    collected.push(step);
                }
                (Some(first), _) => {
                    let mut candidates = vec![first];
                    candidates.extend(matches);
                    if direction == Direction::Backward {
                        collected.reverse();
                    }
                    return RelatedHistory::Uncertain {
                        resolved: collected,
                        candidates,
                    };
                }
            }
        }
        if collected.is_empty() {
            return RelatedHistory::None;
        }
        if direction == Direction::Backward {
            collected.reverse();
        }
        RelatedHistory::Chain(collected)
    }

    /// Reconstruct and classify the identity history of `key`.
    ///
    /// Requires at least one interval for the key; invoking this on an
    /// unknown key is a precondition violation, not a soft failure.
    pub fn classify(&self, key: &str) -> Result<ChainReport, ReconcileError> {
        let chain = self.chain_of(key);
        let (first, last) = match (chain.first(), chain.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => {
                return Err(ReconcileError::precondition(
                    key,
                    "history reconstruction needs at least one identity interval",
                ));
            }
        };

        // Break scan records every non-abutting boundary and keeps going;
        // a single gap must not hide later ones.
        let mut break_points = Vec::new();
        for pair in chain.windows(2) {
            if pair[0].valid_until != pair[1].valid_since {
                break_points.push(BreakPoint {
                    ended: pair[0].valid_until,
                    resumed: pair[1].valid_since,
                });
            }
        }
        let contiguous = break_points.is_empty();

        let truncated =
            last.valid_state == ValidState::Expired || !is_open_ended(last.valid_until);
        if truncated {
            warn!(key, "identity chain is truncated: current head has expired");
        }

        let previous = self.related_before(first.valid_since);
        let next = self.related_after(last.valid_until);
        let break_histories: Vec<RelatedHistory> = break_points
            .iter()
            .map(|gap| self.related_after(gap.ended))
            .collect();

        let uncertain = previous.is_uncertain()
            || next.is_uncertain()
            || break_histories.iter().any(RelatedHistory::is_uncertain);

        let label = self.label_for(key, &chain, contiguous, uncertain);
        debug!(key, %label, breaks = break_points.len(), "classified identity chain");

        Ok(ChainReport {
            key: key.to_string(),
            intervals: chain,
            break_points,
            contiguous,
            truncated,
            previous,
            next,
            break_histories,
            uncertain,
            label,
        })
    }

    fn label_for(
        &self,
        key: &str,
        chain: &[IdentityInterval],
        contiguous: bool,
        uncertain: bool,
    ) -> Classification {
        if !contiguous || uncertain {
            return Classification::Complicated;
        }
        let counterparts: BTreeSet<&str> = chain
            .iter()
            .map(|interval| interval.counterpart.as_str())
            .collect();
        let swapped = counterparts.len() > 1;
        // A counterpart serving under any other key means it was reassigned
        // at some point, regardless of direction.
        let shared = counterparts.iter().any(|counterpart| {
            self.by_counterpart
                .get(*counterpart)
                .is_some_and(|indices| indices.iter().any(|&i| self.intervals[i].key != key))
        });
        match (swapped, shared) {
            (false, false) => Classification::Easy,
            (true, false) => Classification::Repaired,
            (false, true) => Classification::Renamed,
            (true, true) => Classification::Complicated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::OPEN_END;

    fn interval(
        key: &str,
        counterpart: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> IdentityInterval {
        let state = if is_open_ended(until) {
            ValidState::Current
        } else {
            ValidState::Expired
        };
        IdentityInterval::new(key, counterpart, since, until, state)
    }

    #[test]
    fn contiguous_open_ended_chain_is_clean() {
        let universe = HistoryUniverse::new(vec![
            interval("stars1", "AA:AA:AA:AA:AA:01", 100, 200),
            interval("stars1", "AA:AA:AA:AA:AA:01", 200, 300),
            interval("stars1", "AA:AA:AA:AA:AA:01", 300, OPEN_END),
        ]);
        let report = universe.classify("stars1").unwrap();
        assert!(report.contiguous);
        assert!(!report.truncated);
        assert!(report.break_points.is_empty());
        assert_eq!(report.label, Classification::Easy);
    }

    #[test]
    fn single_gap_reports_one_break_pair_and_continues() {
        let universe = HistoryUniverse::new(vec![
            interval("stars1", "AA:AA:AA:AA:AA:01", 100, 200),
            interval("stars1", "AA:AA:AA:AA:AA:01", 250, 300),
            interval("stars1", "AA:AA:AA:AA:AA:01", 300, OPEN_END),
        ]);
        let report = universe.classify("stars1").unwrap();
        assert!(!report.contiguous);
        assert_eq!(
            report.break_points,
            vec![BreakPoint {
                ended: 200,
                resumed: 250
            }]
        );
        assert_eq!(report.label, Classification::Complicated);
    }

    #[test]
    fn truncated_chain_is_flagged_not_failed() {
        let universe = HistoryUniverse::new(vec![interval(
            "stars1",
            "AA:AA:AA:AA:AA:01",
            100,
            200,
        )]);
        let report = universe.classify("stars1").unwrap();
        assert!(report.truncated);
    }

    #[test]
    fn hardware_swap_under_fixed_name_is_repaired() {
        // "X" bound to "A" then to "B", contiguous, neither MAC seen
        // under any other name.
        let universe = HistoryUniverse::new(vec![
            interval("stars1", "AA:AA:AA:AA:AA:01", 100, 200),
            interval("stars1", "AA:AA:AA:AA:AA:02", 200, OPEN_END),
        ]);
        let report = universe.classify("stars1").unwrap();
        assert_eq!(report.label, Classification::Repaired);
    }

    #[test]
    fn counterpart_reassigned_to_another_key_is_renamed() {
        // MAC "M" served name "X" then name "Y", contiguous.
        let universe = HistoryUniverse::new(vec![
            interval("stars1", "AA:AA:AA:AA:AA:01", 100, 200),
            interval("stars2", "AA:AA:AA:AA:AA:01", 200, OPEN_END),
        ]);
        let report = universe.classify("stars1").unwrap();
        assert_eq!(report.label, Classification::Renamed);

        // The successor chain is visible from the boundary walk.
        match &report.next {
            RelatedHistory::Chain(successors) => {
                assert_eq!(successors.len(), 1);
                assert_eq!(successors[0].key, "stars2");
            }
            other => panic!("expected successor chain, got {other:?}"),
        }
    }

    #[test]
    fn backward_walk_collects_predecessors_in_order() {
        let universe = HistoryUniverse::new(vec![
            interval("stars1", "AA:AA:AA:AA:AA:01", 50, 100),
            interval("stars2", "AA:AA:AA:AA:AA:01", 100, 150),
            interval("stars3", "AA:AA:AA:AA:AA:02", 150, OPEN_END),
        ]);
        match universe.related_before(150) {
            RelatedHistory::Chain(history) => {
                let keys: Vec<&str> = history.iter().map(|i| i.key.as_str()).collect();
                assert_eq!(keys, ["stars1", "stars2"]);
            }
            other => panic!("expected chain, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_boundary_stops_the_walk_uncertain() {
        // Two intervals end exactly where the chain starts: no guessing.
        let universe = HistoryUniverse::new(vec![
            interval("stars1", "AA:AA:AA:AA:AA:01", 200, OPEN_END),
            interval("stars2", "AA:AA:AA:AA:AA:02", 100, 200),
            interval("stars3", "AA:AA:AA:AA:AA:03", 150, 200),
        ]);
        let report = universe.classify("stars1").unwrap();
        assert!(report.uncertain);
        assert_eq!(report.label, Classification::Complicated);
        match &report.previous {
            RelatedHistory::Uncertain { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("expected uncertain walk, got {other:?}"),
        }
    }

    #[test]
    fn break_history_walks_forward_from_the_gap() {
        let universe = HistoryUniverse::new(vec![
            interval("stars1", "AA:AA:AA:AA:AA:01", 100, 200),
            interval("stars1", "AA:AA:AA:AA:AA:01", 300, OPEN_END),
            // Another key occupied the gap's starting boundary.
            interval("stars9", "AA:AA:AA:AA:AA:09", 200, 250),
        ]);
        let report = universe.classify("stars1").unwrap();
        assert_eq!(report.break_histories.len(), 1);
        match &report.break_histories[0] {
            RelatedHistory::Chain(history) => assert_eq!(history[0].key, "stars9"),
            other => panic!("expected chain, got {other:?}"),
        }
    }

    #[test]
    fn unknown_key_is_a_precondition_violation() {
        let universe = HistoryUniverse::new(vec![]);
        assert!(matches!(
            universe.classify("stars1"),
            Err(ReconcileError::PreconditionViolation { .. })
        ));
    }
}
