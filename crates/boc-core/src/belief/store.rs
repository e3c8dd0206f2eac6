//! In-memory belief store.

use super::decay::DecaySettings;
use super::evidence::{combine, evidence_weight, CONFLICT_PENALTY_FACTOR};
use super::state::{BeliefState, Evidence, EvidenceKind};
use crate::determinism::Clock;
use crate::error::{BocError, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Confidence multipliers applied by [`BeliefStore::resolve_conflicts`].
const DOMINANT_CONTRADICTION_FACTOR: f64 = 0.5;
const PARTIAL_CONTRADICTION_FACTOR: f64 = 0.8;

fn check_confidence(confidence: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(BocError::value(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            confidence
        )));
    }
    Ok(())
}

/// Named beliefs with time-decaying confidence.
///
/// Records are created once per name and mutated only through the methods
/// below; every mutation leaves `current_confidence` within the record's
/// bounds.
#[derive(Debug, Default)]
pub struct BeliefStore {
    beliefs: HashMap<String, BeliefState>,
    clock: Clock,
}

impl BeliefStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            beliefs: HashMap::new(),
            clock,
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Create (or overwrite) a belief at `confidence`.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        confidence: f64,
        decay: DecaySettings,
        metadata: BTreeMap<String, String>,
    ) -> Result<&BeliefState> {
        check_confidence(confidence)?;
        decay.validate()?;

        let name = name.into();
        debug!(
            belief = %name,
            confidence,
            curve = %decay.curve,
            rate = decay.rate,
            "Creating belief"
        );

        let belief = BeliefState::new(name.clone(), confidence, decay, metadata, self.clock.now());
        self.beliefs.insert(name.clone(), belief);
        Ok(&self.beliefs[&name])
    }

    /// Confidence of `belief` projected to the store's current time. Does not mutate.
    pub fn apply_decay(&self, belief: &BeliefState) -> f64 {
        if !belief.active {
            return belief.current_confidence;
        }

        let periods = belief.age_in_periods(self.clock.now());
        let decayed = belief
            .decay
            .curve
            .apply(belief.current_confidence, belief.decay.rate, periods);
        belief.clamp(decayed)
    }

    /// Blend a new confidence reading into a belief.
    ///
    /// Returns `Ok(false)` when the belief does not exist, before the new
    /// confidence is range-checked.
    pub fn update(
        &mut self,
        name: &str,
        new_confidence: f64,
        evidence: Option<Evidence>,
    ) -> Result<bool> {
        let now = self.clock.now();
        let decayed = match self.beliefs.get(name) {
            Some(belief) => self.apply_decay(belief),
            None => {
                warn!(belief = %name, "Update for unknown belief ignored");
                return Ok(false);
            }
        };
        check_confidence(new_confidence)?;

        let Some(belief) = self.beliefs.get_mut(name) else {
            return Ok(false);
        };

        let combined = match evidence {
            Some(evidence) => {
                let weight = evidence_weight(&evidence, now);
                belief.evidence_history.push(evidence);
                combine(decayed, new_confidence, weight)
            }
            None => new_confidence,
        };

        belief.current_confidence = belief.clamp(combined);
        belief.last_updated = now;
        debug!(
            belief = %name,
            decayed,
            confidence = belief.current_confidence,
            "Updated belief"
        );
        Ok(true)
    }

    /// Record contradicting evidence and apply its penalty immediately.
    ///
    /// Returns the penalty subtracted, or `None` when the belief does not exist.
    pub fn add_contradictory_evidence(&mut self, name: &str, evidence: Evidence) -> Option<f64> {
        let now = self.clock.now();
        let Some(belief) = self.beliefs.get_mut(name) else {
            warn!(belief = %name, "Contradictory evidence for unknown belief ignored");
            return None;
        };

        let penalty = evidence.confidence * CONFLICT_PENALTY_FACTOR;
        belief.evidence_history.push(evidence);
        belief.current_confidence = belief.clamp(belief.current_confidence - penalty);
        belief.last_updated = now;
        debug!(
            belief = %name,
            penalty,
            confidence = belief.current_confidence,
            "Applied conflict penalty"
        );
        Some(penalty)
    }

    /// Weigh contradictory evidence against supporting and opposing evidence
    /// and scale the confidence down accordingly.
    ///
    /// Returns the resulting confidence, or `None` when the belief does not exist.
    pub fn resolve_conflicts(&mut self, name: &str) -> Option<f64> {
        let now = self.clock.now();
        let Some(belief) = self.beliefs.get_mut(name) else {
            warn!(belief = %name, "Conflict resolution for unknown belief ignored");
            return None;
        };

        let total = |kind: EvidenceKind| -> f64 {
            belief
                .evidence_of_kind(kind)
                .map(|e| evidence_weight(e, now))
                .sum()
        };
        let positive = total(EvidenceKind::Positive);
        let negative = total(EvidenceKind::Negative);
        let contradictory = total(EvidenceKind::Contradictory);

        let factor = if contradictory > positive + negative {
            Some(DOMINANT_CONTRADICTION_FACTOR)
        } else if contradictory > 0.0 {
            Some(PARTIAL_CONTRADICTION_FACTOR)
        } else {
            None
        };

        if let Some(factor) = factor {
            belief.current_confidence = belief.clamp(belief.current_confidence * factor);
            belief.last_updated = now;
            debug!(
                belief = %name,
                positive,
                negative,
                contradictory,
                factor,
                "Resolved conflicting evidence"
            );
        }

        Some(belief.current_confidence)
    }

    /// Decayed confidence of a belief, or `None` when it does not exist.
    pub fn get_current_confidence(&self, name: &str) -> Option<f64> {
        self.beliefs.get(name).map(|belief| self.apply_decay(belief))
    }

    /// Replace the decay settings of an existing belief.
    pub fn configure_decay(&mut self, name: &str, decay: DecaySettings) -> Result<bool> {
        decay.validate()?;

        match self.beliefs.get_mut(name) {
            Some(belief) => {
                debug!(
                    belief = %name,
                    curve = %decay.curve,
                    rate = decay.rate,
                    period = ?decay.period,
                    "Configured decay"
                );
                belief.decay = decay;
                Ok(true)
            }
            None => {
                warn!(belief = %name, "Decay configuration for unknown belief ignored");
                Ok(false)
            }
        }
    }

    /// Suspend or resume decay for a belief.
    pub fn set_active(&mut self, name: &str, active: bool) -> bool {
        match self.beliefs.get_mut(name) {
            Some(belief) => {
                belief.active = active;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&BeliefState> {
        self.beliefs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.beliefs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    /// Copies of every belief with decay applied to `current_confidence`.
    /// Stored records are left untouched.
    pub fn snapshot(&self) -> BTreeMap<String, BeliefState> {
        self.beliefs
            .iter()
            .map(|(name, belief)| {
                let mut copy = belief.clone();
                copy.current_confidence = self.apply_decay(belief);
                (name.clone(), copy)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::decay::DecayCurve;
    use chrono::{Duration, Utc};
    use std::time::Duration as StdDuration;

    fn hourly(curve: DecayCurve, rate: f64) -> DecaySettings {
        DecaySettings::new(curve, rate, StdDuration::from_secs(3600)).unwrap()
    }

    fn frozen_store() -> BeliefStore {
        BeliefStore::with_clock(Clock::frozen_at(Utc::now()))
    }

    fn evidence(store: &BeliefStore, kind: EvidenceKind, confidence: f64) -> Evidence {
        Evidence::new("observation", confidence, "test", kind)
            .unwrap()
            .at(store.clock().now())
    }

    #[test]
    fn test_create_stores_confidence_exactly() {
        let mut store = frozen_store();
        let belief = store
            .create("temperature_is_high", 0.8, DecaySettings::default(), BTreeMap::new())
            .unwrap();

        assert_eq!(belief.initial_confidence, 0.8);
        assert_eq!(belief.current_confidence, 0.8);
        assert!(belief.active);
        assert_eq!(store.get_current_confidence("temperature_is_high"), Some(0.8));
    }

    #[test]
    fn test_create_rejects_out_of_range() {
        let mut store = frozen_store();
        assert!(store.create("b", 1.01, DecaySettings::default(), BTreeMap::new()).is_err());
        assert!(store.create("b", -0.01, DecaySettings::default(), BTreeMap::new()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_rejects_zero_period() {
        let mut store = frozen_store();
        let decay = DecaySettings {
            curve: DecayCurve::Linear,
            rate: 0.1,
            period: StdDuration::ZERO,
        };
        assert!(matches!(
            store.create("b", 0.5, decay, BTreeMap::new()),
            Err(BocError::Value(_))
        ));
    }

    #[test]
    fn test_create_overwrites() {
        let mut store = frozen_store();
        store.create("b", 0.2, DecaySettings::default(), BTreeMap::new()).unwrap();
        store.create("b", 0.9, DecaySettings::default(), BTreeMap::new()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b").unwrap().current_confidence, 0.9);
    }

    #[test]
    fn test_exponential_decay_over_two_periods() {
        let mut store = frozen_store();
        store
            .create("temperature_is_high", 0.8, hourly(DecayCurve::Exponential, 0.1), BTreeMap::new())
            .unwrap();
        store.clock_mut().advance(Duration::hours(2));

        let decayed = store.get_current_confidence("temperature_is_high").unwrap();
        assert!((decayed - 0.8 * (-0.2f64).exp()).abs() < 1e-9);
        // stored state is not modified by reads
        assert_eq!(store.get("temperature_is_high").unwrap().current_confidence, 0.8);
    }

    #[test]
    fn test_linear_decay_over_two_periods() {
        let mut store = frozen_store();
        store
            .create("server_is_healthy", 0.9, hourly(DecayCurve::Linear, 0.05), BTreeMap::new())
            .unwrap();
        store.clock_mut().advance(Duration::hours(2));

        let decayed = store.get_current_confidence("server_is_healthy").unwrap();
        assert!((decayed - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_belief_does_not_decay() {
        let mut store = frozen_store();
        store.create("b", 0.8, hourly(DecayCurve::Linear, 0.3), BTreeMap::new()).unwrap();
        assert!(store.set_active("b", false));
        store.clock_mut().advance(Duration::hours(2));

        assert_eq!(store.get_current_confidence("b"), Some(0.8));
        assert!(!store.set_active("missing", false));
    }

    #[test]
    fn test_update_with_fresh_neutral_evidence() {
        let mut store = frozen_store();
        store
            .create("temperature_is_high", 0.8, hourly(DecayCurve::Exponential, 0.1), BTreeMap::new())
            .unwrap();
        store.clock_mut().advance(Duration::hours(2));
        let decayed = 0.8 * (-0.2f64).exp();

        let ev = evidence(&store, EvidenceKind::Neutral, 0.95);
        assert!(store.update("temperature_is_high", 0.95, Some(ev)).unwrap());

        let belief = store.get("temperature_is_high").unwrap();
        let expected = 0.5 * decayed + 0.5 * 0.95;
        assert!((belief.current_confidence - expected).abs() < 1e-9);
        assert!((belief.current_confidence - 0.8025).abs() < 1e-3);
        assert_eq!(belief.evidence_history.len(), 1);
        assert_eq!(belief.last_updated, store.clock().now());
    }

    #[test]
    fn test_update_with_strong_evidence() {
        let mut store = frozen_store();
        store.create("b", 0.4, DecaySettings::default(), BTreeMap::new()).unwrap();

        let ev = evidence(&store, EvidenceKind::Positive, 0.9).with_weight(2.0);
        store.update("b", 0.9, Some(ev)).unwrap();

        // weight 2.0 × 1.0 × 1.2 = 2.4 → blend 2.4 / 3.4
        let blend = 2.4 / 3.4;
        let expected = (1.0 - blend) * 0.4 + blend * 0.9;
        assert!((store.get("b").unwrap().current_confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_update_without_evidence_replaces() {
        let mut store = frozen_store();
        store.create("b", 0.4, DecaySettings::default(), BTreeMap::new()).unwrap();
        assert!(store.update("b", 0.7, None).unwrap());
        assert_eq!(store.get("b").unwrap().current_confidence, 0.7);
    }

    #[test]
    fn test_update_unknown_and_invalid() {
        let mut store = frozen_store();
        assert!(!store.update("missing", 0.5, None).unwrap());
        assert!(!store.update("missing", 1.5, None).unwrap());

        store.create("b", 0.4, DecaySettings::default(), BTreeMap::new()).unwrap();
        assert!(store.update("b", 1.5, None).is_err());
        assert_eq!(store.get("b").unwrap().current_confidence, 0.4);
    }

    #[test]
    fn test_contradictory_evidence_penalty() {
        let mut store = frozen_store();
        store.create("b", 0.8, DecaySettings::default(), BTreeMap::new()).unwrap();

        let ev = evidence(&store, EvidenceKind::Contradictory, 0.85);
        let penalty = store.add_contradictory_evidence("b", ev).unwrap();

        assert!((penalty - 0.255).abs() < 1e-12);
        assert!((store.get("b").unwrap().current_confidence - 0.545).abs() < 1e-12);
        assert_eq!(store.add_contradictory_evidence("missing", evidence(&store, EvidenceKind::Contradictory, 0.5)), None);
    }

    #[test]
    fn test_contradictory_penalty_is_floor_clamped() {
        let mut store = frozen_store();
        store.create("b", 0.1, DecaySettings::default(), BTreeMap::new()).unwrap();

        let ev = evidence(&store, EvidenceKind::Contradictory, 1.0);
        store.add_contradictory_evidence("b", ev).unwrap();
        assert_eq!(store.get("b").unwrap().current_confidence, 0.0);
    }

    #[test]
    fn test_resolve_dominant_contradiction_halves() {
        let mut store = frozen_store();
        store.create("b", 0.8, DecaySettings::default(), BTreeMap::new()).unwrap();
        let ev = evidence(&store, EvidenceKind::Contradictory, 0.5);
        store.add_contradictory_evidence("b", ev).unwrap();
        let before = store.get("b").unwrap().current_confidence;

        let resolved = store.resolve_conflicts("b").unwrap();
        assert!((resolved - before * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_partial_contradiction() {
        let mut store = frozen_store();
        store.create("b", 0.6, DecaySettings::default(), BTreeMap::new()).unwrap();
        let support = evidence(&store, EvidenceKind::Positive, 0.9);
        store.update("b", 0.6, Some(support)).unwrap();
        let ev = evidence(&store, EvidenceKind::Contradictory, 0.2);
        store.add_contradictory_evidence("b", ev).unwrap();
        let before = store.get("b").unwrap().current_confidence;

        // contradictory 0.5 < positive 1.2
        let resolved = store.resolve_conflicts("b").unwrap();
        assert!((resolved - before * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_without_contradiction_is_noop() {
        let mut store = frozen_store();
        store.create("b", 0.6, DecaySettings::default(), BTreeMap::new()).unwrap();
        let created = store.get("b").unwrap().last_updated;
        store.clock_mut().advance(Duration::minutes(5));

        assert_eq!(store.resolve_conflicts("b"), Some(0.6));
        assert_eq!(store.get("b").unwrap().last_updated, created);
        assert_eq!(store.resolve_conflicts("missing"), None);
    }

    #[test]
    fn test_configure_decay() {
        let mut store = frozen_store();
        store.create("b", 0.9, DecaySettings::default(), BTreeMap::new()).unwrap();

        assert!(store.configure_decay("b", hourly(DecayCurve::Linear, 0.05)).unwrap());
        store.clock_mut().advance(Duration::hours(2));
        assert!((store.get_current_confidence("b").unwrap() - 0.8).abs() < 1e-9);

        assert!(!store.configure_decay("missing", DecaySettings::default()).unwrap());
    }

    #[test]
    fn test_snapshot_applies_decay_without_mutation() {
        let mut store = frozen_store();
        store.create("a", 0.9, hourly(DecayCurve::Linear, 0.05), BTreeMap::new()).unwrap();
        store.create("b", 0.5, DecaySettings::default(), BTreeMap::new()).unwrap();
        store.clock_mut().advance(Duration::hours(2));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!((snapshot["a"].current_confidence - 0.8).abs() < 1e-9);
        assert_eq!(store.get("a").unwrap().current_confidence, 0.9);
    }

    #[test]
    fn test_unknown_lookups() {
        let store = frozen_store();
        assert_eq!(store.get_current_confidence("nothing"), None);
        assert!(store.get("nothing").is_none());
        assert!(!store.contains("nothing"));
    }
}
