//! Evidence weighting and confidence blending.

use super::state::{Evidence, EvidenceKind};
use chrono::{DateTime, Duration, Utc};

/// Recency bands, newest first: (upper bound on age, factor).
const RECENCY_BANDS: &[(i64, f64)] = &[(1, 1.0), (24, 0.8), (24 * 7, 0.6)];
const STALE_RECENCY: f64 = 0.4;

/// Fraction of a contradictory observation's confidence removed from a belief.
pub const CONFLICT_PENALTY_FACTOR: f64 = 0.3;

pub fn recency_factor(age: Duration) -> f64 {
    let hours = age.num_milliseconds() as f64 / 3_600_000.0;
    RECENCY_BANDS
        .iter()
        .find(|(bound, _)| hours < *bound as f64)
        .map(|(_, factor)| *factor)
        .unwrap_or(STALE_RECENCY)
}

pub fn polarity_factor(kind: EvidenceKind) -> f64 {
    match kind {
        EvidenceKind::Positive => 1.2,
        EvidenceKind::Negative => 1.1,
        EvidenceKind::Neutral => 0.8,
        EvidenceKind::Contradictory => 0.5,
    }
}

/// `weight × recency(age) × polarity(kind)`, with age measured at `now`.
pub fn evidence_weight(evidence: &Evidence, now: DateTime<Utc>) -> f64 {
    evidence.weight * recency_factor(now - evidence.timestamp) * polarity_factor(evidence.kind)
}

/// Blend the decayed confidence with a new reading.
///
/// Weights above 1.0 pull toward the new reading by `w / (w + 1)`; anything
/// weaker is an even split.
pub fn combine(current: f64, new: f64, weight: f64) -> f64 {
    let blend = if weight > 1.0 {
        weight / (weight + 1.0)
    } else {
        0.5
    };
    (1.0 - blend) * current + blend * new
}
