use super::decay::DecaySettings;
use crate::error::{BocError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a piece of evidence bears on the belief it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Positive,
    Negative,
    Neutral,
    Contradictory,
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvidenceKind::Positive => "positive",
            EvidenceKind::Negative => "negative",
            EvidenceKind::Neutral => "neutral",
            EvidenceKind::Contradictory => "contradictory",
        };
        f.write_str(name)
    }
}

/// A single observation supporting or undermining a belief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub content: String,
    pub confidence: f64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EvidenceKind,
    pub weight: f64,
}

impl Evidence {
    /// Evidence stamped now with weight 1.0. Fails if `confidence` is outside [0, 1].
    pub fn new(
        content: impl Into<String>,
        confidence: f64,
        source: impl Into<String>,
        kind: EvidenceKind,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(BocError::value(format!(
                "Evidence confidence must be between 0.0 and 1.0, got {}",
                confidence
            )));
        }

        Ok(Self {
            content: content.into(),
            confidence,
            source: source.into(),
            timestamp: Utc::now(),
            kind,
            weight: 1.0,
        })
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A named belief and everything needed to project its confidence forward in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefState {
    pub name: String,
    pub initial_confidence: f64,
    pub current_confidence: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub decay: DecaySettings,
    /// Append-only, oldest first.
    pub evidence_history: Vec<Evidence>,
    pub metadata: BTreeMap<String, String>,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub active: bool,
}

impl BeliefState {
    pub(crate) fn new(
        name: String,
        confidence: f64,
        decay: DecaySettings,
        metadata: BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            initial_confidence: confidence,
            current_confidence: confidence,
            created_at: now,
            last_updated: now,
            decay,
            evidence_history: Vec::new(),
            metadata,
            min_confidence: 0.0,
            max_confidence: 1.0,
            active: true,
        }
    }

    /// Elapsed decay periods since the last update. Clock skew counts as zero.
    pub fn age_in_periods(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = (now - self.last_updated)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        elapsed / self.decay.period.as_secs_f64()
    }

    pub(crate) fn clamp(&self, confidence: f64) -> f64 {
        if confidence.is_nan() {
            return self.min_confidence;
        }
        confidence.clamp(self.min_confidence, self.max_confidence)
    }

    pub fn evidence_of_kind(&self, kind: EvidenceKind) -> impl Iterator<Item = &Evidence> {
        self.evidence_history.iter().filter(move |e| e.kind == kind)
    }
}
