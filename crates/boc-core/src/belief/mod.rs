//! Belief store
//!
//! Named confidence records that decay over time, absorb weighted evidence
//! and lose confidence when contradicted.

pub mod decay;
pub mod evidence;
pub mod state;
pub mod store;

pub use decay::{
    CustomDecay, DecayCurve, DecaySettings, DecayStrategy, DEFAULT_DECAY_PERIOD,
    DEFAULT_DECAY_RATE,
};
pub use state::{BeliefState, Evidence, EvidenceKind};
pub use store::BeliefStore;
