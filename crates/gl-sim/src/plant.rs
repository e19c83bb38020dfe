//! Plant contract between the harness and virtual patients.

use crate::error::PlantResult;
use gl_core::{GlucoseSample, InsulinCommand, PatientProfile};

/// A virtual patient (or hardware stand-in) the harness steps.
///
/// `step` applies one command across a sampling period and returns the
/// sample observed at the end of that period. Implementations own their
/// state, randomness, and clock; the harness never reaches past this
/// boundary.
pub trait Plant {
    /// Apply `command` over one sampling period and observe the result.
    fn step(&mut self, command: &InsulinCommand) -> PlantResult<GlucoseSample>;

    /// Reseed the randomness and restore the initial state.
    fn reset(&mut self, seed: u64, profile: &PatientProfile) -> PlantResult<()>;
}
