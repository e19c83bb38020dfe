//! Error types for plants and the closed-loop harness.

use thiserror::Error;

/// Faults surfaced by a virtual patient while stepping.
///
/// A fault is fatal to the affected patient run only; the harness aborts
/// that run and other cohort members continue.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlantFault {
    /// Model state left the physically meaningful region.
    #[error("Non-physical plant state: {what}")]
    NonPhysical { what: String },

    /// Device or model fault detected during stepping.
    #[error("Plant fault: {what}")]
    Fault { what: String },
}

/// Result type for plant stepping.
pub type PlantResult<T> = Result<T, PlantFault>;

/// Errors encountered by the closed-loop harness.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Plant(#[from] PlantFault),

    #[error("Non-finite {what} at t = {t_min} min")]
    NonFinite { what: &'static str, t_min: f64 },
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
