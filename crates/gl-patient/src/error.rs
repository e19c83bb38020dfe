//! Error types for virtual patient construction.

use thiserror::Error;

/// Result type for patient construction and cohort lookups.
pub type PatientResult<T> = Result<T, PatientError>;

/// Errors raised while building a virtual patient.
///
/// These cover construction-time validation only; runtime faults surface
/// through `gl_sim::PlantFault`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatientError {
    /// Physiological parameter out of range.
    #[error("Invalid model parameter: {what}")]
    InvalidParams { what: &'static str },

    /// Malformed meal schedule.
    #[error("Invalid meal schedule: {what}")]
    InvalidSchedule { what: &'static str },

    /// Sensor noise parameter out of range.
    #[error("Invalid sensor config: {what}")]
    InvalidSensor { what: &'static str },

    /// Profile id does not name a cohort member.
    #[error("Unknown patient id: {id}")]
    UnknownPatient { id: String },
}
