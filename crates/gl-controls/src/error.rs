//! Error types for controller construction and configuration.

use thiserror::Error;

/// Result type for controller operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur when building or configuring a controller.
///
/// All validation happens at construction time. A successfully built
/// controller never fails at tick time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid controller parameter.
    #[error("Invalid controller config: {what}")]
    InvalidConfig { what: &'static str },

    /// Patient profile unusable by this controller.
    #[error("Invalid profile for controller: {what}")]
    InvalidProfile { what: String },

    /// Malformed fuzzy membership or rule table.
    #[error("Invalid fuzzy table: {what}")]
    InvalidTable { what: String },
}
