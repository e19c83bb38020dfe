//! gl-core: stable foundation for glucoloop.
//!
//! Contains:
//! - sample (glucose samples + insulin commands)
//! - profile (patient therapy parameters, meal events)
//! - numeric (tolerances + float helpers)
//! - error (shared error types)
//!
//! Units used throughout the workspace: glucose in mg/dL, time in minutes
//! since run start, basal insulin in U/hr, boluses in U.

pub mod error;
pub mod numeric;
pub mod profile;
pub mod sample;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use profile::*;
pub use sample::*;
