//! Controller strategies for glucoloop.
//!
//! This crate provides the dosing strategies the closed-loop harness can
//! drive, behind a single [`Controller`] trait:
//! - **Basal-Bolus**: open-loop profile basal plus announced-meal boluses
//! - **PID**: feedback on glucose error with anti-windup and a filtered
//!   derivative
//! - **Hierarchical Fuzzy**: a rate-of-change supervisor gating a Mamdani
//!   dose engine
//!
//! # Design Principles
//!
//! - **Construction-Time Validation**: a built controller never fails at
//!   tick time; every parameter check happens in `new`
//! - **Determinism**: same parameters + same tick sequence → same commands
//! - **Device Safety**: every emitted command is clamped to [`DeviceLimits`]
//! - **Interchangeability**: the harness sees only the trait, so strategies
//!   compare under identical scenarios

pub mod basal_bolus;
pub mod controller;
pub mod error;
pub mod fuzzy;
pub mod membership;
pub mod pid;

pub use basal_bolus::{BasalBolusConfig, BasalBolusController};
pub use controller::{ControlTick, Controller, ControllerConfig, DeviceLimits};
pub use error::{ControlError, ControlResult};
pub use fuzzy::{
    DoseTerm, FuzzyConfig, FuzzyRule, GlucoseTerm, HierarchicalFuzzyController, RateTerm,
    SupervisorEntry,
};
pub use membership::{MembershipFn, TermEntry};
pub use pid::{PidConfig, PidController, PidState};
