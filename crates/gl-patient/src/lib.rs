//! Virtual patients for closed-loop glucose simulation.
//!
//! The crate supplies the plant side of the loop: a Bergman minimal-model
//! ODE of glucose-insulin kinetics, a first-order meal absorption schedule,
//! a noisy CGM sensor, and a [`VirtualPatient`] that wires them together
//! behind the `gl_sim::Plant` trait. The [`cohort`] module defines the
//! standard 30-patient population used by cohort runs.
//!
//! Determinism is a hard requirement: every stochastic element draws from a
//! seeded generator owned by the patient, so a (seed, schedule, controller)
//! triple always reproduces the same trace.

pub mod bergman;
pub mod cohort;
pub mod error;
pub mod meal;
pub mod patient;
pub mod sensor;

pub use bergman::{BergmanModel, BergmanParams, BergmanState};
pub use cohort::{build_patient, class_profiles, cohort_profiles, params_for, PATIENTS_PER_CLASS};
pub use error::{PatientError, PatientResult};
pub use meal::{MealSchedule, GLUCOSE_PER_GRAM};
pub use patient::VirtualPatient;
pub use sensor::{CgmSensor, DEFAULT_NOISE_SD};
