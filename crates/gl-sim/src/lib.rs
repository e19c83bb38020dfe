//! Closed-loop simulation framework for glucoloop.
//!
//! Provides:
//! - The [`Plant`] boundary between the harness and virtual patients
//! - Fixed-step ODE scaffolding ([`OdeModel`], RK4 and forward Euler)
//! - The fixed-period closed-loop runner with meal announcement
//! - Append-only run traces with coverage accounting

pub mod error;
pub mod integrator;
pub mod model;
pub mod plant;
pub mod sim;
pub mod trace;

pub use error::{PlantFault, PlantResult, SimError, SimResult};
pub use integrator::Integrator;
pub use model::OdeModel;
pub use plant::Plant;
pub use sim::{SimOptions, run_closed_loop};
pub use trace::Trace;
