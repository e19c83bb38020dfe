//! Shared application service layer for glucoloop.
//!
//! This crate sits between the CLI and the backend crates: it owns the
//! scenario schema, resolves cohort selections, executes cohort runs in
//! parallel, and caches results by content-addressed run id.

pub mod error;
pub mod run_service;
pub mod scenario;

pub use error::{AppError, AppResult};
pub use run_service::{
    compare_controllers, ensure_run, list_runs, load_run, load_trace, run_scenario, RunRequest,
    RunResponse, SOLVER_VERSION,
};
pub use scenario::{
    example_scenario, load_scenario, CohortSelect, MealDef, ScenarioDef, SCENARIO_VERSION,
};
