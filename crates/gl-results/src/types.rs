//! Result data types.

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub type RunId = String;

/// Metadata stored next to every persisted run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub scenario_name: String,
    pub controller: String,
    pub timestamp: String,
    pub patients: usize,
    pub horizon_hours: f64,
    pub dt_min: f64,
    pub seed: u64,
    pub solver_version: String,
}

/// One tick of one patient, flattened for line-oriented storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub patient_id: String,
    pub t_min: f64,
    pub glucose_mg_dl: f64,
    pub basal_u_per_hr: f64,
    pub bolus_u: f64,
}

/// RFC 3339 UTC timestamp for manifests. Lexicographic order matches
/// chronological order, which `list_runs` relies on.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339()
}
