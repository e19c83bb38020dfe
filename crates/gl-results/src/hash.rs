//! Content-based hashing for run IDs.
//!
//! A run id is a digest of the scenario definition plus the solver version,
//! never of the outputs: the same request always maps to the same id, and
//! any change to the scenario or a solver upgrade invalidates the cache.

use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn compute_run_id<T: Serialize>(scenario: &T, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let scenario_json = serde_json::to_string(scenario).unwrap_or_default();
    hasher.update(scenario_json.as_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Scenario {
        name: String,
        seed: u64,
        horizon_hours: f64,
    }

    #[test]
    fn hash_stability() {
        let scenario = Scenario {
            name: "day".to_string(),
            seed: 42,
            horizon_hours: 24.0,
        };

        let hash1 = compute_run_id(&scenario, "0.1.0");
        let hash2 = compute_run_id(&scenario, "0.1.0");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let base = Scenario {
            name: "day".to_string(),
            seed: 42,
            horizon_hours: 24.0,
        };
        let reseeded = Scenario {
            name: "day".to_string(),
            seed: 43,
            horizon_hours: 24.0,
        };

        assert_ne!(
            compute_run_id(&base, "0.1.0"),
            compute_run_id(&reseeded, "0.1.0")
        );
        assert_ne!(
            compute_run_id(&base, "0.1.0"),
            compute_run_id(&base, "0.2.0")
        );
    }
}
