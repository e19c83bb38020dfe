//! Run storage API.
//!
//! Layout under the store root: `<run_id>/manifest.json`,
//! `<run_id>/report.json`, `<run_id>/trace.jsonl` (one row per patient per
//! tick). The manifest's presence marks a run as complete.

use crate::types::{RunManifest, TraceRow};
use crate::{ResultsError, ResultsResult};
use gl_metrics::CohortReport;
use std::fs;
use std::path::PathBuf;

#[derive(Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        report: &CohortReport,
        rows: &[TraceRow],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let report_path = run_dir.join("report.json");
        let report_json = serde_json::to_string_pretty(report)?;
        fs::write(report_path, report_json)?;

        let trace_path = run_dir.join("trace.jsonl");
        let mut trace_content = String::new();
        for row in rows {
            let line = serde_json::to_string(row)?;
            trace_content.push_str(&line);
            trace_content.push('\n');
        }
        fs::write(trace_path, trace_content)?;

        // Manifest last; its presence marks the run complete.
        let manifest_path = run_dir.join("manifest.json");
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(manifest_path, manifest_json)?;

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_report(&self, run_id: &str) -> ResultsResult<CohortReport> {
        let report_path = self.run_dir(run_id).join("report.json");

        if !report_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(report_path)?;
        let report = serde_json::from_str(&content)?;
        Ok(report)
    }

    /// Load trace rows for a run, optionally restricted to one patient.
    pub fn load_trace_rows(
        &self,
        run_id: &str,
        patient_id: Option<&str>,
    ) -> ResultsResult<Vec<TraceRow>> {
        let trace_path = self.run_dir(run_id).join("trace.jsonl");

        if !trace_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(trace_path)?;
        let mut rows = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let row: TraceRow = serde_json::from_str(line)?;
            if patient_id.is_none_or(|id| row.patient_id == id) {
                rows.push(row);
            }
        }

        Ok(rows)
    }

    /// All stored runs, newest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
