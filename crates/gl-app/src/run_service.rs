//! Run execution and caching service.

use crate::error::AppResult;
use crate::scenario::ScenarioDef;
use gl_controls::{BasalBolusConfig, ControllerConfig, FuzzyConfig, PidConfig};
use gl_core::PatientProfile;
use gl_metrics::{CohortReport, PatientFailure, PatientOutcome, RiskReport};
use gl_patient::{build_patient, CgmSensor, MealSchedule};
use gl_results::{compute_run_id, utc_timestamp, RunManifest, RunStore, TraceRow};
use gl_sim::{run_closed_loop, SimOptions, Trace};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Version folded into run ids; bumping it invalidates every cached run.
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request to execute or load a cohort run.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub scenario: &'a ScenarioDef,
    pub runs_root: PathBuf,
    pub use_cache: bool,
    pub keep_traces: bool,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub report: CohortReport,
    pub loaded_from_cache: bool,
    pub elapsed_s: f64,
}

type PatientRun = Result<(PatientOutcome, Vec<TraceRow>), PatientFailure>;

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    let started = Instant::now();
    let scenario = request.scenario;
    scenario.validate()?;

    let run_id = compute_run_id(scenario, SOLVER_VERSION);
    let store = RunStore::new(request.runs_root.clone())?;

    if request.use_cache && store.has_run(&run_id) {
        let report = store.load_report(&run_id)?;
        info!(
            run_id = run_id.as_str(),
            scenario = scenario.name.as_str(),
            "loaded cached run"
        );
        return Ok(RunResponse {
            run_id,
            report,
            loaded_from_cache: true,
            elapsed_s: started.elapsed().as_secs_f64(),
        });
    }

    let (report, rows) = run_scenario(scenario)?;

    let manifest = RunManifest {
        run_id: run_id.clone(),
        scenario_name: scenario.name.clone(),
        controller: scenario.controller.name().to_string(),
        timestamp: utc_timestamp(),
        patients: report.outcomes.len() + report.failures.len(),
        horizon_hours: scenario.horizon_hours,
        dt_min: scenario.dt_min,
        seed: scenario.seed,
        solver_version: SOLVER_VERSION.to_string(),
    };
    let stored_rows: &[TraceRow] = if request.keep_traces { &rows } else { &[] };
    store.save_run(&manifest, &report, stored_rows)?;
    info!(
        run_id = run_id.as_str(),
        patients = manifest.patients,
        failures = report.failures.len(),
        "run persisted"
    );

    Ok(RunResponse {
        run_id,
        report,
        loaded_from_cache: false,
        elapsed_s: started.elapsed().as_secs_f64(),
    })
}

/// Execute a scenario without touching the store.
///
/// Patients run in parallel but outcomes, failures, and trace rows are
/// collected in selection order, so the assembled report is deterministic
/// regardless of scheduling.
pub fn run_scenario(scenario: &ScenarioDef) -> AppResult<(CohortReport, Vec<TraceRow>)> {
    scenario.validate()?;
    let profiles = scenario.selected_profiles()?;
    let schedule = scenario.meal_schedule()?;
    let sensor = CgmSensor::new(scenario.sensor_noise_sd)?;
    let opts = scenario.sim_options();
    opts.validate()?;

    let results: Vec<PatientRun> = profiles
        .par_iter()
        .enumerate()
        .map(|(index, profile)| {
            let seed = scenario.seed.wrapping_add(index as u64);
            run_patient(scenario, profile, seed, &schedule, &sensor, &opts)
        })
        .collect();

    let mut outcomes = Vec::new();
    let mut failures = Vec::new();
    let mut rows = Vec::new();
    for run in results {
        match run {
            Ok((outcome, mut patient_rows)) => {
                outcomes.push(outcome);
                rows.append(&mut patient_rows);
            }
            Err(failure) => {
                warn!(
                    patient = failure.patient_id.as_str(),
                    error = failure.error.as_str(),
                    "patient run failed"
                );
                failures.push(failure);
            }
        }
    }

    let report = CohortReport::assemble(scenario.controller.name(), outcomes, failures);
    Ok((report, rows))
}

fn run_patient(
    scenario: &ScenarioDef,
    profile: &PatientProfile,
    seed: u64,
    schedule: &MealSchedule,
    sensor: &CgmSensor,
    opts: &SimOptions,
) -> PatientRun {
    let fail = |error: String| PatientFailure {
        patient_id: profile.id.clone(),
        error,
    };

    let mut patient = build_patient(profile, seed, schedule, sensor.clone(), opts.dt_min)
        .map_err(|e| fail(e.to_string()))?;
    let mut controller = scenario
        .controller
        .build(profile)
        .map_err(|e| fail(e.to_string()))?;

    let trace = run_closed_loop(
        &mut patient,
        controller.as_mut(),
        profile,
        &schedule.events,
        opts,
    )
    .map_err(|e| fail(e.to_string()))?;

    let report = RiskReport::from_trace(&trace).map_err(|e| fail(e.to_string()))?;
    info!(
        patient = profile.id.as_str(),
        seed,
        in_range_pct = report.ranges.in_range_pct,
        "patient run complete"
    );

    let rows = trace_rows(&profile.id, &trace);
    Ok((
        PatientOutcome {
            patient_id: profile.id.clone(),
            seed,
            report,
        },
        rows,
    ))
}

fn trace_rows(patient_id: &str, trace: &Trace) -> Vec<TraceRow> {
    trace
        .samples
        .iter()
        .zip(&trace.commands)
        .map(|(sample, command)| TraceRow {
            patient_id: patient_id.to_string(),
            t_min: sample.t_min,
            glucose_mg_dl: sample.value_mg_dl,
            basal_u_per_hr: command.basal_u_per_hr,
            bolus_u: command.bolus_u,
        })
        .collect()
}

/// Run the identical scenario once per controller family.
///
/// The scenario's own controller parameters are kept for its family; the
/// other two run with their documented defaults. Same seeds, same meals,
/// same patients, so the reports are directly comparable.
pub fn compare_controllers(
    scenario: &ScenarioDef,
    runs_root: &Path,
    use_cache: bool,
) -> AppResult<Vec<RunResponse>> {
    let families = [
        ControllerConfig::BasalBolus(BasalBolusConfig::default()),
        ControllerConfig::Pid(PidConfig::default()),
        ControllerConfig::HierarchicalFuzzy(FuzzyConfig::default()),
    ];
    families
        .into_iter()
        .map(|family| {
            let mut variant = scenario.clone();
            if variant.controller.name() != family.name() {
                variant.controller = family;
            }
            ensure_run(&RunRequest {
                scenario: &variant,
                runs_root: runs_root.to_path_buf(),
                use_cache,
                keep_traces: false,
            })
        })
        .collect()
}

/// All stored runs under a root, newest first.
pub fn list_runs(runs_root: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::new(runs_root.to_path_buf())?;
    Ok(store.list_runs()?)
}

/// Load a stored run's manifest and report.
pub fn load_run(runs_root: &Path, run_id: &str) -> AppResult<(RunManifest, CohortReport)> {
    let store = RunStore::new(runs_root.to_path_buf())?;
    let manifest = store.load_manifest(run_id)?;
    let report = store.load_report(run_id)?;
    Ok((manifest, report))
}

/// Load stored trace rows, optionally for one patient.
pub fn load_trace(
    runs_root: &Path,
    run_id: &str,
    patient_id: Option<&str>,
) -> AppResult<Vec<TraceRow>> {
    let store = RunStore::new(runs_root.to_path_buf())?;
    Ok(store.load_trace_rows(run_id, patient_id)?)
}
