use clap::{Parser, Subcommand};
use gl_app::{
    AppResult, RunRequest, compare_controllers, ensure_run, list_runs, load_run, load_scenario,
    load_trace,
};
use gl_metrics::{AggregateStats, CohortReport};
use gl_results::RunManifest;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gl-cli")]
#[command(about = "Glucoloop CLI - closed-loop insulin dosing simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
    /// Run a scenario across its cohort
    Run {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Directory holding stored runs
        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Persist per-tick traces alongside the report
        #[arg(long)]
        keep_traces: bool,
    },
    /// Run all three controller families on one scenario
    Compare {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Directory holding stored runs
        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,
    },
    /// List stored runs
    Runs {
        /// Directory holding stored runs
        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,
    },
    /// Show a stored run's report
    ShowRun {
        /// Run ID to display
        run_id: String,
        /// Directory holding stored runs
        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,
    },
    /// Export one patient's trace from a stored run as CSV
    ExportTrace {
        /// Run ID
        run_id: String,
        /// Patient ID (e.g. adult#001)
        #[arg(long)]
        patient: String,
        /// Directory holding stored runs
        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run {
            scenario_path,
            runs_dir,
            no_cache,
            keep_traces,
        } => cmd_run(&scenario_path, runs_dir, !no_cache, keep_traces),
        Commands::Compare {
            scenario_path,
            runs_dir,
        } => cmd_compare(&scenario_path, &runs_dir),
        Commands::Runs { runs_dir } => cmd_runs(&runs_dir),
        Commands::ShowRun { run_id, runs_dir } => cmd_show_run(&run_id, &runs_dir),
        Commands::ExportTrace {
            run_id,
            patient,
            runs_dir,
            output,
        } => cmd_export_trace(&run_id, &patient, &runs_dir, output.as_deref()),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = load_scenario(scenario_path)?;
    let profiles = scenario.selected_profiles()?;
    println!("✓ Scenario is valid");
    println!("  Name:       {}", scenario.name);
    println!("  Controller: {}", scenario.controller.name());
    println!("  Cohort:     {} patients", profiles.len());
    println!(
        "  Horizon:    {:.1} h at {:.0} min steps ({} ticks)",
        scenario.horizon_hours,
        scenario.dt_min,
        scenario.sim_options().expected_ticks()
    );
    println!("  Meals:      {}", scenario.meals.len());
    println!("  Seed:       {}", scenario.seed);
    Ok(())
}

fn cmd_run(
    scenario_path: &Path,
    runs_dir: PathBuf,
    use_cache: bool,
    keep_traces: bool,
) -> AppResult<()> {
    let scenario = load_scenario(scenario_path)?;
    println!(
        "Running scenario '{}' with controller '{}'",
        scenario.name,
        scenario.controller.name()
    );

    let request = RunRequest {
        scenario: &scenario,
        runs_root: runs_dir,
        use_cache,
        keep_traces,
    };
    let response = ensure_run(&request)?;

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!(
            "✓ Cohort run completed: {} ({:.2}s)",
            response.run_id, response.elapsed_s
        );
    }

    print_patient_table(&response.report);
    print_aggregate(&response.report.aggregate, scenario.horizon_hours);
    print_failures(&response.report);

    if response.report.outcomes.is_empty() && !response.report.failures.is_empty() {
        eprintln!("all {} patients failed", response.report.failures.len());
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_compare(scenario_path: &Path, runs_dir: &Path) -> AppResult<()> {
    let scenario = load_scenario(scenario_path)?;
    println!("Comparing controllers on scenario '{}'", scenario.name);

    let responses = compare_controllers(&scenario, runs_dir, true)?;

    println!();
    println!(
        "  {:<20} {:>6} {:>6} {:>6} {:>7} {:>7} {:>6} {:>9} {:>7}",
        "controller", "tir%", "hypo%", "hyper%", "lbgi", "hbgi", "risk", "mg/dL", "U/day"
    );
    for response in &responses {
        let agg = &response.report.aggregate;
        println!(
            "  {:<20} {:>6.1} {:>6.1} {:>6.1} {:>7.2} {:>7.2} {:>6.2} {:>9.1} {:>7.1}",
            response.report.controller,
            agg.mean_in_range_pct,
            agg.mean_below_range_pct,
            agg.mean_above_range_pct,
            agg.mean_lbgi,
            agg.mean_hbgi,
            agg.mean_risk_index,
            agg.mean_glucose_mg_dl,
            insulin_per_day(agg.mean_total_insulin_u, scenario.horizon_hours),
        );
    }

    println!();
    for response in &responses {
        let marker = if response.loaded_from_cache {
            " (cached)"
        } else {
            ""
        };
        println!(
            "  {:<20} run {}{}",
            response.report.controller, response.run_id, marker
        );
    }
    Ok(())
}

fn cmd_runs(runs_dir: &Path) -> AppResult<()> {
    let runs = list_runs(runs_dir)?;

    if runs.is_empty() {
        println!("No stored runs in {}", runs_dir.display());
    } else {
        println!("Stored runs in {}:", runs_dir.display());
        for manifest in runs {
            print_manifest_line(&manifest);
        }
    }
    Ok(())
}

fn cmd_show_run(run_id: &str, runs_dir: &Path) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, report) = load_run(runs_dir, run_id)?;

    println!("\nRun summary:");
    println!(
        "  Scenario:   {} (seed {})",
        manifest.scenario_name, manifest.seed
    );
    println!("  Controller: {}", manifest.controller);
    println!("  Saved:      {}", manifest.timestamp);
    println!(
        "  Horizon:    {:.1} h at {:.0} min steps",
        manifest.horizon_hours, manifest.dt_min
    );
    println!("  Solver:     {}", manifest.solver_version);

    print_patient_table(&report);
    print_aggregate(&report.aggregate, manifest.horizon_hours);
    print_failures(&report);
    Ok(())
}

fn cmd_export_trace(
    run_id: &str,
    patient: &str,
    runs_dir: &Path,
    output: Option<&Path>,
) -> AppResult<()> {
    let rows = load_trace(runs_dir, run_id, Some(patient))?;

    if rows.is_empty() {
        println!(
            "No trace rows for patient '{}' in run {} (was the run saved with --keep-traces?)",
            patient, run_id
        );
        return Ok(());
    }

    // Build CSV
    let mut csv = String::from("t_min,glucose_mg_dl,basal_u_per_hr,bolus_u\n");
    for row in &rows {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            row.t_min, row.glucose_mg_dl, row.basal_u_per_hr, row.bolus_u
        ));
    }

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {} rows to {}", rows.len(), path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn print_patient_table(report: &CohortReport) {
    if report.outcomes.is_empty() {
        return;
    }
    println!("\nPer-patient outcomes:");
    println!(
        "  {:<16} {:>6} {:>6} {:>6} {:>7} {:>7} {:>5}",
        "patient", "tir%", "hypo%", "hyper%", "lbgi", "hbgi", "cvga"
    );
    for outcome in &report.outcomes {
        let r = &outcome.report;
        println!(
            "  {:<16} {:>6.1} {:>6.1} {:>6.1} {:>7.2} {:>7.2} {:>5}",
            outcome.patient_id,
            r.ranges.in_range_pct,
            r.ranges.below_range_pct,
            r.ranges.above_range_pct,
            r.lbgi,
            r.hbgi,
            r.cvga.label(),
        );
    }
}

fn print_aggregate(agg: &AggregateStats, horizon_hours: f64) {
    println!("\nCohort aggregate ({} patients):", agg.patients);
    println!("  Mean TIR:        {:>6.1} %", agg.mean_in_range_pct);
    println!("  Mean hypo:       {:>6.1} %", agg.mean_below_range_pct);
    println!("  Mean hyper:      {:>6.1} %", agg.mean_above_range_pct);
    println!("  Mean LBGI:       {:>6.2}", agg.mean_lbgi);
    println!("  Mean HBGI:       {:>6.2}", agg.mean_hbgi);
    println!("  Mean risk index: {:>6.2}", agg.mean_risk_index);
    println!("  Mean glucose:    {:>6.1} mg/dL", agg.mean_glucose_mg_dl);
    println!(
        "  Mean insulin:    {:>6.1} U ({:.1} U/day)",
        agg.mean_total_insulin_u,
        insulin_per_day(agg.mean_total_insulin_u, horizon_hours)
    );
    println!(
        "  CVGA zones:      A={} B={} C={} D={} E={}",
        agg.cvga.a, agg.cvga.b, agg.cvga.c, agg.cvga.d, agg.cvga.e
    );
}

fn print_failures(report: &CohortReport) {
    if report.failures.is_empty() {
        return;
    }
    println!("\nFailed patients ({}):", report.failures.len());
    for failure in &report.failures {
        println!("  {} - {}", failure.patient_id, failure.error);
    }
}

fn print_manifest_line(manifest: &RunManifest) {
    println!(
        "  {}  {} / {}  {}  {} patients",
        manifest.run_id,
        manifest.scenario_name,
        manifest.controller,
        manifest.timestamp,
        manifest.patients
    );
}

fn insulin_per_day(total_u: f64, horizon_hours: f64) -> f64 {
    total_u * 24.0 / horizon_hours.max(1.0e-12)
}
