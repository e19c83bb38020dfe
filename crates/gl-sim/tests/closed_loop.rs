//! Closed-loop harness tests against a scripted plant.
//!
//! The plant here is deliberately dumb: it walks a fixed glucose ramp and
//! records every command it receives, which makes the harness's sequencing
//! (zero first command, meal announcement, abort behavior) easy to assert.

use gl_controls::{BasalBolusConfig, ControllerConfig, PidConfig};
use gl_core::{
    GlucoseSample, InsulinCommand, MealEvent, PatientClass, PatientProfile, SampleSource,
};
use gl_sim::{Plant, PlantFault, PlantResult, SimError, SimOptions, run_closed_loop};

struct RampPlant {
    dt_min: f64,
    t_min: f64,
    value: f64,
    slope_per_min: f64,
    floor: Option<f64>,
    commands: Vec<InsulinCommand>,
    fail_at_tick: Option<usize>,
    nan_at_tick: Option<usize>,
}

impl RampPlant {
    fn flat(dt_min: f64, value: f64) -> Self {
        Self {
            dt_min,
            t_min: 0.0,
            value,
            slope_per_min: 0.0,
            floor: None,
            commands: Vec::new(),
            fail_at_tick: None,
            nan_at_tick: None,
        }
    }
}

impl Plant for RampPlant {
    fn step(&mut self, command: &InsulinCommand) -> PlantResult<GlucoseSample> {
        let tick = self.commands.len();
        if Some(tick) == self.fail_at_tick {
            return Err(PlantFault::Fault {
                what: "scripted fault".into(),
            });
        }
        self.commands.push(*command);
        self.t_min += self.dt_min;
        self.value += self.slope_per_min * self.dt_min;
        if let Some(floor) = self.floor {
            self.value = self.value.max(floor);
        }
        if Some(tick) == self.nan_at_tick {
            // Bypass the sanitizing constructor; a raw NaN models a dead sensor.
            return Ok(GlucoseSample {
                t_min: self.t_min,
                value_mg_dl: f64::NAN,
                source: SampleSource::Sensor,
            });
        }
        Ok(GlucoseSample::sensor(self.t_min, self.value))
    }

    fn reset(&mut self, _seed: u64, _profile: &PatientProfile) -> PlantResult<()> {
        self.t_min = 0.0;
        self.commands.clear();
        Ok(())
    }
}

fn profile() -> PatientProfile {
    PatientProfile {
        id: "adult#001".into(),
        class: PatientClass::Adult,
        basal_u_per_hr: 1.0,
        carb_ratio_g_per_u: 10.0,
        correction_mg_dl_per_u: 40.0,
        target_mg_dl: 110.0,
    }
}

fn short_opts() -> SimOptions {
    SimOptions {
        dt_min: 5.0,
        horizon_hours: 2.0,
        max_ticks: 1000,
    }
}

#[test]
fn first_period_delivers_no_insulin() {
    let profile = profile();
    let mut plant = RampPlant::flat(5.0, 110.0);
    let mut controller = ControllerConfig::BasalBolus(BasalBolusConfig::default())
        .build(&profile)
        .unwrap();
    run_closed_loop(&mut plant, controller.as_mut(), &profile, &[], &short_opts()).unwrap();

    assert_eq!(plant.commands[0], InsulinCommand::zero(0.0));
    // Every later period carries the profile basal.
    assert!(
        plant.commands[1..]
            .iter()
            .all(|cmd| cmd.basal_u_per_hr == 1.0)
    );
}

#[test]
fn trace_covers_the_whole_schedule() {
    let profile = profile();
    let mut plant = RampPlant::flat(5.0, 110.0);
    let mut controller = ControllerConfig::BasalBolus(BasalBolusConfig::default())
        .build(&profile)
        .unwrap();
    let trace =
        run_closed_loop(&mut plant, controller.as_mut(), &profile, &[], &short_opts()).unwrap();

    assert_eq!(trace.len(), 24);
    assert_eq!(trace.expected_ticks, 24);
    assert!((trace.coverage() - 1.0).abs() < 1e-12);
    assert_eq!(trace.samples[0].t_min, 5.0);
    assert_eq!(trace.samples[23].t_min, 120.0);
}

#[test]
fn meals_are_announced_exactly_once() {
    let profile = profile();
    let mut plant = RampPlant::flat(5.0, 110.0);
    let mut controller = ControllerConfig::BasalBolus(BasalBolusConfig::default())
        .build(&profile)
        .unwrap();
    let meals = [MealEvent::new(30.0, 60.0)];
    run_closed_loop(
        &mut plant,
        controller.as_mut(),
        &profile,
        &meals,
        &short_opts(),
    )
    .unwrap();

    // 60 g at a 10 g/U ratio, glucose at target: a single 6 U bolus.
    let boluses: Vec<&InsulinCommand> = plant
        .commands
        .iter()
        .filter(|cmd| cmd.bolus_u > 0.0)
        .collect();
    assert_eq!(boluses.len(), 1);
    assert!((boluses[0].bolus_u - 6.0).abs() < 1e-12);
    assert_eq!(boluses[0].t_min, 30.0);
}

#[test]
fn meal_between_ticks_attaches_to_next_tick() {
    let profile = profile();
    let mut plant = RampPlant::flat(5.0, 110.0);
    let mut controller = ControllerConfig::BasalBolus(BasalBolusConfig::default())
        .build(&profile)
        .unwrap();
    let meals = [MealEvent::new(32.5, 60.0)];
    run_closed_loop(
        &mut plant,
        controller.as_mut(),
        &profile,
        &meals,
        &short_opts(),
    )
    .unwrap();

    let bolus = plant
        .commands
        .iter()
        .find(|cmd| cmd.bolus_u > 0.0)
        .unwrap();
    assert_eq!(bolus.t_min, 35.0);
}

#[test]
fn plant_fault_aborts_the_run() {
    let profile = profile();
    let mut plant = RampPlant::flat(5.0, 110.0);
    plant.fail_at_tick = Some(3);
    let mut controller = ControllerConfig::BasalBolus(BasalBolusConfig::default())
        .build(&profile)
        .unwrap();
    let result = run_closed_loop(&mut plant, controller.as_mut(), &profile, &[], &short_opts());
    assert!(matches!(result, Err(SimError::Plant(_))));
}

#[test]
fn non_finite_sample_aborts_the_run() {
    let profile = profile();
    let mut plant = RampPlant::flat(5.0, 110.0);
    plant.nan_at_tick = Some(4);
    let mut controller = ControllerConfig::BasalBolus(BasalBolusConfig::default())
        .build(&profile)
        .unwrap();
    let result = run_closed_loop(&mut plant, controller.as_mut(), &profile, &[], &short_opts());
    assert!(matches!(result, Err(SimError::NonFinite { .. })));
}

#[test]
fn identical_runs_produce_identical_traces() {
    let profile = profile();
    let config = ControllerConfig::Pid(PidConfig::default());
    let mut traces = Vec::new();
    for _ in 0..2 {
        let mut plant = RampPlant::flat(5.0, 150.0);
        plant.slope_per_min = 0.5;
        let mut controller = config.build(&profile).unwrap();
        traces.push(
            run_closed_loop(&mut plant, controller.as_mut(), &profile, &[], &short_opts()).unwrap(),
        );
    }
    assert_eq!(traces[0], traces[1]);
}

#[test]
fn pid_settles_without_oscillation_after_falling_ramp() {
    let profile = profile();
    // 150 down to 50 mg/dL over two hours, flat afterwards.
    let mut plant = RampPlant::flat(5.0, 150.0);
    plant.slope_per_min = -100.0 / 120.0;
    plant.floor = Some(50.0);
    let config = PidConfig {
        ki: 0.0,
        kd: 1.0,
        derivative_filter_alpha: 0.5,
        ..PidConfig::default()
    };
    let max_basal = config.limits.max_basal_u_per_hr;
    let mut controller = ControllerConfig::Pid(config).build(&profile).unwrap();
    let opts = SimOptions {
        dt_min: 5.0,
        horizon_hours: 4.0,
        max_ticks: 1000,
    };
    let trace = run_closed_loop(&mut plant, controller.as_mut(), &profile, &[], &opts).unwrap();

    assert!(
        trace
            .commands
            .iter()
            .all(|cmd| cmd.basal_u_per_hr >= 0.0 && cmd.basal_u_per_hr <= max_basal)
    );
    // Once the input is flat the filtered derivative drains monotonically, so
    // the tail of the command sequence must not swing back and forth.
    let tail: Vec<f64> = trace
        .commands
        .iter()
        .filter(|cmd| cmd.t_min >= 150.0)
        .map(|cmd| cmd.basal_u_per_hr)
        .collect();
    assert!(tail.len() >= 12);
    let rising = tail.windows(2).all(|w| w[1] >= w[0] - 1e-12);
    let falling = tail.windows(2).all(|w| w[1] <= w[0] + 1e-12);
    assert!(rising || falling);
}

#[test]
fn controller_reacts_to_rising_ramp() {
    let profile = profile();
    let mut plant = RampPlant::flat(5.0, 120.0);
    plant.slope_per_min = 1.0;
    let mut controller = ControllerConfig::Pid(PidConfig::default()).build(&profile).unwrap();
    let trace =
        run_closed_loop(&mut plant, controller.as_mut(), &profile, &[], &short_opts()).unwrap();

    // Glucose climbs the whole run, so late commands dose harder than early ones.
    let early = trace.commands[1].basal_u_per_hr;
    let late = trace.commands[trace.len() - 1].basal_u_per_hr;
    assert!(late > early);
}
