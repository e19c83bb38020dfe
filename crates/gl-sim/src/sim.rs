//! Closed-loop simulation runner.

use crate::error::{SimError, SimResult};
use crate::plant::Plant;
use crate::trace::Trace;
use gl_controls::{ControlTick, Controller};
use gl_core::{InsulinCommand, MealEvent, PatientProfile};
use tracing::{debug, warn};

/// Options for closed-loop runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Sampling period (minutes).
    pub dt_min: f64,
    /// Run length (hours).
    pub horizon_hours: f64,
    /// Maximum number of ticks (safety limit).
    pub max_ticks: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt_min: 5.0,
            horizon_hours: 24.0,
            max_ticks: 100_000,
        }
    }
}

impl SimOptions {
    /// Number of sampling periods the schedule calls for.
    pub fn expected_ticks(&self) -> usize {
        (self.horizon_hours * 60.0 / self.dt_min).ceil() as usize
    }

    /// Validate at run entry.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt_min.is_finite() && self.dt_min > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt_min must be finite and positive",
            });
        }
        if !(self.horizon_hours.is_finite() && self.horizon_hours > 0.0) {
            return Err(SimError::InvalidArg {
                what: "horizon_hours must be finite and positive",
            });
        }
        if self.max_ticks == 0 {
            return Err(SimError::InvalidArg {
                what: "max_ticks must be positive",
            });
        }
        if self.expected_ticks() > self.max_ticks {
            return Err(SimError::InvalidArg {
                what: "tick count exceeds max_ticks",
            });
        }
        Ok(())
    }
}

/// Drive one patient through the fixed-period control loop.
///
/// The first period runs with a zero command, so no insulin is delivered
/// before the first sample. Announced meals attach to the first controller
/// tick at or after their start time, exactly once. Given a seeded plant and
/// a fixed controller configuration, two runs produce identical traces.
pub fn run_closed_loop<P, C>(
    plant: &mut P,
    controller: &mut C,
    profile: &PatientProfile,
    announced_meals: &[MealEvent],
    opts: &SimOptions,
) -> SimResult<Trace>
where
    P: Plant + ?Sized,
    C: Controller + ?Sized,
{
    opts.validate()?;
    let expected = opts.expected_ticks();
    debug!(
        patient = profile.id.as_str(),
        controller = controller.name(),
        ticks = expected,
        "closed-loop run start"
    );

    let mut meals: Vec<MealEvent> = announced_meals.to_vec();
    meals.sort_by(|a, b| a.t_min.total_cmp(&b.t_min));
    let mut next_meal = 0;

    let mut trace = Trace::new(opts.dt_min, expected);
    let mut command = InsulinCommand::zero(0.0);

    for tick in 0..expected {
        let sample = match plant.step(&command) {
            Ok(sample) => sample,
            Err(fault) => {
                warn!(
                    patient = profile.id.as_str(),
                    t_min = tick as f64 * opts.dt_min,
                    %fault,
                    "plant fault, aborting run"
                );
                return Err(fault.into());
            }
        };
        if !sample.value_mg_dl.is_finite() {
            warn!(
                patient = profile.id.as_str(),
                t_min = sample.t_min,
                "non-finite sample, aborting run"
            );
            return Err(SimError::NonFinite {
                what: "glucose sample",
                t_min: sample.t_min,
            });
        }
        trace.push(sample, command)?;

        if tick + 1 == expected {
            break;
        }

        let mut carbs: Option<f64> = None;
        while next_meal < meals.len() && meals[next_meal].t_min <= sample.t_min {
            *carbs.get_or_insert(0.0) += meals[next_meal].carbs_g;
            next_meal += 1;
        }

        let control_tick = ControlTick {
            t_min: sample.t_min,
            dt_min: opts.dt_min,
            sample,
            announced_carbs_g: carbs,
        };
        command = controller.command(&control_tick, profile);
    }

    debug!(
        patient = profile.id.as_str(),
        ticks = trace.len(),
        total_insulin_u = trace.total_insulin_u(),
        "closed-loop run finished"
    );
    Ok(trace)
}
