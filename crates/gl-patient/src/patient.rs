//! Virtual patient: Bergman dynamics behind the `Plant` boundary.

use crate::bergman::{BergmanModel, BergmanParams, BergmanState};
use crate::error::{PatientError, PatientResult};
use crate::meal::MealSchedule;
use crate::sensor::CgmSensor;
use gl_core::{GlucoseSample, InsulinCommand, PatientProfile};
use gl_sim::{Integrator, Plant, PlantFault, PlantResult};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Integration substep ceiling (minutes).
const SUBSTEP_MIN: f64 = 1.0;

/// One simulated patient: minimal-model dynamics, meal absorption, and a
/// noisy CGM, advanced one sampling period per `step`.
///
/// Commands are spread uniformly across the period: the basal rate plus the
/// bolus amortized over `dt_min` give a constant U/min delivery for the
/// whole period.
pub struct VirtualPatient {
    params: BergmanParams,
    schedule: MealSchedule,
    sensor: CgmSensor,
    dt_min: f64,
    rng: StdRng,
    state: BergmanState,
    t_min: f64,
}

impl VirtualPatient {
    /// Build a patient at its fasting equilibrium.
    pub fn new(
        params: BergmanParams,
        schedule: MealSchedule,
        sensor: CgmSensor,
        dt_min: f64,
        seed: u64,
    ) -> PatientResult<Self> {
        params.validate()?;
        schedule.validate()?;
        if !(dt_min.is_finite() && dt_min > 0.0) {
            return Err(PatientError::InvalidParams {
                what: "dt_min must be finite and positive",
            });
        }
        Ok(Self {
            state: params.equilibrium(),
            params,
            schedule,
            sensor,
            dt_min,
            rng: StdRng::seed_from_u64(seed),
            t_min: 0.0,
        })
    }

    /// Current model state, for diagnostics.
    pub fn state(&self) -> &BergmanState {
        &self.state
    }

    /// Current clock (minutes since run start).
    pub fn t_min(&self) -> f64 {
        self.t_min
    }
}

impl Plant for VirtualPatient {
    fn step(&mut self, command: &InsulinCommand) -> PlantResult<GlucoseSample> {
        let u_per_min = command.total_units(self.dt_min) / self.dt_min;
        let model = BergmanModel {
            params: &self.params,
            meals: &self.schedule,
            u_per_min,
        };

        // Fixed substeps no longer than a minute each.
        let substeps = (self.dt_min / SUBSTEP_MIN).ceil().max(1.0) as usize;
        let h = self.dt_min / substeps as f64;
        let integrator = Integrator::Rk4;
        let mut state = self.state;
        for k in 0..substeps {
            let t = self.t_min + k as f64 * h;
            state = integrator
                .step_state(&model, t, &state, h)
                .map_err(|e| PlantFault::Fault {
                    what: e.to_string(),
                })?;
        }

        if !state.is_finite() {
            return Err(PlantFault::NonPhysical {
                what: format!(
                    "state diverged after t = {} min (g = {}, x = {}, i = {})",
                    self.t_min, state.g, state.x, state.i
                ),
            });
        }

        self.state = state;
        self.t_min += self.dt_min;
        Ok(self.sensor.observe(self.t_min, self.state.g, &mut self.rng))
    }

    fn reset(&mut self, seed: u64, _profile: &PatientProfile) -> PlantResult<()> {
        self.rng = StdRng::seed_from_u64(seed);
        self.state = self.params.equilibrium();
        self.t_min = 0.0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_core::{MealEvent, PatientClass};

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

    fn noiseless(schedule: MealSchedule) -> VirtualPatient {
        VirtualPatient::new(
            BergmanParams::default(),
            schedule,
            CgmSensor::new(0.0).unwrap(),
            5.0,
            1,
        )
        .unwrap()
    }

    #[test]
    fn stays_at_equilibrium_without_input() {
        let mut patient = noiseless(MealSchedule::empty());
        for k in 0..48 {
            let sample = patient
                .step(&InsulinCommand::zero(k as f64 * 5.0))
                .unwrap();
            assert!((sample.value_mg_dl - 90.0).abs() < 1e-6);
        }
    }

    #[test]
    fn meal_raises_glucose() {
        let mut patient = noiseless(MealSchedule::new(vec![MealEvent::new(10.0, 60.0)]));
        let mut peak: f64 = 0.0;
        for k in 0..24 {
            let sample = patient
                .step(&InsulinCommand::zero(k as f64 * 5.0))
                .unwrap();
            peak = peak.max(sample.value_mg_dl);
        }
        assert!(peak > 130.0);
    }

    #[test]
    fn insulin_lowers_glucose() {
        let mut patient = noiseless(MealSchedule::empty());
        let mut last = 90.0;
        for k in 0..36 {
            let cmd = InsulinCommand::new(k as f64 * 5.0, 2.0, 0.0);
            last = patient.step(&cmd).unwrap().value_mg_dl;
        }
        assert!(last < 85.0);
    }

    #[test]
    fn same_seed_reproduces_noisy_samples() {
        let make = || {
            VirtualPatient::new(
                BergmanParams::default(),
                MealSchedule::default_daily(),
                CgmSensor::new(2.0).unwrap(),
                5.0,
                99,
            )
            .unwrap()
        };
        let mut a = make();
        let mut b = make();
        for k in 0..50 {
            let cmd = InsulinCommand::new(k as f64 * 5.0, 1.0, 0.0);
            assert_eq!(
                a.step(&cmd).unwrap().value_mg_dl,
                b.step(&cmd).unwrap().value_mg_dl
            );
        }
    }

    #[test]
    fn different_seeds_differ() {
        let make = |seed| {
            VirtualPatient::new(
                BergmanParams::default(),
                MealSchedule::empty(),
                CgmSensor::new(2.0).unwrap(),
                5.0,
                seed,
            )
            .unwrap()
        };
        let mut a = make(1);
        let mut b = make(2);
        let sa = a.step(&InsulinCommand::zero(0.0)).unwrap();
        let sb = b.step(&InsulinCommand::zero(0.0)).unwrap();
        assert_ne!(sa.value_mg_dl, sb.value_mg_dl);
    }

    #[test]
    fn reset_restores_initial_conditions() {
        let mut patient = noiseless(MealSchedule::default_daily());
        let first: Vec<f64> = (0..20)
            .map(|k| {
                patient
                    .step(&InsulinCommand::new(k as f64 * 5.0, 1.5, 0.0))
                    .unwrap()
                    .value_mg_dl
            })
            .collect();
        patient.reset(1, &profile()).unwrap();
        let second: Vec<f64> = (0..20)
            .map(|k| {
                patient
                    .step(&InsulinCommand::new(k as f64 * 5.0, 1.5, 0.0))
                    .unwrap()
                    .value_mg_dl
            })
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn bolus_is_spread_across_the_period() {
        // A 6 U bolus over 5 minutes delivers 1.2 U/min; glucose should
        // drop noticeably faster than under basal alone.
        let mut with_bolus = noiseless(MealSchedule::empty());
        let mut basal_only = noiseless(MealSchedule::empty());
        with_bolus
            .step(&InsulinCommand::new(0.0, 1.0, 6.0))
            .unwrap();
        basal_only
            .step(&InsulinCommand::new(0.0, 1.0, 0.0))
            .unwrap();
        for k in 1..12 {
            let cmd = InsulinCommand::new(k as f64 * 5.0, 1.0, 0.0);
            with_bolus.step(&cmd).unwrap();
            basal_only.step(&cmd).unwrap();
        }
        assert!(with_bolus.state().g < basal_only.state().g - 5.0);
    }

    #[test]
    fn rejects_bad_construction() {
        let bad_dt = VirtualPatient::new(
            BergmanParams::default(),
            MealSchedule::empty(),
            CgmSensor::new(0.0).unwrap(),
            0.0,
            1,
        );
        assert!(bad_dt.is_err());

        let mut params = BergmanParams::default();
        params.n = -0.2;
        let bad_params =
            VirtualPatient::new(params, MealSchedule::empty(), CgmSensor::default(), 5.0, 1);
        assert!(bad_params.is_err());
    }
}
