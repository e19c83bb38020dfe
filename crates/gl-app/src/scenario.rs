//! Scenario schema: the YAML surface users feed to the CLI.
//!
//! A scenario fixes everything a cohort run needs: horizon, sampling period,
//! meals, sensor noise, patient selection, controller, and the seed. Two
//! scenarios that serialize identically always produce identical reports,
//! which is what makes run-id caching sound.

use crate::error::{AppError, AppResult};
use gl_controls::{ControllerConfig, FuzzyConfig};
use gl_core::{MealEvent, PatientClass, PatientProfile};
use gl_patient::{class_profiles, cohort_profiles, MealSchedule, DEFAULT_NOISE_SD};
use gl_sim::SimOptions;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Schema version accepted by this build.
pub const SCENARIO_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCENARIO_VERSION
}

fn default_horizon_hours() -> f64 {
    24.0
}

fn default_dt_min() -> f64 {
    5.0
}

fn default_meal_tau_min() -> f64 {
    45.0
}

fn default_sensor_noise_sd() -> f64 {
    DEFAULT_NOISE_SD
}

/// One meal line in a scenario file. Times are hours from run start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealDef {
    pub at_hours: f64,
    pub carbs_g: f64,
}

/// Which cohort members a run covers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CohortSelect {
    /// The full 30-patient cohort.
    #[default]
    All,
    /// All ten members of one class.
    Class { class: PatientClass },
    /// Explicit patient ids, run in the given order.
    Patients { ids: Vec<String> },
}

/// A complete run definition, as stored in a scenario YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDef {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: f64,
    #[serde(default = "default_dt_min")]
    pub dt_min: f64,
    #[serde(default)]
    pub meals: Vec<MealDef>,
    #[serde(default = "default_meal_tau_min")]
    pub meal_tau_min: f64,
    #[serde(default = "default_sensor_noise_sd")]
    pub sensor_noise_sd: f64,
    #[serde(default)]
    pub cohort: CohortSelect,
    pub controller: ControllerConfig,
}

impl ScenarioDef {
    pub fn validate(&self) -> AppResult<()> {
        if self.version != SCENARIO_VERSION {
            return Err(AppError::scenario(format!(
                "unsupported scenario version {} (this build reads version {})",
                self.version, SCENARIO_VERSION
            )));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::scenario("scenario name must not be empty"));
        }
        if !(self.horizon_hours.is_finite() && self.horizon_hours > 0.0) {
            return Err(AppError::scenario(
                "horizon_hours must be finite and positive",
            ));
        }
        if !(self.dt_min.is_finite() && self.dt_min > 0.0) {
            return Err(AppError::scenario("dt_min must be finite and positive"));
        }
        if !(self.meal_tau_min.is_finite() && self.meal_tau_min > 0.0) {
            return Err(AppError::scenario(
                "meal_tau_min must be finite and positive",
            ));
        }
        if !(self.sensor_noise_sd.is_finite() && self.sensor_noise_sd >= 0.0) {
            return Err(AppError::scenario(
                "sensor_noise_sd must be finite and non-negative",
            ));
        }
        for meal in &self.meals {
            if !(meal.carbs_g.is_finite() && meal.carbs_g > 0.0) {
                return Err(AppError::scenario("meal carbs_g must be finite and positive"));
            }
            if !meal.at_hours.is_finite() || meal.at_hours < 0.0 || meal.at_hours > self.horizon_hours
            {
                return Err(AppError::scenario(format!(
                    "meal at {} h lies outside the {} h horizon",
                    meal.at_hours, self.horizon_hours
                )));
            }
        }
        if let CohortSelect::Patients { ids } = &self.cohort {
            if ids.is_empty() {
                return Err(AppError::scenario("patient selection must not be empty"));
            }
            let known: HashSet<String> = cohort_profiles().into_iter().map(|p| p.id).collect();
            let mut seen = HashSet::new();
            for id in ids {
                if !known.contains(id) {
                    return Err(AppError::scenario(format!("unknown patient id {id:?}")));
                }
                if !seen.insert(id.as_str()) {
                    return Err(AppError::scenario(format!("duplicate patient id {id:?}")));
                }
            }
        }
        self.controller.validate()?;
        Ok(())
    }

    /// Resolve the cohort selection into concrete profiles, in run order.
    pub fn selected_profiles(&self) -> AppResult<Vec<PatientProfile>> {
        match &self.cohort {
            CohortSelect::All => Ok(cohort_profiles()),
            CohortSelect::Class { class } => Ok(class_profiles(*class)),
            CohortSelect::Patients { ids } => {
                let mut by_id: HashMap<String, PatientProfile> = cohort_profiles()
                    .into_iter()
                    .map(|p| (p.id.clone(), p))
                    .collect();
                ids.iter()
                    .map(|id| {
                        by_id
                            .remove(id)
                            .ok_or_else(|| AppError::scenario(format!("unknown patient id {id:?}")))
                    })
                    .collect()
            }
        }
    }

    /// The meal schedule in plant time (minutes).
    pub fn meal_schedule(&self) -> AppResult<MealSchedule> {
        let events = self
            .meals
            .iter()
            .map(|m| MealEvent::new(m.at_hours * 60.0, m.carbs_g))
            .collect();
        let schedule = MealSchedule::new(events).with_tau_min(self.meal_tau_min);
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            dt_min: self.dt_min,
            horizon_hours: self.horizon_hours,
            ..SimOptions::default()
        }
    }
}

/// The documented default scenario: a full day over the whole cohort with
/// three meals and the fuzzy controller.
pub fn example_scenario() -> ScenarioDef {
    ScenarioDef {
        version: SCENARIO_VERSION,
        name: "day-cohort".to_string(),
        seed: 42,
        horizon_hours: 24.0,
        dt_min: 5.0,
        meals: vec![
            MealDef {
                at_hours: 7.0,
                carbs_g: 50.0,
            },
            MealDef {
                at_hours: 12.0,
                carbs_g: 60.0,
            },
            MealDef {
                at_hours: 18.0,
                carbs_g: 70.0,
            },
        ],
        meal_tau_min: 45.0,
        sensor_noise_sd: DEFAULT_NOISE_SD,
        cohort: CohortSelect::All,
        controller: ControllerConfig::HierarchicalFuzzy(FuzzyConfig::default()),
    }
}

/// Load and validate a scenario file.
pub fn load_scenario(path: &Path) -> AppResult<ScenarioDef> {
    let content = fs::read_to_string(path)?;
    let scenario: ScenarioDef = serde_yaml::from_str(&content)?;
    scenario.validate()?;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_scenario_validates() {
        let scenario = example_scenario();
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.selected_profiles().unwrap().len(), 30);
        assert_eq!(scenario.sim_options().expected_ticks(), 288);
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let yaml = "name: smoke\ncontroller:\n  type: Pid\n";
        let scenario: ScenarioDef = serde_yaml::from_str(yaml).unwrap();
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.version, SCENARIO_VERSION);
        assert_eq!(scenario.seed, 0);
        assert_eq!(scenario.horizon_hours, 24.0);
        assert_eq!(scenario.dt_min, 5.0);
        assert_eq!(scenario.sensor_noise_sd, 2.0);
        assert_eq!(scenario.cohort, CohortSelect::All);
        assert!(scenario.meals.is_empty());
    }

    #[test]
    fn scenario_round_trips_through_yaml() {
        let scenario = example_scenario();
        let yaml = serde_yaml::to_string(&scenario).unwrap();
        let back: ScenarioDef = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, scenario);
    }

    #[test]
    fn meal_outside_horizon_rejected() {
        let mut scenario = example_scenario();
        scenario.meals.push(MealDef {
            at_hours: 30.0,
            carbs_g: 40.0,
        });
        assert!(matches!(
            scenario.validate(),
            Err(AppError::Scenario { .. })
        ));
    }

    #[test]
    fn patient_selection_is_checked() {
        let mut scenario = example_scenario();
        scenario.cohort = CohortSelect::Patients {
            ids: vec!["adult#001".into(), "martian#001".into()],
        };
        assert!(scenario.validate().is_err());

        scenario.cohort = CohortSelect::Patients {
            ids: vec!["adult#001".into(), "adult#001".into()],
        };
        assert!(scenario.validate().is_err());

        scenario.cohort = CohortSelect::Patients { ids: vec![] };
        assert!(scenario.validate().is_err());

        scenario.cohort = CohortSelect::Patients {
            ids: vec!["child#003".into(), "adult#001".into()],
        };
        assert!(scenario.validate().is_ok());
        let profiles = scenario.selected_profiles().unwrap();
        assert_eq!(profiles[0].id, "child#003");
        assert_eq!(profiles[1].id, "adult#001");
    }

    #[test]
    fn class_selection_yields_ten() {
        let mut scenario = example_scenario();
        scenario.cohort = CohortSelect::Class {
            class: PatientClass::Adolescent,
        };
        let profiles = scenario.selected_profiles().unwrap();
        assert_eq!(profiles.len(), 10);
        assert!(profiles.iter().all(|p| p.class == PatientClass::Adolescent));
    }

    #[test]
    fn version_mismatch_rejected() {
        let mut scenario = example_scenario();
        scenario.version = 99;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn meal_schedule_converts_hours_to_minutes() {
        let scenario = example_scenario();
        let schedule = scenario.meal_schedule().unwrap();
        assert_eq!(schedule.events.len(), 3);
        assert_eq!(schedule.events[0].t_min, 420.0);
        assert_eq!(schedule.events[2].t_min, 1080.0);
        assert_eq!(schedule.tau_min, 45.0);
    }
}
