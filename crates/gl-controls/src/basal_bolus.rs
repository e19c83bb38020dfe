//! Open-loop basal-bolus therapy.
//!
//! The classic manual regimen used as the comparison baseline: a constant
//! profile basal plus a bolus whenever a meal is announced. It reacts to
//! announced carbohydrates, never to glucose trends.

use crate::controller::{ControlTick, Controller, DeviceLimits};
use crate::error::{ControlError, ControlResult};
use gl_core::{InsulinCommand, PatientProfile};
use serde::{Deserialize, Serialize};

/// Parameters for [`BasalBolusController`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasalBolusConfig {
    /// Pump limits applied to every command.
    #[serde(default)]
    pub limits: DeviceLimits,
}

impl Default for BasalBolusConfig {
    fn default() -> Self {
        Self {
            limits: DeviceLimits::default(),
        }
    }
}

/// Open-loop controller: profile basal every tick, bolus on announced meals.
///
/// Stateless between ticks. The meal bolus is carbs over the carb ratio plus
/// a correction term for glucose above target; glucose below target never
/// reduces the meal bolus.
#[derive(Debug, Clone)]
pub struct BasalBolusController {
    config: BasalBolusConfig,
}

impl BasalBolusController {
    /// Build the controller, validating limits and profile once up front.
    pub fn new(config: BasalBolusConfig, profile: &PatientProfile) -> ControlResult<Self> {
        config.limits.validate()?;
        profile
            .validate()
            .map_err(|e| ControlError::InvalidProfile {
                what: e.to_string(),
            })?;
        Ok(Self { config })
    }
}

impl Controller for BasalBolusController {
    fn command(&mut self, tick: &ControlTick, profile: &PatientProfile) -> InsulinCommand {
        let basal = self.config.limits.clamp_basal(profile.basal_u_per_hr);
        let bolus = match tick.announced_carbs_g {
            Some(carbs) => {
                let meal = carbs / profile.carb_ratio_g_per_u;
                let correction = ((tick.sample.value_mg_dl - profile.target_mg_dl)
                    / profile.correction_mg_dl_per_u)
                    .max(0.0);
                self.config.limits.clamp_bolus(meal + correction)
            }
            None => 0.0,
        };
        InsulinCommand::new(tick.t_min, basal, bolus)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "basal-bolus"
    }
}
