//! Glucose samples and insulin commands: the two values crossing the
//! plant/controller boundary every sampling period.

use serde::{Deserialize, Serialize};

/// Where a glucose reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleSource {
    /// CGM reading (noisy).
    Sensor,
    /// Plant-internal state (noise-free).
    Truth,
}

/// One glucose measurement at a sampling instant.
///
/// Immutable once recorded. Readings are clamped at zero so a noise model
/// can never produce a negative concentration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseSample {
    /// Minutes since run start.
    pub t_min: f64,
    /// Glucose concentration (mg/dL), never negative.
    pub value_mg_dl: f64,
    pub source: SampleSource,
}

impl GlucoseSample {
    pub fn new(t_min: f64, value_mg_dl: f64, source: SampleSource) -> Self {
        Self {
            t_min,
            value_mg_dl: value_mg_dl.max(0.0),
            source,
        }
    }

    /// Sensor-sourced sample (the usual case in closed loop).
    pub fn sensor(t_min: f64, value_mg_dl: f64) -> Self {
        Self::new(t_min, value_mg_dl, SampleSource::Sensor)
    }

    /// Truth-sourced sample, for noise-free plants and tests.
    pub fn truth(t_min: f64, value_mg_dl: f64) -> Self {
        Self::new(t_min, value_mg_dl, SampleSource::Truth)
    }
}

/// Insulin delivery command for one sampling period.
///
/// Produced by exactly one controller per tick and consumed once by the
/// plant. Both dose fields are non-negative; clamping to device maxima is
/// the emitting controller's job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsulinCommand {
    /// Minutes since run start at which the command was issued.
    pub t_min: f64,
    /// Background infusion rate (U/hr), held for the next period.
    pub basal_u_per_hr: f64,
    /// Discrete bolus (U) delivered across the next period.
    pub bolus_u: f64,
}

impl InsulinCommand {
    pub fn new(t_min: f64, basal_u_per_hr: f64, bolus_u: f64) -> Self {
        Self {
            t_min,
            basal_u_per_hr: basal_u_per_hr.max(0.0),
            bolus_u: bolus_u.max(0.0),
        }
    }

    /// No insulin at all; what the plant sees before the first sample.
    pub fn zero(t_min: f64) -> Self {
        Self::new(t_min, 0.0, 0.0)
    }

    /// Units delivered across one sampling period of `dt_min` minutes.
    pub fn total_units(&self, dt_min: f64) -> f64 {
        self.basal_u_per_hr * dt_min / 60.0 + self.bolus_u
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sample_value_never_negative(t in -1e6_f64..1e6, v in prop::num::f64::ANY) {
            let s = GlucoseSample::sensor(t, v);
            prop_assert!(s.value_mg_dl >= 0.0);
        }

        #[test]
        fn command_doses_never_negative(
            basal in prop::num::f64::ANY,
            bolus in prop::num::f64::ANY,
        ) {
            let c = InsulinCommand::new(0.0, basal, bolus);
            prop_assert!(c.basal_u_per_hr >= 0.0);
            prop_assert!(c.bolus_u >= 0.0);
        }
    }
}
