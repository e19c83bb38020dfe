//! Meal schedule and carbohydrate absorption.

use crate::error::{PatientError, PatientResult};
use gl_core::MealEvent;
use serde::{Deserialize, Serialize};

/// Conversion from carbohydrate grams to total glucose rise (mg/dL per g).
pub const GLUCOSE_PER_GRAM: f64 = 3.5;

fn default_tau_min() -> f64 {
    45.0
}

/// Daily meal plan with first-order exponential absorption.
///
/// A meal of `carbs_g` grams starting at `t_meal` contributes
/// `(carbs_g * 3.5 / tau) * exp(-(t - t_meal) / tau)` mg/dL per minute for
/// `t >= t_meal`, so the area under the curve is the full 3.5 mg/dL-per-gram
/// rise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSchedule {
    /// Meals in the plan, not necessarily ordered.
    pub events: Vec<MealEvent>,
    /// Absorption time constant (minutes).
    #[serde(default = "default_tau_min")]
    pub tau_min: f64,
}

impl MealSchedule {
    /// Schedule with the default 45-minute absorption constant.
    pub fn new(events: Vec<MealEvent>) -> Self {
        Self {
            events,
            tau_min: default_tau_min(),
        }
    }

    /// Empty schedule (fasting run).
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// The standard day: 50 g at 7 h, 60 g at 12 h, 70 g at 18 h.
    pub fn default_daily() -> Self {
        Self::new(vec![
            MealEvent::new(7.0 * 60.0, 50.0),
            MealEvent::new(12.0 * 60.0, 60.0),
            MealEvent::new(18.0 * 60.0, 70.0),
        ])
    }

    /// Override the absorption time constant.
    pub fn with_tau_min(mut self, tau_min: f64) -> Self {
        self.tau_min = tau_min;
        self
    }

    /// Check event and constant ranges once, at construction.
    pub fn validate(&self) -> PatientResult<()> {
        if !(self.tau_min.is_finite() && self.tau_min > 0.0) {
            return Err(PatientError::InvalidSchedule {
                what: "tau_min must be finite and positive",
            });
        }
        for event in &self.events {
            if !(event.t_min.is_finite() && event.t_min >= 0.0) {
                return Err(PatientError::InvalidSchedule {
                    what: "meal times must be finite and non-negative",
                });
            }
            if !(event.carbs_g.is_finite() && event.carbs_g >= 0.0) {
                return Err(PatientError::InvalidSchedule {
                    what: "meal carbs must be finite and non-negative",
                });
            }
        }
        Ok(())
    }

    /// Glucose appearance rate at time `t` (mg/dL per minute).
    ///
    /// Sum over every meal that has started; meals in the future contribute
    /// nothing.
    pub fn absorption_rate(&self, t_min: f64) -> f64 {
        self.events
            .iter()
            .filter(|event| t_min >= event.t_min)
            .map(|event| {
                let elapsed = t_min - event.t_min;
                (event.carbs_g * GLUCOSE_PER_GRAM / self.tau_min) * (-elapsed / self.tau_min).exp()
            })
            .sum()
    }
}
