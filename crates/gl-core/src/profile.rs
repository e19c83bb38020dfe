//! Patient therapy parameters and meal announcements.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Cohort age class, mirroring the standard 30-patient virtual cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientClass {
    Adult,
    Adolescent,
    Child,
}

impl PatientClass {
    pub fn label(&self) -> &'static str {
        match self {
            PatientClass::Adult => "adult",
            PatientClass::Adolescent => "adolescent",
            PatientClass::Child => "child",
        }
    }
}

/// Therapy parameters consumed by the controllers.
///
/// These are the values a clinician would program into a pump: background
/// rate, carbohydrate ratio, correction factor, and glucose target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub class: PatientClass,
    /// Programmed background infusion rate (U/hr).
    pub basal_u_per_hr: f64,
    /// Grams of carbohydrate covered by one unit of insulin.
    pub carb_ratio_g_per_u: f64,
    /// Expected glucose drop (mg/dL) per unit of correction insulin.
    pub correction_mg_dl_per_u: f64,
    /// Control target (mg/dL).
    pub target_mg_dl: f64,
}

impl PatientProfile {
    /// Check the division preconditions once, up front.
    ///
    /// Controllers divide by the carb ratio and the correction factor, so
    /// non-positive values are rejected here rather than mid-run.
    pub fn validate(&self) -> CoreResult<()> {
        let reject = |what: &'static str| {
            Err(CoreError::InvalidProfile {
                id: self.id.clone(),
                what,
            })
        };
        if !(self.basal_u_per_hr.is_finite() && self.basal_u_per_hr >= 0.0) {
            return reject("basal_u_per_hr must be finite and non-negative");
        }
        if !(self.carb_ratio_g_per_u.is_finite() && self.carb_ratio_g_per_u > 0.0) {
            return reject("carb_ratio_g_per_u must be finite and positive");
        }
        if !(self.correction_mg_dl_per_u.is_finite() && self.correction_mg_dl_per_u > 0.0) {
            return reject("correction_mg_dl_per_u must be finite and positive");
        }
        if !(self.target_mg_dl.is_finite() && self.target_mg_dl > 0.0) {
            return reject("target_mg_dl must be finite and positive");
        }
        Ok(())
    }
}

/// One announced meal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealEvent {
    /// Meal start, minutes since run start.
    pub t_min: f64,
    /// Carbohydrate content (g).
    pub carbs_g: f64,
}

impl MealEvent {
    pub fn new(t_min: f64, carbs_g: f64) -> Self {
        Self { t_min, carbs_g }
    }
}
