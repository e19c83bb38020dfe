//! Controller abstraction shared by every dosing strategy.
//!
//! The closed-loop harness drives controllers through a narrow interface:
//! one [`ControlTick`] in, one [`InsulinCommand`] out. Strategy selection and
//! parameters live in [`ControllerConfig`], which scenario files deserialize
//! into and which builds a fresh boxed instance per patient.

use crate::basal_bolus::{BasalBolusConfig, BasalBolusController};
use crate::error::{ControlError, ControlResult};
use crate::fuzzy::{FuzzyConfig, HierarchicalFuzzyController};
use crate::pid::{PidConfig, PidController};
use gl_core::{GlucoseSample, InsulinCommand, PatientProfile};
use serde::{Deserialize, Serialize};

/// Everything a controller may observe at one sampling instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlTick {
    /// Simulation time of this tick (minutes).
    pub t_min: f64,
    /// Time since the previous command (minutes).
    pub dt_min: f64,
    /// Glucose reading delivered to the controller.
    pub sample: GlucoseSample,
    /// Carbohydrates announced at this tick, if any (grams).
    pub announced_carbs_g: Option<f64>,
}

/// A dosing strategy driven by the closed-loop harness.
///
/// Implementations are deterministic: the same construction parameters and
/// the same tick sequence produce the same command sequence. All parameter
/// validation happens at construction; `command` never fails for finite
/// inputs.
pub trait Controller {
    /// Compute the insulin command for the sampling period starting at this tick.
    fn command(&mut self, tick: &ControlTick, profile: &PatientProfile) -> InsulinCommand;

    /// Clear mutable state (integrals, histories) without touching configuration.
    fn reset(&mut self);

    /// Short stable name used in reports and logs.
    fn name(&self) -> &'static str;
}

/// Hard actuator bounds every controller clamps against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceLimits {
    /// Maximum basal rate the pump can deliver (U/hr).
    pub max_basal_u_per_hr: f64,
    /// Maximum single bolus the pump can deliver (U).
    pub max_bolus_u: f64,
}

impl DeviceLimits {
    /// Create device limits, rejecting non-positive or non-finite bounds.
    pub fn new(max_basal_u_per_hr: f64, max_bolus_u: f64) -> ControlResult<Self> {
        let limits = Self {
            max_basal_u_per_hr,
            max_bolus_u,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Check that both bounds are finite and positive.
    pub fn validate(&self) -> ControlResult<()> {
        if !(self.max_basal_u_per_hr.is_finite() && self.max_basal_u_per_hr > 0.0) {
            return Err(ControlError::InvalidConfig {
                what: "max_basal_u_per_hr must be finite and positive",
            });
        }
        if !(self.max_bolus_u.is_finite() && self.max_bolus_u > 0.0) {
            return Err(ControlError::InvalidConfig {
                what: "max_bolus_u must be finite and positive",
            });
        }
        Ok(())
    }

    /// Clamp a basal rate into the deliverable range (U/hr).
    pub fn clamp_basal(&self, rate_u_per_hr: f64) -> f64 {
        rate_u_per_hr.clamp(0.0, self.max_basal_u_per_hr)
    }

    /// Clamp a bolus into the deliverable range (U).
    pub fn clamp_bolus(&self, bolus_u: f64) -> f64 {
        bolus_u.clamp(0.0, self.max_bolus_u)
    }
}

impl Default for DeviceLimits {
    /// Typical pump limits: 12 U/hr basal, 25 U bolus.
    fn default() -> Self {
        Self {
            max_basal_u_per_hr: 12.0,
            max_bolus_u: 25.0,
        }
    }
}

/// Controller selection and parameters, as stored in scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerConfig {
    /// Open-loop therapy: profile basal plus announced-meal boluses.
    BasalBolus(BasalBolusConfig),
    /// PID feedback on glucose error with anti-windup and derivative filtering.
    Pid(PidConfig),
    /// Two-layer fuzzy supervisor gating a Mamdani dose engine.
    HierarchicalFuzzy(FuzzyConfig),
}

impl ControllerConfig {
    /// Build a fresh controller instance for one patient.
    ///
    /// This is the single construction path used by the harness layer, so
    /// every validation error surfaces here rather than mid-run.
    pub fn build(&self, profile: &PatientProfile) -> ControlResult<Box<dyn Controller>> {
        match self {
            Self::BasalBolus(cfg) => Ok(Box::new(BasalBolusController::new(cfg.clone(), profile)?)),
            Self::Pid(cfg) => Ok(Box::new(PidController::new(cfg.clone())?)),
            Self::HierarchicalFuzzy(cfg) => {
                Ok(Box::new(HierarchicalFuzzyController::new(cfg.clone())?))
            }
        }
    }

    /// Validate the parameters without building a controller. Profile checks
    /// still happen in [`ControllerConfig::build`].
    pub fn validate(&self) -> ControlResult<()> {
        match self {
            Self::BasalBolus(cfg) => cfg.limits.validate(),
            Self::Pid(cfg) => cfg.validate(),
            Self::HierarchicalFuzzy(cfg) => cfg.validate(),
        }
    }

    /// Stable name of the configured strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BasalBolus(_) => "basal-bolus",
            Self::Pid(_) => "pid",
            Self::HierarchicalFuzzy(_) => "hierarchical-fuzzy",
        }
    }
}
