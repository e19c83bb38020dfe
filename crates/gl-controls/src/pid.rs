//! PID controller on the glucose error signal.
//!
//! Error is `glucose - target`, so positive error (hyperglycemia) drives
//! positive insulin. The derivative runs through a single-pole low-pass
//! filter to keep CGM noise out of the command, and the integral uses
//! conditional integration: it only accumulates while the proportional and
//! derivative terms alone leave the output inside the actuator range.

use crate::controller::{ControlTick, Controller, DeviceLimits};
use crate::error::{ControlError, ControlResult};
use gl_core::{InsulinCommand, PatientProfile};
use serde::{Deserialize, Serialize};

fn default_kp() -> f64 {
    0.05
}

fn default_ki() -> f64 {
    0.002
}

fn default_kd() -> f64 {
    0.05
}

fn default_target() -> f64 {
    110.0
}

fn default_integral_limit() -> f64 {
    2000.0
}

fn default_filter_alpha() -> f64 {
    0.5
}

/// PID gains and shaping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    /// Proportional gain (U/hr per mg/dL).
    #[serde(default = "default_kp")]
    pub kp: f64,
    /// Integral gain (U/hr per mg/dL·min).
    #[serde(default = "default_ki")]
    pub ki: f64,
    /// Derivative gain (U/hr per mg/dL/min).
    #[serde(default = "default_kd")]
    pub kd: f64,
    /// Glucose setpoint (mg/dL).
    #[serde(default = "default_target")]
    pub target_mg_dl: f64,
    /// Integral accumulator bound (mg/dL·min).
    #[serde(default = "default_integral_limit")]
    pub integral_limit: f64,
    /// Derivative filter coefficient in (0, 1]; 1 disables filtering.
    #[serde(default = "default_filter_alpha")]
    pub derivative_filter_alpha: f64,
    /// Pump limits applied to every command.
    #[serde(default)]
    pub limits: DeviceLimits,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki: default_ki(),
            kd: default_kd(),
            target_mg_dl: default_target(),
            integral_limit: default_integral_limit(),
            derivative_filter_alpha: default_filter_alpha(),
            limits: DeviceLimits::default(),
        }
    }
}

impl PidConfig {
    /// Check the parameter ranges once, at construction.
    pub fn validate(&self) -> ControlResult<()> {
        for (gain, what) in [
            (self.kp, "kp must be finite and non-negative"),
            (self.ki, "ki must be finite and non-negative"),
            (self.kd, "kd must be finite and non-negative"),
        ] {
            if !(gain.is_finite() && gain >= 0.0) {
                return Err(ControlError::InvalidConfig { what });
            }
        }
        if !(self.target_mg_dl.is_finite() && self.target_mg_dl > 0.0) {
            return Err(ControlError::InvalidConfig {
                what: "target_mg_dl must be finite and positive",
            });
        }
        if !(self.integral_limit.is_finite() && self.integral_limit > 0.0) {
            return Err(ControlError::InvalidConfig {
                what: "integral_limit must be finite and positive",
            });
        }
        if !(self.derivative_filter_alpha.is_finite()
            && self.derivative_filter_alpha > 0.0
            && self.derivative_filter_alpha <= 1.0)
        {
            return Err(ControlError::InvalidConfig {
                what: "derivative_filter_alpha must be in (0, 1]",
            });
        }
        self.limits.validate()
    }
}

/// Mutable PID state, encapsulated per instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    /// Integral accumulator (mg/dL·min), kept within the configured bound.
    pub integral: f64,
    /// Error at the previous tick (mg/dL).
    pub prev_error: f64,
    /// Filtered derivative at the previous tick (mg/dL/min).
    pub prev_derivative: f64,
    /// False until the first tick has been observed.
    pub primed: bool,
}

impl Default for PidState {
    fn default() -> Self {
        Self {
            integral: 0.0,
            prev_error: 0.0,
            prev_derivative: 0.0,
            primed: false,
        }
    }
}

/// PID controller emitting a basal-only command each tick.
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    state: PidState,
}

impl PidController {
    /// Build the controller, rejecting out-of-range parameters.
    pub fn new(config: PidConfig) -> ControlResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: PidState::default(),
        })
    }

    /// Read-only view of the current state, for diagnostics.
    pub fn state(&self) -> &PidState {
        &self.state
    }
}

impl Controller for PidController {
    fn command(&mut self, tick: &ControlTick, _profile: &PatientProfile) -> InsulinCommand {
        let error = tick.sample.value_mg_dl - self.config.target_mg_dl;
        if !error.is_finite() {
            // Sensor glitch: hold state and suspend delivery for this period.
            return InsulinCommand::zero(tick.t_min);
        }

        // Filtered derivative. First tick and degenerate dt contribute zero.
        let raw_d = if self.state.primed && tick.dt_min > 0.0 {
            (error - self.state.prev_error) / tick.dt_min
        } else {
            0.0
        };
        let alpha = self.config.derivative_filter_alpha;
        let filtered_d = alpha * raw_d + (1.0 - alpha) * self.state.prev_derivative;

        // Conditional integration: accumulate only while P + D alone leave
        // the output inside the actuator range.
        let pd = self.config.kp * error + self.config.kd * filtered_d;
        let pd_inside = (0.0..=self.config.limits.max_basal_u_per_hr).contains(&pd);
        if self.config.ki > 0.0 && tick.dt_min > 0.0 && pd_inside {
            let limit = self.config.integral_limit;
            self.state.integral = (self.state.integral + error * tick.dt_min).clamp(-limit, limit);
        }

        let output = pd + self.config.ki * self.state.integral;
        let basal = self.config.limits.clamp_basal(output);

        self.state.prev_error = error;
        self.state.prev_derivative = filtered_d;
        self.state.primed = true;

        InsulinCommand::new(tick.t_min, basal, 0.0)
    }

    fn reset(&mut self) {
        self.state = PidState::default();
    }

    fn name(&self) -> &'static str {
        "pid"
    }
}
