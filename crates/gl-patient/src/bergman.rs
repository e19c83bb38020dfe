//! Bergman minimal model of glucose-insulin dynamics.
//!
//! Three states, per-minute units:
//! - `g` plasma glucose (mg/dL)
//! - `x` remote insulin action (1/min)
//! - `i` plasma insulin (mU/L)
//!
//! dG/dt = -(p1 + X) * G + p1 * Gb + meal(t)
//! dX/dt = -p2 * X + p3 * (I - Ib)
//! dI/dt = -n * (I - Ib) + gamma * u(t)
//!
//! where `u(t)` is the insulin delivery rate in U/min.

use crate::error::{PatientError, PatientResult};
use crate::meal::MealSchedule;
use gl_sim::{OdeModel, SimResult};
use serde::{Deserialize, Serialize};

/// Minimal-model parameters, all in per-minute units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BergmanParams {
    /// Glucose effectiveness (1/min).
    pub p1: f64,
    /// Remote insulin action decay (1/min).
    pub p2: f64,
    /// Insulin sensitivity (1/min per mU/L).
    pub p3: f64,
    /// Plasma insulin decay (1/min).
    pub n: f64,
    /// Insulin delivery gain (mU/L per U).
    pub gamma: f64,
    /// Basal glucose (mg/dL).
    pub gb: f64,
    /// Basal insulin (mU/L).
    pub ib: f64,
}

impl Default for BergmanParams {
    /// Adult reference parameters.
    fn default() -> Self {
        Self {
            p1: 0.028,
            p2: 0.025,
            p3: 5.0e-5,
            n: 0.2,
            gamma: 20.0,
            gb: 90.0,
            ib: 15.0,
        }
    }
}

impl BergmanParams {
    /// Check that every parameter is finite and positive.
    pub fn validate(&self) -> PatientResult<()> {
        for (value, what) in [
            (self.p1, "p1 must be finite and positive"),
            (self.p2, "p2 must be finite and positive"),
            (self.p3, "p3 must be finite and positive"),
            (self.n, "n must be finite and positive"),
            (self.gamma, "gamma must be finite and positive"),
            (self.gb, "gb must be finite and positive"),
            (self.ib, "ib must be finite and positive"),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PatientError::InvalidParams { what });
            }
        }
        Ok(())
    }

    /// Fasting equilibrium: glucose at basal, no remote action, insulin at
    /// basal.
    pub fn equilibrium(&self) -> BergmanState {
        BergmanState {
            g: self.gb,
            x: 0.0,
            i: self.ib,
        }
    }
}

/// Minimal-model state vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BergmanState {
    /// Plasma glucose (mg/dL).
    pub g: f64,
    /// Remote insulin action (1/min).
    pub x: f64,
    /// Plasma insulin (mU/L).
    pub i: f64,
}

impl BergmanState {
    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.g.is_finite() && self.x.is_finite() && self.i.is_finite()
    }
}

/// The minimal model as an [`OdeModel`], for one sampling period.
///
/// Delivery is constant across the period, so the caller rebuilds this
/// adapter with the current `u_per_min` before integrating each period.
pub struct BergmanModel<'a> {
    pub params: &'a BergmanParams,
    pub meals: &'a MealSchedule,
    /// Insulin delivery rate during this period (U/min).
    pub u_per_min: f64,
}

impl OdeModel for BergmanModel<'_> {
    type State = BergmanState;

    fn initial_state(&self) -> BergmanState {
        self.params.equilibrium()
    }

    fn rhs(&self, t: f64, state: &BergmanState) -> SimResult<BergmanState> {
        let p = self.params;
        let meal = self.meals.absorption_rate(t);
        Ok(BergmanState {
            g: -(p.p1 + state.x) * state.g + p.p1 * p.gb + meal,
            x: -p.p2 * state.x + p.p3 * (state.i - p.ib),
            i: -p.n * (state.i - p.ib) + p.gamma * self.u_per_min,
        })
    }

    fn add(&self, a: &BergmanState, b: &BergmanState) -> BergmanState {
        BergmanState {
            g: a.g + b.g,
            x: a.x + b.x,
            i: a.i + b.i,
        }
    }

    fn scale(&self, a: &BergmanState, k: f64) -> BergmanState {
        BergmanState {
            g: a.g * k,
            x: a.x * k,
            i: a.i * k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_sim::Integrator;

    #[test]
    fn default_params_validate() {
        assert!(BergmanParams::default().validate().is_ok());
    }

    #[test]
    fn non_positive_params_rejected() {
        let mut params = BergmanParams::default();
        params.p3 = 0.0;
        assert!(params.validate().is_err());

        let mut params = BergmanParams::default();
        params.gb = -90.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn equilibrium_is_stationary_without_insulin() {
        let params = BergmanParams::default();
        let meals = MealSchedule::empty();
        let model = BergmanModel {
            params: &params,
            meals: &meals,
            u_per_min: 0.0,
        };
        let state = params.equilibrium();
        let dot = model.rhs(0.0, &state).unwrap();
        assert!(dot.g.abs() < 1e-12);
        assert!(dot.x.abs() < 1e-12);
        assert!(dot.i.abs() < 1e-12);
    }

    #[test]
    fn insulin_delivery_builds_remote_action() {
        let params = BergmanParams::default();
        let meals = MealSchedule::empty();
        let model = BergmanModel {
            params: &params,
            meals: &meals,
            u_per_min: 0.05,
        };
        let mut state = params.equilibrium();
        let integrator = Integrator::Rk4;
        for minute in 0..60 {
            state = integrator
                .step_state(&model, minute as f64, &state, 1.0)
                .unwrap();
        }
        assert!(state.i > params.ib);
        assert!(state.x > 0.0);
        assert!(state.g < params.gb);
    }

    #[test]
    fn meal_raises_glucose_from_equilibrium() {
        let params = BergmanParams::default();
        let meals = MealSchedule::new(vec![gl_core::MealEvent::new(0.0, 50.0)]);
        let model = BergmanModel {
            params: &params,
            meals: &meals,
            u_per_min: 0.0,
        };
        let mut state = params.equilibrium();
        let integrator = Integrator::Rk4;
        for minute in 0..45 {
            state = integrator
                .step_state(&model, minute as f64, &state, 1.0)
                .unwrap();
        }
        assert!(state.g > params.gb + 30.0);
    }
}
