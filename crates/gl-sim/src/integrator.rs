//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::OdeModel;
use serde::{Deserialize, Serialize};

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Integrator {
    /// 4th-order Runge-Kutta (default, most accurate, 4 rhs calls per step).
    #[default]
    Rk4,
    /// Forward Euler (1st-order, faster, 1 rhs call per step).
    ForwardEuler,
}

impl Integrator {
    /// Advance the state by one step of size `dt`.
    pub fn step_state<M: OdeModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        match self {
            Self::ForwardEuler => {
                let xdot = model.rhs(t, x)?;
                Ok(model.add(x, &model.scale(&xdot, dt)))
            }
            Self::Rk4 => {
                let k1 = model.rhs(t, x)?;

                let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
                let k2 = model.rhs(t + 0.5 * dt, &x2)?;

                let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
                let k3 = model.rhs(t + 0.5 * dt, &x3)?;

                let x4 = model.add(x, &model.scale(&k3, dt));
                let k4 = model.rhs(t + dt, &x4)?;

                // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
                let k_sum = model.add(
                    &model.add(&k1, &model.scale(&k2, 2.0)),
                    &model.add(&model.scale(&k3, 2.0), &k4),
                );
                Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
            }
        }
    }
}
