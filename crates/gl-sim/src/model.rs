//! OdeModel trait for pluggable continuous dynamics.

use crate::error::SimResult;

/// Trait for continuous-time models advanced by fixed-step integrators.
///
/// An OdeModel must implement:
/// - State type (Clone, for snapshots and stage arithmetic)
/// - Initial state
/// - RHS (right-hand side) computation: x_dot = f(t, x)
/// - Scalar field arithmetic for integration: add states, scale by scalar
pub trait OdeModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Return the initial state at t = 0.
    fn initial_state(&self) -> Self::State;

    /// Compute the state derivative dx/dt = f(t, x).
    fn rhs(&self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = k * a.
    fn scale(&self, a: &Self::State, k: f64) -> Self::State;
}
