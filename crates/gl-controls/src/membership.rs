//! Membership functions for fuzzy linguistic variables.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// A fuzzy membership function over a scalar universe.
///
/// Breakpoints must be monotonically non-decreasing. Zero-width edges
/// (equal adjacent breakpoints) are legal and describe a vertical edge,
/// as in a shoulder term pinned to the end of the universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum MembershipFn {
    /// Triangle with feet `a`, `c` and peak `b`.
    Triangular { a: f64, b: f64, c: f64 },
    /// Trapezoid with feet `a`, `d` and plateau `[b, c]`.
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
}

impl MembershipFn {
    /// Check breakpoint finiteness and ordering.
    pub fn validate(&self) -> ControlResult<()> {
        let points = match *self {
            Self::Triangular { a, b, c } => vec![a, b, c],
            Self::Trapezoidal { a, b, c, d } => vec![a, b, c, d],
        };
        for pair in points.windows(2) {
            if !(pair[0].is_finite() && pair[1].is_finite()) {
                return Err(ControlError::InvalidTable {
                    what: format!("membership breakpoints must be finite: {self:?}"),
                });
            }
            if pair[0] > pair[1] {
                return Err(ControlError::InvalidTable {
                    what: format!("membership breakpoints must be non-decreasing: {self:?}"),
                });
            }
        }
        Ok(())
    }

    /// Membership degree of `x`, always in `[0, 1]`.
    ///
    /// Branch ordering makes every division reachable only when the edge has
    /// positive width, so degenerate edges never divide by zero.
    pub fn degree(&self, x: f64) -> f64 {
        match *self {
            Self::Triangular { a, b, c } => {
                if x < a || x > c {
                    0.0
                } else if x < b {
                    (x - a) / (b - a)
                } else if x > b {
                    (c - x) / (c - b)
                } else {
                    1.0
                }
            }
            Self::Trapezoidal { a, b, c, d } => {
                if x < a || x > d {
                    0.0
                } else if x < b {
                    (x - a) / (b - a)
                } else if x > c {
                    (d - x) / (d - c)
                } else {
                    1.0
                }
            }
        }
    }

    /// Leftmost point of the support interval.
    pub fn support_min(&self) -> f64 {
        match *self {
            Self::Triangular { a, .. } => a,
            Self::Trapezoidal { a, .. } => a,
        }
    }

    /// Rightmost point of the support interval.
    pub fn support_max(&self) -> f64 {
        match *self {
            Self::Triangular { c, .. } => c,
            Self::Trapezoidal { d, .. } => d,
        }
    }
}

/// One linguistic term with its membership function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermEntry<T> {
    /// The linguistic term this entry describes.
    pub term: T,
    /// Membership function over the variable's universe.
    pub shape: MembershipFn,
}
