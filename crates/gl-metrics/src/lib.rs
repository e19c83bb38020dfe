//! Clinical scoring of closed-loop glucose traces.
//!
//! Three layers: pointwise risk (the Kovatchev LBGI/HBGI indices),
//! range accounting (time in/below/above the 70-180 mg/dL band plus severe
//! excursion counts), and per-patient envelope classification (CVGA). The
//! [`report`] module assembles them into [`RiskReport`] for one trace and
//! [`CohortReport`] across a population.

pub mod cvga;
pub mod error;
pub mod ranges;
pub mod report;
pub mod risk;

pub use cvga::{CvgaHistogram, CvgaZone};
pub use error::{MetricsError, MetricsResult};
pub use ranges::{GlucoseStats, RangeBreakdown};
pub use report::{AggregateStats, CohortReport, PatientFailure, PatientOutcome, RiskReport};
pub use risk::{RiskIndices, blood_glucose_indices, risk, symmetrized_risk};
