//! Per-patient and cohort-level scoring reports.

use crate::cvga::{CvgaHistogram, CvgaZone};
use crate::error::{MetricsError, MetricsResult};
use crate::ranges::{GlucoseStats, RangeBreakdown};
use crate::risk::blood_glucose_indices;
use gl_sim::Trace;
use serde::{Deserialize, Serialize};

/// Full clinical scoring of one closed-loop trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub lbgi: f64,
    pub hbgi: f64,
    pub risk_index: f64,
    pub ranges: RangeBreakdown,
    pub stats: GlucoseStats,
    pub cvga: CvgaZone,
    pub total_insulin_u: f64,
    pub coverage: f64,
    pub ticks: usize,
}

impl RiskReport {
    /// Score a trace. Partial traces (a run aborted by a plant fault) are
    /// scored as-is and show up with `coverage` below 1.
    pub fn from_trace(trace: &Trace) -> MetricsResult<RiskReport> {
        if trace.is_empty() {
            return Err(MetricsError::EmptyTrace);
        }
        let values: Vec<f64> = trace.samples.iter().map(|s| s.value_mg_dl).collect();
        let indices = blood_glucose_indices(&values)?;
        let ranges = RangeBreakdown::from_values(&values)?;
        let stats = GlucoseStats::from_values(&values)?;
        Ok(RiskReport {
            lbgi: indices.lbgi,
            hbgi: indices.hbgi,
            risk_index: indices.risk_index(),
            ranges,
            stats,
            cvga: CvgaZone::classify(stats.min_mg_dl, stats.max_mg_dl),
            total_insulin_u: trace.total_insulin_u(),
            coverage: trace.coverage(),
            ticks: values.len(),
        })
    }
}

/// One successfully scored patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientOutcome {
    pub patient_id: String,
    pub seed: u64,
    pub report: RiskReport,
}

/// One patient whose run aborted before producing a scorable trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFailure {
    pub patient_id: String,
    pub error: String,
}

/// Unweighted means over the succeeding patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub patients: usize,
    pub mean_lbgi: f64,
    pub mean_hbgi: f64,
    pub mean_risk_index: f64,
    pub mean_in_range_pct: f64,
    pub mean_below_range_pct: f64,
    pub mean_above_range_pct: f64,
    pub mean_glucose_mg_dl: f64,
    pub mean_total_insulin_u: f64,
    pub cvga: CvgaHistogram,
}

impl AggregateStats {
    pub fn from_outcomes(outcomes: &[PatientOutcome]) -> AggregateStats {
        let mut agg = AggregateStats {
            patients: outcomes.len(),
            mean_lbgi: 0.0,
            mean_hbgi: 0.0,
            mean_risk_index: 0.0,
            mean_in_range_pct: 0.0,
            mean_below_range_pct: 0.0,
            mean_above_range_pct: 0.0,
            mean_glucose_mg_dl: 0.0,
            mean_total_insulin_u: 0.0,
            cvga: CvgaHistogram::default(),
        };
        if outcomes.is_empty() {
            return agg;
        }
        for outcome in outcomes {
            let report = &outcome.report;
            agg.mean_lbgi += report.lbgi;
            agg.mean_hbgi += report.hbgi;
            agg.mean_risk_index += report.risk_index;
            agg.mean_in_range_pct += report.ranges.in_range_pct;
            agg.mean_below_range_pct += report.ranges.below_range_pct;
            agg.mean_above_range_pct += report.ranges.above_range_pct;
            agg.mean_glucose_mg_dl += report.stats.mean_mg_dl;
            agg.mean_total_insulin_u += report.total_insulin_u;
            agg.cvga.add(report.cvga);
        }
        let n = outcomes.len() as f64;
        agg.mean_lbgi /= n;
        agg.mean_hbgi /= n;
        agg.mean_risk_index /= n;
        agg.mean_in_range_pct /= n;
        agg.mean_below_range_pct /= n;
        agg.mean_above_range_pct /= n;
        agg.mean_glucose_mg_dl /= n;
        agg.mean_total_insulin_u /= n;
        agg
    }
}

/// Everything one cohort run produced, in patient order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    pub controller: String,
    pub outcomes: Vec<PatientOutcome>,
    pub failures: Vec<PatientFailure>,
    pub aggregate: AggregateStats,
}

impl CohortReport {
    pub fn assemble(
        controller: impl Into<String>,
        outcomes: Vec<PatientOutcome>,
        failures: Vec<PatientFailure>,
    ) -> CohortReport {
        let aggregate = AggregateStats::from_outcomes(&outcomes);
        CohortReport {
            controller: controller.into(),
            outcomes,
            failures,
            aggregate,
        }
    }
}
