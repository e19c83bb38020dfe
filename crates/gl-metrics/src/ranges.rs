//! Time-in-range accounting and descriptive glucose statistics.

use crate::error::{MetricsError, MetricsResult};
use serde::{Deserialize, Serialize};

/// Consensus glycemic target band, inclusive on both ends.
pub const TARGET_LOW_MG_DL: f64 = 70.0;
pub const TARGET_HIGH_MG_DL: f64 = 180.0;

/// Severe excursion thresholds (level-2 hypo / hyper).
pub const SEVERE_HYPO_MG_DL: f64 = 54.0;
pub const SEVERE_HYPER_MG_DL: f64 = 250.0;

/// Share of samples below, inside, and above the target band.
///
/// Computed from integer counts over one partition of the samples, so the
/// three percentages always sum to exactly 100 for a non-empty trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBreakdown {
    pub in_range_pct: f64,
    pub below_range_pct: f64,
    pub above_range_pct: f64,
    pub severe_hypo_count: usize,
    pub severe_hyper_count: usize,
}

impl RangeBreakdown {
    pub fn from_values(values_mg_dl: &[f64]) -> MetricsResult<Self> {
        if values_mg_dl.is_empty() {
            return Err(MetricsError::EmptyTrace);
        }
        let mut below = 0usize;
        let mut inside = 0usize;
        let mut above = 0usize;
        let mut severe_hypo = 0usize;
        let mut severe_hyper = 0usize;
        for &bg in values_mg_dl {
            if !bg.is_finite() {
                return Err(MetricsError::NonFinite {
                    what: "glucose value",
                });
            }
            if bg < TARGET_LOW_MG_DL {
                below += 1;
                if bg < SEVERE_HYPO_MG_DL {
                    severe_hypo += 1;
                }
            } else if bg > TARGET_HIGH_MG_DL {
                above += 1;
                if bg > SEVERE_HYPER_MG_DL {
                    severe_hyper += 1;
                }
            } else {
                inside += 1;
            }
        }
        let total = values_mg_dl.len() as f64;
        Ok(RangeBreakdown {
            in_range_pct: 100.0 * inside as f64 / total,
            below_range_pct: 100.0 * below as f64 / total,
            above_range_pct: 100.0 * above as f64 / total,
            severe_hypo_count: severe_hypo,
            severe_hyper_count: severe_hyper,
        })
    }
}

/// Population statistics over one glucose trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseStats {
    pub mean_mg_dl: f64,
    pub sd_mg_dl: f64,
    pub cv_pct: f64,
    pub min_mg_dl: f64,
    pub max_mg_dl: f64,
}

impl GlucoseStats {
    pub fn from_values(values_mg_dl: &[f64]) -> MetricsResult<Self> {
        if values_mg_dl.is_empty() {
            return Err(MetricsError::EmptyTrace);
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &bg in values_mg_dl {
            if !bg.is_finite() {
                return Err(MetricsError::NonFinite {
                    what: "glucose value",
                });
            }
            min = min.min(bg);
            max = max.max(bg);
            sum += bg;
        }
        let n = values_mg_dl.len() as f64;
        let mean = sum / n;
        let variance = values_mg_dl
            .iter()
            .map(|&bg| (bg - mean) * (bg - mean))
            .sum::<f64>()
            / n;
        let sd = variance.sqrt();
        let cv_pct = if mean > 0.0 { 100.0 * sd / mean } else { 0.0 };
        Ok(GlucoseStats {
            mean_mg_dl: mean,
            sd_mg_dl: sd,
            cv_pct,
            min_mg_dl: min,
            max_mg_dl: max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_count_as_in_range() {
        let breakdown = RangeBreakdown::from_values(&[70.0, 180.0, 110.0]).unwrap();
        assert_eq!(breakdown.in_range_pct, 100.0);
        assert_eq!(breakdown.below_range_pct, 0.0);
        assert_eq!(breakdown.above_range_pct, 0.0);
    }

    #[test]
    fn shares_partition_the_trace() {
        let values = [45.0, 65.0, 120.0, 160.0, 200.0, 300.0, 60.0, 110.0];
        let breakdown = RangeBreakdown::from_values(&values).unwrap();
        assert_eq!(breakdown.below_range_pct, 37.5);
        assert_eq!(breakdown.in_range_pct, 37.5);
        assert_eq!(breakdown.above_range_pct, 25.0);
        assert_eq!(breakdown.severe_hypo_count, 1);
        assert_eq!(breakdown.severe_hyper_count, 1);
    }

    #[test]
    fn severe_thresholds_are_strict() {
        let breakdown = RangeBreakdown::from_values(&[54.0, 250.0]).unwrap();
        assert_eq!(breakdown.severe_hypo_count, 0);
        assert_eq!(breakdown.severe_hyper_count, 0);
    }

    #[test]
    fn stats_match_hand_computation() {
        // Classic population-sd example: mean 5, sd 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = GlucoseStats::from_values(&values).unwrap();
        assert!((stats.mean_mg_dl - 5.0).abs() < 1e-12);
        assert!((stats.sd_mg_dl - 2.0).abs() < 1e-12);
        assert!((stats.cv_pct - 40.0).abs() < 1e-9);
        assert_eq!(stats.min_mg_dl, 2.0);
        assert_eq!(stats.max_mg_dl, 9.0);
    }

    #[test]
    fn empty_and_non_finite_inputs_are_rejected() {
        assert!(matches!(
            RangeBreakdown::from_values(&[]),
            Err(MetricsError::EmptyTrace)
        ));
        assert!(matches!(
            GlucoseStats::from_values(&[100.0, f64::NAN]),
            Err(MetricsError::NonFinite { .. })
        ));
    }
}
