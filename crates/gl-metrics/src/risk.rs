//! Blood-glucose risk indices.
//!
//! Uses the Kovatchev symmetrization of the glucose scale: the skewed
//! clinical range (hypo 20..70, hyper 180..600) maps onto a symmetric risk
//! space where deviations below and above target weigh comparably. LBGI and
//! HBGI are the mean squared risk on each side and are the standard
//! predictors of severe hypo-/hyperglycemia.

use crate::error::{MetricsError, MetricsResult};

const RISK_SCALE: f64 = 1.509;
const RISK_EXPONENT: f64 = 1.084;
const RISK_OFFSET: f64 = 5.381;

/// Floor applied before the log transform so the function stays finite.
const MIN_BG_MG_DL: f64 = 1.0;

/// Low and high blood-glucose indices over one trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskIndices {
    pub lbgi: f64,
    pub hbgi: f64,
}

impl RiskIndices {
    pub fn risk_index(&self) -> f64 {
        self.lbgi + self.hbgi
    }
}

/// The symmetrized glucose deviation. Negative below ~112.5 mg/dL,
/// positive above, zero at the crossover.
pub fn symmetrized_risk(bg_mg_dl: f64) -> f64 {
    let bg = bg_mg_dl.max(MIN_BG_MG_DL);
    RISK_SCALE * (bg.ln().powf(RISK_EXPONENT) - RISK_OFFSET)
}

/// Pointwise risk, `10·f(bg)²`. Ranges 0 (at the crossover) to ~100 at the
/// extremes of the measurable scale.
pub fn risk(bg_mg_dl: f64) -> f64 {
    let f = symmetrized_risk(bg_mg_dl);
    10.0 * f * f
}

/// LBGI/HBGI over a sequence of glucose values.
pub fn blood_glucose_indices(values_mg_dl: &[f64]) -> MetricsResult<RiskIndices> {
    if values_mg_dl.is_empty() {
        return Err(MetricsError::EmptyTrace);
    }
    let mut low_sum = 0.0;
    let mut high_sum = 0.0;
    for &bg in values_mg_dl {
        if !bg.is_finite() {
            return Err(MetricsError::NonFinite {
                what: "glucose value",
            });
        }
        let f = symmetrized_risk(bg);
        let r = 10.0 * f * f;
        if f < 0.0 {
            low_sum += r;
        } else if f > 0.0 {
            high_sum += r;
        }
    }
    let n = values_mg_dl.len() as f64;
    Ok(RiskIndices {
        lbgi: low_sum / n,
        hbgi: high_sum / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossover_sits_near_112() {
        assert!(symmetrized_risk(112.5).abs() < 0.01);
        assert!(symmetrized_risk(100.0) < 0.0);
        assert!(symmetrized_risk(120.0) > 0.0);
    }

    #[test]
    fn constant_150_gives_small_positive_hbgi() {
        let values = vec![150.0; 288];
        let indices = blood_glucose_indices(&values).unwrap();
        assert_eq!(indices.lbgi, 0.0);
        assert!(indices.hbgi > 0.0 && indices.hbgi < 5.0);
        assert_eq!(indices.risk_index(), indices.hbgi);
    }

    #[test]
    fn deep_hypo_dominates_lbgi() {
        let indices = blood_glucose_indices(&[50.0; 10]).unwrap();
        assert!(indices.lbgi > 5.0, "lbgi = {}", indices.lbgi);
        assert_eq!(indices.hbgi, 0.0);
    }

    #[test]
    fn risk_grows_toward_both_extremes() {
        assert!(risk(40.0) > risk(60.0));
        assert!(risk(60.0) > risk(100.0));
        assert!(risk(400.0) > risk(250.0));
        assert!(risk(250.0) > risk(150.0));
    }

    #[test]
    fn floor_keeps_low_readings_finite() {
        assert!(risk(0.0).is_finite());
        assert!(risk(0.5).is_finite());
        assert_eq!(risk(0.0), risk(1.0));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            blood_glucose_indices(&[120.0, f64::INFINITY]),
            Err(MetricsError::NonFinite { .. })
        ));
        assert!(matches!(
            blood_glucose_indices(&[]),
            Err(MetricsError::EmptyTrace)
        ));
    }
}
