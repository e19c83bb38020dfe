//! Two-layer hierarchical fuzzy controller.
//!
//! Layer 1 is a supervisor over the glucose rate of change: it maps rate
//! terms to urgency weights and blends them into a single urgency in [0, 1].
//! Layer 2 is a Mamdani engine over (glucose, rate) producing a basal dose
//! adjustment in U/hr via clipped implication, max aggregation, and sampled
//! centroid defuzzification. The final basal is the profile base dose plus
//! the urgency-gated adjustment, clamped to the pump limits.

use crate::controller::{ControlTick, Controller, DeviceLimits};
use crate::error::{ControlError, ControlResult};
use crate::membership::{MembershipFn, TermEntry};
use gl_core::{InsulinCommand, PatientProfile};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Crisp glucose universe (mg/dL). Inputs are clamped into this range.
const GLUCOSE_UNIVERSE: (f64, f64) = (0.0, 400.0);
/// Crisp rate universe (mg/dL/min). Inputs are clamped into this range.
const RATE_UNIVERSE: (f64, f64) = (-5.0, 5.0);
/// Sample count for centroid defuzzification of the dose universe.
const DEFUZZ_SAMPLES: usize = 201;

/// Linguistic glucose terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlucoseTerm {
    VeryLow,
    Low,
    InRange,
    High,
    VeryHigh,
}

/// Linguistic rate-of-change terms, shared by both layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateTerm {
    FallingFast,
    Falling,
    Steady,
    Rising,
    RisingFast,
}

/// Linguistic dose-adjustment terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoseTerm {
    StrongDecrease,
    Decrease,
    Hold,
    Increase,
    StrongIncrease,
}

/// One Mamdani rule: glucose term AND rate term implies adjustment term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyRule {
    pub glucose: GlucoseTerm,
    pub rate: RateTerm,
    pub dose: DoseTerm,
}

/// Supervisor row: urgency weight attached to one rate term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupervisorEntry {
    pub term: RateTerm,
    pub weight: f64,
}

fn default_glucose_terms() -> Vec<TermEntry<GlucoseTerm>> {
    use MembershipFn::{Trapezoidal, Triangular};
    vec![
        TermEntry {
            term: GlucoseTerm::VeryLow,
            shape: Trapezoidal {
                a: 0.0,
                b: 0.0,
                c: 50.0,
                d: 70.0,
            },
        },
        TermEntry {
            term: GlucoseTerm::Low,
            shape: Triangular {
                a: 60.0,
                b: 75.0,
                c: 90.0,
            },
        },
        TermEntry {
            term: GlucoseTerm::InRange,
            shape: Triangular {
                a: 85.0,
                b: 110.0,
                c: 140.0,
            },
        },
        TermEntry {
            term: GlucoseTerm::High,
            shape: Triangular {
                a: 130.0,
                b: 160.0,
                c: 200.0,
            },
        },
        TermEntry {
            term: GlucoseTerm::VeryHigh,
            shape: Trapezoidal {
                a: 180.0,
                b: 250.0,
                c: 400.0,
                d: 400.0,
            },
        },
    ]
}

fn default_rate_terms() -> Vec<TermEntry<RateTerm>> {
    use MembershipFn::{Trapezoidal, Triangular};
    vec![
        TermEntry {
            term: RateTerm::FallingFast,
            shape: Trapezoidal {
                a: -5.0,
                b: -5.0,
                c: -1.5,
                d: -0.75,
            },
        },
        TermEntry {
            term: RateTerm::Falling,
            shape: Triangular {
                a: -1.0,
                b: -0.5,
                c: -0.1,
            },
        },
        TermEntry {
            term: RateTerm::Steady,
            shape: Triangular {
                a: -0.15,
                b: 0.0,
                c: 0.15,
            },
        },
        TermEntry {
            term: RateTerm::Rising,
            shape: Triangular {
                a: 0.1,
                b: 0.5,
                c: 1.0,
            },
        },
        TermEntry {
            term: RateTerm::RisingFast,
            shape: Trapezoidal {
                a: 0.75,
                b: 1.5,
                c: 5.0,
                d: 5.0,
            },
        },
    ]
}

fn default_dose_terms() -> Vec<TermEntry<DoseTerm>> {
    use MembershipFn::{Trapezoidal, Triangular};
    vec![
        TermEntry {
            term: DoseTerm::StrongDecrease,
            shape: Trapezoidal {
                a: -2.0,
                b: -2.0,
                c: -1.5,
                d: -1.0,
            },
        },
        TermEntry {
            term: DoseTerm::Decrease,
            shape: Triangular {
                a: -1.25,
                b: -0.75,
                c: -0.25,
            },
        },
        TermEntry {
            term: DoseTerm::Hold,
            shape: Triangular {
                a: -0.35,
                b: 0.0,
                c: 0.35,
            },
        },
        TermEntry {
            term: DoseTerm::Increase,
            shape: Triangular {
                a: 0.25,
                b: 1.0,
                c: 1.75,
            },
        },
        TermEntry {
            term: DoseTerm::StrongIncrease,
            shape: Trapezoidal {
                a: 1.5,
                b: 2.25,
                c: 3.0,
                d: 3.0,
            },
        },
    ]
}

fn default_supervisor_weights() -> Vec<SupervisorEntry> {
    vec![
        SupervisorEntry {
            term: RateTerm::FallingFast,
            weight: 1.0,
        },
        SupervisorEntry {
            term: RateTerm::Falling,
            weight: 0.7,
        },
        SupervisorEntry {
            term: RateTerm::Steady,
            weight: 0.4,
        },
        SupervisorEntry {
            term: RateTerm::Rising,
            weight: 0.7,
        },
        SupervisorEntry {
            term: RateTerm::RisingFast,
            weight: 1.0,
        },
    ]
}

fn default_rules() -> Vec<FuzzyRule> {
    use DoseTerm::*;
    use GlucoseTerm::*;
    use RateTerm::*;
    let rows = [
        (VeryLow, FallingFast, StrongDecrease),
        (VeryLow, Falling, StrongDecrease),
        (VeryLow, Steady, StrongDecrease),
        (VeryLow, Rising, StrongDecrease),
        (VeryLow, RisingFast, Decrease),
        (Low, FallingFast, StrongDecrease),
        (Low, Falling, StrongDecrease),
        (Low, Steady, Decrease),
        (Low, Rising, Hold),
        (Low, RisingFast, Hold),
        (InRange, FallingFast, Decrease),
        (InRange, Falling, Decrease),
        (InRange, Steady, Hold),
        (InRange, Rising, Increase),
        (InRange, RisingFast, Increase),
        (High, FallingFast, Decrease),
        (High, Falling, Hold),
        (High, Steady, Increase),
        (High, Rising, StrongIncrease),
        (High, RisingFast, StrongIncrease),
        (VeryHigh, FallingFast, Hold),
        (VeryHigh, Falling, Increase),
        (VeryHigh, Steady, StrongIncrease),
        (VeryHigh, Rising, StrongIncrease),
        (VeryHigh, RisingFast, StrongIncrease),
    ];
    rows.into_iter()
        .map(|(glucose, rate, dose)| FuzzyRule {
            glucose,
            rate,
            dose,
        })
        .collect()
}

fn default_history_len() -> usize {
    3
}

/// Full parameterization of the hierarchical fuzzy controller.
///
/// The `Default` carries the tuned clinical tables; scenario files may
/// override any subset of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyConfig {
    /// Glucose membership table over [0, 400] mg/dL.
    #[serde(default = "default_glucose_terms")]
    pub glucose_terms: Vec<TermEntry<GlucoseTerm>>,
    /// Rate membership table over [-5, 5] mg/dL/min, shared by both layers.
    #[serde(default = "default_rate_terms")]
    pub rate_terms: Vec<TermEntry<RateTerm>>,
    /// Adjustment membership table; its support defines the output universe.
    #[serde(default = "default_dose_terms")]
    pub dose_terms: Vec<TermEntry<DoseTerm>>,
    /// Layer-1 urgency weight per rate term, each in [0, 1].
    #[serde(default = "default_supervisor_weights")]
    pub supervisor_weights: Vec<SupervisorEntry>,
    /// Layer-2 rule rows.
    #[serde(default = "default_rules")]
    pub rules: Vec<FuzzyRule>,
    /// Number of glucose readings retained for rate estimation.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// Pump limits applied to every command.
    #[serde(default)]
    pub limits: DeviceLimits,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            glucose_terms: default_glucose_terms(),
            rate_terms: default_rate_terms(),
            dose_terms: default_dose_terms(),
            supervisor_weights: default_supervisor_weights(),
            rules: default_rules(),
            history_len: default_history_len(),
            limits: DeviceLimits::default(),
        }
    }
}

fn validate_terms<T: std::fmt::Debug + PartialEq>(
    variable: &str,
    table: &[TermEntry<T>],
) -> ControlResult<()> {
    if table.is_empty() {
        return Err(ControlError::InvalidTable {
            what: format!("{variable} membership table is empty"),
        });
    }
    for entry in table {
        entry.shape.validate()?;
    }
    for (i, entry) in table.iter().enumerate() {
        if table[..i].iter().any(|prev| prev.term == entry.term) {
            return Err(ControlError::InvalidTable {
                what: format!("duplicate {variable} term {:?}", entry.term),
            });
        }
    }
    Ok(())
}

fn has_term<T: PartialEq + Copy>(table: &[TermEntry<T>], term: T) -> bool {
    table.iter().any(|entry| entry.term == term)
}

fn term_degree<T: PartialEq + Copy>(table: &[TermEntry<T>], term: T, x: f64) -> f64 {
    table
        .iter()
        .find(|entry| entry.term == term)
        .map(|entry| entry.shape.degree(x))
        .unwrap_or(0.0)
}

impl FuzzyConfig {
    /// Check every table once, at construction.
    pub fn validate(&self) -> ControlResult<()> {
        self.limits.validate()?;
        if self.history_len == 0 {
            return Err(ControlError::InvalidConfig {
                what: "history_len must be at least 1",
            });
        }
        validate_terms("glucose", &self.glucose_terms)?;
        validate_terms("rate", &self.rate_terms)?;
        validate_terms("dose", &self.dose_terms)?;

        if self.supervisor_weights.is_empty() {
            return Err(ControlError::InvalidTable {
                what: "supervisor weight table is empty".into(),
            });
        }
        for entry in &self.supervisor_weights {
            if !(entry.weight.is_finite() && (0.0..=1.0).contains(&entry.weight)) {
                return Err(ControlError::InvalidTable {
                    what: format!("urgency weight for {:?} must be in [0, 1]", entry.term),
                });
            }
            if !has_term(&self.rate_terms, entry.term) {
                return Err(ControlError::InvalidTable {
                    what: format!("supervisor references unknown rate term {:?}", entry.term),
                });
            }
        }

        if self.rules.is_empty() {
            return Err(ControlError::InvalidTable {
                what: "rule table is empty".into(),
            });
        }
        for rule in &self.rules {
            if !has_term(&self.glucose_terms, rule.glucose) {
                return Err(ControlError::InvalidTable {
                    what: format!("rule references unknown glucose term {:?}", rule.glucose),
                });
            }
            if !has_term(&self.rate_terms, rule.rate) {
                return Err(ControlError::InvalidTable {
                    what: format!("rule references unknown rate term {:?}", rule.rate),
                });
            }
            if !has_term(&self.dose_terms, rule.dose) {
                return Err(ControlError::InvalidTable {
                    what: format!("rule references unknown dose term {:?}", rule.dose),
                });
            }
        }

        let (lo, hi) = self.dose_universe();
        if !(hi > lo) {
            return Err(ControlError::InvalidTable {
                what: "dose universe must have positive width".into(),
            });
        }
        Ok(())
    }

    /// Output universe spanned by the adjustment terms' support.
    fn dose_universe(&self) -> (f64, f64) {
        let lo = self
            .dose_terms
            .iter()
            .map(|entry| entry.shape.support_min())
            .fold(f64::INFINITY, f64::min);
        let hi = self
            .dose_terms
            .iter()
            .map(|entry| entry.shape.support_max())
            .fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    }
}

/// Hierarchical fuzzy controller: supervisor urgency gating a Mamdani dose.
#[derive(Debug, Clone)]
pub struct HierarchicalFuzzyController {
    config: FuzzyConfig,
    history: VecDeque<f64>,
}

impl HierarchicalFuzzyController {
    /// Build the controller, rejecting malformed tables.
    pub fn new(config: FuzzyConfig) -> ControlResult<Self> {
        config.validate()?;
        let history = VecDeque::with_capacity(config.history_len);
        Ok(Self { config, history })
    }

    /// Layer 1: urgency in [0, 1] from the crisp rate of change.
    ///
    /// Membership-weighted mean of the supervisor weights; 0 when no rate
    /// term fires.
    pub fn urgency(&self, rate_mg_dl_per_min: f64) -> f64 {
        let rate = rate_mg_dl_per_min.clamp(RATE_UNIVERSE.0, RATE_UNIVERSE.1);
        let mut weighted = 0.0;
        let mut total = 0.0;
        for entry in &self.config.supervisor_weights {
            let mu = term_degree(&self.config.rate_terms, entry.term, rate);
            weighted += mu * entry.weight;
            total += mu;
        }
        if total > 0.0 {
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Layer 2: Mamdani dose adjustment (U/hr) via sampled centroid.
    ///
    /// min for AND, clipping for implication, max for aggregation. An empty
    /// aggregate defuzzifies to 0.
    pub fn dose_adjustment(&self, glucose_mg_dl: f64, rate_mg_dl_per_min: f64) -> f64 {
        let glucose = glucose_mg_dl.clamp(GLUCOSE_UNIVERSE.0, GLUCOSE_UNIVERSE.1);
        let rate = rate_mg_dl_per_min.clamp(RATE_UNIVERSE.0, RATE_UNIVERSE.1);

        let strengths: Vec<f64> = self
            .config
            .rules
            .iter()
            .map(|rule| {
                let g = term_degree(&self.config.glucose_terms, rule.glucose, glucose);
                let r = term_degree(&self.config.rate_terms, rule.rate, rate);
                g.min(r)
            })
            .collect();

        let (lo, hi) = self.config.dose_universe();
        let step = (hi - lo) / (DEFUZZ_SAMPLES - 1) as f64;
        let mut num = 0.0;
        let mut den = 0.0;
        for i in 0..DEFUZZ_SAMPLES {
            let z = lo + step * i as f64;
            let mut aggregate: f64 = 0.0;
            for (rule, &strength) in self.config.rules.iter().zip(strengths.iter()) {
                if strength <= 0.0 {
                    continue;
                }
                let clipped = strength.min(term_degree(&self.config.dose_terms, rule.dose, z));
                aggregate = aggregate.max(clipped);
            }
            num += z * aggregate;
            den += aggregate;
        }
        if den > 0.0 { num / den } else { 0.0 }
    }

    /// Current retained glucose history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }
}

impl Controller for HierarchicalFuzzyController {
    fn command(&mut self, tick: &ControlTick, profile: &PatientProfile) -> InsulinCommand {
        let glucose = tick.sample.value_mg_dl;
        if !glucose.is_finite() {
            // Sensor glitch: hold state and suspend delivery for this period.
            return InsulinCommand::zero(tick.t_min);
        }

        // Rate against the most recent retained reading; 0 on the first tick.
        let rate = match self.history.back() {
            Some(prev) if tick.dt_min > 0.0 => (glucose - prev) / tick.dt_min,
            _ => 0.0,
        };
        if self.history.len() == self.config.history_len {
            self.history.pop_front();
        }
        self.history.push_back(glucose);

        let urgency = self.urgency(rate);
        let adjustment = self.dose_adjustment(glucose, rate);
        let basal = self
            .config
            .limits
            .clamp_basal(profile.basal_u_per_hr + urgency * adjustment);
        InsulinCommand::new(tick.t_min, basal, 0.0)
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &'static str {
        "hierarchical-fuzzy"
    }
}
