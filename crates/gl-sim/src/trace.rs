//! Time-ordered records of closed-loop patient runs.

use crate::error::{SimError, SimResult};
use gl_core::{GlucoseSample, InsulinCommand};
use serde::{Deserialize, Serialize};

/// Append-only record of one closed-loop patient run.
///
/// `samples[k]` is the reading observed at the end of period k and
/// `commands[k]` the command applied across that period. Sample times are
/// strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Sampling period (minutes).
    pub dt_min: f64,
    /// Tick count the schedule called for.
    pub expected_ticks: usize,
    /// One glucose sample per completed tick.
    pub samples: Vec<GlucoseSample>,
    /// Command applied over each period.
    pub commands: Vec<InsulinCommand>,
}

impl Trace {
    /// Empty trace for a schedule of `expected_ticks` periods of `dt_min`.
    pub fn new(dt_min: f64, expected_ticks: usize) -> Self {
        Self {
            dt_min,
            expected_ticks,
            samples: Vec::with_capacity(expected_ticks),
            commands: Vec::with_capacity(expected_ticks),
        }
    }

    /// Append one tick. Sample times must be strictly increasing.
    pub fn push(&mut self, sample: GlucoseSample, command: InsulinCommand) -> SimResult<()> {
        if let Some(last) = self.samples.last() {
            if sample.t_min <= last.t_min {
                return Err(SimError::InvalidArg {
                    what: "trace sample times must be strictly increasing",
                });
            }
        }
        self.samples.push(sample);
        self.commands.push(command);
        Ok(())
    }

    /// Number of recorded ticks.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fraction of the schedule actually recorded.
    pub fn coverage(&self) -> f64 {
        if self.expected_ticks == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.expected_ticks as f64
        }
    }

    /// Total insulin delivered across the recorded periods (U).
    pub fn total_insulin_u(&self) -> f64 {
        self.commands
            .iter()
            .map(|cmd| cmd.total_units(self.dt_min))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_enforces_time_order() {
        let mut trace = Trace::new(5.0, 10);
        trace
            .push(
                GlucoseSample::sensor(5.0, 110.0),
                InsulinCommand::zero(0.0),
            )
            .unwrap();
        let backwards = trace.push(
            GlucoseSample::sensor(5.0, 111.0),
            InsulinCommand::zero(5.0),
        );
        assert!(backwards.is_err());
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn coverage_reflects_partial_runs() {
        let mut trace = Trace::new(5.0, 4);
        for k in 0..2 {
            trace
                .push(
                    GlucoseSample::sensor((k + 1) as f64 * 5.0, 110.0),
                    InsulinCommand::zero(k as f64 * 5.0),
                )
                .unwrap();
        }
        assert!((trace.coverage() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn total_insulin_sums_basal_and_bolus() {
        let mut trace = Trace::new(30.0, 2);
        trace
            .push(
                GlucoseSample::sensor(30.0, 110.0),
                InsulinCommand::new(0.0, 2.0, 0.0),
            )
            .unwrap();
        trace
            .push(
                GlucoseSample::sensor(60.0, 110.0),
                InsulinCommand::new(30.0, 2.0, 1.5),
            )
            .unwrap();
        // 2 U/hr over two 30-minute periods = 2 U, plus the 1.5 U bolus.
        assert!((trace.total_insulin_u() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn empty_trace_has_zero_coverage() {
        let trace = Trace::new(5.0, 0);
        assert!(trace.is_empty());
        assert_eq!(trace.coverage(), 0.0);
    }
}
