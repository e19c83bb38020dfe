//! CGM sensor model: additive Gaussian noise on the true glucose.

use crate::error::{PatientError, PatientResult};
use gl_core::GlucoseSample;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Default measurement noise (mg/dL).
pub const DEFAULT_NOISE_SD: f64 = 2.0;

/// Continuous glucose monitor with zero-mean Gaussian noise.
///
/// `noise_sd_mg_dl = 0` gives a noiseless sensor that draws nothing from
/// the rng, so noiseless runs stay bit-identical regardless of seed.
#[derive(Debug, Clone)]
pub struct CgmSensor {
    noise_sd_mg_dl: f64,
    noise: Option<Normal<f64>>,
}

impl CgmSensor {
    /// Build a sensor with the given noise standard deviation.
    pub fn new(noise_sd_mg_dl: f64) -> PatientResult<Self> {
        if !(noise_sd_mg_dl.is_finite() && noise_sd_mg_dl >= 0.0) {
            return Err(PatientError::InvalidSensor {
                what: "noise_sd_mg_dl must be finite and non-negative",
            });
        }
        let noise = if noise_sd_mg_dl > 0.0 {
            match Normal::new(0.0, noise_sd_mg_dl) {
                Ok(normal) => Some(normal),
                Err(_) => {
                    return Err(PatientError::InvalidSensor {
                        what: "noise_sd_mg_dl rejected by the normal distribution",
                    });
                }
            }
        } else {
            None
        };
        Ok(Self {
            noise_sd_mg_dl,
            noise,
        })
    }

    /// Configured noise standard deviation (mg/dL).
    pub fn noise_sd_mg_dl(&self) -> f64 {
        self.noise_sd_mg_dl
    }

    /// Observe the true glucose, producing a Sensor-source sample.
    ///
    /// Readings are clamped at zero; a noisy draw can never go negative.
    pub fn observe(&self, t_min: f64, truth_mg_dl: f64, rng: &mut StdRng) -> GlucoseSample {
        let value = match &self.noise {
            Some(normal) => truth_mg_dl + normal.sample(rng),
            None => truth_mg_dl,
        };
        GlucoseSample::sensor(t_min, value)
    }
}

impl Default for CgmSensor {
    fn default() -> Self {
        Self {
            noise_sd_mg_dl: DEFAULT_NOISE_SD,
            // 2.0 is finite and positive, so the distribution always builds.
            noise: Normal::new(0.0, DEFAULT_NOISE_SD).ok(),
        }
    }
}
