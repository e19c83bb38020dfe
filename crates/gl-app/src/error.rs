//! Error types for the gl-app service layer.

/// Application error wrapping every backend crate's error behind one
/// interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {what}")]
    Scenario { what: String },

    #[error("Control error: {0}")]
    Control(#[from] gl_controls::ControlError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] gl_sim::SimError),

    #[error("Patient error: {0}")]
    Patient(#[from] gl_patient::PatientError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] gl_metrics::MetricsError),

    #[error("Results error: {0}")]
    Results(#[from] gl_results::ResultsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AppError {
    pub(crate) fn scenario(what: impl Into<String>) -> Self {
        AppError::Scenario { what: what.into() }
    }
}

/// Result type for gl-app operations.
pub type AppResult<T> = Result<T, AppError>;
