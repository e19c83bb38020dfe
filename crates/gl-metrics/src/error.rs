use thiserror::Error;

/// Errors from metric computation.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("cannot score an empty trace")]
    EmptyTrace,

    #[error("non-finite value in {what}")]
    NonFinite { what: &'static str },
}

pub type MetricsResult<T> = Result<T, MetricsError>;
