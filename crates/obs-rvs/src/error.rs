use thiserror::Error;

#[derive(Debug, Error)]
pub enum VariateError {
    #[error("rate must be a positive real, got {0}")]
    InvalidRate(f64),

    #[error("mean must be a positive real, got {0}")]
    InvalidMean(f64),

    #[error("erlang distribution needs at least one stage")]
    ZeroStages,

    #[error("distribution error: {0}")]
    Distribution(String),
}

pub type VariateResult<T> = Result<T, VariateError>;
