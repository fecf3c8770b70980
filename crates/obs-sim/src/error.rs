use obs_core::{CoreError, ProcessId};
use obs_rvs::VariateError;
use thiserror::Error;

use crate::{FlowState, Wake};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("variate error: {0}")]
    Variate(#[from] VariateError),

    #[error("cannot schedule with negative or NaN delay {delay}")]
    InvalidDelay { delay: f64 },

    #[error("scheduler is closed; no further events can be scheduled")]
    InactiveScheduler,

    #[error("{process} released {unit} without holding it")]
    NotHolding { process: ProcessId, unit: String },

    #[error("{process} already holds or is queued for {unit}")]
    AlreadyRequested { process: ProcessId, unit: String },

    #[error("{0} is not in the process table")]
    UnknownProcess(ProcessId),

    #[error("{process} in state {state:?} cannot handle wake-up {wake:?}")]
    UnexpectedWake {
        process: ProcessId,
        state:   FlowState,
        wake:    Wake,
    },
}

pub type SimResult<T> = Result<T, SimError>;
