use thiserror::Error;

/// Error taxonomy shared by the loader, feature engines, models and agents.
///
/// Mirrors the propagation policy in the pipeline design: loader errors
/// become data-quality flags, model errors become `NO_SIGNAL`s, agent
/// errors become stub reports. Only `InvariantViolation` and
/// `JournalWriteConflict` are fatal and are allowed to abort a run.
#[derive(Error, Debug)]
pub enum MacroError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("insufficient predictors: {0}")]
    InsufficientPredictors(String),

    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("agent '{agent_id}' timed out after {budget_secs}s")]
    AgentTimeout { agent_id: String, budget_secs: u64 },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("journal write conflict: {0}")]
    JournalWriteConflict(String),
}

pub type MacroResult<T> = Result<T, MacroError>;
