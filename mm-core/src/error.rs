//! Error types for the agent control core.
//!
//! Internal, recoverable failures are modeled as [`AgentError`] variants so the
//! orchestrator's tick boundary (see [`crate::orchestrator`]) can match on them
//! and decide whether to skip, back off, or exit. Anything that crosses a
//! process boundary (CLI args, config files) uses `anyhow` instead, matching
//! the split the teacher codebase draws between domain errors and boundary
//! errors.

use thiserror::Error;

/// Errors surfaced by the control core's interaction with the exchange and
/// with its own invariants.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The exchange adapter returned a transport-level failure (timeout,
    /// connection reset, non-2xx status, malformed payload).
    #[error("exchange adapter error: {0}")]
    Adapter(String),

    /// `create_order` returned a non-zero response code.
    #[error("order rejected (code {code}): {message}")]
    OrderRejected { code: i64, message: String },

    /// A market-data field required for a tick was missing or non-positive.
    #[error("market data gap: {0}")]
    MarketDataGap(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Everything else, preserved with its source for logging.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
