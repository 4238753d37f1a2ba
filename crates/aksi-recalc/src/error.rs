//! # Recalculation Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Recalculation Error Categories                       │
//! │                                                                         │
//! │  ┌─────────────────────────┐        ┌─────────────────────────────┐    │
//! │  │      RecalcError        │        │       ComputeError          │    │
//! │  │  (returned to caller)   │        │  (published with signature) │    │
//! │  │                         │        │                             │    │
//! │  │  InvalidConfig          │        │  Timeout                    │    │
//! │  │  ConfigLoadFailed       │        │  Unavailable                │    │
//! │  │  ConfigSaveFailed       │        │  Rejected                   │    │
//! │  │  SignatureFailed        │        │  Aborted                    │    │
//! │  │  ChannelError           │        │  Internal                   │    │
//! │  │  ShuttingDown           │        │                             │    │
//! │  └─────────────────────────┘        └─────────────────────────────┘    │
//! │                                                                         │
//! │  A ComputeError never escapes as a Result from the scheduler. It is    │
//! │  published next to the last good breakdown.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

/// Result type alias for scheduler and configuration operations.
pub type RecalcResult<T> = Result<T, RecalcError>;

/// Errors returned by the scheduler handle and the config loader.
#[derive(Debug, Error)]
pub enum RecalcError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scheduler configuration.
    #[error("Invalid recalculation configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Scheduler Errors
    // =========================================================================
    /// Cart could not be projected into a signature.
    #[error("Failed to derive input signature: {0}")]
    SignatureFailed(String),

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Scheduler no longer accepts input.
    #[error("Recalculation scheduler is shutting down")]
    ShuttingDown,
}

impl From<std::io::Error> for RecalcError {
    fn from(err: std::io::Error) -> Self {
        RecalcError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for RecalcError {
    fn from(err: toml::de::Error) -> Self {
        RecalcError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for RecalcError {
    fn from(err: toml::ser::Error) -> Self {
        RecalcError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for RecalcError {
    fn from(err: serde_json::Error) -> Self {
        RecalcError::SignatureFailed(err.to_string())
    }
}

impl RecalcError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RecalcError::InvalidConfig(_)
                | RecalcError::ConfigLoadFailed(_)
                | RecalcError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Compute Error
// =============================================================================

/// Failure of a single price computation.
///
/// `Clone` because the same failure is kept in the pricing view and sent to
/// every publication subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ComputeError {
    /// Engine did not answer within the configured compute timeout.
    #[error("Price computation timed out after {0} ms")]
    Timeout(u64),

    /// Delegated engine could not be reached.
    #[error("Pricing engine unavailable: {0}")]
    Unavailable(String),

    /// Delegated engine refused the cart.
    #[error("Pricing engine rejected the cart: {0}")]
    Rejected(String),

    /// Computation task panicked or was torn down.
    #[error("Price computation aborted: {0}")]
    Aborted(String),

    /// Any other engine failure.
    #[error("Price computation failed: {0}")]
    Internal(String),
}

impl ComputeError {
    /// Returns true if re-running the same input may succeed.
    ///
    /// ## Retryable Errors
    /// - Timeouts
    /// - Unreachable engine
    /// - Aborted tasks
    ///
    /// ## Non-Retryable Errors
    /// - The engine rejected this exact cart
    /// - Internal engine failures
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ComputeError::Timeout(_) | ComputeError::Unavailable(_) | ComputeError::Aborted(_)
        )
    }
}
