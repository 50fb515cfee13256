//! Error types for release domain validation.

use thiserror::Error;

/// Errors returned while constructing release domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReleaseDomainError {
    /// The ticket key is empty after trimming.
    #[error("ticket key must not be empty")]
    EmptyTicketKey,

    /// The project key is empty after trimming.
    #[error("project key must not be empty")]
    EmptyProjectKey,

    /// The workflow state identifier is empty after trimming.
    #[error("workflow state identifier must not be empty")]
    EmptyStateId,

    /// The version identifier is empty after trimming.
    #[error("version identifier must not be empty")]
    EmptyVersionId,

    /// No ticket prefix or explicit pattern was supplied.
    #[error("either ticket prefixes or a ticket pattern must be configured")]
    MissingTicketPattern,

    /// A ticket prefix is empty after trimming.
    #[error("ticket prefixes must not be empty")]
    EmptyTicketPrefix,

    /// A regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Offending pattern source.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// The network concurrency limit is zero.
    #[error("network concurrency must be greater than zero")]
    ZeroConcurrency,
}
