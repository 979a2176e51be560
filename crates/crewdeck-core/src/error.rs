//! Error taxonomy for mutations and transport.
//!
//! Failures split into three families:
//!
//! - **Validation**: the request referenced something the store does not
//!   hold, or would violate a uniqueness rule. Nothing was sent to the
//!   backend.
//! - **Transport**: the backend call itself failed or was rejected. The
//!   store is untouched.
//! - **Staleness** is deliberately *not* an error: a write that lands after
//!   its scope was revoked resolves to a discarded outcome, not an `Err`.

use std::fmt;

use crate::model::EntityKind;

/// A backend call failure. The in-memory state is never modified when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The backend could not be reached at all.
    #[error("backend unreachable: {0}")]
    Network(String),

    /// The backend answered but refused the operation.
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// Why a mutation did not apply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The mutation referenced an entity the store does not hold. Raised
    /// both for missing mutation targets and for invalid reference fields.
    #[error("{kind} '{id}' not found")]
    ReferenceNotFound {
        /// Collection the lookup ran against.
        kind: EntityKind,
        /// The id that failed to resolve.
        id: String,
    },

    /// Another member already uses this email address.
    #[error("email '{email}' is already in use")]
    DuplicateEmail { email: String },

    /// The backend call failed; see [`TransportError`].
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl MutationError {
    /// Convenience constructor for failed reference lookups.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            kind,
            id: id.into(),
        }
    }

    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ReferenceNotFound { .. } => ErrorCode::ReferenceNotFound,
            Self::DuplicateEmail { .. } => ErrorCode::DuplicateEmail,
            Self::Transport(TransportError::Network(_)) => ErrorCode::TransportNetwork,
            Self::Transport(TransportError::Rejected(_)) => ErrorCode::TransportRejected,
        }
    }
}

/// Machine-readable error codes for callers that branch on failure class
/// rather than message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ReferenceNotFound,
    DuplicateEmail,
    TransportNetwork,
    TransportRejected,
    StaleWriteDiscarded,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ReferenceNotFound => "E2001",
            Self::DuplicateEmail => "E2002",
            Self::TransportNetwork => "E3001",
            Self::TransportRejected => "E3002",
            Self::StaleWriteDiscarded => "E4001",
        }
    }

    /// Short human-facing summary for logs and notices.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ReferenceNotFound => "Referenced entity not found",
            Self::DuplicateEmail => "Email already in use",
            Self::TransportNetwork => "Backend unreachable",
            Self::TransportRejected => "Backend rejected the request",
            Self::StaleWriteDiscarded => "Stale write discarded",
        }
    }

    /// Optional remediation hint that can be surfaced alongside the message.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .crewdeck/config.toml and retry."),
            Self::ReferenceNotFound => Some("Refresh and retry against current data."),
            Self::DuplicateEmail => Some("Use a different email address."),
            Self::TransportNetwork => Some("Check connectivity and retry."),
            Self::TransportRejected => None,
            Self::StaleWriteDiscarded => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
