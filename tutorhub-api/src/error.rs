//! Domain error taxonomy for the booking core.
//!
//! ORM functions return these instead of raw Diesel errors so the API layer
//! can map each failure class to a status code without inspecting SQL
//! details. Validation and not-found failures are not retryable without new
//! input; `Database` failures may be transient.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    /// A required identifying field is missing or malformed on create.
    #[error("{0}")]
    Validation(String),

    /// The referenced record is absent at mutation time.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A debit would push the balance negative. Enforced at commit, not
    /// only at the UI's earlier can-afford check.
    #[error("insufficient token balance: have {balance}, need {required}")]
    InsufficientBalance { balance: i32, required: i32 },

    /// A booking request in a terminal state refused a further transition.
    #[error("booking request is already {status}")]
    TerminalStatus { status: String },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}
