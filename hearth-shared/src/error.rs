//! Error types for the Hearth data model
//!
//! Every fallible operation on a record (lifecycle transitions, invariant
//! checks, input validation) returns `ModelResult<T>`. Errors carry a stable
//! machine-readable code and an HTTP status so the response envelopes can
//! report them without further mapping.
//!
//! # Example
//!
//! ```
//! use hearth_shared::error::{ModelError, ModelResult};
//!
//! fn check(count: usize) -> ModelResult<()> {
//!     if count > 10 {
//!         return Err(ModelError::InvariantViolation {
//!             entity: "account",
//!             reason: "too many members".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(check(11).unwrap_err().code(), "invariant_violation");
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Unified model error type
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A lifecycle transition not allowed by the record's state machine
    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Invite was answered after its expiry time
    #[error("Invite {0} has expired")]
    InviteExpired(String),

    /// A record holds a combination of fields that must never coexist
    #[error("Invariant violated on {entity}: {reason}")]
    InvariantViolation { entity: &'static str, reason: String },

    /// Two membership rows share the same (user, account) pair
    #[error("Duplicate membership for user {user_id} in account {account_id}")]
    DuplicateMembership { user_id: String, account_id: String },

    /// Account already holds the maximum number of members for its type
    #[error("Account {account_id} is full ({max_members} members)")]
    MemberLimitReached { account_id: String, max_members: u32 },

    /// Failed task has used up its retries
    #[error("Task {task_id} exhausted its {max_retries} retries")]
    RetriesExhausted { task_id: String, max_retries: i32 },

    /// Account settings do not allow invitations
    #[error("Invites are disabled for account {0}")]
    InvitesDisabled(String),

    /// Input failed field validation
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<ValidationErrorDetail>),

    /// Malformed JSON payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Stable error code (e.g., "invalid_transition", "validation_error")
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::InvalidTransition { .. } => "invalid_transition",
            ModelError::InviteExpired(_) => "invite_expired",
            ModelError::InvariantViolation { .. } => "invariant_violation",
            ModelError::DuplicateMembership { .. } => "duplicate_membership",
            ModelError::MemberLimitReached { .. } => "member_limit_reached",
            ModelError::RetriesExhausted { .. } => "retries_exhausted",
            ModelError::InvitesDisabled(_) => "invites_disabled",
            ModelError::Validation(_) => "validation_error",
            ModelError::Json(_) => "bad_request",
        }
    }

    /// HTTP status the error maps to when returned from an API handler
    pub fn status_code(&self) -> StatusCode {
        match self {
            ModelError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ModelError::InviteExpired(_) => StatusCode::GONE,
            ModelError::InvariantViolation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ModelError::DuplicateMembership { .. } => StatusCode::CONFLICT,
            ModelError::MemberLimitReached { .. } => StatusCode::FORBIDDEN,
            ModelError::RetriesExhausted { .. } => StatusCode::CONFLICT,
            ModelError::InvitesDisabled(_) => StatusCode::FORBIDDEN,
            ModelError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ModelError::Json(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Validation details, if this is a validation error
    pub fn details(&self) -> Option<&[ValidationErrorDetail]> {
        match self {
            ModelError::Validation(details) => Some(details),
            _ => None,
        }
    }
}

/// Flattens `validator` errors into field/message pairs, sorted by field
impl From<validator::ValidationErrors> for ModelError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| ValidationErrorDetail {
                    field: field.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ModelError::Validation(details)
    }
}

/// Runs `validator` checks on an input and converts failures to `ModelError`
pub fn validate_input<T: validator::Validate>(input: &T) -> ModelResult<()> {
    input.validate().map_err(ModelError::from)
}
