//! Response envelopes
//!
//! Every API-style response is wrapped in a success/data/error envelope:
//!
//! ```json
//! { "success": true, "data": { ... } }
//! { "success": false, "error": "Invite inv-1 has expired" }
//! ```
//!
//! The `success` flag discriminates the two shapes. On success `data` is
//! present; on failure `error` and/or `message` carry the reason.
//!
//! Envelopes implement `axum::response::IntoResponse`, so handlers can
//! return them directly. Successful envelopes map to 200. A failure built
//! from a [`ModelError`] keeps that error's status and hides the details of
//! server errors; a failure built by hand maps to 400.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::models::task::{QStashTask, TaskStatistics};

const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Errors from unwrapping an envelope
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The envelope reports failure
    #[error("Request failed: {0}")]
    Failed(String),

    /// The envelope reports success but carries no data
    #[error("Successful response carried no data")]
    MissingData,
}

/// Generic API response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Status of the originating error, if any
    #[serde(skip)]
    status: Option<StatusCode>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            status: None,
        }
    }

    /// Successful response carrying `data` and a message
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    /// Failed response
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            status: None,
        }
    }

    /// HTTP status the envelope is sent with
    pub fn http_status(&self) -> StatusCode {
        envelope_status(self.success, self.status)
    }

    /// Failure reason, preferring `error` over `message`
    pub fn failure_reason(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        self.error.as_deref().or(self.message.as_deref())
    }

    /// Unwraps the payload
    ///
    /// # Errors
    ///
    /// - `EnvelopeError::Failed` with the failure reason when `success` is false
    /// - `EnvelopeError::MissingData` when `success` is true but `data` is absent
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        if !self.success {
            let reason = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(EnvelopeError::Failed(reason));
        }

        self.data.ok_or(EnvelopeError::MissingData)
    }

    /// Checks the success flag agrees with the populated fields
    pub fn is_well_formed(&self) -> bool {
        envelope_is_well_formed(
            self.success,
            self.data.is_some(),
            self.error.is_some(),
            self.message.is_some(),
        )
    }

    /// Same check as [`ApiResponse::is_well_formed`], as a `ModelResult`
    pub fn check_invariants(&self) -> ModelResult<()> {
        if self.is_well_formed() {
            return Ok(());
        }

        let reason = if self.success {
            "successful response must carry data and no error"
        } else {
            "failed response must carry an error or message"
        };
        Err(ModelError::InvariantViolation {
            entity: "response",
            reason: reason.to_string(),
        })
    }

    /// Maps the payload, keeping the envelope fields
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            message: self.message,
            status: self.status,
        }
    }
}

fn envelope_is_well_formed(
    success: bool,
    has_payload: bool,
    has_error: bool,
    has_message: bool,
) -> bool {
    if success {
        has_payload && !has_error
    } else {
        has_error || has_message
    }
}

/// Status and client-facing message for a model error
///
/// Server errors are logged here and replaced with a generic message.
fn failure_parts(err: &ModelError) -> (StatusCode, String) {
    let status = err.status_code();

    if status.is_server_error() {
        tracing::error!(code = err.code(), "Internal error: {}", err);
        return (status, INTERNAL_ERROR_MESSAGE.to_string());
    }

    (status, err.to_string())
}

impl<T> From<ModelError> for ApiResponse<T> {
    fn from(err: ModelError) -> Self {
        let (status, message) = failure_parts(&err);
        Self {
            status: Some(status),
            ..Self::err(message)
        }
    }
}

impl<T> From<Result<T, ModelError>> for ApiResponse<T> {
    fn from(result: Result<T, ModelError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => err.into(),
        }
    }
}

/// Envelope returned by the QStash task endpoints
///
/// Same shape as [`ApiResponse`]; kept as its own type so task endpoints
/// can't be confused with general API responses in handler signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct QStashApiResponse<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip)]
    status: Option<StatusCode>,
}

impl<T> QStashApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse::ok(data).into()
    }

    pub fn err(error: impl Into<String>) -> Self {
        ApiResponse::err(error).into()
    }

    pub fn http_status(&self) -> StatusCode {
        envelope_status(self.success, self.status)
    }

    pub fn into_result(self) -> Result<T, EnvelopeError> {
        ApiResponse::from(self).into_result()
    }
}

impl<T> From<ApiResponse<T>> for QStashApiResponse<T> {
    fn from(r: ApiResponse<T>) -> Self {
        Self {
            success: r.success,
            data: r.data,
            error: r.error,
            message: r.message,
            status: r.status,
        }
    }
}

impl<T> From<QStashApiResponse<T>> for ApiResponse<T> {
    fn from(r: QStashApiResponse<T>) -> Self {
        Self {
            success: r.success,
            data: r.data,
            error: r.error,
            message: r.message,
            status: r.status,
        }
    }
}

impl<T> From<ModelError> for QStashApiResponse<T> {
    fn from(err: ModelError) -> Self {
        ApiResponse::from(err).into()
    }
}

/// Task list with statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<QStashTask>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<TaskStatistics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip)]
    status: Option<StatusCode>,
}

impl TasksResponse {
    /// Successful listing; statistics are computed from `tasks`
    pub fn ok(tasks: Vec<QStashTask>) -> Self {
        let statistics = TaskStatistics::from_tasks(&tasks);
        Self {
            success: true,
            tasks: Some(tasks),
            statistics: Some(statistics),
            error: None,
            message: None,
            status: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tasks: None,
            statistics: None,
            error: Some(error.into()),
            message: None,
            status: None,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        envelope_status(self.success, self.status)
    }

    pub fn is_well_formed(&self) -> bool {
        let stats_ok = self.statistics.map(|s| s.is_consistent()).unwrap_or(true);
        stats_ok
            && envelope_is_well_formed(
                self.success,
                self.tasks.is_some(),
                self.error.is_some(),
                self.message.is_some(),
            )
    }
}

impl From<ModelError> for TasksResponse {
    fn from(err: ModelError) -> Self {
        let (status, message) = failure_parts(&err);
        Self {
            status: Some(status),
            ..Self::err(message)
        }
    }
}

/// Single task response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<QStashTask>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip)]
    status: Option<StatusCode>,
}

impl TaskResponse {
    pub fn ok(task: QStashTask) -> Self {
        Self {
            success: true,
            task: Some(task),
            error: None,
            message: None,
            status: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            task: None,
            error: Some(error.into()),
            message: None,
            status: None,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        envelope_status(self.success, self.status)
    }

    pub fn is_well_formed(&self) -> bool {
        envelope_is_well_formed(
            self.success,
            self.task.is_some(),
            self.error.is_some(),
            self.message.is_some(),
        )
    }
}

impl From<ModelError> for TaskResponse {
    fn from(err: ModelError) -> Self {
        let (status, message) = failure_parts(&err);
        Self {
            status: Some(status),
            ..Self::err(message)
        }
    }
}

fn envelope_status(success: bool, status: Option<StatusCode>) -> StatusCode {
    match (success, status) {
        (true, _) => StatusCode::OK,
        (false, Some(status)) => status,
        (false, None) => StatusCode::BAD_REQUEST,
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for QStashApiResponse<T> {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}

impl IntoResponse for TasksResponse {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}

impl IntoResponse for TaskResponse {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}

/// Model errors become failure envelopes with the error's own status
impl IntoResponse for ModelError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}
