//! QStash task model
//!
//! This module provides the record of an asynchronous job handed to the
//! QStash message queue: welcome emails, scheduled blog publication,
//! periodic cleanup and user notifications.
//!
//! # State Machine
//!
//! ```text
//! pending → processing → completed
//!                      → failed → pending (retry, while retryCount < max)
//! ```
//!
//! `result` is only ever set on a completed task and `error` only on a
//! failed one. The lifecycle methods below maintain that; records read from
//! elsewhere can be checked with [`QStashTask::check_invariants`].
//!
//! # Example
//!
//! ```
//! use hearth_shared::models::task::{QStashTask, TaskScheduleRequest, TaskStatus, TaskType};
//! use chrono::Utc;
//! use serde_json::json;
//!
//! let mut task = QStashTask::from_request(
//!     "user-1",
//!     TaskScheduleRequest {
//!         task_type: TaskType::WelcomeEmail,
//!         payload: json!({"email": "ada@example.com"}),
//!         scheduled_for: None,
//!     },
//! )
//! .unwrap();
//!
//! let now = Utc::now();
//! task.start(now).unwrap();
//! task.complete(json!({"sent": true}), now).unwrap();
//! assert_eq!(task.status, TaskStatus::Completed);
//! assert!(task.error.is_none());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult, ValidationErrorDetail};

/// Kind of job
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Send the welcome email to a new user
    WelcomeEmail,

    /// Publish a scheduled blog post
    ScheduledBlogPost,

    /// Purge expired invites and deleted records
    CleanupTask,

    /// Deliver a user notification
    Notification,
}

impl TaskType {
    /// Converts type to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::WelcomeEmail => "welcome_email",
            TaskType::ScheduledBlogPost => "scheduled_blog_post",
            TaskType::CleanupTask => "cleanup_task",
            TaskType::Notification => "notification",
        }
    }
}

/// Task execution status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting to be delivered by the queue
    Pending,

    /// Being handled by a worker
    Processing,

    /// Finished successfully
    Completed,

    /// Finished with an error
    Failed,
}

impl TaskStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            // Pending can only start
            (TaskStatus::Pending, TaskStatus::Processing) => true,

            // Processing finishes one way or the other
            (TaskStatus::Processing, TaskStatus::Completed) => true,
            (TaskStatus::Processing, TaskStatus::Failed) => true,

            // Failed tasks may be requeued
            (TaskStatus::Failed, TaskStatus::Pending) => true,

            _ => false,
        }
    }
}

/// Asynchronous job record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QStashTask {
    /// Opaque task ID
    pub id: String,

    /// Job kind
    #[serde(rename = "type")]
    pub task_type: TaskType,

    /// Job arguments (JSON object)
    pub payload: JsonValue,

    /// Earliest delivery time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,

    pub status: TaskStatus,

    /// Number of times the task was requeued after failing
    pub retry_count: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// User the task acts for
    pub user_id: String,

    /// Message ID assigned by QStash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qstash_message_id: Option<String>,

    /// Outcome (completed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,

    /// Failure reason (failed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Input for scheduling a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskScheduleRequest {
    #[serde(rename = "type")]
    pub task_type: TaskType,

    #[serde(default = "empty_payload")]
    pub payload: JsonValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
}

fn empty_payload() -> JsonValue {
    JsonValue::Object(Default::default())
}

impl TaskScheduleRequest {
    /// Payload must be a JSON object
    pub fn validate(&self) -> ModelResult<()> {
        if !self.payload.is_object() {
            return Err(ModelError::Validation(vec![ValidationErrorDetail {
                field: "payload".to_string(),
                message: "Payload must be a JSON object".to_string(),
            }]));
        }
        Ok(())
    }
}

impl QStashTask {
    /// Creates a pending task from a schedule request
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the payload is not an object
    pub fn from_request(
        user_id: impl Into<String>,
        request: TaskScheduleRequest,
    ) -> ModelResult<Self> {
        request.validate()?;

        let now = Utc::now();

        Ok(Self {
            id: crate::new_id(),
            task_type: request.task_type,
            payload: request.payload,
            scheduled_for: request.scheduled_for,
            status: TaskStatus::Pending,
            retry_count: 0,
            created_at: now,
            updated_at: now,
            user_id: user_id.into(),
            qstash_message_id: None,
            result: None,
            error: None,
        })
    }

    /// Records the message ID QStash assigned on publish
    pub fn attach_message_id(&mut self, message_id: impl Into<String>) {
        self.qstash_message_id = Some(message_id.into());
    }

    /// Pending and past its scheduled time (if any)
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending
            && self.scheduled_for.map(|at| at <= now).unwrap_or(true)
    }

    /// Checks the result/error fields against the status
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvariantViolation` describing the mismatch
    pub fn check_invariants(&self) -> ModelResult<()> {
        if self.result.is_some() && self.status != TaskStatus::Completed {
            return Err(ModelError::InvariantViolation {
                entity: "task",
                reason: format!("{} task carries a result", self.status.as_str()),
            });
        }

        if self.error.is_some() && self.status != TaskStatus::Failed {
            return Err(ModelError::InvariantViolation {
                entity: "task",
                reason: format!("{} task carries an error", self.status.as_str()),
            });
        }

        Ok(())
    }

    fn transition(&mut self, target: TaskStatus, now: DateTime<Utc>) -> ModelResult<()> {
        if !self.status.can_transition_to(target) {
            tracing::warn!(
                task_id = %self.id,
                task_type = self.task_type.as_str(),
                from = self.status.as_str(),
                to = target.as_str(),
                "Rejected task transition"
            );
            return Err(ModelError::InvalidTransition {
                entity: "task",
                from: self.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        tracing::debug!(
            task_id = %self.id,
            from = self.status.as_str(),
            to = target.as_str(),
            "Task transition"
        );

        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Marks the task as picked up by a worker
    pub fn start(&mut self, now: DateTime<Utc>) -> ModelResult<()> {
        self.transition(TaskStatus::Processing, now)
    }

    /// Marks the task completed with `result`
    pub fn complete(&mut self, result: JsonValue, now: DateTime<Utc>) -> ModelResult<()> {
        self.transition(TaskStatus::Completed, now)?;
        self.result = Some(result);
        self.error = None;
        Ok(())
    }

    /// Marks the task failed with `error`
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> ModelResult<()> {
        self.transition(TaskStatus::Failed, now)?;
        self.error = Some(error.into());
        self.result = None;
        Ok(())
    }

    /// Whether another retry is allowed under `max_retries`
    pub fn can_retry(&self, max_retries: i32) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < max_retries
    }

    /// Requeues a failed task, bumping `retryCount` and clearing the error
    ///
    /// # Errors
    ///
    /// - `ModelError::InvalidTransition` if the task has not failed
    /// - `ModelError::RetriesExhausted` once `retryCount` reaches `max_retries`
    pub fn retry(&mut self, max_retries: i32, now: DateTime<Utc>) -> ModelResult<()> {
        if self.status == TaskStatus::Failed && self.retry_count >= max_retries {
            tracing::warn!(
                task_id = %self.id,
                retry_count = self.retry_count,
                max_retries,
                "Task retries exhausted"
            );
            return Err(ModelError::RetriesExhausted {
                task_id: self.id.clone(),
                max_retries,
            });
        }

        self.transition(TaskStatus::Pending, now)?;
        self.retry_count += 1;
        self.error = None;
        Ok(())
    }
}

/// Aggregate task counts
///
/// `total` always equals the sum of the per-status counts for statistics
/// built with [`TaskStatistics::from_tasks`] or [`TaskStatistics::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl TaskStatistics {
    /// Counts tasks by status
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a QStashTask>,
    {
        let mut stats = Self::default();
        for task in tasks {
            stats.record(task.status);
        }
        stats
    }

    /// Adds one task in `status`
    pub fn record(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::Processing => self.processing += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Failed => self.failed += 1,
        }
    }

    /// Count for a single status
    pub fn count(&self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::Processing => self.processing,
            TaskStatus::Completed => self.completed,
            TaskStatus::Failed => self.failed,
        }
    }

    /// `total == pending + processing + completed + failed`
    ///
    /// Counts whose sum overflows `u64` are never consistent.
    pub fn is_consistent(&self) -> bool {
        self.pending
            .checked_add(self.processing)
            .and_then(|sum| sum.checked_add(self.completed))
            .and_then(|sum| sum.checked_add(self.failed))
            .map(|sum| sum == self.total)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_task() -> QStashTask {
        QStashTask::from_request(
            "user-1",
            TaskScheduleRequest {
                task_type: TaskType::Notification,
                payload: json!({"message": "hi"}),
                scheduled_for: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Processing.as_str(), "processing");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_task_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskType::ScheduledBlogPost).unwrap(),
            "\"scheduled_blog_post\""
        );
        assert_eq!(TaskType::CleanupTask.as_str(), "cleanup_task");
    }

    #[test]
    fn test_task_status_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Processing));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));

        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Failed));

        assert!(TaskStatus::Failed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Failed));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let result = QStashTask::from_request(
            "user-1",
            TaskScheduleRequest {
                task_type: TaskType::CleanupTask,
                payload: json!([1, 2, 3]),
                scheduled_for: None,
            },
        );
        assert!(matches!(result, Err(ModelError::Validation(_))));
    }

    #[test]
    fn test_missing_payload_defaults_to_object() {
        let request: TaskScheduleRequest =
            serde_json::from_str(r#"{"type":"cleanup_task"}"#).unwrap();
        assert!(request.payload.is_object());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_fail_sets_error_only() {
        let mut task = create_task();
        let now = Utc::now();
        task.start(now).unwrap();
        task.fail("smtp timeout", now).unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("smtp timeout"));
        assert!(task.result.is_none());
        assert!(task.check_invariants().is_ok());
    }

    #[test]
    fn test_retry_clears_error_and_counts() {
        let mut task = create_task();
        let now = Utc::now();

        for attempt in 1..=2 {
            task.start(now).unwrap();
            task.fail("boom", now).unwrap();
            task.retry(2, now).unwrap();
            assert_eq!(task.retry_count, attempt);
            assert!(task.error.is_none());
            assert_eq!(task.status, TaskStatus::Pending);
        }

        task.start(now).unwrap();
        task.fail("boom", now).unwrap();
        assert!(!task.can_retry(2));
        assert!(matches!(
            task.retry(2, now),
            Err(ModelError::RetriesExhausted { max_retries: 2, .. })
        ));
        assert_eq!(task.status, TaskStatus::Failed);
    }

    #[test]
    fn test_completed_cannot_fail() {
        let mut task = create_task();
        let now = Utc::now();
        task.start(now).unwrap();
        task.complete(json!({"sent": true}), now).unwrap();

        assert!(task.fail("late", now).is_err());
        assert!(task.error.is_none());
        assert!(task.retry(3, now).is_err());
    }

    #[test]
    fn test_scheduled_task_due() {
        let now = Utc::now();
        let mut task = create_task();
        task.scheduled_for = Some(now + chrono::Duration::minutes(5));

        assert!(!task.is_due(now));
        assert!(task.is_due(now + chrono::Duration::minutes(5)));
    }

    #[test]
    fn test_invariant_violation_detected() {
        let mut task = create_task();
        task.result = Some(json!({"sent": true}));
        assert!(task.check_invariants().is_err());

        task.result = None;
        task.error = Some("oops".to_string());
        assert!(task.check_invariants().is_err());
    }

    #[test]
    fn test_statistics() {
        let now = Utc::now();
        let mut done = create_task();
        done.start(now).unwrap();
        done.complete(json!({}), now).unwrap();

        let tasks = vec![create_task(), create_task(), done];
        let stats = TaskStatistics::from_tasks(&tasks);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.count(TaskStatus::Completed), 1);
        assert!(stats.is_consistent());

        let skewed = TaskStatistics { total: 5, ..stats };
        assert!(!skewed.is_consistent());
    }

    #[test]
    fn test_overflowing_statistics_are_inconsistent() {
        let stats: TaskStatistics = serde_json::from_value(json!({
            "total": 0,
            "pending": u64::MAX,
            "processing": 1,
            "completed": 0,
            "failed": 0
        }))
        .unwrap();
        assert!(!stats.is_consistent());

        let wrapped = TaskStatistics {
            total: u64::MAX,
            pending: u64::MAX,
            ..Default::default()
        };
        assert!(wrapped.is_consistent());
    }
}
