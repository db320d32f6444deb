//! Blog post model
//!
//! # State Machine
//!
//! ```text
//! draft → scheduled → published
//!   │         │
//!   │         └─→ draft (unschedule)
//!   └───────────────→ published
//! ```
//!
//! `scheduledFor` is set exactly when the post is scheduled. A scheduled
//! post whose time has come is published by the `scheduled_blog_post` task
//! (see [`crate::models::task::TaskType`]).
//!
//! Posts from older clients carry neither `status` nor `isPublic`; they are
//! read as published and public.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{validate_input, ModelError, ModelResult};

/// Publication status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "blog_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    Draft,
    Scheduled,
    Published,
}

impl BlogStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "draft",
            BlogStatus::Scheduled => "scheduled",
            BlogStatus::Published => "published",
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: BlogStatus) -> bool {
        matches!(
            (self, target),
            (BlogStatus::Draft, BlogStatus::Scheduled)
                | (BlogStatus::Draft, BlogStatus::Published)
                | (BlogStatus::Scheduled, BlogStatus::Scheduled)
                | (BlogStatus::Scheduled, BlogStatus::Published)
                | (BlogStatus::Scheduled, BlogStatus::Draft)
        )
    }
}

fn default_status() -> BlogStatus {
    BlogStatus::Published
}

fn default_public() -> bool {
    true
}

/// Blog post record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Opaque post ID
    pub id: String,

    /// Unique URL key
    pub slug: String,

    pub title: String,

    /// Display name of the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Publication date (creation date while still a draft)
    pub published_date: DateTime<Utc>,

    pub summary: String,

    /// Markdown body
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default = "default_status")]
    pub status: BlogStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,

    #[serde(default = "default_public")]
    pub is_public: bool,
}

/// Input for creating a post
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPost {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    /// URL key (derived from the title if omitted)
    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub author_id: Option<String>,

    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub summary: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,

    #[serde(default = "default_public")]
    pub is_public: bool,
}

/// Input for updating a post
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPost {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub slug: Option<String>,

    #[validate(length(max = 500))]
    pub summary: Option<String>,

    pub content: Option<String>,

    pub tags: Option<Vec<String>>,

    #[validate(url)]
    pub image_url: Option<String>,

    pub is_public: Option<bool>,
}

/// Accepts lowercase alphanumeric words joined by single hyphens
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug.len() <= 128
        && slug.split('-').all(|word| {
            !word.is_empty()
                && word
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug"))
    }
}

/// Derives a slug from a title ("Hello, World!" → "hello-world")
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn slug_error(slug: &str) -> ModelError {
    ModelError::Validation(vec![crate::error::ValidationErrorDetail {
        field: "slug".to_string(),
        message: format!("'{}' is not a valid slug", slug),
    }])
}

impl BlogPost {
    /// Builds a draft post
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the input fails validation or the
    /// slug (given or derived) is invalid
    pub fn new(data: CreateBlogPost) -> ModelResult<Self> {
        validate_input(&data)?;

        let slug = data.slug.unwrap_or_else(|| slugify(&data.title));
        if validate_slug(&slug).is_err() {
            return Err(slug_error(&slug));
        }

        Ok(Self {
            id: crate::new_id(),
            slug,
            title: data.title,
            author: data.author,
            author_id: data.author_id,
            account_id: data.account_id,
            published_date: Utc::now(),
            summary: data.summary,
            content: data.content,
            tags: data.tags,
            image_url: data.image_url,
            status: BlogStatus::Draft,
            scheduled_for: None,
            is_public: data.is_public,
        })
    }

    /// Checks `scheduledFor` is present exactly when scheduled
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvariantViolation` describing the mismatch
    pub fn check_invariants(&self) -> ModelResult<()> {
        match (self.status, self.scheduled_for.is_some()) {
            (BlogStatus::Scheduled, false) => Err(ModelError::InvariantViolation {
                entity: "blog post",
                reason: "scheduled post without scheduledFor".to_string(),
            }),
            (BlogStatus::Draft | BlogStatus::Published, true) => {
                Err(ModelError::InvariantViolation {
                    entity: "blog post",
                    reason: format!("{} post with scheduledFor", self.status.as_str()),
                })
            }
            _ => Ok(()),
        }
    }

    fn transition(&mut self, target: BlogStatus) -> ModelResult<()> {
        if !self.status.can_transition_to(target) {
            tracing::warn!(
                post_id = %self.id,
                from = self.status.as_str(),
                to = target.as_str(),
                "Rejected blog post transition"
            );
            return Err(ModelError::InvalidTransition {
                entity: "blog post",
                from: self.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        self.status = target;
        Ok(())
    }

    /// Schedules publication at `at`
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` if `at` is not after `now`
    /// - `ModelError::InvalidTransition` if already published
    pub fn schedule(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> ModelResult<()> {
        if at <= now {
            return Err(ModelError::Validation(vec![
                crate::error::ValidationErrorDetail {
                    field: "scheduledFor".to_string(),
                    message: "Scheduled time must be in the future".to_string(),
                },
            ]));
        }

        self.transition(BlogStatus::Scheduled)?;
        self.scheduled_for = Some(at);
        tracing::debug!(post_id = %self.id, scheduled_for = %at, "Blog post scheduled");
        Ok(())
    }

    /// Returns a scheduled post to draft
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTransition` unless scheduled
    pub fn unschedule(&mut self) -> ModelResult<()> {
        self.transition(BlogStatus::Draft)?;
        self.scheduled_for = None;
        Ok(())
    }

    /// Publishes the post, stamping `publishedDate` with `now`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTransition` if already published
    pub fn publish(&mut self, now: DateTime<Utc>) -> ModelResult<()> {
        self.transition(BlogStatus::Published)?;
        self.scheduled_for = None;
        self.published_date = now;
        tracing::debug!(post_id = %self.id, slug = %self.slug, "Blog post published");
        Ok(())
    }

    /// Scheduled and its time has come
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == BlogStatus::Scheduled
            && self.scheduled_for.map(|at| at <= now).unwrap_or(false)
    }

    /// Visible to anonymous readers
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_public && self.status == BlogStatus::Published && self.published_date <= now
    }

    /// Applies an update
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the update or new slug is invalid
    pub fn apply_update(&mut self, data: UpdateBlogPost) -> ModelResult<()> {
        validate_input(&data)?;

        if let Some(slug) = data.slug {
            if validate_slug(&slug).is_err() {
                return Err(slug_error(&slug));
            }
            self.slug = slug;
        }
        if let Some(title) = data.title {
            self.title = title;
        }
        if let Some(summary) = data.summary {
            self.summary = summary;
        }
        if let Some(content) = data.content {
            self.content = content;
        }
        if let Some(tags) = data.tags {
            self.tags = Some(tags);
        }
        if let Some(image_url) = data.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(is_public) = data.is_public {
            self.is_public = is_public;
        }

        Ok(())
    }
}
