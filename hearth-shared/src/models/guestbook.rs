//! Guestbook entries
//!
//! Entries are append-only: there is no update or delete input type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{validate_input, ModelResult};

/// A signed guestbook line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GuestbookEntry {
    pub name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Input for signing the guestbook
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewGuestbookEntry {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

impl GuestbookEntry {
    /// Builds an entry stamped with the current time
    ///
    /// Surrounding whitespace is trimmed before validation.
    pub fn new(data: NewGuestbookEntry) -> ModelResult<Self> {
        let data = NewGuestbookEntry {
            name: data.name.trim().to_string(),
            message: data.message.trim().to_string(),
        };
        validate_input(&data)?;

        Ok(Self {
            name: data.name,
            message: data.message,
            timestamp: Utc::now(),
        })
    }
}
