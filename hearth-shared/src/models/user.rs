//! User model
//!
//! This module provides the User record, its platform-wide role and UI
//! preferences. Users own accounts and join others through `AccountMember`.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "id": "7d5c...",
//!   "email": "ada@example.com",
//!   "username": "ada",
//!   "firstName": "Ada",
//!   "lastName": "Lovelace",
//!   "name": "Ada Lovelace",
//!   "role": "super-admin",
//!   "createdAt": "2025-01-03T12:00:00Z",
//!   "preferences": { "menuLayout": "sidebar" }
//! }
//! ```
//!
//! `name` is kept for older clients. It is stored alongside the name parts,
//! not computed on read; see [`User::has_consistent_name`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{validate_input, ModelResult};

/// Platform-wide user role
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    /// Regular user
    #[default]
    User,

    /// Platform administrator
    Admin,

    /// Administrator who can also manage other administrators
    SuperAdmin,
}

impl UserRole {
    /// Converts role to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super-admin",
        }
    }

    /// Parses role from its wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            "super-admin" => Some(UserRole::SuperAdmin),
            _ => None,
        }
    }

    /// Admin or super-admin
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }

    /// Whether a user with this role may change another user's role to `target`
    ///
    /// Only super-admins can grant or revoke admin rights.
    pub fn can_assign(&self, target: UserRole) -> bool {
        match self {
            UserRole::SuperAdmin => true,
            UserRole::Admin => target == UserRole::User,
            UserRole::User => false,
        }
    }
}

/// Navigation layout chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuLayout {
    #[default]
    Sidebar,
    Header,
}

/// UI preferences stored with the user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub menu_layout: MenuLayout,
}

/// User record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque user ID
    pub id: String,

    /// Email address
    pub email: String,

    /// Unique handle
    pub username: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Legacy full name (first + last), stored redundantly
    pub name: String,

    /// Platform role
    pub role: UserRole,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// Optional UI preferences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(length(min = 1, max = 255))]
    pub first_name: String,

    #[validate(length(min = 1, max = 255))]
    pub last_name: String,

    /// Role to assign (defaults to `user`)
    #[serde(default)]
    pub role: UserRole,

    #[serde(default)]
    pub preferences: Option<UserPreferences>,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,

    pub preferences: Option<UserPreferences>,
}

/// Joins name parts the way the legacy `name` field was built
pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_string()
}

impl User {
    /// Builds a new user with a fresh ID and creation time
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the input fails validation
    pub fn new(data: CreateUser) -> ModelResult<Self> {
        validate_input(&data)?;

        let name = full_name(&data.first_name, &data.last_name);

        Ok(Self {
            id: crate::new_id(),
            email: data.email,
            username: data.username,
            first_name: data.first_name,
            last_name: data.last_name,
            name,
            role: data.role,
            created_at: Utc::now(),
            preferences: data.preferences,
        })
    }

    /// Full name derived from the name parts
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    /// Whether the stored legacy `name` matches the name parts
    pub fn has_consistent_name(&self) -> bool {
        self.name == self.full_name()
    }

    /// Effective menu layout (sidebar unless the user chose otherwise)
    pub fn menu_layout(&self) -> MenuLayout {
        self.preferences
            .as_ref()
            .map(|p| p.menu_layout)
            .unwrap_or_default()
    }

    /// Applies an update, re-deriving `name` when a name part changes
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the update fails validation
    pub fn apply_update(&mut self, data: UpdateUser) -> ModelResult<()> {
        validate_input(&data)?;

        let renamed = data.first_name.is_some() || data.last_name.is_some();

        if let Some(email) = data.email {
            self.email = email;
        }
        if let Some(username) = data.username {
            self.username = username;
        }
        if let Some(first_name) = data.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = data.last_name {
            self.last_name = last_name;
        }
        if let Some(preferences) = data.preferences {
            self.preferences = Some(preferences);
        }

        if renamed {
            self.name = self.full_name();
        }

        Ok(())
    }
}
