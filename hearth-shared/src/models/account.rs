//! Account model
//!
//! This module provides the Account record, the grouping entity that owns
//! notes and blog posts and that users join through memberships. Every
//! account has a tier (`type`) whose static descriptor caps the number of
//! members and lists the features available.
//!
//! # Tiers
//!
//! | type       | maxMembers | features                                   |
//! |------------|------------|--------------------------------------------|
//! | personal   | 1          | notes, blog                                |
//! | family     | 6          | + shared_notes, invites                    |
//! | team       | 25         | + roles, audit_log                         |
//! | enterprise | 500        | + scheduled_posts, sso, priority_support   |
//!
//! # Read-time enrichment
//!
//! Accounts returned to a particular viewer carry `typeInfo`, `userRole`
//! and `roleInfo`; see [`Account::with_viewer_context`]. These fields are
//! never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{validate_input, ModelError, ModelResult};
use crate::models::membership::{AccountMemberRole, MemberRole};

/// Feature flags granted by account tiers
pub mod features {
    pub const NOTES: &str = "notes";
    pub const BLOG: &str = "blog";
    pub const SHARED_NOTES: &str = "shared_notes";
    pub const INVITES: &str = "invites";
    pub const ROLES: &str = "roles";
    pub const AUDIT_LOG: &str = "audit_log";
    pub const SCHEDULED_POSTS: &str = "scheduled_posts";
    pub const SSO: &str = "sso";
    pub const PRIORITY_SUPPORT: &str = "priority_support";
}

/// Account tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountTypeName {
    /// Single-user account
    #[default]
    Personal,

    /// Small shared household account
    Family,

    /// Team account with roles
    Team,

    /// Large organization account
    Enterprise,
}

impl AccountTypeName {
    /// Converts tier to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountTypeName::Personal => "personal",
            AccountTypeName::Family => "family",
            AccountTypeName::Team => "team",
            AccountTypeName::Enterprise => "enterprise",
        }
    }

    /// Parses tier from its wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(AccountTypeName::Personal),
            "family" => Some(AccountTypeName::Family),
            "team" => Some(AccountTypeName::Team),
            "enterprise" => Some(AccountTypeName::Enterprise),
            _ => None,
        }
    }

    /// Maximum number of members, owner included
    pub fn max_members(&self) -> u32 {
        match self {
            AccountTypeName::Personal => 1,
            AccountTypeName::Family => 6,
            AccountTypeName::Team => 25,
            AccountTypeName::Enterprise => 500,
        }
    }

    /// Static descriptor for this tier
    pub fn descriptor(&self) -> AccountType {
        use features::*;

        let granted: &[&str] = match self {
            AccountTypeName::Personal => &[NOTES, BLOG],
            AccountTypeName::Family => &[NOTES, BLOG, SHARED_NOTES, INVITES],
            AccountTypeName::Team => &[NOTES, BLOG, SHARED_NOTES, INVITES, ROLES, AUDIT_LOG],
            AccountTypeName::Enterprise => &[
                NOTES,
                BLOG,
                SHARED_NOTES,
                INVITES,
                ROLES,
                AUDIT_LOG,
                SCHEDULED_POSTS,
                SSO,
                PRIORITY_SUPPORT,
            ],
        };

        AccountType {
            name: *self,
            max_members: self.max_members(),
            features: granted.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Static descriptor of an account tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountType {
    /// Tier name
    pub name: AccountTypeName,

    /// Member cap
    pub max_members: u32,

    /// Feature flags
    pub features: Vec<String>,
}

impl AccountType {
    /// Whether the tier includes `feature`
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Per-account settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
    /// Whether members may invite others
    pub allow_invites: bool,

    /// Role given to members joining through an invite without one
    pub default_member_role: AccountMemberRole,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            allow_invites: true,
            default_member_role: AccountMemberRole::Viewer,
        }
    }
}

/// Account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Opaque account ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Tier
    #[serde(rename = "type")]
    pub account_type: AccountTypeName,

    /// Free-form description
    pub description: String,

    /// Owning user
    pub owner_id: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// Account settings (JSONB column)
    #[sqlx(json)]
    pub settings: AccountSettings,

    /// Tier descriptor (read-time enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub type_info: Option<AccountType>,

    /// Viewer's role in this account (read-time enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub user_role: Option<AccountMemberRole>,

    /// Viewer's role descriptor (read-time enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub role_info: Option<MemberRole>,
}

/// Input for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Tier (defaults to personal)
    #[serde(default, rename = "type")]
    pub account_type: AccountTypeName,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,

    #[serde(default)]
    pub settings: Option<AccountSettings>,
}

/// Input for updating an existing account
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub account_type: Option<AccountTypeName>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub settings: Option<AccountSettings>,
}

impl Account {
    /// Builds a new account owned by `owner_id`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the input fails validation
    pub fn new(owner_id: impl Into<String>, data: CreateAccount) -> ModelResult<Self> {
        validate_input(&data)?;

        let now = Utc::now();

        Ok(Self {
            id: crate::new_id(),
            name: data.name,
            account_type: data.account_type,
            description: data.description,
            owner_id: owner_id.into(),
            created_at: now,
            updated_at: now,
            settings: data.settings.unwrap_or_default(),
            type_info: None,
            user_role: None,
            role_info: None,
        })
    }

    /// Tier descriptor for this account
    pub fn type_descriptor(&self) -> AccountType {
        self.account_type.descriptor()
    }

    /// Whether `user_id` owns the account
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Fills the read-time enrichment for a viewer holding `role`
    pub fn with_viewer_context(mut self, role: Option<AccountMemberRole>) -> Self {
        self.type_info = Some(self.account_type.descriptor());
        self.user_role = role;
        self.role_info = role.map(|r| r.descriptor());
        self
    }

    /// Drops read-time enrichment before storing
    pub fn without_viewer_context(mut self) -> Self {
        self.type_info = None;
        self.user_role = None;
        self.role_info = None;
        self
    }

    /// Checks that one more member fits under the tier's cap
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MemberLimitReached` if `current_count` is at the cap
    pub fn can_accept_member(&self, current_count: u32) -> ModelResult<()> {
        let max_members = self.account_type.max_members();

        if current_count >= max_members {
            tracing::warn!(
                account_id = %self.id,
                current_count,
                max_members,
                "Account member limit reached"
            );
            return Err(ModelError::MemberLimitReached {
                account_id: self.id.clone(),
                max_members,
            });
        }

        Ok(())
    }

    /// Checks that the account accepts invitations
    ///
    /// Requires both the `allowInvites` setting and a tier with more than
    /// one seat.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvitesDisabled` otherwise
    pub fn can_invite(&self) -> ModelResult<()> {
        if !self.settings.allow_invites || self.account_type.max_members() <= 1 {
            return Err(ModelError::InvitesDisabled(self.id.clone()));
        }

        Ok(())
    }

    /// Applies an update and bumps `updatedAt`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the update fails validation
    pub fn apply_update(&mut self, data: UpdateAccount) -> ModelResult<()> {
        validate_input(&data)?;

        if let Some(name) = data.name {
            self.name = name;
        }
        if let Some(account_type) = data.account_type {
            self.account_type = account_type;
        }
        if let Some(description) = data.description {
            self.description = description;
        }
        if let Some(settings) = data.settings {
            self.settings = settings;
        }

        self.updated_at = Utc::now();
        Ok(())
    }
}
