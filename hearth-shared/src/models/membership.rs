//! Account membership model
//!
//! This module provides the join record between users and accounts together
//! with the role-based permissions a member holds inside an account.
//!
//! # Roles
//!
//! - **owner**: Full control, including deleting the account
//! - **admin**: Manage members, invites and all content
//! - **editor**: Create and edit content
//! - **viewer**: Read-only access
//!
//! # Identity
//!
//! A membership is identified by its `(userId, accountId)` pair. A collection
//! of memberships never holds the same pair twice; see
//! [`ensure_unique_memberships`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Permission strings granted by member roles
pub mod permissions {
    pub const ACCOUNT_DELETE: &str = "account:delete";
    pub const ACCOUNT_MANAGE: &str = "account:manage";
    pub const MEMBERS_MANAGE: &str = "members:manage";
    pub const INVITES_MANAGE: &str = "invites:manage";
    pub const CONTENT_WRITE: &str = "content:write";
    pub const CONTENT_READ: &str = "content:read";
}

/// RBAC roles for account memberships
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountMemberRole {
    /// Full control: delete account, manage all members
    Owner,

    /// Can manage members, invites, and all content
    Admin,

    /// Can create and edit content
    Editor,

    /// Read-only access
    #[default]
    Viewer,
}

impl AccountMemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountMemberRole::Owner => "owner",
            AccountMemberRole::Admin => "admin",
            AccountMemberRole::Editor => "editor",
            AccountMemberRole::Viewer => "viewer",
        }
    }

    /// Parses role from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(AccountMemberRole::Owner),
            "admin" => Some(AccountMemberRole::Admin),
            "editor" => Some(AccountMemberRole::Editor),
            "viewer" => Some(AccountMemberRole::Viewer),
            _ => None,
        }
    }

    /// Can add, remove and re-role members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, AccountMemberRole::Owner | AccountMemberRole::Admin)
    }

    /// Can send and revoke invites
    pub fn can_invite(&self) -> bool {
        matches!(self, AccountMemberRole::Owner | AccountMemberRole::Admin)
    }

    /// Can create and edit notes and posts
    pub fn can_edit_content(&self) -> bool {
        !matches!(self, AccountMemberRole::Viewer)
    }

    /// Can delete the account
    pub fn can_delete_account(&self) -> bool {
        matches!(self, AccountMemberRole::Owner)
    }

    /// Checks if this role has permission level of the required role
    ///
    /// Hierarchy: Owner > Admin > Editor > Viewer
    pub fn has_permission(&self, required: &AccountMemberRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    /// Returns numeric permission level for comparison
    fn permission_level(&self) -> u8 {
        match self {
            AccountMemberRole::Owner => 4,
            AccountMemberRole::Admin => 3,
            AccountMemberRole::Editor => 2,
            AccountMemberRole::Viewer => 1,
        }
    }

    /// Static descriptor listing this role's permissions
    pub fn descriptor(&self) -> MemberRole {
        use permissions::*;

        let granted: &[&str] = match self {
            AccountMemberRole::Owner => &[
                ACCOUNT_DELETE,
                ACCOUNT_MANAGE,
                MEMBERS_MANAGE,
                INVITES_MANAGE,
                CONTENT_WRITE,
                CONTENT_READ,
            ],
            AccountMemberRole::Admin => &[
                ACCOUNT_MANAGE,
                MEMBERS_MANAGE,
                INVITES_MANAGE,
                CONTENT_WRITE,
                CONTENT_READ,
            ],
            AccountMemberRole::Editor => &[CONTENT_WRITE, CONTENT_READ],
            AccountMemberRole::Viewer => &[CONTENT_READ],
        };

        MemberRole {
            name: *self,
            permissions: granted.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Static descriptor of a member role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRole {
    /// Role name
    pub name: AccountMemberRole,

    /// Permission strings (e.g., "content:write")
    pub permissions: Vec<String>,
}

impl MemberRole {
    /// Whether the role grants `permission`
    pub fn allows(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Partial user embedded in a membership for display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUserSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&crate::models::user::User> for MemberUserSnapshot {
    fn from(user: &crate::models::user::User) -> Self {
        Self {
            id: Some(user.id.clone()),
            email: Some(user.email.clone()),
            username: Some(user.username.clone()),
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            name: Some(user.name.clone()),
        }
    }
}

/// Membership linking a user to an account with a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountMember {
    /// User ID
    pub user_id: String,

    /// Account ID
    pub account_id: String,

    /// Role within the account
    pub role: AccountMemberRole,

    /// When the user joined
    pub joined_at: DateTime<Utc>,

    /// User who invited this member
    pub invited_by: String,

    /// Embedded user snapshot (read-time enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub user: Option<MemberUserSnapshot>,

    /// Role descriptor (read-time enrichment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub role_info: Option<MemberRole>,
}

/// Input for adding a member to an account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountMember {
    pub user_id: String,
    pub account_id: String,

    /// Role to assign (defaults to viewer)
    #[serde(default)]
    pub role: AccountMemberRole,

    pub invited_by: String,
}

impl AccountMember {
    /// Builds a membership joined now
    pub fn new(data: CreateAccountMember) -> Self {
        Self {
            user_id: data.user_id,
            account_id: data.account_id,
            role: data.role,
            joined_at: Utc::now(),
            invited_by: data.invited_by,
            user: None,
            role_info: None,
        }
    }

    /// Composite identity of the membership
    pub fn key(&self) -> (&str, &str) {
        (&self.user_id, &self.account_id)
    }

    /// Attaches a user snapshot and role descriptor
    pub fn with_details(mut self, user: &crate::models::user::User) -> Self {
        self.user = Some(MemberUserSnapshot::from(user));
        self.role_info = Some(self.role.descriptor());
        self
    }

    /// Changes the member's role
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTransition` when demoting the owner;
    /// ownership moves by promoting another member first.
    pub fn change_role(&mut self, role: AccountMemberRole) -> ModelResult<()> {
        if self.role == AccountMemberRole::Owner && role != AccountMemberRole::Owner {
            tracing::warn!(
                user_id = %self.user_id,
                account_id = %self.account_id,
                "Refusing to demote account owner"
            );
            return Err(ModelError::InvalidTransition {
                entity: "member role",
                from: self.role.as_str().to_string(),
                to: role.as_str().to_string(),
            });
        }

        self.role = role;
        if self.role_info.is_some() {
            self.role_info = Some(role.descriptor());
        }
        Ok(())
    }
}

/// Checks that no two memberships share a `(userId, accountId)` pair
///
/// # Errors
///
/// Returns `ModelError::DuplicateMembership` for the first repeated pair.
pub fn ensure_unique_memberships(members: &[AccountMember]) -> ModelResult<()> {
    let mut seen = HashSet::with_capacity(members.len());

    for member in members {
        if !seen.insert(member.key()) {
            return Err(ModelError::DuplicateMembership {
                user_id: member.user_id.clone(),
                account_id: member.account_id.clone(),
            });
        }
    }

    Ok(())
}
