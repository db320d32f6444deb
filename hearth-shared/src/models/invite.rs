//! Account invite model
//!
//! This module provides the pending-invitation record and its lifecycle.
//!
//! # State Machine
//!
//! ```text
//! pending → accepted
//!         → declined
//!         → expired   (once expiresAt has passed)
//! ```
//!
//! Every status other than `pending` is terminal. An accepted or declined
//! invite never reads as expired later, even after `expiresAt`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::ModelConfig;
use crate::error::{validate_input, ModelError, ModelResult};
use crate::models::account::Account;
use crate::models::membership::{AccountMember, AccountMemberRole, CreateAccountMember};

/// Invite status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "invite_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    /// Awaiting a response
    #[default]
    Pending,

    /// Invitee joined the account
    Accepted,

    /// Invitee refused
    Declined,

    /// Not answered before `expiresAt`
    Expired,
}

impl InviteStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Declined => "declined",
            InviteStatus::Expired => "expired",
        }
    }

    /// Checks if status is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InviteStatus::Pending)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: InviteStatus) -> bool {
        matches!(
            (self, target),
            (InviteStatus::Pending, InviteStatus::Accepted)
                | (InviteStatus::Pending, InviteStatus::Declined)
                | (InviteStatus::Pending, InviteStatus::Expired)
        )
    }
}

/// Invitation to join an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountInvite {
    /// Opaque invite ID
    pub id: String,

    /// Account the invitee would join
    pub account_id: String,

    /// Invitee email
    pub email: String,

    /// Proposed role
    pub role: AccountMemberRole,

    /// User who sent the invite
    pub invited_by: String,

    /// When the invite was created
    pub created_at: DateTime<Utc>,

    /// When the invite stops being answerable
    pub expires_at: DateTime<Utc>,

    /// Current status
    pub status: InviteStatus,
}

/// Input for creating an invite
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvite {
    /// Account to invite into
    #[validate(length(min = 1))]
    pub account_id: String,

    /// Invitee email
    #[validate(email)]
    pub email: String,

    /// Proposed role (account default if omitted)
    #[serde(default)]
    pub role: Option<AccountMemberRole>,
}

impl AccountInvite {
    /// Builds a pending invite expiring after the configured TTL
    ///
    /// The role falls back to the configured default member role. Owners
    /// cannot be invited.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the input fails validation or
    /// proposes the owner role.
    pub fn new(
        data: CreateInvite,
        invited_by: impl Into<String>,
        config: &ModelConfig,
    ) -> ModelResult<Self> {
        validate_input(&data)?;

        let role = data.role.unwrap_or(config.default_member_role);
        if role == AccountMemberRole::Owner {
            return Err(ModelError::Validation(vec![
                crate::error::ValidationErrorDetail {
                    field: "role".to_string(),
                    message: "Invites cannot grant the owner role".to_string(),
                },
            ]));
        }

        let created_at = Utc::now();

        Ok(Self {
            id: crate::new_id(),
            account_id: data.account_id,
            email: data.email,
            role,
            invited_by: invited_by.into(),
            created_at,
            expires_at: created_at + config.invite_ttl(),
            status: InviteStatus::Pending,
        })
    }

    /// Builds an invite for `account`, checking the account accepts invites
    ///
    /// The role falls back to the account's `defaultMemberRole`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvitesDisabled` if the account doesn't allow
    /// invites, or a validation error as [`AccountInvite::new`].
    pub fn for_account(
        account: &Account,
        email: impl Into<String>,
        role: Option<AccountMemberRole>,
        invited_by: impl Into<String>,
        config: &ModelConfig,
    ) -> ModelResult<Self> {
        account.can_invite()?;

        let data = CreateInvite {
            account_id: account.id.clone(),
            email: email.into(),
            role: Some(role.unwrap_or(account.settings.default_member_role)),
        };

        Self::new(data, invited_by, config)
    }

    /// Whether `expiresAt` has passed at `now`
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Status as observed at `now`
    ///
    /// A pending invite past its expiry reads as expired. Terminal
    /// statuses are returned unchanged.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InviteStatus {
        match self.status {
            InviteStatus::Pending if self.is_past_expiry(now) => InviteStatus::Expired,
            status => status,
        }
    }

    /// Records expiry on the invite if it is due
    ///
    /// Returns true if the status changed.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.effective_status(now) == InviteStatus::Expired
            && self.status == InviteStatus::Pending
        {
            tracing::debug!(invite_id = %self.id, "Invite expired");
            self.status = InviteStatus::Expired;
            return true;
        }

        false
    }

    /// Accepts the invite, producing the new membership
    ///
    /// # Errors
    ///
    /// - `ModelError::InviteExpired` if answered after `expiresAt` (the
    ///   invite is marked expired)
    /// - `ModelError::InvalidTransition` if the invite is not pending
    pub fn accept(
        &mut self,
        user_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> ModelResult<AccountMember> {
        self.answer(InviteStatus::Accepted, now)?;

        Ok(AccountMember::new(CreateAccountMember {
            user_id: user_id.into(),
            account_id: self.account_id.clone(),
            role: self.role,
            invited_by: self.invited_by.clone(),
        }))
    }

    /// Declines the invite
    ///
    /// # Errors
    ///
    /// Same as [`AccountInvite::accept`]
    pub fn decline(&mut self, now: DateTime<Utc>) -> ModelResult<()> {
        self.answer(InviteStatus::Declined, now)
    }

    fn answer(&mut self, target: InviteStatus, now: DateTime<Utc>) -> ModelResult<()> {
        if self.expire_if_due(now) {
            return Err(ModelError::InviteExpired(self.id.clone()));
        }

        if !self.status.can_transition_to(target) {
            tracing::warn!(
                invite_id = %self.id,
                from = self.status.as_str(),
                to = target.as_str(),
                "Rejected invite transition"
            );
            return Err(ModelError::InvalidTransition {
                entity: "invite",
                from: self.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }

        tracing::debug!(invite_id = %self.id, status = target.as_str(), "Invite answered");
        self.status = target;
        Ok(())
    }
}
