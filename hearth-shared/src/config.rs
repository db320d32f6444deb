//! Model-level configuration
//!
//! Values that shape record lifecycles rather than any server process:
//! how long invitations stay open, how often a failed task may be retried,
//! and the role new members get when an account doesn't say otherwise.
//!
//! # Environment Variables
//!
//! - `HEARTH_INVITE_TTL_DAYS`: Days before a pending invite expires (default: 7)
//! - `HEARTH_MAX_TASK_RETRIES`: Retries allowed for a failed task (default: 3)
//! - `HEARTH_DEFAULT_MEMBER_ROLE`: Role for new members (default: viewer)
//!
//! # Example
//!
//! ```no_run
//! use hearth_shared::config::ModelConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = ModelConfig::from_env()?;
//! println!("Invites expire after {} days", config.invite_ttl_days);
//! # Ok(())
//! # }
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::membership::AccountMemberRole;

const DEFAULT_INVITE_TTL_DAYS: i64 = 7;
const DEFAULT_MAX_TASK_RETRIES: i32 = 3;

/// Configuration for record lifecycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Days a pending invite stays valid
    pub invite_ttl_days: i64,

    /// Maximum retry count for failed tasks
    pub max_task_retries: i32,

    /// Role assigned to new members by default
    pub default_member_role: AccountMemberRole,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            invite_ttl_days: DEFAULT_INVITE_TTL_DAYS,
            max_task_retries: DEFAULT_MAX_TASK_RETRIES,
            default_member_role: AccountMemberRole::Viewer,
        }
    }
}

impl ModelConfig {
    /// Loads configuration from `HEARTH_*` environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An environment variable has a value of the wrong type
    /// - The resulting configuration fails [`ModelConfig::validate`]
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::load(config::Environment::with_prefix("HEARTH"))
    }

    /// Loads configuration from any `config` source layered over the defaults
    pub fn load<S>(source: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("invite_ttl_days", defaults.invite_ttl_days)?
            .set_default("max_task_retries", defaults.max_task_retries)?
            .set_default(
                "default_member_role",
                defaults.default_member_role.as_str(),
            )?
            .add_source(source)
            .build()?;

        let loaded: ModelConfig = settings.try_deserialize()?;
        loaded.validate()?;

        tracing::debug!(
            invite_ttl_days = loaded.invite_ttl_days,
            max_task_retries = loaded.max_task_retries,
            default_member_role = loaded.default_member_role.as_str(),
            "Model configuration loaded"
        );

        Ok(loaded)
    }

    /// Checks value ranges
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.invite_ttl_days < 1 {
            anyhow::bail!("invite_ttl_days must be at least 1");
        }

        if self.max_task_retries < 0 {
            anyhow::bail!("max_task_retries cannot be negative");
        }

        if self.default_member_role == AccountMemberRole::Owner {
            anyhow::bail!("default_member_role cannot be owner");
        }

        Ok(())
    }

    /// Invite lifetime as a duration
    pub fn invite_ttl(&self) -> Duration {
        Duration::days(self.invite_ttl_days)
    }
}
