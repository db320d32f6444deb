//! Record types for Hearth
//!
//! # Models
//!
//! - `user`: User identity, platform role and UI preferences
//! - `account`: Accounts, tiers and account settings
//! - `membership`: User-account relationships with roles
//! - `invite`: Pending invitations to join an account
//! - `note`: Notes and note types
//! - `blog`: Blog posts and their publication lifecycle
//! - `guestbook`: Append-only guestbook entries
//! - `counter`: A single numeric counter
//! - `task`: QStash task records and statistics
//!
//! All records serialize to camelCase JSON. Identifiers are opaque strings
//! and timestamps are RFC 3339.
//!
//! # Example
//!
//! ```
//! use hearth_shared::models::account::{Account, AccountTypeName, CreateAccount};
//! use hearth_shared::models::membership::AccountMemberRole;
//!
//! let account = Account::new("user-1", CreateAccount {
//!     name: "Lovelace household".to_string(),
//!     account_type: AccountTypeName::Family,
//!     description: String::new(),
//!     settings: None,
//! })
//! .unwrap()
//! .with_viewer_context(Some(AccountMemberRole::Owner));
//!
//! assert_eq!(account.type_info.map(|t| t.max_members), Some(6));
//! ```

pub mod account;
pub mod blog;
pub mod counter;
pub mod guestbook;
pub mod invite;
pub mod membership;
pub mod note;
pub mod task;
pub mod user;
