//! Authentication provider contract
//!
//! The web client talks to whatever signs users in through [`AuthProvider`].
//! Implementations own credential checks and token issuance; this module
//! only fixes the operations they expose and the session state they report.
//!
//! # Session States
//!
//! ```text
//! loading ──> anonymous ──login/register──> authenticated
//!                 ^                               │
//!                 └───────────logout──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hearth_shared::auth::{AuthProvider, LoginCredentials};
//!
//! # async fn example(provider: &dyn AuthProvider) -> hearth_shared::auth::AuthResult<()> {
//! let session = provider
//!     .login(LoginCredentials::new("ada@example.com", "correct horse"))
//!     .await?;
//! assert!(session.is_authenticated);
//! # Ok(())
//! # }
//! ```

use std::fmt;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::envelope::ApiResponse;
use crate::error::{validate_input, ModelError, ModelResult, ValidationErrorDetail};
use crate::models::user::{CreateUser, UpdateUser, User, UserPreferences};

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email/password pair did not match
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Registration with an email that already has a user
    #[error("Email {0} is already registered")]
    EmailTaken(String),

    /// Operation requires a signed-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Current password supplied to a password change was wrong
    #[error("Current password is incorrect")]
    WrongPassword,

    /// Input failed validation or a model rule
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Backend failure inside the provider
    #[error("Auth provider error: {0}")]
    Provider(String),
}

/// Result type alias for provider operations
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::EmailTaken(_) => "email_taken",
            AuthError::NotAuthenticated => "unauthorized",
            AuthError::WrongPassword => "wrong_password",
            AuthError::Model(err) => err.code(),
            AuthError::Provider(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::EmailTaken(_) => StatusCode::CONFLICT,
            AuthError::WrongPassword => StatusCode::FORBIDDEN,
            AuthError::Model(err) => err.status_code(),
            AuthError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "Auth error: {}", self);
            let body = ApiResponse::<()>::err("An internal error occurred");
            return (status, Json(body)).into_response();
        }

        (status, Json(ApiResponse::<()>::err(self.to_string()))).into_response()
    }
}

/// Email/password sign-in
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct LoginCredentials {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate_request(&self) -> ModelResult<()> {
        validate_input(self)
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New account sign-up
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(length(min = 1, max = 255))]
    pub first_name: String,

    #[validate(length(min = 1, max = 255))]
    pub last_name: String,

    #[serde(default)]
    pub preferences: Option<UserPreferences>,
}

impl RegisterRequest {
    pub fn validate_request(&self) -> ModelResult<()> {
        validate_input(self)
    }

    /// User fields of the request; registration always yields a plain `user`
    pub fn to_create_user(&self) -> CreateUser {
        CreateUser {
            email: self.email.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: Default::default(),
            preferences: self.preferences.clone(),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Password change for the signed-in user
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            current_password: current.into(),
            new_password: new.into(),
        }
    }

    /// Field checks plus the new password differing from the current one
    pub fn validate_request(&self) -> ModelResult<()> {
        validate_input(self)?;

        if self.new_password == self.current_password {
            return Err(ModelError::Validation(vec![ValidationErrorDetail {
                field: "new_password".to_string(),
                message: "New password must differ from the current password".to_string(),
            }]));
        }

        Ok(())
    }
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("current_password", &"<redacted>")
            .field("new_password", &"<redacted>")
            .finish()
    }
}

/// Session state exposed by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    pub is_authenticated: bool,

    pub is_loading: bool,
}

impl AuthSession {
    /// Session before the provider has resolved anything
    pub fn loading() -> Self {
        Self {
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    /// Resolved session with nobody signed in
    pub fn anonymous() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }

    pub fn authenticated(user: User, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
            is_authenticated: true,
            is_loading: false,
        }
    }

    /// `is_authenticated` agrees with the presence of a user and token,
    /// and a loading session holds neither
    pub fn is_consistent(&self) -> bool {
        let has_identity = self.user.is_some() && self.token.is_some();
        if self.is_loading {
            return !self.is_authenticated && self.user.is_none() && self.token.is_none();
        }
        self.is_authenticated == has_identity
    }

    /// Signed-in user, or `NotAuthenticated`
    pub fn require_user(&self) -> AuthResult<&User> {
        match (&self.user, self.is_authenticated) {
            (Some(user), true) => Ok(user),
            _ => Err(AuthError::NotAuthenticated),
        }
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::loading()
    }
}

/// Operations an authentication provider must expose
///
/// Mutating operations are async. `session()` is a synchronous snapshot of
/// the provider's current state.
///
/// Implementations should run `validate_request()` on incoming requests and
/// return [`AuthError::Model`] on failure.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Signs in and returns the new session
    async fn login(&self, credentials: LoginCredentials) -> AuthResult<AuthSession>;

    /// Creates a user and signs them in
    async fn register(&self, request: RegisterRequest) -> AuthResult<AuthSession>;

    /// Updates the signed-in user's profile
    ///
    /// # Errors
    ///
    /// `AuthError::NotAuthenticated` when nobody is signed in.
    async fn update_user(&self, update: UpdateUser) -> AuthResult<User>;

    /// Changes the signed-in user's password
    ///
    /// # Errors
    ///
    /// - `AuthError::NotAuthenticated` when nobody is signed in
    /// - `AuthError::WrongPassword` when `current_password` doesn't match
    async fn change_password(&self, request: ChangePasswordRequest) -> AuthResult<()>;

    /// Ends the session; a no-op when already signed out
    async fn logout(&self) -> AuthResult<()>;

    /// Current session state
    fn session(&self) -> AuthSession;

    /// Name of the provider, for logging
    fn name(&self) -> &str {
        "auth"
    }
}
