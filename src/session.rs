//! Session manager - single source of truth for "who is the current user
//! and what may they do".
//!
//! Tokens live in the token store (durable); the user is held only in
//! memory and reconstructed from `/auth/me` on startup. The two are always
//! cleared together so the UI and the client never disagree about whether a
//! session exists.

use std::sync::RwLock;

use crate::authz::{Permission, Role};
use crate::client::ApiClient;
use crate::errors::{ApiError, ApiResult};
use crate::models::user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, User,
    UserUpdateRequest,
};

pub struct SessionManager {
    client: ApiClient,
    user: RwLock<Option<User>>,
    /// Serializes concurrent `check_auth` calls so they converge on one
    /// final state instead of interleaving half-updates.
    check_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            user: RwLock::new(None),
            check_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn current_user(&self) -> Option<User> {
        self.read_user().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_user().is_some()
    }

    /// Re-establish the session from stored credentials.
    ///
    /// No stored access token means unauthenticated, without touching the
    /// network. Any failure of the `/auth/me` round-trip (after the client's
    /// internal refresh attempt) fails closed: both tokens and the user are
    /// cleared and `None` is returned rather than an error.
    pub async fn check_auth(&self) -> ApiResult<Option<User>> {
        let _guard = self.check_lock.lock().await;

        if self.client.store().access_token().await?.is_none() {
            self.set_user(None);
            return Ok(None);
        }

        match self.client.get::<User>("auth/me").await {
            Ok(user) => {
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(err) => {
                tracing::debug!(kind = err.kind(), error = %err, "auth check failed");
                if let Err(clear_err) = self.client.store().clear().await {
                    tracing::error!(error = %clear_err, "failed to clear tokens after auth check");
                }
                self.set_user(None);
                Ok(None)
            }
        }
    }

    /// Submit credentials; on success both tokens are persisted and the
    /// user is taken from the response body. Failure leaves stored state
    /// untouched and propagates the error.
    pub async fn login(&self, credentials: &LoginRequest) -> ApiResult<User> {
        let response: AuthResponse = self.client.post("auth/login", credentials).await?;

        self.client
            .store()
            .store_tokens(&response.access_token, &response.refresh_token)
            .await?;
        self.set_user(Some(response.user.clone()));

        tracing::info!(username = %response.user.username, role = %response.user.role, "logged in");
        Ok(response.user)
    }

    /// Create an account. Success only signals the account exists; the
    /// caller is not authenticated by this.
    pub async fn register(&self, data: &RegisterRequest) -> ApiResult<()> {
        let _: MessageResponse = self.client.post("auth/register", data).await?;
        Ok(())
    }

    /// Drop the session locally: both tokens and the user, together. No
    /// network call is made; the backend holds no server-side session to
    /// revoke.
    pub async fn logout(&self) -> ApiResult<()> {
        self.client.store().clear().await?;
        self.set_user(None);
        tracing::info!("logged out");
        Ok(())
    }

    /// Update the profile of the current user. A no-op when no session is
    /// active. The server's returned representation replaces the local user
    /// wholesale; the server stays authoritative.
    pub async fn update_profile(&self, patch: &UserUpdateRequest) -> ApiResult<Option<User>> {
        let current = match self.current_user() {
            Some(user) => user,
            None => return Ok(None),
        };

        let path = format!("users/{}", current.id);
        match self.client.put::<_, User>(&path, patch).await {
            Ok(user) => {
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(err) => {
                self.clear_user_on_expiry(&err);
                Err(err)
            }
        }
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> ApiResult<()> {
        if !self.is_authenticated() {
            return Err(ApiError::unauthorized("no active session"));
        }

        match self.client.post::<_, MessageResponse>("auth/change-password", request).await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.clear_user_on_expiry(&err);
                Err(err)
            }
        }
    }

    /// True iff the current user's role grants the permission. Always false
    /// without a user.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.read_user()
            .as_ref()
            .map(|user| user.role.allows(permission))
            .unwrap_or(false)
    }

    /// String-tag equality against the current user's role. Always false
    /// without a user.
    pub fn has_role(&self, role: Role) -> bool {
        self.read_user()
            .as_ref()
            .map(|user| user.role == role)
            .unwrap_or(false)
    }

    /// Set-membership variant of [`has_role`](Self::has_role).
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.read_user()
            .as_ref()
            .map(|user| roles.contains(&user.role))
            .unwrap_or(false)
    }

    /// A forced logout already cleared the stored tokens; the in-memory
    /// user must go with them.
    fn clear_user_on_expiry(&self, err: &ApiError) {
        if err.is_session_expired() {
            self.set_user(None);
        }
    }

    fn set_user(&self, user: Option<User>) {
        *self
            .user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }

    fn read_user(&self) -> std::sync::RwLockReadGuard<'_, Option<User>> {
        self.user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
