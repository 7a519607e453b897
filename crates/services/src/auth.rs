//! Signed-in user tracking and the admin-role lookup.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use quiz_core::model::{AuthUser, UserId};
use storage::repository::UserRepository;

use crate::error::AuthError;

//
// ─── IDENTITY PROVIDER ─────────────────────────────────────────────────────────
//

/// Source of the current user.
///
/// Subscribers receive the user (or `None` after sign-out) on every change.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;

    /// # Errors
    ///
    /// Returns `AuthError::SignOut` when the provider rejects the request.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// In-process identity: whoever the front end says is signed in.
#[derive(Debug)]
pub struct LocalIdentity {
    user: watch::Sender<Option<AuthUser>>,
}

impl LocalIdentity {
    #[must_use]
    pub fn new() -> Self {
        let (user, _) = watch::channel(None);
        Self { user }
    }

    #[must_use]
    pub fn signed_in(user: AuthUser) -> Self {
        let identity = Self::new();
        identity.sign_in(user);
        identity
    }

    pub fn sign_in(&self, user: AuthUser) {
        debug!(uid = %user.uid, "user signed in");
        self.user.send_replace(Some(user));
    }
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.user.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.user.subscribe()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(previous) = self.user.send_replace(None) {
            debug!(uid = %previous.uid, "user signed out");
        }
        Ok(())
    }
}

//
// ─── AUTH SERVICE ──────────────────────────────────────────────────────────────
//

/// What the header needs to render: who is signed in and whether they are an admin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSnapshot {
    pub user: Option<AuthUser>,
    pub is_admin: bool,
}

/// Combines the identity provider with role lookups.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, users: Arc<dyn UserRepository>) -> Self {
        Self { identity, users }
    }

    #[must_use]
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.identity)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.identity.current_user()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.identity.subscribe()
    }

    /// Whether `uid` has the admin role. Lookup failures count as "no".
    pub async fn is_admin(&self, uid: &UserId) -> bool {
        match self.users.get_role(uid).await {
            Ok(role) => role.is_some_and(|r| r.is_admin()),
            Err(err) => {
                warn!(uid = %uid, error = %err, "role lookup failed");
                false
            }
        }
    }

    pub async fn snapshot(&self) -> AuthSnapshot {
        let user = self.identity.current_user();
        let is_admin = match &user {
            Some(user) => self.is_admin(&user.uid).await,
            None => false,
        };
        AuthSnapshot { user, is_admin }
    }

    /// # Errors
    ///
    /// Returns `AuthError` when the provider fails to sign out.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.identity.sign_out().await
    }
}
