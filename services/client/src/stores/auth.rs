//! services/client/src/stores/auth.rs
//!
//! The signed-in-user identity and the gate that reacts to auth changes.
//! `Identity` is the process-wide `IdentityProvider` the stores consult
//! before every remote call; `AuthGate` listens to the external auth
//! provider's resolutions and drives the stores: sign-in pulls both remote
//! collections, sign-out clears both local ones.

use std::sync::Arc;

use async_trait::async_trait;
use study_coach_core::domain::UserIdentity;
use study_coach_core::ports::IdentityProvider;
use tokio::sync::RwLock;
use tracing::info;

use crate::stores::goals::GoalsStore;
use crate::stores::sessions::SessionStore;

//=========================================================================================
// Identity
//=========================================================================================

/// Holds the current user. Written only by the auth gate; read by the stores
/// through the `IdentityProvider` port.
#[derive(Default)]
pub struct Identity {
    user: RwLock<Option<UserIdentity>>,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_user(&self, user: Option<UserIdentity>) {
        *self.user.write().await = user;
    }
}

#[async_trait]
impl IdentityProvider for Identity {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.user.read().await.clone()
    }
}

//=========================================================================================
// AuthGate
//=========================================================================================

/// Orchestrates the stores across auth changes. The loading flag starts true
/// and drops to false once the first auth resolution arrives, signed in or
/// not.
pub struct AuthGate {
    identity: Arc<Identity>,
    sessions: Arc<SessionStore>,
    goals: Arc<GoalsStore>,
    loading: RwLock<bool>,
}

impl AuthGate {
    pub fn new(
        identity: Arc<Identity>,
        sessions: Arc<SessionStore>,
        goals: Arc<GoalsStore>,
    ) -> Self {
        Self {
            identity,
            sessions,
            goals,
            loading: RwLock::new(true),
        }
    }

    /// True until the first auth resolution.
    pub async fn is_loading(&self) -> bool {
        *self.loading.read().await
    }

    pub async fn current_user(&self) -> Option<UserIdentity> {
        self.identity.current_user().await
    }

    /// Applies an auth resolution from the external provider.
    ///
    /// Sign-in records the identity and awaits a forced goals refresh
    /// together with a session sync. Sign-out clears the identity and both
    /// stores' collections so one account's data never leaks into another's
    /// view.
    pub async fn handle_auth_change(&self, user: Option<UserIdentity>) {
        match user {
            Some(user) => {
                info!("User {} signed in; pulling remote collections", user.uid);
                self.identity.set_user(Some(user)).await;
                tokio::join!(self.goals.fetch_goals(true), self.sessions.sync_from_remote());
            }
            None => {
                info!("User signed out; clearing local collections");
                self.identity.set_user(None).await;
                tokio::join!(self.sessions.clear(), self.goals.clear());
            }
        }
        *self.loading.write().await = false;
    }

    /// Convenience wrapper for a sign-in resolution.
    pub async fn sign_in(&self, user: UserIdentity) {
        self.handle_auth_change(Some(user)).await;
    }

    /// Convenience wrapper for a sign-out resolution.
    pub async fn sign_out(&self) {
        self.handle_auth_change(None).await;
    }
}
