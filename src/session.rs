//! Session store.
//!
//! Holds at most one signed-in profile, mirrored to the key-value store.
//! Every provider call is tagged with a generation number; a response that
//! comes back after a newer call (or a sign-out) has started is dropped.

use crate::error::{DoorknockError, Result};
use crate::models::UserProfile;
use crate::storage::{load_json, save_json, KeyValueStore, USER_PROFILE_KEY};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Third-party sign-in service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive sign-in flow
    async fn sign_in(&self) -> Result<UserProfile>;
    /// Invalidate the session on the provider's side
    async fn sign_out(&self) -> Result<()>;
    /// Resume a previous session, if the provider still has one
    async fn restore_session(&self) -> Result<Option<UserProfile>>;
    /// Complete an OAuth redirect; returns whether the URL belonged to the provider
    async fn handle_callback(&self, url: &str) -> bool;
}

#[derive(Debug, Default)]
struct SessionState {
    profile: Option<UserProfile>,
    generation: u64,
}

/// The signed-in user, if any
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Create the store with whatever profile was persisted last
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        let profile: Option<UserProfile> = load_json(&*store, USER_PROFILE_KEY);
        if let Some(profile) = &profile {
            debug!(user = %profile.id, "Loaded stored profile");
        }
        Self {
            provider,
            store,
            state: Mutex::new(SessionState { profile, generation: 0 }),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.lock().profile.clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.lock().profile.is_some()
    }

    pub async fn sign_in(&self) -> Result<UserProfile> {
        let generation = self.next_generation();
        let result = self.provider.sign_in().await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(generation, "Dropping superseded sign-in response");
            return Err(DoorknockError::Superseded("sign_in"));
        }

        match result {
            Ok(profile) => {
                info!(user = %profile.id, "Signed in");
                state.profile = Some(profile.clone());
                drop(state);
                self.persist(&profile);
                Ok(profile)
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                Err(into_auth_error(e))
            }
        }
    }

    /// Resume the provider's session.
    ///
    /// Anything but a returned profile discards the locally stored one.
    pub async fn restore_session(&self) -> Result<Option<UserProfile>> {
        let generation = self.next_generation();
        let result = self.provider.restore_session().await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(generation, "Dropping superseded restore response");
            return Err(DoorknockError::Superseded("restore_session"));
        }

        match result {
            Ok(Some(profile)) => {
                info!(user = %profile.id, "Session restored");
                state.profile = Some(profile.clone());
                drop(state);
                self.persist(&profile);
                Ok(Some(profile))
            }
            Ok(None) => {
                debug!("No previous session to restore");
                state.profile = None;
                drop(state);
                self.forget();
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Session restore failed");
                state.profile = None;
                drop(state);
                self.forget();
                Err(into_auth_error(e))
            }
        }
    }

    /// Sign out locally, then tell the provider. Never fails.
    pub async fn sign_out(&self) {
        {
            let mut state = self.lock();
            state.generation += 1;
            state.profile = None;
        }
        self.forget();
        info!("Signed out");

        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "Provider sign-out failed, local session already cleared");
        }
    }

    pub async fn handle_callback(&self, url: &str) -> bool {
        let handled = self.provider.handle_callback(url).await;
        debug!(handled, "Handled sign-in callback");
        handled
    }

    fn next_generation(&self) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.generation
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn persist(&self, profile: &UserProfile) {
        if let Err(e) = save_json(&*self.store, USER_PROFILE_KEY, profile) {
            error!(error = %e, "Failed to persist user profile");
        }
    }

    fn forget(&self) {
        if let Err(e) = self.store.remove(USER_PROFILE_KEY) {
            error!(error = %e, "Failed to remove stored user profile");
        }
    }
}

fn into_auth_error(e: DoorknockError) -> DoorknockError {
    match e {
        DoorknockError::Authentication(_) => e,
        other => DoorknockError::Authentication(other.to_string()),
    }
}
