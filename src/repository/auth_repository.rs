use std::sync::{Arc, Mutex};

use log::debug;

use crate::domain::user::User;
use crate::store::auth::{AuthError, AuthProvider, AuthUser};
use crate::store::gateway::{DocumentStore, StoreError, USERS};

/// Wraps the identity provider and keeps the signed-in session in memory.
pub struct AuthRepository {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    session: Mutex<Option<AuthUser>>,
}

impl AuthRepository {
    pub fn new(provider: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> AuthRepository {
        AuthRepository {
            provider,
            store,
            session: Mutex::new(None),
        }
    }

    /// The cached session identity, if signed in.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.lock().unwrap().clone()
    }

    /// Seeds the session cache, e.g. from a persisted session file.
    pub fn restore_session(&self, user: AuthUser) {
        *self.session.lock().unwrap() = Some(user);
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self.provider.sign_in(email, password).await?;
        debug!("signed in as {}", user.id);
        *self.session.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    /// Creates the identity, then the profile document. A failed profile
    /// write leaves the identity behind and surfaces as an error.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let user = self.provider.sign_up(email, password).await?;

        let profile = User {
            id: user.id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            photo_url: None,
            recent_sets: Vec::new(),
        };
        let doc = serde_json::to_value(&profile).map_err(StoreError::from)?;
        self.store.put(USERS, &user.id, doc).await?;

        debug!("registered {} as {}", email, user.id);
        *self.session.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    /// Local only, cannot fail.
    pub fn logout(&self) {
        *self.session.lock().unwrap() = None;
    }
}
