use std::sync::{Arc, Mutex};

use log::error;

use crate::repository::auth_repository::AuthRepository;
use crate::store::auth::AuthError;

#[derive(Clone, Default)]
pub struct AuthState {
    pub is_loading: bool,
    pub is_logged_in: bool,
    pub error: Option<String>,
}

/// Login/registration screen state.
pub struct AuthController {
    auth: Arc<AuthRepository>,
    state: Mutex<AuthState>,
}

impl AuthController {
    pub fn new(auth: Arc<AuthRepository>) -> AuthController {
        let state = AuthState {
            is_logged_in: auth.current_user().is_some(),
            ..AuthState::default()
        };
        AuthController {
            auth,
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.lock().unwrap().clone()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.state.lock().unwrap().is_loading = true;
        let result = self.auth.login(email, password).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(_) => {
                state.is_logged_in = true;
                state.error = None;
                Ok(())
            }
            Err(err) => {
                error!("login failed: {err}");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        self.state.lock().unwrap().is_loading = true;
        let result = self.auth.register(name, email, password).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(_) => {
                state.is_logged_in = true;
                state.error = None;
                Ok(())
            }
            Err(err) => {
                error!("registration failed: {err}");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn logout(&self) {
        self.auth.logout();
        self.state.lock().unwrap().is_logged_in = false;
    }
}
