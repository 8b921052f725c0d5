use std::sync::{Arc, Mutex};

use log::error;

use crate::domain::user::User;
use crate::repository::auth_repository::AuthRepository;
use crate::repository::user_repository::UserRepository;

use super::generation::Generation;

#[derive(Clone, Default)]
pub struct ProfileState {
    pub user: Option<User>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Profile screen: the signed-in user's document, profile edits, logout.
pub struct ProfileController {
    auth: Arc<AuthRepository>,
    users: Arc<UserRepository>,
    state: Mutex<ProfileState>,
    generation: Generation,
}

impl ProfileController {
    pub fn new(auth: Arc<AuthRepository>, users: Arc<UserRepository>) -> ProfileController {
        ProfileController {
            auth,
            users,
            state: Mutex::new(ProfileState::default()),
            generation: Generation::default(),
        }
    }

    pub fn snapshot(&self) -> ProfileState {
        self.state.lock().unwrap().clone()
    }

    pub async fn load_user_profile(&self) {
        let Some(user) = self.auth.current_user() else {
            return;
        };

        let token = self.generation.begin();
        self.state.lock().unwrap().is_loading = true;

        let result = self.users.get_user_profile(&user.id).await;

        let mut state = self.state.lock().unwrap();
        if !self.generation.is_current(token) {
            return;
        }
        state.is_loading = false;
        match result {
            Ok(profile) => {
                state.user = profile;
                state.error = None;
            }
            Err(err) => {
                error!("failed to load profile: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    pub async fn update_profile(&self, user: &User) {
        self.state.lock().unwrap().is_loading = true;
        let result = self.users.update_user_profile(user).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(()) => {
                state.user = Some(user.clone());
                state.error = None;
            }
            Err(err) => {
                error!("failed to update profile: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    pub fn logout(&self) {
        self.auth.logout();
        self.state.lock().unwrap().user = None;
    }
}
