use std::sync::{Arc, Mutex};

use log::error;

use crate::domain::set::FlashcardSet;
use crate::repository::auth_repository::AuthRepository;
use crate::repository::flashcard_repository::FlashcardRepository;

use super::generation::Generation;

#[derive(Clone, Default)]
pub struct AlbumState {
    pub sets: Vec<FlashcardSet>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Album screen: every set the user owns.
pub struct AlbumController {
    auth: Arc<AuthRepository>,
    flashcards: Arc<FlashcardRepository>,
    state: Mutex<AlbumState>,
    generation: Generation,
}

impl AlbumController {
    pub fn new(auth: Arc<AuthRepository>, flashcards: Arc<FlashcardRepository>) -> AlbumController {
        AlbumController {
            auth,
            flashcards,
            state: Mutex::new(AlbumState::default()),
            generation: Generation::default(),
        }
    }

    pub fn snapshot(&self) -> AlbumState {
        self.state.lock().unwrap().clone()
    }

    pub async fn load_all_sets(&self) {
        let Some(user) = self.auth.current_user() else {
            return;
        };

        let token = self.generation.begin();
        self.state.lock().unwrap().is_loading = true;

        let result = self.flashcards.get_user_sets(&user.id).await;

        let mut state = self.state.lock().unwrap();
        if !self.generation.is_current(token) {
            return;
        }
        state.is_loading = false;
        match result {
            Ok(sets) => {
                state.sets = sets;
                state.error = None;
            }
            Err(err) => {
                error!("failed to load sets: {err}");
                state.error = Some(err.to_string());
            }
        }
    }
}
