use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::error;

use crate::domain::set::FlashcardSet;
use crate::repository::auth_repository::AuthRepository;
use crate::repository::flashcard_repository::{FlashcardRepository, RECENT_SETS_LIMIT};

use super::generation::Generation;

/// Keystrokes within this window coalesce into one search query.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Clone, Default)]
pub struct HomeState {
    pub recent_sets: Vec<FlashcardSet>,
    pub search_results: Vec<FlashcardSet>,
    pub is_loading: bool,
    pub is_searching: bool,
    pub error: Option<String>,
}

/// Home screen: recent sets plus debounced search.
pub struct HomeController {
    auth: Arc<AuthRepository>,
    flashcards: Arc<FlashcardRepository>,
    state: Mutex<HomeState>,
    recent_generation: Generation,
    search_generation: Generation,
}

impl HomeController {
    pub fn new(auth: Arc<AuthRepository>, flashcards: Arc<FlashcardRepository>) -> HomeController {
        HomeController {
            auth,
            flashcards,
            state: Mutex::new(HomeState::default()),
            recent_generation: Generation::default(),
            search_generation: Generation::default(),
        }
    }

    pub fn snapshot(&self) -> HomeState {
        self.state.lock().unwrap().clone()
    }

    pub async fn load_recent_sets(&self) {
        let Some(user) = self.auth.current_user() else {
            return;
        };

        let token = self.recent_generation.begin();
        self.state.lock().unwrap().is_loading = true;

        let result = self.flashcards.get_recent_sets(&user.id, RECENT_SETS_LIMIT).await;

        let mut state = self.state.lock().unwrap();
        if !self.recent_generation.is_current(token) {
            return;
        }
        state.is_loading = false;
        match result {
            Ok(sets) => {
                state.recent_sets = sets;
                state.error = None;
            }
            Err(err) => {
                error!("failed to load recent sets: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Debounced: waits [`SEARCH_DEBOUNCE`] and only queries if no newer
    /// keystroke arrived meanwhile. A blank query clears the results and
    /// supersedes any pending search without touching the store.
    pub async fn search_sets(&self, query: &str) {
        if query.trim().is_empty() {
            self.search_generation.invalidate();
            let mut state = self.state.lock().unwrap();
            state.search_results.clear();
            state.is_searching = false;
            return;
        }

        let Some(user) = self.auth.current_user() else {
            return;
        };

        let token = self.search_generation.begin();
        self.state.lock().unwrap().is_searching = true;

        tokio::time::sleep(SEARCH_DEBOUNCE).await;
        if !self.search_generation.is_current(token) {
            return;
        }

        let result = self.flashcards.search_sets(&user.id, query).await;

        let mut state = self.state.lock().unwrap();
        if !self.search_generation.is_current(token) {
            return;
        }
        state.is_searching = false;
        match result {
            Ok(sets) => {
                state.search_results = sets;
                state.error = None;
            }
            Err(err) => {
                error!("search failed: {err}");
                state.error = Some(err.to_string());
            }
        }
    }
}
