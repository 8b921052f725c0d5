use std::sync::{Arc, Mutex};

use log::{error, warn};
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::domain::flashcard::Flashcard;
use crate::domain::set::FlashcardSet;
use crate::repository::auth_repository::AuthRepository;
use crate::repository::flashcard_repository::FlashcardRepository;
use crate::repository::user_repository::UserRepository;
use crate::utils::time_utils::now_ms;

use super::generation::Generation;

#[derive(Clone, Default)]
pub struct SetState {
    pub current_set: Option<FlashcardSet>,
    pub flashcards: Vec<Flashcard>,
    /// One-shot: id of a set created from this screen, until reset.
    pub created_set_id: Option<String>,
    /// One-shot: a card was created from this screen, until reset.
    pub flashcard_created: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Set screen: the current set, its cards, and card mutations.
pub struct SetController {
    auth: Arc<AuthRepository>,
    flashcards: Arc<FlashcardRepository>,
    users: Arc<UserRepository>,
    state: Mutex<SetState>,
    set_generation: Generation,
    cards_generation: Generation,
}

impl SetController {
    pub fn new(
        auth: Arc<AuthRepository>,
        flashcards: Arc<FlashcardRepository>,
        users: Arc<UserRepository>,
    ) -> SetController {
        SetController {
            auth,
            flashcards,
            users,
            state: Mutex::new(SetState::default()),
            set_generation: Generation::default(),
            cards_generation: Generation::default(),
        }
    }

    pub fn snapshot(&self) -> SetState {
        self.state.lock().unwrap().clone()
    }

    /// Loads the set and records the access in the user's recents.
    pub async fn load_set(&self, set_id: &str) {
        let token = self.set_generation.begin();
        self.state.lock().unwrap().is_loading = true;

        let result = self.flashcards.get_set_by_id(set_id).await;

        {
            let mut state = self.state.lock().unwrap();
            if !self.set_generation.is_current(token) {
                return;
            }
            state.is_loading = false;
            match &result {
                Ok(set) => {
                    state.current_set = Some(set.clone());
                    state.error = None;
                }
                Err(err) => {
                    error!("failed to load set {set_id}: {err}");
                    state.error = Some(err.to_string());
                }
            }
        }

        if result.is_ok() {
            if let Some(user) = self.auth.current_user() {
                if let Err(err) = self.users.update_recent_sets(&user.id, set_id).await {
                    warn!("failed to record recent set {set_id}: {err}");
                }
            }
        }
    }

    pub async fn load_flashcards(&self, set_id: &str) {
        let token = self.cards_generation.begin();
        self.state.lock().unwrap().is_loading = true;

        let result = self.flashcards.get_flashcards_by_set_id(set_id).await;

        let mut state = self.state.lock().unwrap();
        if !self.cards_generation.is_current(token) {
            return;
        }
        state.is_loading = false;
        match result {
            Ok(cards) => {
                state.flashcards = cards;
                state.error = None;
            }
            Err(err) => {
                error!("failed to load flashcards for set {set_id}: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    pub async fn create_set(&self, title: &str, description: &str) {
        let Some(user) = self.auth.current_user() else {
            return;
        };

        self.state.lock().unwrap().is_loading = true;
        let set = FlashcardSet::new(title, description, user.id);
        let result = self.flashcards.create_set(&set).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(id) => {
                state.created_set_id = Some(id);
                state.error = None;
            }
            Err(err) => {
                error!("failed to create set: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    pub fn reset_created_set_id(&self) {
        self.state.lock().unwrap().created_set_id = None;
    }

    pub async fn create_flashcard(&self, set_id: &str, question: &str, answer: &str) {
        if set_id.trim().is_empty() || question.trim().is_empty() || answer.trim().is_empty() {
            warn!("refusing to create flashcard from blank fields");
            return;
        }

        self.state.lock().unwrap().is_loading = true;
        let card = Flashcard::new(set_id, question, answer);
        let result = self.flashcards.create_flashcard(&card).await;

        match result {
            Ok(_) => {
                self.state.lock().unwrap().flashcard_created = true;
                // Refresh both the list and the set's card count.
                self.load_flashcards(set_id).await;
                self.load_set(set_id).await;
            }
            Err(err) => {
                error!("failed to create flashcard: {err}");
                let mut state = self.state.lock().unwrap();
                state.is_loading = false;
                state.error = Some(err.to_string());
            }
        }
    }

    pub fn reset_flashcard_created(&self) {
        self.state.lock().unwrap().flashcard_created = false;
    }

    pub async fn update_flashcard(&self, card: &Flashcard, question: &str, answer: &str) {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return;
        }

        let mut updated = card.clone();
        updated.question = question.to_string();
        updated.answer = answer.to_string();
        updated.updated_at = now_ms();

        self.state.lock().unwrap().is_loading = true;
        let result = self.flashcards.update_flashcard(&updated).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(()) => {
                if let Some(existing) = state.flashcards.iter_mut().find(|c| c.id == card.id) {
                    *existing = updated;
                }
                state.error = None;
            }
            Err(err) => {
                error!("failed to update flashcard {}: {err}", card.id);
                state.error = Some(err.to_string());
            }
        }
    }

    pub async fn delete_flashcard(&self, card: &Flashcard) {
        self.state.lock().unwrap().is_loading = true;
        let result = self.flashcards.delete_flashcard(card).await;

        match result {
            Ok(()) => {
                {
                    let mut state = self.state.lock().unwrap();
                    state.flashcards.retain(|c| c.id != card.id);
                    state.error = None;
                }
                // Refresh the set's card count.
                self.load_set(&card.set_id).await;
            }
            Err(err) => {
                error!("failed to delete flashcard {}: {err}", card.id);
                let mut state = self.state.lock().unwrap();
                state.is_loading = false;
                state.error = Some(err.to_string());
            }
        }
    }

    pub async fn delete_set(&self, set_id: &str) {
        self.state.lock().unwrap().is_loading = true;
        let result = self.flashcards.delete_set(set_id).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(()) => {
                state.error = None;
            }
            Err(err) => {
                error!("failed to delete set {set_id}: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    pub fn shuffle_flashcards(&self) {
        let mut state = self.state.lock().unwrap();
        state.flashcards.shuffle(&mut thread_rng());
    }

    /// Drops the displayed data and reloads the set and its cards.
    pub async fn force_refresh(&self, set_id: &str) {
        {
            let mut state = self.state.lock().unwrap();
            state.flashcards.clear();
            state.current_set = None;
        }
        self.load_set(set_id).await;
        self.load_flashcards(set_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    struct Fixture {
        auth: Arc<AuthRepository>,
        controller: SetController,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(AuthRepository::new(store.clone(), store.clone()));
        auth.register("Ana", "ana@example.com", "pw").await.unwrap();
        let flashcards = Arc::new(FlashcardRepository::new(store.clone()));
        let users = Arc::new(UserRepository::new(store));
        let controller = SetController::new(auth.clone(), flashcards, users);
        Fixture { auth, controller }
    }

    async fn created_set(fixture: &Fixture) -> String {
        fixture.controller.create_set("Spanish 101", "basics").await;
        let id = fixture.controller.snapshot().created_set_id.unwrap();
        fixture.controller.reset_created_set_id();
        assert!(fixture.controller.snapshot().created_set_id.is_none());
        id
    }

    #[tokio::test]
    async fn create_card_reloads_list_and_count() {
        let fixture = fixture().await;
        let set_id = created_set(&fixture).await;

        fixture.controller.create_flashcard(&set_id, "hola", "hello").await;
        fixture.controller.create_flashcard(&set_id, "adios", "goodbye").await;

        let state = fixture.controller.snapshot();
        assert!(state.flashcard_created);
        assert_eq!(state.flashcards.len(), 2);
        assert_eq!(state.current_set.as_ref().unwrap().card_count, 2);
        assert!(!state.is_loading);

        fixture.controller.reset_flashcard_created();
        assert!(!fixture.controller.snapshot().flashcard_created);
    }

    #[tokio::test]
    async fn blank_card_fields_are_rejected() {
        let fixture = fixture().await;
        let set_id = created_set(&fixture).await;

        fixture.controller.create_flashcard(&set_id, "  ", "hello").await;
        fixture.controller.create_flashcard(&set_id, "hola", "").await;

        fixture.controller.load_flashcards(&set_id).await;
        assert!(fixture.controller.snapshot().flashcards.is_empty());
    }

    #[tokio::test]
    async fn delete_card_updates_list_and_count() {
        let fixture = fixture().await;
        let set_id = created_set(&fixture).await;
        fixture.controller.create_flashcard(&set_id, "hola", "hello").await;
        fixture.controller.create_flashcard(&set_id, "adios", "goodbye").await;

        let card = fixture
            .controller
            .snapshot()
            .flashcards
            .iter()
            .find(|c| c.question == "hola")
            .unwrap()
            .clone();
        fixture.controller.delete_flashcard(&card).await;

        let state = fixture.controller.snapshot();
        assert_eq!(state.flashcards.len(), 1);
        assert_eq!(state.flashcards[0].question, "adios");
        assert_eq!(state.current_set.as_ref().unwrap().card_count, 1);
    }

    #[tokio::test]
    async fn update_card_rewrites_the_local_copy() {
        let fixture = fixture().await;
        let set_id = created_set(&fixture).await;
        fixture.controller.create_flashcard(&set_id, "hola", "hllo").await;

        let card = fixture.controller.snapshot().flashcards[0].clone();
        fixture.controller.update_flashcard(&card, "hola", "hello").await;

        let state = fixture.controller.snapshot();
        assert_eq!(state.flashcards[0].answer, "hello");
        assert!(state.flashcards[0].updated_at >= card.updated_at);
    }

    #[tokio::test]
    async fn loading_a_set_records_it_in_recents() {
        let fixture = fixture().await;
        let set_id = created_set(&fixture).await;

        fixture.controller.load_set(&set_id).await;

        let user_id = fixture.auth.current_user().unwrap().id;
        let users = &fixture.controller.users;
        let profile = users.get_user_profile(&user_id).await.unwrap().unwrap();
        assert_eq!(profile.recent_sets, [set_id]);
    }

    #[tokio::test]
    async fn shuffle_keeps_the_same_cards() {
        let fixture = fixture().await;
        let set_id = created_set(&fixture).await;
        for i in 0..8 {
            fixture
                .controller
                .create_flashcard(&set_id, &format!("q{i}"), &format!("a{i}"))
                .await;
        }

        let before = fixture.controller.snapshot().flashcards;
        fixture.controller.shuffle_flashcards();
        let after = fixture.controller.snapshot().flashcards;

        assert_eq!(before.len(), after.len());
        let mut before_ids: Vec<String> = before.into_iter().map(|c| c.id).collect();
        let mut after_ids: Vec<String> = after.into_iter().map(|c| c.id).collect();
        before_ids.sort();
        after_ids.sort();
        assert_eq!(before_ids, after_ids);
    }

    #[tokio::test]
    async fn force_refresh_reloads_everything() {
        let fixture = fixture().await;
        let set_id = created_set(&fixture).await;
        fixture.controller.create_flashcard(&set_id, "hola", "hello").await;

        fixture.controller.force_refresh(&set_id).await;

        let state = fixture.controller.snapshot();
        assert!(state.current_set.is_some());
        assert_eq!(state.flashcards.len(), 1);
    }
}
