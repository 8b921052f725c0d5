use std::sync::Arc;

use crate::controller::album::AlbumController;
use crate::controller::auth::AuthController;
use crate::controller::home::HomeController;
use crate::controller::profile::ProfileController;
use crate::controller::quiz::QuizController;
use crate::controller::set::SetController;
use crate::repository::auth_repository::AuthRepository;
use crate::repository::flashcard_repository::FlashcardRepository;
use crate::repository::user_repository::UserRepository;
use crate::store::auth::AuthProvider;
use crate::store::gateway::DocumentStore;

/// Wires the application once at startup: one gateway client, one auth
/// provider, repositories built from them, controllers built on demand
/// from the repositories. No global state.
pub struct App {
    pub auth: Arc<AuthRepository>,
    pub flashcards: Arc<FlashcardRepository>,
    pub users: Arc<UserRepository>,
}

impl App {
    pub fn new(provider: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> App {
        let auth = Arc::new(AuthRepository::new(provider, store.clone()));
        let flashcards = Arc::new(FlashcardRepository::new(store.clone()));
        let users = Arc::new(UserRepository::new(store));
        App {
            auth,
            flashcards,
            users,
        }
    }

    pub fn auth_controller(&self) -> AuthController {
        AuthController::new(self.auth.clone())
    }

    pub fn home_controller(&self) -> HomeController {
        HomeController::new(self.auth.clone(), self.flashcards.clone())
    }

    pub fn album_controller(&self) -> AlbumController {
        AlbumController::new(self.auth.clone(), self.flashcards.clone())
    }

    pub fn set_controller(&self) -> SetController {
        SetController::new(self.auth.clone(), self.flashcards.clone(), self.users.clone())
    }

    pub fn quiz_controller(&self) -> QuizController {
        QuizController::new(self.flashcards.clone())
    }

    pub fn profile_controller(&self) -> ProfileController {
        ProfileController::new(self.auth.clone(), self.users.clone())
    }
}
