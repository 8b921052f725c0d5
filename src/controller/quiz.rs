use std::sync::{Arc, Mutex};

use log::error;

use crate::domain::quiz::{self, AnsweredQuestion, QuizQuestion};
use crate::domain::set::FlashcardSet;
use crate::repository::flashcard_repository::FlashcardRepository;

use super::generation::Generation;

#[derive(Clone, Default)]
pub struct QuizState {
    pub current_set: Option<FlashcardSet>,
    pub questions: Vec<QuizQuestion>,
    pub answered: Vec<AnsweredQuestion>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Quiz screen: generated questions and the answers recorded so far.
pub struct QuizController {
    flashcards: Arc<FlashcardRepository>,
    state: Mutex<QuizState>,
    questions_generation: Generation,
}

impl QuizController {
    pub fn new(flashcards: Arc<FlashcardRepository>) -> QuizController {
        QuizController {
            flashcards,
            state: Mutex::new(QuizState::default()),
            questions_generation: Generation::default(),
        }
    }

    pub fn snapshot(&self) -> QuizState {
        self.state.lock().unwrap().clone()
    }

    pub async fn load_set(&self, set_id: &str) {
        self.state.lock().unwrap().is_loading = true;
        let result = self.flashcards.get_set_by_id(set_id).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(set) => {
                state.current_set = Some(set);
                state.error = None;
            }
            Err(err) => {
                error!("failed to load set {set_id}: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    pub async fn generate_quiz(&self, set_id: &str) {
        let token = self.questions_generation.begin();
        self.state.lock().unwrap().is_loading = true;

        let result = self.flashcards.generate_quiz_questions(set_id).await;

        let mut state = self.state.lock().unwrap();
        if !self.questions_generation.is_current(token) {
            return;
        }
        state.is_loading = false;
        match result {
            Ok(questions) => {
                state.questions = questions;
                state.error = None;
            }
            Err(err) => {
                error!("failed to generate quiz for set {set_id}: {err}");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Records the selection and returns whether it was correct.
    pub fn record_answer(&self, question: QuizQuestion, selected_answer: &str) -> bool {
        let answered = AnsweredQuestion::new(question, selected_answer);
        let is_correct = answered.is_correct;
        self.state.lock().unwrap().answered.push(answered);
        is_correct
    }

    /// (correct, total) over the answers recorded so far.
    pub fn score(&self) -> (usize, usize) {
        quiz::score(&self.state.lock().unwrap().answered)
    }

    pub fn reset_quiz(&self) {
        let mut state = self.state.lock().unwrap();
        state.questions.clear();
        state.answered.clear();
    }
}
