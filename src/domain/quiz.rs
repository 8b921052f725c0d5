use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::flashcard::Flashcard;

/// One multiple-choice question. Generated per quiz session, never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    /// 1 correct answer plus up to 3 distractors, shuffled.
    pub options: Vec<String>,
    pub correct_answer: String,
    pub flashcard_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredQuestion {
    pub question: QuizQuestion,
    pub selected_answer: String,
    pub is_correct: bool,
}

impl AnsweredQuestion {
    /// Correctness is exact, case-sensitive string equality with the
    /// question's correct answer.
    pub fn new(question: QuizQuestion, selected_answer: impl Into<String>) -> Self {
        let selected_answer = selected_answer.into();
        let is_correct = selected_answer == question.correct_answer;
        AnsweredQuestion {
            question,
            selected_answer,
            is_correct,
        }
    }
}

/// Builds one question per card. Distractors are other cards' answers,
/// sampled without replacement; duplicate answers across cards are kept
/// as-is, so options may repeat when source answers repeat.
pub fn generate_questions<R: Rng>(cards: &[Flashcard], rng: &mut R) -> Vec<QuizQuestion> {
    cards
        .iter()
        .map(|card| {
            let other_answers: Vec<&str> = cards
                .iter()
                .filter(|other| other.id != card.id)
                .map(|other| other.answer.as_str())
                .collect();

            let mut options: Vec<String> = other_answers
                .choose_multiple(rng, 3)
                .map(|answer| answer.to_string())
                .collect();
            options.push(card.answer.clone());
            options.shuffle(rng);

            QuizQuestion {
                id: card.id.clone(),
                question: card.question.clone(),
                options,
                correct_answer: card.answer.clone(),
                flashcard_id: card.id.clone(),
            }
        })
        .collect()
}

/// Session score: correct answers over total recorded answers.
pub fn score(answered: &[AnsweredQuestion]) -> (usize, usize) {
    let correct = answered.iter().filter(|a| a.is_correct).count();
    (correct, answered.len())
}
