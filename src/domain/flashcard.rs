use serde::{Deserialize, Serialize};

use crate::utils::time_utils::now_ms;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    #[serde(default)]
    pub id: String,
    pub question: String,
    pub answer: String,
    /// Owning set. A card belongs to exactly one set.
    pub set_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Flashcard {
    pub fn new(set_id: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let now = now_ms();
        Flashcard {
            id: String::new(),
            question: question.into(),
            answer: answer.into(),
            set_id: set_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
