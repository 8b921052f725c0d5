use serde::{Deserialize, Serialize};

use crate::utils::time_utils::now_ms;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    pub user_id: String,
    /// Derived counter, maintained transactionally on card insert/delete.
    /// Never negative; repaired by an explicit recount when drifted.
    #[serde(default)]
    pub card_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_accessed: i64,
}

impl FlashcardSet {
    pub fn new(title: impl Into<String>, description: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = now_ms();
        FlashcardSet {
            id: String::new(),
            title: title.into(),
            description: description.into(),
            user_id: user_id.into(),
            card_count: 0,
            created_at: now,
            updated_at: now,
            last_accessed: now,
        }
    }
}
