use std::{fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

use flashlearn::app::App;
use flashlearn::domain::flashcard::Flashcard;
use flashlearn::domain::set::FlashcardSet;
use flashlearn::repository::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Deserialize, Debug)]
pub struct SetFile {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cards: Vec<CardEntry>,
}

#[derive(Deserialize, Debug)]
pub struct CardEntry {
    pub question: String,
    pub answer: String,
}

/// Creates a set (with its cards) from a TOML file. Cards go through the
/// normal create path so the set's counter stays maintained.
pub async fn import_set<P: AsRef<Path>>(
    app: &App,
    user_id: &str,
    path: P,
) -> Result<(String, usize), ImportError> {
    let data = fs::read_to_string(path)?;
    let file: SetFile = toml::from_str(&data)?;

    let set = FlashcardSet::new(&file.title, &file.description, user_id);
    let set_id = app.flashcards.create_set(&set).await?;
    for card in &file.cards {
        app.flashcards
            .create_flashcard(&Flashcard::new(&set_id, &card.question, &card.answer))
            .await?;
    }
    Ok((set_id, file.cards.len()))
}
