use std::sync::Arc;

use log::{debug, warn};
use rand::thread_rng;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::flashcard::Flashcard;
use crate::domain::quiz::{self, QuizQuestion};
use crate::domain::set::FlashcardSet;
use crate::store::gateway::{DocumentStore, Direction, Op, Query, StoreError, FLASHCARDS, SETS};
use crate::utils::time_utils::now_ms;

use super::repository::RepositoryError;

pub const RECENT_SETS_LIMIT: usize = 3;

pub struct FlashcardRepository {
    store: Arc<dyn DocumentStore>,
}

impl FlashcardRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> FlashcardRepository {
        FlashcardRepository { store }
    }

    // Sets

    /// Assigns a fresh id, persists, and returns the id.
    pub async fn create_set(&self, set: &FlashcardSet) -> Result<String, RepositoryError> {
        let mut set = set.clone();
        set.id = Uuid::new_v4().to_string();
        let doc = serde_json::to_value(&set).map_err(StoreError::from)?;
        self.store.put(SETS, &set.id, doc).await?;
        debug!("set created: {}", set.id);
        Ok(set.id)
    }

    /// Full overwrite by id.
    pub async fn update_set(&self, set: &FlashcardSet) -> Result<(), RepositoryError> {
        let doc = serde_json::to_value(set).map_err(StoreError::from)?;
        self.store.put(SETS, &set.id, doc).await?;
        Ok(())
    }

    /// Deletes the set document, then every card referencing it, one at a
    /// time. Not atomic: a failure partway leaves orphaned cards behind.
    pub async fn delete_set(&self, set_id: &str) -> Result<(), RepositoryError> {
        self.store.delete(SETS, set_id).await?;

        let query = Query::new().filter("setId", Op::Eq, set_id);
        let cards = self.store.query(FLASHCARDS, &query).await?;
        debug!("found {} flashcards to delete for set {set_id}", cards.len());
        for card in cards {
            if let Some(card_id) = card.get("id").and_then(Value::as_str) {
                self.store.delete(FLASHCARDS, card_id).await?;
            }
        }
        Ok(())
    }

    /// All of the user's sets, most recently accessed first.
    pub async fn get_user_sets(&self, user_id: &str) -> Result<Vec<FlashcardSet>, RepositoryError> {
        let query = Query::new()
            .filter("userId", Op::Eq, user_id)
            .order_by("lastAccessed", Direction::Descending);
        let docs = self.store.query(SETS, &query).await?;
        decode_all(docs)
    }

    pub async fn get_recent_sets(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<FlashcardSet>, RepositoryError> {
        let query = Query::new()
            .filter("userId", Op::Eq, user_id)
            .order_by("lastAccessed", Direction::Descending)
            .limit(limit);
        let docs = self.store.query(SETS, &query).await?;
        decode_all(docs)
    }

    /// Reads the set, then stamps `lastAccessed` as a second, best-effort
    /// step. The returned value is the one that was read.
    pub async fn get_set_by_id(&self, set_id: &str) -> Result<FlashcardSet, RepositoryError> {
        let doc = self
            .store
            .get(SETS, set_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("set".to_string(), set_id.to_string()))?;
        let set: FlashcardSet = serde_json::from_value(doc).map_err(StoreError::from)?;

        let mut fields = Map::new();
        fields.insert("lastAccessed".to_string(), json!(now_ms()));
        if let Err(err) = self.store.update(SETS, set_id, fields).await {
            warn!("failed to touch lastAccessed on set {set_id}: {err}");
        }

        Ok(set)
    }

    // Flashcards

    /// Persists the card, then bumps the parent set's counter in a
    /// single-document transaction. A missing parent skips the bump.
    pub async fn create_flashcard(&self, card: &Flashcard) -> Result<String, RepositoryError> {
        let mut card = card.clone();
        card.id = Uuid::new_v4().to_string();
        let doc = serde_json::to_value(&card).map_err(StoreError::from)?;
        self.store.put(FLASHCARDS, &card.id, doc).await?;
        debug!("flashcard created: {} in set {}", card.id, card.set_id);

        let set_id = card.set_id.clone();
        self.store
            .transact(
                SETS,
                &card.set_id,
                Box::new(move |doc| match doc {
                    Some(mut doc) => {
                        let count = doc.get("cardCount").and_then(Value::as_i64).unwrap_or(0);
                        doc["cardCount"] = json!(count + 1);
                        Some(doc)
                    }
                    None => {
                        warn!("set {set_id} not found when updating card count");
                        None
                    }
                }),
            )
            .await?;

        Ok(card.id)
    }

    /// Full overwrite by id.
    pub async fn update_flashcard(&self, card: &Flashcard) -> Result<(), RepositoryError> {
        let doc = serde_json::to_value(card).map_err(StoreError::from)?;
        self.store.put(FLASHCARDS, &card.id, doc).await?;
        Ok(())
    }

    /// Deletes the card, then decrements the parent set's counter, floored
    /// at zero. Skipped when the set is missing or already at zero.
    pub async fn delete_flashcard(&self, card: &Flashcard) -> Result<(), RepositoryError> {
        self.store.delete(FLASHCARDS, &card.id).await?;
        debug!("flashcard deleted: {} from set {}", card.id, card.set_id);

        let set_id = card.set_id.clone();
        self.store
            .transact(
                SETS,
                &card.set_id,
                Box::new(move |doc| match doc {
                    Some(mut doc) => {
                        let count = doc.get("cardCount").and_then(Value::as_i64).unwrap_or(0);
                        if count > 0 {
                            doc["cardCount"] = json!(count - 1);
                            Some(doc)
                        } else {
                            None
                        }
                    }
                    None => {
                        warn!("set {set_id} not found when updating card count");
                        None
                    }
                }),
            )
            .await?;

        Ok(())
    }

    /// All cards in the set, in no particular order.
    pub async fn get_flashcards_by_set_id(
        &self,
        set_id: &str,
    ) -> Result<Vec<Flashcard>, RepositoryError> {
        let query = Query::new().filter("setId", Op::Eq, set_id);
        let docs = self.store.query(FLASHCARDS, &query).await?;
        decode_all(docs)
    }

    pub async fn get_flashcard_by_id(&self, card_id: &str) -> Result<Flashcard, RepositoryError> {
        let doc = self
            .store
            .get(FLASHCARDS, card_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("flashcard".to_string(), card_id.to_string()))?;
        serde_json::from_value(doc)
            .map_err(StoreError::from)
            .map_err(RepositoryError::from)
    }

    // Search

    /// Case-insensitive substring match on title or description, filtered
    /// client-side over the user's sets. A blank query matches nothing.
    pub async fn search_sets(
        &self,
        user_id: &str,
        search: &str,
    ) -> Result<Vec<FlashcardSet>, RepositoryError> {
        if search.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new().filter("userId", Op::Eq, user_id);
        let docs = self.store.query(SETS, &query).await?;
        let needle = search.to_lowercase();
        let sets: Vec<FlashcardSet> = decode_all(docs)?
            .into_iter()
            .filter(|set: &FlashcardSet| {
                set.title.to_lowercase().contains(&needle)
                    || set.description.to_lowercase().contains(&needle)
            })
            .collect();
        debug!("found {} sets matching {search:?}", sets.len());
        Ok(sets)
    }

    // Quiz

    pub async fn generate_quiz_questions(
        &self,
        set_id: &str,
    ) -> Result<Vec<QuizQuestion>, RepositoryError> {
        let cards = self.get_flashcards_by_set_id(set_id).await?;
        debug!("generating quiz from {} cards in set {set_id}", cards.len());
        let mut rng = thread_rng();
        Ok(quiz::generate_questions(&cards, &mut rng))
    }

    // Counter reconciliation

    /// Authoritative server-side count of the set's cards.
    pub async fn get_flashcard_count(&self, set_id: &str) -> Result<u64, RepositoryError> {
        let query = Query::new().filter("setId", Op::Eq, set_id);
        Ok(self.store.count(FLASHCARDS, &query).await?)
    }

    /// Repairs a drifted `cardCount` from the authoritative count.
    pub async fn recount_card_count(&self, set_id: &str) -> Result<(), RepositoryError> {
        let count = self.get_flashcard_count(set_id).await?;
        let mut fields = Map::new();
        fields.insert("cardCount".to_string(), json!(count));
        self.store.update(SETS, set_id, fields).await?;
        debug!("recounted set {set_id} to {count} cards");
        Ok(())
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, RepositoryError> {
    docs.into_iter()
        .map(|doc| {
            serde_json::from_value(doc)
                .map_err(StoreError::from)
                .map_err(RepositoryError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn repository() -> FlashcardRepository {
        FlashcardRepository::new(Arc::new(MemoryStore::new()))
    }

    async fn seeded_set(repository: &FlashcardRepository, title: &str) -> String {
        repository
            .create_set(&FlashcardSet::new(title, "", "u1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn card_count_follows_creates_and_deletes() {
        let repository = repository();
        let set_id = seeded_set(&repository, "Spanish 101").await;

        for i in 0..3 {
            repository
                .create_flashcard(&Flashcard::new(&set_id, format!("q{i}"), format!("a{i}")))
                .await
                .unwrap();
        }
        assert_eq!(repository.get_set_by_id(&set_id).await.unwrap().card_count, 3);

        let cards = repository.get_flashcards_by_set_id(&set_id).await.unwrap();
        repository.delete_flashcard(&cards[0]).await.unwrap();
        assert_eq!(repository.get_set_by_id(&set_id).await.unwrap().card_count, 2);
        assert_eq!(repository.get_flashcard_count(&set_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn card_count_never_goes_negative() {
        let repository = repository();
        let set_id = seeded_set(&repository, "Empty").await;

        // A card the set never counted.
        let mut stray = Flashcard::new(&set_id, "q", "a");
        stray.id = "stray".to_string();
        repository.delete_flashcard(&stray).await.unwrap();

        assert_eq!(repository.get_set_by_id(&set_id).await.unwrap().card_count, 0);
    }

    #[tokio::test]
    async fn create_into_missing_set_still_creates_the_card() {
        let repository = repository();
        let id = repository
            .create_flashcard(&Flashcard::new("ghost-set", "q", "a"))
            .await
            .unwrap();

        assert_eq!(repository.get_flashcard_by_id(&id).await.unwrap().question, "q");
        assert!(matches!(
            repository.get_set_by_id("ghost-set").await.unwrap_err(),
            RepositoryError::NotFound(_, _)
        ));
    }

    #[tokio::test]
    async fn get_set_by_id_touches_last_accessed() {
        let repository = repository();
        let set_id = seeded_set(&repository, "Touch").await;

        let first = repository.get_set_by_id(&set_id).await.unwrap();
        // Read the stored document directly: the touch is a separate write
        // that lands after the read returns.
        let doc = repository.store.get(SETS, &set_id).await.unwrap().unwrap();
        let touched = doc["lastAccessed"].as_i64().unwrap();
        assert!(touched >= first.last_accessed);

        let second = repository.get_set_by_id(&set_id).await.unwrap();
        assert!(second.last_accessed >= first.last_accessed);
    }

    #[tokio::test]
    async fn recount_repairs_a_drifted_counter() {
        let repository = repository();
        let set_id = seeded_set(&repository, "Drift").await;
        repository
            .create_flashcard(&Flashcard::new(&set_id, "q", "a"))
            .await
            .unwrap();

        // Drift the stored counter.
        let mut fields = Map::new();
        fields.insert("cardCount".to_string(), json!(42));
        repository.store.update(SETS, &set_id, fields).await.unwrap();

        repository.recount_card_count(&set_id).await.unwrap();
        assert_eq!(repository.get_set_by_id(&set_id).await.unwrap().card_count, 1);
    }

    #[tokio::test]
    async fn delete_set_cascades_to_cards() {
        let repository = repository();
        let set_id = seeded_set(&repository, "Cascade").await;
        for i in 0..3 {
            repository
                .create_flashcard(&Flashcard::new(&set_id, format!("q{i}"), format!("a{i}")))
                .await
                .unwrap();
        }
        let other_set = seeded_set(&repository, "Other").await;
        repository
            .create_flashcard(&Flashcard::new(&other_set, "kept", "kept"))
            .await
            .unwrap();

        repository.delete_set(&set_id).await.unwrap();

        assert!(repository.get_set_by_id(&set_id).await.is_err());
        assert!(repository
            .get_flashcards_by_set_id(&set_id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repository.get_flashcards_by_set_id(&other_set).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn search_matches_title_and_description_case_insensitively() {
        let repository = repository();
        repository
            .create_set(&FlashcardSet::new("Spanish 101", "basic vocabulary", "u1"))
            .await
            .unwrap();
        repository
            .create_set(&FlashcardSet::new("Biology", "cells and SPANISH cognates", "u1"))
            .await
            .unwrap();
        repository
            .create_set(&FlashcardSet::new("History", "dates", "u2"))
            .await
            .unwrap();

        let hits = repository.search_sets("u1", "spanish").await.unwrap();
        assert_eq!(hits.len(), 2);

        assert!(repository.search_sets("u1", "algebra").await.unwrap().is_empty());
        // Blank queries match nothing by contract.
        assert!(repository.search_sets("u1", "").await.unwrap().is_empty());
        assert!(repository.search_sets("u1", "   ").await.unwrap().is_empty());
        // Other users' sets are never searched.
        assert!(repository.search_sets("u2", "spanish").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_sets_are_ordered_and_limited() {
        let repository = repository();
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut set = FlashcardSet::new(format!("set {i}"), "", "u1");
            set.last_accessed = 1000 + i as i64;
            ids.push(repository.create_set(&set).await.unwrap());
        }

        let recent = repository.get_recent_sets("u1", RECENT_SETS_LIMIT).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, ids[4]);
        assert_eq!(recent[1].id, ids[3]);
        assert_eq!(recent[2].id, ids[2]);

        let all = repository.get_user_sets("u1").await.unwrap();
        assert_eq!(all.len(), 5);
    }
}
