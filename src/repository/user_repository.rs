use std::sync::Arc;

use log::debug;
use serde_json::{json, Map};

use crate::domain::user::User;
use crate::store::gateway::{DocumentStore, StoreError, USERS};

use super::repository::RepositoryError;

/// Upper bound on the recents list kept on the user document.
pub const MAX_RECENT_SETS: usize = 5;

pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> UserRepository {
        UserRepository { store }
    }

    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        match self.store.get(USERS, user_id).await? {
            Some(doc) => {
                let user = serde_json::from_value(doc).map_err(StoreError::from)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Full overwrite by id.
    pub async fn update_user_profile(&self, user: &User) -> Result<(), RepositoryError> {
        let doc = serde_json::to_value(user).map_err(StoreError::from)?;
        self.store.put(USERS, &user.id, doc).await?;
        Ok(())
    }

    /// Moves `set_id` to the front of the user's recents, de-duplicated and
    /// capped at [`MAX_RECENT_SETS`]. Fails when the user document is absent.
    pub async fn update_recent_sets(
        &self,
        user_id: &str,
        set_id: &str,
    ) -> Result<(), RepositoryError> {
        let user = self
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("user".to_string(), user_id.to_string()))?;

        let mut recent = Vec::with_capacity(MAX_RECENT_SETS + 1);
        recent.push(set_id.to_string());
        for id in user.recent_sets {
            if !recent.contains(&id) {
                recent.push(id);
            }
        }
        recent.truncate(MAX_RECENT_SETS);

        let mut fields = Map::new();
        fields.insert("recentSets".to_string(), json!(recent));
        self.store.update(USERS, user_id, fields).await?;
        debug!("recent sets for {user_id}: {recent:?}");
        Ok(())
    }
}
