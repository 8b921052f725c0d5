use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::auth::{hash_password, AuthError, AuthProvider, AuthUser};
use super::gateway::{DocumentStore, Query, StoreError, TransactFn};

#[derive(Default)]
struct Collections {
    documents: HashMap<String, BTreeMap<String, Value>>,
    credentials: HashMap<String, Credential>,
}

struct Credential {
    user_id: String,
    password_hash: String,
}

/// In-memory backend implementing both the document store and the auth
/// provider. Used by tests and by ephemeral `--memory` runs. All mutations
/// happen under one lock, which is what makes `transact` atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .documents
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .documents
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let doc = inner
            .documents
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(collection.to_string(), id.to_string()))?;

        match doc {
            Value::Object(map) => {
                for (key, value) in fields {
                    map.insert(key, value);
                }
                Ok(())
            }
            _ => Err(StoreError::Backend(format!(
                "document {collection}/{id} is not an object"
            ))),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(docs) = inner.documents.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut docs: Vec<Value> = inner
            .documents
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        query.apply(&mut docs);
        Ok(docs)
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError> {
        Ok(self.query(collection, query).await?.len() as u64)
    }

    async fn transact(
        &self,
        collection: &str,
        id: &str,
        apply: TransactFn,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let current = inner
            .documents
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned();
        if let Some(updated) = apply(current) {
            inner
                .documents
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), updated);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.credentials.contains_key(email) {
            return Err(AuthError::EmailTaken(email.to_string()));
        }
        let user_id = Uuid::new_v4().to_string();
        inner.credentials.insert(
            email.to_string(),
            Credential {
                user_id: user_id.clone(),
                password_hash: hash_password(password),
            },
        );
        Ok(AuthUser {
            id: user_id,
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let inner = self.inner.lock().unwrap();
        let credential = inner
            .credentials
            .get(email)
            .ok_or(AuthError::InvalidCredentials)?;
        if credential.password_hash != hash_password(password) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(AuthUser {
            id: credential.user_id.clone(),
            email: email.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::gateway::{Direction, Op};
    use serde_json::json;

    #[tokio::test]
    async fn put_get_update_delete_roundtrip() {
        let store = MemoryStore::new();
        store
            .put("sets", "s1", json!({"title": "Spanish", "cardCount": 0}))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("cardCount".to_string(), json!(2));
        store.update("sets", "s1", fields).await.unwrap();

        let doc = store.get("sets", "s1").await.unwrap().unwrap();
        assert_eq!(doc["cardCount"], 2);
        assert_eq!(doc["title"], "Spanish");

        store.delete("sets", "s1").await.unwrap();
        assert!(store.get("sets", "s1").await.unwrap().is_none());
        // Deleting again is fine.
        store.delete("sets", "s1").await.unwrap();
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("sets", "nope", Map::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn queries_filter_order_and_count() {
        let store = MemoryStore::new();
        for (id, user, at) in [("a", "u1", 10), ("b", "u2", 30), ("c", "u1", 20)] {
            store
                .put("sets", id, json!({"id": id, "userId": user, "lastAccessed": at}))
                .await
                .unwrap();
        }

        let query = Query::new()
            .filter("userId", Op::Eq, "u1")
            .order_by("lastAccessed", Direction::Descending);
        let docs = store.query("sets", &query).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["c", "a"]);

        assert_eq!(store.count("sets", &query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn transact_skips_write_when_closure_returns_none() {
        let store = MemoryStore::new();
        store
            .transact("sets", "missing", Box::new(|doc| doc))
            .await
            .unwrap();
        assert!(store.get("sets", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let store = MemoryStore::new();
        let user = store.sign_up("a@b.c", "pw").await.unwrap();

        let again = store.sign_up("a@b.c", "pw").await.unwrap_err();
        assert!(matches!(again, AuthError::EmailTaken(_)));

        let signed_in = store.sign_in("a@b.c", "pw").await.unwrap();
        assert_eq!(signed_in, user);

        let wrong = store.sign_in("a@b.c", "nope").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        let unknown = store.sign_in("x@y.z", "pw").await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }
}
