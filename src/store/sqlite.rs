use std::io;

use async_trait::async_trait;
use directories::ProjectDirs;
use serde_json::{Map, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{
    migrate::{MigrateDatabase, MigrateError},
    Pool, Row, SqlitePool,
};
use thiserror::Error;
use uuid::Uuid;

use super::auth::{hash_password, AuthError, AuthProvider, AuthUser};
use super::gateway::{DocumentStore, Query, StoreError, TransactFn};

/// SQLite-backed document store for local runs. Documents are JSON blobs
/// keyed by (collection, id); filtering and ordering happen on the decoded
/// values, shared with the memory backend.
pub struct SqliteStore {
    pool: Pool<sqlx::Sqlite>,
}

#[derive(Debug, Error)]
pub enum OpenStoreError {
    #[error("failed to create directory: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("home directory not found")]
    NoHomeDir,

    #[error("migrate error: {0}")]
    MigrateError(#[from] MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> StoreError {
        StoreError::Backend(err.to_string())
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database under the platform data dir.
    pub async fn open_default() -> Result<SqliteStore, OpenStoreError> {
        let mut path = ProjectDirs::from("com", "pam", "flashlearn")
            .ok_or(OpenStoreError::NoHomeDir)?
            .data_local_dir()
            .to_path_buf();
        path.push("flashlearn.sqlite");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}", path.display());
        if !sqlx::Sqlite::database_exists(&db_url)
            .await
            .unwrap_or(false)
        {
            sqlx::Sqlite::create_database(&db_url).await?;
        }
        let pool = SqlitePool::connect(&db_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(SqliteStore { pool })
    }

    /// Private in-memory database, one connection so it isn't dropped
    /// between acquires. Used by tests.
    pub async fn open_in_memory() -> Result<SqliteStore, OpenStoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(SqliteStore { pool })
    }

    async fn fetch_raw(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES (?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(serde_json::to_string(&doc)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.fetch_raw(collection, id).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let row =
            row.ok_or_else(|| StoreError::NotFound(collection.to_string(), id.to_string()))?;
        let data: String = row.try_get("data")?;
        let mut doc: Value = serde_json::from_str(&data)?;

        match doc {
            Value::Object(ref mut map) => {
                for (key, value) in fields {
                    map.insert(key, value);
                }
            }
            _ => {
                return Err(StoreError::Backend(format!(
                    "document {collection}/{id} is not an object"
                )))
            }
        }

        sqlx::query("UPDATE documents SET data = ? WHERE collection = ? AND id = ?")
            .bind(serde_json::to_string(&doc)?)
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query("SELECT data FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            docs.push(serde_json::from_str(&data)?);
        }
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
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Some(serde_json::from_str(&data)?)
            }
            None => None,
        };

        if let Some(updated) = apply(current) {
            sqlx::query(
                r#"
                INSERT INTO documents (collection, id, data)
                VALUES (?, ?, ?)
                ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data
                "#,
            )
            .bind(collection)
            .bind(id)
            .bind(serde_json::to_string(&updated)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for SqliteStore {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let existing = sqlx::query("SELECT user_id FROM credentials WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        if existing.is_some() {
            return Err(AuthError::EmailTaken(email.to_string()));
        }

        let user_id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO credentials (email, user_id, password_hash) VALUES (?, ?, ?)")
            .bind(email)
            .bind(&user_id)
            .bind(hash_password(password))
            .execute(&mut *tx)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        Ok(AuthUser {
            id: user_id,
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let row = sqlx::query("SELECT user_id, password_hash FROM credentials WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let row = row.ok_or(AuthError::InvalidCredentials)?;
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        if password_hash != hash_password(password) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(AuthUser {
            id: user_id,
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
    async fn documents_roundtrip() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        store
            .put("sets", "s1", json!({"id": "s1", "cardCount": 0}))
            .await
            .unwrap();
        store
            .put("sets", "s1", json!({"id": "s1", "cardCount": 1}))
            .await
            .unwrap();

        let doc = store.get("sets", "s1").await.unwrap().unwrap();
        assert_eq!(doc["cardCount"], 1);

        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Spanish"));
        store.update("sets", "s1", fields).await.unwrap();
        let doc = store.get("sets", "s1").await.unwrap().unwrap();
        assert_eq!(doc["title"], "Spanish");

        store.delete("sets", "s1").await.unwrap();
        assert!(store.get("sets", "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn queries_and_transactions() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        for (id, at) in [("a", 10), ("b", 30), ("c", 20)] {
            store
                .put("sets", id, json!({"id": id, "userId": "u1", "lastAccessed": at}))
                .await
                .unwrap();
        }

        let query = Query::new()
            .filter("userId", Op::Eq, "u1")
            .order_by("lastAccessed", Direction::Descending)
            .limit(2);
        let docs = store.query("sets", &query).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["b", "c"]);

        store
            .transact(
                "sets",
                "a",
                Box::new(|doc| {
                    let mut doc = doc.unwrap();
                    doc["lastAccessed"] = json!(99);
                    Some(doc)
                }),
            )
            .await
            .unwrap();
        let doc = store.get("sets", "a").await.unwrap().unwrap();
        assert_eq!(doc["lastAccessed"], 99);
    }

    #[tokio::test]
    async fn credentials_flow() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let user = store.sign_up("a@b.c", "pw").await.unwrap();
        assert!(matches!(
            store.sign_up("a@b.c", "other").await.unwrap_err(),
            AuthError::EmailTaken(_)
        ));
        assert_eq!(store.sign_in("a@b.c", "pw").await.unwrap(), user);
        assert!(matches!(
            store.sign_in("a@b.c", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }
}
