use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub const USERS: &str = "users";
pub const SETS: &str = "sets";
pub const FLASHCARDS: &str = "flashcards";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}/{1}")]
    NotFound(String, String),

    #[error("transaction conflict: {0}")]
    Conflict(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

/// Collection query: equality/ordering filters, one optional order-by and
/// an optional limit. Mirrors the query surface of the backing store.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Query {
        Query::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: Op, value: impl Into<Value>) -> Query {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Query {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Query {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|filter| {
            let field = doc.get(&filter.field).unwrap_or(&Value::Null);
            match compare_values(field, &filter.value) {
                Some(ordering) => match filter.op {
                    Op::Eq => ordering == Ordering::Equal,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Le => ordering != Ordering::Greater,
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Ge => ordering != Ordering::Less,
                },
                None => false,
            }
        })
    }

    /// Filters, orders and truncates `docs` in place per this query.
    pub fn apply(&self, docs: &mut Vec<Value>) {
        docs.retain(|doc| self.matches(doc));
        if let Some((field, direction)) = &self.order_by {
            docs.sort_by(|a, b| {
                let a = a.get(field).unwrap_or(&Value::Null);
                let b = b.get(field).unwrap_or(&Value::Null);
                let ordering = compare_values(a, b).unwrap_or(Ordering::Equal);
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
    }
}

/// Orders two JSON scalars. Mixed or non-scalar types don't compare.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

pub type TransactFn = Box<dyn FnOnce(Option<Value>) -> Option<Value> + Send>;

/// The remote document store, collection-scoped. Backends must apply
/// `transact` with read-then-write atomicity on the touched document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upserts the full document.
    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Merges the given fields into an existing document.
    /// Fails with `NotFound` when the document is absent.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Idempotent: deleting an absent document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError>;

    /// Single-document read-modify-write. The closure sees the current
    /// document (if any) and returns the replacement to write, or `None`
    /// to write nothing.
    async fn transact(
        &self,
        collection: &str,
        id: &str,
        apply: TransactFn,
    ) -> Result<(), StoreError>;
}
