//! Document store abstraction for the portfolio API.
//!
//! The [`DocumentStore`] trait is the persistence seam: a schema-flexible
//! collection store supporting insert, filtered find, and single-document
//! partial update. Backends (SQLite, in-memory) implement it over raw JSON
//! documents; [`Collection`] layers a typed view on top for a given
//! [`Record`] shape.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A stored document: a JSON object with named fields.
pub type Document = Map<String, Value>;

/// Field-equality filter. Every entry must match; an empty filter matches
/// all documents.
pub type Filter = Map<String, Value>;

/// Partial field set applied by [`DocumentStore::update_one`].
pub type Patch = Map<String, Value>;

/// Sort direction for [`Sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-field ordering for [`DocumentStore::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Abstract document store backend.
///
/// All operations are async (via `async-trait`). Errors are opaque storage
/// faults; callers propagate them without interpretation.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_one`](DocumentStore::insert_one) | Persist one document, returns the inserted count |
/// | [`find`](DocumentStore::find) | Filter, sort, and cap documents |
/// | [`update_one`](DocumentStore::update_one) | Apply a partial set to the first match, returns the modified count |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document under an application-level `id`.
    ///
    /// A duplicate `id` within the same collection is a storage fault.
    async fn insert_one(&self, collection: &str, id: &str, document: Document) -> Result<u64>;

    /// Return up to `limit` documents matching `filter`.
    ///
    /// Without a sort, documents come back in insertion order.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
        limit: usize,
    ) -> Result<Vec<Document>>;

    /// Apply `patch` to the first document (in insertion order) matching
    /// `filter`.
    ///
    /// Returns the number of documents actually changed: 0 when nothing
    /// matches, and also 0 when every patched field already holds the
    /// requested value.
    async fn update_one(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64>;
}

/// A typed entity persisted in a named collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the record lives in.
    const COLLECTION: &'static str;

    /// Application-level key used for lookups and updates.
    fn id(&self) -> &str;
}

/// Typed gateway over a [`DocumentStore`] for one [`Record`] type.
pub struct Collection<R> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Collection<R> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Persist `record`, returning how many documents were written.
    pub async fn insert(&self, record: &R) -> Result<u64> {
        let document = match serde_json::to_value(record)
            .with_context(|| format!("failed to encode {} record", R::COLLECTION))?
        {
            Value::Object(map) => map,
            other => bail!(
                "{} record must encode to a JSON object, got {}",
                R::COLLECTION,
                other
            ),
        };
        self.store
            .insert_one(R::COLLECTION, record.id(), document)
            .await
    }

    /// Materialize up to `limit` matching records in `sort` order.
    pub async fn find(&self, filter: &Filter, sort: Option<&Sort>, limit: usize) -> Result<Vec<R>> {
        let documents = self
            .store
            .find(R::COLLECTION, filter, sort, limit)
            .await?;
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(Value::Object(doc))
                    .with_context(|| format!("failed to decode {} record", R::COLLECTION))
            })
            .collect()
    }

    /// Apply `patch` to at most one record matching `filter`.
    pub async fn update_one(&self, filter: &Filter, patch: &Patch) -> Result<u64> {
        self.store.update_one(R::COLLECTION, filter, patch).await
    }
}

/// Reject field names that are not plain identifiers.
///
/// Backends address fields by name (JSON paths in SQLite), so only
/// `[A-Za-z0-9_]+` is accepted.
pub fn check_field_name(field: &str) -> Result<()> {
    if field.is_empty()
        || !field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        bail!("invalid document field name: {:?}", field);
    }
    Ok(())
}

/// Total order over JSON scalars used for in-process sorting.
///
/// Null sorts first, then booleans, numbers, strings, and finally arrays
/// and objects (compared by their serialized text).
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        _ if rank(a) != rank(b) => rank(a).cmp(&rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Whether `document` satisfies every entry of `filter`.
pub fn matches_filter(document: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field).unwrap_or(&Value::Null) == expected)
}
