//! One-shot query cursors.
//!
//! [`QueryCursor`] is returned by [`Collection::find`]. It can be narrowed before one of its
//! consuming terminal operations reads the collection. Each terminal reads the collection's
//! state at that moment; nothing is cached between cursors.
//!
//! ```ignore
//! let paul = employees
//!     .find()
//!     .filter(Filter::eq("name", "Paul"))
//!     .get_one()
//!     .await?;
//! ```

use crate::{
    backend::StoreBackend,
    collection::Collection,
    document::{Document, DocumentKey},
    error::DocumentStoreResult,
    query::{Expr, Query},
};

/// A pending find over one collection.
///
/// The order of returned documents is unspecified.
#[derive(Debug)]
pub struct QueryCursor<'a, 'c, B: StoreBackend> {
    collection: &'a Collection<'c, B>,
    query: Query,
}

impl<'a, 'c, B: StoreBackend> QueryCursor<'a, 'c, B> {
    pub(crate) fn new(collection: &'a Collection<'c, B>) -> Self {
        Self { collection, query: Query::new() }
    }

    /// Restricts the find to the document with `key`.
    pub fn key(self, key: impl Into<DocumentKey>) -> Self {
        self.keys([key.into()])
    }

    /// Restricts the find to documents with any of `keys`.
    pub fn keys(mut self, keys: impl IntoIterator<Item = DocumentKey>) -> Self {
        self.query.keys = Some(keys.into_iter().collect());
        self
    }

    /// Restricts the find to documents matching `filter`.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Skips the first `count` matches.
    pub fn skip(mut self, count: usize) -> Self {
        self.query.offset = Some(count);
        self
    }

    /// Returns at most `count` matches.
    pub fn limit(mut self, count: usize) -> Self {
        self.query.limit = Some(count);
        self
    }

    /// Returns the query this cursor will run.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Reads every matching document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound)
    /// if the collection has been dropped.
    pub async fn get_documents(self) -> DocumentStoreResult<Vec<Document>> {
        self.collection
            .query(&self.query)
            .await
    }

    /// Reads the first matching document, if any.
    pub async fn get_one(self) -> DocumentStoreResult<Option<Document>> {
        Ok(self
            .limit(1)
            .get_documents()
            .await?
            .into_iter()
            .next())
    }

    /// Counts the matching documents.
    pub async fn count(self) -> DocumentStoreResult<usize> {
        Ok(self.get_documents().await?.len())
    }
}
