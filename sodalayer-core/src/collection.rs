//! Collections of documents.
//!
//! A [`Collection`] is a handle on a named collection reached through a
//! [`Connection`]. Handles are cheap; the collection itself lives in the backend.
//!
//! # Lifecycle
//!
//! A collection is created (or reopened) with
//! [`DocumentStore::create_collection`](crate::store::DocumentStore::create_collection), used
//! for inserts and finds, and finally removed with [`Collection::drop`]. After a drop, inserts
//! and finds through any handle of that name fail with
//! [`DocumentStoreError::CollectionNotFound`] until the collection is created again.
//!
//! # Example
//!
//! ```ignore
//! let employees = store.create_collection("employees").await?;
//! employees.insert_one(doc! { "id": 2000, "name": "Paul", "office": "Singapore" }).await?;
//!
//! let documents = employees.find().get_documents().await?;
//! assert_eq!(documents.len(), 1);
//!
//! assert!(employees.drop().await?.dropped);
//! ```

use crate::{
    backend::StoreBackend,
    connection::Connection,
    cursor::QueryCursor,
    document::{Document, DocumentMetadata, InsertSource, StoredDocument},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

/// Longest collection name the store accepts, in characters.
pub const MAX_COLLECTION_NAME_LEN: usize = 128;

/// Checks `name` against the collection naming rules.
///
/// A name must be non-empty, at most [`MAX_COLLECTION_NAME_LEN`] characters, free of control
/// characters, and must not start or end with whitespace.
pub fn validate_collection_name(name: &str) -> DocumentStoreResult<()> {
    let invalid = |reason: &str| {
        Err(DocumentStoreError::InvalidCollectionName(
            name.to_string(),
            reason.to_string(),
        ))
    };

    if name.is_empty() {
        return invalid("name is empty");
    }
    if name.chars().count() > MAX_COLLECTION_NAME_LEN {
        return invalid("name is too long");
    }
    if name.chars().any(char::is_control) {
        return invalid("name contains control characters");
    }
    if name.trim() != name {
        return invalid("name has leading or trailing whitespace");
    }

    Ok(())
}

/// Outcome of [`Collection::drop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropResult {
    /// `false` if the collection was already absent.
    pub dropped: bool,
}

/// A handle on a named collection.
#[derive(Debug)]
pub struct Collection<'c, B: StoreBackend> {
    name: String,
    connection: &'c Connection<B>,
}

impl<'c, B: StoreBackend> Collection<'c, B> {
    pub(crate) fn new(name: String, connection: &'c Connection<B>) -> Self {
        Self { name, connection }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a copy of the content under a freshly minted key.
    ///
    /// Accepts raw [`Content`](crate::content::Content), a `bson::Document`, or a
    /// [`Document`]. The argument is never modified and receives no key.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Content`] if the content cannot be encoded,
    /// [`DocumentStoreError::CollectionNotFound`] if the collection was dropped, or a write
    /// error if the backend rejects the document.
    pub async fn insert_one(&self, source: impl Into<InsertSource>) -> DocumentStoreResult<()> {
        self.insert(vec![source.into()]).await?;

        Ok(())
    }

    /// Like [`Collection::insert_one`], but returns the stored document's identity.
    ///
    /// The returned document carries a key and metadata but no content; fetch it with
    /// [`Collection::find`] to read what was stored.
    pub async fn insert_one_and_get(
        &self,
        source: impl Into<InsertSource>,
    ) -> DocumentStoreResult<Document> {
        self.insert(vec![source.into()])
            .await?
            .pop()
            .map(Document::inserted)
            .ok_or_else(|| DocumentStoreError::Write("backend stored no document".to_string()))
    }

    /// Stores several documents atomically: all of them or none.
    pub async fn insert_many<S>(&self, sources: impl IntoIterator<Item = S>) -> DocumentStoreResult<()>
    where
        S: Into<InsertSource>,
    {
        self.insert(sources.into_iter().map(Into::into).collect())
            .await?;

        Ok(())
    }

    /// Like [`Collection::insert_many`], returning the stored documents' identities in input
    /// order.
    pub async fn insert_many_and_get<S>(
        &self,
        sources: impl IntoIterator<Item = S>,
    ) -> DocumentStoreResult<Vec<Document>>
    where
        S: Into<InsertSource>,
    {
        Ok(self
            .insert(sources.into_iter().map(Into::into).collect())
            .await?
            .into_iter()
            .map(Document::inserted)
            .collect())
    }

    /// Starts a find over this collection. Without narrowing it matches every document.
    pub fn find(&self) -> QueryCursor<'_, 'c, B> {
        QueryCursor::new(self)
    }

    /// Removes the collection and all its documents.
    ///
    /// The connection's uncommitted inserts are committed first. Dropping a collection that
    /// does not exist reports `dropped: false`.
    pub async fn drop(&self) -> DocumentStoreResult<DropResult> {
        self.connection.ensure_open()?;

        let dropped = self
            .connection
            .backend()
            .drop_collection(self.connection.session(), &self.name)
            .await?;

        if dropped {
            log::debug!("dropped collection {}", self.name);
        }

        Ok(DropResult { dropped })
    }

    pub(crate) async fn query(&self, query: &Query) -> DocumentStoreResult<Vec<Document>> {
        self.connection.ensure_open()?;

        Ok(self
            .connection
            .backend()
            .query_documents(self.connection.session(), &self.name, query)
            .await?
            .into_iter()
            .map(Document::fetched)
            .collect())
    }

    async fn insert(&self, sources: Vec<InsertSource>) -> DocumentStoreResult<Vec<DocumentMetadata>> {
        self.connection.ensure_open()?;

        let documents = sources
            .into_iter()
            .map(|source| {
                source
                    .into_payload()
                    .map(StoredDocument::mint)
            })
            .collect::<DocumentStoreResult<Vec<_>>>()?;
        let metadata = documents
            .iter()
            .map(|document| document.metadata.clone())
            .collect();

        self.connection
            .backend()
            .insert_documents(self.connection.session(), &self.name, documents)
            .await?;
        self.connection.after_write().await?;

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_collection_name("soda_test_177_1").is_ok());
        assert!(validate_collection_name("employees in Singapore").is_ok());
        assert!(validate_collection_name(&"c".repeat(MAX_COLLECTION_NAME_LEN)).is_ok());
    }

    #[test]
    fn rejects_invalid_names() {
        for name in [
            String::new(),
            "c".repeat(MAX_COLLECTION_NAME_LEN + 1),
            "tab\there".to_string(),
            " padded".to_string(),
            "padded ".to_string(),
        ] {
            let err = validate_collection_name(&name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Collection, "{name:?}");
        }
    }
}
