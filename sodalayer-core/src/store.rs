//! The document store handle of a connection.
//!
//! [`DocumentStore`] is where collections are created, opened and listed, and where detached
//! documents are built.

use crate::{
    backend::StoreBackend,
    collection::{Collection, validate_collection_name},
    connection::Connection,
    content::{Content, ContentCodec},
    document::Document,
    error::{DocumentStoreResult, with_cleanup},
};

/// Collection management bound to one [`Connection`].
#[derive(Debug)]
pub struct DocumentStore<'c, B: StoreBackend> {
    connection: &'c Connection<B>,
}

impl<'c, B: StoreBackend> DocumentStore<'c, B> {
    pub(crate) fn new(connection: &'c Connection<B>) -> Self {
        Self { connection }
    }

    /// Creates the collection, or opens it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidCollectionName`](crate::error::DocumentStoreError::InvalidCollectionName)
    /// if `name` breaks the naming rules.
    pub async fn create_collection(&self, name: &str) -> DocumentStoreResult<Collection<'c, B>> {
        validate_collection_name(name)?;
        self.connection.ensure_open()?;

        let created = self
            .connection
            .backend()
            .create_collection(self.connection.session(), name)
            .await?;

        if created {
            log::debug!("created collection {name}");
        }

        Ok(Collection::new(name.to_string(), self.connection))
    }

    /// Opens an existing collection. Returns `None` if there is no collection named `name`.
    pub async fn open_collection(&self, name: &str) -> DocumentStoreResult<Option<Collection<'c, B>>> {
        validate_collection_name(name)?;
        self.connection.ensure_open()?;

        let exists = self
            .connection
            .backend()
            .has_collection(self.connection.session(), name)
            .await?;

        Ok(exists.then(|| Collection::new(name.to_string(), self.connection)))
    }

    /// Lists the names of all collections, sorted.
    pub async fn list_collection_names(&self) -> DocumentStoreResult<Vec<String>> {
        self.connection.ensure_open()?;

        let mut names = self
            .connection
            .backend()
            .list_collections(self.connection.session())
            .await?;
        names.sort();

        Ok(names)
    }

    /// Builds a detached document. Nothing is sent to the store.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Content`](crate::error::DocumentStoreError::Content) if the
    /// content cannot be encoded.
    pub fn create_document(&self, content: impl Into<Content>) -> DocumentStoreResult<Document> {
        let content = content.into();
        ContentCodec::validate(&content)?;

        Ok(Document::detached(content))
    }

    /// Creates or opens a collection, runs `body` against it, then drops it.
    ///
    /// The collection is dropped whether or not `body` succeeds. A failed drop is reported;
    /// if `body` failed too, its error comes first.
    pub async fn with_collection<T>(
        &self,
        name: &str,
        body: impl AsyncFnOnce(&Collection<'c, B>) -> DocumentStoreResult<T>,
    ) -> DocumentStoreResult<T> {
        let collection = self.create_collection(name).await?;
        let result = body(&collection).await;
        let dropped = collection
            .drop()
            .await
            .map(|_| ());

        with_cleanup(result, dropped)
    }
}
