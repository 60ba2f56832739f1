//! Storage backend abstraction for the document store.
//!
//! A [`StoreBackend`] is the backing database a [`Connection`](crate::connection::Connection)
//! talks to. It keeps committed state shared by every connection and, per session, the
//! writes that connection has not committed yet.
//!
//! # Sessions
//!
//! Each connection opens one session with [`StoreBackend::open_session`] and passes its
//! [`SessionId`] to every document operation. Inserts are staged in the session and become
//! visible to other sessions on [`StoreBackend::commit`]. Collection creation and removal
//! are not staged: they take effect immediately for everyone.
//!
//! # Cancellation
//!
//! Implementations must apply each write in one step, so that dropping the returned future
//! leaves the store as if the call either never happened or fully completed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use uuid::Uuid;

use crate::{document::StoredDocument, error::DocumentStoreResult, query::Query};

/// Identifies one connection's session with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User name and password presented when opening a session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Abstract interface for the database behind a connection.
///
/// # Errors
///
/// Operations on an unknown or ended session fail with
/// [`DocumentStoreError::Connection`](crate::error::DocumentStoreError::Connection).
/// Document operations on a collection that does not exist fail with
/// [`DocumentStoreError::CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Opens a session, checking `credentials` if the backend requires them.
    async fn open_session(&self, credentials: Option<&Credentials>) -> DocumentStoreResult<SessionId>;

    /// Ends a session, discarding any writes it has not committed.
    async fn close_session(&self, session: SessionId) -> DocumentStoreResult<()>;

    /// Applies every staged write of the session atomically.
    ///
    /// Committing a session with nothing staged succeeds and changes nothing.
    async fn commit(&self, session: SessionId) -> DocumentStoreResult<()>;

    /// Discards every staged write of the session.
    async fn rollback(&self, session: SessionId) -> DocumentStoreResult<()>;

    /// Creates the collection if it does not exist.
    ///
    /// Returns `true` if it was created and `false` if it already existed.
    async fn create_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool>;

    /// Returns `true` if the collection exists.
    async fn has_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool>;

    /// Commits the session's staged writes, then removes the collection and all its documents.
    ///
    /// Returns `true` if the collection existed.
    async fn drop_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool>;

    /// Lists the names of all collections.
    async fn list_collections(&self, session: SessionId) -> DocumentStoreResult<Vec<String>>;

    /// Stages documents for insertion into a collection.
    ///
    /// Either every document is staged or none is. A key that already exists in the
    /// collection, committed or staged, fails the whole batch with
    /// [`DocumentStoreError::DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists).
    async fn insert_documents(
        &self,
        session: SessionId,
        collection: &str,
        documents: Vec<StoredDocument>,
    ) -> DocumentStoreResult<()>;

    /// Returns the documents matching `query`, as seen by the session: committed documents
    /// plus the session's own staged inserts.
    async fn query_documents(
        &self,
        session: SessionId,
        collection: &str,
        query: &Query,
    ) -> DocumentStoreResult<Vec<StoredDocument>>;

    /// Shuts the backend down. Every open session becomes unusable.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn open_session(&self, credentials: Option<&Credentials>) -> DocumentStoreResult<SessionId> {
        (*self).open_session(credentials).await
    }

    async fn close_session(&self, session: SessionId) -> DocumentStoreResult<()> {
        (*self).close_session(session).await
    }

    async fn commit(&self, session: SessionId) -> DocumentStoreResult<()> {
        (*self).commit(session).await
    }

    async fn rollback(&self, session: SessionId) -> DocumentStoreResult<()> {
        (*self).rollback(session).await
    }

    async fn create_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool> {
        (*self)
            .create_collection(session, name)
            .await
    }

    async fn has_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool> {
        (*self)
            .has_collection(session, name)
            .await
    }

    async fn drop_collection(&self, session: SessionId, name: &str) -> DocumentStoreResult<bool> {
        (*self)
            .drop_collection(session, name)
            .await
    }

    async fn list_collections(&self, session: SessionId) -> DocumentStoreResult<Vec<String>> {
        (*self).list_collections(session).await
    }

    async fn insert_documents(
        &self,
        session: SessionId,
        collection: &str,
        documents: Vec<StoredDocument>,
    ) -> DocumentStoreResult<()> {
        (*self)
            .insert_documents(session, collection, documents)
            .await
    }

    async fn query_documents(
        &self,
        session: SessionId,
        collection: &str,
        query: &Query,
    ) -> DocumentStoreResult<Vec<StoredDocument>> {
        (*self)
            .query_documents(session, collection, query)
            .await
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
