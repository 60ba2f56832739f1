//! The connection and its transaction boundary.
//!
//! A [`Connection`] owns one backend session. Inserts made through it are staged until
//! [`Connection::commit`]; [`Connection::rollback`] discards them and [`Connection::close`]
//! discards whatever is still uncommitted before releasing the session.
//!
//! # Example
//!
//! ```ignore
//! use sodalayer::prelude::*;
//! use sodalayer::memory::InMemoryStore;
//!
//! let backend = InMemoryStore::new();
//! let conn = Connection::open(backend.clone(), ConnectionConfig::default()).await?;
//! let store = conn.document_store()?;
//! let employees = store.create_collection("employees").await?;
//! employees.insert_one(doc! { "id": 2000, "name": "Paul" }).await?;
//! conn.commit().await?;
//! conn.close().await?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    backend::{SessionId, StoreBackend},
    config::ConnectionConfig,
    error::{DocumentStoreError, DocumentStoreResult, with_cleanup},
    store::DocumentStore,
};

/// A single-owner connection to a [`StoreBackend`].
///
/// Operations issued through one connection run in the order the caller awaits them. Every
/// opened connection must be closed exactly once; [`Connection::scoped`] does this on every
/// exit path. A connection dropped without being closed keeps its backend session alive.
#[derive(Debug)]
pub struct Connection<B: StoreBackend> {
    backend: B,
    session: SessionId,
    config: ConnectionConfig,
    closed: AtomicBool,
}

impl<B: StoreBackend> Connection<B> {
    /// Opens a connection and its backend session.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`] if the backend is unreachable or rejects
    /// the configured credentials.
    pub async fn open(backend: B, config: ConnectionConfig) -> DocumentStoreResult<Self> {
        let session = backend
            .open_session(config.credentials().as_ref())
            .await?;

        log::debug!("opened connection with session {session}");

        Ok(Self {
            backend,
            session,
            config,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the document store handle for this connection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::ConnectionClosed`] if the connection is closed.
    pub fn document_store(&self) -> DocumentStoreResult<DocumentStore<'_, B>> {
        self.ensure_open()?;

        Ok(DocumentStore::new(self))
    }

    /// Makes every staged insert of this connection durable and visible to other connections.
    ///
    /// Succeeds without effect when nothing is staged.
    pub async fn commit(&self) -> DocumentStoreResult<()> {
        self.ensure_open()?;
        self.backend.commit(self.session).await?;

        log::debug!("committed session {}", self.session);

        Ok(())
    }

    /// Discards every staged insert of this connection.
    pub async fn rollback(&self) -> DocumentStoreResult<()> {
        self.ensure_open()?;
        self.backend.rollback(self.session).await?;

        log::debug!("rolled back session {}", self.session);

        Ok(())
    }

    /// Releases the connection, discarding uncommitted work.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::ConnectionClosed`] if the connection was already closed.
    pub async fn close(&self) -> DocumentStoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(DocumentStoreError::ConnectionClosed);
        }

        self.backend
            .close_session(self.session)
            .await?;

        log::debug!("closed connection with session {}", self.session);

        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Runs `body` against this connection, then releases it.
    ///
    /// The connection commits if `body` succeeds and rolls back if it fails, and is closed
    /// in both cases. Failures while committing, rolling back or closing are reported; if
    /// `body` failed too, its error comes first in the returned
    /// [`DocumentStoreError::Cleanup`].
    pub async fn scoped<T>(
        self,
        body: impl AsyncFnOnce(&Connection<B>) -> DocumentStoreResult<T>,
    ) -> DocumentStoreResult<T> {
        let result = body(&self).await;
        let settled = match &result {
            Ok(_) => self.commit().await,
            Err(_) => self.rollback().await,
        };
        let result = with_cleanup(result, settled);
        let closed = self.close().await;

        with_cleanup(result, closed)
    }

    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn session(&self) -> SessionId {
        self.session
    }

    pub(crate) fn ensure_open(&self) -> DocumentStoreResult<()> {
        if self.is_closed() {
            return Err(DocumentStoreError::ConnectionClosed);
        }

        Ok(())
    }

    /// Commits after a write when the connection is configured to.
    pub(crate) async fn after_write(&self) -> DocumentStoreResult<()> {
        if self.config.auto_commit {
            self.commit().await?;
        }

        Ok(())
    }
}

impl<B: StoreBackend> Drop for Connection<B> {
    fn drop(&mut self) {
        if !self.is_closed() {
            log::warn!("connection with session {} dropped without being closed", self.session);
        }
    }
}
