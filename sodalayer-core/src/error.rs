//! Error types and result types for document store operations.
//!
//! Every fallible operation returns [`DocumentStoreResult<T>`]. Errors are grouped into four
//! kinds (see [`ErrorKind`]) so callers can branch on the category without matching every
//! variant.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// The category an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The connection is unusable: closed, unreachable, or rejected.
    Connection,
    /// The collection name is invalid or the collection does not exist.
    Collection,
    /// Content failed to encode or decode, or has an unsupported shape.
    Content,
    /// The backing store rejected a write for reasons other than content shape.
    Write,
}

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The connection was closed before the operation was issued.
    #[error("Connection is closed")]
    ConnectionClosed,
    /// The backing store could not be reached or refused the connection.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The collection name violates the store's naming rules.
    /// The first argument is the offending name, the second is the rule that failed.
    #[error("Invalid collection name {0:?}: {1}")]
    InvalidCollectionName(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// Content could not be encoded or decoded.
    #[error("Content error: {0}")]
    Content(String),
    /// A document with the given key already exists in the collection.
    /// The first argument is the document key, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The backing store rejected the write.
    #[error("Write error: {0}")]
    Write(String),
    /// Both an operation and the cleanup that followed it failed.
    #[error("{primary} (cleanup also failed: {cleanup})")]
    Cleanup {
        /// The error raised by the operation itself.
        primary: Box<DocumentStoreError>,
        /// The error raised while releasing resources afterwards.
        cleanup: Box<DocumentStoreError>,
    },
}

impl DocumentStoreError {
    /// Returns the category of this error.
    ///
    /// For [`DocumentStoreError::Cleanup`] this is the kind of the primary error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocumentStoreError::ConnectionClosed | DocumentStoreError::Connection(_) => {
                ErrorKind::Connection
            }
            DocumentStoreError::InvalidCollectionName(..)
            | DocumentStoreError::CollectionNotFound(_) => ErrorKind::Collection,
            DocumentStoreError::Content(_) => ErrorKind::Content,
            DocumentStoreError::DocumentAlreadyExists(..) | DocumentStoreError::Write(_) => {
                ErrorKind::Write
            }
            DocumentStoreError::Cleanup { primary, .. } => primary.kind(),
        }
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Content(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Content(err.to_string())
    }
}

/// Merges the outcome of an operation with the outcome of the cleanup that ran after it.
///
/// A cleanup failure is never dropped. When both fail the primary error comes first.
pub fn with_cleanup<T>(
    result: DocumentStoreResult<T>,
    cleanup: DocumentStoreResult<()>,
) -> DocumentStoreResult<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup)) => Err(cleanup),
        (Err(primary), Ok(())) => Err(primary),
        (Err(primary), Err(cleanup)) => Err(DocumentStoreError::Cleanup {
            primary: Box::new(primary),
            cleanup: Box::new(cleanup),
        }),
    }
}
