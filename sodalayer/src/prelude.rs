//! Convenient re-exports of commonly used types from sodalayer.
//!
//! ```ignore
//! use sodalayer::prelude::*;
//! ```
//!
//! This provides access to connections and their configuration, the document store and
//! collections, content and documents, finds and filters, backend traits, and error types.

pub use sodalayer_core::{
    backend::{Credentials, SessionId, StoreBackend, StoreBackendBuilder},
    collection::{Collection, DropResult},
    config::ConnectionConfig,
    connection::Connection,
    content::{Content, ContentCodec},
    cursor::QueryCursor,
    document::{Document, DocumentKey, DocumentMetadata, InsertSource},
    error::{DocumentStoreError, DocumentStoreResult, ErrorKind},
    query::{Expr, FieldOp, Filter, Query, QueryVisitor},
    store::DocumentStore,
};
