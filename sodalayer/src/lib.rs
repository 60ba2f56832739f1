//! Main sodalayer crate providing a document collection store behind a connection.
//!
//! This crate is the primary entry point for users of sodalayer. It re-exports the core types
//! from `sodalayer-core` and gives access to the bundled backing databases.
//!
//! # Features
//!
//! - **Schemaless documents** - Store free-form field-value content as JSON documents
//! - **Transaction boundary** - Inserts are staged per connection until commit or rollback
//! - **Finds** - Narrow by key, filter expression, skip and limit
//! - **Pluggable backends** - Anything implementing [`backend::StoreBackend`] can back a connection
//!
//! # Quick Start
//!
//! ```ignore
//! use sodalayer::{prelude::*, memory::InMemoryStore};
//! use sodalayer::bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let conn = Connection::open(backend, ConnectionConfig::default()).await?;
//!     let store = conn.document_store()?;
//!
//!     let employees = store.create_collection("employees").await?;
//!     employees
//!         .insert_one(doc! { "id": 2000, "name": "Paul", "office": "Singapore" })
//!         .await?;
//!
//!     let paul = employees
//!         .find()
//!         .filter(Filter::eq("name", "Paul"))
//!         .get_one()
//!         .await?;
//!     println!("{:?}", paul.map(|document| document.content()));
//!
//!     conn.commit().await?;
//!     employees.drop().await?;
//!     conn.close().await
//! }
//! ```
//!
//! # Scoped use
//!
//! [`Connection::scoped`](connection::Connection::scoped) commits, rolls back and closes on
//! the caller's behalf, and
//! [`DocumentStore::with_collection`](store::DocumentStore::with_collection) drops a
//! collection once the body finishes.
//!
//! ```ignore
//! let conn = Connection::open(InMemoryStore::new(), ConnectionConfig::default()).await?;
//!
//! let count = conn
//!     .scoped(async |conn| {
//!         let store = conn.document_store()?;
//!         store
//!             .with_collection("scratch", async |scratch| {
//!                 scratch.insert_one(doc! { "n": 1 }).await?;
//!                 scratch.find().count().await
//!             })
//!             .await
//!     })
//!     .await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Shared in-memory storage for development and testing

pub mod prelude;

pub use sodalayer_core::{
    backend, collection, config, connection, content, cursor, document, error, query, store,
};

// Re-export the value types content is built from
pub use bson;
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use sodalayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}
