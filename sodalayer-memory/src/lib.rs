//! In-memory backing database for sodalayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It is shared by every connection opened against it and is suited to development, testing
//! and embedding.
//!
//! # Features
//!
//! - **Shared state** - Clones of one [`InMemoryStore`] see the same collections
//! - **Per-connection transactions** - Inserts stay private to a session until it commits
//! - **Filtering** - Evaluates key restrictions, filter expressions and pagination
//! - **Authentication** - Optionally requires credentials from every connection
//!
//! # Quick Start
//!
//! ```ignore
//! use sodalayer::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let conn = Connection::open(backend, ConnectionConfig::default()).await?;
//!
//!     let store = conn.document_store()?;
//!     let employees = store.create_collection("employees").await?;
//!     employees.insert_one(doc! { "id": 2000, "name": "Paul" }).await?;
//!
//!     conn.commit().await?;
//!     conn.close().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sodalayer_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
