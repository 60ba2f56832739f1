//! A document collection store reached through a connection with a transaction boundary.
//!
//! This crate is the core of the sodalayer project and provides:
//!
//! - **Content** ([`content`]) - The field-value payload of documents and its byte codec
//! - **Documents** ([`document`]) - Detached and attached documents, keys and metadata
//! - **Store backend abstraction** ([`backend`]) - The session-aware trait backing databases implement
//! - **Connections** ([`connection`]) - Commit, rollback and connection lifecycle
//! - **Document store** ([`store`]) - Creating, opening and listing collections
//! - **Collections** ([`collection`]) - Inserting documents and dropping collections
//! - **Cursors and queries** ([`cursor`], [`query`]) - Finding documents by key or filter
//! - **Configuration** ([`config`]) - Connection settings
//! - **Error handling** ([`error`]) - Error kinds and result types
//!
//! # Example
//!
//! ```ignore
//! use sodalayer::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let conn = Connection::open(InMemoryStore::new(), ConnectionConfig::default()).await?;
//! let store = conn.document_store()?;
//!
//! let employees = store.create_collection("employees").await?;
//! employees.insert_one(doc! { "id": 2000, "name": "Paul", "office": "Singapore" }).await?;
//!
//! for document in employees.find().get_documents().await? {
//!     println!("{:?}", document.content()?);
//! }
//!
//! conn.commit().await?;
//! employees.drop().await?;
//! conn.close().await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as sodalayer_core;

pub mod backend;
pub mod collection;
pub mod config;
pub mod connection;
pub mod content;
pub mod cursor;
pub mod document;
pub mod error;
pub mod query;
pub mod store;
