//! Documents, their identities and the form in which backends store them.
//!
//! A [`Document`] is either detached (built with
//! [`DocumentStore::create_document`](crate::store::DocumentStore::create_document) and never
//! stored) or attached (returned by the store, carrying a [`DocumentKey`] and
//! [`DocumentMetadata`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{
    content::{Content, ContentCodec},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Media type of every document held by the store.
pub const MEDIA_TYPE: &str = "application/json";

/// Store-assigned identity of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Mints a fresh key.
    pub fn generate() -> Self {
        Self(mint_token())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for DocumentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

fn mint_token() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
}

/// Store-assigned bookkeeping for an attached document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub key: DocumentKey,
    /// Opaque version tag, replaced on every write.
    pub version: String,
    pub created_on: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// A document in the form backends persist: metadata plus encoded content.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub metadata: DocumentMetadata,
    pub payload: Vec<u8>,
}

impl StoredDocument {
    /// Assigns a new identity to an encoded payload.
    pub fn mint(payload: Vec<u8>) -> Self {
        let now = Utc::now();

        Self {
            metadata: DocumentMetadata {
                key: DocumentKey::generate(),
                version: mint_token(),
                created_on: now,
                last_modified: now,
            },
            payload,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.metadata.key
    }
}

#[derive(Debug, Clone)]
enum Body {
    /// Content supplied by the caller.
    Content(Content),
    /// Bytes read back from the store, decoded on access.
    Encoded(Vec<u8>),
    /// The store did not return the content.
    Absent,
}

/// A document with optional store-assigned identity.
#[derive(Debug, Clone)]
pub struct Document {
    metadata: Option<DocumentMetadata>,
    body: Body,
}

impl Document {
    /// Creates a detached document holding `content`.
    pub(crate) fn detached(content: Content) -> Self {
        Self { metadata: None, body: Body::Content(content) }
    }

    /// Wraps a document read back from the store.
    pub(crate) fn fetched(stored: StoredDocument) -> Self {
        Self {
            metadata: Some(stored.metadata),
            body: Body::Encoded(stored.payload),
        }
    }

    /// Wraps the metadata of a freshly inserted document without its content.
    pub(crate) fn inserted(metadata: DocumentMetadata) -> Self {
        Self { metadata: Some(metadata), body: Body::Absent }
    }

    /// Returns the document's content.
    ///
    /// Detached documents always return the content they were built from. Fetched documents
    /// decode what the store holds. Documents returned from an insert-and-get operation
    /// return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Content`] if the stored bytes cannot be decoded. The
    /// document's key and metadata remain readable.
    pub fn content(&self) -> DocumentStoreResult<Option<Content>> {
        match &self.body {
            Body::Content(content) => Ok(Some(content.clone())),
            Body::Encoded(bytes) => ContentCodec::decode(bytes).map(Some),
            Body::Absent => Ok(None),
        }
    }

    /// Deserializes the document's content into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Content`] if the document carries no content or it does
    /// not match `T`.
    pub fn deserialize<T: for<'de> Deserialize<'de>>(&self) -> DocumentStoreResult<T> {
        self.content()?
            .ok_or_else(|| DocumentStoreError::Content("document has no content".to_string()))?
            .deserialize()
    }

    /// Returns `true` if the document carries a store-assigned identity.
    pub fn is_attached(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn key(&self) -> Option<&DocumentKey> {
        self.metadata
            .as_ref()
            .map(|metadata| &metadata.key)
    }

    pub fn metadata(&self) -> Option<&DocumentMetadata> {
        self.metadata.as_ref()
    }

    pub fn media_type(&self) -> &'static str {
        MEDIA_TYPE
    }

    /// Produces the encoded payload for a write.
    pub(crate) fn payload(&self) -> DocumentStoreResult<Vec<u8>> {
        match &self.body {
            Body::Content(content) => ContentCodec::encode(content),
            Body::Encoded(bytes) => ContentCodec::decode(bytes).and_then(|content| ContentCodec::encode(&content)),
            Body::Absent => Err(DocumentStoreError::Content(
                "document has no content to insert".to_string(),
            )),
        }
    }
}

/// The argument of an insert: raw content or a pre-built document.
///
/// Both forms are normalized to an encoded payload before the write. Conversions from
/// references clone, so the caller's value is never shared with the store.
#[derive(Debug, Clone)]
pub enum InsertSource {
    Content(Content),
    Document(Document),
}

impl InsertSource {
    pub(crate) fn into_payload(self) -> DocumentStoreResult<Vec<u8>> {
        match self {
            InsertSource::Content(content) => ContentCodec::encode(&content),
            InsertSource::Document(document) => document.payload(),
        }
    }
}

impl From<Content> for InsertSource {
    fn from(content: Content) -> Self {
        InsertSource::Content(content)
    }
}

impl From<&Content> for InsertSource {
    fn from(content: &Content) -> Self {
        InsertSource::Content(content.clone())
    }
}

impl From<bson::Document> for InsertSource {
    fn from(document: bson::Document) -> Self {
        InsertSource::Content(Content::from(document))
    }
}

impl From<Document> for InsertSource {
    fn from(document: Document) -> Self {
        InsertSource::Document(document)
    }
}

impl From<&Document> for InsertSource {
    fn from(document: &Document) -> Self {
        InsertSource::Document(document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn detached_document_returns_its_content() {
        let content = Content::from(doc! { "id": 2000, "name": "Paul", "office": "Singapore" });
        let document = Document::detached(content.clone());

        assert!(!document.is_attached());
        assert!(document.key().is_none());
        assert_eq!(document.content().unwrap(), Some(content));
        assert_eq!(document.media_type(), MEDIA_TYPE);
    }

    #[test]
    fn corrupt_payload_keeps_identity_readable() {
        let stored = StoredDocument::mint(vec![0xde, 0xad]);
        let key = stored.key().clone();
        let document = Document::fetched(stored);

        assert!(matches!(document.content(), Err(DocumentStoreError::Content(_))));
        assert_eq!(document.key(), Some(&key));
    }

    #[test]
    fn inserted_document_has_no_content() {
        let document = Document::inserted(StoredDocument::mint(Vec::new()).metadata);

        assert!(document.is_attached());
        assert_eq!(document.content().unwrap(), None);
        assert!(document.payload().is_err());
    }

    #[test]
    fn minted_keys_are_distinct_hex() {
        let first = DocumentKey::generate();
        let second = DocumentKey::generate();

        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 32);
        assert!(first
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn borrowed_sources_are_copies() {
        let mut content = Content::from(doc! { "name": "Paul" });
        let source = InsertSource::from(&content);
        content.insert("name", "Mary");

        let stored = ContentCodec::decode(&source.into_payload().unwrap()).unwrap();
        assert_eq!(stored, Content::from(doc! { "name": "Paul" }));
    }
}
