//! Document content and its canonical byte encoding.
//!
//! [`Content`] is the logical payload of a document: a mapping of field names to values.
//! [`ContentCodec`] turns it into the bytes a backend stores and back again, rejecting any
//! value the store cannot represent faithfully.
//!
//! # Example
//!
//! ```ignore
//! use sodalayer::content::{Content, ContentCodec};
//! use bson::doc;
//!
//! let content = Content::from(doc! { "id": 2000, "name": "Paul", "office": "Singapore" });
//! let bytes = ContentCodec::encode(&content)?;
//! assert_eq!(ContentCodec::decode(&bytes)?, content);
//! ```

use bson::{
    Bson, Document,
    de::{deserialize_from_document, deserialize_from_slice},
    ser::{serialize_to_document, serialize_to_vec},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Nested documents and arrays deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 100;

/// The field-value payload of a document.
///
/// Supported values are strings, 32 and 64 bit integers, booleans, finite doubles, `null`,
/// nested documents and arrays of supported values.
///
/// Equality is structural. Field order is ignored at every level, array order is not, and
/// integers of different widths are different values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(Document);

impl Content {
    /// Creates empty content.
    pub fn new() -> Self {
        Self(Document::new())
    }

    /// Builds content from a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Content`] if the value is not an object or holds a
    /// number BSON cannot represent.
    pub fn from_json(value: Value) -> DocumentStoreResult<Self> {
        if !value.is_object() {
            return Err(DocumentStoreError::Content(
                "content must be a JSON object".to_string(),
            ));
        }

        Ok(Self(serialize_to_document(&value)?))
    }

    /// Builds content from any serializable value that maps to a document.
    pub fn from_serialize<T: Serialize>(value: &T) -> DocumentStoreResult<Self> {
        Ok(Self(serialize_to_document(value)?))
    }

    /// Converts the content to a JSON value.
    pub fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(serde_json::to_value(&self.0)?)
    }

    /// Deserializes the content into a typed value.
    pub fn deserialize<T: for<'de> Deserialize<'de>>(&self) -> DocumentStoreResult<T> {
        Ok(deserialize_from_document(self.0.clone())?)
    }

    /// Returns the value stored under `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Bson> {
        self.0.get(field)
    }

    /// Sets `field` to `value`, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        self.0.insert(field.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying BSON document.
    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl From<Document> for Content {
    fn from(document: Document) -> Self {
        Self(document)
    }
}

impl From<Content> for Document {
    fn from(content: Content) -> Self {
        content.0
    }
}

impl PartialEq for Content {
    fn eq(&self, other: &Self) -> bool {
        documents_equal(&self.0, &other.0)
    }
}

fn documents_equal(left: &Document, right: &Document) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, value)| {
            right
                .get(key)
                .is_some_and(|other| values_equal(value, other))
        })
}

fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (left, right) {
        (Bson::Document(a), Bson::Document(b)) => documents_equal(a, b),
        (Bson::Array(a), Bson::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => left == right,
    }
}

/// Encodes and decodes [`Content`] to and from the canonical BSON byte representation.
///
/// Both directions validate the shape of the content, so a decoded value never holds a type
/// that [`ContentCodec::encode`] would have refused.
pub struct ContentCodec;

impl ContentCodec {
    /// Encodes content to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Content`] if any value has an unsupported type.
    pub fn encode(content: &Content) -> DocumentStoreResult<Vec<u8>> {
        Self::validate(content)?;

        Ok(serialize_to_vec(&content.0)?)
    }

    /// Decodes bytes produced by [`ContentCodec::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Content`] if the bytes are not a BSON document or hold
    /// an unsupported type.
    pub fn decode(bytes: &[u8]) -> DocumentStoreResult<Content> {
        let content = Content(deserialize_from_slice::<Document>(bytes)?);
        Self::validate(&content)?;

        Ok(content)
    }

    /// Checks that every value in the content can be stored.
    pub fn validate(content: &Content) -> DocumentStoreResult<()> {
        Self::validate_document("", &content.0, 0)
    }

    fn validate_document(path: &str, document: &Document, depth: usize) -> DocumentStoreResult<()> {
        if depth > MAX_NESTING_DEPTH {
            return Err(DocumentStoreError::Content(format!(
                "content nests deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }

        for (key, value) in document {
            let field_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };

            Self::validate_value(&field_path, value, depth)?;
        }

        Ok(())
    }

    fn validate_value(path: &str, value: &Bson, depth: usize) -> DocumentStoreResult<()> {
        match value {
            Bson::String(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Boolean(_) | Bson::Null => {
                Ok(())
            }
            Bson::Double(number) if number.is_finite() => Ok(()),
            Bson::Double(number) => Err(DocumentStoreError::Content(format!(
                "field {path} holds non-finite number {number}"
            ))),
            Bson::Document(nested) => Self::validate_document(path, nested, depth + 1),
            Bson::Array(items) => {
                if depth + 1 > MAX_NESTING_DEPTH {
                    return Err(DocumentStoreError::Content(format!(
                        "content nests deeper than {MAX_NESTING_DEPTH} levels"
                    )));
                }

                items
                    .iter()
                    .enumerate()
                    .try_for_each(|(index, item)| {
                        Self::validate_value(&format!("{path}[{index}]"), item, depth + 1)
                    })
            }
            other => Err(DocumentStoreError::Content(format!(
                "field {path} has unsupported type {:?}",
                other.element_type()
            ))),
        }
    }
}
