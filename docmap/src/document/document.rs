use crate::document::Value;
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};

/// An ordered wire-format document.
///
/// Keys are strings, values are [Value]s. Unlike a general purpose map the
/// insertion order of keys is preserved, because the document database
/// interprets some documents positionally: a pipeline stage is a single-key
/// document whose only key is the operator name, and commands are read in
/// key order.
///
/// Dotted keys such as `"address.city"` are stored verbatim. In queries they
/// denote a path into an embedded document and are resolved by the server,
/// not by this type.
#[derive(Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Creates a document with a single entry, the shape of a pipeline stage.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is empty.
    pub fn single(key: &str, value: impl Into<Value>) -> DocmapResult<Self> {
        let mut doc = Document::new();
        doc.put(key, value)?;
        Ok(doc)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`.
    ///
    /// Replacing an existing key keeps its original position.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> DocmapResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocmapError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }
        self.data.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Returns the embedded document stored under `key`, if any.
    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.data.get(key).and_then(Value::as_document)
    }

    pub fn get_document_mut(&mut self, key: &str) -> Option<&mut Document> {
        self.data.get_mut(key).and_then(Value::as_document_mut)
    }

    /// Removes `key` while keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// The first key of the document. For a pipeline stage this is the operator.
    pub fn first_key(&self) -> Option<&str> {
        self.data.keys().next().map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Copies every entry of `other` into this document, overwriting
    /// existing keys.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.data
                .iter()
                .map(|(key, value)| format!("\"{}\": {}", key, value))
                .join(", ")
        )
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// Strips the quotes `stringify!` leaves around literal keys in [`doc!`](crate::doc).
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}
