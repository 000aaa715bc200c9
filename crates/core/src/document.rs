//! Document, field set, and identity types for Canopy.
//!
//! A `Document` is an identified record with an ordered mapping of field
//! names to values. Identity across the publication engine is the pair of
//! collection name and document id, captured by `DocKey`.

use crate::value::Value;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Stable identifier of a document, unique within its collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(String);

impl DocId {
    /// Creates a new document id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self(String::from(id))
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Composite key identifying a document across collections.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocKey {
    /// Collection the document belongs to.
    pub collection: String,
    /// Document id within the collection.
    pub id: DocId,
}

impl DocKey {
    /// Creates a new document key.
    pub fn new(collection: impl Into<String>, id: impl Into<DocId>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// An ordered mapping of field name to value.
///
/// Insertion order is preserved; `set` replaces an existing entry in place.
/// Equality is map equality: same keys, equal values, order ignored.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    /// Creates an empty field set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, or None if absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns true if a field with the given name exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a field, replacing any existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Merges another field set into this one, overwriting on collision.
    pub fn merge(&mut self, other: &Fields) {
        for (name, value) in other.iter() {
            self.set(name, value.clone());
        }
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.iter().all(|(name, value)| other.get(name) == Some(value))
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.set(name, value);
        }
        fields
    }
}

/// An identified record with named fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    id: DocId,
    fields: Fields,
}

impl Document {
    /// Creates a new document with the given id and fields.
    pub fn new(id: impl Into<DocId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Returns the document id.
    #[inline]
    pub fn id(&self) -> &DocId {
        &self.id
    }

    /// Returns the field set.
    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the value of a field, or None if absent.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field on the document.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.set(name, value);
    }

    /// Merges a field set into the document, overwriting on collision.
    pub fn apply(&mut self, fields: &Fields) {
        self.fields.merge(fields);
    }
}
