//! Directory collaborator contracts and the entry data model.
//!
//! The hosting directory server owns storage, retrieval, and schema; the
//! engine only reads entries and resolves names to descriptors through the
//! narrow traits below. Lightweight in-memory implementations are provided
//! for tests and embedders.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from directory and schema collaborators.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The requested entry does not exist.
    #[error("entry not found: {entry_id}")]
    EntryNotFound { entry_id: String },

    /// The schema does not define the attribute.
    #[error("unknown attribute type '{name}'")]
    UnknownAttribute { name: String },

    /// The schema does not define the object class.
    #[error("unknown object class '{name}'")]
    UnknownObjectClass { name: String },
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// A resolved attribute descriptor.
///
/// Produced by a [`SchemaResolver`] once at configuration time and then
/// passed around read-only; cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    name: Arc<str>,
}

impl AttributeDescriptor {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for AttributeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A resolved object class reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectClassRef {
    name: Arc<str>,
}

impl ObjectClassRef {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A single attribute value: an explicit-length byte sequence.
///
/// Directory values are not guaranteed to be UTF-8; [`AttributeValue::as_str`]
/// is best-effort for the textual attributes this engine works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue(Vec<u8>);

impl AttributeValue {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// ASCII case-insensitive prefix check, used for credential scheme
    /// markers such as `{sasl}`.
    #[must_use]
    pub fn starts_with_ignore_ascii_case(&self, prefix: &str) -> bool {
        self.0.len() >= prefix.len() && self.0[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// A directory entry as read for propagation.
///
/// Entries are owned snapshots; releasing one is just dropping it, so the
/// C-style read/release pairing has no counterpart here.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    id: String,
    // Keyed by lowercased attribute name; values keep server order.
    attributes: HashMap<String, Vec<AttributeValue>>,
    object_classes: Vec<String>,
}

impl DirectoryEntry {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
            object_classes: Vec::new(),
        }
    }

    /// Add an attribute with its ordered values (builder style).
    #[must_use]
    pub fn with_attribute<V>(mut self, name: &str, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<AttributeValue>,
    {
        self.attributes
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Add an object class (builder style).
    #[must_use]
    pub fn with_object_class(mut self, name: &str) -> Self {
        self.object_classes.push(name.to_string());
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ordered values of an attribute, empty when absent.
    #[must_use]
    pub fn values(&self, attribute: &AttributeDescriptor) -> &[AttributeValue] {
        self.attributes
            .get(&attribute.name().to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// First value of an attribute, if any.
    #[must_use]
    pub fn first_value(&self, attribute: &AttributeDescriptor) -> Option<&AttributeValue> {
        self.values(attribute).first()
    }

    /// Whether the entry carries the given object class.
    #[must_use]
    pub fn has_object_class(&self, class: &ObjectClassRef) -> bool {
        self.object_classes
            .iter()
            .any(|oc| oc.eq_ignore_ascii_case(class.name()))
    }
}

/// Read access to directory entries under the overlay's own access path.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch an entry for read.
    async fn entry_for_read(&self, entry_id: &str) -> DirectoryResult<DirectoryEntry>;

    /// Whether the current operation may replace the entry's credential
    /// attribute. Checked once, up front; modifications produced afterwards
    /// are internally originated and bypass re-evaluation.
    async fn credential_write_allowed(&self, entry: &DirectoryEntry) -> bool;
}

/// Name-to-descriptor resolution against the server schema.
pub trait SchemaResolver: Send + Sync {
    fn resolve_attribute(&self, name: &str) -> DirectoryResult<AttributeDescriptor>;
    fn resolve_object_class(&self, name: &str) -> DirectoryResult<ObjectClassRef>;
}

/// In-memory directory used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: HashMap<String, DirectoryEntry>,
    write_denied: HashSet<String>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: DirectoryEntry) {
        self.entries.insert(entry.id().to_string(), entry);
    }

    /// Mark an entry as not writable for credential changes.
    pub fn deny_credential_write(&mut self, entry_id: &str) {
        self.write_denied.insert(entry_id.to_string());
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn entry_for_read(&self, entry_id: &str) -> DirectoryResult<DirectoryEntry> {
        self.entries
            .get(entry_id)
            .cloned()
            .ok_or_else(|| DirectoryError::EntryNotFound {
                entry_id: entry_id.to_string(),
            })
    }

    async fn credential_write_allowed(&self, entry: &DirectoryEntry) -> bool {
        !self.write_denied.contains(entry.id())
    }
}

/// In-memory schema with the attribute types and object classes this engine
/// needs out of the box. Additional names can be registered by embedders.
#[derive(Debug)]
pub struct MemorySchema {
    attributes: HashSet<String>,
    object_classes: HashSet<String>,
}

impl Default for MemorySchema {
    fn default() -> Self {
        let attributes = [
            "objectClass",
            "uid",
            "userPassword",
            "sambaNTPassword",
            "sambaPwdLastSet",
            "sambaPwdMustChange",
            "sambaPwdCanChange",
        ];
        let object_classes = ["top", "person", "posixAccount", "sambaSamAccount"];
        Self {
            attributes: attributes.iter().map(|s| s.to_ascii_lowercase()).collect(),
            object_classes: object_classes.iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }
}

impl MemorySchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_attribute(&mut self, name: &str) {
        self.attributes.insert(name.to_ascii_lowercase());
    }

    pub fn register_object_class(&mut self, name: &str) {
        self.object_classes.insert(name.to_ascii_lowercase());
    }
}

impl SchemaResolver for MemorySchema {
    fn resolve_attribute(&self, name: &str) -> DirectoryResult<AttributeDescriptor> {
        if self.attributes.contains(&name.to_ascii_lowercase()) {
            Ok(AttributeDescriptor::new(name))
        } else {
            Err(DirectoryError::UnknownAttribute {
                name: name.to_string(),
            })
        }
    }

    fn resolve_object_class(&self, name: &str) -> DirectoryResult<ObjectClassRef> {
        if self.object_classes.contains(&name.to_ascii_lowercase()) {
            Ok(ObjectClassRef::new(name))
        } else {
            Err(DirectoryError::UnknownObjectClass {
                name: name.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> DirectoryEntry {
        DirectoryEntry::new("uid=jdoe,ou=people,dc=example,dc=org")
            .with_object_class("person")
            .with_object_class("sambaSamAccount")
            .with_attribute("uid", ["jdoe"])
            .with_attribute("userPassword", ["{SASL}jdoe@EXAMPLE.ORG"])
    }

    #[test]
    fn attribute_lookup_is_case_insensitive() {
        let entry = sample_entry();
        let desc = AttributeDescriptor::new("UserPassword");
        assert_eq!(
            entry.first_value(&desc).and_then(AttributeValue::as_str),
            Some("{SASL}jdoe@EXAMPLE.ORG")
        );
    }

    #[test]
    fn object_class_check_is_case_insensitive() {
        let entry = sample_entry();
        assert!(entry.has_object_class(&ObjectClassRef::new("sambasamaccount")));
        assert!(!entry.has_object_class(&ObjectClassRef::new("inetOrgPerson")));
    }

    #[test]
    fn scheme_marker_prefix_ignores_case() {
        let value = AttributeValue::from("{SASL}jdoe@EXAMPLE.ORG");
        assert!(value.starts_with_ignore_ascii_case("{sasl}"));
        let plain = AttributeValue::from("{SSHA}xyz");
        assert!(!plain.starts_with_ignore_ascii_case("{sasl}"));
    }

    #[test]
    fn memory_schema_rejects_unknown_names() {
        let schema = MemorySchema::new();
        assert!(schema.resolve_attribute("sambaNTPassword").is_ok());
        let err = schema.resolve_object_class("krbPrincipalAux").unwrap_err();
        assert!(err.to_string().contains("krbPrincipalAux"));
    }

    #[tokio::test]
    async fn memory_directory_read_and_access() {
        let mut dir = MemoryDirectory::new();
        dir.insert(sample_entry());
        dir.deny_credential_write("uid=locked");

        let entry = dir
            .entry_for_read("uid=jdoe,ou=people,dc=example,dc=org")
            .await
            .unwrap();
        assert!(dir.credential_write_allowed(&entry).await);

        let missing = dir.entry_for_read("uid=ghost").await;
        assert!(matches!(
            missing,
            Err(DirectoryError::EntryNotFound { .. })
        ));
    }
}
