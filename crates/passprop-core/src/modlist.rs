//! Attribute modification records and the per-request accumulator.
//!
//! The engine never writes to the directory itself; each branch expresses
//! its side effects as replace-modifications appended here, and the hosting
//! server applies the whole list atomically after the interceptor returns.

use crate::directory::{AttributeDescriptor, AttributeValue};

/// Modification operation kind. The engine only ever replaces values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModOp {
    Replace,
}

/// One attribute modification destined for the target entry.
#[derive(Debug, Clone)]
pub struct AttributeModification {
    attribute: AttributeDescriptor,
    op: ModOp,
    values: Vec<AttributeValue>,
    internal: bool,
}

impl AttributeModification {
    #[must_use]
    pub fn attribute(&self) -> &AttributeDescriptor {
        &self.attribute
    }

    #[must_use]
    pub fn op(&self) -> ModOp {
        self.op
    }

    #[must_use]
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Internally originated modifications were already access-checked once
    /// up front; the directory applies them without re-evaluating write
    /// access.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.internal
    }
}

/// Ordered accumulator of modifications for one password-change request.
///
/// Application order is append order. The interceptor appends realm-branch
/// modifications, if any, before hash-branch modifications; that ordering is
/// an invariant consumers may rely on.
#[derive(Debug, Default)]
pub struct ModificationList {
    mods: Vec<AttributeModification>,
}

impl ModificationList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a replace-modification flagged as internally originated.
    pub fn replace<V>(&mut self, attribute: &AttributeDescriptor, values: impl IntoIterator<Item = V>)
    where
        V: Into<AttributeValue>,
    {
        self.mods.push(AttributeModification {
            attribute: attribute.clone(),
            op: ModOp::Replace,
            values: values.into_iter().map(Into::into).collect(),
            internal: true,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeModification> {
        self.mods.iter()
    }

    /// First modification targeting the named attribute, if any.
    #[must_use]
    pub fn find(&self, attribute_name: &str) -> Option<&AttributeModification> {
        self.mods
            .iter()
            .find(|m| m.attribute.name().eq_ignore_ascii_case(attribute_name))
    }
}

impl<'a> IntoIterator for &'a ModificationList {
    type Item = &'a AttributeModification;
    type IntoIter = std::slice::Iter<'a, AttributeModification>;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.iter()
    }
}
