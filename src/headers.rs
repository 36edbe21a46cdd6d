//! An ordered, case-insensitive multi-map of header (or trailer) fields.

use crate::error::Result;
use crate::field::{eq_ignore_case, validate_name, validate_value};

/// A single `(name, value)` field, in the casing it was supplied with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    value: String,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered header/trailer field list owned by exactly one message at a
/// time. Lookup by name is case-insensitive and returns the first match;
/// duplicates are permitted and preserved in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    fields: Vec<Field>,
}

impl HeaderList {
    pub fn new() -> Self {
        HeaderList { fields: Vec::new() }
    }

    /// Validate `name` and `value`, then push the field at the end.
    pub fn append(&mut self, name: &str, value: &str) -> Result<()> {
        validate_name(name.as_bytes())?;
        validate_value(value.as_bytes())?;
        self.fields.push(Field {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    /// Remove every field matching `name` case-insensitively, then append
    /// `value` (if given) at the end.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.remove(name);
        if let Some(value) = value {
            self.append(name, value)?;
        }
        Ok(())
    }

    /// Remove every field matching `name` case-insensitively.
    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|f| !eq_ignore_case(&f.name, name));
    }

    /// The value of the first case-insensitive match, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| eq_ignore_case(&f.name, name))
            .map(|f| f.value.as_str())
    }

    /// Every value matching `name` case-insensitively, in order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |f| eq_ignore_case(&f.name, name))
            .map(|f| f.value.as_str())
    }

    /// `true` if any field matches `name` case-insensitively.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| eq_ignore_case(&f.name, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Transfer-Encoding` can repeat and its value can be comma-separated
    /// (`chunked, gzip`); this matches on any "chunked" token among all
    /// occurrences, matching RFC 7230 §3.3.1.
    pub fn has_chunked_transfer_encoding(&self) -> bool {
        self.all("Transfer-Encoding")
            .flat_map(|v| v.split(','))
            .map(|v| v.trim())
            .any(|v| eq_ignore_case(v, "chunked"))
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
