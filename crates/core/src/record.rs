//! Records and partial record views
//!
//! - [`Record`]: an ordered list of named values, the top-level unit packed
//!   and unpacked by a schema.
//! - [`RecordView`]: a read-only window over a record's declared field names
//!   and the values known so far. Union deciders and conditional predicates
//!   receive a view: the full record while packing, and only the fields
//!   decoded earlier in declaration order while unpacking.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ordered collection of named values
///
/// Field order is insertion order; it does not need to match any schema's
/// declaration order, since schemas look fields up by name when packing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create a record from `(name, value)` pairs, in order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Record::new();
        for (k, v) in pairs {
            record.set(k, v);
        }
        record
    }

    /// Builder-style `set`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing an existing value in place or appending
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Set a field, returning the value it replaced
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Get a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Get a field through nested records, e.g. `"header.kind"`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.get(segments.next()?)?;
        descend(first, segments)
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Field values in order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    /// Iterate `(name, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn descend<'a>(mut current: &'a Value, segments: std::str::Split<'_, char>) -> Option<&'a Value> {
    for segment in segments {
        current = current.as_record()?.get(segment)?;
    }
    Some(current)
}

/// Read-only view of a record's state during a pack or unpack call
///
/// `names` are the record's visible field names in declaration order;
/// `values` are positionally aligned with them and may be a strict prefix
/// (fields not decoded yet are simply unknown).
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    names: &'a [Arc<str>],
    values: &'a [Value],
    tracks_fields: bool,
}

impl RecordView<'static> {
    /// A view with no fields, used for standalone codec calls
    pub fn empty() -> Self {
        RecordView {
            names: &[],
            values: &[],
            tracks_fields: false,
        }
    }
}

impl<'a> RecordView<'a> {
    /// Create a view over a record's fields
    ///
    /// The codec receiving this view produces the record's field values in
    /// declaration order, so compound codecs refresh the known prefix as they
    /// go.
    pub fn new(names: &'a [Arc<str>], values: &'a [Value]) -> Self {
        debug_assert!(values.len() <= names.len());
        RecordView {
            names,
            values,
            tracks_fields: true,
        }
    }

    /// Same record, different known prefix
    pub fn with_known<'b>(&self, values: &'b [Value]) -> RecordView<'b>
    where
        'a: 'b,
    {
        RecordView {
            names: self.names,
            values,
            tracks_fields: self.tracks_fields,
        }
    }

    /// Same record state, but values produced under this view are not the
    /// record's fields (tuple members, array elements)
    pub fn detached(&self) -> RecordView<'a> {
        RecordView {
            tracks_fields: false,
            ..*self
        }
    }

    /// Whether values produced under this view are the record's own fields
    pub fn tracks_fields(&self) -> bool {
        self.tracks_fields
    }

    /// Look up a known field by name
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self.names.iter().position(|n| &**n == name)?;
        self.values.get(idx)
    }

    /// Look up a known field through nested records, e.g. `"header.kind"`
    pub fn get_path(&self, path: &str) -> Option<&'a Value> {
        let mut segments = path.split('.');
        let first = self.get(segments.next()?)?;
        descend(first, segments)
    }

    /// Declared field names
    pub fn names(&self) -> &'a [Arc<str>] {
        self.names
    }

    /// Known values, aligned with the leading names
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Number of fields whose values are known
    pub fn known(&self) -> usize {
        self.values.len()
    }

    /// Whether every declared field is known
    pub fn is_complete(&self) -> bool {
        self.values.len() == self.names.len()
    }
}
