//! Edits applied when deriving one schema from another

use structpack_core::{Error, Result};
use tracing::debug;

use crate::field::FieldDescriptor;

/// One edit to an inherited field list
#[derive(Debug, Clone)]
pub enum SchemaPatch {
    /// Add a field after the inherited ones
    Append(FieldDescriptor),
    /// Swap the codec (and visibility) of an inherited field, keeping its position
    Replace(FieldDescriptor),
    /// Drop an inherited field
    Remove(String),
}

impl SchemaPatch {
    /// Append a field
    pub fn append(field: FieldDescriptor) -> Self {
        SchemaPatch::Append(field)
    }

    /// Replace the field with the same name
    pub fn replace(field: FieldDescriptor) -> Self {
        SchemaPatch::Replace(field)
    }

    /// Remove a field by name
    pub fn remove(name: impl Into<String>) -> Self {
        SchemaPatch::Remove(name.into())
    }

    pub(crate) fn apply(self, fields: &mut Vec<FieldDescriptor>) -> Result<()> {
        match self {
            SchemaPatch::Append(field) => {
                debug!("Appending field '{}'", field.name());
                fields.push(field);
            }
            SchemaPatch::Replace(field) => {
                let idx = position(fields, field.name())?;
                debug!("Replacing field '{}' at {}", field.name(), idx);
                fields[idx] = field;
            }
            SchemaPatch::Remove(name) => {
                let idx = position(fields, &name)?;
                debug!("Removing field '{}' at {}", name, idx);
                fields.remove(idx);
            }
        }
        Ok(())
    }
}

// A named field wins over padding that happens to share its name.
fn position(fields: &[FieldDescriptor], name: &str) -> Result<usize> {
    fields
        .iter()
        .position(|f| f.is_named() && f.name() == name)
        .or_else(|| fields.iter().position(|f| f.name() == name))
        .ok_or_else(|| Error::InvalidSchema(format!("no inherited field named '{}'", name)))
}
