//! Field descriptors

use std::fmt;
use std::sync::Arc;

use structpack_codec::SharedCodec;

/// Whether a field surfaces as a named value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Carries one value under the field name
    #[default]
    Named,
    /// Occupies bytes only
    Padding,
}

/// One `(name, codec, visibility)` entry of a schema
#[derive(Clone)]
pub struct FieldDescriptor {
    name: Arc<str>,
    codec: SharedCodec,
    visibility: Visibility,
}

impl FieldDescriptor {
    /// A named field
    pub fn named(name: impl Into<Arc<str>>, codec: SharedCodec) -> Self {
        FieldDescriptor {
            name: name.into(),
            codec,
            visibility: Visibility::Named,
        }
    }

    /// A padding field; the name only identifies it for patches
    pub fn padding(name: impl Into<Arc<str>>, codec: SharedCodec) -> Self {
        FieldDescriptor {
            name: name.into(),
            codec,
            visibility: Visibility::Padding,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// Field codec
    pub fn codec(&self) -> &SharedCodec {
        &self.codec
    }

    /// Field visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the field carries a named value
    pub fn is_named(&self) -> bool {
        self.visibility == Visibility::Named
    }

    /// Same field with another codec
    pub fn with_codec(&self, codec: SharedCodec) -> Self {
        FieldDescriptor {
            name: Arc::clone(&self.name),
            codec,
            visibility: self.visibility,
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("codec", &self.codec)
            .finish()
    }
}
