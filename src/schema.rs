//! Complex data-type metadata the normalizer resolves identifiers against
//!
//! A [`DataType`] is the boundary contract with the surrounding resource
//! metadata layer: a named set of fields, where a field may itself carry a
//! nested complex type, forming the field graph that dotted filter paths
//! walk. Lookup is case-insensitive per segment; resolution returns the
//! declared (canonical) casing.

use crate::ast::FieldBinding;
use crate::error::{Error, Result};
use std::sync::Arc;

/// A named complex data type with a flat list of declared fields
#[derive(Debug, Clone)]
pub struct DataType {
    name: String,
    fields: Vec<Field>,
    additional_fields: bool,
}

/// One declared field of a complex type
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    data_type: Option<Arc<DataType>>,
}

impl Field {
    /// A scalar field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    /// A field holding a nested complex type
    pub fn complex(name: impl Into<String>, data_type: Arc<DataType>) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type),
        }
    }

    /// Declared (canonical) field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nested complex type, if any
    pub fn data_type(&self) -> Option<&Arc<DataType>> {
        self.data_type.as_ref()
    }
}

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            additional_fields: false,
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Allow paths that do not resolve to a declared field to pass through
    /// unbound instead of failing
    pub fn with_additional_fields(mut self) -> Self {
        self.additional_fields = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn additional_fields(&self) -> bool {
        self.additional_fields
    }

    /// Case-insensitive lookup of a direct field
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a dotted path against this type's field graph.
    ///
    /// Each segment is matched case-insensitively and canonicalized to its
    /// declared name; intermediate segments must be complex fields. Returns
    /// `Ok(None)` when the path misses but the type at that level declares
    /// `additional_fields` — the identifier then passes through unbound.
    /// Filter paths resolve exactly; there is no parent-absorption here
    /// (see [`absorb_parents`] for pick/omit/include lists).
    pub fn resolve_path(&self, path: &str) -> Result<Option<FieldBinding>> {
        let mut current = self;
        let mut canonical: Vec<&str> = Vec::new();
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let Some(field) = current.find_field(segment) else {
                if current.additional_fields {
                    return Ok(None);
                }
                return Err(Error::UnknownField {
                    path: path.to_string(),
                });
            };
            canonical.push(field.name());

            if segments.peek().is_none() {
                return Ok(Some(FieldBinding {
                    path: canonical.join("."),
                    field: field.name().to_string(),
                    data_type: field.data_type().map(|dt| dt.name().to_string()),
                }));
            }

            // More segments to walk; this one must be complex.
            match field.data_type() {
                Some(dt) => current = dt,
                None => {
                    return Err(Error::UnknownField {
                        path: path.to_string(),
                    })
                }
            }
        }

        Err(Error::UnknownField {
            path: path.to_string(),
        })
    }
}

/// Collapse a field-path list so that a parent path absorbs its children:
/// requesting both `address` and `address.city` yields `address` alone.
///
/// Used by pick/omit/include normalization; order of first appearance is
/// preserved and duplicates are dropped.
pub fn absorb_parents<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if result
            .iter()
            .any(|kept| kept == path || is_parent_of(kept, path))
        {
            continue;
        }
        // A new parent also evicts previously kept children.
        result.retain(|kept| !is_parent_of(path, kept));
        result.push(path.to_string());
    }

    result
}

/// Whether `parent` is a strict dotted-path prefix of `child`
fn is_parent_of(parent: &str, child: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'.'
}
