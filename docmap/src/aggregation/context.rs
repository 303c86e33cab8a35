use crate::document::{Document, Value};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;

type PathSegments<'a> = SmallVec<[&'a str; 8]>;

/// Translates documents expressed in entity property names into documents
/// expressed in storage field names.
///
/// Aggregation operations never rename fields themselves. They hand their
/// raw document to the context and trust the result, which keeps stage
/// construction independent of how entities are mapped.
pub trait AggregationOperationContext: Send + Sync {
    /// Returns a copy of `document` with property names replaced by field names.
    fn get_mapped_object(&self, document: &Document) -> DocmapResult<Document>;

    /// Maps the body of a stage command such as `$geoNear`, whose own
    /// keywords are not entity properties.
    ///
    /// Defaults to [`get_mapped_object`](Self::get_mapped_object) on the
    /// whole command.
    fn get_mapped_command(&self, command: &Document) -> DocmapResult<Document> {
        self.get_mapped_object(command)
    }
}

/// A context that returns documents unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAggregationContext;

impl AggregationOperationContext for NoOpAggregationContext {
    fn get_mapped_object(&self, document: &Document) -> DocmapResult<Document> {
        Ok(document.clone())
    }
}

const QUERY: &str = "query";

/// A context backed by a property-path to field-name table.
///
/// A mapped object is read as query criteria. A dotted key is translated by
/// its longest mapped prefix, so with `address -> addr` the key
/// `address.city` becomes `addr.city`. Keys of an embedded document are
/// resolved relative to the property that holds it. Logical operators
/// (`$and`, `$or`, `$nor`) and `$elemMatch`/`$not` are descended into; the
/// operands of every other operator, GeoJSON geometries included, are
/// copied as they are. Unmapped keys pass through, unless the context is
/// strict and the key is a top-level property.
///
/// For commands only the `query` sub-document is translated.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone, Default)]
pub struct FieldMappingContext {
    inner: Arc<FieldMappingInner>,
}

#[derive(Default)]
struct FieldMappingInner {
    fields: BTreeMap<String, String>,
    strict: bool,
}

/// Property path of an embedded document and the field path it maps to.
struct ParentPath<'a> {
    property: &'a str,
    field: &'a str,
}

impl FieldMappingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder for a context.
    pub fn builder() -> FieldMappingContextBuilder {
        FieldMappingContextBuilder::default()
    }

    pub fn is_strict(&self) -> bool {
        self.inner.strict
    }

    /// Field name for a property path, if the table has an entry for it or
    /// for one of its prefixes.
    pub fn field_for(&self, property: &str) -> Option<String> {
        if let Some(field) = self.inner.fields.get(property) {
            return Some(field.clone());
        }

        let segments: PathSegments = property.split('.').collect();
        for prefix_len in (1..segments.len()).rev() {
            let prefix = segments[..prefix_len].join(".");
            if let Some(field) = self.inner.fields.get(&prefix) {
                let rest = segments[prefix_len..].join(".");
                return Some(format!("{}.{}", field, rest));
            }
        }
        None
    }

    fn map_criteria(
        &self,
        criteria: &Document,
        parent: Option<&ParentPath>,
    ) -> DocmapResult<Document> {
        let mut mapped = Document::new();
        for (key, value) in criteria.iter() {
            if key.starts_with('$') {
                mapped.put(key, self.map_operator(key, value, parent)?)?;
                continue;
            }

            let property = match parent {
                Some(parent) => format!("{}.{}", parent.property, key),
                None => key.clone(),
            };
            let field_path = match self.field_for(&property) {
                Some(field) => field,
                None if parent.is_none() && self.inner.strict => {
                    log::error!("No field mapping for property {}", key);
                    return Err(DocmapError::new(
                        &format!("No field mapping registered for property '{}'", key),
                        ErrorKind::InvalidFieldName,
                    ));
                }
                None => match parent {
                    Some(parent) => format!("{}.{}", parent.field, key),
                    None => key.clone(),
                },
            };
            let local_key = match parent {
                Some(parent) => field_path
                    .strip_prefix(parent.field)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .unwrap_or(key.as_str())
                    .to_string(),
                None => field_path.clone(),
            };

            let path = ParentPath {
                property: &property,
                field: &field_path,
            };
            mapped.put(&local_key, self.map_value(value, &path)?)?;
        }
        Ok(mapped)
    }

    fn map_operator(
        &self,
        operator: &str,
        operand: &Value,
        parent: Option<&ParentPath>,
    ) -> DocmapResult<Value> {
        match (operator, operand) {
            ("$and" | "$or" | "$nor", Value::Array(clauses)) => {
                let mut mapped = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    mapped.push(match clause {
                        Value::Document(doc) => Value::Document(self.map_criteria(doc, parent)?),
                        other => other.clone(),
                    });
                }
                Ok(Value::Array(mapped))
            }
            ("$elemMatch" | "$not", Value::Document(doc)) => {
                Ok(Value::Document(self.map_criteria(doc, parent)?))
            }
            _ => Ok(operand.clone()),
        }
    }

    fn map_value(&self, value: &Value, path: &ParentPath) -> DocmapResult<Value> {
        match value {
            Value::Document(doc) => Ok(Value::Document(self.map_criteria(doc, Some(path))?)),
            Value::Array(values) => {
                let mut mapped = Vec::with_capacity(values.len());
                for value in values {
                    mapped.push(self.map_value(value, path)?);
                }
                Ok(Value::Array(mapped))
            }
            other => Ok(other.clone()),
        }
    }
}

impl AggregationOperationContext for FieldMappingContext {
    fn get_mapped_object(&self, document: &Document) -> DocmapResult<Document> {
        self.map_criteria(document, None)
    }

    fn get_mapped_command(&self, command: &Document) -> DocmapResult<Document> {
        let mut mapped = Document::new();
        for (key, value) in command.iter() {
            match value {
                Value::Document(query) if key == QUERY => {
                    mapped.put(key, self.map_criteria(query, None)?)?;
                }
                other => {
                    mapped.put(key, other.clone())?;
                }
            }
        }
        Ok(mapped)
    }
}

/// Builder for [FieldMappingContext].
#[derive(Default)]
pub struct FieldMappingContextBuilder {
    fields: BTreeMap<String, String>,
    strict: bool,
}

impl FieldMappingContextBuilder {
    /// Maps an entity property path to a storage field name.
    pub fn map_property(mut self, property: &str, field: &str) -> Self {
        self.fields.insert(property.to_string(), field.to_string());
        self
    }

    /// Rejects unmapped top-level properties.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> FieldMappingContext {
        FieldMappingContext {
            inner: Arc::new(FieldMappingInner {
                fields: self.fields,
                strict: self.strict,
            }),
        }
    }
}
