use crate::{
    error::{SchemaError, SchemaViolation},
    schema::relation::RelationshipDescriptor,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// FieldKind
///
/// Scalar type surface of one column as seen by the JSON boundary.
/// Deliberately a lossy projection of the embedding's full type system:
/// the compilers only need "is this a scalar column", the serializer only
/// needs JSON-safe values. Fields the boundary cannot carry are declared
/// `Unsupported` and rejected by the filter compiler.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum FieldKind {
    Bool,
    Int,
    Uint,
    Float,
    Decimal,
    Text,
    Date,
    Timestamp,
    Uuid,
    Unsupported,
}

impl FieldKind {
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

///
/// FieldDescriptor
/// Runtime field metadata used by compilation and serialization.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

///
/// EntityDescriptor
///
/// Reflection surface for one entity type: ordered scalar fields, primary
/// key(s), and named relationships. Fields and relationships share one
/// attribute namespace, so a criteria key resolves to exactly one of them.
///
/// Construct through [`EntityDescriptor::builder`]; the builder validates
/// the contract once so request-time lookups stay infallible.
///

#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    entity_name: String,
    fields: Vec<FieldDescriptor>,
    primary_keys: Vec<String>,
    relationships: BTreeMap<String, RelationshipDescriptor>,
}

impl EntityDescriptor {
    #[must_use]
    pub fn builder(entity_name: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            entity_name: entity_name.into(),
            fields: Vec::new(),
            primary_keys: Vec::new(),
            relationships: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Ordered field list (authoritative for serialization order).
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn relationships(&self) -> &BTreeMap<String, RelationshipDescriptor> {
        &self.relationships
    }

    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.get(name)
    }

    /// The single primary-key field.
    ///
    /// Entities with more than one primary-key column are deliberately
    /// refused: every nested resolution in this crate assumes a scalar row
    /// identity, and guessing which column to use would be silent
    /// misbehavior.
    pub fn primary_key(&self) -> Result<&str, SchemaViolation> {
        match self.primary_keys.as_slice() {
            [single] => Ok(single),
            _ => Err(SchemaViolation::AmbiguousPrimaryKey {
                entity: self.entity_name.clone(),
            }),
        }
    }
}

///
/// EntityBuilder
///

#[derive(Debug)]
pub struct EntityBuilder {
    entity_name: String,
    fields: Vec<FieldDescriptor>,
    primary_keys: Vec<String>,
    relationships: BTreeMap<String, RelationshipDescriptor>,
}

impl EntityBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    /// Declare a primary-key column. Calling this more than once records a
    /// composite key, which [`EntityDescriptor::primary_key`] later refuses.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_keys.push(name.into());
        self
    }

    #[must_use]
    pub fn relationship(
        mut self,
        name: impl Into<String>,
        descriptor: RelationshipDescriptor,
    ) -> Self {
        self.relationships.insert(name.into(), descriptor);
        self
    }

    pub fn build(self) -> Result<EntityDescriptor, SchemaError> {
        if self.entity_name.is_empty() {
            return Err(SchemaError::EmptyEntityName);
        }

        let mut seen = BTreeMap::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName {
                    entity: self.entity_name.clone(),
                });
            }
            if seen.insert(field.name.clone(), ()).is_some() {
                return Err(SchemaError::DuplicateField {
                    entity: self.entity_name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        for name in self.relationships.keys() {
            if seen.contains_key(name) {
                return Err(SchemaError::RelationshipShadowsField {
                    entity: self.entity_name.clone(),
                    relationship: name.clone(),
                });
            }
        }

        if self.primary_keys.is_empty() {
            return Err(SchemaError::MissingPrimaryKey {
                entity: self.entity_name.clone(),
            });
        }
        for key in &self.primary_keys {
            if !seen.contains_key(key) {
                return Err(SchemaError::UnknownPrimaryKey {
                    entity: self.entity_name.clone(),
                    field: key.clone(),
                });
            }
        }

        Ok(EntityDescriptor {
            entity_name: self.entity_name,
            fields: self.fields,
            primary_keys: self.primary_keys,
            relationships: self.relationships,
        })
    }
}

///
/// TESTS
///
