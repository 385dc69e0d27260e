use crate::{
    error::{SchemaError, SchemaViolation},
    schema::{entity::EntityDescriptor, relation::RelationshipDescriptor},
};
use std::collections::BTreeMap;

///
/// SchemaRegistry
///
/// Process-wide map from entity-type name to its descriptor. Built once at
/// startup and never mutated afterward; all compile/serialize calls borrow
/// it read-only, so concurrent use needs no coordination.
///

#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    entities: BTreeMap<String, EntityDescriptor>,
}

impl SchemaRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, descriptor: EntityDescriptor) -> Result<(), SchemaError> {
        let name = descriptor.entity_name().to_string();
        if self.entities.contains_key(&name) {
            return Err(SchemaError::DuplicateEntity { entity: name });
        }
        self.entities.insert(name, descriptor);

        Ok(())
    }

    pub fn entity(&self, name: &str) -> Result<&EntityDescriptor, SchemaViolation> {
        self.entities
            .get(name)
            .ok_or_else(|| SchemaViolation::UnknownEntity {
                entity: name.to_string(),
            })
    }

    /// Resolve the target descriptor of a relationship.
    pub fn target_of(
        &self,
        relationship: &RelationshipDescriptor,
    ) -> Result<&EntityDescriptor, SchemaViolation> {
        self.entity(&relationship.target)
    }
}

///
/// TESTS
///
