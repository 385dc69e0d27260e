//! Relation-graph serialization: recursive traversal of related entities
//! into flattened, deduplicated, metadata-annotated output.

pub mod entity;
pub mod lift;
pub mod payload;
pub mod relations;

pub use entity::{FieldsConfig, SerializedItem, serialize_entity};
pub use lift::{ManyRelations, lift_many_relations};
pub use payload::build_payload;
pub use relations::{RelationGraphSerializer, RelationMeta, RelationRecord, Relations};

use crate::{
    error::Error,
    query::include::IncludeMask,
    schema::SchemaRegistry,
    source::{Entity, RelationSource},
};
use serde_json::{Map, Value};

/// Serialize a root entity set and its included relation graph into the
/// full response payload in one call: walk the mask, flatten each root
/// entity, lift the many-relations.
pub fn serialize_graph(
    registry: &SchemaRegistry,
    entity: &str,
    entities: &[Entity],
    mask: &IncludeMask,
    source: &dyn RelationSource,
    fields: &FieldsConfig,
) -> Result<Map<String, Value>, Error> {
    let desc = registry.entity(entity)?;
    let serializer = RelationGraphSerializer::new(registry, source).with_fields(fields.clone());
    let relations = serializer.serialize_relations(entity, entities, mask, true)?;

    let items = entities
        .iter()
        .map(|row| serialize_entity(desc, row, &relations, fields))
        .collect();

    Ok(build_payload(desc.entity_name(), items, &relations))
}
