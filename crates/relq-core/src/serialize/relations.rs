use crate::{
    error::{Error, SchemaViolation},
    obs::{self, ObsEvent},
    query::include::IncludeMask,
    schema::{EntityDescriptor, RelationDirection, RelationshipDescriptor, SchemaRegistry},
    serialize::entity::{FieldsConfig, SerializedItem, serialize_entity},
    source::{Entity, RelationSource, ScalarKey},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

///
/// RelationMeta
///
/// Per-relationship cardinality and join-key metadata computed during
/// serialization. Depends only on the schema, never on row data; it is
/// recomputed per call and callers may cache it themselves.
///
/// For many-to-many and derived relationships the "foreign key" is the
/// accessor name itself rather than a physical column, and `fk_pair` is
/// absent.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RelationMeta {
    pub pk: String,
    pub fk: Option<String>,
    pub fk_pair: Option<String>,
    pub m2m: bool,
    pub o2o: bool,
    pub m2o: bool,
    pub o2m: bool,
}

///
/// RelationRecord
///
/// One serialized relationship level: the deduplicated serialized items,
/// their own nested relation records, and (when requested) the metadata.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationRecord {
    pub items: Vec<SerializedItem>,
    pub relations: Relations,
    pub meta: Option<RelationMeta>,
}

pub type Relations = BTreeMap<String, RelationRecord>;

///
/// RelationGraphSerializer
///
/// Recursive relation-graph walk driven by a validated inclusion mask.
/// Depth equals mask depth, and masks are finite trees, so the walk always
/// terminates without a cycle guard. Related entities are collected as a
/// set keyed by primary-key value, collapsing duplicates shared across
/// owners before any per-entity work happens.
///

pub struct RelationGraphSerializer<'a> {
    registry: &'a SchemaRegistry,
    source: &'a dyn RelationSource,
    fields: FieldsConfig,
}

impl<'a> RelationGraphSerializer<'a> {
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry, source: &'a dyn RelationSource) -> Self {
        Self {
            registry,
            source,
            fields: FieldsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: FieldsConfig) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub const fn fields(&self) -> &FieldsConfig {
        &self.fields
    }

    pub fn serialize_relations(
        &self,
        entity: &str,
        entities: &[Entity],
        mask: &IncludeMask,
        want_meta: bool,
    ) -> Result<Relations, Error> {
        let desc = self.registry.entity(entity)?;
        let relations = self.walk(desc, entities, mask, want_meta)?;

        obs::record(ObsEvent::SerializeFinished {
            entities: entities.len(),
            relations: relations.len(),
        });

        Ok(relations)
    }

    fn walk(
        &self,
        desc: &EntityDescriptor,
        entities: &[Entity],
        mask: &IncludeMask,
        want_meta: bool,
    ) -> Result<Relations, Error> {
        let mut records = Relations::new();
        for (name, child_mask) in mask.iter() {
            let relation = desc.relationship(name).ok_or_else(|| {
                SchemaViolation::UnknownRelationship {
                    entity: desc.entity_name().to_string(),
                    relationship: name.clone(),
                }
            })?;
            let meta = self.relation_meta(name, relation)?;
            let target_desc = self.registry.target_of(relation)?;

            let related = self.collect_related(desc, entities, name, relation, &meta.pk)?;

            // Nested relations must carry metadata: flattening the items at
            // this level reads it.
            let child_relations = self.walk(target_desc, &related, child_mask, true)?;
            let items = related
                .iter()
                .map(|item| serialize_entity(target_desc, item, &child_relations, &self.fields))
                .collect();

            records.insert(
                name.clone(),
                RelationRecord {
                    items,
                    relations: child_relations,
                    meta: want_meta.then_some(meta),
                },
            );
        }

        Ok(records)
    }

    /// Collect the set of entities reachable through one relationship from
    /// the whole owner set. Duplicates shared across owners collapse by
    /// primary-key value.
    fn collect_related(
        &self,
        desc: &EntityDescriptor,
        entities: &[Entity],
        name: &str,
        relation: &RelationshipDescriptor,
        target_pk: &str,
    ) -> Result<Vec<Entity>, Error> {
        let mut seen: BTreeSet<ScalarKey> = BTreeSet::new();
        let mut related = Vec::new();
        for owner in entities {
            for item in self
                .source
                .related(self.registry, desc, owner, name, relation)?
            {
                match item.get(target_pk).and_then(ScalarKey::from_value) {
                    Some(key) => {
                        if seen.insert(key) {
                            related.push(item);
                        }
                    }
                    // Rows without a scalar key have no identity to collapse on.
                    None => related.push(item),
                }
            }
        }

        Ok(related)
    }

    fn relation_meta(
        &self,
        name: &str,
        relation: &RelationshipDescriptor,
    ) -> Result<RelationMeta, Error> {
        let target = self.registry.target_of(relation)?;
        let pk = target.primary_key()?.to_string();

        let m2m = relation.direction == RelationDirection::ManyToMany;
        let (fk, fk_pair) = if m2m {
            (Some(name.to_string()), None)
        } else {
            (relation.local_key.clone(), relation.remote_key.clone())
        };

        Ok(RelationMeta {
            pk,
            fk,
            fk_pair,
            m2m,
            o2o: relation.is_one_to_one(),
            m2o: relation.direction == RelationDirection::ManyToOne,
            o2m: relation.direction == RelationDirection::OneToMany,
        })
    }
}

///
/// TESTS
///
