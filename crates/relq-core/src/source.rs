use crate::{
    error::{Error, SerializeError},
    schema::{EntityDescriptor, RelationDirection, RelationshipDescriptor, SchemaRegistry},
};
use derive_more::{Deref, DerefMut};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

///
/// Entity
///
/// One materialized row: field name to JSON-safe value. Produced by the
/// embedding's query executor after it applies a compiled plan; the
/// serializer only reads.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, PartialEq)]
pub struct Entity(pub Map<String, Value>);

impl Entity {
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

///
/// ScalarKey
///
/// Orderable identity of a scalar JSON value, used to collapse related
/// entities into sets and to match link pairs. Floats key by bit pattern:
/// good enough for identity, not meant for numeric ordering.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum ScalarKey {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(u64),
    Text(String),
}

impl ScalarKey {
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_u64().map(Self::Uint))
                .or_else(|| number.as_f64().map(|float| Self::Float(float.to_bits()))),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

///
/// RelationSource
///
/// Seam to the embedding's data layer: resolve the entities related to one
/// owner through a named relationship. The serializer walks the relation
/// graph exclusively through this trait, so it never assumes an ORM, a
/// connection, or any particular store.
///

pub trait RelationSource {
    fn related(
        &self,
        registry: &SchemaRegistry,
        owner_desc: &EntityDescriptor,
        owner: &Entity,
        name: &str,
        relation: &RelationshipDescriptor,
    ) -> Result<Vec<Entity>, Error>;
}

///
/// MemorySource
///
/// In-memory [`RelationSource`]: direct relationships join on the
/// local/remote key pair, many-to-many and derived relationships resolve
/// through explicit link pairs. Used by the test suite and by embeddings
/// that materialize rows without an ORM.
///

#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    tables: BTreeMap<String, Vec<Entity>>,
    links: BTreeMap<(String, String), Vec<(ScalarKey, ScalarKey)>>,
}

impl MemorySource {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entity_type: impl Into<String>, entity: Entity) {
        self.tables.entry(entity_type.into()).or_default().push(entity);
    }

    /// Record one association pair for a many-to-many or derived
    /// relationship, keyed by owner and target primary-key values.
    pub fn link(
        &mut self,
        owner_type: impl Into<String>,
        relation_name: impl Into<String>,
        owner_key: &Value,
        target_key: &Value,
    ) -> Result<(), Error> {
        let relation_name = relation_name.into();
        let owner_key = scalar_key(&relation_name, owner_key)?;
        let target_key = scalar_key(&relation_name, target_key)?;

        self.links
            .entry((owner_type.into(), relation_name))
            .or_default()
            .push((owner_key, target_key));

        Ok(())
    }

    #[must_use]
    pub fn table(&self, entity_type: &str) -> &[Entity] {
        self.tables
            .get(entity_type)
            .map_or(&[], |rows| rows.as_slice())
    }
}

impl RelationSource for MemorySource {
    fn related(
        &self,
        registry: &SchemaRegistry,
        owner_desc: &EntityDescriptor,
        owner: &Entity,
        name: &str,
        relation: &RelationshipDescriptor,
    ) -> Result<Vec<Entity>, Error> {
        let rows = self.table(&relation.target);

        if relation.direction == RelationDirection::ManyToMany {
            let owner_pk = owner_desc.primary_key()?;
            let Some(owner_key) = owner.get(owner_pk).and_then(ScalarKey::from_value) else {
                return Err(SerializeError::NonScalarJoinKey {
                    relationship: name.to_string(),
                }
                .into());
            };

            let target_desc = registry.target_of(relation)?;
            let target_pk = target_desc.primary_key()?.to_string();

            let wanted: BTreeSet<&ScalarKey> = self
                .links
                .get(&(owner_desc.entity_name().to_string(), name.to_string()))
                .map(|pairs| {
                    pairs
                        .iter()
                        .filter(|(from, _)| *from == owner_key)
                        .map(|(_, to)| to)
                        .collect()
                })
                .unwrap_or_default();

            let related = rows
                .iter()
                .filter(|row| {
                    row.get(&target_pk)
                        .and_then(ScalarKey::from_value)
                        .is_some_and(|key| wanted.contains(&key))
                })
                .cloned()
                .collect();

            return Ok(related);
        }

        let (Some(local), Some(remote)) = (&relation.local_key, &relation.remote_key) else {
            return Err(SerializeError::MissingJoinKey {
                relationship: name.to_string(),
            }
            .into());
        };

        // A missing or null join value relates to nothing.
        let join_value = match owner.get(local) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(value) => value,
        };

        let mut related: Vec<Entity> = rows
            .iter()
            .filter(|row| row.get(remote) == Some(join_value))
            .cloned()
            .collect();
        if relation.single_valued {
            related.truncate(1);
        }

        Ok(related)
    }
}

fn scalar_key(relationship: &str, value: &Value) -> Result<ScalarKey, Error> {
    ScalarKey::from_value(value).ok_or_else(|| {
        SerializeError::NonScalarJoinKey {
            relationship: relationship.to_string(),
        }
        .into()
    })
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{entity, shop_registry, shop_source};
    use serde_json::json;

    #[test]
    fn direct_relationship_joins_on_key_pair() {
        let registry = shop_registry();
        let source = shop_source();
        let order_desc = registry.entity("order").expect("order descriptor");
        let relation = order_desc
            .relationship("customer")
            .expect("customer relationship");

        let order = entity(json!({"id": 1, "customer_id": 10}));
        let related = source
            .related(&registry, order_desc, &order, "customer", relation)
            .expect("join should resolve");

        assert_eq!(related.len(), 1);
        assert_eq!(related[0].get("id"), Some(&json!(10)));
    }

    #[test]
    fn null_join_value_relates_to_nothing() {
        let registry = shop_registry();
        let source = shop_source();
        let order_desc = registry.entity("order").expect("order descriptor");
        let relation = order_desc
            .relationship("customer")
            .expect("customer relationship");

        let order = entity(json!({"id": 1, "customer_id": null}));
        let related = source
            .related(&registry, order_desc, &order, "customer", relation)
            .expect("null join should resolve to empty");
        assert!(related.is_empty());
    }

    #[test]
    fn many_to_many_resolves_through_link_pairs() {
        let registry = shop_registry();
        let source = shop_source();
        let order_desc = registry.entity("order").expect("order descriptor");
        let relation = order_desc.relationship("tags").expect("tags relationship");

        let order = entity(json!({"id": 1, "customer_id": 10}));
        let related = source
            .related(&registry, order_desc, &order, "tags", relation)
            .expect("links should resolve");

        let names: Vec<_> = related
            .iter()
            .map(|tag| tag.get("name").cloned())
            .collect();
        assert_eq!(names, vec![Some(json!("priority"))]);
    }

    #[test]
    fn scalar_key_refuses_structured_values() {
        assert!(ScalarKey::from_value(&json!([1])).is_none());
        assert!(ScalarKey::from_value(&json!({"a": 1})).is_none());
        assert_eq!(
            ScalarKey::from_value(&json!("x")),
            Some(ScalarKey::Text("x".to_string()))
        );
    }
}
