use crate::{
    schema::EntityDescriptor,
    serialize::relations::Relations,
    source::Entity,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// One entity serialized to a JSON-safe map.
pub type SerializedItem = Map<String, Value>;

///
/// FieldsConfig
///
/// Per-entity-type field selection. An include list restricts output to the
/// named fields; an exclude list removes fields regardless of the include
/// list. Types without an entry serialize all their fields.
///

#[derive(Clone, Debug, Default)]
pub struct FieldsConfig {
    include: BTreeMap<String, BTreeSet<String>>,
    exclude: BTreeMap<String, BTreeSet<String>>,
}

impl FieldsConfig {
    #[must_use]
    pub fn include_for<I, S>(mut self, entity: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include
            .entry(entity.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn exclude_for<I, S>(mut self, entity: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude
            .entry(entity.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    fn allows(&self, entity: &str, field: &str) -> bool {
        if self
            .exclude
            .get(entity)
            .is_some_and(|fields| fields.contains(field))
        {
            return false;
        }

        match self.include.get(entity) {
            Some(fields) if !fields.is_empty() => fields.contains(field),
            _ => true,
        }
    }
}

/// Serialize one entity's scalar fields and flatten its to-one relations.
///
/// Flattening rule:
/// - a one-to-many relation attaches as a list under its name, filtered to
///   the items whose join key matches this entity's own join value (the
///   set-collapse upstream mixes items belonging to sibling owners);
/// - a one-to-one relation inlines its single matching item directly under
///   its name, and the local join field is dropped as redundant;
/// - lifted many-relations (many-to-many, list-valued many-to-one) attach
///   nothing here; they surface in the top-level collections.
#[must_use]
pub fn serialize_entity(
    desc: &EntityDescriptor,
    entity: &Entity,
    relations: &Relations,
    fields: &FieldsConfig,
) -> SerializedItem {
    let mut out = SerializedItem::new();
    for field in desc.fields() {
        if !fields.allows(desc.entity_name(), &field.name) {
            continue;
        }
        let value = entity.get(&field.name).cloned().unwrap_or(Value::Null);
        out.insert(field.name.clone(), value);
    }

    for (name, record) in relations {
        let Some(meta) = &record.meta else {
            continue;
        };
        let (Some(fk), Some(fk_pair)) = (&meta.fk, &meta.fk_pair) else {
            continue;
        };

        if meta.o2m && !meta.o2o {
            let matched: Vec<Value> = record
                .items
                .iter()
                .filter(|item| join_matches(out.get(fk), item.get(fk_pair)))
                .map(|item| Value::Object(item.clone()))
                .collect();
            if !matched.is_empty() {
                out.insert(name.clone(), Value::Array(matched));
            }
        } else if meta.o2o {
            let matched = record
                .items
                .iter()
                .find(|item| join_matches(out.get(fk), item.get(fk_pair)));
            if let Some(item) = matched {
                out.remove(fk);
                out.insert(name.clone(), Value::Object(item.clone()));
            }
        }
    }

    out
}

// Null or missing join values never match; equality on nulls would attach
// unrelated rows reintroduced by the set-collapse.
fn join_matches(owner: Option<&Value>, related: Option<&Value>) -> bool {
    match (owner, related) {
        (Some(left), Some(right)) => !left.is_null() && !right.is_null() && left == right,
        _ => false,
    }
}

///
/// TESTS
///
