use crate::serialize::{entity::SerializedItem, lift::lift_many_relations, relations::Relations};
use serde_json::{Map, Value};

/// Assemble the response payload: the root items keyed by the root type
/// name, merged with every lifted many-relation collection.
#[must_use]
pub fn build_payload(
    root_name: &str,
    items: Vec<SerializedItem>,
    relations: &Relations,
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        root_name.to_string(),
        Value::Array(items.into_iter().map(Value::Object).collect()),
    );

    for (name, lifted) in lift_many_relations(relations) {
        payload.insert(
            name,
            Value::Array(lifted.into_iter().map(Value::Object).collect()),
        );
    }

    payload
}

///
/// TESTS
///
