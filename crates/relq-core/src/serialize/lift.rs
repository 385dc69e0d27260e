use crate::serialize::{entity::SerializedItem, relations::Relations};
use std::collections::BTreeMap;

/// Lifted many-relation collections, ready for the top of the payload.
pub type ManyRelations = BTreeMap<String, Vec<SerializedItem>>;

/// Promote every many-to-many and list-valued many-to-one relation's items
/// to a single flat mapping, walking the whole nested record tree.
///
/// Deduplication compares full serialized equality — entities were already
/// flattened to plain data, so two items are duplicates iff every field
/// matches.
#[must_use]
pub fn lift_many_relations(relations: &Relations) -> ManyRelations {
    let mut lifted = ManyRelations::new();
    collect(relations, &mut lifted);

    lifted
}

fn collect(relations: &Relations, lifted: &mut ManyRelations) {
    for (name, record) in relations {
        if let Some(meta) = &record.meta {
            if meta.m2m || (meta.m2o && !meta.o2o) {
                let bucket = lifted.entry(name.clone()).or_default();
                for item in &record.items {
                    if !bucket.contains(item) {
                        bucket.push(item.clone());
                    }
                }
            }
        }

        collect(&record.relations, lifted);
    }
}

///
/// TESTS
///
