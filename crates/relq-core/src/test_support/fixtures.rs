use crate::{
    schema::{EntityDescriptor, FieldKind, RelationshipDescriptor, SchemaRegistry},
    source::{Entity, MemorySource},
};
use serde_json::{Value, json};

/// Build an [`Entity`] from a `json!` object literal.
pub(crate) fn entity(value: Value) -> Entity {
    match value {
        Value::Object(map) => Entity::new(map),
        other => panic!("entity fixture must be an object, got {other:?}"),
    }
}

/// A small shop schema exercising every cardinality:
/// `order --m2o--> customer --m2o--> region`, `customer --o2o--> profile`,
/// `customer --o2m--> order --o2m--> item`, and a derived to-many
/// `order --tags--> tag`.
pub(crate) fn shop_registry() -> SchemaRegistry {
    let region = EntityDescriptor::builder("region")
        .field("id", FieldKind::Int)
        .field("code", FieldKind::Text)
        .primary_key("id")
        .build()
        .expect("region descriptor");

    let profile = EntityDescriptor::builder("profile")
        .field("id", FieldKind::Int)
        .field("bio", FieldKind::Text)
        .primary_key("id")
        .build()
        .expect("profile descriptor");

    let customer = EntityDescriptor::builder("customer")
        .field("id", FieldKind::Int)
        .field("name", FieldKind::Text)
        .field("region_id", FieldKind::Int)
        .field("profile_id", FieldKind::Int)
        .primary_key("id")
        .relationship(
            "region",
            RelationshipDescriptor::many_to_one("region", "region_id", "id"),
        )
        .relationship(
            "profile",
            RelationshipDescriptor::many_to_one("profile", "profile_id", "id"),
        )
        .relationship(
            "orders",
            RelationshipDescriptor::one_to_many("order", "id", "customer_id"),
        )
        .build()
        .expect("customer descriptor");

    let order = EntityDescriptor::builder("order")
        .field("id", FieldKind::Int)
        .field("status", FieldKind::Text)
        .field("total", FieldKind::Float)
        .field("reference", FieldKind::Text)
        .field("customer_id", FieldKind::Int)
        .primary_key("id")
        .relationship(
            "customer",
            RelationshipDescriptor::many_to_one("customer", "customer_id", "id"),
        )
        .relationship(
            "items",
            RelationshipDescriptor::one_to_many("item", "id", "order_id"),
        )
        .relationship("tags", RelationshipDescriptor::derived("tag", "name"))
        .build()
        .expect("order descriptor");

    let item = EntityDescriptor::builder("item")
        .field("id", FieldKind::Int)
        .field("order_id", FieldKind::Int)
        .field("quantity", FieldKind::Int)
        .field("sku", FieldKind::Text)
        .primary_key("id")
        .build()
        .expect("item descriptor");

    let tag = EntityDescriptor::builder("tag")
        .field("id", FieldKind::Int)
        .field("name", FieldKind::Text)
        .primary_key("id")
        .build()
        .expect("tag descriptor");

    let mut registry = SchemaRegistry::new();
    for desc in [region, profile, customer, order, item, tag] {
        registry.register(desc).expect("fixture registration");
    }

    registry
}

/// Rows matching [`shop_registry`]: two customers share one region and one
/// profile, orders 1 and 2 belong to customer 10, tag 500 is linked from
/// two different orders.
pub(crate) fn shop_source() -> MemorySource {
    let mut source = MemorySource::new();

    source.insert("region", entity(json!({"id": 1, "code": "EU"})));
    source.insert("profile", entity(json!({"id": 100, "bio": "wholesale"})));

    source.insert(
        "customer",
        entity(json!({"id": 10, "name": "Ann", "region_id": 1, "profile_id": 100})),
    );
    source.insert(
        "customer",
        entity(json!({"id": 11, "name": "Bob", "region_id": 1, "profile_id": 100})),
    );

    source.insert(
        "order",
        entity(json!({"id": 1, "status": "open", "total": 20.0, "reference": "INV-1", "customer_id": 10})),
    );
    source.insert(
        "order",
        entity(json!({"id": 2, "status": "paid", "total": 75.5, "reference": "INV-2", "customer_id": 10})),
    );
    source.insert(
        "order",
        entity(json!({"id": 3, "status": "open", "total": 5.0, "reference": "INV-3", "customer_id": 11})),
    );

    source.insert(
        "item",
        entity(json!({"id": 100, "order_id": 1, "quantity": 2, "sku": "A"})),
    );
    source.insert(
        "item",
        entity(json!({"id": 101, "order_id": 1, "quantity": 5, "sku": "B"})),
    );
    source.insert(
        "item",
        entity(json!({"id": 102, "order_id": 2, "quantity": 1, "sku": "A"})),
    );

    source.insert("tag", entity(json!({"id": 500, "name": "priority"})));
    source.insert("tag", entity(json!({"id": 501, "name": "archive"})));

    for (order_id, tag_id) in [(1, 500), (2, 501), (3, 500)] {
        source
            .link("order", "tags", &json!(order_id), &json!(tag_id))
            .expect("fixture link");
    }

    source
}
