//! Read-only reflection surface over the relational model.
//!
//! The embedding application builds one [`EntityDescriptor`] per entity type
//! and collects them in a [`SchemaRegistry`] at startup. Everything here is
//! immutable after construction; the compilers and the serializer only read.

pub mod entity;
pub mod registry;
pub mod relation;

pub use entity::{EntityBuilder, EntityDescriptor, FieldDescriptor, FieldKind};
pub use registry::SchemaRegistry;
pub use relation::{RelationDirection, RelationshipDescriptor};
