//! Core runtime for relq: schema descriptors, the criteria/ordering/
//! inclusion compilers, the relation-graph serializer, and the ergonomics
//! exported via the `prelude`.
//!
//! Every entry point is a synchronous pure function over immutable inputs:
//! a read-only [`schema::SchemaRegistry`], decoded JSON documents, and
//! materialized entity sets. Nothing here performs I/O, parses JSON text,
//! or executes queries — compiled plans and serialized payloads are data
//! contracts for the embedding's executor and transport layers.
#![warn(unreachable_pub)]

pub mod error;
pub mod obs;
pub mod query;
pub mod schema;
pub mod serialize;
pub mod source;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or serializer internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        query::{
            CompareOp, Direction, Expr, IncludeMask, ListQuery, OrderingPlan, PageSpec,
            QueryCompiler, QueryPolicy,
        },
        schema::{EntityDescriptor, FieldKind, RelationshipDescriptor, SchemaRegistry},
        source::Entity,
    };
}
