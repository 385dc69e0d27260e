//! relq — criteria compiler and relation-graph serializer for
//! schema-validated API queries.
//!
//! ## Crate layout
//! - `core`: schema descriptors, the filter/ordering/inclusion compilers,
//!   the relation-graph serializer, and observability.
//!
//! The `prelude` module mirrors the surface embeddings use when wiring the
//! compilers to their request layer and the serializer to their executor.

pub use relq_core as core;

pub use relq_core::error::Error;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use relq_core::prelude::*;
    pub use relq_core::{
        query::{FilterCompiler, IncludeResolver, OrderingCompiler},
        serialize::{FieldsConfig, serialize_graph},
        source::{MemorySource, RelationSource},
    };
}
