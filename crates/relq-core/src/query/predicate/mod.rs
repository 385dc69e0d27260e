//! Predicate layer: the pure expression tree and the schema-validating
//! compiler that builds it from decoded criteria documents.

pub mod ast;
pub mod compile;

pub use ast::{CompareExpr, CompareOp, Expr};
pub use compile::FilterCompiler;
