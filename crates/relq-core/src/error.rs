use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level failure surface for the compile/serialize entry points.
/// Every variant indicates a malformed request or schema misuse; none are
/// transient and none are retried.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Violation(#[from] SchemaViolation),

    #[error(transparent)]
    Document(#[from] MalformedDocument),

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

///
/// SchemaError
///
/// Descriptor-construction failures. Raised while the embedding application
/// builds its schema registry, never while serving a request.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("entity name must be non-empty")]
    EmptyEntityName,

    #[error("field name must be non-empty (entity '{entity}')")]
    EmptyFieldName { entity: String },

    #[error("duplicate field '{field}' (entity '{entity}')")]
    DuplicateField { entity: String, field: String },

    #[error("duplicate relationship '{relationship}' (entity '{entity}')")]
    DuplicateRelationship {
        entity: String,
        relationship: String,
    },

    #[error("relationship '{relationship}' collides with a field of the same name (entity '{entity}')")]
    RelationshipShadowsField {
        entity: String,
        relationship: String,
    },

    #[error("primary key '{field}' not present in entity fields (entity '{entity}')")]
    UnknownPrimaryKey { entity: String, field: String },

    #[error("entity '{entity}' declares no primary key")]
    MissingPrimaryKey { entity: String },

    #[error("duplicate entity '{entity}' in registry")]
    DuplicateEntity { entity: String },
}

///
/// SchemaViolation
///
/// Request-vs-schema mismatches detected during compilation or mask
/// resolution. Fail-fast: compilers surface the first violation found in a
/// single top-to-bottom pass.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaViolation {
    #[error("unknown entity type '{entity}'")]
    UnknownEntity { entity: String },

    #[error("unknown field or relationship '{attribute}' (entity '{entity}')")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("no such relation: '{relationship}' (entity '{entity}')")]
    UnknownRelationship {
        entity: String,
        relationship: String,
    },

    #[error("can't use operator '{op}' on the top level")]
    OperatorAtDocumentLevel { op: String },

    #[error("can't use primitive operator '{op}' on '{attribute}': not a column")]
    NotAColumn { attribute: String, op: String },

    #[error("can't use '{op}' operator on '{attribute}': not a *-to-many relation")]
    NotToMany { attribute: String, op: String },

    #[error("can't get '{field}' subfield from '{attribute}': not a many-to-one relation")]
    NotManyToOne { attribute: String, field: String },

    #[error("'{path}' is not a many-to-one relation")]
    OrderPathNotManyToOne { path: String },

    #[error("'{path}' is not a column")]
    OrderPathNotColumn { path: String },

    #[error("field '{field}' has an unsupported type (entity '{entity}')")]
    UnsupportedField { entity: String, field: String },

    #[error("operator '{op}' on '{attribute}' requires a {expected} operand")]
    OperandShape {
        attribute: String,
        op: String,
        expected: &'static str,
    },

    #[error("derived relationship '{relationship}' does not name a remote attribute")]
    DerivedRemoteMissing { relationship: String },

    #[error("ambiguous primary key (entity '{entity}')")]
    AmbiguousPrimaryKey { entity: String },
}

///
/// MalformedDocument
///
/// Input-container problems: the decoded document is not the shape the
/// compiler expects, before any schema names come into play.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MalformedDocument {
    #[error("criteria document must be an object")]
    CriteriaNotObject,

    #[error("order input must be a string or a list of strings")]
    OrderInputInvalid,

    #[error("order path must be non-empty")]
    OrderPathEmpty,

    #[error("include input must be a list of strings")]
    IncludeInputInvalid,

    #[error("'{what}' must be a non-negative integer")]
    NotNonNegativeInt { what: &'static str },

    #[error("criteria document exceeds maximum nesting depth {limit}")]
    CriteriaTooDeep { limit: usize },

    #[error("include path exceeds maximum depth {limit}")]
    IncludeTooDeep { limit: usize },

    #[error("too many ordering paths (limit {limit})")]
    TooManyOrderPaths { limit: usize },
}

///
/// SerializeError
///
/// Data-access failures surfaced through a `RelationSource` while walking
/// the relation graph. Serialization itself never fails on entity shape.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SerializeError {
    #[error("relationship '{relationship}' has no join keys and no link table")]
    MissingJoinKey { relationship: String },

    #[error("join key for relationship '{relationship}' is not a scalar value")]
    NonScalarJoinKey { relationship: String },

    #[error("relation source failed for '{relationship}': {message}")]
    Source {
        relationship: String,
        message: String,
    },
}
