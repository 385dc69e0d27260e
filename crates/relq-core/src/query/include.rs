use crate::{
    error::{Error, MalformedDocument, SchemaViolation},
    obs::{self, ObsEvent},
    query::policy::QueryPolicy,
    schema::SchemaRegistry,
};
use derive_more::Deref;
use serde_json::Value;
use std::collections::BTreeMap;

///
/// IncludeMask
///
/// Nested inclusion tree: relationship name to child mask, an empty mask
/// meaning "include with no further nesting". Masks are trees by
/// construction, never graphs, so recursion over them always terminates
/// even when the underlying relation graph has cycles.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct IncludeMask(BTreeMap<String, IncludeMask>);

impl IncludeMask {
    /// Group a flat list of dotted paths into a nested mask:
    /// `["a", "b.c", "b.d"]` becomes `{a: {}, b: {c: {}, d: {}}}`.
    #[must_use]
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = Self::default();
        for path in paths {
            mask.insert_path(path.as_ref());
        }

        mask
    }

    pub fn insert_path(&mut self, path: &str) {
        match path.split_once('.') {
            None => {
                self.0.entry(path.to_string()).or_default();
            }
            Some((head, rest)) => {
                self.0.entry(head.to_string()).or_default().insert_path(rest);
            }
        }
    }
}

///
/// IncludePlan
///
/// Schema-validated inclusion request: the nested mask plus the validated
/// relation chains (the abstract eager-load options an executor applies).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IncludePlan {
    pub mask: IncludeMask,
    pub paths: Vec<String>,
    pub chains: Vec<Vec<String>>,
}

///
/// IncludeResolver
///

pub struct IncludeResolver<'a> {
    registry: &'a SchemaRegistry,
    policy: QueryPolicy,
}

impl<'a> IncludeResolver<'a> {
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            policy: QueryPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate a decoded inclusion list against the schema. Every segment
    /// must name a relationship at the depth it appears; the first offender
    /// fails the whole request.
    pub fn resolve(&self, entity: &str, input: &Value) -> Result<IncludePlan, Error> {
        let paths = include_paths(input)?;

        let mut chains = Vec::with_capacity(paths.len());
        for path in &paths {
            chains.push(self.resolve_chain(entity, path)?);
        }

        obs::record(ObsEvent::IncludeResolved { paths: paths.len() });

        Ok(IncludePlan {
            mask: IncludeMask::from_paths(&paths),
            paths,
            chains,
        })
    }

    fn resolve_chain(&self, entity: &str, path: &str) -> Result<Vec<String>, Error> {
        let segments: Vec<&str> = path.split('.').collect();
        self.policy.check_include_depth(segments.len())?;

        let mut desc = self.registry.entity(entity)?;
        let mut chain = Vec::with_capacity(segments.len());
        for segment in segments {
            let relation = desc.relationship(segment).ok_or_else(|| {
                SchemaViolation::UnknownRelationship {
                    entity: desc.entity_name().to_string(),
                    relationship: segment.to_string(),
                }
            })?;
            chain.push(segment.to_string());
            desc = self.registry.target_of(relation)?;
        }

        Ok(chain)
    }
}

fn include_paths(input: &Value) -> Result<Vec<String>, Error> {
    let Value::Array(items) = input else {
        return Err(MalformedDocument::IncludeInputInvalid.into());
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(path) => Ok(path.clone()),
            _ => Err(MalformedDocument::IncludeInputInvalid.into()),
        })
        .collect()
}

///
/// TESTS
///
