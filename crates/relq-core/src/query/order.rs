use crate::{
    error::{Error, MalformedDocument, SchemaViolation},
    obs::{self, ObsEvent},
    query::policy::QueryPolicy,
    schema::{RelationDirection, SchemaRegistry},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

///
/// Direction
///
/// Canonical sort direction shared by the ordering compiler and any
/// executor that applies its output.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Join alias identifier, unique within one [`OrderingPlan`].
pub type AliasId = u32;

///
/// OrderTerm
///
/// One compiled ordering column. `alias` is `None` for root-entity columns
/// and names the final join alias for multi-segment paths. `path` keeps the
/// client's dotted spelling (direction prefix stripped) for diagnostics.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderTerm {
    pub path: String,
    pub alias: Option<AliasId>,
    pub field: String,
    pub direction: Direction,
}

///
/// OrderJoin
///
/// One join needed to reach a nested ordering column. `parent` is `None`
/// when joining off the root entity. Aliases are allocated per path in
/// traversal order and never deduplicated across paths: each ordering
/// column gets its own join chain so its join conditions stay independent.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderJoin {
    pub parent: Option<AliasId>,
    pub relationship: String,
    pub alias: AliasId,
}

///
/// OrderingPlan
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderingPlan {
    pub terms: Vec<OrderTerm>,
    pub joins: Vec<OrderJoin>,
}

impl OrderingPlan {
    /// Append the primary key as a final ascending term unless a root-level
    /// term already orders by it. Callers apply this on top of the compiled
    /// plan to make pagination reproducible; the compiler itself never adds
    /// terms the client did not ask for.
    pub fn ensure_deterministic(&mut self, pk_field: &str) {
        let present = self
            .terms
            .iter()
            .any(|term| term.alias.is_none() && term.field == pk_field);
        if !present {
            self.terms.push(OrderTerm {
                path: pk_field.to_string(),
                alias: None,
                field: pk_field.to_string(),
                direction: Direction::Asc,
            });
        }
    }
}

///
/// OrderingCompiler
///
/// Turns a decoded ordering spec (a path or list of paths, each optionally
/// `-`/`+`-prefixed) into an [`OrderingPlan`] validated against the schema:
/// every non-final segment must traverse a many-to-one relationship, the
/// final segment must resolve to a scalar column.
///

pub struct OrderingCompiler<'a> {
    registry: &'a SchemaRegistry,
    policy: QueryPolicy,
}

impl<'a> OrderingCompiler<'a> {
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

    pub fn compile(&self, entity: &str, spec: &Value) -> Result<OrderingPlan, Error> {
        let paths = ordering_paths(spec)?;
        self.policy.check_order_paths(paths.len())?;

        let mut plan = OrderingPlan::default();
        let mut next_alias: AliasId = 0;
        for raw in paths {
            self.compile_path(entity, raw, &mut plan, &mut next_alias)?;
        }

        obs::record(ObsEvent::OrderingCompiled {
            terms: plan.terms.len(),
            joins: plan.joins.len(),
        });

        Ok(plan)
    }

    fn compile_path(
        &self,
        entity: &str,
        raw: &str,
        plan: &mut OrderingPlan,
        next_alias: &mut AliasId,
    ) -> Result<(), Error> {
        let (path, direction) = split_direction(raw)?;
        let segments: Vec<&str> = path.split('.').collect();

        let mut desc = self.registry.entity(entity)?;
        let mut parent: Option<AliasId> = None;
        for (index, segment) in segments[..segments.len() - 1].iter().enumerate() {
            let relation = desc.relationship(segment).ok_or_else(|| {
                SchemaViolation::OrderPathNotManyToOne {
                    path: segments[..=index].join("."),
                }
            })?;
            if relation.direction != RelationDirection::ManyToOne {
                return Err(SchemaViolation::OrderPathNotManyToOne {
                    path: segments[..=index].join("."),
                }
                .into());
            }

            let alias = *next_alias;
            *next_alias += 1;
            plan.joins.push(OrderJoin {
                parent,
                relationship: (*segment).to_string(),
                alias,
            });

            parent = Some(alias);
            desc = self.registry.target_of(relation)?;
        }

        let last = segments[segments.len() - 1];
        let column = desc
            .field(last)
            .filter(|field| field.kind.is_scalar())
            .ok_or_else(|| SchemaViolation::OrderPathNotColumn {
                path: path.to_string(),
            })?;

        plan.terms.push(OrderTerm {
            path: path.to_string(),
            alias: parent,
            field: column.name.clone(),
            direction,
        });

        Ok(())
    }
}

// Accept a single path or a list of paths.
fn ordering_paths(spec: &Value) -> Result<Vec<&str>, Error> {
    match spec {
        Value::String(path) => Ok(vec![path.as_str()]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(path) => Ok(path.as_str()),
                _ => Err(MalformedDocument::OrderInputInvalid.into()),
            })
            .collect(),
        _ => Err(MalformedDocument::OrderInputInvalid.into()),
    }
}

fn split_direction(raw: &str) -> Result<(&str, Direction), Error> {
    let (path, direction) = match raw.strip_prefix('-') {
        Some(rest) => (rest, Direction::Desc),
        None => (raw.strip_prefix('+').unwrap_or(raw), Direction::Asc),
    };
    if path.is_empty() {
        return Err(MalformedDocument::OrderPathEmpty.into());
    }

    Ok((path, direction))
}

///
/// TESTS
///
