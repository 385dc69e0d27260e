use crate::{
    error::Error,
    query::{
        include::{IncludePlan, IncludeResolver},
        order::{OrderingCompiler, OrderingPlan},
        page::PageSpec,
        policy::QueryPolicy,
        predicate::{ast::Expr, compile::FilterCompiler},
    },
    schema::SchemaRegistry,
};
use serde_json::Value;

///
/// ListQuery
///
/// The decoded argument set of one list request, as extracted by the
/// embedding's request layer. Every part is optional; missing parts compile
/// to their neutral form.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ListQuery<'a> {
    pub filter: Option<&'a Value>,
    pub order: Option<&'a Value>,
    pub include: Option<&'a Value>,
    pub limit: Option<&'a Value>,
    pub offset: Option<&'a Value>,
}

///
/// CompiledQuery
///
/// Output of compiling a [`ListQuery`]: everything an executor and the
/// serializer need, produced in one validated pass.
///

#[derive(Debug)]
pub struct CompiledQuery {
    pub filter: Expr,
    pub ordering: OrderingPlan,
    pub include: IncludePlan,
    pub page: PageSpec,
}

///
/// QueryCompiler
///
/// Convenience front door bundling the four compilers behind one registry
/// and policy. The individual compilers stay public for embeddings that
/// only need one of them.
///

pub struct QueryCompiler<'a> {
    registry: &'a SchemaRegistry,
    policy: QueryPolicy,
}

impl<'a> QueryCompiler<'a> {
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

    pub fn compile(&self, entity: &str, query: &ListQuery<'_>) -> Result<CompiledQuery, Error> {
        let filter = match query.filter {
            Some(criteria) => FilterCompiler::new(self.registry)
                .with_policy(self.policy)
                .compile(entity, criteria)?,
            None => Expr::True,
        };

        let ordering = match query.order {
            Some(spec) => OrderingCompiler::new(self.registry)
                .with_policy(self.policy)
                .compile(entity, spec)?,
            None => OrderingPlan::default(),
        };

        let include = match query.include {
            Some(input) => IncludeResolver::new(self.registry)
                .with_policy(self.policy)
                .resolve(entity, input)?,
            None => IncludePlan {
                mask: crate::query::include::IncludeMask::default(),
                paths: Vec::new(),
                chains: Vec::new(),
            },
        };

        let page = PageSpec::from_values(query.limit, query.offset)?;

        Ok(CompiledQuery {
            filter,
            ordering,
            include,
            page,
        })
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::SchemaViolation, test_support::fixtures::shop_registry};
    use serde_json::json;

    #[test]
    fn empty_query_compiles_to_neutral_parts() {
        let registry = shop_registry();
        let compiled = QueryCompiler::new(&registry)
            .compile("order", &ListQuery::default())
            .expect("empty query should compile");

        assert_eq!(compiled.filter, Expr::True);
        assert!(compiled.ordering.terms.is_empty());
        assert!(compiled.include.paths.is_empty());
        assert_eq!(compiled.page, PageSpec::default());
    }

    #[test]
    fn full_query_compiles_every_part() {
        let registry = shop_registry();
        let filter = json!({"status": "open"});
        let order = json!(["-total"]);
        let include = json!(["customer"]);
        let limit = json!(10);

        let compiled = QueryCompiler::new(&registry)
            .compile(
                "order",
                &ListQuery {
                    filter: Some(&filter),
                    order: Some(&order),
                    include: Some(&include),
                    limit: Some(&limit),
                    offset: None,
                },
            )
            .expect("full query should compile");

        assert_eq!(compiled.filter, Expr::eq("status", json!("open")));
        assert_eq!(compiled.ordering.terms.len(), 1);
        assert_eq!(compiled.include.paths, ["customer"]);
        assert_eq!(compiled.page.limit, Some(10));
    }

    #[test]
    fn first_violation_fails_the_whole_request() {
        let registry = shop_registry();
        let filter = json!({"shade": 1});

        let err = QueryCompiler::new(&registry)
            .compile(
                "order",
                &ListQuery {
                    filter: Some(&filter),
                    ..ListQuery::default()
                },
            )
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Violation(SchemaViolation::UnknownAttribute { .. })
        ));
    }
}
