//! Reference in-memory evaluator for compiled expression trees.
//!
//! Execution against a real store is out of scope for the crate; this
//! evaluator exists so tests can check algebraic properties of compiled
//! predicates (double negation, vacuous `$all`, implicit conjunction)
//! against actual row sets instead of tree shapes alone.

use crate::{
    error::{Error, SchemaViolation},
    query::predicate::ast::{CompareOp, Expr},
    schema::{EntityDescriptor, SchemaRegistry},
    source::{Entity, RelationSource},
};
use serde_json::Value;
use std::cmp::Ordering;

pub(crate) fn eval(
    registry: &SchemaRegistry,
    source: &dyn RelationSource,
    desc: &EntityDescriptor,
    entity: &Entity,
    expr: &Expr,
) -> Result<bool, Error> {
    match expr {
        Expr::True => Ok(true),
        Expr::False => Ok(false),
        Expr::And(children) => {
            for child in children {
                if !eval(registry, source, desc, entity, child)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Expr::Or(children) => {
            for child in children {
                if eval(registry, source, desc, entity, child)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::Not(inner) => Ok(!eval(registry, source, desc, entity, inner)?),
        Expr::Compare(cmp) => Ok(compare(entity.get(&cmp.field), cmp.op, &cmp.operand)),
        Expr::Membership {
            field,
            items,
            negated,
        } => {
            let contained = entity.get(field).is_some_and(|value| items.contains(value));
            Ok(contained != *negated)
        }
        Expr::Pattern { field, pattern } => Ok(entity
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|text| like_match(text, pattern))),
        Expr::RelationAny { relationship, expr } => {
            let (target, rows) = related(registry, source, desc, entity, relationship)?;
            for row in &rows {
                if eval(registry, source, target, row, expr)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::LengthCompare { relationship, expr } => {
            let (_, rows) = related(registry, source, desc, entity, relationship)?;
            let mut synthetic = Entity::default();
            synthetic.insert(relationship.clone(), Value::from(rows.len() as u64));
            eval(registry, source, desc, &synthetic, expr)
        }
        Expr::Subfield { relationship, expr } => {
            let (target, rows) = related(registry, source, desc, entity, relationship)?;
            for row in &rows {
                if eval(registry, source, target, row, expr)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn related<'a>(
    registry: &'a SchemaRegistry,
    source: &dyn RelationSource,
    desc: &EntityDescriptor,
    entity: &Entity,
    relationship: &str,
) -> Result<(&'a EntityDescriptor, Vec<Entity>), Error> {
    let relation =
        desc.relationship(relationship)
            .ok_or_else(|| SchemaViolation::UnknownRelationship {
                entity: desc.entity_name().to_string(),
                relationship: relationship.to_string(),
            })?;
    let target = registry.target_of(relation)?;
    let rows = source.related(registry, desc, entity, relationship, relation)?;

    Ok((target, rows))
}

fn compare(value: Option<&Value>, op: CompareOp, operand: &Value) -> bool {
    match op {
        CompareOp::Eq => value == Some(operand),
        CompareOp::Ne => value != Some(operand),
        CompareOp::Lt | CompareOp::Lte | CompareOp::Gt | CompareOp::Gte => {
            let Some(order) = value.and_then(|value| value_cmp(value, operand)) else {
                return false;
            };
            match op {
                CompareOp::Lt => order == Ordering::Less,
                CompareOp::Lte => order != Ordering::Greater,
                CompareOp::Gt => order == Ordering::Greater,
                CompareOp::Gte => order != Ordering::Less,
                CompareOp::Eq | CompareOp::Ne => false,
            }
        }
    }
}

fn value_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (left.as_str(), right.as_str()) {
        return Some(a.cmp(b));
    }

    None
}

// Case-insensitive LIKE: `%` matches any run, `_` any single character.
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    like_step(&text, &pattern)
}

fn like_step(text: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('%') => (0..=text.len()).any(|skip| like_step(&text[skip..], &pattern[1..])),
        Some('_') => !text.is_empty() && like_step(&text[1..], &pattern[1..]),
        Some(ch) => text.first() == Some(ch) && like_step(&text[1..], &pattern[1..]),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::predicate::compile::FilterCompiler,
        source::MemorySource,
        test_support::fixtures::{entity, shop_registry, shop_source},
    };
    use proptest::prelude::*;
    use serde_json::json;

    fn eval_on_orders(criteria: Value) -> Vec<i64> {
        let registry = shop_registry();
        let source = shop_source();
        let desc = registry.entity("order").expect("order descriptor");
        let expr = FilterCompiler::new(&registry)
            .compile("order", &criteria)
            .expect("criteria should compile");

        source
            .table("order")
            .iter()
            .filter(|row| eval(&registry, &source, desc, row, &expr).expect("eval should succeed"))
            .filter_map(|row| row.get("id").and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn implicit_eq_selects_matching_rows() {
        assert_eq!(eval_on_orders(json!({"status": "open"})), vec![1, 3]);
    }

    #[test]
    fn like_is_case_insensitive_with_wildcards() {
        assert_eq!(
            eval_on_orders(json!({"reference": {"$like": "inv-_"}})),
            vec![1, 2, 3]
        );
        assert_eq!(
            eval_on_orders(json!({"reference": {"$like": "%-2"}})),
            vec![2]
        );
    }

    #[test]
    fn any_selects_parents_with_a_matching_child() {
        assert_eq!(
            eval_on_orders(json!({"items": {"$any": {"quantity": {"$gt": 3}}}})),
            vec![1]
        );
    }

    #[test]
    fn all_is_vacuously_true_without_related_rows() {
        // Order 3 has no items at all; `$all` still admits it.
        assert_eq!(
            eval_on_orders(json!({"items": {"$all": {"quantity": {"$gt": 0}}}})),
            vec![1, 2, 3]
        );
        assert_eq!(eval_on_orders(json!({"items": {"$all": {}}})), vec![1, 2, 3]);
        // A failing child eliminates only its own parent.
        assert_eq!(
            eval_on_orders(json!({"items": {"$all": {"quantity": {"$gt": 1}}}})),
            vec![1, 3]
        );
    }

    #[test]
    fn length_compares_related_row_counts() {
        assert_eq!(eval_on_orders(json!({"items": {"$length": 2}})), vec![1]);
        assert_eq!(
            eval_on_orders(json!({"items": {"$length": {"$lt": 2}}})),
            vec![2, 3]
        );
    }

    #[test]
    fn subfield_is_a_correlated_existence_check() {
        assert_eq!(
            eval_on_orders(json!({"customer": {"name": {"$eq": "Ann"}}})),
            vec![1, 2]
        );
        assert_eq!(
            eval_on_orders(json!({"customer.region.code": "EU"})),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn derived_any_matches_remote_attribute_values() {
        assert_eq!(
            eval_on_orders(json!({"tags": {"$any": {"$eq": "priority"}}})),
            vec![1, 3]
        );
    }

    #[test]
    fn double_negation_is_logically_equivalent() {
        let plain = eval_on_orders(json!({"status": "open"}));
        let doubled = eval_on_orders(json!({"$not": {"$not": {"status": "open"}}}));
        assert_eq!(plain, doubled);
    }

    proptest! {
        #[test]
        fn double_negation_law_holds_for_comparisons(
            total in -1_000.0..1_000.0f64,
            bound in -1_000.0..1_000.0f64,
        ) {
            let registry = shop_registry();
            let source = MemorySource::new();
            let desc = registry.entity("order").expect("order descriptor");
            let row = entity(json!({"id": 1, "total": total}));

            let predicate = Expr::compare("total", CompareOp::Gt, json!(bound));
            let doubled = Expr::not(Expr::not(predicate.clone()));

            let direct = eval(&registry, &source, desc, &row, &predicate)
                .expect("eval should succeed");
            let negated = eval(&registry, &source, desc, &row, &doubled)
                .expect("eval should succeed");
            prop_assert_eq!(direct, negated);
        }

        #[test]
        fn membership_negation_partitions_rows(value in 0i64..10) {
            let registry = shop_registry();
            let source = MemorySource::new();
            let desc = registry.entity("order").expect("order descriptor");
            let row = entity(json!({"id": value}));
            let items = vec![json!(2), json!(5), json!(7)];

            let within = Expr::membership("id", items.clone(), false);
            let without = Expr::membership("id", items, true);

            let a = eval(&registry, &source, desc, &row, &within).expect("eval should succeed");
            let b = eval(&registry, &source, desc, &row, &without).expect("eval should succeed");
            prop_assert_ne!(a, b);
        }
    }
}
