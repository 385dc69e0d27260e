use serde_json::Value;
use std::ops::{BitAnd, BitOr};

///
/// Expression tree
///
/// Pure representation of a compiled criteria document. This layer carries
/// no schema knowledge; every node was validated against the schema by the
/// compiler that built it. Interpretation (lowering to SQL, in-memory
/// evaluation, index planning) is an embedding concern.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    /// Document token for this operator.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
        }
    }
}

///
/// CompareExpr
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompareExpr {
    pub field: String,
    pub op: CompareOp,
    pub operand: Value,
}

impl CompareExpr {
    #[must_use]
    pub fn new(field: impl Into<String>, op: CompareOp, operand: Value) -> Self {
        Self {
            field: field.into(),
            op,
            operand,
        }
    }
}

///
/// Expr
///
/// - `Compare`/`Membership`/`Pattern` always name a scalar column.
/// - `RelationAny` and `LengthCompare` always name a to-many relationship.
/// - `Subfield` is a correlated existence check through a many-to-one (or
///   one-to-one) relationship; its inner expression is scoped to the target
///   entity.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    True,
    False,
    Compare(CompareExpr),
    Membership {
        field: String,
        items: Vec<Value>,
        negated: bool,
    },
    /// Case-insensitive pattern match (`%`/`_` wildcards).
    Pattern {
        field: String,
        pattern: String,
    },
    RelationAny {
        relationship: String,
        expr: Box<Self>,
    },
    /// Comparison over the related-row count; the inner expression holds
    /// `Compare`/`Membership` nodes whose `field` is the relationship name.
    LengthCompare {
        relationship: String,
        expr: Box<Self>,
    },
    /// True iff a related row exists through the local join matching the
    /// inner expression.
    Subfield {
        relationship: String,
        expr: Box<Self>,
    },
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl Expr {
    #[must_use]
    pub const fn and(exprs: Vec<Self>) -> Self {
        Self::And(exprs)
    }

    #[must_use]
    pub const fn or(exprs: Vec<Self>) -> Self {
        Self::Or(exprs)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(expr: Self) -> Self {
        Self::Not(Box::new(expr))
    }

    #[must_use]
    pub fn compare(field: impl Into<String>, op: CompareOp, operand: Value) -> Self {
        Self::Compare(CompareExpr::new(field, op, operand))
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, operand: Value) -> Self {
        Self::compare(field, CompareOp::Eq, operand)
    }

    #[must_use]
    pub fn membership(field: impl Into<String>, items: Vec<Value>, negated: bool) -> Self {
        Self::Membership {
            field: field.into(),
            items,
            negated,
        }
    }

    #[must_use]
    pub fn pattern(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Pattern {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    #[must_use]
    pub fn relation_any(relationship: impl Into<String>, expr: Self) -> Self {
        Self::RelationAny {
            relationship: relationship.into(),
            expr: Box::new(expr),
        }
    }

    /// `$all` is not a primitive: it is defined as the double negation of
    /// `$any` over the negated inner expression, so an empty sub-criteria is
    /// vacuously true for every parent row.
    #[must_use]
    pub fn relation_all(relationship: impl Into<String>, expr: Self) -> Self {
        Self::not(Self::relation_any(relationship, Self::not(expr)))
    }

    #[must_use]
    pub fn subfield(relationship: impl Into<String>, expr: Self) -> Self {
        Self::Subfield {
            relationship: relationship.into(),
            expr: Box::new(expr),
        }
    }

    /// Implicit conjunction of sibling expressions, unwrapping singletons so
    /// `{a: X, b: Y}` and `{$and: [{a: X}, {b: Y}]}` compile identically.
    #[must_use]
    pub fn conjoin(mut exprs: Vec<Self>) -> Self {
        match exprs.len() {
            0 => Self::True,
            1 => exprs.remove(0),
            _ => Self::And(exprs),
        }
    }

    /// Disjunction of sibling expressions with singleton unwrapping; an
    /// empty `$or` is an empty disjunction, which no row satisfies.
    #[must_use]
    pub fn disjoin(mut exprs: Vec<Self>) -> Self {
        match exprs.len() {
            0 => Self::False,
            1 => exprs.remove(0),
            _ => Self::Or(exprs),
        }
    }

    /// Total node count, used for observability accounting.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::True
            | Self::False
            | Self::Compare(_)
            | Self::Membership { .. }
            | Self::Pattern { .. } => 1,
            Self::RelationAny { expr, .. }
            | Self::LengthCompare { expr, .. }
            | Self::Subfield { expr, .. }
            | Self::Not(expr) => 1 + expr.node_count(),
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Self::node_count).sum::<usize>()
            }
        }
    }
}

impl BitAnd for Expr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Expr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

///
/// TESTS
///
