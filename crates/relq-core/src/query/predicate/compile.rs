use crate::{
    error::{Error, MalformedDocument, SchemaViolation},
    obs::{self, ObsEvent},
    query::{
        policy::QueryPolicy,
        predicate::ast::{CompareOp, Expr},
    },
    schema::{EntityDescriptor, FieldDescriptor, RelationshipDescriptor, SchemaRegistry},
};
use serde_json::{Map, Value};

///
/// Operator tokens
///
/// The operator vocabulary is a closed set split into three disjoint
/// classes; any other key is an attribute name or dotted relation path.
/// Dispatch is by exact token match, never by prefix.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PrimitiveOp {
    Compare(CompareOp),
    In,
    NotIn,
    Like,
}

impl PrimitiveOp {
    const fn token(self) -> &'static str {
        match self {
            Self::Compare(op) => op.token(),
            Self::In => "$in",
            Self::NotIn => "$nin",
            Self::Like => "$like",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RelationOp {
    Any,
    All,
    Length,
}

impl RelationOp {
    const fn token(self) -> &'static str {
        match self {
            Self::Any => "$any",
            Self::All => "$all",
            Self::Length => "$length",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LogicalOp {
    Or,
    And,
    Not,
}

impl LogicalOp {
    const fn token(self) -> &'static str {
        match self {
            Self::Or => "$or",
            Self::And => "$and",
            Self::Not => "$not",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OperatorToken {
    Primitive(PrimitiveOp),
    Relation(RelationOp),
    Logical(LogicalOp),
}

impl OperatorToken {
    fn parse(key: &str) -> Option<Self> {
        let token = match key {
            "$eq" => Self::Primitive(PrimitiveOp::Compare(CompareOp::Eq)),
            "$ne" => Self::Primitive(PrimitiveOp::Compare(CompareOp::Ne)),
            "$lt" => Self::Primitive(PrimitiveOp::Compare(CompareOp::Lt)),
            "$lte" => Self::Primitive(PrimitiveOp::Compare(CompareOp::Lte)),
            "$gt" => Self::Primitive(PrimitiveOp::Compare(CompareOp::Gt)),
            "$gte" => Self::Primitive(PrimitiveOp::Compare(CompareOp::Gte)),
            "$in" => Self::Primitive(PrimitiveOp::In),
            "$nin" => Self::Primitive(PrimitiveOp::NotIn),
            "$like" => Self::Primitive(PrimitiveOp::Like),
            "$any" => Self::Relation(RelationOp::Any),
            "$all" => Self::Relation(RelationOp::All),
            "$length" => Self::Relation(RelationOp::Length),
            "$or" => Self::Logical(LogicalOp::Or),
            "$and" => Self::Logical(LogicalOp::And),
            "$not" => Self::Logical(LogicalOp::Not),
            _ => return None,
        };

        Some(token)
    }

    const fn token(self) -> &'static str {
        match self {
            Self::Primitive(op) => op.token(),
            Self::Relation(op) => op.token(),
            Self::Logical(op) => op.token(),
        }
    }
}

///
/// FilterCompiler
///
/// Turns a decoded criteria document into an [`Expr`] tree, validated
/// field-by-field against the schema. Fails fast on the first violation in
/// a single top-to-bottom pass; bundling independent errors is the request
/// layer's job.
///

pub struct FilterCompiler<'a> {
    registry: &'a SchemaRegistry,
    policy: QueryPolicy,
}

impl<'a> FilterCompiler<'a> {
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

    pub fn compile(&self, entity: &str, criteria: &Value) -> Result<Expr, Error> {
        let desc = self.registry.entity(entity)?;
        let Value::Object(doc) = criteria else {
            return Err(MalformedDocument::CriteriaNotObject.into());
        };

        let expr = self.compile_document(desc, doc, 0)?;
        obs::record(ObsEvent::FilterCompiled {
            nodes: expr.node_count(),
        });

        Ok(expr)
    }

    /// Document scope: root, and the clauses of `$and`/`$or`/`$not`.
    /// Every key must be a logical operator or resolve to an attribute.
    fn compile_document(
        &self,
        desc: &EntityDescriptor,
        doc: &Map<String, Value>,
        depth: usize,
    ) -> Result<Expr, Error> {
        self.policy.check_criteria_depth(depth)?;

        let mut exprs = Vec::with_capacity(doc.len());
        for (key, operand) in doc {
            let expr = match OperatorToken::parse(key) {
                Some(OperatorToken::Logical(op)) => {
                    self.compile_logical(op, operand, desc.entity_name(), &|map| {
                        self.compile_document(desc, map, depth + 1)
                    })?
                }
                Some(token) => {
                    return Err(SchemaViolation::OperatorAtDocumentLevel {
                        op: token.token().to_string(),
                    }
                    .into());
                }
                None => {
                    let (head, tail) = split_path(key);
                    let criteria = fold_chain(&tail, operand);
                    self.compile_attribute(desc, head, &criteria, depth + 1)?
                }
            };
            exprs.push(expr);
        }

        Ok(Expr::conjoin(exprs))
    }

    /// Attribute scope: the criteria map under one resolved attribute key.
    fn compile_attribute(
        &self,
        desc: &EntityDescriptor,
        attribute: &str,
        criteria: &Map<String, Value>,
        depth: usize,
    ) -> Result<Expr, Error> {
        self.policy.check_criteria_depth(depth)?;

        let field = desc.field(attribute);
        let relationship = desc.relationship(attribute);
        if field.is_none() && relationship.is_none() {
            return Err(SchemaViolation::UnknownAttribute {
                entity: desc.entity_name().to_string(),
                attribute: attribute.to_string(),
            }
            .into());
        }

        let mut exprs = Vec::with_capacity(criteria.len());
        for (key, operand) in criteria {
            let expr = match OperatorToken::parse(key) {
                Some(OperatorToken::Primitive(op)) => {
                    compile_primitive(desc, attribute, field, op, operand)?
                }
                Some(OperatorToken::Relation(op)) => {
                    self.compile_relation(attribute, relationship, op, operand, depth)?
                }
                Some(OperatorToken::Logical(op)) => {
                    self.compile_logical(op, operand, attribute, &|map| {
                        self.compile_attribute(desc, attribute, map, depth + 1)
                    })?
                }
                None => self.compile_subfield(attribute, relationship, key, operand, depth)?,
            };
            exprs.push(expr);
        }

        Ok(Expr::conjoin(exprs))
    }

    fn compile_logical(
        &self,
        op: LogicalOp,
        operand: &Value,
        scope: &str,
        compile: &dyn Fn(&Map<String, Value>) -> Result<Expr, Error>,
    ) -> Result<Expr, Error> {
        match op {
            LogicalOp::And | LogicalOp::Or => {
                let Value::Array(clauses) = operand else {
                    return Err(operand_shape(scope, op.token(), "list"));
                };

                let mut exprs = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    let Value::Object(map) = clause else {
                        return Err(operand_shape(scope, op.token(), "object"));
                    };
                    exprs.push(compile(map)?);
                }

                Ok(match op {
                    LogicalOp::And => Expr::conjoin(exprs),
                    _ => Expr::disjoin(exprs),
                })
            }
            LogicalOp::Not => {
                let Value::Object(map) = operand else {
                    return Err(operand_shape(scope, op.token(), "object"));
                };

                Ok(Expr::not(compile(map)?))
            }
        }
    }

    fn compile_relation(
        &self,
        attribute: &str,
        relationship: Option<&RelationshipDescriptor>,
        op: RelationOp,
        operand: &Value,
        depth: usize,
    ) -> Result<Expr, Error> {
        let relation = relationship.filter(|rel| rel.is_to_many()).ok_or_else(|| {
            SchemaViolation::NotToMany {
                attribute: attribute.to_string(),
                op: op.token().to_string(),
            }
        })?;

        match op {
            RelationOp::Any => {
                let inner =
                    self.compile_relation_criteria(attribute, relation, op, operand, depth)?;
                Ok(Expr::relation_any(attribute, inner))
            }
            RelationOp::All => {
                let inner =
                    self.compile_relation_criteria(attribute, relation, op, operand, depth)?;
                Ok(Expr::relation_all(attribute, inner))
            }
            RelationOp::Length => self.compile_length(attribute, operand, depth),
        }
    }

    /// Sub-criteria of `$any`/`$all`: a document over the target entity, or
    /// for derived relationships an attribute criteria over the remote
    /// accessor on the target.
    fn compile_relation_criteria(
        &self,
        attribute: &str,
        relation: &RelationshipDescriptor,
        op: RelationOp,
        operand: &Value,
        depth: usize,
    ) -> Result<Expr, Error> {
        let Value::Object(criteria) = operand else {
            return Err(operand_shape(attribute, op.token(), "object"));
        };

        let target = self.registry.target_of(relation)?;
        if relation.derived {
            let remote = relation.remote_key.as_deref().ok_or_else(|| {
                SchemaViolation::DerivedRemoteMissing {
                    relationship: attribute.to_string(),
                }
            })?;
            self.compile_attribute(target, remote, criteria, depth + 1)
        } else {
            self.compile_document(target, criteria, depth + 1)
        }
    }

    /// `$length`: a non-object operand coerces to `{$eq: operand}`; the
    /// criteria then compiles as scalar comparisons over the related-row
    /// count, with logical operators allowed for composition.
    fn compile_length(
        &self,
        attribute: &str,
        operand: &Value,
        depth: usize,
    ) -> Result<Expr, Error> {
        self.policy.check_criteria_depth(depth)?;

        let criteria = implicit_eq(operand);
        let inner = self.compile_count_criteria(attribute, &criteria, depth)?;

        Ok(Expr::LengthCompare {
            relationship: attribute.to_string(),
            expr: Box::new(inner),
        })
    }

    fn compile_count_criteria(
        &self,
        attribute: &str,
        criteria: &Map<String, Value>,
        depth: usize,
    ) -> Result<Expr, Error> {
        // Errors name the synthetic count attribute, not the relationship.
        let count_key = format!("{attribute}$length");

        let mut exprs = Vec::with_capacity(criteria.len());
        for (key, operand) in criteria {
            let expr = match OperatorToken::parse(key) {
                Some(OperatorToken::Primitive(PrimitiveOp::Compare(op))) => {
                    ensure_scalar_operand(&count_key, op.token(), operand)?;
                    Expr::compare(attribute, op, operand.clone())
                }
                Some(OperatorToken::Primitive(op @ (PrimitiveOp::In | PrimitiveOp::NotIn))) => {
                    let Value::Array(items) = operand else {
                        return Err(operand_shape(&count_key, op.token(), "list"));
                    };
                    Expr::membership(attribute, items.clone(), matches!(op, PrimitiveOp::NotIn))
                }
                Some(OperatorToken::Primitive(PrimitiveOp::Like)) => {
                    return Err(SchemaViolation::NotAColumn {
                        attribute: count_key,
                        op: PrimitiveOp::Like.token().to_string(),
                    }
                    .into());
                }
                Some(OperatorToken::Relation(op)) => {
                    return Err(SchemaViolation::NotToMany {
                        attribute: count_key,
                        op: op.token().to_string(),
                    }
                    .into());
                }
                Some(OperatorToken::Logical(op)) => {
                    self.compile_logical(op, operand, &count_key, &|map| {
                        self.compile_count_criteria(attribute, map, depth + 1)
                    })?
                }
                None => {
                    return Err(SchemaViolation::NotManyToOne {
                        attribute: count_key,
                        field: key.clone(),
                    }
                    .into());
                }
            };
            exprs.push(expr);
        }

        Ok(Expr::conjoin(exprs))
    }

    /// Dotted subfield under a many-to-one (or one-to-one) relationship:
    /// the chain right-folds into nested single-key criteria and compiles
    /// as a correlated existence check on the target entity.
    fn compile_subfield(
        &self,
        attribute: &str,
        relationship: Option<&RelationshipDescriptor>,
        key: &str,
        operand: &Value,
        depth: usize,
    ) -> Result<Expr, Error> {
        let (head, tail) = split_path(key);

        let relation = relationship
            .filter(|rel| !rel.derived && rel.is_subfield_traversable())
            .ok_or_else(|| SchemaViolation::NotManyToOne {
                attribute: attribute.to_string(),
                field: head.to_string(),
            })?;

        let target = self.registry.target_of(relation)?;
        let criteria = fold_chain(&tail, operand);
        let inner = self.compile_attribute(target, head, &criteria, depth + 1)?;

        Ok(Expr::subfield(attribute, inner))
    }
}

fn compile_primitive(
    desc: &EntityDescriptor,
    attribute: &str,
    field: Option<&FieldDescriptor>,
    op: PrimitiveOp,
    operand: &Value,
) -> Result<Expr, Error> {
    let field = field.ok_or_else(|| SchemaViolation::NotAColumn {
        attribute: attribute.to_string(),
        op: op.token().to_string(),
    })?;

    if !field.kind.is_scalar() {
        return Err(SchemaViolation::UnsupportedField {
            entity: desc.entity_name().to_string(),
            field: field.name.clone(),
        }
        .into());
    }

    match op {
        PrimitiveOp::Compare(op) => {
            ensure_scalar_operand(attribute, op.token(), operand)?;
            Ok(Expr::compare(&field.name, op, operand.clone()))
        }
        PrimitiveOp::In | PrimitiveOp::NotIn => {
            let Value::Array(items) = operand else {
                return Err(operand_shape(attribute, op.token(), "list"));
            };
            Ok(Expr::membership(
                &field.name,
                items.clone(),
                matches!(op, PrimitiveOp::NotIn),
            ))
        }
        PrimitiveOp::Like => {
            let Value::String(pattern) = operand else {
                return Err(operand_shape(attribute, op.token(), "string"));
            };
            Ok(Expr::pattern(&field.name, pattern))
        }
    }
}

fn ensure_scalar_operand(attribute: &str, op: &str, operand: &Value) -> Result<(), Error> {
    if matches!(operand, Value::Array(_) | Value::Object(_)) {
        return Err(operand_shape(attribute, op, "scalar"));
    }

    Ok(())
}

fn operand_shape(attribute: &str, op: &str, expected: &'static str) -> Error {
    SchemaViolation::OperandShape {
        attribute: attribute.to_string(),
        op: op.to_string(),
        expected,
    }
    .into()
}

// Split a dotted path into its head segment and remaining segments.
fn split_path(key: &str) -> (&str, Vec<&str>) {
    let mut segments = key.split('.');
    let head = segments.next().unwrap_or(key);

    (head, segments.collect())
}

/// Coerce a non-object operand to `{$eq: operand}`.
fn implicit_eq(operand: &Value) -> Map<String, Value> {
    match operand {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("$eq".to_string(), other.clone());
            map
        }
    }
}

/// Right-fold the tail of a dotted chain into nested single-key criteria:
/// `fold(["b", "c"], V)` yields `{b: {c: {$eq: V}}}`.
fn fold_chain(tail: &[&str], operand: &Value) -> Map<String, Value> {
    let mut criteria = implicit_eq(operand);
    for segment in tail.iter().rev() {
        let mut outer = Map::new();
        outer.insert((*segment).to_string(), Value::Object(criteria));
        criteria = outer;
    }

    criteria
}

///
/// TESTS
///
