use serde::{Deserialize, Serialize};

///
/// RelationDirection
///
/// Base cardinality of a relationship as declared by the model layer.
/// One-to-one is not a direction of its own: it is a one-to-many or
/// many-to-one accessed single-valued (`single_valued` on the descriptor).
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RelationDirection {
    OneToMany,
    ManyToOne,
    ManyToMany,
}

///
/// RelationshipDescriptor
///
/// One named relationship on an entity type: target type, cardinality, and
/// the join column pair. Derived relationships are reached through an
/// intermediate association rather than a direct foreign key; their join
/// accessor is the relationship name itself and `remote_key` names the
/// scalar attribute exposed on the target.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RelationshipDescriptor {
    pub target: String,
    pub direction: RelationDirection,
    pub single_valued: bool,
    pub local_key: Option<String>,
    pub remote_key: Option<String>,
    pub derived: bool,
}

impl RelationshipDescriptor {
    /// Direct many-to-one relationship: `local_key` is the foreign-key
    /// column on the owning side, `remote_key` the matching column on the
    /// target. Single-valued by default.
    #[must_use]
    pub fn many_to_one(
        target: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            direction: RelationDirection::ManyToOne,
            single_valued: true,
            local_key: Some(local_key.into()),
            remote_key: Some(remote_key.into()),
            derived: false,
        }
    }

    /// Direct one-to-many relationship: `local_key` is the owning side's
    /// join column (typically its primary key), `remote_key` the foreign-key
    /// column on the target.
    #[must_use]
    pub fn one_to_many(
        target: impl Into<String>,
        local_key: impl Into<String>,
        remote_key: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            direction: RelationDirection::OneToMany,
            single_valued: false,
            local_key: Some(local_key.into()),
            remote_key: Some(remote_key.into()),
            derived: false,
        }
    }

    /// Many-to-many relationship through an association table. No physical
    /// join column pair; the accessor is the relationship name.
    #[must_use]
    pub fn many_to_many(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            direction: RelationDirection::ManyToMany,
            single_valued: false,
            local_key: None,
            remote_key: None,
            derived: false,
        }
    }

    /// Derived (association-style) relationship: to-many access to a scalar
    /// attribute `remote_attr` on the target, reached through an
    /// intermediate association.
    #[must_use]
    pub fn derived(target: impl Into<String>, remote_attr: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            direction: RelationDirection::ManyToMany,
            single_valued: false,
            local_key: None,
            remote_key: Some(remote_attr.into()),
            derived: true,
        }
    }

    /// Mark this relationship as accessed single-valued (one-to-one).
    #[must_use]
    pub const fn single_valued(mut self) -> Self {
        self.single_valued = true;
        self
    }

    /// Mark this relationship as accessed list-valued.
    #[must_use]
    pub const fn multi_valued(mut self) -> Self {
        self.single_valued = false;
        self
    }

    /// True for relationships the `$any`/`$all`/`$length` operators accept.
    #[must_use]
    pub const fn is_to_many(&self) -> bool {
        matches!(
            self.direction,
            RelationDirection::OneToMany | RelationDirection::ManyToMany
        ) && !self.single_valued
    }

    /// True when this relationship inlines as a single object on its owner.
    #[must_use]
    pub const fn is_one_to_one(&self) -> bool {
        self.single_valued && !matches!(self.direction, RelationDirection::ManyToMany)
    }

    /// True for relationships a dotted subfield chain may traverse.
    #[must_use]
    pub const fn is_subfield_traversable(&self) -> bool {
        matches!(self.direction, RelationDirection::ManyToOne) || self.is_one_to_one()
    }
}

///
/// TESTS
///
