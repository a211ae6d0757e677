//! Relationship compatibility policy.
//!
//! A single static allow-list of `(source meta-type, kind, destination
//! meta-type)` triples. The table is directional: `(A, kind, B)` being legal
//! says nothing about `(B, kind, A)`.

use crate::model::MetaType::{self, Location, Logical, Physical, Relation};
use crate::model::RelKind;
use crate::{Error, Result};

/// Every legal triple. Process-wide and immutable.
pub static ALLOWED: &[(MetaType, RelKind, MetaType)] = &[
    (Location, RelKind::Has, Location),
    (Physical, RelKind::LocatedIn, Location),
    (Physical, RelKind::Has, Physical),
    (Physical, RelKind::ConnectedTo, Physical),
    (Logical, RelKind::PartOf, Physical),
    (Logical, RelKind::DependsOn, Logical),
    (Logical, RelKind::DependsOn, Physical),
    (Relation, RelKind::Owns, Physical),
    (Relation, RelKind::Owns, Logical),
    (Relation, RelKind::Provides, Logical),
    (Relation, RelKind::Uses, Logical),
    (Relation, RelKind::ResponsibleFor, Location),
    (Relation, RelKind::ResponsibleFor, Physical),
];

pub fn is_allowed(source: MetaType, kind: RelKind, dest: MetaType) -> bool {
    ALLOWED.iter().any(|&(s, k, d)| s == source && k == kind && d == dest)
}

/// Fails with `NoRelationshipPossible` when the triple is not in the table.
pub fn assert_allowed(source: MetaType, kind: RelKind, dest: MetaType) -> Result<()> {
    if is_allowed(source, kind, dest) {
        Ok(())
    } else {
        Err(Error::NoRelationshipPossible { start: source, kind, end: dest })
    }
}

/// Kinds a node of `source` may point at a node of `dest` with.
pub fn allowed_kinds(source: MetaType, dest: MetaType) -> Vec<RelKind> {
    ALLOWED
        .iter()
        .filter(|&&(s, _, d)| s == source && d == dest)
        .map(|&(_, k, _)| k)
        .collect()
}
