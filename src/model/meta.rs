//! Inventory vocabulary: the closed set of meta-types and relationship kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use crate::Error;

/// Top-level entity category. Every inventory node carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetaType {
    Location,
    Logical,
    Physical,
    Relation,
}

impl MetaType {
    pub const ALL: [MetaType; 4] = [
        MetaType::Location,
        MetaType::Logical,
        MetaType::Physical,
        MetaType::Relation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetaType::Location => "Location",
            MetaType::Logical => "Logical",
            MetaType::Physical => "Physical",
            MetaType::Relation => "Relation",
        }
    }

    pub fn is_meta_label(label: &str) -> bool {
        label.parse::<MetaType>().is_ok()
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Location" => Ok(MetaType::Location),
            "Logical" => Ok(MetaType::Logical),
            "Physical" => Ok(MetaType::Physical),
            "Relation" => Ok(MetaType::Relation),
            other => Err(Error::MetaLabelNamingError(other.to_owned())),
        }
    }
}

/// Relationship kind. Stored as the relationship type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelKind {
    Has,
    #[serde(rename = "Part_of")]
    PartOf,
    Owns,
    Provides,
    Uses,
    #[serde(rename = "Depends_on")]
    DependsOn,
    #[serde(rename = "Responsible_for")]
    ResponsibleFor,
    #[serde(rename = "Located_in")]
    LocatedIn,
    #[serde(rename = "Connected_to")]
    ConnectedTo,
}

impl RelKind {
    pub const ALL: [RelKind; 9] = [
        RelKind::Has,
        RelKind::PartOf,
        RelKind::Owns,
        RelKind::Provides,
        RelKind::Uses,
        RelKind::DependsOn,
        RelKind::ResponsibleFor,
        RelKind::LocatedIn,
        RelKind::ConnectedTo,
    ];

    /// Kinds that tie a Relation node (provider, customer, ...) to what it relates to.
    pub const RELATIONS: [RelKind; 4] = [
        RelKind::Owns,
        RelKind::Provides,
        RelKind::Uses,
        RelKind::ResponsibleFor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelKind::Has => "Has",
            RelKind::PartOf => "Part_of",
            RelKind::Owns => "Owns",
            RelKind::Provides => "Provides",
            RelKind::Uses => "Uses",
            RelKind::DependsOn => "Depends_on",
            RelKind::ResponsibleFor => "Responsible_for",
            RelKind::LocatedIn => "Located_in",
            RelKind::ConnectedTo => "Connected_to",
        }
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        RelKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::UnknownRelationshipKind(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_type_round_trips_through_label() {
        for meta in MetaType::ALL {
            assert_eq!(meta.as_str().parse::<MetaType>().unwrap(), meta);
        }
    }

    #[test]
    fn test_unknown_meta_label_is_a_naming_error() {
        let err = "Physcial".parse::<MetaType>().unwrap_err();
        assert!(matches!(err, Error::MetaLabelNamingError(ref l) if l == "Physcial"));
        assert!(!MetaType::is_meta_label("Node"));
    }

    #[test]
    fn test_rel_kind_uses_store_spelling() {
        assert_eq!(RelKind::DependsOn.to_string(), "Depends_on");
        assert_eq!("Located_in".parse::<RelKind>().unwrap(), RelKind::LocatedIn);
        assert!(matches!(
            "KNOWS".parse::<RelKind>(),
            Err(Error::UnknownRelationshipKind(_))
        ));
    }

    #[test]
    fn test_rel_kind_serializes_like_the_store() {
        let json = serde_json::to_string(&RelKind::ResponsibleFor).unwrap();
        assert_eq!(json, "\"Responsible_for\"");
    }
}
