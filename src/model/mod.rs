//! # Property Graph Model
//!
//! DTOs shared by the store gateway and the domain layer, plus the fixed
//! inventory vocabulary (meta-types and relationship kinds).
//!
//! This module is pure data: no I/O, no state, no async.

pub mod node;
pub mod relationship;
pub mod value;
pub mod property_map;
pub mod meta;

pub use node::{Node, NodeId};
pub use relationship::{Relationship, RelId, Direction};
pub use value::Value;
pub use property_map::PropertyMap;
pub use meta::{MetaType, RelKind};
