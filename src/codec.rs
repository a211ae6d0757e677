//! Property codec.
//!
//! Validates property maps before they reach the store and implements the
//! delete-by-empty-value merge used by every `set_*_properties` operation:
//! an update of `""`, `[]` or `Value::Null` removes the key, anything else
//! overwrites it, and keys absent from the update are left alone.

use crate::model::{PropertyMap, Value};
use crate::{Error, Result};

/// One store mutation produced by merging an update into existing properties.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    Set(String, Value),
    Remove(String),
}

/// True when an update value means "remove this key".
pub fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::List(l) => l.is_empty(),
        _ => false,
    }
}

/// Check that a value can be stored: a scalar, or a list whose elements are
/// all scalars of the same kind.
pub fn validate_value(key: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => Err(Error::BadProperties(format!("{key}: null cannot be stored"))),
        Value::Bool(_) | Value::Int(_) | Value::String(_) => Ok(()),
        Value::Float(f) if f.is_finite() => Ok(()),
        Value::Float(f) => Err(Error::BadProperties(format!("{key}: {f} is not a finite number"))),
        Value::List(items) => {
            let mut kind = None;
            for item in items {
                if let Value::Float(f) = item {
                    if !f.is_finite() {
                        return Err(Error::BadProperties(format!("{key}: {f} is not a finite number")));
                    }
                }
                let item_kind = item.scalar_kind().ok_or_else(|| {
                    Error::BadProperties(format!("{key}: list items must be scalars, got {}", item.type_name()))
                })?;
                match kind {
                    None => kind = Some(item_kind),
                    Some(k) if k == item_kind => {}
                    Some(_) => {
                        return Err(Error::BadProperties(format!("{key}: list mixes value types")));
                    }
                }
            }
            Ok(())
        }
    }
}

/// Validate every entry of an update. Unset sentinels are allowed here.
pub fn validate_update(updates: &PropertyMap) -> Result<()> {
    for (key, value) in updates {
        if key.is_empty() {
            return Err(Error::BadProperties("property keys must not be empty".into()));
        }
        if !is_unset(value) {
            validate_value(key, value)?;
        }
    }
    Ok(())
}

/// Validate properties for a new node or relationship, dropping unset entries.
pub fn normalize(properties: PropertyMap) -> Result<PropertyMap> {
    validate_update(&properties)?;
    Ok(properties.into_iter().filter(|(_, v)| !is_unset(v)).collect())
}

/// Compute the store mutations needed to merge `updates` into `existing`.
///
/// Changes that would not alter the stored map are skipped, so applying the
/// same update twice yields no changes the second time.
pub fn changes(existing: &PropertyMap, updates: &PropertyMap) -> Result<Vec<PropertyChange>> {
    validate_update(updates)?;
    let mut keys: Vec<&String> = updates.keys().collect();
    keys.sort();

    let mut out = Vec::new();
    for key in keys {
        let value = &updates[key];
        if is_unset(value) {
            if existing.contains_key(key) {
                out.push(PropertyChange::Remove(key.clone()));
            }
        } else if existing.get(key) != Some(value) {
            out.push(PropertyChange::Set(key.clone(), value.clone()));
        }
    }
    Ok(out)
}

/// Merge `updates` into `properties` and return the result.
pub fn update_item_properties(mut properties: PropertyMap, updates: &PropertyMap) -> Result<PropertyMap> {
    for change in changes(&properties, updates)? {
        match change {
            PropertyChange::Set(k, v) => {
                properties.insert(k, v);
            }
            PropertyChange::Remove(k) => {
                properties.remove(&k);
            }
        }
    }
    Ok(properties)
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized, lowercased form used for case-insensitive matching.
pub fn lowerstr(s: &str) -> String {
    normalize_whitespace(s).to_lowercase()
}
