//! Feature attribute bags
//!
//! Map features arrive with loosely typed properties. Values are kept as
//! supplied and coerced on read, so a height stored as `"12.5"` reads the
//! same as `12.5`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Null,
}

impl AttrValue {
    /// Numeric view of the value (`None` for non-numeric or non-finite)
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            AttrValue::Number(n) => *n,
            AttrValue::Text(s) => s.trim().parse::<f64>().ok()?,
            AttrValue::Flag(_) | AttrValue::Null => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Text view of the value; integral numbers render without a fraction
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttrValue::Text(s) if !s.is_empty() => Some(s.clone()),
            AttrValue::Number(n) if n.is_finite() => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            _ => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// Named attributes of one map feature
///
/// Immutable for the duration of a trigger; readers never fail, a missing or
/// malformed attribute simply reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureAttributes {
    values: HashMap<String, AttrValue>,
}

impl FeatureAttributes {
    /// Create an empty attribute bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Insert or replace an attribute
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values
            .get(key)
            .is_some_and(|v| !matches!(v, AttrValue::Null))
    }

    /// Read a numeric attribute
    pub fn number(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(AttrValue::as_number)
    }

    /// Read a numeric attribute, substituting `default` when missing or malformed
    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number(key).unwrap_or(default)
    }

    /// Read a textual attribute
    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(AttrValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
