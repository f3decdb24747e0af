//! Paths and key ranges.
//!
//! Key components are plain `serde_json::Value`s; this crate stores and
//! forwards them without interpreting them.

use crate::enums::{Relation, StringValueEnum};
use crate::protocol::error::{Result, YtError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// A Cypress path (`//home/table`) or object id path (`#1-2-3-4`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YPath(String);

impl YPath {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.starts_with('/') || (path.starts_with('#') && path.len() > 1) {
            Ok(YPath(path))
        } else {
            Err(YtError::InvalidPath(path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for YPath {
    type Error = YtError;

    fn try_from(path: String) -> Result<Self> {
        YPath::new(path)
    }
}

impl From<YPath> for String {
    fn from(path: YPath) -> Self {
        path.0
    }
}

impl fmt::Display for YPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bound of a key range: a relation and a key prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBound {
    relation: Relation,
    key: Vec<Value>,
}

impl KeyBound {
    /// Bound with the default `<` relation.
    pub fn of(key: &[Value]) -> Self {
        Self::with_relation(Relation::default(), key)
    }

    pub fn with_relation(relation: Relation, key: &[Value]) -> Self {
        Self {
            relation,
            key: key.to_vec(),
        }
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn key(&self) -> &[Value] {
        &self.key
    }

    /// `[relation, [key...]]`
    pub fn to_wire(&self) -> Value {
        json!([self.relation.value(), self.key])
    }
}

/// A key range of a table, either side may be open.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRange {
    pub lower: Option<KeyBound>,
    pub upper: Option<KeyBound>,
}

impl TableRange {
    pub fn new(lower: Option<KeyBound>, upper: Option<KeyBound>) -> Self {
        Self { lower, upper }
    }

    pub fn to_wire(&self) -> Value {
        let mut range = Map::new();
        if let Some(lower) = &self.lower {
            range.insert("lower_limit".to_string(), json!({ "key_bound": lower.to_wire() }));
        }
        if let Some(upper) = &self.upper {
            range.insert("upper_limit".to_string(), json!({ "key_bound": upper.to_wire() }));
        }
        Value::Object(range)
    }
}

/// A path together with the key ranges it is restricted to.
#[derive(Debug, Clone, PartialEq)]
pub struct RichYPath {
    path: YPath,
    ranges: Vec<TableRange>,
}

impl RichYPath {
    pub fn new(path: YPath) -> Self {
        Self {
            path,
            ranges: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: TableRange) -> Self {
        self.ranges.push(range);
        self
    }

    pub fn path(&self) -> &YPath {
        &self.path
    }

    pub fn ranges(&self) -> &[TableRange] {
        &self.ranges
    }

    /// Plain string without ranges, attributed node otherwise.
    pub fn to_wire(&self) -> Value {
        if self.ranges.is_empty() {
            return Value::String(self.path.to_string());
        }
        let ranges: Vec<Value> = self.ranges.iter().map(TableRange::to_wire).collect();
        json!({
            "$attributes": { "ranges": ranges },
            "$value": self.path.as_str(),
        })
    }
}

impl From<YPath> for RichYPath {
    fn from(path: YPath) -> Self {
        RichYPath::new(path)
    }
}
