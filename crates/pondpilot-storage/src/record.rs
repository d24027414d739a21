//! Keys and records held in the `data-source` store

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field that carries the primary key inside a record.
const KEY_FIELD: &str = "id";

/// Primary key of a record.
///
/// Integer keys sort before string keys; strings compare byte-wise.
/// The variant order matters: the derived `Ord` must agree with the
/// ordering SQLite applies to an untyped key column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(n) => write!(f, "{}", n),
            Key::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Integer(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Integer(i64::from(n))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl ToSql for Key {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Key::Integer(n) => ToSqlOutput::from(*n),
            Key::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// A stored record: the key plus the caller's fields, flattened into one
/// JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: Key,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a key and a payload. An `id` entry in the payload
    /// is dropped; the key argument always wins.
    pub fn new(id: impl Into<Key>, mut fields: Map<String, Value>) -> Self {
        fields.remove(KEY_FIELD);
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn id(&self) -> &Key {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// The record as a single JSON object, key included.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        let id = match &self.id {
            Key::Integer(n) => Value::from(*n),
            Key::Text(s) => Value::String(s.clone()),
        };
        object.insert(KEY_FIELD.to_string(), id);
        object.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Object(object)
    }
}
