//! Property values stored on entities.
//!
//! Every entity in the object store is a [`Record`]: an insertion-ordered
//! mapping from key to [`Value`]. Insertion order matters for group children
//! and for the serializer's tie-breaking, so records are `IndexMap`s rather
//! than hash maps.

use indexmap::IndexMap;

use crate::consts::{COMMENT_KEY, ISA_KEY};
use crate::store::ObjectId;

/// An insertion-ordered property record.
pub type Record = IndexMap<String, Value>;

/// A property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  /// A string scalar, quoted on output when the grammar requires it.
  String(String),
  /// An integer scalar, always written bare.
  Integer(i64),
  /// An ordered sequence.
  Array(Vec<Value>),
  /// A reference to another entity in the same store.
  Reference(ObjectId),
  /// An inline nested record (optionally carrying its own `isa`).
  Record(Record),
}

impl Value {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_integer(&self) -> Option<i64> {
    match self {
      Value::Integer(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_reference(&self) -> Option<&ObjectId> {
    match self {
      Value::Reference(id) => Some(id),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[Value]> {
    match self {
      Value::Array(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
    match self {
      Value::Array(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_record(&self) -> Option<&Record> {
    match self {
      Value::Record(record) => Some(record),
      _ => None,
    }
  }

  pub fn as_record_mut(&mut self) -> Option<&mut Record> {
    match self {
      Value::Record(record) => Some(record),
      _ => None,
    }
  }

  /// The class tag of a nested record, if this is one and it has an `isa`.
  pub fn class_tag(&self) -> Option<&str> {
    self.as_record().and_then(class_tag)
  }
}

/// Class tag of a record.
pub fn class_tag(record: &Record) -> Option<&str> {
  record.get(ISA_KEY).and_then(Value::as_str)
}

/// Inline annotation of a record.
pub fn comment(record: &Record) -> Option<&str> {
  record.get(COMMENT_KEY).and_then(Value::as_str)
}

/// Build a `(key, value)` pair for `Record::from([...])`.
pub fn field(key: &str, value: impl Into<Value>) -> (String, Value) {
  (key.to_string(), value.into())
}

/// An array of references.
pub fn references<'a>(ids: impl IntoIterator<Item = &'a ObjectId>) -> Value {
  Value::Array(ids.into_iter().cloned().map(Value::Reference).collect())
}

/// An array of strings.
pub fn strings<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Value {
  Value::Array(items.into_iter().map(|s| Value::String(s.as_ref().to_string())).collect())
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::String(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::String(s)
  }
}

impl From<&String> for Value {
  fn from(s: &String) -> Self {
    Value::String(s.clone())
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Integer(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self {
    Value::Integer(i64::from(i))
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Integer(i64::from(b))
  }
}

impl From<ObjectId> for Value {
  fn from(id: ObjectId) -> Self {
    Value::Reference(id)
  }
}

impl From<&ObjectId> for Value {
  fn from(id: &ObjectId) -> Self {
    Value::Reference(id.clone())
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::Array(items)
  }
}

impl From<Record> for Value {
  fn from(record: Record) -> Self {
    Value::Record(record)
  }
}
