//! `project.pbxproj` rendering.
//!
//! The whole store is wrapped in one top-level record and written with the
//! ordering and quoting conventions of Xcode's own writer:
//!
//! - `isa` is always the first key of a record, the others follow in byte
//!   order. A record whose values are all class-tagged records (the `objects`
//!   table) is ordered by class tag instead, keeping allocation order within a
//!   class.
//! - `comment` is never written as a key; it becomes the `/* ... */`
//!   annotation after the record's key.
//! - Strings are written bare unless they contain characters the grammar
//!   reserves (see [`quote_scalar`], [`quote_element`] and [`quote_key`]).

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::consts::{ARCHIVE_VERSION, COMMENT_KEY, FILE_ENCODING_MARKER, ISA_KEY, OBJECT_VERSION, PROJECT_FILE_NAME, isa};
use crate::store::{ObjectId, ObjectStore};
use crate::value::{self, Record, Value, field};
use crate::{ProjectError, Result};

/// Characters that force quoting in both scalars and sequence elements.
fn is_reserved(c: char) -> bool {
  c.is_whitespace() || matches!(c, ',' | '$' | ';' | '{' | '}' | '+' | '(' | ')' | '<' | '>' | '@')
}

/// Render a sequence element.
///
/// Elements are quoted when they contain whitespace or a reserved character,
/// or are empty. Embedded double quotes are escaped.
pub fn quote_element(s: &str) -> Cow<'_, str> {
  if s.contains('"') {
    Cow::Owned(format!("\"{}\"", s.replace('"', "\\\"")))
  } else if s.is_empty() || s.chars().any(is_reserved) {
    Cow::Owned(format!("\"{}\"", s))
  } else {
    Cow::Borrowed(s)
  }
}

/// Render a scalar string property.
///
/// Newlines become the two characters `\n`. A value containing a double quote
/// is quoted with the quotes escaped; a value containing a single quote, a
/// hyphen, whitespace or a reserved character, or an empty value, is quoted
/// verbatim; anything else is written bare.
pub fn quote_scalar(s: &str) -> Cow<'_, str> {
  let s: Cow<'_, str> = if s.contains('\n') {
    Cow::Owned(s.replace('\n', "\\n"))
  } else {
    Cow::Borrowed(s)
  };
  if s.contains('"') {
    Cow::Owned(format!("\"{}\"", s.replace('"', "\\\"")))
  } else if s.is_empty() || s.contains('\'') || s.contains('-') || s.chars().any(is_reserved) {
    Cow::Owned(format!("\"{}\"", s))
  } else {
    s
  }
}

/// Render a record key.
///
/// Keys follow the element rules, and `=` also forces quotes so conditional
/// settings (`CODE_SIGN_IDENTITY[sdk=iphoneos*]`) stay one token.
pub fn quote_key(key: &str) -> Cow<'_, str> {
  if key.contains('=') && !key.contains('"') {
    Cow::Owned(format!("\"{}\"", key))
  } else {
    quote_element(key)
  }
}

fn annotation(record: &Record) -> String {
  match value::comment(record) {
    Some(text) => format!(" /* {} */", text.replace("*/", "* /")),
    None => String::new(),
  }
}

/// Keys of `record` in output order, `comment` excluded.
fn ordered_keys(record: &Record) -> Vec<&str> {
  let mut keys: Vec<&str> = record.keys().map(String::as_str).filter(|k| *k != COMMENT_KEY).collect();

  let tagged = !keys.is_empty()
    && keys
      .iter()
      .all(|k| record.get(*k).and_then(Value::class_tag).is_some());
  if tagged {
    // Stable: allocation order survives within a class.
    keys.sort_by(|a, b| {
      let tag = |k: &str| record.get(k).and_then(Value::class_tag).unwrap_or_default();
      tag(a).cmp(tag(b))
    });
  } else {
    keys.sort_by(|a, b| match (*a == ISA_KEY, *b == ISA_KEY) {
      (true, false) => Ordering::Less,
      (false, true) => Ordering::Greater,
      _ => a.cmp(b),
    });
  }
  keys
}

struct Writer {
  out: String,
}

impl Writer {
  fn line(&mut self, depth: usize, text: &str) {
    for _ in 0..depth {
      self.out.push('\t');
    }
    self.out.push_str(text);
    self.out.push('\n');
  }

  fn record(&mut self, record: &Record, depth: usize) {
    for key in ordered_keys(record) {
      let Some(value) = record.get(key) else {
        continue;
      };
      let key = quote_key(key);
      match value {
        Value::Array(items) => {
          self.line(depth, &format!("{} = (", key));
          self.array(items, depth + 1);
          self.line(depth, ");");
        }
        Value::Record(nested) => {
          self.line(depth, &format!("{}{} = {{", key, annotation(nested)));
          self.record(nested, depth + 1);
          self.line(depth, "};");
        }
        Value::String(s) => self.line(depth, &format!("{} = {};", key, quote_scalar(s))),
        Value::Integer(i) => self.line(depth, &format!("{} = {};", key, i)),
        Value::Reference(id) => self.line(depth, &format!("{} = {};", key, id)),
      }
    }
  }

  fn array(&mut self, items: &[Value], depth: usize) {
    for item in items {
      match item {
        Value::String(s) => self.line(depth, &format!("{},", quote_element(s))),
        Value::Integer(i) => self.line(depth, &format!("{},", i)),
        Value::Reference(id) => self.line(depth, &format!("{},", id)),
        Value::Record(nested) => {
          self.line(depth, &format!("{{{}", annotation(nested)));
          self.record(nested, depth + 1);
          self.line(depth, "},");
        }
        Value::Array(inner) => {
          self.line(depth, "(");
          self.array(inner, depth + 1);
          self.line(depth, "),");
        }
      }
    }
  }
}

/// The top-level record: format versions, the object table and the root.
fn document(store: &ObjectStore, root: &ObjectId) -> Record {
  let objects: Record = store
    .iter()
    .map(|(id, record)| (id.to_string(), Value::Record(record.clone())))
    .collect();
  Record::from([
    field("archiveVersion", ARCHIVE_VERSION),
    field("classes", Record::new()),
    field("objectVersion", OBJECT_VERSION),
    field("objects", objects),
    field("rootObject", root),
  ])
}

/// Render the store as `project.pbxproj` text.
///
/// Fails when `root` is not a project or when any reference is dangling.
pub fn serialize(store: &ObjectStore, root: &ObjectId) -> Result<String> {
  store.expect_class(root, &[isa::PROJECT])?;
  if let Some((holder, target)) = store.dangling_references().into_iter().next() {
    return Err(ProjectError::InvalidObject {
      id: holder.to_string(),
      reason: format!("references missing entity {}", target),
    });
  }

  let mut writer = Writer { out: String::new() };
  writer.line(0, FILE_ENCODING_MARKER);
  writer.line(0, "{");
  writer.record(&document(store, root), 1);
  writer.line(0, "}");
  Ok(writer.out)
}

/// Write `<dir>/project.pbxproj`, creating `dir` when possible.
///
/// Directory creation is best effort: a failure is logged and the write is
/// attempted anyway.
pub fn write_project(store: &ObjectStore, root: &ObjectId, dir: &Path) -> Result<PathBuf> {
  let text = serialize(store, root)?;

  if let Err(e) = fs::create_dir_all(dir) {
    warn!(path = ?dir, error = %e, "failed to create project directory");
  }
  let path = dir.join(PROJECT_FILE_NAME);
  fs::write(&path, text)?;
  info!(path = ?path, objects = store.len(), "wrote project");
  Ok(path)
}
