//! Error types for pbxgen-lib

use thiserror::Error;

/// Errors that can occur while building, reading or writing a project graph.
///
/// Structural failures abort the operation that raised them; advisory
/// conditions (unknown file extensions, duplicate target names) are logged
/// through `tracing` instead and never surface here.
#[derive(Debug, Error)]
pub enum ProjectError {
  /// A call parameter was malformed (empty class tag, malformed identity, ...).
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// An identity is absent from the store or names the wrong kind of entity.
  #[error("invalid object {id}: {reason}")]
  InvalidObject { id: String, reason: String },

  /// Group path resolution found several sibling groups with the same name.
  #[error("multiple sibling groups named '{name}' while resolving '{path}'")]
  AmbiguousName { name: String, path: String },

  /// A group path, target name or other named entity could not be resolved.
  #[error("not found: {0}")]
  NotFound(String),

  /// A foreign project file could not be read or parsed.
  #[error("malformed external project {path}: {message}")]
  MalformedExternalProject { path: String, message: String },

  /// A text encoding name without a known Xcode encoding code.
  #[error("unknown text encoding: {0}")]
  UnknownEncoding(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("manifest error: {0}")]
  Manifest(#[from] serde_json::Error),
}

impl ProjectError {
  /// An identity that does not name any entity in the store.
  pub fn missing(id: impl std::fmt::Display) -> Self {
    ProjectError::InvalidObject {
      id: id.to_string(),
      reason: "not present in the object store".to_string(),
    }
  }

  /// An entity whose class tag differs from what the operation requires.
  pub fn wrong_class(id: impl std::fmt::Display, expected: &str, found: &str) -> Self {
    ProjectError::InvalidObject {
      id: id.to_string(),
      reason: format!("expected {}, found {}", expected, found),
    }
  }
}
