//! pbxgen-lib: Core types and logic for pbxgen
//!
//! This crate builds Xcode project descriptions (`project.pbxproj`) as an
//! in-memory object graph and renders them in the ASCII property-list
//! grammar Xcode itself writes:
//! - `store`: the identity-keyed object store and identity generator
//! - `graph`: groups, file references, targets, build phases and dependencies
//! - `writer`: the deterministic `project.pbxproj` serializer
//! - `reader`: parsing of existing projects for cross-project dependencies
//! - `project`: the high-level `XcodeProject` façade
//! - `manifest`: declarative JSON project descriptions

pub mod consts;
pub mod error;
pub mod filetypes;
pub mod graph;
pub mod manifest;
pub mod project;
pub mod reader;
pub mod registry;
pub mod store;
pub mod util;
pub mod value;
pub mod writer;

pub use error::ProjectError;
pub use graph::ProjectGraph;
pub use project::XcodeProject;
pub use store::{IdGenerator, ObjectId, ObjectStore};
pub use value::{Record, Value};

/// Result type for project operations
pub type Result<T> = std::result::Result<T, ProjectError>;
