//! Manifest types for pbxgen.
//!
//! A manifest is the declarative description of one project: its options,
//! groups, targets and the files each target builds. It is loaded from JSON
//! and turned into a graph by [`build_project`](super::build_project).
//!
//! # Example
//!
//! ```json
//! {
//!   "name": "Hello",
//!   "targets": [
//!     { "name": "Hello.app", "kind": "application", "dependencies": ["libcore.a"] },
//!     { "name": "libcore.a", "kind": "static_library" }
//!   ],
//!   "files": [
//!     { "path": "main.m", "group": "Classes", "targets": ["Hello.app"] },
//!     { "path": "core.c", "group": "Core", "targets": ["libcore.a"], "compiler_flags": "-O3" }
//!   ],
//!   "frameworks": [{ "name": "Cocoa.framework", "targets": ["Hello.app"] }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::{FileRole, ProductKind};
use crate::value::Value;

/// The complete description of one project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
  /// Project name; the default bundle is `<name>.xcodeproj`.
  pub name: String,
  #[serde(default)]
  pub organization: Option<String>,
  #[serde(default)]
  pub development_region: Option<String>,
  #[serde(default)]
  pub known_regions: Option<Vec<String>>,
  #[serde(default)]
  pub project_root: Option<String>,
  #[serde(default)]
  pub product_dir_path: Option<String>,
  /// Configuration names; `Debug` and `Release` when empty.
  #[serde(default)]
  pub configurations: Vec<String>,
  /// Extra extension → file type mappings (`".m": "sourcecode.c.objc"`).
  #[serde(default)]
  pub file_types: BTreeMap<String, String>,
  /// Project-wide xcconfig file.
  #[serde(default)]
  pub xcconfig: Option<String>,
  #[serde(default)]
  pub groups: Vec<GroupEntry>,
  #[serde(default)]
  pub targets: Vec<TargetEntry>,
  #[serde(default)]
  pub files: Vec<FileEntry>,
  #[serde(default)]
  pub frameworks: Vec<FrameworkEntry>,
  #[serde(default)]
  pub localized_resources: Vec<LocalizedResourceEntry>,
}

/// A group created up front, usually to give it a path.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
  /// Group name path (`"Classes:Views"`).
  pub name: String,
  #[serde(default)]
  pub path: Option<String>,
  #[serde(default)]
  pub source_tree: Option<String>,
}

/// Target kinds a manifest can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
  Aggregate,
  Application,
  Tool,
  StaticLibrary,
  Framework,
}

impl TargetKind {
  /// The native product, `None` for aggregate targets.
  pub fn product_kind(self) -> Option<ProductKind> {
    match self {
      TargetKind::Aggregate => None,
      TargetKind::Application => Some(ProductKind::Application),
      TargetKind::Tool => Some(ProductKind::Tool),
      TargetKind::StaticLibrary => Some(ProductKind::StaticLibrary),
      TargetKind::Framework => Some(ProductKind::Framework),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
  /// Product name for native targets (`"App.app"`), plain name otherwise.
  pub name: String,
  pub kind: TargetKind,
  /// Names of targets in this manifest built first.
  #[serde(default)]
  pub dependencies: Vec<String>,
  #[serde(default)]
  pub external_dependencies: Vec<ExternalDependencyEntry>,
  /// Build settings written into every configuration of the target.
  #[serde(default)]
  pub settings: BTreeMap<String, SettingValue>,
  #[serde(default)]
  pub xcconfig: Option<String>,
  #[serde(default)]
  pub scripts: Vec<ScriptEntry>,
}

/// A target of another project this target depends on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalDependencyEntry {
  /// Bundle (`../Core/Core.xcodeproj`) or description path, relative to the
  /// manifest.
  pub project: String,
  pub target: String,
}

/// A run-script phase appended to a target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptEntry {
  pub name: String,
  pub script: String,
  #[serde(default)]
  pub shell_path: Option<String>,
  #[serde(default)]
  pub input_paths: Vec<String>,
  #[serde(default)]
  pub output_paths: Vec<String>,
}

/// A build setting value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
  Text(String),
  Number(i64),
  Flag(bool),
  List(Vec<String>),
}

impl From<&SettingValue> for Value {
  fn from(value: &SettingValue) -> Self {
    match value {
      SettingValue::Text(s) => Value::from(s.as_str()),
      SettingValue::Number(n) => Value::Integer(*n),
      SettingValue::Flag(b) => Value::from(if *b { "YES" } else { "NO" }),
      SettingValue::List(items) => crate::value::strings(items),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
  pub path: String,
  /// Group name path; the main group when unset.
  #[serde(default)]
  pub group: Option<String>,
  #[serde(default)]
  pub role: FileRole,
  #[serde(default)]
  pub targets: Vec<String>,
  #[serde(default)]
  pub source_tree: Option<String>,
  #[serde(default)]
  pub compiler_flags: Option<String>,
  /// Produced by the build rather than checked in.
  #[serde(default)]
  pub built: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameworkEntry {
  /// `Cocoa.framework`, an absolute framework path, or a `usr/lib` library
  /// such as `libz.dylib` when `usr_lib` is set.
  pub name: String,
  #[serde(default)]
  pub targets: Vec<String>,
  #[serde(default)]
  pub usr_lib: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalizedResourceEntry {
  /// Resource file name (`MainMenu.xib`).
  pub name: String,
  /// Localization directories (`res/English.lproj`).
  pub variants: Vec<String>,
  #[serde(default)]
  pub group: Option<String>,
  #[serde(default)]
  pub targets: Vec<String>,
}
