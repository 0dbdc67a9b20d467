//! File references and adding files to targets.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::consts::{COMMENT_KEY, NAME_KEY, isa, settings, source_tree};
use crate::store::ObjectId;
use crate::util::path::{basename, strip_extension};
use crate::value::{Record, Value, field, references};
use crate::{ProjectError, Result};

use super::group::{GroupSpec, default_source_tree};
use super::{BuildPhaseKind, ProjectGraph};

const SYSTEM_FRAMEWORKS: &str = "/System/Library/Frameworks/";

/// What a file is for; selects the build phase it joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
  #[default]
  Source,
  Header,
  Resource,
  /// Static or dynamic libraries and frameworks.
  Library,
  /// Listed in the project but never built.
  Ignored,
}

impl FileRole {
  pub fn default_phase(self) -> Option<BuildPhaseKind> {
    match self {
      FileRole::Source => Some(BuildPhaseKind::Sources),
      FileRole::Header => Some(BuildPhaseKind::Headers),
      FileRole::Resource => Some(BuildPhaseKind::Resources),
      FileRole::Library => Some(BuildPhaseKind::Frameworks),
      FileRole::Ignored => None,
    }
  }
}

/// A file to add to the project, its group, and the targets building it.
#[derive(Debug, Clone)]
pub struct FileSpec {
  pub path: String,
  pub group: GroupSpec,
  pub role: FileRole,
  pub targets: Vec<ObjectId>,
  pub source_tree: Option<String>,
  /// Overrides the role's phase.
  pub phase: Option<BuildPhaseKind>,
  /// Per-file build settings, e.g. `COMPILER_FLAGS`.
  pub settings: Record,
}

impl FileSpec {
  pub fn new(path: impl Into<String>, group: impl Into<GroupSpec>, role: FileRole) -> Self {
    Self {
      path: path.into(),
      group: group.into(),
      role,
      targets: Vec::new(),
      source_tree: None,
      phase: None,
      settings: Record::new(),
    }
  }

  pub fn source(path: impl Into<String>, group: impl Into<GroupSpec>) -> Self {
    Self::new(path, group, FileRole::Source)
  }

  pub fn header(path: impl Into<String>, group: impl Into<GroupSpec>) -> Self {
    Self::new(path, group, FileRole::Header)
  }

  pub fn resource(path: impl Into<String>, group: impl Into<GroupSpec>) -> Self {
    Self::new(path, group, FileRole::Resource)
  }

  pub fn library(path: impl Into<String>, group: impl Into<GroupSpec>) -> Self {
    Self::new(path, group, FileRole::Library)
  }

  pub fn ignored(path: impl Into<String>, group: impl Into<GroupSpec>) -> Self {
    Self::new(path, group, FileRole::Ignored)
  }

  pub fn for_targets(mut self, targets: impl IntoIterator<Item = ObjectId>) -> Self {
    self.targets.extend(targets);
    self
  }

  pub fn with_source_tree(mut self, tree: impl Into<String>) -> Self {
    self.source_tree = Some(tree.into());
    self
  }

  pub fn with_phase(mut self, phase: BuildPhaseKind) -> Self {
    self.phase = Some(phase);
    self
  }

  /// Set `COMPILER_FLAGS`; blank flags are ignored.
  pub fn with_compiler_flags(mut self, flags: &str) -> Self {
    if !flags.trim().is_empty() {
      self.settings.insert(settings::COMPILER_FLAGS.to_string(), Value::from(flags));
    }
    self
  }

  pub fn with_setting(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.settings.insert(key.to_string(), value.into());
    self
  }

  fn effective_phase(&self) -> Result<Option<BuildPhaseKind>> {
    let phase = self.phase.or(self.role.default_phase());
    if phase.is_none() && !self.targets.is_empty() {
      return Err(ProjectError::InvalidArgument(format!(
        "'{}' has no build phase but is added to {} target(s)",
        self.path,
        self.targets.len()
      )));
    }
    Ok(phase)
  }
}

/// Xcode text encoding overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
  Utf8,
  Utf16,
}

impl TextEncoding {
  /// The `fileEncoding` code.
  pub fn code(self) -> i64 {
    match self {
      TextEncoding::Utf8 => 4,
      TextEncoding::Utf16 => 10,
    }
  }
}

impl FromStr for TextEncoding {
  type Err = ProjectError;

  fn from_str(name: &str) -> Result<Self> {
    match name.to_ascii_lowercase().as_str() {
      "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
      "utf16" | "utf-16" => Ok(TextEncoding::Utf16),
      _ => Err(ProjectError::UnknownEncoding(name.to_string())),
    }
  }
}

impl fmt::Display for TextEncoding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TextEncoding::Utf8 => f.write_str("utf-8"),
      TextEncoding::Utf16 => f.write_str("utf-16"),
    }
  }
}

/// `path` relative to the SDK when it names a system framework.
fn sdk_relative(path: &str) -> Option<&str> {
  path.starts_with(SYSTEM_FRAMEWORKS).then(|| &path[1..])
}

/// Set `name` to the basename when it differs from the path.
fn display_name(props: &mut Record, path: &str) {
  let base = basename(path);
  if base != path {
    props.insert(NAME_KEY.to_string(), Value::from(base));
  }
}

impl ProjectGraph {
  /// Create an unattached file reference.
  ///
  /// System framework paths become `SDKROOT`-relative unless a source tree is
  /// given.
  pub fn new_file_reference(&mut self, path: &str, file_type: &str, tree: Option<&str>) -> Result<ObjectId> {
    require_path(path)?;
    let (path, tree) = match (tree, sdk_relative(path)) {
      (None, Some(relative)) => (relative, source_tree::SDK),
      (Some(tree), _) => (path, tree),
      (None, None) => (path, default_source_tree(Some(path))),
    };

    let mut props = Record::from([
      field("lastKnownFileType", file_type),
      field("path", path),
      field("sourceTree", tree),
    ]);
    display_name(&mut props, path);
    props.insert(COMMENT_KEY.to_string(), Value::from(basename(path)));
    self.store.allocate(isa::FILE_REFERENCE, props)
  }

  /// Create an unattached reference to a built product.
  pub fn new_product_file_reference(
    &mut self,
    explicit_file_type: &str,
    path: &str,
    tree: Option<&str>,
  ) -> Result<ObjectId> {
    if path.is_empty() {
      return Err(ProjectError::InvalidArgument("product path must not be empty".to_string()));
    }
    let mut props = Record::from([
      field("explicitFileType", explicit_file_type),
      field("includeInIndex", 0),
      field("path", path),
      field("sourceTree", tree.unwrap_or(source_tree::BUILT_PRODUCTS)),
    ]);
    display_name(&mut props, path);
    props.insert(COMMENT_KEY.to_string(), Value::from(basename(path)));
    self.store.allocate(isa::FILE_REFERENCE, props)
  }

  /// First file reference whose path is `path`.
  pub fn find_file_reference(&self, path: &str) -> Option<ObjectId> {
    // System framework references are stored without the leading slash.
    let stored = sdk_relative(path).unwrap_or(path);
    self
      .store
      .find_all(isa::FILE_REFERENCE)
      .into_iter()
      .find(|id| self.path_is(id, path, stored))
  }

  fn path_is(&self, id: &ObjectId, path: &str, stored: &str) -> bool {
    matches!(self.store.get_str(id, "path"), Ok(Some(p)) if p == path || p == stored)
  }

  /// Add a file to a group and to the matching phase of every target.
  ///
  /// An existing reference with the same path is reused when it is
  /// unattached or already in the destination group.
  pub fn add_file(&mut self, spec: FileSpec) -> Result<ObjectId> {
    let phase = spec.effective_phase()?;
    require_path(&spec.path)?;
    for target in &spec.targets {
      self.expect_target(target)?;
    }
    let group = self.resolve_group(&spec.group)?;

    let existing = match self.find_file_reference(&spec.path) {
      Some(found) => match self.parent_group(&found)? {
        None => Some((found, false)),
        Some(parent) if parent == group => Some((found, true)),
        Some(_) => None,
      },
      None => None,
    };
    let file = match existing {
      Some((file, true)) => file,
      Some((file, false)) => {
        self.attach(&file, &group)?;
        file
      }
      None => {
        let file_type = self.file_types.file_type_for(&spec.path).to_string();
        let file = self.new_file_reference(&spec.path, &file_type, spec.source_tree.as_deref())?;
        self.attach(&file, &group)?;
        file
      }
    };

    self.add_build_files(&file, &spec.targets, phase, &spec.settings)?;
    debug!(path = %spec.path, targets = spec.targets.len(), "added file");
    Ok(file)
  }

  /// Add a file produced by the build (e.g. generated sources).
  ///
  /// The reference lives in the caller's group with an explicit file type and
  /// a `BUILT_PRODUCTS_DIR` default source tree.
  pub fn add_built_file(&mut self, spec: FileSpec) -> Result<ObjectId> {
    let phase = spec.effective_phase()?;
    require_path(&spec.path)?;
    for target in &spec.targets {
      self.expect_target(target)?;
    }
    let group = self.resolve_group(&spec.group)?;

    let file_type = self.file_types.file_type_for(&spec.path).to_string();
    let file = self.new_product_file_reference(&file_type, &spec.path, spec.source_tree.as_deref())?;
    self.attach(&file, &group)?;

    self.add_build_files(&file, &spec.targets, phase, &spec.settings)?;
    Ok(file)
  }

  fn add_build_files(
    &mut self,
    file: &ObjectId,
    targets: &[ObjectId],
    phase: Option<BuildPhaseKind>,
    settings: &Record,
  ) -> Result<()> {
    let Some(phase) = phase else {
      return Ok(());
    };
    for target in targets {
      self.new_build_file(file, target, phase, Some(settings.clone()))?;
    }
    Ok(())
  }

  /// A folder reference; folders are copied as a whole and never built.
  pub fn new_folder_reference(
    &mut self,
    path: &str,
    group: impl Into<GroupSpec>,
    tree: Option<&str>,
  ) -> Result<ObjectId> {
    require_path(path)?;
    let group = self.resolve_group(&group.into())?;
    let folder = self.new_file_reference(path, "folder", tree)?;
    self.attach(&folder, &group)?;
    Ok(folder)
  }

  /// Link a system framework (or an absolute framework path) into targets.
  ///
  /// Linked frameworks go in `Frameworks:Linked`, others in
  /// `Frameworks:Other`.
  pub fn new_framework(&mut self, name: &str, targets: &[ObjectId]) -> Result<ObjectId> {
    let path = if name.starts_with('/') {
      name.to_string()
    } else {
      format!("{}{}", SYSTEM_FRAMEWORKS, name)
    };
    let spec = FileSpec::library(path, frameworks_group(targets)).for_targets(targets.iter().cloned());
    self.add_file(spec)
  }

  /// Link an SDK library from `usr/lib` into targets.
  pub fn new_usr_lib(&mut self, name: &str, targets: &[ObjectId]) -> Result<ObjectId> {
    let spec = FileSpec::library(format!("usr/lib/{}", name), frameworks_group(targets))
      .for_targets(targets.iter().cloned())
      .with_source_tree(source_tree::SDK);
    self.add_file(spec)
  }

  /// A variant group with one child per localization directory.
  ///
  /// `new_variant_group("MainMenu.xib", &["res/English.lproj", "res/French.lproj"])`
  /// yields children named `English` and `French` with paths
  /// `res/English.lproj/MainMenu.xib` and `res/French.lproj/MainMenu.xib`.
  pub fn new_variant_group<S: AsRef<str>>(&mut self, name: &str, variant_dirs: &[S]) -> Result<ObjectId> {
    let first = require_variants(name, variant_dirs)?;
    let tree = default_source_tree(Some(first.as_ref()));

    let mut children = Vec::with_capacity(variant_dirs.len());
    for dir in variant_dirs {
      let dir = dir.as_ref();
      let path = format!("{}/{}", dir, name);
      let file_type = self.file_types.file_type_for(&path).to_string();
      let child = self.new_file_reference(&path, &file_type, None)?;
      self.store.set(&child, NAME_KEY, strip_extension(dir))?;
      children.push(child);
    }

    self.store.allocate(
      isa::VARIANT_GROUP,
      Record::from([
        field("children", references(&children)),
        field(NAME_KEY, name),
        field("sourceTree", tree),
        field(COMMENT_KEY, name),
      ]),
    )
  }

  /// A localized resource: a variant group attached to `group` and added to
  /// the resources phase of every target.
  pub fn new_localized_resource<S: AsRef<str>>(
    &mut self,
    name: &str,
    variant_dirs: &[S],
    group: impl Into<GroupSpec>,
    targets: &[ObjectId],
  ) -> Result<ObjectId> {
    require_variants(name, variant_dirs)?;
    for target in targets {
      self.expect_target(target)?;
    }
    let group = self.resolve_group(&group.into())?;
    let variant = self.new_variant_group(name, variant_dirs)?;
    self.attach(&variant, &group)?;
    for target in targets {
      self.new_build_file(&variant, target, BuildPhaseKind::Resources, None)?;
    }
    Ok(variant)
  }

  /// Override the tabs-vs-spaces editor setting of one file.
  pub fn set_file_reference_uses_tabs(&mut self, file: &ObjectId, uses_tabs: bool) -> Result<()> {
    self.store.expect_class(file, &[isa::FILE_REFERENCE])?;
    self.store.set(file, "usesTabs", uses_tabs)
  }

  /// Parse an encoding name (`utf-8`, `utf16`, ...).
  pub fn text_encoding_for_name(name: &str) -> Result<TextEncoding> {
    name.parse()
  }

  pub fn set_file_reference_text_encoding(&mut self, file: &ObjectId, encoding: TextEncoding) -> Result<()> {
    self.store.expect_class(file, &[isa::FILE_REFERENCE])?;
    self.store.set(file, "fileEncoding", encoding.code())
  }
}

fn require_path(path: &str) -> Result<()> {
  if path.is_empty() {
    return Err(ProjectError::InvalidArgument("file path must not be empty".to_string()));
  }
  Ok(())
}

fn require_variants<'a, S: AsRef<str>>(name: &str, variant_dirs: &'a [S]) -> Result<&'a S> {
  if name.is_empty() {
    return Err(ProjectError::InvalidArgument("localized resource name must not be empty".to_string()));
  }
  match variant_dirs.first() {
    Some(first) if variant_dirs.iter().all(|dir| !dir.as_ref().is_empty()) => Ok(first),
    _ => Err(ProjectError::InvalidArgument(format!(
      "localized resource '{}' needs at least one variant",
      name
    ))),
  }
}

fn frameworks_group(targets: &[ObjectId]) -> &'static str {
  if targets.is_empty() { "Frameworks:Other" } else { "Frameworks:Linked" }
}
