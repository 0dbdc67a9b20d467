//! Build phases and build files.
//!
//! Sources, resources, frameworks, headers and copy-files phases are memoized:
//! a target has at most one of each, created on first use. Shell-script phases
//! are never memoized so a target can run several scripts.

use std::fmt;

use tracing::debug;

use crate::consts::{BUILD_ACTION_MASK, COMMENT_KEY, NAME_KEY, isa};
use crate::store::ObjectId;
use crate::util::path::basename;
use crate::value::{Record, Value, field, strings};
use crate::{ProjectError, Result};

use super::ProjectGraph;

/// The class of a build phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhaseKind {
  Sources,
  Resources,
  Frameworks,
  Headers,
  ShellScript,
  CopyFiles,
}

impl BuildPhaseKind {
  pub fn isa(self) -> &'static str {
    match self {
      BuildPhaseKind::Sources => isa::SOURCES_PHASE,
      BuildPhaseKind::Resources => isa::RESOURCES_PHASE,
      BuildPhaseKind::Frameworks => isa::FRAMEWORKS_PHASE,
      BuildPhaseKind::Headers => isa::HEADERS_PHASE,
      BuildPhaseKind::ShellScript => isa::SHELL_SCRIPT_PHASE,
      BuildPhaseKind::CopyFiles => isa::COPY_FILES_PHASE,
    }
  }

  /// Whether a target holds at most one phase of this kind.
  pub fn is_memoized(self) -> bool {
    !matches!(self, BuildPhaseKind::ShellScript)
  }
}

impl fmt::Display for BuildPhaseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.isa())
  }
}

/// A run-script phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellScript {
  pub name: String,
  pub script: String,
  pub shell_path: String,
  pub input_paths: Vec<String>,
  pub output_paths: Vec<String>,
  pub show_env_vars_in_log: bool,
}

impl ShellScript {
  pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      script: script.into(),
      shell_path: "/bin/sh".to_string(),
      input_paths: Vec::new(),
      output_paths: Vec::new(),
      show_env_vars_in_log: false,
    }
  }

  pub fn with_shell(mut self, shell_path: impl Into<String>) -> Self {
    self.shell_path = shell_path.into();
    self
  }

  pub fn with_inputs<S: Into<String>>(mut self, paths: impl IntoIterator<Item = S>) -> Self {
    self.input_paths.extend(paths.into_iter().map(Into::into));
    self
  }

  pub fn with_outputs<S: Into<String>>(mut self, paths: impl IntoIterator<Item = S>) -> Self {
    self.output_paths.extend(paths.into_iter().map(Into::into));
    self
  }
}

/// Destination of a copy-files phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFilesOptions {
  pub dst_path: String,
  /// Xcode destination code; 10 is the frameworks folder.
  pub dst_subfolder_spec: i64,
}

impl Default for CopyFilesOptions {
  fn default() -> Self {
    Self {
      dst_path: String::new(),
      dst_subfolder_spec: 10,
    }
  }
}

/// Entities a build file may point at.
const BUILDABLE: &[&str] = &[isa::FILE_REFERENCE, isa::VARIANT_GROUP, isa::REFERENCE_PROXY, isa::GROUP];

impl ProjectGraph {
  /// The target's phase of `kind`, if it has one.
  pub fn find_build_phase(&self, target: &ObjectId, kind: BuildPhaseKind) -> Result<Option<ObjectId>> {
    self.expect_target(target)?;
    for phase in self.store.references(target, "buildPhases")? {
      if self.store.class_of(&phase)? == kind.isa() {
        return Ok(Some(phase));
      }
    }
    Ok(None)
  }

  /// The target's phase of `kind`, created on first use.
  pub fn ensure_build_phase(&mut self, target: &ObjectId, kind: BuildPhaseKind) -> Result<ObjectId> {
    if !kind.is_memoized() {
      return Err(ProjectError::InvalidArgument(format!(
        "{} phases are not shared; use new_shell_script_build_phase",
        kind
      )));
    }
    if let Some(phase) = self.find_build_phase(target, kind)? {
      return Ok(phase);
    }
    let mut props = Record::new();
    if kind == BuildPhaseKind::CopyFiles {
      copy_files_fields(&mut props, &CopyFilesOptions::default());
    }
    self.new_build_phase(target, kind, props)
  }

  fn new_build_phase(&mut self, target: &ObjectId, kind: BuildPhaseKind, extra: Record) -> Result<ObjectId> {
    let target_name = self.store.get_str(target, NAME_KEY)?.unwrap_or_default().to_string();
    let mut props = Record::from([
      field("buildActionMask", BUILD_ACTION_MASK),
      field("files", Value::Array(Vec::new())),
      field("runOnlyForDeploymentPostprocessing", 0),
      field(COMMENT_KEY, format!("{} {}", target_name, kind)),
    ]);
    props.extend(extra);

    let phase = self.store.allocate(kind.isa(), props)?;
    self.store.push(target, "buildPhases", &phase)?;
    debug!(target = %target_name, phase = %kind, "created build phase");
    Ok(phase)
  }

  /// Join `file` to the target's phase of `kind` through a new build file.
  pub fn new_build_file(
    &mut self,
    file: &ObjectId,
    target: &ObjectId,
    kind: BuildPhaseKind,
    settings: Option<Record>,
  ) -> Result<ObjectId> {
    self.store.expect_class(file, BUILDABLE)?;
    self.expect_target(target)?;
    let phase = self.ensure_build_phase(target, kind)?;
    self.push_build_file(file, &phase, settings)
  }

  fn push_build_file(&mut self, file: &ObjectId, phase: &ObjectId, settings: Option<Record>) -> Result<ObjectId> {
    let comment = self
      .store
      .get_str(file, COMMENT_KEY)?
      .or(self.store.get_str(file, "path")?.map(basename))
      .unwrap_or_default()
      .to_string();

    let mut props = Record::from([field("fileRef", file)]);
    if let Some(settings) = settings.filter(|s| !s.is_empty()) {
      props.insert("settings".to_string(), Value::Record(settings));
    }
    props.insert(COMMENT_KEY.to_string(), Value::from(comment));

    let build_file = self.store.allocate(isa::BUILD_FILE, props)?;
    self.store.push(phase, "files", &build_file)?;
    Ok(build_file)
  }

  /// Append a run-script phase to a target.
  pub fn new_shell_script_build_phase(&mut self, target: &ObjectId, script: &ShellScript) -> Result<ObjectId> {
    self.expect_target(target)?;
    let props = Record::from([
      field(NAME_KEY, &script.name),
      field("shellScript", &script.script),
      field("shellPath", &script.shell_path),
      field("inputPaths", strings(&script.input_paths)),
      field("outputPaths", strings(&script.output_paths)),
      field("showEnvVarsInLog", script.show_env_vars_in_log),
    ]);
    self.new_build_phase(target, BuildPhaseKind::ShellScript, props)
  }

  /// Append a copy-files phase to a target, even when it already has one.
  pub fn new_copy_files_build_phase(&mut self, target: &ObjectId, options: &CopyFilesOptions) -> Result<ObjectId> {
    self.expect_target(target)?;
    let mut props = Record::new();
    copy_files_fields(&mut props, options);
    self.new_build_phase(target, BuildPhaseKind::CopyFiles, props)
  }

  /// Copy a framework into the target's bundle, creating the file reference
  /// when `path` has none yet.
  pub fn add_framework_to_copy_phase(&mut self, path: &str, target: &ObjectId) -> Result<ObjectId> {
    self.expect_target(target)?;
    let file = match self.find_file_reference(path) {
      Some(file) => file,
      None => {
        let file_type = self.file_types.file_type_for(path).to_string();
        self.new_file_reference(path, &file_type, None)?
      }
    };
    let phase = self.ensure_build_phase(target, BuildPhaseKind::CopyFiles)?;
    self.push_build_file(&file, &phase, None)
  }
}

fn copy_files_fields(props: &mut Record, options: &CopyFilesOptions) {
  props.insert("dstPath".to_string(), Value::from(options.dst_path.as_str()));
  props.insert("dstSubfolderSpec".to_string(), Value::from(options.dst_subfolder_spec));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::tests::graph;
  use crate::graph::{FileRole, FileSpec, ProductKind};

  fn phases(graph: &ProjectGraph, target: &ObjectId) -> Vec<ObjectId> {
    graph.store().references(target, "buildPhases").unwrap()
  }

  #[test]
  fn two_sources_share_one_phase() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    graph
      .add_file(FileSpec::new("main.m", "Classes", FileRole::Source).for_targets([app.clone()]))
      .unwrap();
    graph
      .add_file(FileSpec::new("AppDelegate.m", "Classes", FileRole::Source).for_targets([app.clone()]))
      .unwrap();

    let all = phases(&graph, &app);
    assert_eq!(all.len(), 1);
    assert_eq!(graph.store().class_of(&all[0]).unwrap(), isa::SOURCES_PHASE);
    assert_eq!(graph.store().references(&all[0], "files").unwrap().len(), 2);
  }

  #[test]
  fn memoized_phase_defaults() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    let phase = graph.ensure_build_phase(&app, BuildPhaseKind::Resources).unwrap();
    let store = graph.store();

    assert_eq!(store.get(&phase, "buildActionMask").unwrap(), Some(&Value::Integer(2_147_483_647)));
    assert_eq!(store.get(&phase, "runOnlyForDeploymentPostprocessing").unwrap(), Some(&Value::Integer(0)));
    assert_eq!(store.get_str(&phase, COMMENT_KEY).unwrap(), Some("App PBXResourcesBuildPhase"));
    assert_eq!(graph.ensure_build_phase(&app, BuildPhaseKind::Resources).unwrap(), phase);
  }

  #[test]
  fn shell_script_phases_are_not_memoized() {
    let mut graph = graph();
    let target = graph.new_aggregate_target("Scripts", None).unwrap();
    let first = graph
      .new_shell_script_build_phase(&target, &ShellScript::new("Gen", "make gen"))
      .unwrap();
    let second = graph
      .new_shell_script_build_phase(&target, &ShellScript::new("Lint", "make lint").with_inputs(["src"]))
      .unwrap();

    assert_ne!(first, second);
    assert_eq!(phases(&graph, &target), vec![first.clone(), second.clone()]);
    assert_eq!(graph.store().get_str(&first, "shellPath").unwrap(), Some("/bin/sh"));
    assert_eq!(graph.store().get(&second, "inputPaths").unwrap(), Some(&strings(["src"])));
    assert!(matches!(
      graph.ensure_build_phase(&target, BuildPhaseKind::ShellScript),
      Err(ProjectError::InvalidArgument(_))
    ));
  }

  #[test]
  fn copy_phase_is_reused_for_frameworks() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    graph.add_framework_to_copy_phase("Sparkle.framework", &app).unwrap();
    graph.add_framework_to_copy_phase("Growl.framework", &app).unwrap();

    let all = phases(&graph, &app);
    assert_eq!(all.len(), 1);
    assert_eq!(graph.store().get(&all[0], "dstSubfolderSpec").unwrap(), Some(&Value::Integer(10)));
    assert_eq!(graph.store().get_str(&all[0], "dstPath").unwrap(), Some(""));
    assert_eq!(graph.store().references(&all[0], "files").unwrap().len(), 2);
  }

  #[test]
  fn build_file_carries_settings_and_comment() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    let file = graph.new_file_reference("src/legacy.m", "sourcecode.c.objc", None).unwrap();
    let settings = Record::from([field("COMPILER_FLAGS", "-fno-objc-arc")]);
    let build_file = graph
      .new_build_file(&file, &app, BuildPhaseKind::Sources, Some(settings.clone()))
      .unwrap();

    assert_eq!(graph.store().get(&build_file, "settings").unwrap(), Some(&Value::Record(settings)));
    assert_eq!(graph.store().get_str(&build_file, COMMENT_KEY).unwrap(), Some("legacy.m"));
  }

  #[test]
  fn phases_require_a_target() {
    let mut graph = graph();
    let group = graph.new_group("NotATarget", None, None).unwrap();
    assert!(matches!(
      graph.ensure_build_phase(&group, BuildPhaseKind::Sources),
      Err(ProjectError::InvalidObject { .. })
    ));
  }
}
