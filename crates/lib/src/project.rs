//! The high-level project façade.
//!
//! [`XcodeProject`] bundles a [`ProjectGraph`] with one verb per common task:
//! creating groups, adding files of each role, creating targets and wiring
//! dependencies. Every verb returns the identity of the entity it created so
//! callers can keep wiring; the underlying graph stays reachable through
//! [`XcodeProject::graph_mut`] for anything the façade does not cover.
//!
//! ```
//! use pbxgen_lib::XcodeProject;
//! use pbxgen_lib::graph::ProjectOptions;
//! use pbxgen_lib::store::IdGenerator;
//!
//! let mut project = XcodeProject::with_ids(IdGenerator::deterministic(), ProjectOptions::default()).unwrap();
//! let app = project.new_application_target("App.app").unwrap();
//! project.new_source_file("main.m", "Classes", &[app]).unwrap();
//! assert!(project.to_pbxproj().unwrap().contains("main.m"));
//! ```

use std::path::{Path, PathBuf};

use crate::Result;
use crate::graph::{
  ConfigurationSelector, FileRole, FileSpec, GroupSpec, ProductKind, ProjectGraph, ProjectOptions, ShellScript,
};
use crate::reader::{ExternalProject, ProjectReader};
use crate::store::{IdGenerator, ObjectId};

/// A project under construction.
#[derive(Debug, Clone)]
pub struct XcodeProject {
  graph: ProjectGraph,
}

impl XcodeProject {
  /// A new project whose identities honour `PBXGEN_DETERMINISTIC_IDS`.
  pub fn new(options: ProjectOptions) -> Result<Self> {
    Self::with_ids(IdGenerator::from_env(), options)
  }

  pub fn with_ids(ids: IdGenerator, options: ProjectOptions) -> Result<Self> {
    let mut graph = ProjectGraph::with_ids(ids);
    graph.new_project(options)?;
    Ok(Self { graph })
  }

  /// A project with a custom configuration-name list.
  pub fn with_configurations<S: AsRef<str>>(
    ids: IdGenerator,
    configurations: impl IntoIterator<Item = S>,
    options: ProjectOptions,
  ) -> Result<Self> {
    let mut graph = ProjectGraph::with_ids(ids);
    graph.set_configurations(configurations)?;
    graph.new_project(options)?;
    Ok(Self { graph })
  }

  pub fn graph(&self) -> &ProjectGraph {
    &self.graph
  }

  pub fn graph_mut(&mut self) -> &mut ProjectGraph {
    &mut self.graph
  }

  pub fn into_graph(self) -> ProjectGraph {
    self.graph
  }

  pub fn project(&self) -> Result<&ObjectId> {
    self.graph.project()
  }

  pub fn root_group(&self) -> Result<ObjectId> {
    self.graph.root_group()
  }

  /// A group under the main group; see [`ProjectGraph::new_group`].
  pub fn new_group(&mut self, name: &str, path: Option<&str>) -> Result<ObjectId> {
    self.graph.new_group(name, path, None)
  }

  fn add(&mut self, path: &str, group: impl Into<GroupSpec>, role: FileRole, targets: &[ObjectId]) -> Result<ObjectId> {
    self
      .graph
      .add_file(FileSpec::new(path, group, role).for_targets(targets.iter().cloned()))
  }

  pub fn new_source_file(&mut self, path: &str, group: impl Into<GroupSpec>, targets: &[ObjectId]) -> Result<ObjectId> {
    self.add(path, group, FileRole::Source, targets)
  }

  /// A source file compiled with extra flags.
  pub fn new_source_file_with_flags(
    &mut self,
    path: &str,
    group: impl Into<GroupSpec>,
    targets: &[ObjectId],
    compiler_flags: &str,
  ) -> Result<ObjectId> {
    let spec = FileSpec::source(path, group)
      .for_targets(targets.iter().cloned())
      .with_compiler_flags(compiler_flags);
    self.graph.add_file(spec)
  }

  /// A source file produced by an earlier build step.
  pub fn new_built_source_file(
    &mut self,
    path: &str,
    group: impl Into<GroupSpec>,
    targets: &[ObjectId],
  ) -> Result<ObjectId> {
    self
      .graph
      .add_built_file(FileSpec::source(path, group).for_targets(targets.iter().cloned()))
  }

  pub fn new_header_file(&mut self, path: &str, group: impl Into<GroupSpec>, targets: &[ObjectId]) -> Result<ObjectId> {
    self.add(path, group, FileRole::Header, targets)
  }

  /// A file listed in the project but never built.
  pub fn new_ignored_file(&mut self, path: &str, group: impl Into<GroupSpec>) -> Result<ObjectId> {
    self.add(path, group, FileRole::Ignored, &[])
  }

  pub fn new_resource_file(&mut self, path: &str, group: impl Into<GroupSpec>, targets: &[ObjectId]) -> Result<ObjectId> {
    self.add(path, group, FileRole::Resource, targets)
  }

  pub fn new_built_resource_file(
    &mut self,
    path: &str,
    group: impl Into<GroupSpec>,
    targets: &[ObjectId],
  ) -> Result<ObjectId> {
    self
      .graph
      .add_built_file(FileSpec::resource(path, group).for_targets(targets.iter().cloned()))
  }

  /// A library linked into the targets' frameworks phase.
  pub fn new_library(&mut self, path: &str, group: impl Into<GroupSpec>, targets: &[ObjectId]) -> Result<ObjectId> {
    self.add(path, group, FileRole::Library, targets)
  }

  pub fn new_framework(&mut self, name: &str, targets: &[ObjectId]) -> Result<ObjectId> {
    self.graph.new_framework(name, targets)
  }

  pub fn new_usr_lib(&mut self, name: &str, targets: &[ObjectId]) -> Result<ObjectId> {
    self.graph.new_usr_lib(name, targets)
  }

  pub fn new_folder(&mut self, path: &str, group: impl Into<GroupSpec>) -> Result<ObjectId> {
    self.graph.new_folder_reference(path, group, None)
  }

  pub fn new_localized_resource<S: AsRef<str>>(
    &mut self,
    name: &str,
    variant_dirs: &[S],
    group: impl Into<GroupSpec>,
    targets: &[ObjectId],
  ) -> Result<ObjectId> {
    self.graph.new_localized_resource(name, variant_dirs, group, targets)
  }

  pub fn new_aggregate_target(&mut self, name: &str) -> Result<ObjectId> {
    self.graph.new_aggregate_target(name, None)
  }

  pub fn new_native_target(&mut self, name: &str, kind: ProductKind) -> Result<ObjectId> {
    self.graph.new_native_target(name, kind, None)
  }

  pub fn new_application_target(&mut self, name: &str) -> Result<ObjectId> {
    self.new_native_target(name, ProductKind::Application)
  }

  pub fn new_tool_target(&mut self, name: &str) -> Result<ObjectId> {
    self.new_native_target(name, ProductKind::Tool)
  }

  pub fn new_static_library_target(&mut self, name: &str) -> Result<ObjectId> {
    self.new_native_target(name, ProductKind::StaticLibrary)
  }

  pub fn new_framework_target(&mut self, name: &str) -> Result<ObjectId> {
    self.new_native_target(name, ProductKind::Framework)
  }

  pub fn new_shell_script_target(&mut self, name: &str, script: &ShellScript) -> Result<ObjectId> {
    self.graph.new_shell_script_target(name, script)
  }

  pub fn add_local_target_dependencies(&mut self, target: &ObjectId, on: &[ObjectId]) -> Result<Vec<ObjectId>> {
    self.graph.add_local_target_dependencies(target, on)
  }

  pub fn add_external_target_dependency(
    &mut self,
    target: &ObjectId,
    project_path: &str,
    target_name: &str,
    reader: &dyn ProjectReader,
  ) -> Result<ObjectId> {
    self
      .graph
      .add_external_target_dependency(target, project_path, target_name, reader)
  }

  /// Add an xcconfig file to the main group and base the selected project
  /// configurations on it, clearing their other settings.
  pub fn new_project_configuration_file(&mut self, path: &str, selector: &ConfigurationSelector) -> Result<ObjectId> {
    let root = self.graph.root_group()?;
    let file = self.new_ignored_file(path, root)?;
    self.graph.set_project_configuration_file(&file, selector, true)?;
    Ok(file)
  }

  /// Add an xcconfig file to the main group and base the selected
  /// configurations of each target on it.
  pub fn new_targets_configuration_file(
    &mut self,
    path: &str,
    targets: &[ObjectId],
    selector: &ConfigurationSelector,
  ) -> Result<ObjectId> {
    let root = self.graph.root_group()?;
    let file = self.new_ignored_file(path, root)?;
    for target in targets {
      self.graph.set_target_configuration_file(target, &file, selector, true)?;
    }
    Ok(file)
  }

  pub fn set_file_reference_text_encoding_name(&mut self, file: &ObjectId, encoding: &str) -> Result<()> {
    let encoding = ProjectGraph::text_encoding_for_name(encoding)?;
    self.graph.set_file_reference_text_encoding(file, encoding)
  }

  /// The summary other projects in this session see when depending on
  /// this one at `path`.
  pub fn summary(&self, path: &str) -> Result<ExternalProject> {
    ExternalProject::from_graph(path, &self.graph)
  }

  pub fn to_pbxproj(&mut self) -> Result<String> {
    self.graph.to_pbxproj()
  }

  /// Write `<bundle>/project.pbxproj`.
  pub fn write(&mut self, bundle: &Path) -> Result<PathBuf> {
    self.graph.write(bundle)
  }
}
