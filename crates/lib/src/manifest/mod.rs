//! Declarative project manifests.
//!
//! [`build_project`] turns a [`ProjectManifest`] into an [`XcodeProject`] in a
//! fixed order: groups, targets with their settings and scripts, target
//! dependencies, files, frameworks and localized resources. Targets are
//! referenced by the name given in the manifest; an unknown name fails with
//! [`ProjectError::NotFound`].

mod types;

pub use types::*;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::graph::{ConfigurationSelector, FileSpec, GroupSpec, ProjectOptions, ShellScript};
use crate::reader::ProjectReader;
use crate::store::{IdGenerator, ObjectId};
use crate::value::Value;
use crate::{ProjectError, Result, XcodeProject};

impl ProjectManifest {
  /// Read a JSON manifest from disk.
  pub fn load(path: &Path) -> Result<Self> {
    let text = fs::read_to_string(path)?;
    let manifest = Self::from_json(&text)?;
    debug!(path = ?path, targets = manifest.targets.len(), "loaded manifest");
    Ok(manifest)
  }

  pub fn from_json(text: &str) -> Result<Self> {
    let manifest: Self = serde_json::from_str(text)?;
    if manifest.name.trim().is_empty() {
      return Err(ProjectError::InvalidArgument("manifest name must not be empty".to_string()));
    }
    Ok(manifest)
  }

  /// Default bundle directory name.
  pub fn bundle_name(&self) -> String {
    format!("{}.xcodeproj", self.name)
  }

  fn options(&self) -> ProjectOptions {
    ProjectOptions {
      organization: self.organization.clone(),
      development_region: self.development_region.clone(),
      known_regions: self.known_regions.clone(),
      project_root: self.project_root.clone(),
      product_dir_path: self.product_dir_path.clone(),
      xcconfig: self.xcconfig.clone(),
    }
  }
}

/// Manifest target names → target identities.
struct Targets(HashMap<String, ObjectId>);

impl Targets {
  fn get(&self, name: &str) -> Result<&ObjectId> {
    self
      .0
      .get(name)
      .ok_or_else(|| ProjectError::NotFound(format!("target '{}' is not declared in the manifest", name)))
  }

  fn all(&self, names: &[String]) -> Result<Vec<ObjectId>> {
    names.iter().map(|name| self.get(name).cloned()).collect()
  }
}

fn group_or_root(project: &XcodeProject, group: Option<&str>) -> Result<GroupSpec> {
  match group {
    Some(path) => Ok(GroupSpec::from(path)),
    None => Ok(GroupSpec::from(project.root_group()?)),
  }
}

/// Build the project a manifest describes.
///
/// `reader` answers external dependencies; relative project paths in the
/// manifest are passed to it unchanged.
pub fn build_project(manifest: &ProjectManifest, ids: IdGenerator, reader: &dyn ProjectReader) -> Result<XcodeProject> {
  let mut project = if manifest.configurations.is_empty() {
    XcodeProject::with_ids(ids, manifest.options())?
  } else {
    XcodeProject::with_configurations(ids, &manifest.configurations, manifest.options())?
  };
  project
    .graph_mut()
    .file_types_mut()
    .extend(manifest.file_types.iter().map(|(k, v)| (k.as_str(), v.as_str())));

  for group in &manifest.groups {
    project
      .graph_mut()
      .new_group(&group.name, group.path.as_deref(), group.source_tree.as_deref())?;
  }

  let mut targets = Targets(HashMap::new());
  for entry in &manifest.targets {
    if targets.0.contains_key(&entry.name) {
      return Err(ProjectError::InvalidArgument(format!(
        "target '{}' is declared twice in the manifest",
        entry.name
      )));
    }
    let target = match entry.kind.product_kind() {
      Some(kind) => project.new_native_target(&entry.name, kind)?,
      None => project.new_aggregate_target(&entry.name)?,
    };
    configure_target(&mut project, &target, entry)?;
    targets.0.insert(entry.name.clone(), target);
  }

  for entry in &manifest.targets {
    let target = targets.get(&entry.name)?.clone();
    let local = targets.all(&entry.dependencies)?;
    if !local.is_empty() {
      project.add_local_target_dependencies(&target, &local)?;
    }
    for external in &entry.external_dependencies {
      project.add_external_target_dependency(&target, &external.project, &external.target, reader)?;
    }
  }

  for file in &manifest.files {
    let group = group_or_root(&project, file.group.as_deref())?;
    let mut spec = FileSpec::new(file.path.as_str(), group, file.role).for_targets(targets.all(&file.targets)?);
    if let Some(tree) = &file.source_tree {
      spec = spec.with_source_tree(tree.as_str());
    }
    if let Some(flags) = &file.compiler_flags {
      spec = spec.with_compiler_flags(flags);
    }
    if file.built {
      project.graph_mut().add_built_file(spec)?;
    } else {
      project.graph_mut().add_file(spec)?;
    }
  }

  for framework in &manifest.frameworks {
    let linked = targets.all(&framework.targets)?;
    if framework.usr_lib {
      project.new_usr_lib(&framework.name, &linked)?;
    } else {
      project.new_framework(&framework.name, &linked)?;
    }
  }

  for resource in &manifest.localized_resources {
    let group = group_or_root(&project, resource.group.as_deref())?;
    let linked = targets.all(&resource.targets)?;
    project.new_localized_resource(&resource.name, resource.variants.as_slice(), group, &linked)?;
  }

  info!(
    project = %manifest.name,
    targets = manifest.targets.len(),
    files = manifest.files.len(),
    "built project from manifest"
  );
  Ok(project)
}

fn configure_target(project: &mut XcodeProject, target: &ObjectId, entry: &TargetEntry) -> Result<()> {
  if !entry.settings.is_empty() {
    let list = project
      .graph()
      .store()
      .get_reference(target, "buildConfigurationList")?
      .cloned()
      .ok_or_else(|| ProjectError::InvalidObject {
        id: target.to_string(),
        reason: "target has no configuration list".to_string(),
      })?;
    for (key, value) in &entry.settings {
      project
        .graph_mut()
        .set_setting_in_configuration_list(&list, key, Value::from(value))?;
    }
  }

  for script in &entry.scripts {
    let mut phase = ShellScript::new(script.name.as_str(), script.script.as_str())
      .with_inputs(script.input_paths.iter().cloned())
      .with_outputs(script.output_paths.iter().cloned());
    if let Some(shell) = &script.shell_path {
      phase = phase.with_shell(shell.as_str());
    }
    project.graph_mut().new_shell_script_build_phase(target, &phase)?;
  }

  if let Some(xcconfig) = &entry.xcconfig {
    project.new_targets_configuration_file(xcconfig, std::slice::from_ref(target), &ConfigurationSelector::All)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::{NAME_KEY, isa};
  use crate::graph::BuildPhaseKind;
  use crate::reader::PbxprojReader;

  const HELLO: &str = r#"{
    "name": "Hello",
    "organization": "Acme",
    "groups": [{ "name": "Classes", "path": "src" }],
    "targets": [
      {
        "name": "Hello.app",
        "kind": "application",
        "dependencies": ["libcore.a"],
        "settings": { "INFOPLIST_FILE": "Info.plist", "GCC_OPTIMIZATION_LEVEL": 0 },
        "scripts": [{ "name": "Stamp", "script": "date > stamp", "output_paths": ["stamp"] }]
      },
      { "name": "libcore.a", "kind": "static_library" },
      { "name": "Docs", "kind": "aggregate" }
    ],
    "files": [
      { "path": "main.m", "group": "Classes", "targets": ["Hello.app"] },
      { "path": "core.c", "group": "Core", "targets": ["libcore.a"], "compiler_flags": "-O3" },
      { "path": "README.md", "role": "ignored" }
    ],
    "frameworks": [{ "name": "Cocoa.framework", "targets": ["Hello.app"] }],
    "localized_resources": [
      { "name": "MainMenu.xib", "variants": ["res/English.lproj"], "group": "Resources", "targets": ["Hello.app"] }
    ]
  }"#;

  fn build(text: &str) -> Result<XcodeProject> {
    let manifest = ProjectManifest::from_json(text)?;
    build_project(&manifest, IdGenerator::deterministic(), &PbxprojReader::new())
  }

  #[test]
  fn builds_targets_and_files() {
    let project = build(HELLO).unwrap();
    let graph = project.graph();
    let store = graph.store();

    let names: Vec<_> = graph
      .targets()
      .unwrap()
      .iter()
      .map(|t| store.get_str(t, NAME_KEY).unwrap().unwrap().to_string())
      .collect();
    assert_eq!(names, vec!["Hello", "libcore", "Docs"]);

    let app = graph.find_target("Hello").unwrap().unwrap();
    let phases: Vec<_> = store
      .references(&app, "buildPhases")
      .unwrap()
      .iter()
      .map(|p| store.class_of(p).unwrap().to_string())
      .collect();
    assert!(phases.contains(&isa::SHELL_SCRIPT_PHASE.to_string()));
    assert!(graph.find_build_phase(&app, BuildPhaseKind::Sources).unwrap().is_some());
    assert!(graph.find_build_phase(&app, BuildPhaseKind::Frameworks).unwrap().is_some());
    assert_eq!(store.references(&app, "dependencies").unwrap().len(), 1);

    let classes = graph.find_group("Classes").unwrap();
    assert_eq!(store.get_str(&classes, "path").unwrap(), Some("src"));
  }

  #[test]
  fn target_settings_reach_every_configuration() {
    let project = build(HELLO).unwrap();
    let graph = project.graph();
    let store = graph.store();
    let app = graph.find_target("Hello").unwrap().unwrap();
    let list = store.get_reference(&app, "buildConfigurationList").unwrap().unwrap();

    for config in store.references(list, "buildConfigurations").unwrap() {
      let settings = store.get(&config, "buildSettings").unwrap().and_then(Value::as_record).unwrap();
      assert_eq!(settings.get("INFOPLIST_FILE"), Some(&Value::from("Info.plist")));
      assert_eq!(settings.get("GCC_OPTIMIZATION_LEVEL"), Some(&Value::Integer(0)));
    }
  }

  #[test]
  fn unknown_target_names_are_not_found() {
    let text = r#"{ "name": "X", "files": [{ "path": "a.c", "targets": ["Nope"] }] }"#;
    assert!(matches!(build(text), Err(ProjectError::NotFound(_))));

    let text = r#"{ "name": "X", "targets": [{ "name": "a", "kind": "tool", "dependencies": ["b"] }] }"#;
    assert!(matches!(build(text), Err(ProjectError::NotFound(_))));
  }

  #[test]
  fn duplicate_manifest_targets_are_rejected() {
    let text = r#"{ "name": "X", "targets": [{ "name": "a", "kind": "tool" }, { "name": "a", "kind": "tool" }] }"#;
    assert!(matches!(build(text), Err(ProjectError::InvalidArgument(_))));
  }

  #[test]
  fn custom_configurations() {
    let text = r#"{ "name": "X", "configurations": ["Dev", "Prod"] }"#;
    let project = build(text).unwrap();
    assert_eq!(project.graph().configurations(), ["Dev".to_string(), "Prod".to_string()]);
  }

  #[test]
  fn malformed_json_is_a_manifest_error() {
    assert!(matches!(ProjectManifest::from_json("{"), Err(ProjectError::Manifest(_))));
    assert!(matches!(
      ProjectManifest::from_json(r#"{ "name": "X", "colour": "blue" }"#),
      Err(ProjectError::Manifest(_))
    ));
    assert!(matches!(
      ProjectManifest::from_json(r#"{ "name": "" }"#),
      Err(ProjectError::InvalidArgument(_))
    ));
  }

  #[test]
  fn load_reads_from_disk() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("Hello.json");
    fs::write(&path, HELLO).unwrap();

    let manifest = ProjectManifest::load(&path).unwrap();
    assert_eq!(manifest.bundle_name(), "Hello.xcodeproj");
    assert_eq!(manifest.targets.len(), 3);
    assert!(matches!(
      ProjectManifest::load(&temp.path().join("missing.json")),
      Err(ProjectError::Io(_))
    ));
  }

  #[test]
  fn deterministic_output_is_stable() {
    let first = build(HELLO).unwrap().to_pbxproj().unwrap();
    let second = build(HELLO).unwrap().to_pbxproj().unwrap();
    assert_eq!(first, second);
  }
}
