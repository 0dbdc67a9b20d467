//! Implementation of the `pbxgen generate` command.
//!
//! Loads a JSON manifest, builds the project graph it describes and writes
//! `project.pbxproj` into the output bundle.
//!
//! Manifest paths are relative to the manifest. When the bundle is written
//! somewhere else, the main group is pointed back at the manifest directory
//! so sources and external projects still resolve from the new location.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use pbxgen_lib::manifest::{ProjectManifest, build_project};
use pbxgen_lib::reader::PbxprojReader;
use pbxgen_lib::store::IdGenerator;

use crate::output::{format_count, print_stat, print_success};

pub fn cmd_generate(manifest_path: &Path, output: Option<&Path>, deterministic: bool, verbose: bool) -> Result<()> {
  let mut manifest = ProjectManifest::load(manifest_path)
    .with_context(|| format!("Failed to load manifest: {}", manifest_path.display()))?;

  let manifest_dir = parent_dir(manifest_path);
  let bundle: PathBuf = match output {
    Some(path) => path.to_path_buf(),
    None => manifest_dir.join(manifest.bundle_name()),
  };
  if manifest.project_root.is_none() {
    manifest.project_root = manifest_root(manifest_dir, &bundle).context("Failed to resolve output location")?;
  }

  let ids = if deterministic {
    IdGenerator::deterministic()
  } else {
    IdGenerator::from_env()
  };
  debug!(manifest = ?manifest_path, bundle = ?bundle, deterministic, "generating project");
  let reader = PbxprojReader::with_base_dir(manifest_dir);
  let mut project = build_project(&manifest, ids, &reader)
    .with_context(|| format!("Failed to build project '{}'", manifest.name))?;

  let written = project
    .write(&bundle)
    .with_context(|| format!("Failed to write project: {}", bundle.display()))?;

  print_success(&format!("Wrote {}", written.display()));
  if verbose {
    let graph = project.graph();
    let targets = graph.targets().context("Failed to list targets")?;
    print_stat("Targets", &format_count(targets.len(), "target"));
    print_stat("Objects", &format_count(graph.store().len(), "object"));
  }
  Ok(())
}

fn parent_dir(path: &Path) -> &Path {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  }
}

fn normalized(path: &Path) -> Vec<Component<'_>> {
  let mut components = Vec::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir if matches!(components.last(), Some(Component::Normal(_))) => {
        components.pop();
      }
      other => components.push(other),
    }
  }
  components
}

/// `manifest_dir` as seen from the directory holding `bundle`, `None` when
/// both are the same directory.
fn manifest_root(manifest_dir: &Path, bundle: &Path) -> Result<Option<String>> {
  let from = std::path::absolute(parent_dir(bundle))?;
  let to = std::path::absolute(manifest_dir)?;
  let from = normalized(&from);
  let to = normalized(&to);

  if from.first() != to.first() {
    let absolute: PathBuf = to.iter().collect();
    return Ok(Some(absolute.to_string_lossy().into_owned()));
  }
  let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
  let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
  parts.extend(to[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
  if parts.is_empty() {
    return Ok(None);
  }
  Ok(Some(parts.join("/")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bundle_next_to_manifest_needs_no_root() {
    let root = manifest_root(Path::new("/work/app"), Path::new("/work/app/App.xcodeproj")).unwrap();
    assert_eq!(root, None);
  }

  #[test]
  fn nested_output_points_back_up() {
    let root = manifest_root(Path::new("/work/app"), Path::new("/work/app/build/Other.xcodeproj")).unwrap();
    assert_eq!(root.as_deref(), Some(".."));
  }

  #[test]
  fn sibling_output_walks_across() {
    let root = manifest_root(Path::new("/work/./app"), Path::new("/work/out/../dist/App.xcodeproj")).unwrap();
    assert_eq!(root.as_deref(), Some("../app"));
  }

  #[test]
  fn bare_file_names_use_current_directory() {
    assert_eq!(parent_dir(Path::new("Hello.json")), Path::new("."));
    assert_eq!(parent_dir(Path::new("dir/Hello.json")), Path::new("dir"));
  }
}
