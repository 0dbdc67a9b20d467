//! In-session project registry.
//!
//! Projects generated in the same session can depend on each other before any
//! of them is written to disk. The registry keeps a summary of each registered
//! project under a case-insensitive name and answers [`ProjectReader`] queries
//! for their bundle paths, delegating everything else to a [`PbxprojReader`].

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::consts::PROJECT_FILE_NAME;
use crate::graph::ProjectGraph;
use crate::reader::{ExternalProject, PbxprojReader, ProjectReader};
use crate::util::path::{basename, dirname};
use crate::{ProjectError, Result};

/// Case-insensitive name → project summary map.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
  projects: BTreeMap<String, ExternalProject>,
  fallback: PbxprojReader,
}

/// `Foo.xcodeproj/project.pbxproj` and `Foo.xcodeproj/` both name `Foo.xcodeproj`.
fn bundle_key(path: &str) -> &str {
  let trimmed = path.trim_end_matches('/');
  if basename(trimmed) == PROJECT_FILE_NAME {
    return dirname(trimmed).unwrap_or(trimmed);
  }
  trimmed
}

impl ProjectRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Delegate unregistered paths to `reader`.
  pub fn with_fallback(reader: PbxprojReader) -> Self {
    Self {
      projects: BTreeMap::new(),
      fallback: reader,
    }
  }

  /// Register `project` under `name`, replacing any project already
  /// registered under the same name in any letter case.
  pub fn register(&mut self, name: &str, project: ExternalProject) -> Result<()> {
    if name.trim().is_empty() {
      return Err(ProjectError::InvalidArgument("project name must not be empty".to_string()));
    }
    let key = name.to_lowercase();
    if self.projects.contains_key(&key) {
      warn!(project = %name, "replacing registered project");
    }
    debug!(project = %name, path = %project.path, targets = project.targets.len(), "registered project");
    self.projects.insert(key, project);
    Ok(())
  }

  /// Summarize `graph` and register it as the project at `path`.
  pub fn register_graph(&mut self, name: &str, path: &str, graph: &ProjectGraph) -> Result<()> {
    let project = ExternalProject::from_graph(bundle_key(path), graph)?;
    self.register(name, project)
  }

  pub fn get(&self, name: &str) -> Option<&ExternalProject> {
    self.projects.get(&name.to_lowercase())
  }

  /// Registered names, lowercased and sorted.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.projects.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }

  /// The registered project whose bundle is `path`.
  pub fn find_by_path(&self, path: &str) -> Option<&ExternalProject> {
    let wanted = bundle_key(path);
    self.projects.values().find(|p| bundle_key(&p.path) == wanted)
  }
}

impl ProjectReader for ProjectRegistry {
  fn read_project(&self, path: &str) -> Result<ExternalProject> {
    match self.find_by_path(path) {
      Some(project) => {
        debug!(path = %path, "external project answered from registry");
        Ok(project.clone())
      }
      None => self.fallback.read_project(path),
    }
  }
}
