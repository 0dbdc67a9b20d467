//! Reading existing projects.
//!
//! Cross-project dependencies need the identities of a foreign project's
//! targets and products. [`ProjectReader`] is the seam: [`PbxprojReader`]
//! parses `project.pbxproj` files from disk, and
//! [`ProjectRegistry`](crate::registry::ProjectRegistry) answers for projects
//! built in the same session.

pub mod parse;

pub use parse::{ParseError, PlistValue};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::consts::{ISA_KEY, NAME_KEY, PROJECT_FILE_NAME, isa};
use crate::graph::ProjectGraph;
use crate::util::path::extension;
use crate::{ProjectError, Result};

/// Source of foreign project summaries.
pub trait ProjectReader {
  /// Summarize the project at `path`, a bundle or its `project.pbxproj`.
  fn read_project(&self, path: &str) -> Result<ExternalProject>;
}

/// One target of a foreign project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalTarget {
  pub id: String,
  pub name: Option<String>,
  pub product_name: Option<String>,
  /// Identity of the product file reference.
  pub product_reference: Option<String>,
  pub product_type: Option<String>,
  /// `path` of the product file reference (`libcore.a`).
  pub product_path: Option<String>,
  /// `explicitFileType` of the product file reference.
  pub product_file_type: Option<String>,
}

impl ExternalTarget {
  /// Product file name, falling back to the product and target names.
  pub fn product_path(&self) -> &str {
    self
      .product_path
      .as_deref()
      .or(self.product_name.as_deref())
      .or(self.name.as_deref())
      .unwrap_or_default()
  }
}

/// The root project of a foreign file and its targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalProject {
  pub path: String,
  /// Identity of the foreign `PBXProject`.
  pub root: String,
  pub targets: Vec<ExternalTarget>,
}

impl ExternalProject {
  /// The target named `name`; the last one wins when names repeat.
  pub fn target_named(&self, name: &str) -> Option<&ExternalTarget> {
    self.targets.iter().rev().find(|t| t.name.as_deref() == Some(name))
  }

  /// Extract the root project and its targets from a parsed document.
  pub fn from_plist(path: &str, document: &PlistValue) -> std::result::Result<Self, String> {
    let root = document
      .get("rootObject")
      .and_then(PlistValue::as_str)
      .ok_or("missing rootObject")?;
    let objects = document.get("objects").ok_or("missing objects table")?;
    let object = |id: &str| objects.get(id);
    let string = |value: &PlistValue, key: &str| value.get(key).and_then(PlistValue::as_str).map(str::to_string);

    let project = object(root).ok_or_else(|| format!("root object {} is not in the objects table", root))?;
    if project.get(ISA_KEY).and_then(PlistValue::as_str) != Some(isa::PROJECT) {
      return Err(format!("root object {} is not a {}", root, isa::PROJECT));
    }

    let mut targets = Vec::new();
    for id in project.get("targets").and_then(PlistValue::as_array).unwrap_or_default() {
      let id = id.as_str().ok_or("target list holds a non-string entry")?;
      let target = object(id).ok_or_else(|| format!("target {} is not in the objects table", id))?;
      let product_reference = string(target, "productReference");
      let product = product_reference.as_deref().and_then(object);

      targets.push(ExternalTarget {
        id: id.to_string(),
        name: string(target, NAME_KEY),
        product_name: string(target, "productName"),
        product_type: string(target, "productType"),
        product_path: product.and_then(|p| string(p, "path")),
        product_file_type: product.and_then(|p| string(p, "explicitFileType").or_else(|| string(p, "lastKnownFileType"))),
        product_reference,
      });
    }

    let mut seen = std::collections::HashSet::new();
    for name in targets.iter().filter_map(|t| t.name.as_deref()) {
      if !seen.insert(name) {
        warn!(project = %path, target = %name, "multiple targets in external project have the same name");
      }
    }

    Ok(Self {
      path: path.to_string(),
      root: root.to_string(),
      targets,
    })
  }

  /// Summarize a project built in this session.
  pub fn from_graph(path: &str, graph: &ProjectGraph) -> Result<Self> {
    let store = graph.store();
    let mut targets = Vec::new();
    for id in graph.targets()? {
      let string = |key: &str| -> Result<Option<String>> { Ok(store.get_str(&id, key)?.map(str::to_string)) };
      let product = store.get_reference(&id, "productReference")?.cloned();
      let (product_path, product_file_type) = match &product {
        Some(product) => (
          store.get_str(product, "path")?.map(str::to_string),
          store.get_str(product, "explicitFileType")?.map(str::to_string),
        ),
        None => (None, None),
      };
      targets.push(ExternalTarget {
        id: id.to_string(),
        name: string(NAME_KEY)?,
        product_name: string("productName")?,
        product_reference: product.map(|p| p.to_string()),
        product_type: string("productType")?,
        product_path,
        product_file_type,
      });
    }
    Ok(Self {
      path: path.to_string(),
      root: graph.project()?.to_string(),
      targets,
    })
  }
}

/// Reads `project.pbxproj` files from disk.
#[derive(Debug, Clone, Default)]
pub struct PbxprojReader {
  base_dir: Option<PathBuf>,
}

impl PbxprojReader {
  pub fn new() -> Self {
    Self::default()
  }

  /// Resolve relative project paths against `dir` instead of the working
  /// directory.
  pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
    Self {
      base_dir: Some(dir.into()),
    }
  }

  /// The description file for a bundle or description path.
  pub fn description_path(&self, path: &str) -> PathBuf {
    let mut resolved = match &self.base_dir {
      Some(base) if Path::new(path).is_relative() => base.join(path),
      _ => PathBuf::from(path),
    };
    if extension(path) == ".xcodeproj" {
      resolved.push(PROJECT_FILE_NAME);
    }
    resolved
  }
}

impl ProjectReader for PbxprojReader {
  fn read_project(&self, path: &str) -> Result<ExternalProject> {
    let file = self.description_path(path);
    let malformed = |message: String| ProjectError::MalformedExternalProject {
      path: file.display().to_string(),
      message,
    };

    let text = fs::read_to_string(&file).map_err(|e| malformed(e.to_string()))?;
    let document = parse::parse(&text).map_err(|e| malformed(e.to_string()))?;
    let project = ExternalProject::from_plist(path, &document).map_err(malformed)?;
    debug!(path = ?file, targets = project.targets.len(), "read external project");
    Ok(project)
  }
}
