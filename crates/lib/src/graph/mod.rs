//! Project graph construction.
//!
//! [`ProjectGraph`] owns the object store and every rule for wiring entities
//! together: the project singleton, the group tree, file references, targets,
//! build phases, configurations and dependencies.
//!
//! # Lifecycle
//!
//! A graph starts in the *building* state. [`ProjectGraph::finish`] attaches
//! the deferred products group to the main group and moves the graph to the
//! *finished* state; calling it again does nothing. Rendering always finishes
//! the graph first.
//!
//! # Submodules
//!
//! - [`config`] - build configurations, configuration lists, xcconfig files
//! - [`dependency`] - container item proxies and local/external dependencies
//! - [`file`] - file references, variant groups, adding files to targets
//! - [`group`] - group path resolution and attachment
//! - [`phase`] - memoized build phases and build files
//! - [`target`] - aggregate and native targets

pub mod config;
pub mod dependency;
pub mod file;
pub mod group;
pub mod phase;
pub mod target;

pub use config::ConfigurationSelector;
pub use dependency::ProxyType;
pub use file::{FileRole, FileSpec, TextEncoding};
pub use group::GroupSpec;
pub use phase::{BuildPhaseKind, CopyFilesOptions, ShellScript};
pub use target::ProductKind;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{
  COMMENT_KEY, COMPATIBILITY_VERSION, DEFAULT_CONFIGURATIONS, DEFAULT_DEVELOPMENT_REGION, isa,
};
use crate::filetypes::FileTypes;
use crate::store::{IdGenerator, ObjectId, ObjectStore};
use crate::value::{Record, Value, field, strings};
use crate::{ProjectError, Result, writer};

/// Options for [`ProjectGraph::new_project`].
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
  /// `ORGANIZATIONNAME` attribute; empty when unset.
  pub organization: Option<String>,
  /// Development region; defaults to `en`.
  pub development_region: Option<String>,
  /// Known regions; defaults to the development region alone.
  pub known_regions: Option<Vec<String>>,
  /// Path of the main group and `PROJECT_ROOT` build setting.
  pub project_root: Option<String>,
  pub product_dir_path: Option<String>,
  /// Project-wide `.xcconfig`, added to the main group.
  pub xcconfig: Option<String>,
}

/// The authoritative in-memory graph of one project.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
  store: ObjectStore,
  file_types: FileTypes,
  configurations: Vec<String>,
  root_object: Option<ObjectId>,
  product_ref_group: Option<ObjectId>,
  finished: bool,
}

impl ProjectGraph {
  /// A graph whose identity generator honours `PBXGEN_DETERMINISTIC_IDS`.
  pub fn new() -> Self {
    Self::with_ids(IdGenerator::from_env())
  }

  pub fn with_ids(ids: IdGenerator) -> Self {
    Self {
      store: ObjectStore::new(ids),
      file_types: FileTypes::default(),
      configurations: DEFAULT_CONFIGURATIONS.iter().map(|s| s.to_string()).collect(),
      root_object: None,
      product_ref_group: None,
      finished: false,
    }
  }

  pub fn store(&self) -> &ObjectStore {
    &self.store
  }

  /// Direct store access for properties the graph has no helper for.
  pub fn store_mut(&mut self) -> &mut ObjectStore {
    &mut self.store
  }

  pub fn file_types(&self) -> &FileTypes {
    &self.file_types
  }

  pub fn file_types_mut(&mut self) -> &mut FileTypes {
    &mut self.file_types
  }

  /// Create the project singleton with its main group, deferred products
  /// group and project configuration list.
  ///
  /// The first project created becomes the graph's root object.
  pub fn new_project(&mut self, options: ProjectOptions) -> Result<ObjectId> {
    let region = options
      .development_region
      .clone()
      .unwrap_or_else(|| DEFAULT_DEVELOPMENT_REGION.to_string());
    let known_regions = options.known_regions.clone().unwrap_or_else(|| vec![region.clone()]);
    let project_root = options.project_root.as_deref();

    let config_list = self.new_project_configuration_list(project_root)?;
    let main_group = self.new_group_explicit(None, None, project_root, None)?;
    let products_group = self.new_group_explicit(Some("Products"), None, None, None)?;

    let attributes = Record::from([field(
      "ORGANIZATIONNAME",
      options.organization.clone().unwrap_or_default(),
    )]);

    let project = self.store.allocate(
      isa::PROJECT,
      Record::from([
        field("attributes", attributes),
        field("buildConfigurationList", &config_list),
        field("compatibilityVersion", COMPATIBILITY_VERSION),
        field("developmentRegion", region),
        field("hasScannedForEncodings", 0),
        field("knownRegions", strings(&known_regions)),
        field("mainGroup", &main_group),
        field("productRefGroup", &products_group),
        field("productDirPath", options.product_dir_path.clone().unwrap_or_default()),
        field("projectRoot", project_root.unwrap_or_default()),
        field("targets", Value::Array(Vec::new())),
        field(COMMENT_KEY, "Project object"),
      ]),
    )?;

    if self.root_object.is_none() {
      self.root_object = Some(project.clone());
      self.product_ref_group = Some(products_group);
    }
    debug!(project = %project, "created project");

    if let Some(xcconfig) = options.xcconfig.as_deref() {
      let fref = self.add_file(FileSpec::new(xcconfig, main_group, FileRole::Ignored))?;
      self.set_project_configuration_file(&fref, &ConfigurationSelector::All, true)?;
    }

    Ok(project)
  }

  /// The root project.
  pub fn project(&self) -> Result<&ObjectId> {
    self
      .root_object
      .as_ref()
      .ok_or_else(|| ProjectError::NotFound("no project has been created".to_string()))
  }

  /// The project's main group.
  pub fn root_group(&self) -> Result<ObjectId> {
    let project = self.project()?;
    self
      .store
      .get_reference(project, "mainGroup")?
      .cloned()
      .ok_or_else(|| ProjectError::NotFound("project has no main group".to_string()))
  }

  /// The group holding target products.
  pub fn product_ref_group(&self) -> Result<&ObjectId> {
    self
      .product_ref_group
      .as_ref()
      .ok_or_else(|| ProjectError::NotFound("no project has been created".to_string()))
  }

  pub fn project_configuration_list(&self) -> Result<ObjectId> {
    let project = self.project()?;
    self
      .store
      .get_reference(project, "buildConfigurationList")?
      .cloned()
      .ok_or_else(|| ProjectError::NotFound("project has no configuration list".to_string()))
  }

  pub fn is_finished(&self) -> bool {
    self.finished
  }

  /// Attach the products group to the main group. Idempotent.
  pub fn finish(&mut self) -> Result<()> {
    if self.finished {
      return Ok(());
    }
    let root = self.root_group()?;
    let products = self.product_ref_group()?.clone();
    self.attach(&products, &root)?;
    self.finished = true;
    debug!("project graph finished");
    Ok(())
  }

  /// Finish the graph and render `project.pbxproj` text.
  pub fn to_pbxproj(&mut self) -> Result<String> {
    self.finish()?;
    writer::serialize(&self.store, self.project()?)
  }

  /// Finish the graph and write `<dir>/project.pbxproj`.
  pub fn write(&mut self, dir: &Path) -> Result<PathBuf> {
    self.finish()?;
    writer::write_project(&self.store, self.project()?, dir)
  }
}

impl Default for ProjectGraph {
  fn default() -> Self {
    Self::new()
  }
}
