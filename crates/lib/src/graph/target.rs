//! Aggregate and native targets.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{COMMENT_KEY, NAME_KEY, isa};
use crate::store::ObjectId;
use crate::util::path::strip_extension;
use crate::value::{Record, Value, field};
use crate::{ProjectError, Result};

use super::{ProjectGraph, ShellScript};

/// The product a native target builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
  Application,
  Tool,
  StaticLibrary,
  Framework,
}

impl ProductKind {
  pub fn product_type(self) -> &'static str {
    match self {
      ProductKind::Application => "com.apple.product-type.application",
      ProductKind::Tool => "com.apple.product-type.tool",
      ProductKind::StaticLibrary => "com.apple.product-type.library.static",
      ProductKind::Framework => "com.apple.product-type.framework",
    }
  }

  /// `explicitFileType` of the product reference.
  pub fn explicit_file_type(self) -> &'static str {
    match self {
      ProductKind::Application => "wrapper.application",
      ProductKind::Tool => "compiled.mach-o.executable",
      ProductKind::StaticLibrary => "archive.ar",
      ProductKind::Framework => "wrapper.framework",
    }
  }

  pub fn install_path(self) -> &'static str {
    match self {
      ProductKind::Application => "$(HOME)/Applications",
      ProductKind::Tool => "/usr/local/bin",
      ProductKind::StaticLibrary => "/usr/local/lib",
      ProductKind::Framework => "$(HOME)/Library/Frameworks",
    }
  }

  /// The kind whose `productType` is `product_type`.
  pub fn from_product_type(product_type: &str) -> Option<Self> {
    [
      ProductKind::Application,
      ProductKind::Tool,
      ProductKind::StaticLibrary,
      ProductKind::Framework,
    ]
    .into_iter()
    .find(|kind| kind.product_type() == product_type)
  }
}

const TARGET_CLASSES: &[&str] = &[isa::NATIVE_TARGET, isa::AGGREGATE_TARGET];

impl ProjectGraph {
  /// A target that runs scripts and dependencies without building code.
  pub fn new_aggregate_target(&mut self, name: &str, configuration_list: Option<&ObjectId>) -> Result<ObjectId> {
    let list = self.target_configuration_list(name, configuration_list)?;
    let target = self.store.allocate(
      isa::AGGREGATE_TARGET,
      Record::from([
        field("buildConfigurationList", list),
        field("buildPhases", Value::Array(Vec::new())),
        field("dependencies", Value::Array(Vec::new())),
        field(NAME_KEY, name),
        field("productName", name),
        field(COMMENT_KEY, format!("target {}", name)),
      ]),
    )?;
    self.register_target(&target, name)?;
    Ok(target)
  }

  /// A target building `name` (e.g. `"App.app"`) as a `kind` product.
  ///
  /// The target is named after the product without its extension; the
  /// product reference keeps the full name and joins the products group.
  pub fn new_native_target(
    &mut self,
    name: &str,
    kind: ProductKind,
    configuration_list: Option<&ObjectId>,
  ) -> Result<ObjectId> {
    let list = self.target_configuration_list(name, configuration_list)?;
    let product = self.new_product_file_reference(kind.explicit_file_type(), name, None)?;
    let products_group = self.product_ref_group()?.clone();
    self.attach(&product, &products_group)?;

    let short_name = strip_extension(name);
    let target = self.store.allocate(
      isa::NATIVE_TARGET,
      Record::from([
        field("buildConfigurationList", list),
        field("buildPhases", Value::Array(Vec::new())),
        field("buildRules", Value::Array(Vec::new())),
        field("dependencies", Value::Array(Vec::new())),
        field(NAME_KEY, short_name),
        field("productName", short_name),
        field("productReference", product),
        field("productType", kind.product_type()),
        field("productInstallPath", kind.install_path()),
        field(COMMENT_KEY, format!("target {}", name)),
      ]),
    )?;
    self.register_target(&target, short_name)?;
    Ok(target)
  }

  /// An aggregate target running one shell script.
  pub fn new_shell_script_target(&mut self, name: &str, script: &ShellScript) -> Result<ObjectId> {
    let target = self.new_aggregate_target(name, None)?;
    self.new_shell_script_build_phase(&target, script)?;
    Ok(target)
  }

  fn target_configuration_list(&mut self, name: &str, supplied: Option<&ObjectId>) -> Result<ObjectId> {
    if name.is_empty() {
      return Err(ProjectError::InvalidArgument("target name must not be empty".to_string()));
    }
    self.project()?;
    match supplied {
      Some(list) => {
        self.store.expect_class(list, &[isa::CONFIGURATION_LIST])?;
        Ok(list.clone())
      }
      None => self.new_product_configuration_list(name),
    }
  }

  fn register_target(&mut self, target: &ObjectId, name: &str) -> Result<()> {
    if self.find_target(name)?.is_some() {
      warn!(target = %name, "multiple targets in project have the same name");
    }
    let project = self.project()?.clone();
    self.store.push(&project, "targets", target)?;
    debug!(target = %name, id = %target, "created target");
    Ok(())
  }

  /// The project's targets in creation order.
  pub fn targets(&self) -> Result<Vec<ObjectId>> {
    self.store.references(self.project()?, "targets")
  }

  /// The first target named `name`.
  pub fn find_target(&self, name: &str) -> Result<Option<ObjectId>> {
    for target in self.targets()? {
      if self.store.get_str(&target, NAME_KEY)? == Some(name) {
        return Ok(Some(target));
      }
    }
    Ok(None)
  }

  /// Fail unless `target` is an aggregate or native target.
  pub fn expect_target(&self, target: &ObjectId) -> Result<()> {
    self.store.expect_class(target, TARGET_CLASSES)
  }
}
