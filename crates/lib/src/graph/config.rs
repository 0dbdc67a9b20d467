//! Build configurations and configuration lists.
//!
//! Every list holds one configuration per configured name (`Debug`, `Release`
//! unless the caller replaced the set). When the canonical names are absent the
//! debug selection falls back to the first name and the release selection to
//! the last.

use tracing::debug;

use crate::consts::{COMMENT_KEY, DEFAULT_CONFIGURATIONS, NAME_KEY, isa, settings};
use crate::store::ObjectId;
use crate::util::path::strip_extension;
use crate::value::{Record, Value, field, references};
use crate::{ProjectError, Result};

use super::ProjectGraph;

/// Which configurations of a list an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigurationSelector {
  #[default]
  All,
  Named(String),
}

impl ConfigurationSelector {
  pub fn matches(&self, name: &str) -> bool {
    match self {
      ConfigurationSelector::All => true,
      ConfigurationSelector::Named(wanted) => wanted == name,
    }
  }
}

impl From<&str> for ConfigurationSelector {
  /// `"*"` selects every configuration.
  fn from(name: &str) -> Self {
    if name == "*" {
      ConfigurationSelector::All
    } else {
      ConfigurationSelector::Named(name.to_string())
    }
  }
}

impl From<Option<&str>> for ConfigurationSelector {
  fn from(name: Option<&str>) -> Self {
    name.map(ConfigurationSelector::from).unwrap_or_default()
  }
}

impl ProjectGraph {
  /// Replace the configuration names used by lists created from now on.
  pub fn set_configurations<S: AsRef<str>>(&mut self, names: impl IntoIterator<Item = S>) -> Result<()> {
    let names: Vec<String> = names.into_iter().map(|s| s.as_ref().to_string()).collect();
    if names.is_empty() {
      return Err(ProjectError::InvalidArgument(
        "at least one configuration name is required".to_string(),
      ));
    }
    if let Some(blank) = names.iter().find(|n| n.is_empty()) {
      return Err(ProjectError::InvalidArgument(format!(
        "configuration name '{}' must not be empty",
        blank
      )));
    }
    self.configurations = names;
    Ok(())
  }

  pub fn configurations(&self) -> &[String] {
    &self.configurations
  }

  /// `Debug` when configured, else the first configuration name.
  pub fn debug_configuration(&self) -> &str {
    self.select_configuration(DEFAULT_CONFIGURATIONS[0], self.configurations.first())
  }

  /// `Release` when configured, else the last configuration name.
  pub fn release_configuration(&self) -> &str {
    self.select_configuration(DEFAULT_CONFIGURATIONS[1], self.configurations.last())
  }

  fn select_configuration<'a>(&'a self, canonical: &'a str, fallback: Option<&'a String>) -> &'a str {
    if self.configurations.iter().any(|c| c == canonical) {
      canonical
    } else {
      fallback.map(String::as_str).unwrap_or(canonical)
    }
  }

  fn copy_phase_strip(&self, name: &str) -> &'static str {
    if name == self.debug_configuration() { "NO" } else { "YES" }
  }

  /// Create one `XCBuildConfiguration` with the given settings.
  pub fn new_build_configuration(&mut self, name: &str, build_settings: Record) -> Result<ObjectId> {
    self.store.allocate(
      isa::BUILD_CONFIGURATION,
      Record::from([
        field(NAME_KEY, name),
        field("buildSettings", build_settings),
        field(COMMENT_KEY, name),
      ]),
    )
  }

  /// The project-level list: architecture, language standard and SDK
  /// defaults, plus `PROJECT_ROOT` when a project root is given.
  pub(crate) fn new_project_configuration_list(&mut self, project_root: Option<&str>) -> Result<ObjectId> {
    let names = self.configurations.clone();
    let mut configs = Vec::with_capacity(names.len());
    for name in &names {
      let mut build_settings = Record::from([
        field("ARCHS", "$(ARCHS_STANDARD_32_64_BIT)"),
        field("GCC_C_LANGUAGE_STANDARD", "gnu99"),
        field(settings::COPY_PHASE_STRIP, self.copy_phase_strip(name)),
        field("SDKROOT", "macosx"),
      ]);
      if let Some(root) = project_root {
        build_settings.insert(settings::PROJECT_ROOT.to_string(), Value::from(root));
      }
      configs.push(self.new_build_configuration(name, build_settings)?);
    }
    self.new_configuration_list(&configs, "project configuration")
  }

  /// A target-level list setting `PRODUCT_NAME` to `product_name` without
  /// its extension.
  pub fn new_product_configuration_list(&mut self, product_name: &str) -> Result<ObjectId> {
    let names = self.configurations.clone();
    let mut configs = Vec::with_capacity(names.len());
    for name in &names {
      let build_settings = Record::from([
        field(settings::COPY_PHASE_STRIP, self.copy_phase_strip(name)),
        field(settings::PRODUCT_NAME, strip_extension(product_name)),
      ]);
      configs.push(self.new_build_configuration(name, build_settings)?);
    }
    self.new_configuration_list(&configs, &format!("for target {}", product_name))
  }

  fn new_configuration_list(&mut self, configs: &[ObjectId], comment: &str) -> Result<ObjectId> {
    let release = self.release_configuration().to_string();
    let list = self.store.allocate(
      isa::CONFIGURATION_LIST,
      Record::from([
        field("buildConfigurations", references(configs)),
        field("defaultConfigurationIsVisible", 0),
        field("defaultConfigurationName", release),
        field(COMMENT_KEY, comment),
      ]),
    )?;
    debug!(list = %list, comment = %comment, "created configuration list");
    Ok(list)
  }

  /// Write `key = value` into every configuration of a list.
  pub fn set_setting_in_configuration_list(
    &mut self,
    list: &ObjectId,
    key: &str,
    value: impl Into<Value>,
  ) -> Result<()> {
    self.store.expect_class(list, &[isa::CONFIGURATION_LIST])?;
    let value = value.into();
    for config in self.store.references(list, "buildConfigurations")? {
      self.build_settings_mut(&config)?.insert(key.to_string(), value.clone());
    }
    Ok(())
  }

  /// Base the project's configurations on an xcconfig file reference.
  ///
  /// With `clear`, inline settings are dropped except `PROJECT_ROOT`.
  pub fn set_project_configuration_file(
    &mut self,
    xcconfig: &ObjectId,
    selector: &ConfigurationSelector,
    clear: bool,
  ) -> Result<()> {
    let list = self.project_configuration_list()?;
    self.set_configuration_file(&list, xcconfig, selector, clear, true)
  }

  /// Base a target's configurations on an xcconfig file reference.
  ///
  /// With `clear`, every inline setting is dropped.
  pub fn set_target_configuration_file(
    &mut self,
    target: &ObjectId,
    xcconfig: &ObjectId,
    selector: &ConfigurationSelector,
    clear: bool,
  ) -> Result<()> {
    self.expect_target(target)?;
    let list = self
      .store
      .get_reference(target, "buildConfigurationList")?
      .cloned()
      .ok_or_else(|| ProjectError::InvalidObject {
        id: target.to_string(),
        reason: "target has no configuration list".to_string(),
      })?;
    self.set_configuration_file(&list, xcconfig, selector, clear, false)
  }

  fn set_configuration_file(
    &mut self,
    list: &ObjectId,
    xcconfig: &ObjectId,
    selector: &ConfigurationSelector,
    clear: bool,
    keep_project_root: bool,
  ) -> Result<()> {
    self.store.expect_class(xcconfig, &[isa::FILE_REFERENCE])?;
    self.store.expect_class(list, &[isa::CONFIGURATION_LIST])?;

    for config in self.store.references(list, "buildConfigurations")? {
      let selected = self
        .store
        .get_str(&config, NAME_KEY)?
        .is_some_and(|name| selector.matches(name));
      if !selected {
        continue;
      }
      self.store.set(&config, "baseConfigurationReference", xcconfig)?;
      if clear {
        let kept = if keep_project_root {
          self.build_settings_mut(&config)?.get(settings::PROJECT_ROOT).cloned()
        } else {
          None
        };
        let mut cleared = Record::new();
        if let Some(root) = kept {
          cleared.insert(settings::PROJECT_ROOT.to_string(), root);
        }
        self.store.set(&config, "buildSettings", cleared)?;
      }
    }
    Ok(())
  }

  fn build_settings_mut(&mut self, config: &ObjectId) -> Result<&mut Record> {
    if !self.store.has(config, "buildSettings")? {
      self.store.set(config, "buildSettings", Record::new())?;
    }
    self
      .store
      .get_mut(config, "buildSettings")?
      .and_then(Value::as_record_mut)
      .ok_or_else(|| ProjectError::InvalidObject {
        id: config.to_string(),
        reason: "buildSettings is not a record".to_string(),
      })
  }
}
