//! Target dependencies within the project and across projects.
//!
//! A local dependency is a target-typed proxy scoped to this project plus a
//! `PBXTargetDependency`. An external dependency additionally references the
//! foreign `.xcodeproj` bundle, stands in for its product with a
//! `PBXReferenceProxy` held by a dedicated products group, and registers that
//! group under the project's `projectReferences`.
//!
//! Everything that can fail on caller input (foreign project parsing, target
//! lookup, identity validation) happens before the first mutation, so a failed
//! request leaves the graph untouched.

use tracing::{debug, warn};

use crate::consts::{COMMENT_KEY, NAME_KEY, isa, source_tree};
use crate::reader::{ExternalTarget, ProjectReader};
use crate::store::ObjectId;
use crate::util::path::{dirname, extension};
use crate::value::{Record, Value, field};
use crate::{ProjectError, Result};

use super::ProjectGraph;

const PROJECT_REFERENCES: &str = "projectReferences";
const PROJECT_FILE_TYPE: &str = "wrapper.pb-project";

/// What a container item proxy points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyType {
  Target,
  Product,
}

impl ProxyType {
  pub fn code(self) -> i64 {
    match self {
      ProxyType::Target => 1,
      ProxyType::Product => 2,
    }
  }
}

/// Bundle path for a foreign project given as a bundle or a description file.
fn bundle_path(path: &str) -> Result<String> {
  let bundle = if extension(path) == ".pbxproj" {
    dirname(path).ok_or_else(|| {
      ProjectError::InvalidArgument(format!("'{}' is not inside an .xcodeproj bundle", path))
    })?
  } else {
    path
  };
  if extension(bundle) != ".xcodeproj" {
    warn!(path = %bundle, "external project path does not have an .xcodeproj extension");
  }
  Ok(bundle.to_string())
}

impl ProjectGraph {
  /// A proxy naming `remote` inside `container`.
  ///
  /// `remote` is a reference for entities of this store and a plain string for
  /// identities in a foreign project.
  pub fn new_container_item_proxy(
    &mut self,
    container: &ObjectId,
    remote: Value,
    remote_info: &str,
    proxy_type: ProxyType,
  ) -> Result<ObjectId> {
    self.store.expect_class(container, &[isa::PROJECT, isa::FILE_REFERENCE])?;
    self.store.allocate(
      isa::CONTAINER_ITEM_PROXY,
      Record::from([
        field("containerPortal", container),
        field("proxyType", proxy_type.code()),
        field("remoteGlobalIDString", remote),
        field("remoteInfo", remote_info),
        field(COMMENT_KEY, isa::CONTAINER_ITEM_PROXY),
      ]),
    )
  }

  /// A dependency on `target` of this project.
  pub fn new_local_target_dependency(&mut self, target: &ObjectId) -> Result<ObjectId> {
    self.expect_target(target)?;
    let project = self.project()?.clone();
    let name = self.store.get_str(target, NAME_KEY)?.unwrap_or_default().to_string();

    let proxy = self.new_container_item_proxy(&project, Value::from(target), &name, ProxyType::Target)?;
    self.store.allocate(
      isa::TARGET_DEPENDENCY,
      Record::from([
        field("target", target),
        field("targetProxy", &proxy),
        field(COMMENT_KEY, isa::TARGET_DEPENDENCY),
      ]),
    )
  }

  /// Append existing dependency records to a target.
  pub fn add_target_dependencies(&mut self, target: &ObjectId, dependencies: &[ObjectId]) -> Result<()> {
    self.expect_target(target)?;
    for dependency in dependencies {
      self.store.expect_class(dependency, &[isa::TARGET_DEPENDENCY])?;
    }
    for dependency in dependencies {
      self.store.push(target, "dependencies", dependency)?;
    }
    Ok(())
  }

  /// Make `target` depend on each of `on`, all within this project.
  pub fn add_local_target_dependencies(&mut self, target: &ObjectId, on: &[ObjectId]) -> Result<Vec<ObjectId>> {
    self.expect_target(target)?;
    for other in on {
      self.expect_target(other)?;
      if other == target {
        return Err(ProjectError::InvalidArgument(format!("target {} cannot depend on itself", target)));
      }
    }
    let mut dependencies = Vec::with_capacity(on.len());
    for other in on {
      dependencies.push(self.new_local_target_dependency(other)?);
    }
    self.add_target_dependencies(target, &dependencies)?;
    debug!(target = %target, count = dependencies.len(), "added local dependencies");
    Ok(dependencies)
  }

  /// Wire a dependency record on a target of a foreign project.
  ///
  /// The returned dependency is not yet attached to any target.
  pub fn new_external_target_dependency(&mut self, project_path: &str, remote: &ExternalTarget) -> Result<ObjectId> {
    let target_name = remote.name.as_deref().unwrap_or_default();
    let remote_target = ObjectId::parse(&remote.id)?;
    let remote_product = remote
      .product_reference
      .as_deref()
      .ok_or_else(|| ProjectError::NotFound(format!("product of external target '{}'", target_name)))
      .and_then(ObjectId::parse)?;
    let bundle = bundle_path(project_path)?;
    self.project()?;

    let product_path = remote.product_path();
    let product_type = match remote.product_file_type.as_deref() {
      Some(explicit) => explicit.to_string(),
      None => self.file_types.file_type_for(product_path).to_string(),
    };

    let (project_ref, products_group) = self.external_project_reference(&bundle)?;

    let target_proxy = self.new_container_item_proxy(
      &project_ref,
      Value::from(remote_target.as_str()),
      target_name,
      ProxyType::Target,
    )?;
    if self.find_reference_proxy(&products_group, &remote_product)?.is_none() {
      let product_proxy = self.new_container_item_proxy(
        &project_ref,
        Value::from(remote_product.as_str()),
        remote.product_name.as_deref().unwrap_or(target_name),
        ProxyType::Product,
      )?;
      let product = self.new_reference_proxy(product_path, &product_type, &product_proxy)?;
      self.attach(&product, &products_group)?;
    }

    let dependency = self.store.allocate(
      isa::TARGET_DEPENDENCY,
      Record::from([
        field(NAME_KEY, target_name),
        field("targetProxy", &target_proxy),
        field(COMMENT_KEY, isa::TARGET_DEPENDENCY),
      ]),
    )?;
    debug!(project = %bundle, target = %target_name, "created external dependency");
    Ok(dependency)
  }

  /// Make `target` depend on the target named `target_name` of the project
  /// at `project_path`, read through `reader`.
  pub fn add_external_target_dependency(
    &mut self,
    target: &ObjectId,
    project_path: &str,
    target_name: &str,
    reader: &dyn ProjectReader,
  ) -> Result<ObjectId> {
    self.expect_target(target)?;
    let foreign = reader.read_project(project_path)?;
    let remote = foreign.target_named(target_name).ok_or_else(|| {
      ProjectError::NotFound(format!("target '{}' in external project {}", target_name, project_path))
    })?;
    if remote.product_reference.is_none() {
      return Err(ProjectError::NotFound(format!(
        "product of target '{}' in external project {}",
        target_name, project_path
      )));
    }

    let dependency = self.new_external_target_dependency(project_path, remote)?;
    self.add_target_dependencies(target, std::slice::from_ref(&dependency))?;
    Ok(dependency)
  }

  /// The file reference and products group registered for a foreign bundle,
  /// created on first use.
  fn external_project_reference(&mut self, bundle: &str) -> Result<(ObjectId, ObjectId)> {
    let project = self.project()?.clone();
    let registered = self
      .store
      .get(&project, PROJECT_REFERENCES)?
      .and_then(Value::as_array)
      .unwrap_or_default()
      .iter()
      .filter_map(Value::as_record)
      .filter_map(|entry| {
        let project_ref = entry.get("ProjectRef").and_then(Value::as_reference)?;
        let group = entry.get("ProductGroup").and_then(Value::as_reference)?;
        Some((project_ref.clone(), group.clone()))
      })
      .find(|(project_ref, _)| matches!(self.store.get_str(project_ref, "path"), Ok(Some(p)) if p == bundle));
    if let Some(found) = registered {
      return Ok(found);
    }

    let project_ref = self.new_file_reference(bundle, PROJECT_FILE_TYPE, None)?;
    let root = self.root_group()?;
    self.attach(&project_ref, &root)?;

    let products_group = self.new_group_explicit(Some("Products"), None, None, None)?;
    let entry = Record::from([field("ProductGroup", &products_group), field("ProjectRef", &project_ref)]);
    self.store.push(&project, PROJECT_REFERENCES, entry)?;
    Ok((project_ref, products_group))
  }

  /// The reference proxy in `products_group` standing in for `remote_product`.
  fn find_reference_proxy(&self, products_group: &ObjectId, remote_product: &ObjectId) -> Result<Option<ObjectId>> {
    for child in self.store.references(products_group, "children")? {
      if self.store.class_of(&child)? != isa::REFERENCE_PROXY {
        continue;
      }
      let Some(proxy) = self.store.get_reference(&child, "remoteRef")? else {
        continue;
      };
      if self.store.get_str(proxy, "remoteGlobalIDString")? == Some(remote_product.as_str()) {
        return Ok(Some(child));
      }
    }
    Ok(None)
  }

  /// A stand-in for a product built by another project.
  fn new_reference_proxy(&mut self, path: &str, file_type: &str, remote_ref: &ObjectId) -> Result<ObjectId> {
    self.store.expect_class(remote_ref, &[isa::CONTAINER_ITEM_PROXY])?;
    let proxy_type = self.store.get(remote_ref, "proxyType")?.and_then(Value::as_integer);
    if proxy_type != Some(ProxyType::Product.code()) {
      return Err(ProjectError::InvalidObject {
        id: remote_ref.to_string(),
        reason: "reference proxies need a product proxy".to_string(),
      });
    }
    self.store.allocate(
      isa::REFERENCE_PROXY,
      Record::from([
        field("fileType", file_type),
        field("path", path),
        field("remoteRef", remote_ref),
        field("sourceTree", source_tree::BUILT_PRODUCTS),
        field(COMMENT_KEY, path),
      ]),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::ProductKind;
  use crate::graph::tests::graph;
  use crate::reader::ExternalProject;

  const REMOTE_TARGET: &str = "1A2B3C4D5E6F708192A3B4C5";
  const REMOTE_PRODUCT: &str = "0F1E2D3C4B5A69788796A5B4";

  struct FixedReader(ExternalProject);

  impl ProjectReader for FixedReader {
    fn read_project(&self, _path: &str) -> Result<ExternalProject> {
      Ok(self.0.clone())
    }
  }

  fn foreign() -> FixedReader {
    FixedReader(ExternalProject {
      path: "Lib/Lib.xcodeproj".to_string(),
      root: "AAAAAAAAAAAAAAAAAAAAAAAA".to_string(),
      targets: vec![ExternalTarget {
        id: REMOTE_TARGET.to_string(),
        name: Some("core".to_string()),
        product_name: Some("core".to_string()),
        product_reference: Some(REMOTE_PRODUCT.to_string()),
        product_type: Some("com.apple.product-type.library.static".to_string()),
        product_path: Some("libcore.a".to_string()),
        product_file_type: Some("archive.ar".to_string()),
      }],
    })
  }

  #[test]
  fn local_dependency_wiring() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    let lib = graph.new_native_target("libcore.a", ProductKind::StaticLibrary, None).unwrap();
    let deps = graph.add_local_target_dependencies(&app, &[lib.clone()]).unwrap();

    let store = graph.store();
    assert_eq!(store.references(&app, "dependencies").unwrap(), deps);
    assert_eq!(store.get_reference(&deps[0], "target").unwrap(), Some(&lib));

    let proxy = store.get_reference(&deps[0], "targetProxy").unwrap().unwrap();
    assert_eq!(store.get_reference(proxy, "containerPortal").unwrap(), Some(graph.project().unwrap()));
    assert_eq!(store.get(proxy, "proxyType").unwrap(), Some(&Value::Integer(1)));
    assert_eq!(store.get_reference(proxy, "remoteGlobalIDString").unwrap(), Some(&lib));
    assert_eq!(store.get_str(proxy, "remoteInfo").unwrap(), Some("libcore"));
  }

  #[test]
  fn self_dependency_is_rejected() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    let before = graph.store().len();
    assert!(graph.add_local_target_dependencies(&app, &[app.clone()]).is_err());
    assert_eq!(graph.store().len(), before);
  }

  #[test]
  fn external_dependency_wiring() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    let dep = graph
      .add_external_target_dependency(&app, "Lib/Lib.xcodeproj", "core", &foreign())
      .unwrap();
    let store = graph.store();

    assert_eq!(store.references(&app, "dependencies").unwrap(), vec![dep.clone()]);
    assert_eq!(store.get_str(&dep, NAME_KEY).unwrap(), Some("core"));
    assert!(!store.has(&dep, "target").unwrap());

    let target_proxy = store.get_reference(&dep, "targetProxy").unwrap().unwrap();
    assert_eq!(store.get_str(target_proxy, "remoteGlobalIDString").unwrap(), Some(REMOTE_TARGET));

    let project_ref = store.get_reference(target_proxy, "containerPortal").unwrap().unwrap();
    assert_eq!(store.get_str(project_ref, "lastKnownFileType").unwrap(), Some("wrapper.pb-project"));
    assert_eq!(graph.parent_group(project_ref).unwrap(), Some(graph.root_group().unwrap()));

    let [reference_proxy]: [ObjectId; 1] = store.find_all(isa::REFERENCE_PROXY).try_into().unwrap();
    assert_eq!(store.get_str(&reference_proxy, "path").unwrap(), Some("libcore.a"));
    assert_eq!(store.get_str(&reference_proxy, "fileType").unwrap(), Some("archive.ar"));
    let product_proxy = store.get_reference(&reference_proxy, "remoteRef").unwrap().unwrap();
    assert_eq!(store.get(product_proxy, "proxyType").unwrap(), Some(&Value::Integer(2)));
    assert_eq!(store.get_str(product_proxy, "remoteGlobalIDString").unwrap(), Some(REMOTE_PRODUCT));

    let project = graph.project().unwrap();
    let entries = store.get(project, PROJECT_REFERENCES).unwrap().and_then(Value::as_array).unwrap();
    assert_eq!(entries.len(), 1);
    let group = entries[0].as_record().unwrap().get("ProductGroup").and_then(Value::as_reference).unwrap();
    assert_eq!(store.references(group, "children").unwrap(), vec![reference_proxy]);
    assert!(store.dangling_references().is_empty());
  }

  #[test]
  fn second_dependency_reuses_project_reference_and_product() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    let tool = graph.new_native_target("tool", ProductKind::Tool, None).unwrap();
    let reader = foreign();
    graph.add_external_target_dependency(&app, "Lib/Lib.xcodeproj", "core", &reader).unwrap();
    graph
      .add_external_target_dependency(&tool, "Lib/Lib.xcodeproj/project.pbxproj", "core", &reader)
      .unwrap();

    let project = graph.project().unwrap();
    let entries = graph.store().get(project, PROJECT_REFERENCES).unwrap().and_then(Value::as_array).unwrap();
    assert_eq!(entries.len(), 1);
    let bundles = graph
      .store()
      .find_all(isa::FILE_REFERENCE)
      .into_iter()
      .filter(|f| graph.store().get_str(f, "path").unwrap() == Some("Lib/Lib.xcodeproj"))
      .count();
    assert_eq!(bundles, 1);

    let store = graph.store();
    assert_eq!(store.find_all(isa::REFERENCE_PROXY).len(), 1);
    let product_proxies = store
      .find_all(isa::CONTAINER_ITEM_PROXY)
      .into_iter()
      .filter(|p| store.get_str(p, "remoteGlobalIDString").unwrap() == Some(REMOTE_PRODUCT))
      .count();
    assert_eq!(product_proxies, 1);
    assert!(store.dangling_references().is_empty());
  }

  #[test]
  fn missing_external_target_leaves_store_unchanged() {
    let mut graph = graph();
    let app = graph.new_native_target("App.app", ProductKind::Application, None).unwrap();
    let before = graph.to_pbxproj().unwrap();
    let count = graph.store().len();

    let err = graph
      .add_external_target_dependency(&app, "Lib/Lib.xcodeproj", "nope", &foreign())
      .unwrap_err();
    assert!(matches!(err, ProjectError::NotFound(_)));
    assert_eq!(graph.store().len(), count);
    assert_eq!(graph.to_pbxproj().unwrap(), before);
  }

  #[test]
  fn malformed_foreign_identities_are_rejected_before_mutation() {
    let mut graph = graph();
    let count = graph.store().len();
    let mut remote = foreign().0.targets.remove(0);
    remote.id = "not-an-id".to_string();

    let err = graph.new_external_target_dependency("Lib/Lib.xcodeproj", &remote).unwrap_err();
    assert!(matches!(err, ProjectError::InvalidArgument(_)));
    assert_eq!(graph.store().len(), count);
  }

  #[test]
  fn reference_proxy_requires_product_proxy() {
    let mut graph = graph();
    let project = graph.project().unwrap().clone();
    let target_proxy = graph
      .new_container_item_proxy(&project, Value::from(REMOTE_TARGET), "core", ProxyType::Target)
      .unwrap();
    let err = graph.new_reference_proxy("libcore.a", "archive.ar", &target_proxy).unwrap_err();
    assert!(matches!(err, ProjectError::InvalidObject { .. }));
  }
}
