use pbxgen_lib::ProjectError;
use pbxgen_lib::reader::PbxprojReader;
use pbxgen_lib::reader::parse::PlistValue;
use pbxgen_lib::registry::ProjectRegistry;
use tempfile::TempDir;

use super::common::{objects, of_class, project, str_of, write_bundle};

/// Write a generated static-library project to `<dir>/Core/Core.xcodeproj`.
fn write_core(dir: &std::path::Path) -> String {
  let mut core = project();
  let lib = core.new_static_library_target("libcore.a").unwrap();
  core.new_source_file("core.c", "Sources", &[lib]).unwrap();
  let text = core.to_pbxproj().unwrap();
  write_bundle(dir, "Core/Core.xcodeproj", &text);
  text
}

#[test]
fn depends_on_generated_project_on_disk() {
  let temp = TempDir::new().unwrap();
  let core_text = write_core(temp.path());
  let core_objects = objects(&core_text);
  let (core_target_id, _) = of_class(&core_objects, "PBXNativeTarget")[0];

  let mut app = project();
  let target = app.new_application_target("App.app").unwrap();
  let reader = PbxprojReader::with_base_dir(temp.path());
  app
    .add_external_target_dependency(&target, "Core/Core.xcodeproj", "libcore", &reader)
    .unwrap();

  let objects = objects(&app.to_pbxproj().unwrap());

  let bundle_refs: Vec<_> = of_class(&objects, "PBXFileReference")
    .into_iter()
    .filter(|(_, f)| str_of(f, "lastKnownFileType") == Some("wrapper.pb-project"))
    .collect();
  assert_eq!(bundle_refs.len(), 1);
  assert_eq!(str_of(bundle_refs[0].1, "path"), Some("Core/Core.xcodeproj"));

  let proxies = of_class(&objects, "PBXReferenceProxy");
  assert_eq!(proxies.len(), 1);
  assert_eq!(str_of(proxies[0].1, "path"), Some("libcore.a"));
  assert_eq!(str_of(proxies[0].1, "fileType"), Some("archive.ar"));

  let item_proxies = of_class(&objects, "PBXContainerItemProxy");
  assert!(
    item_proxies
      .iter()
      .any(|(_, p)| str_of(p, "remoteGlobalIDString") == Some(core_target_id) && str_of(p, "proxyType") == Some("1"))
  );

  let (_, project_object) = of_class(&objects, "PBXProject")[0];
  let references = project_object.get("projectReferences").and_then(PlistValue::as_array).unwrap();
  assert_eq!(references.len(), 1);
  assert_eq!(str_of(&references[0], "ProjectRef"), Some(bundle_refs[0].0));
}

#[test]
fn second_dependency_reuses_project_reference() {
  let temp = TempDir::new().unwrap();
  write_core(temp.path());

  let mut app = project();
  let first = app.new_application_target("App.app").unwrap();
  let second = app.new_tool_target("tool").unwrap();
  let reader = PbxprojReader::with_base_dir(temp.path());
  app
    .add_external_target_dependency(&first, "Core/Core.xcodeproj", "libcore", &reader)
    .unwrap();
  app
    .add_external_target_dependency(&second, "Core/Core.xcodeproj/project.pbxproj", "libcore", &reader)
    .unwrap();

  let objects = objects(&app.to_pbxproj().unwrap());
  let (_, project_object) = of_class(&objects, "PBXProject")[0];
  let references = project_object.get("projectReferences").and_then(PlistValue::as_array).unwrap();
  assert_eq!(references.len(), 1);
  assert_eq!(of_class(&objects, "PBXTargetDependency").len(), 2);
  assert_eq!(of_class(&objects, "PBXReferenceProxy").len(), 1);
}

#[test]
fn unknown_external_target_leaves_graph_untouched() {
  let temp = TempDir::new().unwrap();
  write_core(temp.path());

  let mut app = project();
  let target = app.new_application_target("App.app").unwrap();
  let before = app.graph().store().len();
  let reader = PbxprojReader::with_base_dir(temp.path());

  let err = app
    .add_external_target_dependency(&target, "Core/Core.xcodeproj", "missing", &reader)
    .unwrap_err();
  assert!(matches!(err, ProjectError::NotFound(_)));
  assert_eq!(app.graph().store().len(), before);
}

#[test]
fn malformed_fixture_is_reported() {
  let temp = TempDir::new().unwrap();
  write_bundle(temp.path(), "Broken.xcodeproj", "{ rootObject = ; }");

  let mut app = project();
  let target = app.new_application_target("App.app").unwrap();
  let reader = PbxprojReader::with_base_dir(temp.path());
  let err = app
    .add_external_target_dependency(&target, "Broken.xcodeproj", "core", &reader)
    .unwrap_err();
  assert!(matches!(err, ProjectError::MalformedExternalProject { .. }));
}

#[test]
fn registry_answers_before_disk() {
  let temp = TempDir::new().unwrap();
  let mut core = project();
  core.new_static_library_target("libcore.a").unwrap();

  let mut registry = ProjectRegistry::with_fallback(PbxprojReader::with_base_dir(temp.path()));
  registry
    .register("Core", core.summary("Core/Core.xcodeproj").unwrap())
    .unwrap();

  let mut app = project();
  let target = app.new_application_target("App.app").unwrap();
  app
    .add_external_target_dependency(&target, "Core/Core.xcodeproj", "libcore", &registry)
    .unwrap();

  let objects = objects(&app.to_pbxproj().unwrap());
  assert_eq!(of_class(&objects, "PBXReferenceProxy").len(), 1);
}
