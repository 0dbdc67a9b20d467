use pbxgen_lib::graph::ShellScript;
use pbxgen_lib::reader::parse::PlistValue;
use pbxgen_lib::reader::{PbxprojReader, ProjectReader};
use tempfile::TempDir;

use super::common::{objects, of_class, project, str_of};

#[test]
fn single_application_renders_expected_entities() {
  let mut project = project();
  project.new_group("Classes", None).unwrap();
  let app = project.new_application_target("App.app").unwrap();
  project.new_source_file("main.m", "Classes", &[app]).unwrap();

  let text = project.to_pbxproj().unwrap();
  assert!(text.starts_with("// !$*UTF8*$!\n{\n"));
  let objects = objects(&text);

  assert_eq!(of_class(&objects, "PBXProject").len(), 1);

  let classes: Vec<_> = of_class(&objects, "PBXGroup")
    .into_iter()
    .filter(|(_, g)| str_of(g, "name") == Some("Classes"))
    .collect();
  assert_eq!(classes.len(), 1);

  let targets = of_class(&objects, "PBXNativeTarget");
  assert_eq!(targets.len(), 1);
  assert_eq!(str_of(targets[0].1, "name"), Some("App"));
  assert_eq!(str_of(targets[0].1, "productType"), Some("com.apple.product-type.application"));

  let main: Vec<_> = of_class(&objects, "PBXFileReference")
    .into_iter()
    .filter(|(_, f)| str_of(f, "path") == Some("main.m"))
    .collect();
  assert_eq!(main.len(), 1);
  let main_id = main[0].0;

  let build_files = of_class(&objects, "PBXBuildFile");
  assert_eq!(build_files.len(), 1);
  assert_eq!(str_of(build_files[0].1, "fileRef"), Some(main_id));

  let phases = of_class(&objects, "PBXSourcesBuildPhase");
  assert_eq!(phases.len(), 1);
  let files = phases[0].1.get("files").and_then(PlistValue::as_array).unwrap();
  assert_eq!(files, &[PlistValue::String(build_files[0].0.to_string())][..]);
}

#[test]
fn every_reference_resolves_in_rendered_text() {
  let mut project = project();
  let app = project.new_application_target("App.app").unwrap();
  let lib = project.new_static_library_target("libcore.a").unwrap();
  project.new_source_file("core.c", "Core", std::slice::from_ref(&lib)).unwrap();
  project.new_framework("Cocoa.framework", std::slice::from_ref(&app)).unwrap();
  project
    .new_localized_resource("MainMenu.xib", &["English.lproj", "French.lproj"], "Resources", std::slice::from_ref(&app))
    .unwrap();
  project.add_local_target_dependencies(&app, &[lib]).unwrap();
  project
    .new_shell_script_target("Codegen", &ShellScript::new("Codegen", "echo \"hi\"\nexit 0"))
    .unwrap();

  let text = project.to_pbxproj().unwrap();
  let objects = objects(&text);
  let id_keys = [
    "fileRef",
    "target",
    "targetProxy",
    "containerPortal",
    "productReference",
    "buildConfigurationList",
    "mainGroup",
    "productRefGroup",
  ];
  for (id, object) in &objects {
    for key in id_keys {
      if let Some(target) = str_of(object, key) {
        assert!(objects.contains_key(target), "{}.{} -> {} is dangling", id, key, target);
      }
    }
  }

  let scripts = of_class(&objects, "PBXShellScriptBuildPhase");
  assert_eq!(str_of(scripts[0].1, "shellScript"), Some("echo \"hi\"\nexit 0"));
}

#[test]
fn written_projects_read_back() {
  let temp = TempDir::new().unwrap();
  let mut project = project();
  let tool = project.new_tool_target("mytool").unwrap();
  project.new_source_file("main.c", "Sources", &[tool]).unwrap();

  let bundle = temp.path().join("Tool.xcodeproj");
  let written = project.write(&bundle).unwrap();
  assert_eq!(written, bundle.join("project.pbxproj"));

  let foreign = PbxprojReader::new().read_project(&bundle.to_string_lossy()).unwrap();
  assert_eq!(foreign.root, project.project().unwrap().to_string());
  let target = foreign.target_named("mytool").unwrap();
  assert_eq!(target.product_type.as_deref(), Some("com.apple.product-type.tool"));
  assert_eq!(target.product_path(), "mytool");
  assert_eq!(target.product_file_type.as_deref(), Some("compiled.mach-o.executable"));
}

#[test]
fn rendering_twice_is_identical() {
  let mut project = project();
  let app = project.new_application_target("App.app").unwrap();
  project.new_source_file("main.m", "Classes", &[app]).unwrap();

  let first = project.to_pbxproj().unwrap();
  let second = project.to_pbxproj().unwrap();
  assert_eq!(first, second);
}
