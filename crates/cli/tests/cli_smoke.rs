//! CLI smoke tests for pbxgen.
//!
//! These tests run the binary against manifests and projects written to
//! temporary directories and check exit codes and output.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the pbxgen binary.
fn pbxgen_cmd() -> Command {
  cargo_bin_cmd!("pbxgen")
}

/// Create a temp directory with a manifest file.
fn temp_manifest(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  fs::write(temp.path().join("Hello.json"), content).unwrap();
  temp
}

const HELLO_MANIFEST: &str = r#"{
  "name": "Hello",
  "targets": [
    { "name": "Hello.app", "kind": "application", "dependencies": ["libcore.a"] },
    { "name": "libcore.a", "kind": "static_library" }
  ],
  "files": [
    { "path": "main.m", "group": "Classes", "targets": ["Hello.app"] },
    { "path": "core.c", "group": "Core", "targets": ["libcore.a"] }
  ],
  "frameworks": [{ "name": "Cocoa.framework", "targets": ["Hello.app"] }]
}"#;

fn generate(dir: &Path) {
  pbxgen_cmd()
    .arg("generate")
    .arg(dir.join("Hello.json"))
    .arg("--deterministic")
    .assert()
    .success();
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  pbxgen_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  pbxgen_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("pbxgen"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["generate", "targets"] {
    pbxgen_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// generate
// =============================================================================

#[test]
fn generate_writes_next_to_manifest() {
  let temp = temp_manifest(HELLO_MANIFEST);

  pbxgen_cmd()
    .arg("generate")
    .arg(temp.path().join("Hello.json"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Wrote"));

  let text = fs::read_to_string(temp.path().join("Hello.xcodeproj/project.pbxproj")).unwrap();
  assert!(text.starts_with("// !$*UTF8*$!"));
  assert!(text.contains("isa = PBXNativeTarget;"));
}

#[test]
fn generate_to_explicit_output() {
  let temp = temp_manifest(HELLO_MANIFEST);
  let out = temp.path().join("build/Other.xcodeproj");

  pbxgen_cmd()
    .arg("generate")
    .arg(temp.path().join("Hello.json"))
    .arg("-o")
    .arg(&out)
    .assert()
    .success();

  assert!(out.join("project.pbxproj").exists());
}

#[test]
fn output_elsewhere_keeps_paths_relative_to_manifest() {
  let temp = temp_manifest(HELLO_MANIFEST);
  generate(temp.path());

  let app_manifest = r#"{
    "name": "App",
    "targets": [{
      "name": "App.app",
      "kind": "application",
      "external_dependencies": [{ "project": "Hello.xcodeproj", "target": "libcore" }]
    }]
  }"#;
  fs::write(temp.path().join("App.json"), app_manifest).unwrap();
  let out = temp.path().join("build/App.xcodeproj");

  pbxgen_cmd()
    .arg("generate")
    .arg(temp.path().join("App.json"))
    .arg("-o")
    .arg(&out)
    .assert()
    .success();

  let text = fs::read_to_string(out.join("project.pbxproj")).unwrap();
  assert!(text.contains("path = ..;"));
  assert!(text.contains("path = Hello.xcodeproj;"));
}

#[test]
fn deterministic_generation_is_reproducible() {
  let temp = temp_manifest(HELLO_MANIFEST);
  let project = temp.path().join("Hello.xcodeproj/project.pbxproj");

  generate(temp.path());
  let first = fs::read_to_string(&project).unwrap();
  generate(temp.path());
  let second = fs::read_to_string(&project).unwrap();

  assert_eq!(first, second);
}

#[test]
fn generate_nonexistent_manifest_fails() {
  pbxgen_cmd()
    .arg("generate")
    .arg("/nonexistent/path/Hello.json")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
fn generate_unknown_target_fails() {
  let temp = temp_manifest(r#"{ "name": "Hello", "files": [{ "path": "a.c", "targets": ["Ghost"] }] }"#);

  pbxgen_cmd()
    .arg("generate")
    .arg(temp.path().join("Hello.json"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Ghost"));
}

#[test]
fn generate_with_external_dependency() {
  let temp = temp_manifest(HELLO_MANIFEST);
  generate(temp.path());

  let app_manifest = r#"{
    "name": "App",
    "targets": [{
      "name": "App.app",
      "kind": "application",
      "external_dependencies": [{ "project": "Hello.xcodeproj", "target": "libcore" }]
    }]
  }"#;
  fs::write(temp.path().join("App.json"), app_manifest).unwrap();

  pbxgen_cmd()
    .arg("generate")
    .arg(temp.path().join("App.json"))
    .assert()
    .success();

  let text = fs::read_to_string(temp.path().join("App.xcodeproj/project.pbxproj")).unwrap();
  assert!(text.contains("PBXReferenceProxy"));
  assert!(text.contains("libcore.a"));
}

// =============================================================================
// targets
// =============================================================================

#[test]
fn targets_lists_generated_targets() {
  let temp = temp_manifest(HELLO_MANIFEST);
  generate(temp.path());

  pbxgen_cmd()
    .arg("targets")
    .arg(temp.path().join("Hello.xcodeproj"))
    .assert()
    .success()
    .stdout(predicate::str::contains("2 targets"))
    .stdout(predicate::str::contains("Hello.app"))
    .stdout(predicate::str::contains("com.apple.product-type.library.static"));
}

#[test]
fn targets_json_output() {
  let temp = temp_manifest(HELLO_MANIFEST);
  generate(temp.path());

  let output = pbxgen_cmd()
    .arg("targets")
    .arg(temp.path().join("Hello.xcodeproj"))
    .arg("--json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let targets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let names: Vec<_> = targets
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["name"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(names, vec!["Hello", "libcore"]);
}

#[test]
fn targets_on_missing_project_fails() {
  let temp = TempDir::new().unwrap();

  pbxgen_cmd()
    .arg("targets")
    .arg(temp.path().join("Missing.xcodeproj"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to read project"));
}
