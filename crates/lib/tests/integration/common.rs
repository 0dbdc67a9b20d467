//! Shared helpers for integration tests.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use pbxgen_lib::XcodeProject;
use pbxgen_lib::graph::ProjectOptions;
use pbxgen_lib::reader::parse::{PlistValue, parse};
use pbxgen_lib::store::IdGenerator;

/// A fresh project with reproducible identities.
pub fn project() -> XcodeProject {
  XcodeProject::with_ids(IdGenerator::deterministic(), ProjectOptions::default()).unwrap()
}

/// Parse rendered text and return its objects table.
pub fn objects(text: &str) -> IndexMap<String, PlistValue> {
  let document = parse(text).unwrap();
  document.get("objects").and_then(PlistValue::as_dictionary).unwrap().clone()
}

/// Objects of one class.
pub fn of_class<'a>(objects: &'a IndexMap<String, PlistValue>, class: &str) -> Vec<(&'a str, &'a PlistValue)> {
  objects
    .iter()
    .filter(|(_, object)| object.get("isa").and_then(PlistValue::as_str) == Some(class))
    .map(|(id, object)| (id.as_str(), object))
    .collect()
}

pub fn str_of<'a>(object: &'a PlistValue, key: &str) -> Option<&'a str> {
  object.get(key).and_then(PlistValue::as_str)
}

/// Write `text` as `<dir>/<bundle>/project.pbxproj`.
pub fn write_bundle(dir: &Path, bundle: &str, text: &str) {
  let bundle = dir.join(bundle);
  fs::create_dir_all(&bundle).unwrap();
  fs::write(bundle.join("project.pbxproj"), text).unwrap();
}
