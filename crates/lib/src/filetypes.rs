//! File extension to Xcode file type lookup.
//!
//! The table ships with the common source, resource and bundle types and can
//! be extended by callers (e.g. Qt's `.pro`/`.qrc`/`.ui`). Unknown extensions
//! fall back to the generic `file` type and log a warning; they never fail.

use std::collections::HashMap;

use tracing::warn;

use crate::util::path::extension;

/// File type used for extensions missing from the table.
pub const FALLBACK_FILE_TYPE: &str = "file";

const DEFAULT_FILE_TYPES: &[(&str, &str)] = &[
  (".a", "archive.ar"),
  (".aif", "public.aifc-audio"),
  (".app", "wrapper.application"),
  (".c", "sourcecode.c.c"),
  (".cp", "sourcecode.cpp.cpp"),
  (".cpp", "sourcecode.cpp.cpp"),
  (".dylib", "compiled.mach-o.dylib"),
  (".entitlements", "text.xml"),
  (".framework", "wrapper.framework"),
  (".gif", "image.gif"),
  (".h", "sourcecode.c.h"),
  (".html", "text.html"),
  (".icns", "image.icns"),
  (".jpg", "image.jpeg"),
  (".jpeg", "image.jpeg"),
  (".m", "sourcecode.c.objc"),
  (".md", "net.daringfireball.markdown"),
  (".mm", "sourcecode.cpp.objcpp"),
  (".nib", "wrapper.nib"),
  (".pch", "sourcecode.c.h"),
  (".pdf", "image.pdf"),
  (".php", "text.script.php"),
  (".plist", "text.plist.xml"),
  (".png", "image.png"),
  (".PNG", "image.png"),
  (".py", "text.script.python"),
  (".rb", "text.script.ruby"),
  (".rtf", "text.rtf"),
  (".sh", "text.script.sh"),
  (".storyboard", "file.storyboard"),
  (".strings", "text.plist.strings"),
  (".tiff", "image.tiff"),
  (".tif", "image.tiff"),
  (".txt", "text"),
  (".xcconfig", "text.xcconfig"),
  (".xcodeproj", "wrapper.pb-project"),
  (".xib", "file.xib"),
  ("", FALLBACK_FILE_TYPE),
];

/// Caller-extensible extension → file type table.
#[derive(Debug, Clone)]
pub struct FileTypes {
  types: HashMap<String, String>,
}

impl FileTypes {
  /// An empty table (every lookup falls back).
  pub fn empty() -> Self {
    Self { types: HashMap::new() }
  }

  /// Add or replace one mapping. Extensions include the leading dot.
  pub fn insert(&mut self, extension: &str, file_type: &str) {
    self.types.insert(extension.to_string(), file_type.to_string());
  }

  /// Add or replace several mappings.
  pub fn extend<K, V>(&mut self, mappings: impl IntoIterator<Item = (K, V)>)
  where
    K: AsRef<str>,
    V: AsRef<str>,
  {
    for (ext, file_type) in mappings {
      self.insert(ext.as_ref(), file_type.as_ref());
    }
  }

  /// Exact lookup without fallback or diagnostics.
  pub fn get(&self, extension: &str) -> Option<&str> {
    self.types.get(extension).map(String::as_str)
  }

  /// File type for a path, falling back to [`FALLBACK_FILE_TYPE`].
  pub fn file_type_for(&self, path: &str) -> &str {
    let ext = extension(path);
    match self.get(ext) {
      Some(file_type) => file_type,
      None => {
        warn!(
          extension = %ext,
          path = %path,
          "unrecognized file extension; add it to the file type table"
        );
        FALLBACK_FILE_TYPE
      }
    }
  }
}

impl Default for FileTypes {
  fn default() -> Self {
    let mut table = Self::empty();
    table.extend(DEFAULT_FILE_TYPES.iter().copied());
    table
  }
}
