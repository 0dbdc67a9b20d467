//! Path-string helpers.
//!
//! Project paths are stored as plain strings with `/` separators whatever the
//! host platform, so these helpers work on `&str` rather than `std::path`.

/// Last path component (`"a/b/main.m"` → `"main.m"`).
pub fn basename(path: &str) -> &str {
  let trimmed = path.trim_end_matches('/');
  if trimmed.is_empty() {
    return path;
  }
  match trimmed.rfind('/') {
    Some(idx) => &trimmed[idx + 1..],
    None => trimmed,
  }
}

/// Everything before the last path component, `None` for bare names.
pub fn dirname(path: &str) -> Option<&str> {
  let trimmed = path.trim_end_matches('/');
  trimmed.rfind('/').map(|idx| if idx == 0 { "/" } else { &trimmed[..idx] })
}

/// Extension of the last component including the dot (`".m"`), or `""`.
///
/// Leading-dot names such as `.gitignore` have no extension.
pub fn extension(path: &str) -> &str {
  let base = basename(path);
  match base.rfind('.') {
    Some(idx) if idx > 0 && idx + 1 < base.len() => &base[idx..],
    _ => "",
  }
}

/// Last component without its extension (`"MyApp.app"` → `"MyApp"`).
pub fn strip_extension(path: &str) -> &str {
  let base = basename(path);
  let ext = extension(base);
  &base[..base.len() - ext.len()]
}
