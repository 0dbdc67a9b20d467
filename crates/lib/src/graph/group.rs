//! Group tree resolution.
//!
//! Groups are addressed by name paths such as `"Frameworks:Linked"`: one
//! segment per level below the main group, separated by
//! [`GROUP_PATH_SEPARATOR`]. Sibling groups sharing a name make a path
//! ambiguous; every walk fails with [`ProjectError::AmbiguousName`] in that
//! case instead of picking one.
//!
//! Every group or file has at most one parent. The products group is the only
//! entity attached late, by [`ProjectGraph::finish`].

use tracing::{debug, warn};

use crate::consts::{COMMENT_KEY, GROUP_PATH_SEPARATOR, NAME_KEY, isa, source_tree};
use crate::store::ObjectId;
use crate::value::{Record, Value, field};
use crate::{ProjectError, Result};

use super::ProjectGraph;

/// Where to attach an entity: a group identity or a group name path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSpec {
  Id(ObjectId),
  Path(String),
}

impl From<ObjectId> for GroupSpec {
  fn from(id: ObjectId) -> Self {
    GroupSpec::Id(id)
  }
}

impl From<&ObjectId> for GroupSpec {
  fn from(id: &ObjectId) -> Self {
    GroupSpec::Id(id.clone())
  }
}

impl From<&str> for GroupSpec {
  fn from(path: &str) -> Self {
    GroupSpec::Path(path.to_string())
  }
}

impl From<String> for GroupSpec {
  fn from(path: String) -> Self {
    GroupSpec::Path(path)
  }
}

/// Default `sourceTree` for a path: absolute paths are `<absolute>`, anything
/// else is relative to the enclosing group.
pub(crate) fn default_source_tree(path: Option<&str>) -> &'static str {
  match path {
    Some(p) if p.starts_with('/') => source_tree::ABSOLUTE,
    _ => source_tree::GROUP,
  }
}

fn split_name_spec(name_spec: &str) -> Result<Vec<&str>> {
  if name_spec.is_empty() {
    warn!("empty group name path");
    return Err(ProjectError::InvalidArgument("group name path must not be empty".to_string()));
  }
  let segments: Vec<&str> = name_spec.split(GROUP_PATH_SEPARATOR).collect();
  if segments.iter().any(|s| s.is_empty()) {
    return Err(ProjectError::InvalidArgument(format!(
      "group name path '{}' has an empty segment",
      name_spec
    )));
  }
  Ok(segments)
}

impl ProjectGraph {
  /// Create one group, optionally attached to `parent`.
  pub(crate) fn new_group_explicit(
    &mut self,
    name: Option<&str>,
    parent: Option<&ObjectId>,
    path: Option<&str>,
    tree: Option<&str>,
  ) -> Result<ObjectId> {
    let comment = name.unwrap_or("main project group");

    let mut props = Record::from([
      field("children", Value::Array(Vec::new())),
      field("sourceTree", tree.unwrap_or_else(|| default_source_tree(path))),
    ]);
    if let Some(name) = name {
      props.insert(NAME_KEY.to_string(), Value::from(name));
    }
    if let Some(path) = path {
      props.insert("path".to_string(), Value::from(path));
    }
    props.insert(COMMENT_KEY.to_string(), Value::from(comment));

    let group = self.store.allocate(isa::GROUP, props)?;
    if let Some(parent) = parent {
      self.attach(&group, parent)?;
    }
    Ok(group)
  }

  /// Resolve a group name path, creating missing intermediate levels.
  ///
  /// The last segment is always a new group carrying `path` and
  /// `source_tree`; intermediate groups are reused when exactly one sibling
  /// matches and created without a path when none does.
  pub fn new_group(&mut self, name_spec: &str, path: Option<&str>, tree: Option<&str>) -> Result<ObjectId> {
    let segments = split_name_spec(name_spec)?;
    let (last, intermediate) = segments
      .split_last()
      .ok_or_else(|| ProjectError::InvalidArgument("group name path must not be empty".to_string()))?;

    let mut parent = self.root_group()?;
    for segment in intermediate {
      let matches = self.child_groups_named(&parent, segment)?;
      parent = match matches.as_slice() {
        [] => {
          let created = self.new_group_explicit(Some(segment), Some(&parent), None, None)?;
          debug!(group = %segment, path = %name_spec, "created intermediate group");
          created
        }
        [only] => only.clone(),
        _ => {
          return Err(ProjectError::AmbiguousName {
            name: segment.to_string(),
            path: name_spec.to_string(),
          });
        }
      };
    }

    let group = self.new_group_explicit(Some(last), Some(&parent), path, tree)?;
    debug!(group = %last, path = %name_spec, "created group");
    Ok(group)
  }

  /// Resolve an existing group name path without creating anything.
  pub fn find_group(&self, name_spec: &str) -> Result<ObjectId> {
    let segments = split_name_spec(name_spec)?;
    let mut current = self.root_group()?;
    for segment in segments {
      let matches = self.child_groups_named(&current, segment)?;
      current = match matches.as_slice() {
        [] => {
          return Err(ProjectError::NotFound(format!(
            "group '{}' in '{}'",
            segment, name_spec
          )));
        }
        [only] => only.clone(),
        _ => {
          return Err(ProjectError::AmbiguousName {
            name: segment.to_string(),
            path: name_spec.to_string(),
          });
        }
      };
    }
    Ok(current)
  }

  /// Append `child` to a group given by identity or name path.
  ///
  /// Name paths that do not exist yet are created. Returns the group.
  pub fn add_to_group(&mut self, child: &ObjectId, destination: impl Into<GroupSpec>) -> Result<ObjectId> {
    let group = self.resolve_group(&destination.into())?;
    self.attach(child, &group)?;
    Ok(group)
  }

  /// Resolve a [`GroupSpec`] to a group identity, creating missing paths.
  pub(crate) fn resolve_group(&mut self, destination: &GroupSpec) -> Result<ObjectId> {
    let group = match destination {
      GroupSpec::Id(id) => id.clone(),
      GroupSpec::Path(path) => match self.find_group(path) {
        Ok(found) => found,
        Err(ProjectError::NotFound(_)) => self.new_group(path, None, None)?,
        Err(e) => return Err(e),
      },
    };
    self.store.expect_class(&group, &[isa::GROUP])?;
    Ok(group)
  }

  /// Append `child` to `group`'s children, keeping the tree a tree.
  pub(crate) fn attach(&mut self, child: &ObjectId, group: &ObjectId) -> Result<()> {
    self.store.expect_class(group, &[isa::GROUP])?;
    if !self.store.exists(child) {
      return Err(ProjectError::missing(child));
    }
    if child == group {
      return Err(ProjectError::InvalidArgument(format!("group {} cannot contain itself", group)));
    }
    if let Some(parent) = self.parent_group(child)? {
      return Err(ProjectError::InvalidArgument(format!(
        "{} is already a child of group {}",
        child, parent
      )));
    }
    self.store.push(group, "children", child)
  }

  /// The group or variant group listing `child`, if any.
  pub fn parent_group(&self, child: &ObjectId) -> Result<Option<ObjectId>> {
    for (id, record) in self.store.iter() {
      let is_container = matches!(
        crate::value::class_tag(record),
        Some(isa::GROUP) | Some(isa::VARIANT_GROUP)
      );
      if !is_container {
        continue;
      }
      let listed = record
        .get("children")
        .and_then(Value::as_array)
        .is_some_and(|children| children.iter().any(|c| c.as_reference() == Some(child)));
      if listed {
        return Ok(Some(id.clone()));
      }
    }
    Ok(None)
  }

  /// Child groups of `parent` whose name equals `name`, in child order.
  fn child_groups_named(&self, parent: &ObjectId, name: &str) -> Result<Vec<ObjectId>> {
    let mut matches = Vec::new();
    for child in self.store.references(parent, "children")? {
      if self.store.class_of(&child)? == isa::GROUP && self.store.get_str(&child, NAME_KEY)? == Some(name) {
        matches.push(child);
      }
    }
    Ok(matches)
  }
}
