//! The object store: every entity of a project, keyed by identity.
//!
//! All other components read and mutate entities only through the store.
//! Entities are created with [`ObjectStore::allocate`], changed in place through
//! existence-checked accessors, and never deleted; the store is discarded
//! wholesale once the project has been written.
//!
//! The store preserves allocation order, which the serializer uses to break
//! ties between entities of the same class.

mod id;

pub use id::{IdGenerator, ObjectId};

use indexmap::IndexMap;

use crate::consts::{ISA_KEY, NAME_KEY};
use crate::value::{self, Record, Value};
use crate::{ProjectError, Result};

/// Identity-keyed, insertion-ordered entity store.
#[derive(Debug, Clone)]
pub struct ObjectStore {
  objects: IndexMap<ObjectId, Record>,
  ids: IdGenerator,
}

impl ObjectStore {
  pub fn new(ids: IdGenerator) -> Self {
    Self {
      objects: IndexMap::new(),
      ids,
    }
  }

  /// Insert `{isa} ∪ properties` under a fresh identity.
  ///
  /// The class tag always comes first in the stored record; an `isa` key in
  /// `properties` is ignored.
  pub fn allocate(&mut self, isa: &str, properties: Record) -> Result<ObjectId> {
    if isa.is_empty() {
      return Err(ProjectError::InvalidArgument("class tag must not be empty".to_string()));
    }

    let mut id = self.ids.next_id();
    while self.objects.contains_key(&id) {
      id = self.ids.next_id();
    }

    let mut record = Record::with_capacity(properties.len() + 1);
    record.insert(ISA_KEY.to_string(), Value::from(isa));
    record.extend(properties.into_iter().filter(|(key, _)| key != ISA_KEY));

    self.objects.insert(id.clone(), record);
    Ok(id)
  }

  pub fn exists(&self, id: &ObjectId) -> bool {
    self.objects.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }

  /// The full record of an entity.
  pub fn object(&self, id: &ObjectId) -> Result<&Record> {
    self.objects.get(id).ok_or_else(|| ProjectError::missing(id))
  }

  fn object_mut(&mut self, id: &ObjectId) -> Result<&mut Record> {
    self.objects.get_mut(id).ok_or_else(|| ProjectError::missing(id))
  }

  pub fn get(&self, id: &ObjectId, key: &str) -> Result<Option<&Value>> {
    Ok(self.object(id)?.get(key))
  }

  pub fn get_mut(&mut self, id: &ObjectId, key: &str) -> Result<Option<&mut Value>> {
    Ok(self.object_mut(id)?.get_mut(key))
  }

  pub fn set(&mut self, id: &ObjectId, key: &str, value: impl Into<Value>) -> Result<()> {
    self.object_mut(id)?.insert(key.to_string(), value.into());
    Ok(())
  }

  pub fn has(&self, id: &ObjectId, key: &str) -> Result<bool> {
    Ok(self.object(id)?.contains_key(key))
  }

  /// Remove a property, returning its previous value.
  pub fn remove(&mut self, id: &ObjectId, key: &str) -> Result<Option<Value>> {
    Ok(self.object_mut(id)?.shift_remove(key))
  }

  /// Class tag of an entity.
  pub fn class_of(&self, id: &ObjectId) -> Result<&str> {
    let record = self.object(id)?;
    value::class_tag(record).ok_or_else(|| ProjectError::InvalidObject {
      id: id.to_string(),
      reason: "entity has no class tag".to_string(),
    })
  }

  /// Fail unless `id` exists and is one of `classes`.
  pub fn expect_class(&self, id: &ObjectId, classes: &[&str]) -> Result<()> {
    let found = self.class_of(id)?;
    if classes.contains(&found) {
      Ok(())
    } else {
      Err(ProjectError::wrong_class(id, &classes.join(" or "), found))
    }
  }

  /// String property, `None` when absent or not a string.
  pub fn get_str(&self, id: &ObjectId, key: &str) -> Result<Option<&str>> {
    Ok(self.get(id, key)?.and_then(Value::as_str))
  }

  /// Reference property, `None` when absent or not a reference.
  pub fn get_reference(&self, id: &ObjectId, key: &str) -> Result<Option<&ObjectId>> {
    Ok(self.get(id, key)?.and_then(Value::as_reference))
  }

  /// The references held in an array property, in order.
  pub fn references(&self, id: &ObjectId, key: &str) -> Result<Vec<ObjectId>> {
    let refs = self
      .get(id, key)?
      .and_then(Value::as_array)
      .map(|items| items.iter().filter_map(Value::as_reference).cloned().collect())
      .unwrap_or_default();
    Ok(refs)
  }

  /// Append to an array property, creating it when absent.
  pub fn push(&mut self, id: &ObjectId, key: &str, item: impl Into<Value>) -> Result<()> {
    let record = self.object_mut(id)?;
    let slot = record
      .entry(key.to_string())
      .or_insert_with(|| Value::Array(Vec::new()));
    match slot.as_array_mut() {
      Some(items) => {
        items.push(item.into());
        Ok(())
      }
      None => Err(ProjectError::InvalidObject {
        id: id.to_string(),
        reason: format!("property '{}' is not an array", key),
      }),
    }
  }

  /// All entities of a class, in allocation order.
  pub fn find_all(&self, isa: &str) -> Vec<ObjectId> {
    self
      .objects
      .iter()
      .filter(|(_, record)| value::class_tag(record) == Some(isa))
      .map(|(id, _)| id.clone())
      .collect()
  }

  /// All entities of a class whose `name` equals `name`.
  pub fn find_all_by_name(&self, isa: &str, name: &str) -> Vec<ObjectId> {
    self
      .objects
      .iter()
      .filter(|(_, record)| {
        value::class_tag(record) == Some(isa) && record.get(NAME_KEY).and_then(Value::as_str) == Some(name)
      })
      .map(|(id, _)| id.clone())
      .collect()
  }

  /// Entities in allocation order.
  pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &Record)> {
    self.objects.iter()
  }

  /// `(holder, target)` pairs for every reference that names no entity.
  pub fn dangling_references(&self) -> Vec<(ObjectId, ObjectId)> {
    let mut dangling = Vec::new();
    for (holder, record) in &self.objects {
      for value in record.values() {
        collect_dangling(value, holder, &self.objects, &mut dangling);
      }
    }
    dangling
  }
}

fn collect_dangling(
  value: &Value,
  holder: &ObjectId,
  objects: &IndexMap<ObjectId, Record>,
  out: &mut Vec<(ObjectId, ObjectId)>,
) {
  match value {
    Value::Reference(target) if !objects.contains_key(target) => out.push((holder.clone(), target.clone())),
    Value::Array(items) => items.iter().for_each(|v| collect_dangling(v, holder, objects, out)),
    Value::Record(record) => record.values().for_each(|v| collect_dangling(v, holder, objects, out)),
    _ => {}
  }
}

impl Default for ObjectStore {
  fn default() -> Self {
    Self::new(IdGenerator::new())
  }
}
