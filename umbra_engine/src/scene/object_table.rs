use crate::core::targets::SCENE;
use crate::mesh::{Geometry, GeometryObject};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use tracing::error;

new_key_type! {
    /// Stable handle to a record in an [ObjectTable]. Never reused while the table lives
    pub struct ObjectKey;
}

/// Identifier of a scene object, as seen by whoever is building the scene
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "#{}", self.0) }
}

/// First id handed out by [ObjectTable::next_free_id]; later ids count down from here
const FIRST_FREE_ID: u32 = i32::MAX as u32;

/// A geometry object together with its construction bookkeeping
#[derive(Clone, Debug)]
pub struct ObjectRecord {
    id: ObjectId,
    object: GeometryObject,
    /// Logical index of the last vertex submitted, used to place exported normals
    pub(crate) last_vertex: Option<usize>,
    /// Cleared while a mesh is being built; unfinished records are never counted or indexed
    pub(crate) finished: bool,
}

impl ObjectRecord {
    pub fn id(&self) -> ObjectId { self.id }

    pub fn object(&self) -> &GeometryObject { &self.object }

    pub fn object_mut(&mut self) -> &mut GeometryObject { &mut self.object }

    pub fn last_vertex(&self) -> Option<usize> { self.last_vertex }

    pub fn is_finished(&self) -> bool { self.finished }
}

/// Owns every geometry object in a scene.
///
/// Meshes and instances live in a slot map, addressed by [ObjectKey] internally and by [ObjectId] from outside.
/// Standalone objects (arbitrary [Geometry]) are kept separately, and are only indexed in universal mode.
#[derive(Debug)]
pub struct ObjectTable {
    records: SlotMap<ObjectKey, ObjectRecord>,
    ids: BTreeMap<ObjectId, ObjectKey>,
    standalone: BTreeMap<ObjectId, Box<dyn Geometry>>,
    next_free_id: u32,
}

impl Default for ObjectTable {
    fn default() -> Self { Self::new() }
}

impl ObjectTable {
    pub fn new() -> Self {
        Self {
            records: SlotMap::with_key(),
            ids: BTreeMap::new(),
            standalone: BTreeMap::new(),
            next_free_id: FIRST_FREE_ID,
        }
    }

    /// Allocates an unused id. Ids count down from `i32::MAX`; [None] once they run out.
    ///
    /// An id that is already taken (because a caller picked it explicitly) is skipped.
    pub fn next_free_id(&mut self) -> Option<ObjectId> {
        while self.next_free_id > 0 {
            let id = ObjectId(self.next_free_id);
            self.next_free_id -= 1;
            if !self.contains(id) {
                return Some(id);
            }
            error!(target: SCENE, %id, "object id already in use, allocating another");
        }
        None
    }

    /// Stores a complete `object` under `id`. An existing record with the same id is replaced in place, keeping its key
    pub fn insert(&mut self, id: ObjectId, object: GeometryObject) -> ObjectKey { self.insert_record(id, object, true) }

    /// Like [ObjectTable::insert], but the record stays hidden from [ObjectTable::records] and [ObjectTable::len]
    /// until [ObjectTable::mark_finished] is called for it
    pub fn insert_unfinished(&mut self, id: ObjectId, object: GeometryObject) -> ObjectKey {
        self.insert_record(id, object, false)
    }

    pub fn mark_finished(&mut self, key: ObjectKey) {
        if let Some(record) = self.records.get_mut(key) {
            record.finished = true;
        }
    }

    fn insert_record(&mut self, id: ObjectId, object: GeometryObject, finished: bool) -> ObjectKey {
        self.standalone.remove(&id);
        let record = ObjectRecord {
            id,
            object,
            last_vertex: None,
            finished,
        };
        match self.ids.get(&id) {
            Some(&key) => {
                self.records[key] = record;
                key
            }
            None => {
                let key = self.records.insert(record);
                self.ids.insert(id, key);
                key
            }
        }
    }

    pub fn insert_standalone(&mut self, id: ObjectId, object: Box<dyn Geometry>) {
        if let Some(key) = self.ids.remove(&id) {
            self.records.remove(key);
        }
        self.standalone.insert(id, object);
    }

    pub fn key(&self, id: ObjectId) -> Option<ObjectKey> { self.ids.get(&id).copied() }

    pub fn get(&self, key: ObjectKey) -> Option<&ObjectRecord> { self.records.get(key) }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut ObjectRecord> { self.records.get_mut(key) }

    pub fn by_id(&self, id: ObjectId) -> Option<&ObjectRecord> { self.key(id).and_then(|key| self.get(key)) }

    pub fn standalone(&self, id: ObjectId) -> Option<&dyn Geometry> { self.standalone.get(&id).map(Box::as_ref) }

    pub fn contains(&self, id: ObjectId) -> bool { self.ids.contains_key(&id) || self.standalone.contains_key(&id) }

    /// Number of finished objects of any kind
    pub fn len(&self) -> usize { self.records().count() + self.standalone.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Finished mesh and instance records, in id order
    pub fn records(&self) -> impl Iterator<Item = &ObjectRecord> + '_ {
        self.ids
            .values()
            .filter_map(|&key| self.records.get(key))
            .filter(|record| record.finished)
    }

    /// Standalone objects, in id order
    pub fn standalone_objects(&self) -> impl Iterator<Item = (ObjectId, &dyn Geometry)> + '_ {
        self.standalone.iter().map(|(&id, obj)| (id, obj.as_ref()))
    }
}
