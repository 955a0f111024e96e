// ============================================================================
// RESOURCES - explicit get-or-create cache for shared per-type resources
// ============================================================================

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use super::{Mesh, Vertex};

/// Map from a resource key to a lazily created value.  Entries are created on
/// first request and kept for the rest of the session.
pub struct ResourceCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for ResourceCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy, V> ResourceCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: `create` only runs when `key` has no entry yet.
    pub fn get_or_create(&mut self, key: K, create: impl FnOnce() -> V) -> &V {
        self.entries.entry(key).or_insert_with(create)
    }

    /// Like [`ResourceCache::get_or_create`] for fallible constructors.  A
    /// failed creation leaves no entry behind.
    pub fn try_get_or_create<E>(
        &mut self,
        key: K,
        create: impl FnOnce() -> Result<V, E>,
    ) -> Result<&V, E> {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(create()?)),
        }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Primitive types that share one geometry across all instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Quad,
}

/// Shared geometry for primitives, handed to constructors explicitly.
#[derive(Default)]
pub struct PrimitiveResources {
    meshes: ResourceCache<PrimitiveKind, Rc<Mesh>>,
}

impl PrimitiveResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&mut self, kind: PrimitiveKind) -> Rc<Mesh> {
        Rc::clone(self.meshes.get_or_create(kind, || Rc::new(build_mesh(kind))))
    }

    pub fn cached_count(&self) -> usize {
        self.meshes.len()
    }
}

fn build_mesh(kind: PrimitiveKind) -> Mesh {
    match kind {
        // Unit square, uv (0,0) at the top-left corner.
        PrimitiveKind::Quad => Mesh {
            vertices: vec![
                Vertex::textured(0.0, 0.0, 0.0, 0.0),
                Vertex::textured(1.0, 0.0, 1.0, 0.0),
                Vertex::textured(1.0, 1.0, 1.0, 1.0),
                Vertex::textured(0.0, 1.0, 0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        },
    }
}
