// we will use a fast hashing algo for hashmaps where keys are identities
// or paths, neither of which comes from an untrusted source
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::trace;

// our own stuff that we need
use crate::entity::{Instance, ObjectId};
use crate::error::Result;
use crate::settings::CloneOptions;

pub type ObjectHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// The source is retained next to its twin, which keeps the source object
// alive and therefore its identity unique until the registry is dropped.
#[derive(Debug)]
struct Keepsake {
    source: Instance,
    twin: Instance,
}

// ------------- TwinRegistry -------------
// Keeps the one-to-one mapping between source objects and their clones for
// the duration of a single clone operation.
#[derive(Debug)]
pub struct TwinRegistry {
    kept: HashMap<ObjectId, Keepsake, ObjectHasher>,
    options: CloneOptions,
    reused: usize,
}

impl TwinRegistry {
    pub fn new() -> Self {
        Self::with_options(CloneOptions::default())
    }
    pub fn with_options(options: CloneOptions) -> Self {
        Self {
            kept: HashMap::with_capacity_and_hasher(options.registry_capacity, ObjectHasher::default()),
            options,
            reused: 0,
        }
    }
    pub fn options(&self) -> &CloneOptions {
        &self.options
    }
    // Check and insert happen under the same &mut borrow, so a source can
    // never end up with two twins. The boolean tells whether the twin was
    // kept previously, in which case `make` is never called.
    pub fn keep<F>(&mut self, source: &Instance, make: F) -> Result<(Instance, bool)>
    where
        F: FnOnce() -> Result<Instance>,
    {
        match self.kept.entry(source.id()) {
            Entry::Occupied(e) => {
                self.reused += 1;
                trace!(source = ?e.get().source, twin = ?e.get().twin, "reusing twin");
                Ok((e.get().twin.clone(), true))
            }
            Entry::Vacant(e) => {
                let twin = make()?;
                e.insert(Keepsake {
                    source: source.clone(),
                    twin: twin.clone(),
                });
                Ok((twin, false))
            }
        }
    }
    pub fn twin_of(&self, source: &Instance) -> Option<Instance> {
        self.kept.get(&source.id()).map(|k| k.twin.clone())
    }
    pub fn contains(&self, source: &Instance) -> bool {
        self.kept.contains_key(&source.id())
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
    pub fn reused(&self) -> usize {
        self.reused
    }
}

impl Default for TwinRegistry {
    fn default() -> Self {
        Self::new()
    }
}
