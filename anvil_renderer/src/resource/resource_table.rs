/// Resource table: stable ids to programs and textures.

use std::fmt;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::graphics_device::{Program, TextureKey};

// ===== RESOURCE ID =====

/// Stable identifier of a program or texture, derived from its name
/// (64-bit FNV-1a). Usable in `const` context.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<&str> for ResourceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({:016x})", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ===== RESOURCE TABLE =====

/// Programs and textures available to the renderer, keyed by `ResourceId`.
///
/// Entries can be replaced between frames (hot reload). The renderer reads
/// the table at frame start and never holds on to a lookup across frames.
#[derive(Debug, Default)]
pub struct ResourceTable {
    programs: FxHashMap<ResourceId, Arc<dyn Program>>,
    textures: FxHashMap<ResourceId, TextureKey>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== PROGRAMS =====

    /// Insert or replace a program, returning the previous one
    pub fn insert_program(
        &mut self,
        id: impl Into<ResourceId>,
        program: Arc<dyn Program>,
    ) -> Option<Arc<dyn Program>> {
        self.programs.insert(id.into(), program)
    }

    pub fn remove_program(&mut self, id: impl Into<ResourceId>) -> Option<Arc<dyn Program>> {
        self.programs.remove(&id.into())
    }

    pub fn program(&self, id: ResourceId) -> Option<&Arc<dyn Program>> {
        self.programs.get(&id)
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    // ===== TEXTURES =====

    /// Insert or replace a texture, returning the previous one
    pub fn insert_texture(&mut self, id: impl Into<ResourceId>, texture: TextureKey) -> Option<TextureKey> {
        self.textures.insert(id.into(), texture)
    }

    pub fn remove_texture(&mut self, id: impl Into<ResourceId>) -> Option<TextureKey> {
        self.textures.remove(&id.into())
    }

    pub fn texture(&self, id: ResourceId) -> Option<TextureKey> {
        self.textures.get(&id).copied()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.programs.clear();
        self.textures.clear();
    }
}

#[cfg(test)]
#[path = "resource_table_tests.rs"]
mod tests;
