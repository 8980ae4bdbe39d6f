/// Program resolution with fallback.
///
/// A drawable may name a program that is not available yet (still compiling,
/// or removed during a reload). Instead of failing the frame the resolver
/// falls back to the last program that was seen under that id, then to the
/// device placeholder.

use std::sync::Arc;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::Result;
use crate::engine_warn;
use crate::engine_debug;
use crate::graphics_device::{GraphicsDevice, Program, TextureKey};
use crate::resource::{ResourceId, ResourceTable};

const SOURCE: &str = "anvil::ProgramResolver";

/// Where a resolved program came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramSource {
    /// Current table entry
    Current,
    /// Table entry missing; last program seen under this id
    LastKnownGood,
    /// Nothing ever seen under this id
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct ResolvedProgram {
    pub program: Arc<dyn Program>,
    pub source: ProgramSource,
}

#[derive(Debug, Default)]
pub struct ProgramResolver {
    last_known_good: FxHashMap<ResourceId, Arc<dyn Program>>,
    /// Ids already reported as missing, to warn once per outage
    reported: FxHashSet<ResourceId>,
}

impl ProgramResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `id` against `table`: current entry, then last known good,
    /// then the device placeholder.
    pub fn resolve(
        &mut self,
        device: &mut dyn GraphicsDevice,
        table: &ResourceTable,
        id: ResourceId,
    ) -> Result<ResolvedProgram> {
        if let Some(program) = table.program(id) {
            if self.reported.remove(&id) {
                engine_debug!(SOURCE, "program {} available again ('{}')", id, program.label());
            }
            self.last_known_good.insert(id, Arc::clone(program));
            return Ok(ResolvedProgram { program: Arc::clone(program), source: ProgramSource::Current });
        }

        if let Some(program) = self.last_known_good.get(&id) {
            if self.reported.insert(id) {
                engine_warn!(SOURCE, "program {} missing, keeping last known good '{}'", id, program.label());
            }
            return Ok(ResolvedProgram { program: Arc::clone(program), source: ProgramSource::LastKnownGood });
        }

        if self.reported.insert(id) {
            engine_warn!(SOURCE, "program {} missing, using placeholder", id);
        }
        Ok(ResolvedProgram { program: device.placeholder_program()?, source: ProgramSource::Placeholder })
    }

    /// Texture lookup; a missing texture is skipped with a warning.
    pub fn resolve_texture(&mut self, table: &ResourceTable, id: ResourceId) -> Option<TextureKey> {
        let texture = table.texture(id);
        if texture.is_none() && self.reported.insert(id) {
            engine_warn!(SOURCE, "texture {} missing, binding skipped", id);
        } else if texture.is_some() {
            self.reported.remove(&id);
        }
        texture
    }

    /// Forget every cached program
    pub fn reset(&mut self) {
        self.last_known_good.clear();
        self.reported.clear();
    }

    pub fn cached_count(&self) -> usize {
        self.last_known_good.len()
    }
}

#[cfg(test)]
#[path = "program_resolver_tests.rs"]
mod tests;
