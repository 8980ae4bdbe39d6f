//! Resource table module
//!
//! Programs and textures the renderer needs are looked up by `ResourceId` in
//! a `ResourceTable` owned by the renderer. The table is filled by the
//! shader/material collaborator and may change between frames.

mod resource_table;
mod program_resolver;

pub use resource_table::{ResourceId, ResourceTable};
pub use program_resolver::{ProgramResolver, ProgramSource, ResolvedProgram};
