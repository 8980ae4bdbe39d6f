//! Frame module
//!
//! `FrameRenderer` schedules the passes of each frame. `ForwardScene` is
//! the sky and opaque drawing shared with cube map capture.

mod config;
mod forward;
mod frame_renderer;

pub use config::{RendererConfig, RendererPrograms, SkyConfig};
pub use forward::{ForwardScene, ForwardStats, SHADOW_TEXTURE_UNIT};
pub use frame_renderer::{
    FrameRenderer, FrameSubmission, FrameOutput, FrameStats, CameraSlot, PassKind,
};
