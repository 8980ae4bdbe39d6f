//! Render target management module
//!
//! A render target is an off-screen destination (color and/or depth
//! attachment plus a framebuffer) owned by the `RenderTargetPool`.

mod render_target;
mod render_target_pool;

pub use render_target::{RenderTarget, RenderTargetDesc, RenderTargetHandle, Attachment};
pub use render_target_pool::RenderTargetPool;
