/*!
# Anvil Renderer

Frame rendering pipeline for the Anvil engine.

Given a camera, a light set and a list of drawables, the pipeline produces a
shaded, post-processed image every frame. The GPU is reached through the
`GraphicsDevice` trait; `HeadlessDevice` is a CPU implementation used by tests
and offline tools.

## Architecture

- **geometry**: bounds, spheres, planes, lines, rays and frustums (pure math)
- **target**: `RenderTargetPool`, owner of every off-screen attachment
- **camera**: camera data and the `FrustumCuller`
- **shadow**: cascaded shadow maps fitted to the view frustum
- **cubemap**: six-face environment capture with scoped framebuffer bindings
- **post**: ordered full-screen passes (blur/bloom mip chain, ...)
- **frame**: `FrameRenderer`, which schedules all of the above each frame
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod geometry;
pub mod graphics_device;
pub mod resource;
pub mod target;
pub mod camera;
pub mod scene;
pub mod shadow;
pub mod cubemap;
pub mod post;
pub mod frame;

// Main anvil namespace module
pub mod anvil {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Geometric primitives
    pub mod geometry {
        pub use crate::geometry::*;
    }

    // Device abstraction and headless backend
    pub mod device {
        pub use crate::graphics_device::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod target {
        pub use crate::target::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod shadow {
        pub use crate::shadow::*;
    }

    pub mod cubemap {
        pub use crate::cubemap::*;
    }

    pub mod post {
        pub use crate::post::*;
    }

    pub mod frame {
        pub use crate::frame::*;
    }
}

// Re-export math library at crate root
pub use glam;
