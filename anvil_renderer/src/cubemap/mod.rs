//! Cube map environment capture module

mod cube_face;
mod capture_engine;

pub use cube_face::CubeFace;
pub use capture_engine::{
    CubemapCaptureEngine, CubemapConfig, SceneRenderer, CubeCapture, FaceImage,
};
