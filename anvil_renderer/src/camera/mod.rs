//! Camera module
//!
//! `CameraData` is what the scene collaborator submits per view.
//! `FrustumCuller` turns its view-projection into a `Frustum` and classifies
//! drawables against it.

mod camera_data;
mod culler;

pub use camera_data::CameraData;
pub use culler::{FrustumCuller, BoundingVolume, CullResult};
