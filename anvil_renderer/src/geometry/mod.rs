//! Geometric primitives. Plain value types with no GPU state.
//!
//! Bounds, spheres, planes, lines, rays and frustums used by culling,
//! shadow fitting and picking.

mod bounds;
mod sphere;
mod plane;
mod line;
mod frustum;

pub use bounds::{Bounds2D, Bounds3D};
pub use sphere::{Sphere, compute_enclosing_sphere, SPHERE_EPSILON};
pub use plane::{Plane, intersect_planes, plane_line_intersection, PLANE_EPSILON};
pub use line::{Segment, Line, Ray, closest_point_on_segment, intersect_line_plane};
pub use frustum::{Frustum, FrustumPlane, Visibility};
