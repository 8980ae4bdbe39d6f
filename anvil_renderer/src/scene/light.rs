/// Light sources (plain data).

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels (from the light toward the scene)
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub casts_shadow: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.3, -1.0, -0.2),
            color: Vec3::ONE,
            intensity: 1.0,
            casts_shadow: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    /// Half-angle of the full-intensity cone, radians
    pub inner_angle: f32,
    /// Half-angle where the light fades to zero, radians
    pub outer_angle: f32,
}

/// Lights borrowed from the scene collaborator for one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct LightSet<'a> {
    pub directional: Option<&'a DirectionalLight>,
    pub points: &'a [PointLight],
    pub spots: &'a [SpotLight],
}

impl<'a> LightSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directional(mut self, light: &'a DirectionalLight) -> Self {
        self.directional = Some(light);
        self
    }

    pub fn with_points(mut self, lights: &'a [PointLight]) -> Self {
        self.points = lights;
        self
    }

    pub fn with_spots(mut self, lights: &'a [SpotLight]) -> Self {
        self.spots = lights;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.directional.is_none() && self.points.is_empty() && self.spots.is_empty()
    }

    /// Directional light that drives the shadow cascades, if any
    pub fn shadow_light(&self) -> Option<&'a DirectionalLight> {
        self.directional
            .filter(|l| l.casts_shadow && l.direction.length_squared() > f32::EPSILON)
    }
}
