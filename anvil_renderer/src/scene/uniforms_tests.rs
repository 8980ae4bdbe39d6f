use glam::{Mat4, Vec3};
use super::*;
use crate::scene::{DirectionalLight, PointLight, SpotLight, LightSet};

fn point(x: f32) -> PointLight {
    PointLight { position: Vec3::new(x, 0.0, 0.0), color: Vec3::ONE, intensity: 2.0, range: 10.0 }
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_block_sizes_are_16_byte_multiples() {
    assert_eq!(std::mem::size_of::<PerScene>() % 16, 0);
    assert_eq!(std::mem::size_of::<PerView>() % 16, 0);
    assert_eq!(std::mem::size_of::<LightingUniforms>() % 16, 0);
    assert_eq!(std::mem::size_of::<ShadowUniforms>() % 16, 0);
    assert_eq!(std::mem::size_of::<ObjectConstants>(), 128);
}

#[test]
fn test_object_constants_layout() {
    let view_proj = Mat4::from_scale(Vec3::splat(2.0));
    let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let constants = ObjectConstants::new(&view_proj, &model);

    let bytes = bytemuck::bytes_of(&constants);
    let mvp: &[f32] = bytemuck::cast_slice(&bytes[..64]);
    let m: &[f32] = bytemuck::cast_slice(&bytes[64..]);
    assert_eq!(mvp, (view_proj * model).to_cols_array().as_slice());
    assert_eq!(m, model.to_cols_array().as_slice());
}

// ============================================================================
// Lighting
// ============================================================================

#[test]
fn test_lighting_empty_set() {
    let block = LightingUniforms::from_lights(&LightSet::new());
    assert!(!block.has_directional());
    assert_eq!(block.num_point_lights, 0);
    assert_eq!(block.num_spot_lights, 0);
}

#[test]
fn test_lighting_packs_directional_normalized() {
    let sun = DirectionalLight {
        direction: Vec3::new(0.0, -4.0, 0.0),
        color: Vec3::new(1.0, 0.5, 0.25),
        intensity: 3.0,
        casts_shadow: true,
    };
    let block = LightingUniforms::from_lights(&LightSet::new().with_directional(&sun));
    assert!(block.has_directional());
    assert_eq!(block.directional_direction, [0.0, -1.0, 0.0, 1.0]);
    assert_eq!(block.directional_color, [1.0, 0.5, 0.25, 3.0]);
}

#[test]
fn test_lighting_truncates_point_lights() {
    let points: Vec<PointLight> = (0..MAX_POINT_LIGHTS + 3).map(|i| point(i as f32)).collect();
    let block = LightingUniforms::from_lights(&LightSet::new().with_points(&points));
    assert_eq!(block.num_point_lights as usize, MAX_POINT_LIGHTS);
    assert_eq!(block.point_lights[3].position, [3.0, 0.0, 0.0, 10.0]);
    assert_eq!(block.point_lights[3].color, [1.0, 1.0, 1.0, 2.0]);
}

#[test]
fn test_lighting_spot_cone_cosines() {
    let spot = SpotLight {
        position: Vec3::ZERO,
        direction: Vec3::new(0.0, 0.0, -2.0),
        color: Vec3::ONE,
        intensity: 1.0,
        range: 5.0,
        inner_angle: 0.0,
        outer_angle: std::f32::consts::FRAC_PI_2,
    };
    let spots = [spot];
    let block = LightingUniforms::from_lights(&LightSet::new().with_spots(&spots));
    assert_eq!(block.num_spot_lights, 1);
    let s = block.spot_lights[0];
    assert_eq!(&s.direction[..3], &[0.0, 0.0, -1.0]);
    assert!((s.direction[3] - 1.0).abs() < 1e-6);
    assert!(s.params[0].abs() < 1e-6);
}

#[test]
fn test_shadow_light_requires_direction_and_flag() {
    let mut sun = DirectionalLight::default();
    assert!(LightSet::new().with_directional(&sun).shadow_light().is_some());

    sun.casts_shadow = false;
    assert!(LightSet::new().with_directional(&sun).shadow_light().is_none());

    let zero = DirectionalLight { direction: Vec3::ZERO, ..DirectionalLight::default() };
    assert!(LightSet::new().with_directional(&zero).shadow_light().is_none());
}

#[test]
fn test_shadow_disabled_block() {
    let block = ShadowUniforms::disabled();
    assert_eq!(block.cascade_count, 0);
}
