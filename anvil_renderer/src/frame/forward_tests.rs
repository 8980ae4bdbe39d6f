use glam::{Mat4, UVec2, Vec3};
use super::*;
use crate::camera::CameraData;
use crate::cubemap::{CubemapCaptureEngine, CubemapConfig};
use crate::error::Result;
use crate::geometry::Bounds3D;
use crate::graphics_device::{
    DeviceCommand, GraphicsDevice, HeadlessDevice, NamedProgram, PolygonMode, TextureDesc,
    TextureFormat, TextureKey,
};
use crate::resource::{ProgramResolver, ResourceId, ResourceTable};
use crate::scene::{
    DirectionalLight, Drawable, LightSet, Material, ObjectConstants, PerView, TextureBinding,
};
use crate::shadow::{ActiveCascade, ShadowFrame};
use crate::frame::{RendererPrograms, SkyConfig};

struct TestMaterial {
    program: ResourceId,
    textures: Vec<TextureBinding>,
}

impl Material for TestMaterial {
    fn program(&self) -> ResourceId {
        self.program
    }

    fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }
}

struct Mesh<'m> {
    center: Vec3,
    material: Option<&'m TestMaterial>,
}

impl<'m> Mesh<'m> {
    fn at(center: Vec3) -> Self {
        Self { center, material: None }
    }

    fn with(center: Vec3, material: &'m TestMaterial) -> Self {
        Self { center, material: Some(material) }
    }
}

impl Drawable for Mesh<'_> {
    fn draw(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        device.draw(36, 0)
    }

    fn bounds(&self) -> Bounds3D {
        Bounds3D::from_center_size(self.center, Vec3::ONE)
    }

    fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.center)
    }

    fn material(&self) -> Option<&dyn Material> {
        self.material.map(|m| m as &dyn Material)
    }
}

fn table() -> ResourceTable {
    let mut table = ResourceTable::new();
    for name in ["forward", "skybox", "wireframe", "lit", "unlit"] {
        table.insert_program(name, NamedProgram::shared(name));
    }
    table
}

fn camera() -> CameraData {
    CameraData::perspective(60f32.to_radians(), UVec2::new(640, 480), 0.1, 100.0)
}

fn program_binds(device: &HeadlessDevice) -> Vec<String> {
    device
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::BindProgram(label) => Some(label.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Opaque pass
// ============================================================================

#[test]
fn test_culled_drawables_are_not_drawn() {
    let mut device = HeadlessDevice::new();
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    let front = Mesh::at(Vec3::new(0.0, 0.0, -10.0));
    let behind = Mesh::at(Vec3::new(0.0, 0.0, 10.0));
    let drawables: Vec<&dyn Drawable> = vec![&front, &behind];

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new());
    scene.render_camera(&mut device, &camera()).unwrap();

    assert_eq!(device.draw_count(), 1);
    assert_eq!(scene.visible(), &[0]);
    let stats = scene.stats();
    assert_eq!(stats.submitted, 2);
    assert_eq!(stats.culled, 1);
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.views, 1);
}

#[test]
fn test_draws_are_grouped_by_program() {
    let mut device = HeadlessDevice::new();
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    let lit = TestMaterial { program: ResourceId::new("lit"), textures: Vec::new() };
    let unlit = TestMaterial { program: ResourceId::new("unlit"), textures: Vec::new() };
    let meshes = [
        Mesh::with(Vec3::new(-2.0, 0.0, -10.0), &lit),
        Mesh::with(Vec3::new(-1.0, 0.0, -10.0), &unlit),
        Mesh::at(Vec3::new(0.0, 0.0, -10.0)),
        Mesh::with(Vec3::new(1.0, 0.0, -10.0), &lit),
        Mesh::with(Vec3::new(2.0, 0.0, -10.0), &unlit),
    ];
    let drawables: Vec<&dyn Drawable> = meshes.iter().map(|m| m as &dyn Drawable).collect();

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new());
    scene.render_camera(&mut device, &camera()).unwrap();

    assert_eq!(device.draw_count(), 5);
    // One bind per distinct program
    let binds = program_binds(&device);
    assert_eq!(binds.len(), 3);

    // Each program's draws are contiguous
    let draws = device.draw_programs();
    for label in ["lit", "unlit", "forward"] {
        let first = draws.iter().position(|p| *p == label).unwrap();
        let last = draws.iter().rposition(|p| *p == label).unwrap();
        assert!(draws[first..=last].iter().all(|p| *p == label), "{:?}", draws);
    }
}

#[test]
fn test_uniforms_and_constants_uploaded() {
    let mut device = HeadlessDevice::new();
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    let sun = DirectionalLight::default();
    let lights = LightSet::new().with_directional(&sun);
    let mesh = Mesh::at(Vec3::new(0.0, 1.0, -8.0));
    let drawables: Vec<&dyn Drawable> = vec![&mesh];
    let cam = camera().looking_at(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, -1.0), Vec3::Y);

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &lights);
    scene.render_camera(&mut device, &cam).unwrap();

    let per_view = PerView::from_camera(&cam);
    assert_eq!(device.uniform_data(PerView::BINDING).unwrap(), bytemuck::bytes_of(&per_view));
    let lighting = LightingUniforms::from_lights(&lights);
    assert!(lighting.has_directional());
    assert_eq!(device.uniform_data(LightingUniforms::BINDING).unwrap(), bytemuck::bytes_of(&lighting));
    let shadows = ShadowUniforms::disabled();
    assert_eq!(device.uniform_data(ShadowUniforms::BINDING).unwrap(), bytemuck::bytes_of(&shadows));

    let constants = ObjectConstants::new(&cam.view_projection(), &mesh.world_matrix());
    assert_eq!(&device.push_constant_data()[..128], bytemuck::bytes_of(&constants));
}

#[test]
fn test_shadow_cascades_bound_from_shadow_unit() {
    let mut device = HeadlessDevice::new();
    let depth = |device: &mut HeadlessDevice, label: &str| -> TextureKey {
        device
            .create_texture(&TextureDesc::depth(16, 16, TextureFormat::Depth32Float, label))
            .unwrap()
    };
    let near = depth(&mut device, "c0");
    let far = depth(&mut device, "c1");
    let frame = ShadowFrame {
        cascades: vec![
            ActiveCascade { index: 0, light_view_proj: Mat4::IDENTITY, split_far: 10.0, texture: near },
            ActiveCascade { index: 1, light_view_proj: Mat4::IDENTITY, split_far: 100.0, texture: far },
        ],
        draws: 0,
    };
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    let mesh = Mesh::at(Vec3::new(0.0, 0.0, -5.0));
    let drawables: Vec<&dyn Drawable> = vec![&mesh];

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new())
        .with_shadows(&frame);
    scene.render_camera(&mut device, &camera()).unwrap();

    assert_eq!(device.texture_unit(SHADOW_TEXTURE_UNIT), Some(near));
    assert_eq!(device.texture_unit(SHADOW_TEXTURE_UNIT + 1), Some(far));
    let block = frame.uniforms(SHADOW_TEXTURE_UNIT);
    assert_eq!(block.cascade_count, 2);
    assert_eq!(device.uniform_data(ShadowUniforms::BINDING).unwrap(), bytemuck::bytes_of(&block));
}

#[test]
fn test_material_textures_bound_except_shadow_units() {
    let mut device = HeadlessDevice::new();
    let albedo = device
        .create_texture(&TextureDesc::color(4, 4, TextureFormat::Rgba8Unorm, "albedo"))
        .unwrap();
    let mut resources = table();
    resources.insert_texture("albedo", albedo);
    resources.insert_texture("clobber", albedo);
    let material = TestMaterial {
        program: ResourceId::new("lit"),
        textures: vec![
            TextureBinding::new(0, "albedo"),
            TextureBinding::new(SHADOW_TEXTURE_UNIT, "clobber"),
            TextureBinding::new(1, "missing"),
        ],
    };
    let mut resolver = ProgramResolver::new();
    let programs = RendererPrograms::default();
    let mesh = Mesh::with(Vec3::new(0.0, 0.0, -5.0), &material);
    let drawables: Vec<&dyn Drawable> = vec![&mesh];

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new());
    scene.render_camera(&mut device, &camera()).unwrap();

    assert_eq!(device.texture_unit(0), Some(albedo));
    assert_eq!(device.texture_unit(SHADOW_TEXTURE_UNIT), None);
    assert_eq!(device.texture_unit(1), None);
    assert_eq!(device.draw_count(), 1);
}

// ============================================================================
// Sky and wireframe
// ============================================================================

#[test]
fn test_sky_drawn_before_drawables() {
    let mut device = HeadlessDevice::new();
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    let sky = SkyConfig::default();
    let mesh = Mesh::at(Vec3::new(0.0, 0.0, -5.0));
    let drawables: Vec<&dyn Drawable> = vec![&mesh];

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new())
        .with_sky(&sky);
    scene.render_camera(&mut device, &camera()).unwrap();

    assert_eq!(device.draw_programs(), vec!["skybox", "forward"]);
    assert_eq!(scene.stats().draws, 1);
}

#[test]
fn test_sky_ignores_camera_translation() {
    let mut device = HeadlessDevice::new();
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    let sky = SkyConfig::default();
    let drawables: Vec<&dyn Drawable> = Vec::new();

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new())
        .with_sky(&sky);
    let cam = camera();
    scene.render_camera(&mut device, &cam).unwrap();
    let at_origin = device.push_constant_data().to_vec();

    let moved = cam.looking_at(Vec3::new(50.0, 20.0, -3.0), Vec3::new(50.0, 20.0, -4.0), Vec3::Y);
    scene.render_camera(&mut device, &moved).unwrap();
    let before: [f32; 32] = bytemuck::pod_read_unaligned(&at_origin[..128]);
    let after: [f32; 32] = bytemuck::pod_read_unaligned(&device.push_constant_data()[..128]);
    // -0.0 and 0.0 compare equal here, unlike the raw bytes
    for (a, b) in before.iter().zip(after.iter()) {
        assert!((a - b).abs() < 1e-6, "{:?} vs {:?}", before, after);
    }

    // Sky colors follow the engine block
    let zenith: [f32; 4] = bytemuck::pod_read_unaligned(&at_origin[128..144]);
    assert_eq!(zenith, sky.zenith_color);
}

#[test]
fn test_wireframe_draws_visible_in_line_mode() {
    let mut device = HeadlessDevice::new();
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    let front = Mesh::at(Vec3::new(0.0, 0.0, -10.0));
    let behind = Mesh::at(Vec3::new(0.0, 0.0, 10.0));
    let drawables: Vec<&dyn Drawable> = vec![&front, &behind];
    let cam = camera();

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new());
    scene.render_camera(&mut device, &cam).unwrap();
    device.clear_commands();
    scene.render_wireframe(&mut device, &cam).unwrap();

    let line_draws: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::Draw { program, polygon_mode, .. } => Some((program.clone(), *polygon_mode)),
            _ => None,
        })
        .collect();
    assert_eq!(line_draws, vec![("wireframe".to_string(), PolygonMode::Line)]);
    assert_eq!(device.polygon_mode(), PolygonMode::Fill);
}

// ============================================================================
// Cube map capture
// ============================================================================

#[test]
fn test_forward_scene_renders_cube_faces() {
    let mut device = HeadlessDevice::new();
    let mut engine = CubemapCaptureEngine::new(
        &mut device,
        CubemapConfig { resolution: 8, far: 50.0, ..CubemapConfig::default() },
    )
    .unwrap();
    let mut resolver = ProgramResolver::new();
    let resources = table();
    let programs = RendererPrograms::default();
    // One mesh on each axis around the probe
    let meshes = [
        Mesh::at(Vec3::new(5.0, 0.0, 0.0)),
        Mesh::at(Vec3::new(-5.0, 0.0, 0.0)),
        Mesh::at(Vec3::new(0.0, 0.0, 5.0)),
    ];
    let drawables: Vec<&dyn Drawable> = meshes.iter().map(|m| m as &dyn Drawable).collect();

    let mut scene = ForwardScene::new(&mut resolver, &resources, &programs, &drawables, &LightSet::new())
        .with_far_clip(50.0);
    engine.capture(&mut device, Vec3::ZERO, &mut scene).unwrap();

    let stats = scene.stats();
    assert_eq!(stats.views, 6);
    assert_eq!(stats.submitted, 18);
    // Each mesh lies in exactly one face frustum
    assert_eq!(stats.draws, 3);
    let per_view = device.uniform_data(PerView::BINDING).unwrap();
    let eye: [f32; 4] = bytemuck::pod_read_unaligned(&per_view[192..208]);
    assert_eq!(eye[3], 50.0);
}
