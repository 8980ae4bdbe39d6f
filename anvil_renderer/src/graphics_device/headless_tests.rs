/// Unit tests for HeadlessDevice and the scoped framebuffer binding.

use std::sync::Arc;
use crate::error::Error;
use crate::graphics_device::*;

fn color_desc(w: u32, h: u32) -> TextureDesc {
    TextureDesc::color(w, h, TextureFormat::Rgba8Unorm, "color")
}

fn depth_desc(w: u32, h: u32) -> TextureDesc {
    TextureDesc::depth(w, h, TextureFormat::Depth32Float, "depth")
}

/// Complete 2D framebuffer with color + depth
fn complete_framebuffer(device: &mut HeadlessDevice, w: u32, h: u32) -> (FramebufferKey, TextureKey, TextureKey) {
    let color = device.create_texture(&color_desc(w, h)).unwrap();
    let depth = device.create_texture(&depth_desc(w, h)).unwrap();
    let fb = device.create_framebuffer("fb").unwrap();
    device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::whole(color))).unwrap();
    device.attach(fb, AttachmentPoint::Depth, Some(AttachmentView::whole(depth))).unwrap();
    (fb, color, depth)
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn test_create_and_destroy_texture() {
    let mut device = HeadlessDevice::new();
    let tex = device.create_texture(&color_desc(64, 32)).unwrap();

    let info = device.texture_info(tex).unwrap();
    assert_eq!(info.width, 64);
    assert_eq!(info.height, 32);
    assert_eq!(info.layers(), 1);
    assert_eq!(device.live_texture_count(), 1);

    device.destroy_texture(tex);
    assert!(device.texture_info(tex).is_none());
    assert_eq!(device.live_texture_count(), 0);

    // Destroying twice is ignored
    device.destroy_texture(tex);
}

#[test]
fn test_zero_size_texture_rejected() {
    let mut device = HeadlessDevice::new();
    let err = device.create_texture(&color_desc(0, 32)).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}

#[test]
fn test_non_square_cube_rejected() {
    let mut device = HeadlessDevice::new();
    let desc = color_desc(64, 32).with_kind(TextureKind::Cube);
    assert!(matches!(device.create_texture(&desc), Err(Error::InvalidResource(_))));
}

#[test]
fn test_cube_texture_has_six_layers() {
    let mut device = HeadlessDevice::new();
    let tex = device.create_texture(&color_desc(16, 16).with_kind(TextureKind::Cube)).unwrap();
    assert_eq!(device.texture_info(tex).unwrap().layers(), 6);
    assert_eq!(device.layer_contents(tex, 5), Some(LayerContents::Undefined));
    assert_eq!(device.layer_contents(tex, 6), None);
}

#[test]
fn test_format_usage_mismatch_rejected() {
    let mut device = HeadlessDevice::new();

    let mut bad_color = color_desc(8, 8);
    bad_color.format = TextureFormat::Depth24Stencil8;
    assert!(matches!(device.create_texture(&bad_color), Err(Error::UnsupportedFormat(_))));

    let mut bad_depth = depth_desc(8, 8);
    bad_depth.format = TextureFormat::Rgba16Float;
    assert!(matches!(device.create_texture(&bad_depth), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn test_rejected_format_injection() {
    let mut device = HeadlessDevice::new();
    device.reject_format(TextureFormat::Rgba16Float);

    let desc = TextureDesc::color(8, 8, TextureFormat::Rgba16Float, "hdr");
    let err = device.create_texture(&desc).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert!(err.is_fatal());
    assert_eq!(device.live_texture_count(), 0);
}

#[test]
fn test_memory_budget_injection() {
    let mut device = HeadlessDevice::new();
    // Two 8x8 RGBA8 textures fit, a third does not
    device.set_memory_budget(Some(2 * 8 * 8 * 4));
    let first = device.create_texture(&color_desc(8, 8)).unwrap();
    device.create_texture(&color_desc(8, 8)).unwrap();
    assert_eq!(device.allocated_bytes(), 512);

    let err = device.create_texture(&color_desc(8, 8)).unwrap_err();
    assert_eq!(err, Error::OutOfMemory);
    assert!(!err.is_fatal());
    assert_eq!(device.live_texture_count(), 2);

    // Freed memory is reusable
    device.destroy_texture(first);
    device.create_texture(&color_desc(8, 8)).unwrap();

    device.set_memory_budget(None);
    device.create_texture(&color_desc(64, 64)).unwrap();
}

#[test]
fn test_cube_counts_every_layer() {
    let mut device = HeadlessDevice::new();
    device.create_texture(&color_desc(4, 4).with_kind(TextureKind::Cube)).unwrap();
    assert_eq!(device.allocated_bytes(), 6 * 4 * 4 * 4);
}

#[test]
fn test_format_helpers() {
    assert!(TextureFormat::Depth32Float.is_depth());
    assert!(TextureFormat::Depth24Stencil8.is_depth());
    assert!(TextureFormat::Rgba8Unorm.is_color());
    assert_eq!(TextureFormat::Rgba16Float.bytes_per_pixel(), 8);
    assert_eq!(TextureFormat::Rgb8Unorm.bytes_per_pixel(), 3);
}

// ============================================================================
// Framebuffer completeness
// ============================================================================

#[test]
fn test_complete_framebuffer() {
    let mut device = HeadlessDevice::new();
    let (fb, _, _) = complete_framebuffer(&mut device, 32, 32);
    assert_eq!(device.framebuffer_status(fb), FramebufferStatus::Complete);
}

#[test]
fn test_empty_framebuffer_incomplete() {
    let mut device = HeadlessDevice::new();
    let fb = device.create_framebuffer("empty").unwrap();
    assert_eq!(device.framebuffer_status(fb), FramebufferStatus::MissingAttachment);
}

#[test]
fn test_size_mismatch_incomplete() {
    let mut device = HeadlessDevice::new();
    let color = device.create_texture(&color_desc(32, 32)).unwrap();
    let depth = device.create_texture(&depth_desc(16, 16)).unwrap();
    let fb = device.create_framebuffer("fb").unwrap();
    device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::whole(color))).unwrap();
    device.attach(fb, AttachmentPoint::Depth, Some(AttachmentView::whole(depth))).unwrap();
    assert_eq!(device.framebuffer_status(fb), FramebufferStatus::SizeMismatch);
}

#[test]
fn test_wrong_attachment_point_incomplete() {
    let mut device = HeadlessDevice::new();
    let depth = device.create_texture(&depth_desc(16, 16)).unwrap();
    let fb = device.create_framebuffer("fb").unwrap();
    device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::whole(depth))).unwrap();
    assert_eq!(device.framebuffer_status(fb), FramebufferStatus::FormatMismatch);
}

#[test]
fn test_layer_out_of_range_incomplete() {
    let mut device = HeadlessDevice::new();
    let color = device.create_texture(&color_desc(16, 16)).unwrap();
    let fb = device.create_framebuffer("fb").unwrap();
    device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::layer(color, 1))).unwrap();
    assert_eq!(device.framebuffer_status(fb), FramebufferStatus::LayerOutOfRange);
}

#[test]
fn test_destroyed_texture_makes_framebuffer_incomplete() {
    let mut device = HeadlessDevice::new();
    let (fb, color, _) = complete_framebuffer(&mut device, 8, 8);
    device.destroy_texture(color);
    assert_eq!(device.framebuffer_status(fb), FramebufferStatus::MissingTexture);
}

#[test]
fn test_forced_incomplete() {
    let mut device = HeadlessDevice::new();
    let (fb, _, _) = complete_framebuffer(&mut device, 8, 8);
    device.fail_completeness(true);
    assert!(!device.framebuffer_status(fb).is_complete());
    device.fail_completeness(false);
    assert!(device.framebuffer_status(fb).is_complete());
}

#[test]
fn test_attach_unknown_resources() {
    let mut device = HeadlessDevice::new();
    let color = device.create_texture(&color_desc(8, 8)).unwrap();
    let fb = device.create_framebuffer("fb").unwrap();

    device.destroy_framebuffer(fb);
    let err = device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::whole(color))).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));

    let fb = device.create_framebuffer("fb2").unwrap();
    device.destroy_texture(color);
    let err = device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::whole(color))).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}

// ============================================================================
// Clear / read back
// ============================================================================

#[test]
fn test_clear_then_read_pixels() {
    let mut device = HeadlessDevice::new();
    let (fb, color, depth) = complete_framebuffer(&mut device, 2, 2);

    device.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
    device.clear(ClearFlags::COLOR | ClearFlags::DEPTH, [1.0, 0.0, 0.0, 1.0], 1.0).unwrap();

    let pixels = device.read_pixels(color, 0).unwrap();
    assert_eq!(pixels.len(), 2 * 2 * 4);
    assert!(pixels.chunks(4).all(|p| p == [255, 0, 0, 255]));

    assert_eq!(device.layer_contents(depth, 0), Some(LayerContents::Depth(1.0)));
}

#[test]
fn test_clear_color_only_leaves_depth() {
    let mut device = HeadlessDevice::new();
    let (fb, _, depth) = complete_framebuffer(&mut device, 2, 2);
    device.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
    device.clear(ClearFlags::COLOR, [0.0; 4], 1.0).unwrap();
    assert_eq!(device.layer_contents(depth, 0), Some(LayerContents::Undefined));
}

#[test]
fn test_clear_incomplete_framebuffer_fails() {
    let mut device = HeadlessDevice::new();
    let fb = device.create_framebuffer("empty").unwrap();
    device.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
    let err = device.clear(ClearFlags::COLOR, [0.0; 4], 1.0).unwrap_err();
    assert!(matches!(err, Error::IncompleteFramebuffer(_)));
}

#[test]
fn test_clear_default_surface_is_recorded() {
    let mut device = HeadlessDevice::new();
    device.clear(ClearFlags::COLOR, [0.5; 4], 1.0).unwrap();
    assert!(matches!(device.commands().last(), Some(DeviceCommand::Clear { framebuffer: None, .. })));
}

#[test]
fn test_clear_writes_only_attached_layer() {
    let mut device = HeadlessDevice::new();
    let cube = device.create_texture(&color_desc(4, 4).with_kind(TextureKind::Cube)).unwrap();
    let fb = device.create_framebuffer("cube").unwrap();
    device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::layer(cube, 3))).unwrap();
    device.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
    device.clear(ClearFlags::COLOR, [0.0, 1.0, 0.0, 1.0], 1.0).unwrap();

    assert_eq!(device.layer_contents(cube, 3), Some(LayerContents::Color([0.0, 1.0, 0.0, 1.0])));
    assert_eq!(device.layer_contents(cube, 2), Some(LayerContents::Undefined));
    assert_eq!(device.read_pixels(cube, 2).unwrap(), vec![0u8; 4 * 4 * 4]);
}

#[test]
fn test_read_pixels_errors() {
    let mut device = HeadlessDevice::new();
    let tex = device.create_texture(&color_desc(4, 4)).unwrap();
    assert!(matches!(device.read_pixels(tex, 1), Err(Error::InvalidResource(_))));
    device.destroy_texture(tex);
    assert!(matches!(device.read_pixels(tex, 0), Err(Error::InvalidResource(_))));
}

// ============================================================================
// Bound state / draws
// ============================================================================

#[test]
fn test_draw_requires_program() {
    let mut device = HeadlessDevice::new();
    assert!(device.draw(3, 0).is_err());

    let program = NamedProgram::shared("forward");
    device.bind_program(&program).unwrap();
    device.draw(3, 0).unwrap();
    assert_eq!(device.draw_count(), 1);
    assert_eq!(device.draw_programs(), vec!["forward"]);
}

#[test]
fn test_push_constants_requires_program() {
    let mut device = HeadlessDevice::new();
    assert!(device.push_constants(0, &[0u8; 64]).is_err());
    device.bind_program(&NamedProgram::shared("p")).unwrap();
    device.push_constants(0, &[7u8; 64]).unwrap();
    assert_eq!(device.push_constant_data(), &[7u8; 64][..]);
}

#[test]
fn test_bind_texture_validates() {
    let mut device = HeadlessDevice::new();
    let sampled = device.create_texture(&color_desc(4, 4)).unwrap();
    device.bind_texture(2, sampled).unwrap();
    assert_eq!(device.texture_unit(2), Some(sampled));

    let mut desc = color_desc(4, 4);
    desc.usage = TextureUsage::COLOR_ATTACHMENT;
    let not_sampled = device.create_texture(&desc).unwrap();
    assert!(device.bind_texture(3, not_sampled).is_err());

    // Destroying a texture clears the units it was bound to
    device.destroy_texture(sampled);
    assert_eq!(device.texture_unit(2), None);
}

#[test]
fn test_uniforms_and_polygon_mode() {
    let mut device = HeadlessDevice::new();
    device.write_uniforms(1, &[1, 2, 3, 4]).unwrap();
    assert_eq!(device.uniform_data(1), Some(&[1u8, 2, 3, 4][..]));
    assert_eq!(device.uniform_data(0), None);

    assert_eq!(device.polygon_mode(), PolygonMode::Fill);
    device.set_polygon_mode(PolygonMode::Line);
    assert_eq!(device.polygon_mode(), PolygonMode::Line);
}

#[test]
fn test_placeholder_program_is_cached() {
    let mut device = HeadlessDevice::new();
    let a = device.placeholder_program().unwrap();
    let b = device.placeholder_program().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.label(), "placeholder");
}

#[test]
fn test_destroy_bound_framebuffer_unbinds() {
    let mut device = HeadlessDevice::new();
    let (fb, _, _) = complete_framebuffer(&mut device, 4, 4);
    device.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
    device.bind_framebuffer(FramebufferTarget::Read, Some(fb));
    device.destroy_framebuffer(fb);
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Draw), None);
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Read), None);
    assert_eq!(device.live_framebuffer_count(), 0);
}

#[test]
fn test_take_commands_drains_log() {
    let mut device = HeadlessDevice::new();
    device.set_viewport(Viewport::full(8, 8));
    assert_eq!(device.take_commands().len(), 1);
    assert!(device.commands().is_empty());
    assert_eq!(device.viewport(), Some(Viewport::full(8, 8)));
}

// ============================================================================
// ScopedFramebufferBinding
// ============================================================================

#[test]
fn test_scoped_binding_restores_on_drop() {
    let mut device = HeadlessDevice::new();
    let (outer, _, _) = complete_framebuffer(&mut device, 4, 4);
    let (inner, _, _) = complete_framebuffer(&mut device, 4, 4);

    device.bind_framebuffer(FramebufferTarget::Draw, Some(outer));
    device.bind_framebuffer(FramebufferTarget::Read, None);

    {
        let mut scoped = ScopedFramebufferBinding::new(&mut device);
        assert_eq!(scoped.saved(), (Some(outer), None));
        scoped.bind_framebuffer(FramebufferTarget::Draw, Some(inner));
        scoped.bind_framebuffer(FramebufferTarget::Read, Some(inner));
        assert_eq!(scoped.bound_framebuffer(FramebufferTarget::Draw), Some(inner));
    }

    assert_eq!(device.bound_framebuffer(FramebufferTarget::Draw), Some(outer));
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Read), None);
}

#[test]
fn test_scoped_binding_restores_on_error_return() {
    fn failing(device: &mut dyn GraphicsDevice, fb: FramebufferKey) -> crate::error::Result<()> {
        let mut scoped = ScopedFramebufferBinding::new(device);
        scoped.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
        scoped.draw(3, 0)?; // no program bound
        Ok(())
    }

    let mut device = HeadlessDevice::new();
    let (fb, _, _) = complete_framebuffer(&mut device, 4, 4);
    assert!(failing(&mut device, fb).is_err());
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Draw), None);
}

#[test]
fn test_scoped_binding_restores_on_panic() {
    let mut device = HeadlessDevice::new();
    let (fb, _, _) = complete_framebuffer(&mut device, 4, 4);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut scoped = ScopedFramebufferBinding::new(&mut device);
        scoped.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
        panic!("scene callback failed");
    }));

    assert!(result.is_err());
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Draw), None);
    assert_eq!(device.bound_framebuffer(FramebufferTarget::Read), None);
}
