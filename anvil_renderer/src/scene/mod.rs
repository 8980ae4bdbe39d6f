//! Scene contracts
//!
//! The renderer does not own a scene. Each frame the collaborator hands in
//! borrowed drawables and lights; the renderer reads them and lets go at the
//! end of `render_frame`.

mod drawable;
mod light;
mod uniforms;

pub use drawable::{Drawable, Material, TextureBinding, RenderSet};
pub use light::{DirectionalLight, PointLight, SpotLight, LightSet};
pub use uniforms::{
    PerScene, PerView, LightingUniforms, ShadowUniforms,
    PointLightUniform, SpotLightUniform, ObjectConstants,
    MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS, MAX_CASCADES,
};
