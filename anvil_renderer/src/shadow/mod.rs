//! Cascaded shadow module
//!
//! `cascade` holds the pure split and fitting math, `shadow_engine` owns the
//! cascade depth targets and renders them.

mod cascade;
mod shadow_engine;

pub use cascade::{SplitScheme, compute_splits, fit_frustum_to_scene};
pub use shadow_engine::{
    ShadowCascadeEngine, ShadowConfig, ShadowPhase, ShadowCascade,
    ActiveCascade, ShadowFrame, ShadowPassParams, ShadowSkip,
};
