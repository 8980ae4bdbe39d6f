/// Post-processing chain.
///
/// An ordered list of full-screen passes. Each pass reads a set of input
/// textures (scene color, scene depth, the output of an earlier pass or an
/// external texture) and writes one pool render target. Passes only read
/// earlier outputs and never write a target that a pass reads, which
/// `add_pass` enforces, so the chain is acyclic by construction and executes
/// in declared order.
///
/// The blur chain is the reference configuration: level `k` is half the
/// size of level `k - 1` and samples it, level 0 samples the scene color.
/// `from_config` appends one full-size pass per `PostFeature` after it.

use glam::UVec2;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_warn};
use crate::graphics_device::{
    FramebufferTarget, GraphicsDevice, ScopedFramebufferBinding, TextureFormat, TextureKey,
    Viewport,
};
use crate::resource::{ProgramResolver, ResourceId, ResourceTable};
use crate::target::{RenderTargetDesc, RenderTargetHandle, RenderTargetPool};

const SOURCE: &str = "anvil::PostProcessChain";

/// Vertices of the full-screen triangle
const FULLSCREEN_VERTICES: u32 = 3;

/// Optional full-screen effect, listed in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostFeature {
    /// Ambient occlusion from the scene depth
    Ssao,
    /// Screen-space reflections
    Reflection,
    /// Glow built from the blur levels
    Bloom,
    /// Morphological anti-aliasing
    Smaa,
    /// Fade to black
    Blackout,
}

impl PostFeature {
    pub const ALL: [PostFeature; 5] = [
        PostFeature::Ssao,
        PostFeature::Reflection,
        PostFeature::Bloom,
        PostFeature::Smaa,
        PostFeature::Blackout,
    ];

    /// Pass name, also the default program name
    pub fn name(self) -> &'static str {
        match self {
            PostFeature::Ssao => "ssao",
            PostFeature::Reflection => "reflection",
            PostFeature::Bloom => "bloom",
            PostFeature::Smaa => "smaa",
            PostFeature::Blackout => "blackout",
        }
    }
}

/// Program of each feature pass
#[derive(Debug, Clone, PartialEq)]
pub struct PostPrograms {
    pub ssao: ResourceId,
    pub reflection: ResourceId,
    pub bloom: ResourceId,
    pub smaa: ResourceId,
    pub blackout: ResourceId,
}

impl Default for PostPrograms {
    fn default() -> Self {
        Self {
            ssao: ResourceId::new(PostFeature::Ssao.name()),
            reflection: ResourceId::new(PostFeature::Reflection.name()),
            bloom: ResourceId::new(PostFeature::Bloom.name()),
            smaa: ResourceId::new(PostFeature::Smaa.name()),
            blackout: ResourceId::new(PostFeature::Blackout.name()),
        }
    }
}

impl PostPrograms {
    pub fn get(&self, feature: PostFeature) -> ResourceId {
        match feature {
            PostFeature::Ssao => self.ssao,
            PostFeature::Reflection => self.reflection,
            PostFeature::Bloom => self.bloom,
            PostFeature::Smaa => self.smaa,
            PostFeature::Blackout => self.blackout,
        }
    }
}

/// Post configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PostConfig {
    /// Number of blur levels; 0 disables the blur chain
    pub blur_levels: usize,
    pub color_format: TextureFormat,
    /// Downsample-and-blur program shared by every level
    pub blur_program: ResourceId,
    pub ssao: bool,
    pub reflection: bool,
    pub bloom: bool,
    pub smaa: bool,
    pub blackout: bool,
    pub programs: PostPrograms,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            blur_levels: 5,
            color_format: TextureFormat::Rgba16Float,
            blur_program: ResourceId::new("blur_downsample"),
            ssao: false,
            reflection: false,
            bloom: false,
            smaa: false,
            blackout: false,
            programs: PostPrograms::default(),
        }
    }
}

impl PostConfig {
    pub fn feature_enabled(&self, feature: PostFeature) -> bool {
        match feature {
            PostFeature::Ssao => self.ssao,
            PostFeature::Reflection => self.reflection,
            PostFeature::Bloom => self.bloom,
            PostFeature::Smaa => self.smaa,
            PostFeature::Blackout => self.blackout,
        }
    }

    pub fn set_feature(&mut self, feature: PostFeature, enabled: bool) {
        let flag = match feature {
            PostFeature::Ssao => &mut self.ssao,
            PostFeature::Reflection => &mut self.reflection,
            PostFeature::Bloom => &mut self.bloom,
            PostFeature::Smaa => &mut self.smaa,
            PostFeature::Blackout => &mut self.blackout,
        };
        *flag = enabled;
    }
}

/// Texture read by a pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassInput {
    SceneColor,
    SceneDepth,
    /// Output of an earlier pass, by index
    Pass(usize),
    External(TextureKey),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostPass {
    pub name: String,
    pub program: ResourceId,
    /// Bound to texture units 0, 1, ... in order
    pub inputs: Vec<PassInput>,
    pub output: RenderTargetHandle,
    pub enabled: bool,
}

impl PostPass {
    pub fn new(
        name: &str,
        program: impl Into<ResourceId>,
        inputs: Vec<PassInput>,
        output: RenderTargetHandle,
    ) -> Self {
        Self { name: name.to_string(), program: program.into(), inputs, output, enabled: true }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Outcome of one `execute()`
#[derive(Debug, Clone, PartialEq)]
pub struct PostReport {
    /// Indices of the passes that drew, in order
    pub executed: Vec<usize>,
    /// Output of the last pass, or the scene color for an empty chain
    pub final_texture: TextureKey,
}

#[derive(Debug, Default)]
pub struct PostProcessChain {
    passes: Vec<PostPass>,
    /// Pass index of each blur level
    blur_levels: Vec<usize>,
    /// Pass index of each feature pass
    features: Vec<(PostFeature, usize)>,
}

impl PostProcessChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of each blur level for a chain built on `base`.
    ///
    /// Every level halves the previous one, rounding down, and never goes
    /// below 1x1.
    pub fn level_sizes(base: UVec2, levels: usize) -> Vec<UVec2> {
        let mut sizes = Vec::with_capacity(levels);
        let mut size = base.max(UVec2::ONE);
        for _ in 0..levels {
            size = (size / 2).max(UVec2::ONE);
            sizes.push(size);
        }
        sizes
    }

    /// Build the blur chain: `levels` passes, each downsampling the previous
    /// level with `program`.
    ///
    /// Every level target is acquired from `pool`; on failure the targets
    /// acquired so far are released.
    pub fn blur_chain(
        device: &mut dyn GraphicsDevice,
        pool: &mut RenderTargetPool,
        base: UVec2,
        levels: usize,
        format: TextureFormat,
        program: impl Into<ResourceId>,
    ) -> Result<Self> {
        if format.is_depth() {
            let err = Error::UnsupportedFormat(format!("blur chain format {:?}", format));
            engine_error!(SOURCE, "{}", err);
            return Err(err);
        }

        let program = program.into();
        let mut chain = Self::new();
        for (level, size) in Self::level_sizes(base, levels).into_iter().enumerate() {
            let desc = RenderTargetDesc::color_only(size, format, &format!("post.blur{}", level));
            let output = match pool.acquire(device, desc) {
                Ok(output) => output,
                Err(err) => {
                    chain.release(device, pool);
                    return Err(err);
                }
            };
            let input = if level == 0 { PassInput::SceneColor } else { PassInput::Pass(level - 1) };
            let index = chain.add_pass(PostPass::new(&format!("blur{}", level), program, vec![input], output))?;
            chain.blur_levels.push(index);
        }

        engine_debug!(SOURCE, "blur chain of {} levels from {}x{}", levels, base.x, base.y);
        Ok(chain)
    }

    /// Chain described by `config`: the blur chain, then one pass per
    /// `PostFeature`.
    ///
    /// Every feature pass is built at `base` size whether or not its toggle
    /// is on; the toggle only sets the pass's `enabled` flag, so features can
    /// be switched at runtime with `set_feature`. Each feature reads the
    /// color produced by the feature before it (the scene color for the
    /// first), plus:
    ///
    /// - `Ssao`, `Reflection`: the scene depth
    /// - `Bloom`: every blur level, in level order
    pub fn from_config(
        device: &mut dyn GraphicsDevice,
        pool: &mut RenderTargetPool,
        base: UVec2,
        config: &PostConfig,
    ) -> Result<Self> {
        let mut chain =
            Self::blur_chain(device, pool, base, config.blur_levels, config.color_format, config.blur_program)?;
        if let Err(err) = chain.add_features(device, pool, base, config) {
            chain.release(device, pool);
            return Err(err);
        }
        Ok(chain)
    }

    fn add_features(
        &mut self,
        device: &mut dyn GraphicsDevice,
        pool: &mut RenderTargetPool,
        base: UVec2,
        config: &PostConfig,
    ) -> Result<()> {
        let mut color = PassInput::SceneColor;
        for feature in PostFeature::ALL {
            let mut inputs = vec![color];
            match feature {
                PostFeature::Ssao | PostFeature::Reflection => inputs.push(PassInput::SceneDepth),
                PostFeature::Bloom => inputs.extend(self.blur_levels.iter().map(|&i| PassInput::Pass(i))),
                PostFeature::Smaa | PostFeature::Blackout => {}
            }

            let desc = RenderTargetDesc::color_only(
                base.max(UVec2::ONE),
                config.color_format,
                &format!("post.{}", feature.name()),
            );
            let output = pool.acquire(device, desc)?;
            let pass = PostPass::new(feature.name(), config.programs.get(feature), inputs, output)
                .with_enabled(config.feature_enabled(feature));
            let index = match self.add_pass(pass) {
                Ok(index) => index,
                Err(err) => {
                    let _ = pool.release(device, output);
                    return Err(err);
                }
            };
            self.features.push((feature, index));
            color = PassInput::Pass(index);
        }

        let enabled: Vec<&str> = PostFeature::ALL
            .iter()
            .filter(|f| config.feature_enabled(**f))
            .map(|f| f.name())
            .collect();
        engine_debug!(SOURCE, "feature passes built, enabled: [{}]", enabled.join(", "));
        Ok(())
    }

    /// Append a pass and return its index.
    ///
    /// # Errors
    ///
    /// `InvalidResource` if
    /// - an input reads this pass or a later one
    /// - the pass writes the target of a pass it reads
    /// - the pass writes a target that a pass already in the chain reads
    pub fn add_pass(&mut self, pass: PostPass) -> Result<usize> {
        let index = self.passes.len();
        for input in &pass.inputs {
            if let PassInput::Pass(k) = *input {
                if k >= index {
                    return Err(Error::InvalidResource(format!(
                        "post pass '{}' (#{}) reads pass #{}; only earlier passes can be read",
                        pass.name, index, k
                    )));
                }
                if self.passes[k].output == pass.output {
                    return Err(Error::InvalidResource(format!(
                        "post pass '{}' (#{}) writes the target it reads from pass #{}",
                        pass.name, index, k
                    )));
                }
            }
        }

        // A later write would change what an earlier reader samples
        for (j, reader) in self.passes.iter().enumerate() {
            for input in &reader.inputs {
                if let PassInput::Pass(k) = *input {
                    if self.passes[k].output == pass.output {
                        return Err(Error::InvalidResource(format!(
                            "post pass '{}' (#{}) writes the target of pass #{}, which pass #{} reads",
                            pass.name, index, k, j
                        )));
                    }
                }
            }
        }

        self.passes.push(pass);
        Ok(index)
    }

    /// Run every pass in order.
    ///
    /// A disabled pass draws nothing and forwards its first input as its
    /// output. Framebuffer bindings are restored before returning.
    pub fn execute(
        &self,
        device: &mut dyn GraphicsDevice,
        pool: &RenderTargetPool,
        resolver: &mut ProgramResolver,
        resources: &ResourceTable,
        scene_color: TextureKey,
        scene_depth: Option<TextureKey>,
    ) -> Result<PostReport> {
        let mut outputs: Vec<Option<TextureKey>> = Vec::with_capacity(self.passes.len());
        let mut executed = Vec::new();

        let mut scoped = ScopedFramebufferBinding::new(device);
        for (index, pass) in self.passes.iter().enumerate() {
            let inputs: Vec<Option<TextureKey>> = pass.inputs
                .iter()
                .map(|input| match *input {
                    PassInput::SceneColor => Some(scene_color),
                    PassInput::SceneDepth => scene_depth,
                    PassInput::Pass(k) => outputs.get(k).copied().flatten(),
                    PassInput::External(texture) => Some(texture),
                })
                .collect();

            if !pass.enabled {
                outputs.push(inputs.first().copied().flatten());
                continue;
            }

            let (Some(framebuffer), Some(size)) = (pool.framebuffer(pass.output), pool.size(pass.output)) else {
                return Err(Error::InvalidResource(format!(
                    "post pass '{}' writes a released target", pass.name
                )));
            };

            scoped.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));
            scoped.set_viewport(Viewport::full(size.x, size.y));
            let program = resolver.resolve(&mut *scoped, resources, pass.program)?.program;
            scoped.bind_program(&program)?;
            for (unit, texture) in inputs.iter().enumerate() {
                match texture {
                    Some(texture) => scoped.bind_texture(unit as u32, *texture)?,
                    None => engine_warn!(
                        SOURCE, "post pass '{}' input {} has no texture, unit left unbound",
                        pass.name, unit
                    ),
                }
            }
            scoped.draw(FULLSCREEN_VERTICES, 0)?;

            outputs.push(pool.color_texture(pass.output));
            executed.push(index);
        }
        drop(scoped);

        let final_texture = outputs.last().copied().flatten().unwrap_or(scene_color);
        Ok(PostReport { executed, final_texture })
    }

    /// Target sizes of the chain-built passes for a new base size: blur
    /// levels at their level size, feature passes at `base`. Passes added
    /// by hand are not listed.
    pub fn target_sizes(&self, base: UVec2) -> Vec<(RenderTargetHandle, UVec2)> {
        let levels = Self::level_sizes(base, self.blur_levels.len());
        let mut sizes: Vec<(RenderTargetHandle, UVec2)> = self.blur_levels
            .iter()
            .zip(levels)
            .map(|(&index, size)| (self.passes[index].output, size))
            .collect();
        sizes.extend(self.features.iter().map(|&(_, index)| (self.passes[index].output, base.max(UVec2::ONE))));
        sizes
    }

    /// Resize the chain-built passes for a new base size. Passes added by
    /// hand keep their targets. On failure no target changes size.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, pool: &mut RenderTargetPool, base: UVec2) -> Result<()> {
        pool.resize_all(device, &self.target_sizes(base))
    }

    /// Release every pass output and empty the chain
    pub fn release(&mut self, device: &mut dyn GraphicsDevice, pool: &mut RenderTargetPool) {
        for pass in self.passes.drain(..) {
            let _ = pool.release(device, pass.output);
        }
        self.blur_levels.clear();
        self.features.clear();
    }

    // ===== ACCESSORS =====

    /// Color texture of blur level `level`
    pub fn level_texture(&self, pool: &RenderTargetPool, level: usize) -> Option<TextureKey> {
        let index = *self.blur_levels.get(level)?;
        pool.color_texture(self.passes[index].output)
    }

    pub fn level_count(&self) -> usize {
        self.blur_levels.len()
    }

    pub fn pass(&self, index: usize) -> Option<&PostPass> {
        self.passes.get(index)
    }

    pub fn passes(&self) -> &[PostPass] {
        &self.passes
    }

    /// Pass index of a feature, `None` if the chain was not built by
    /// `from_config`
    pub fn feature_pass(&self, feature: PostFeature) -> Option<usize> {
        self.features.iter().find(|(f, _)| *f == feature).map(|&(_, index)| index)
    }

    /// Toggle a feature pass. Returns false if the chain has no such pass.
    pub fn set_feature(&mut self, feature: PostFeature, enabled: bool) -> bool {
        match self.feature_pass(feature) {
            Some(index) => self.set_enabled(index, enabled),
            None => false,
        }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.passes.iter().position(|p| p.name == name)
    }

    /// Toggle a pass. Returns false if `index` does not exist.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.passes.get_mut(index) {
            Some(pass) => {
                pass.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

#[cfg(test)]
#[path = "post_chain_tests.rs"]
mod tests;
