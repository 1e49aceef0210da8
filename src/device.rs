//! Device
//!
//! The [`Device`] is factory, cache and frame/state coordinator in one: it
//! creates every resource object, deduplicates expensive pipeline objects,
//! tracks live resources for leak diagnostics, and flushes recorded pass
//! encoders to the native backend.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use prism::{BackendKind, Device, DeviceDescriptor, select_backend};
//!
//! let (vendor, ctx) = select_backend(&[BackendKind::Vulkan, BackendKind::Gles3], probe)?;
//! let mut device = Device::new(vendor, ctx, DeviceDescriptor::default())?;
//!
//! let buffer = device.create_buffer(&BufferDescriptor::new(
//!     BufferSource::from_slice(&vertices),
//!     BufferUsage::VERTEX,
//! ))?;
//! // … create program / pipeline / bindings, record a pass, submit …
//! buffer.destroy()?;
//! assert!(device.check_for_leaks().is_empty());
//! device.destroy()?;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use crate::backend::{NativeContext, NativeLimits, RawBuffer, RawProgram};
use crate::errors::{PrismError, Result};
use crate::format::{BufferUsage, Format, TextureUsage};
use crate::pass::{ComputeCmd, ComputePass, RenderBundle, RenderCmd, RenderPass, RenderPassDescriptor};
use crate::resources::pipeline::PipelineKey;
use crate::resources::program::ProgramReflection;
use crate::resources::{
    Bindings, BindingsDescriptor, Buffer, BufferDescriptor, ComputePipeline, InputLayout,
    InputLayoutDescriptor, LeakReport, Program, ProgramDescriptor, QueryPool, QueryPoolDescriptor,
    RenderPipeline, RenderPipelineDescriptor, RenderTarget, RenderTargetDescriptor, ResourceId,
    ResourceRegistry, Sampler, SamplerDescriptor, Texture, TextureDescriptor,
};
use crate::shader::{self, PreprocessedShader, SamplerBinding, ShaderStage, SourceUnit};
use crate::vendor::{BackendKind, VendorProfile};

/// Global configuration consumed once at device creation.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub label: Option<String>,
    /// Size of the placeholder buffer bound when no real buffer is supplied
    /// for a slot.
    pub fallback_buffer_size: u64,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            fallback_buffer_size: 256,
        }
    }
}

/// Walks the caller's backend preference order and returns the first context
/// the host supports. No automatic fallback beyond the given order.
pub fn select_backend<F>(
    preference: &[BackendKind],
    mut probe: F,
) -> Result<(VendorProfile, Rc<dyn NativeContext>)>
where
    F: FnMut(BackendKind) -> Option<Rc<dyn NativeContext>>,
{
    for &kind in preference {
        if let Some(ctx) = probe(kind) {
            log::debug!("selected {kind:?} backend");
            return Ok((VendorProfile::for_backend(kind), ctx));
        }
    }
    Err(PrismError::BackendUnavailable {
        tried: preference.to_vec(),
    })
}

/// Per-submission translation state.
struct RenderSubmitState {
    pipeline: Option<Rc<RenderPipeline>>,
    index_bound: bool,
}

/// See the module docs.
pub struct Device {
    vendor: VendorProfile,
    ctx: Rc<dyn NativeContext>,
    limits: NativeLimits,
    registry: Rc<RefCell<ResourceRegistry>>,
    fallback_buffer: RawBuffer,
    fallback_size: u64,
    /// Cross-compilation cache keyed by xxh3-128 of (vendor, stage, source,
    /// defines).
    shader_cache: FxHashMap<u128, Rc<PreprocessedShader>>,
    /// Structural pipeline deduplication cache.
    pipeline_cache: FxHashMap<PipelineKey, Rc<RenderPipeline>>,
    /// Currently bound native program, used to elide redundant binds.
    bound_program: Option<RawProgram>,
    /// Currently applied pipeline state, likewise.
    bound_pipeline: Option<ResourceId>,
    frame_index: u64,
    destroyed: bool,
    label: Option<String>,
}

impl Device {
    /// Builds a device over an already-acquired native context.
    pub fn new(
        vendor: VendorProfile,
        ctx: Rc<dyn NativeContext>,
        desc: DeviceDescriptor,
    ) -> Result<Self> {
        let limits = ctx.limits();
        let fallback_buffer = ctx.create_buffer(
            desc.fallback_buffer_size,
            BufferUsage::UNIFORM,
            crate::format::UpdateHint::Static,
        )?;
        log::debug!(
            "device created on {:?} backend ({})",
            vendor.backend,
            desc.label.as_deref().unwrap_or("unlabeled")
        );
        Ok(Self {
            vendor,
            ctx,
            limits,
            registry: Rc::new(RefCell::new(ResourceRegistry::default())),
            fallback_buffer,
            fallback_size: desc.fallback_buffer_size,
            shader_cache: FxHashMap::default(),
            pipeline_cache: FxHashMap::default(),
            bound_program: None,
            bound_pipeline: None,
            frame_index: 0,
            destroyed: false,
            label: desc.label,
        })
    }

    #[must_use]
    pub fn vendor(&self) -> &VendorProfile {
        &self.vendor
    }

    #[must_use]
    pub fn limits(&self) -> NativeLimits {
        self.limits
    }

    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of resources currently registered as live.
    #[must_use]
    pub fn live_resource_count(&self) -> usize {
        self.registry.borrow().live_count()
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(PrismError::DeviceDestroyed)
        } else {
            Ok(())
        }
    }

    // ── Resource factories ──────────────────────────────────────────────

    pub fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> Result<Rc<Buffer>> {
        self.ensure_alive()?;
        Buffer::new(
            Rc::clone(&self.ctx),
            &self.registry,
            desc,
            self.limits.max_buffer_size,
        )
        .map(Rc::new)
    }

    pub fn create_texture(&mut self, desc: &TextureDescriptor<'_>) -> Result<Rc<Texture>> {
        self.ensure_alive()?;
        // The legacy backend cannot render into float targets.
        if self.vendor.is_legacy()
            && desc.usage.contains(TextureUsage::RENDER_TARGET)
            && matches!(
                desc.format,
                Format::F16Rg | Format::F16Rgba | Format::F32R | Format::F32Rg | Format::F32Rgb | Format::F32Rgba
            )
        {
            return Err(PrismError::UnsupportedFormat {
                format: desc.format,
                backend: self.vendor.backend,
            });
        }
        Texture::new(Rc::clone(&self.ctx), &self.registry, desc).map(Rc::new)
    }

    pub fn create_sampler(&mut self, desc: &SamplerDescriptor<'_>) -> Result<Rc<Sampler>> {
        self.ensure_alive()?;
        Sampler::new(Rc::clone(&self.ctx), &self.registry, desc).map(Rc::new)
    }

    pub fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor<'_>,
    ) -> Result<Rc<RenderTarget>> {
        self.ensure_alive()?;
        if desc.colors.len() > 1 && !self.vendor.supports_mrt {
            return Err(PrismError::TooManyColorAttachments {
                requested: desc.colors.len(),
                supported: 1,
            });
        }
        if desc.colors.len() > self.limits.max_color_attachments as usize {
            return Err(PrismError::TooManyColorAttachments {
                requested: desc.colors.len(),
                supported: self.limits.max_color_attachments,
            });
        }
        RenderTarget::new(Rc::clone(&self.ctx), &self.registry, desc).map(Rc::new)
    }

    pub fn create_query_pool(&mut self, desc: &QueryPoolDescriptor<'_>) -> Result<Rc<QueryPool>> {
        self.ensure_alive()?;
        QueryPool::new(Rc::clone(&self.ctx), &self.registry, desc).map(Rc::new)
    }

    pub fn create_input_layout(
        &mut self,
        desc: &InputLayoutDescriptor<'_>,
    ) -> Result<Rc<InputLayout>> {
        self.ensure_alive()?;
        InputLayout::new(Rc::clone(&self.ctx), &self.registry, desc).map(Rc::new)
    }

    /// Routes each source unit through the cross-compiler for this device's
    /// vendor profile, links the stages, and caches the extracted
    /// sampler-binding and uniform-leaf metadata on the program.
    pub fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<Rc<Program>> {
        self.ensure_alive()?;

        let is_compute = match (&desc.vertex, &desc.fragment, &desc.compute) {
            (Some(_), Some(_), None) => false,
            (None, None, Some(_)) => {
                if !self.vendor.supports_compute {
                    return Err(PrismError::ComputeUnsupported(self.vendor.backend));
                }
                true
            }
            _ => {
                return Err(PrismError::InvalidProgramStages(
                    "expected vertex + fragment, or compute alone",
                ));
            }
        };

        let vertex = desc.vertex.as_ref().map(|u| self.cached_preprocess(u));
        let fragment = desc.fragment.as_ref().map(|u| self.cached_preprocess(u));
        let compute = desc.compute.as_ref().map(|u| self.cached_preprocess(u));

        let handle = self.ctx.create_program(
            vertex.as_ref().map(|s| s.source.as_str()),
            fragment.as_ref().map(|s| s.source.as_str()),
            compute.as_ref().map(|s| s.source.as_str()),
        )?;

        // Merge per-stage sampler reflections: first appearance wins, merged
        // order assigns the program-level logical slots.
        let mut samplers: Vec<SamplerBinding> = Vec::new();
        for stage in [&vertex, &fragment, &compute].into_iter().flatten() {
            for binding in &stage.samplers {
                if !samplers.iter().any(|s| s.name == binding.name) {
                    samplers.push(SamplerBinding {
                        name: binding.name.clone(),
                        kind: binding.kind,
                        slot: samplers.len() as u32,
                    });
                }
            }
        }

        let mut uniform_blocks: Vec<String> = Vec::new();
        let mut uniform_leaves: Vec<String> = Vec::new();
        for unit in [&desc.vertex, &desc.fragment, &desc.compute]
            .into_iter()
            .flatten()
        {
            for name in shader::uniform_block_names(unit.source) {
                if !uniform_blocks.contains(&name) {
                    uniform_blocks.push(name);
                }
            }
            for leaf in shader::extract_uniform_leaf_names(unit.source) {
                if !uniform_leaves.contains(&leaf) {
                    uniform_leaves.push(leaf);
                }
            }
        }

        // Name-resolved slot routing for dialects without explicit binding
        // locations.
        if !self.vendor.explicit_binding_locations {
            if self.vendor.supports_uniform_buffers {
                for (slot, name) in uniform_blocks.iter().enumerate() {
                    self.ctx.bind_uniform_slot(handle, name, slot as u32);
                }
            }
            for sampler in &samplers {
                self.ctx.bind_uniform_slot(handle, &sampler.name, sampler.slot);
            }
        }

        Ok(Rc::new(Program::new(
            Rc::clone(&self.ctx),
            &self.registry,
            handle,
            ProgramReflection {
                samplers,
                uniform_blocks,
                uniform_leaves,
            },
            is_compute,
            desc.label,
        )))
    }

    /// Cross-compiles one source unit, reusing the cached translation when
    /// the same unit was already compiled for this vendor.
    fn cached_preprocess(&mut self, unit: &SourceUnit<'_>) -> Rc<PreprocessedShader> {
        let mut key_bytes = Vec::with_capacity(unit.source.len() + 64);
        key_bytes.push(self.vendor.backend as u8);
        key_bytes.push(match unit.stage {
            ShaderStage::Vertex => 0,
            ShaderStage::Fragment => 1,
            ShaderStage::Compute => 2,
        });
        key_bytes.push(u8::from(unit.inject_precision));
        key_bytes.extend_from_slice(unit.source.as_bytes());
        if let Some(defines) = unit.defines {
            for (k, v) in defines {
                key_bytes.extend_from_slice(k.as_bytes());
                key_bytes.push(b'=');
                key_bytes.extend_from_slice(v.as_bytes());
                key_bytes.push(b';');
            }
        }
        let key = xxh3_128(&key_bytes);

        if let Some(cached) = self.shader_cache.get(&key) {
            return Rc::clone(cached);
        }
        let compiled = Rc::new(shader::preprocess(&self.vendor, unit));
        self.shader_cache.insert(key, Rc::clone(&compiled));
        compiled
    }

    /// Creates (or reuses) a render pipeline. Descriptors that are
    /// value-identical to a previously created pipeline return the cached
    /// object rather than recompiling.
    pub fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor<'_>,
    ) -> Result<Rc<RenderPipeline>> {
        self.ensure_alive()?;
        if desc.color_formats.len() > 1 && !self.vendor.supports_mrt {
            return Err(PrismError::TooManyColorAttachments {
                requested: desc.color_formats.len(),
                supported: 1,
            });
        }

        let key = PipelineKey {
            program: desc.program.id(),
            input_layout: desc.input_layout.id(),
            color_formats: desc.color_formats.iter().copied().collect(),
            depth_format: desc.depth_format,
            state: desc.state,
        };
        if let Some(cached) = self.pipeline_cache.get(&key)
            && !cached.is_destroyed()
        {
            return Ok(Rc::clone(cached));
        }

        let pipeline = Rc::new(RenderPipeline::new(
            Rc::clone(&self.ctx),
            &self.registry,
            desc,
            self.vendor.explicit_binding_locations,
        )?);
        self.pipeline_cache.insert(key, Rc::clone(&pipeline));
        Ok(pipeline)
    }

    pub fn create_compute_pipeline(
        &mut self,
        program: &Rc<Program>,
        label: Option<&str>,
    ) -> Result<Rc<ComputePipeline>> {
        self.ensure_alive()?;
        if !self.vendor.supports_compute {
            return Err(PrismError::ComputeUnsupported(self.vendor.backend));
        }
        ComputePipeline::new(Rc::clone(&self.ctx), &self.registry, program, label).map(Rc::new)
    }

    pub fn create_bindings(
        &mut self,
        pipeline: &Rc<RenderPipeline>,
        desc: &BindingsDescriptor<'_>,
    ) -> Result<Rc<Bindings>> {
        self.ensure_alive()?;
        pipeline.ensure_alive()?;
        Bindings::new(Rc::clone(&self.ctx), &self.registry, pipeline.id(), desc).map(Rc::new)
    }

    pub fn create_compute_bindings(
        &mut self,
        pipeline: &Rc<ComputePipeline>,
        desc: &BindingsDescriptor<'_>,
    ) -> Result<Rc<Bindings>> {
        self.ensure_alive()?;
        pipeline.ensure_alive()?;
        Bindings::new(Rc::clone(&self.ctx), &self.registry, pipeline.id(), desc).map(Rc::new)
    }

    // ── Pass encoders ───────────────────────────────────────────────────

    pub fn create_render_pass(&mut self, desc: &RenderPassDescriptor<'_>) -> Result<RenderPass> {
        self.ensure_alive()?;
        Ok(RenderPass::new(desc))
    }

    pub fn create_compute_pass(&mut self) -> Result<ComputePass> {
        self.ensure_alive()?;
        if !self.vendor.supports_compute {
            return Err(PrismError::ComputeUnsupported(self.vendor.backend));
        }
        Ok(ComputePass::new())
    }

    pub fn create_render_bundle(&mut self) -> Result<RenderBundle> {
        self.ensure_alive()?;
        Ok(RenderBundle::new())
    }

    // ── Frame lifecycle ─────────────────────────────────────────────────

    pub fn begin_frame(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.frame_index += 1;
        self.ctx.begin_frame();
        Ok(())
    }

    pub fn end_frame(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.ctx.end_frame();
        Ok(())
    }

    // ── Submission ──────────────────────────────────────────────────────

    /// Flushes a recorded render pass: commands execute in recording order,
    /// with redundant program/state binds elided via the device's
    /// bound-object caches.
    pub fn submit_render_pass(&mut self, pass: RenderPass) -> Result<()> {
        self.ensure_alive()?;
        let target = pass.target.as_ref().map(|t| t.raw()).transpose()?;
        self.ctx
            .begin_render_pass(target, pass.clear_color, pass.clear_depth);

        let mut state = RenderSubmitState {
            pipeline: None,
            index_bound: false,
        };
        let result = self.run_render_cmds(&pass.cmds, &mut state);
        self.ctx.end_render_pass();
        result
    }

    fn run_render_cmds(
        &mut self,
        cmds: &[RenderCmd],
        state: &mut RenderSubmitState,
    ) -> Result<()> {
        for cmd in cmds {
            match cmd {
                RenderCmd::SetPipeline(pipeline) => {
                    pipeline.ensure_alive()?;
                    let program = pipeline.program().raw()?;
                    if self.bound_program != Some(program) {
                        self.ctx.bind_program(program);
                        self.bound_program = Some(program);
                    }
                    if self.bound_pipeline != Some(pipeline.id()) {
                        self.ctx.set_render_state(pipeline.state());
                        self.bound_pipeline = Some(pipeline.id());
                    }
                    state.pipeline = Some(Rc::clone(pipeline));
                    state.index_bound = false;
                }
                RenderCmd::SetVertexInput { buffers, index } => {
                    let pipeline = state
                        .pipeline
                        .as_ref()
                        .ok_or(PrismError::PassStateMissing("pipeline before vertex input"))?;
                    let layout = pipeline.input_layout();
                    for attribute in pipeline.resolved_attributes() {
                        let Some(binding) = buffers.get(attribute.buffer_index) else {
                            return Err(PrismError::InvalidDescriptor(format!(
                                "vertex input supplies {} buffers, attribute needs index {}",
                                buffers.len(),
                                attribute.buffer_index
                            )));
                        };
                        let (page, page_offset) = binding.buffer.page_for(binding.offset)?;
                        let buffer_layout = layout.buffers()[attribute.buffer_index];
                        self.ctx.set_vertex_attribute(
                            attribute.location,
                            page,
                            attribute.format,
                            page_offset + attribute.offset,
                            buffer_layout.stride,
                            buffer_layout.step,
                        );
                    }
                    if let Some(index_buffer) = index {
                        let format = layout.index_format().ok_or_else(|| {
                            PrismError::InvalidDescriptor(
                                "index buffer bound but the input layout declares no index format"
                                    .into(),
                            )
                        })?;
                        let (page, _) = index_buffer.page_for(0)?;
                        self.ctx.bind_index_buffer(page, format);
                        state.index_bound = true;
                    }
                }
                RenderCmd::SetBindings(bindings) => {
                    let pipeline = state
                        .pipeline
                        .as_ref()
                        .ok_or(PrismError::PassStateMissing("pipeline before bindings"))?;
                    self.apply_bindings(bindings, pipeline.id())?;
                }
                RenderCmd::SetViewport {
                    x,
                    y,
                    width,
                    height,
                } => self.ctx.set_viewport(*x, *y, *width, *height),
                RenderCmd::SetScissor {
                    x,
                    y,
                    width,
                    height,
                } => self.ctx.set_scissor(*x, *y, *width, *height),
                RenderCmd::Draw {
                    vertex_count,
                    instance_count,
                    first_vertex,
                } => {
                    let pipeline = state
                        .pipeline
                        .as_ref()
                        .ok_or(PrismError::PassStateMissing("pipeline before draw"))?;
                    self.ctx.draw(
                        pipeline.state().topology,
                        *vertex_count,
                        *instance_count,
                        *first_vertex,
                    );
                }
                RenderCmd::DrawIndexed {
                    index_count,
                    instance_count,
                    first_index,
                } => {
                    let pipeline = state
                        .pipeline
                        .as_ref()
                        .ok_or(PrismError::PassStateMissing("pipeline before draw"))?;
                    if !state.index_bound {
                        return Err(PrismError::PassStateMissing(
                            "index buffer before indexed draw",
                        ));
                    }
                    self.ctx.draw_indexed(
                        pipeline.state().topology,
                        *index_count,
                        *instance_count,
                        *first_index,
                    );
                }
                RenderCmd::BeginOcclusionQuery { pool, index } => {
                    let raw = pool.raw()?;
                    if *index >= pool.count() {
                        return Err(PrismError::QueryIndexOutOfRange {
                            index: *index,
                            count: pool.count(),
                        });
                    }
                    self.ctx.begin_query(raw, *index);
                }
                RenderCmd::EndOcclusionQuery { pool } => {
                    self.ctx.end_query(pool.raw()?);
                }
                RenderCmd::ExecuteBundle(bundle) => {
                    self.run_render_cmds(&bundle.cmds, state)?;
                }
            }
        }
        Ok(())
    }

    /// Flushes a recorded compute pass.
    pub fn submit_compute_pass(&mut self, pass: ComputePass) -> Result<()> {
        self.ensure_alive()?;
        let mut current: Option<Rc<ComputePipeline>> = None;
        for cmd in &pass.cmds {
            match cmd {
                ComputeCmd::SetPipeline(pipeline) => {
                    pipeline.ensure_alive()?;
                    let program = pipeline.program().raw()?;
                    if self.bound_program != Some(program) {
                        self.ctx.bind_program(program);
                        self.bound_program = Some(program);
                    }
                    current = Some(Rc::clone(pipeline));
                }
                ComputeCmd::SetBindings(bindings) => {
                    let pipeline = current
                        .as_ref()
                        .ok_or(PrismError::PassStateMissing("pipeline before bindings"))?;
                    self.apply_bindings(bindings, pipeline.id())?;
                }
                ComputeCmd::Dispatch { x, y, z } => {
                    current
                        .as_ref()
                        .ok_or(PrismError::PassStateMissing("pipeline before dispatch"))?;
                    self.ctx.dispatch(*x, *y, *z);
                }
            }
        }
        Ok(())
    }

    fn apply_bindings(&self, bindings: &Rc<Bindings>, pipeline_id: ResourceId) -> Result<()> {
        bindings.ensure_alive()?;
        if bindings.pipeline_id() != pipeline_id {
            return Err(PrismError::BindingsPipelineMismatch {
                bindings: bindings.id(),
                expected: bindings.pipeline_id(),
                actual: pipeline_id,
            });
        }
        for (slot, entry) in bindings.uniform_buffers().iter().enumerate() {
            match entry {
                Some(binding) => {
                    let (page, page_offset) = binding.buffer.page_for(binding.offset)?;
                    self.ctx
                        .bind_uniform_buffer(slot as u32, page, page_offset, binding.size);
                }
                None => {
                    // Satisfy the backend with the placeholder buffer.
                    self.ctx.bind_uniform_buffer(
                        slot as u32,
                        self.fallback_buffer,
                        0,
                        self.fallback_size,
                    );
                }
            }
        }
        for (slot, entry) in bindings.storage_buffers().iter().enumerate() {
            if let Some(binding) = entry {
                let (page, page_offset) = binding.buffer.page_for(binding.offset)?;
                self.ctx
                    .bind_storage_buffer(slot as u32, page, page_offset, binding.size);
            }
        }
        for (slot, entry) in bindings.samplers().iter().enumerate() {
            if let Some(binding) = entry {
                self.ctx.bind_texture(
                    slot as u32,
                    binding.texture.raw()?,
                    binding.sampler.raw()?,
                );
            }
        }
        Ok(())
    }

    // ── Diagnostics & teardown ──────────────────────────────────────────

    /// Reports every resource not yet destroyed, tagged with its creation
    /// label when available. Advisory: nothing is thrown, nothing is freed.
    #[must_use]
    pub fn check_for_leaks(&self) -> Vec<LeakReport> {
        let survivors = self.registry.borrow().survivors();
        for leak in &survivors {
            log::warn!("leaked resource: {leak}");
        }
        survivors
    }

    /// Tears down the device's own native allocations. Resources still live
    /// are leak-flagged for diagnostics. Destroying twice is a usage error.
    pub fn destroy(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let survivors = self.registry.borrow().survivors();
        if !survivors.is_empty() {
            log::warn!(
                "device destroyed with {} live resources:",
                survivors.len()
            );
            for leak in &survivors {
                log::warn!("  {leak}");
            }
        }
        self.ctx.destroy_buffer(self.fallback_buffer);
        self.destroyed = true;
        log::debug!("device destroyed");
        Ok(())
    }
}
