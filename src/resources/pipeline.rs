//! Input Layouts, Pipelines & Bindings
//!
//! A [`RenderPipeline`] is the product of an input layout, a program, the
//! target formats and a fixed-function state block; a [`Bindings`] object is
//! the product of a pipeline and concrete resources at specific slot
//! indices. Bindings are only valid against the pipeline they were created
//! from; slot layout is pipeline-specific.
//!
//! Attribute locations are resolved at pipeline creation: either directly
//! from the descriptor (explicit-location dialects) or by name lookup
//! against the linked program's reflected attribute table (legacy dialects).
//! Attributes whose name the program no longer knows are silently skipped;
//! they may have been compiled out.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::backend::NativeContext;
use crate::errors::{PrismError, Result};
use crate::format::{Format, RenderState, StepMode};

use super::buffer::Buffer;
use super::program::Program;
use super::texture::{Sampler, Texture};
use super::{ResourceCore, ResourceId, ResourceKind, ResourceRegistry};

/// Per-buffer vertex fetch layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    /// Byte stride between consecutive elements.
    pub stride: u32,
    pub step: StepMode,
}

/// One vertex attribute in an input layout.
#[derive(Debug, Clone)]
pub struct VertexAttribute<'a> {
    /// Attribute name as declared in the vertex stage.
    pub name: &'a str,
    /// Explicit location for explicit-binding dialects; legacy dialects
    /// resolve by name instead.
    pub location: Option<u32>,
    /// Which entry of `buffers` feeds this attribute.
    pub buffer_index: usize,
    pub format: Format,
    /// Byte offset inside one element.
    pub offset: u64,
}

/// Input-layout creation options.
pub struct InputLayoutDescriptor<'a> {
    pub buffers: &'a [VertexBufferLayout],
    pub attributes: &'a [VertexAttribute<'a>],
    /// Index-buffer format; restricted to [`Format::U16R`] / [`Format::U32R`]
    /// or absent.
    pub index_format: Option<Format>,
    pub label: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub(crate) struct OwnedAttribute {
    pub name: String,
    pub location: Option<u32>,
    pub buffer_index: usize,
    pub format: Format,
    pub offset: u64,
}

/// The vertex fetch configuration of a pipeline. Owns no native handles.
pub struct InputLayout {
    core: ResourceCore,
    buffers: Vec<VertexBufferLayout>,
    attributes: Vec<OwnedAttribute>,
    index_format: Option<Format>,
}

impl InputLayout {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        desc: &InputLayoutDescriptor<'_>,
    ) -> Result<Self> {
        if let Some(format) = desc.index_format
            && !matches!(format, Format::U16R | Format::U32R)
        {
            return Err(PrismError::InvalidIndexFormat(format));
        }
        for attribute in desc.attributes {
            if attribute.buffer_index >= desc.buffers.len() {
                return Err(PrismError::InvalidDescriptor(format!(
                    "attribute '{}' references buffer {} of {}",
                    attribute.name,
                    attribute.buffer_index,
                    desc.buffers.len()
                )));
            }
        }
        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::InputLayout, desc.label),
            buffers: desc.buffers.to_vec(),
            attributes: desc
                .attributes
                .iter()
                .map(|a| OwnedAttribute {
                    name: a.name.to_string(),
                    location: a.location,
                    buffer_index: a.buffer_index,
                    format: a.format,
                    offset: a.offset,
                })
                .collect(),
            index_format: desc.index_format,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn index_format(&self) -> Option<Format> {
        self.index_format
    }

    pub(crate) fn buffers(&self) -> &[VertexBufferLayout] {
        &self.buffers
    }

    pub(crate) fn attributes(&self) -> &[OwnedAttribute] {
        &self.attributes
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()
    }
}

/// Render-pipeline creation options.
pub struct RenderPipelineDescriptor<'a> {
    pub program: &'a Rc<Program>,
    pub input_layout: &'a Rc<InputLayout>,
    pub color_formats: &'a [Format],
    pub depth_format: Option<Format>,
    pub state: RenderState,
    pub label: Option<&'a str>,
}

/// Structural identity of a render pipeline, used for deduplication:
/// creating a pipeline whose descriptor is value-identical to a previous one
/// reuses the cached object instead of recompiling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: ResourceId,
    pub input_layout: ResourceId,
    pub color_formats: SmallVec<[Format; 4]>,
    pub depth_format: Option<Format>,
    pub state: RenderState,
}

/// One attribute with its location fully resolved.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedAttribute {
    pub location: u32,
    pub buffer_index: usize,
    pub format: Format,
    pub offset: u64,
}

/// A compiled render pipeline: program + input layout + formats + state.
pub struct RenderPipeline {
    core: ResourceCore,
    program: Rc<Program>,
    input_layout: Rc<InputLayout>,
    resolved_attributes: Vec<ResolvedAttribute>,
    state: RenderState,
    color_formats: SmallVec<[Format; 4]>,
    depth_format: Option<Format>,
}

impl RenderPipeline {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        desc: &RenderPipelineDescriptor<'_>,
        explicit_locations: bool,
    ) -> Result<Self> {
        desc.program.raw()?;
        if desc.program.is_compute() {
            return Err(PrismError::InvalidProgramStages(
                "render pipeline requires a render program",
            ));
        }

        // Resolve attribute locations up front: descriptor-supplied on
        // explicit-location dialects, reflected by name otherwise. Missing
        // names are skipped, not errors.
        let mut resolved = Vec::with_capacity(desc.input_layout.attributes().len());
        for attribute in desc.input_layout.attributes() {
            let location = if explicit_locations {
                attribute.location
            } else {
                desc.program
                    .attribute_location(&attribute.name)
                    .or(attribute.location)
            };
            let Some(location) = location else {
                log::debug!("attribute '{}' not present in program, skipped", attribute.name);
                continue;
            };
            resolved.push(ResolvedAttribute {
                location,
                buffer_index: attribute.buffer_index,
                format: attribute.format,
                offset: attribute.offset,
            });
        }

        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::RenderPipeline, desc.label),
            program: Rc::clone(desc.program),
            input_layout: Rc::clone(desc.input_layout),
            resolved_attributes: resolved,
            state: desc.state,
            color_formats: desc.color_formats.iter().copied().collect(),
            depth_format: desc.depth_format,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    #[must_use]
    pub fn input_layout(&self) -> &Rc<InputLayout> {
        &self.input_layout
    }

    #[must_use]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[must_use]
    pub fn color_formats(&self) -> &[Format] {
        &self.color_formats
    }

    #[must_use]
    pub fn depth_format(&self) -> Option<Format> {
        self.depth_format
    }

    pub(crate) fn resolved_attributes(&self) -> &[ResolvedAttribute] {
        &self.resolved_attributes
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        self.core.ensure_alive()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()
    }
}

/// A compiled compute pipeline.
pub struct ComputePipeline {
    core: ResourceCore,
    program: Rc<Program>,
}

impl ComputePipeline {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        program: &Rc<Program>,
        label: Option<&str>,
    ) -> Result<Self> {
        program.raw()?;
        if !program.is_compute() {
            return Err(PrismError::InvalidProgramStages(
                "compute pipeline requires a compute program",
            ));
        }
        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::ComputePipeline, label),
            program: Rc::clone(program),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        self.core.ensure_alive()
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()
    }
}

/// A uniform/storage buffer bound at a slot.
#[derive(Clone)]
pub struct BufferBinding {
    pub buffer: Rc<Buffer>,
    pub offset: u64,
    pub size: u64,
}

/// A texture + sampler pair bound at a slot.
#[derive(Clone)]
pub struct TextureBinding {
    pub texture: Rc<Texture>,
    pub sampler: Rc<Sampler>,
}

/// Bindings creation options. Slot indices are positional: entry `i` binds
/// slot `i`. `None` entries fall back to the device's placeholder buffer at
/// submission time.
#[derive(Default)]
pub struct BindingsDescriptor<'a> {
    pub uniform_buffers: &'a [Option<BufferBinding>],
    pub samplers: &'a [Option<TextureBinding>],
    pub storage_buffers: &'a [Option<BufferBinding>],
    pub label: Option<&'a str>,
}

/// Concrete resources bound to a specific pipeline's slots.
///
/// Only valid against the pipeline it was created from.
pub struct Bindings {
    core: ResourceCore,
    pipeline: ResourceId,
    uniform_buffers: Vec<Option<BufferBinding>>,
    samplers: Vec<Option<TextureBinding>>,
    storage_buffers: Vec<Option<BufferBinding>>,
}

impl Bindings {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        pipeline: ResourceId,
        desc: &BindingsDescriptor<'_>,
    ) -> Result<Self> {
        for binding in desc.uniform_buffers.iter().chain(desc.storage_buffers) {
            if let Some(b) = binding {
                if b.buffer.is_destroyed() {
                    return Err(PrismError::ResourceDestroyed {
                        kind: ResourceKind::Buffer,
                        id: b.buffer.id(),
                    });
                }
                if b.offset + b.size > b.buffer.byte_size() {
                    return Err(PrismError::RangeOutOfBounds {
                        offset: b.offset,
                        len: b.size,
                        size: b.buffer.byte_size(),
                    });
                }
            }
        }
        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::Bindings, desc.label),
            pipeline,
            uniform_buffers: desc.uniform_buffers.to_vec(),
            samplers: desc.samplers.to_vec(),
            storage_buffers: desc.storage_buffers.to_vec(),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    /// Id of the pipeline these bindings were created from.
    #[must_use]
    pub fn pipeline_id(&self) -> ResourceId {
        self.pipeline
    }

    pub(crate) fn uniform_buffers(&self) -> &[Option<BufferBinding>] {
        &self.uniform_buffers
    }

    pub(crate) fn samplers(&self) -> &[Option<TextureBinding>] {
        &self.samplers
    }

    pub(crate) fn storage_buffers(&self) -> &[Option<BufferBinding>] {
        &self.storage_buffers
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        self.core.ensure_alive()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()
    }
}
