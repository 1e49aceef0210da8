//! Linked Shader Programs
//!
//! A [`Program`] is the linked form of one or two cross-compiled source
//! units (vertex + fragment) or a single compute unit. The reflection
//! metadata extracted during cross-compilation (sampler binding slots and
//! flattened uniform leaf names) is cached here for use when building
//! bindings against the program.

use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::{NativeContext, RawProgram};
use crate::errors::Result;
use crate::shader::{SamplerBinding, SourceUnit};

use super::{ResourceCore, ResourceId, ResourceKind, ResourceRegistry};

/// Program creation options: the source units to cross-compile and link.
///
/// Valid combinations are vertex + fragment (render program) or compute
/// alone.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    pub vertex: Option<SourceUnit<'a>>,
    pub fragment: Option<SourceUnit<'a>>,
    pub compute: Option<SourceUnit<'a>>,
    pub label: Option<&'a str>,
}

impl<'a> ProgramDescriptor<'a> {
    /// A render program descriptor.
    #[must_use]
    pub fn render(vertex: SourceUnit<'a>, fragment: SourceUnit<'a>) -> Self {
        Self {
            vertex: Some(vertex),
            fragment: Some(fragment),
            compute: None,
            label: None,
        }
    }

    /// A compute program descriptor.
    #[must_use]
    pub fn compute(compute: SourceUnit<'a>) -> Self {
        Self {
            vertex: None,
            fragment: None,
            compute: Some(compute),
            label: None,
        }
    }
}

/// Reflection metadata gathered while cross-compiling a program's stages.
pub(crate) struct ProgramReflection {
    /// Sampler uniforms with their logical slots, merged across stages.
    pub samplers: Vec<SamplerBinding>,
    /// Uniform block names in declaration order.
    pub uniform_blocks: Vec<String>,
    /// Flattened uniform leaf names across all blocks.
    pub uniform_leaves: Vec<String>,
}

/// A linked GPU program plus its reflection metadata.
pub struct Program {
    core: ResourceCore,
    handle: RawProgram,
    samplers: Vec<SamplerBinding>,
    uniform_blocks: Vec<String>,
    uniform_leaves: Vec<String>,
    is_compute: bool,
}

impl Program {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        handle: RawProgram,
        reflection: ProgramReflection,
        is_compute: bool,
        label: Option<&str>,
    ) -> Self {
        Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::Program, label),
            handle,
            samplers: reflection.samplers,
            uniform_blocks: reflection.uniform_blocks,
            uniform_leaves: reflection.uniform_leaves,
            is_compute,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    /// Sampler uniforms and their assigned logical binding slots.
    #[must_use]
    pub fn samplers(&self) -> &[SamplerBinding] {
        &self.samplers
    }

    /// Uniform block names in declaration order.
    #[must_use]
    pub fn uniform_blocks(&self) -> &[String] {
        &self.uniform_blocks
    }

    /// Flattened uniform leaf names across all blocks, in source order.
    #[must_use]
    pub fn uniform_leaves(&self) -> &[String] {
        &self.uniform_leaves
    }

    #[must_use]
    pub fn is_compute(&self) -> bool {
        self.is_compute
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    /// Reflected location of a vertex attribute; `None` when the attribute
    /// was compiled out.
    #[must_use]
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        if self.core.is_destroyed() {
            return None;
        }
        self.core.ctx().attribute_location(self.handle, name)
    }

    pub(crate) fn raw(&self) -> Result<RawProgram> {
        self.core.ensure_alive()?;
        Ok(self.handle)
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()?;
        self.core.ctx().destroy_program(self.handle);
        Ok(())
    }
}
