//! Resource Objects
//!
//! Every creatable GPU object wraps zero or more native handles derived from
//! a descriptor. All of them share the same lifecycle: `Created` once every
//! native handle is allocated (construction is all-or-nothing), `Active` as
//! the steady state, `Destroyed` after an explicit `destroy()` call, which
//! is terminal, releases every handle exactly once, and deregisters the
//! object from the owning device's live-resource registry. Operating on a
//! destroyed object is a usage error, reported, never silently ignored.

pub mod buffer;
pub mod pipeline;
pub mod program;
pub mod query;
pub mod texture;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::backend::NativeContext;
use crate::errors::{PrismError, Result};

/// Process-unique resource identifier, assigned at creation.
pub type ResourceId = u64;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next process-unique resource id.
pub(crate) fn generate_resource_id() -> ResourceId {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Kind tag carried by every resource object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    Sampler,
    Program,
    InputLayout,
    RenderPipeline,
    ComputePipeline,
    Bindings,
    RenderTarget,
    QueryPool,
    RenderPass,
    ComputePass,
    RenderBundle,
}

/// One undestroyed resource, as reported by leak checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakReport {
    pub id: ResourceId,
    pub kind: ResourceKind,
    /// The creation label, when the caller supplied one.
    pub label: Option<String>,
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{:?} #{} ({label})", self.kind, self.id),
            None => write!(f, "{:?} #{}", self.kind, self.id),
        }
    }
}

/// The device's live-resource registry: an owning map from identifier to
/// creation record. Resources deregister themselves on destroy through a
/// non-owning weak back-pointer, so the registry never keeps a resource
/// alive and a resource never keeps its device alive.
#[derive(Default)]
pub(crate) struct ResourceRegistry {
    live: FxHashMap<ResourceId, LeakReport>,
}

impl ResourceRegistry {
    fn register(&mut self, id: ResourceId, kind: ResourceKind, label: Option<&str>) {
        self.live.insert(
            id,
            LeakReport {
                id,
                kind,
                label: label.map(str::to_string),
            },
        );
    }

    fn deregister(&mut self, id: ResourceId) {
        self.live.remove(&id);
    }

    /// Everything still live, sorted by creation order (id).
    pub(crate) fn survivors(&self) -> Vec<LeakReport> {
        let mut reports: Vec<_> = self.live.values().cloned().collect();
        reports.sort_by_key(|r| r.id);
        reports
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// Shared identity + lifecycle state embedded in every resource object.
pub(crate) struct ResourceCore {
    id: ResourceId,
    kind: ResourceKind,
    ctx: Rc<dyn NativeContext>,
    registry: Weak<RefCell<ResourceRegistry>>,
    destroyed: Cell<bool>,
}

impl ResourceCore {
    /// Assigns an id and registers the resource as live.
    pub(crate) fn register(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        kind: ResourceKind,
        label: Option<&str>,
    ) -> Self {
        let id = generate_resource_id();
        registry.borrow_mut().register(id, kind, label);
        log::debug!("created {kind:?} #{id}");
        Self {
            id,
            kind,
            ctx,
            registry: Rc::downgrade(registry),
            destroyed: Cell::new(false),
        }
    }

    pub(crate) fn id(&self) -> ResourceId {
        self.id
    }

    pub(crate) fn ctx(&self) -> &Rc<dyn NativeContext> {
        &self.ctx
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Usage-error guard for every operation on the resource.
    pub(crate) fn ensure_alive(&self) -> Result<()> {
        if self.destroyed.get() {
            Err(PrismError::ResourceDestroyed {
                kind: self.kind,
                id: self.id,
            })
        } else {
            Ok(())
        }
    }

    /// Marks the resource destroyed and deregisters it. Fails on re-destroy.
    pub(crate) fn release(&self) -> Result<()> {
        self.ensure_alive()?;
        self.destroyed.set(true);
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().deregister(self.id);
        }
        log::debug!("destroyed {:?} #{}", self.kind, self.id);
        Ok(())
    }
}

pub use buffer::{Buffer, BufferDescriptor, BufferSource, PageRange, page_span};
pub use pipeline::{
    Bindings, BindingsDescriptor, BufferBinding, ComputePipeline, InputLayout,
    InputLayoutDescriptor, RenderPipeline, RenderPipelineDescriptor, TextureBinding,
    VertexAttribute, VertexBufferLayout,
};
pub use program::{Program, ProgramDescriptor};
pub use query::{QueryPool, QueryPoolDescriptor};
pub use texture::{
    RenderTarget, RenderTargetDescriptor, Sampler, SamplerDescriptor, Texture, TextureDescriptor,
};
