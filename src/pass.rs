//! Pass Encoders
//!
//! A pass encoder records an ordered sequence of draw/dispatch/state
//! commands against a device's resource objects. Recording is cheap and
//! infallible; translation to backend calls happens when the device submits
//! the pass, in recording order, with state-before-draw validated at that
//! point.
//!
//! Pass encoders are transient: submission consumes them, so unlike the
//! other resource objects they are not leak-tracked.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::resources::{
    Bindings, Buffer, ComputePipeline, QueryPool, RenderPipeline, RenderTarget, ResourceId,
    generate_resource_id,
};

/// A vertex buffer bound at a slot of the pipeline's input layout.
#[derive(Clone)]
pub struct VertexBufferBinding {
    pub buffer: Rc<Buffer>,
    /// Byte offset of the first element.
    pub offset: u64,
}

/// One recorded render-pass command.
#[derive(Clone)]
pub(crate) enum RenderCmd {
    SetPipeline(Rc<RenderPipeline>),
    SetVertexInput {
        buffers: SmallVec<[VertexBufferBinding; 4]>,
        index: Option<Rc<Buffer>>,
    },
    SetBindings(Rc<Bindings>),
    SetViewport {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    SetScissor {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    },
    BeginOcclusionQuery {
        pool: Rc<QueryPool>,
        index: u32,
    },
    EndOcclusionQuery {
        pool: Rc<QueryPool>,
    },
    ExecuteBundle(Rc<RenderBundle>),
}

/// Render-pass creation options. `target: None` renders to the default
/// framebuffer.
#[derive(Default)]
pub struct RenderPassDescriptor<'a> {
    pub target: Option<&'a Rc<RenderTarget>>,
    /// Clear the color attachment(s) to this value at pass begin.
    pub clear_color: Option<[f32; 4]>,
    /// Clear the depth attachment to this value at pass begin.
    pub clear_depth: Option<f32>,
    pub label: Option<&'a str>,
}

/// Records render commands for one submission.
pub struct RenderPass {
    id: ResourceId,
    pub(crate) target: Option<Rc<RenderTarget>>,
    pub(crate) clear_color: Option<[f32; 4]>,
    pub(crate) clear_depth: Option<f32>,
    pub(crate) cmds: Vec<RenderCmd>,
}

impl RenderPass {
    pub(crate) fn new(desc: &RenderPassDescriptor<'_>) -> Self {
        Self {
            id: generate_resource_id(),
            target: desc.target.map(Rc::clone),
            clear_color: desc.clear_color,
            clear_depth: desc.clear_depth,
            cmds: Vec::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn set_pipeline(&mut self, pipeline: &Rc<RenderPipeline>) {
        self.cmds.push(RenderCmd::SetPipeline(Rc::clone(pipeline)));
    }

    /// Binds the vertex buffers feeding the current pipeline's input layout,
    /// plus the optional index buffer.
    pub fn set_vertex_input(
        &mut self,
        buffers: &[VertexBufferBinding],
        index: Option<&Rc<Buffer>>,
    ) {
        self.cmds.push(RenderCmd::SetVertexInput {
            buffers: buffers.iter().cloned().collect(),
            index: index.map(Rc::clone),
        });
    }

    pub fn set_bindings(&mut self, bindings: &Rc<Bindings>) {
        self.cmds.push(RenderCmd::SetBindings(Rc::clone(bindings)));
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.cmds.push(RenderCmd::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.cmds.push(RenderCmd::SetScissor {
            x,
            y,
            width,
            height,
        });
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) {
        self.cmds.push(RenderCmd::Draw {
            vertex_count,
            instance_count,
            first_vertex,
        });
    }

    pub fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32) {
        self.cmds.push(RenderCmd::DrawIndexed {
            index_count,
            instance_count,
            first_index,
        });
    }

    pub fn begin_occlusion_query(&mut self, pool: &Rc<QueryPool>, index: u32) {
        self.cmds.push(RenderCmd::BeginOcclusionQuery {
            pool: Rc::clone(pool),
            index,
        });
    }

    pub fn end_occlusion_query(&mut self, pool: &Rc<QueryPool>) {
        self.cmds
            .push(RenderCmd::EndOcclusionQuery { pool: Rc::clone(pool) });
    }

    /// Splices a pre-recorded bundle's commands into this pass at the
    /// current position.
    pub fn execute_bundle(&mut self, bundle: &Rc<RenderBundle>) {
        self.cmds.push(RenderCmd::ExecuteBundle(Rc::clone(bundle)));
    }
}

/// A reusable pre-recorded command list, replayed into render passes.
pub struct RenderBundle {
    id: ResourceId,
    pub(crate) cmds: Vec<RenderCmd>,
}

impl RenderBundle {
    pub(crate) fn new() -> Self {
        Self {
            id: generate_resource_id(),
            cmds: Vec::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn set_pipeline(&mut self, pipeline: &Rc<RenderPipeline>) {
        self.cmds.push(RenderCmd::SetPipeline(Rc::clone(pipeline)));
    }

    pub fn set_vertex_input(
        &mut self,
        buffers: &[VertexBufferBinding],
        index: Option<&Rc<Buffer>>,
    ) {
        self.cmds.push(RenderCmd::SetVertexInput {
            buffers: buffers.iter().cloned().collect(),
            index: index.map(Rc::clone),
        });
    }

    pub fn set_bindings(&mut self, bindings: &Rc<Bindings>) {
        self.cmds.push(RenderCmd::SetBindings(Rc::clone(bindings)));
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) {
        self.cmds.push(RenderCmd::Draw {
            vertex_count,
            instance_count,
            first_vertex,
        });
    }

    pub fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32) {
        self.cmds.push(RenderCmd::DrawIndexed {
            index_count,
            instance_count,
            first_index,
        });
    }
}

/// One recorded compute-pass command.
#[derive(Clone)]
pub(crate) enum ComputeCmd {
    SetPipeline(Rc<ComputePipeline>),
    SetBindings(Rc<Bindings>),
    Dispatch { x: u32, y: u32, z: u32 },
}

/// Records compute commands for one submission.
pub struct ComputePass {
    id: ResourceId,
    pub(crate) cmds: Vec<ComputeCmd>,
}

impl std::fmt::Debug for ComputePass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputePass")
            .field("id", &self.id)
            .field("cmds", &self.cmds.len())
            .finish()
    }
}

impl ComputePass {
    pub(crate) fn new() -> Self {
        Self {
            id: generate_resource_id(),
            cmds: Vec::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn set_pipeline(&mut self, pipeline: &Rc<ComputePipeline>) {
        self.cmds.push(ComputeCmd::SetPipeline(Rc::clone(pipeline)));
    }

    pub fn set_bindings(&mut self, bindings: &Rc<Bindings>) {
        self.cmds.push(ComputeCmd::SetBindings(Rc::clone(bindings)));
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.cmds.push(ComputeCmd::Dispatch { x, y, z });
    }
}
