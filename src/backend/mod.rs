//! Native Backend Seam
//!
//! The device layer talks to a real rendering API exclusively through the
//! [`NativeContext`] trait: one interface, one implementation struct per
//! backend, selected at construction time via the chosen vendor profile.
//! Context creation itself (windowing, canvas, swap-chain acquisition) is
//! contribution glue and lives outside this crate; a contribution hands the
//! device an already-acquired context.
//!
//! All methods take `&self`: native contexts are interiorly mutable in the
//! GL tradition, and the whole layer is single-threaded by contract.

mod headless;

pub use headless::HeadlessContext;

use crate::errors::Result;
use crate::format::{
    AddressMode, BufferUsage, CompareMode, FilterMode, Format, MipFilterMode, PrimitiveTopology,
    QueryKind, RenderState, StepMode, TextureUsage, UpdateHint,
};

macro_rules! raw_handle {
    ($(#[$doc:meta] $name:ident),+ $(,)?) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(pub u64);
        )+
    };
}

raw_handle! {
    /// Native buffer allocation handle.
    RawBuffer,
    /// Native texture handle.
    RawTexture,
    /// Native sampler handle.
    RawSampler,
    /// Native linked-program handle.
    RawProgram,
    /// Native framebuffer / render-target handle.
    RawRenderTarget,
    /// Native query-pool handle.
    RawQueryPool,
}

/// Hard limits of the active native context.
#[derive(Debug, Clone, Copy)]
pub struct NativeLimits {
    /// Largest single native buffer allocation, in bytes. Logical buffers
    /// above this size are paged by the device layer.
    pub max_buffer_size: u64,
    pub max_color_attachments: u32,
    pub max_texture_size: u32,
    pub max_vertex_attributes: u32,
}

/// Texture allocation parameters, already resolved from the public
/// descriptor.
#[derive(Debug, Clone, Copy)]
pub struct NativeTextureDesc {
    pub format: Format,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub mip_levels: u32,
    pub usage: TextureUsage,
}

/// Sampler allocation parameters.
#[derive(Debug, Clone, Copy)]
pub struct NativeSamplerDesc {
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mip_filter: MipFilterMode,
    pub compare: Option<CompareMode>,
}

/// The raw command set the device layer needs from a native backend.
///
/// Allocation methods are all-or-nothing; execution methods are
/// fire-and-forget and ordered. Errors surface only where the native API can
/// actually fail.
impl std::fmt::Debug for dyn NativeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NativeContext")
    }
}

pub trait NativeContext {
    fn limits(&self) -> NativeLimits;

    // ── Allocation ──────────────────────────────────────────────────────

    fn create_buffer(&self, size: u64, usage: BufferUsage, hint: UpdateHint) -> Result<RawBuffer>;
    fn write_buffer(&self, buffer: RawBuffer, offset: u64, data: &[u8]);
    fn destroy_buffer(&self, buffer: RawBuffer);

    fn create_texture(&self, desc: &NativeTextureDesc) -> Result<RawTexture>;
    fn destroy_texture(&self, texture: RawTexture);

    fn create_sampler(&self, desc: &NativeSamplerDesc) -> Result<RawSampler>;
    fn destroy_sampler(&self, sampler: RawSampler);

    /// Compiles and links the given cross-compiled stage sources.
    fn create_program(
        &self,
        vertex: Option<&str>,
        fragment: Option<&str>,
        compute: Option<&str>,
    ) -> Result<RawProgram>;
    fn destroy_program(&self, program: RawProgram);

    fn create_render_target(
        &self,
        colors: &[RawTexture],
        depth: Option<RawTexture>,
    ) -> Result<RawRenderTarget>;
    fn destroy_render_target(&self, target: RawRenderTarget);

    fn create_query_pool(&self, kind: QueryKind, count: u32) -> Result<RawQueryPool>;
    fn destroy_query_pool(&self, pool: RawQueryPool);

    // ── Reflection ──────────────────────────────────────────────────────

    /// Looks up a vertex attribute's location in a linked program.
    /// `None` when the attribute was compiled out.
    fn attribute_location(&self, program: RawProgram, name: &str) -> Option<u32>;

    /// Routes a named uniform block or sampler uniform to a slot. No-op on
    /// backends with explicit binding locations.
    fn bind_uniform_slot(&self, program: RawProgram, name: &str, slot: u32);

    // ── Execution ───────────────────────────────────────────────────────

    /// Per-frame setup hook; no-op on backends without such a concept.
    fn begin_frame(&self) {}
    /// Per-frame teardown hook.
    fn end_frame(&self) {}

    fn begin_render_pass(
        &self,
        target: Option<RawRenderTarget>,
        clear_color: Option<[f32; 4]>,
        clear_depth: Option<f32>,
    );
    fn end_render_pass(&self);

    fn bind_program(&self, program: RawProgram);
    fn set_render_state(&self, state: &RenderState);
    fn set_viewport(&self, x: f32, y: f32, width: f32, height: f32);
    fn set_scissor(&self, x: i32, y: i32, width: i32, height: i32);

    fn set_vertex_attribute(
        &self,
        location: u32,
        buffer: RawBuffer,
        format: Format,
        offset: u64,
        stride: u32,
        step: StepMode,
    );
    fn bind_index_buffer(&self, buffer: RawBuffer, format: Format);
    fn bind_uniform_buffer(&self, slot: u32, buffer: RawBuffer, offset: u64, size: u64);
    fn bind_storage_buffer(&self, slot: u32, buffer: RawBuffer, offset: u64, size: u64);
    fn bind_texture(&self, slot: u32, texture: RawTexture, sampler: RawSampler);

    fn draw(
        &self,
        topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
    );
    fn draw_indexed(
        &self,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    );
    fn dispatch(&self, x: u32, y: u32, z: u32);

    fn begin_query(&self, pool: RawQueryPool, index: u32);
    fn end_query(&self, pool: RawQueryPool);

    /// Non-blocking poll of a query slot. `None` while unavailable.
    fn query_result(&self, pool: RawQueryPool, index: u32) -> Option<u64>;
}
