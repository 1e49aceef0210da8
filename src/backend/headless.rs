//! Headless Native Context
//!
//! An in-memory [`NativeContext`] with no GPU behind it. Buffer writes land
//! in real byte storage, program "linking" reflects attribute names straight
//! from the cross-compiled vertex source, and every execution verb is logged
//! in call order, which is exactly what the test suite needs to observe
//! paging, binding elision and command ordering. Also usable as a stand-in
//! context on hosts without any supported backend.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::errors::{PrismError, Result};
use crate::format::{
    BufferUsage, Format, PrimitiveTopology, QueryKind, RenderState, StepMode, UpdateHint,
};

use super::{
    NativeContext, NativeLimits, NativeSamplerDesc, NativeTextureDesc, RawBuffer, RawProgram,
    RawQueryPool, RawRenderTarget, RawSampler, RawTexture,
};

struct StoredBuffer {
    data: Vec<u8>,
}

struct StoredProgram {
    attributes: FxHashMap<String, u32>,
    uniform_slots: FxHashMap<String, u32>,
}

struct StoredQueryPool {
    results: Vec<Option<u64>>,
}

#[derive(Default)]
struct State {
    next_handle: u64,
    buffers: FxHashMap<u64, StoredBuffer>,
    textures: FxHashMap<u64, NativeTextureDesc>,
    samplers: FxHashMap<u64, NativeSamplerDesc>,
    programs: FxHashMap<u64, StoredProgram>,
    render_targets: FxHashMap<u64, usize>,
    query_pools: FxHashMap<u64, StoredQueryPool>,
    ops: Vec<String>,
}

impl State {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn op(&mut self, text: String) {
        self.ops.push(text);
    }
}

/// See the module docs.
pub struct HeadlessContext {
    limits: NativeLimits,
    state: RefCell<State>,
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            limits: NativeLimits {
                max_buffer_size: 1 << 28,
                max_color_attachments: 4,
                max_texture_size: 8192,
                max_vertex_attributes: 16,
            },
            state: RefCell::new(State::default()),
        }
    }

    /// A context with a reduced maximum buffer allocation, for exercising
    /// the device layer's paging.
    #[must_use]
    pub fn with_max_buffer_size(max_buffer_size: u64) -> Self {
        let mut ctx = Self::new();
        ctx.limits.max_buffer_size = max_buffer_size;
        ctx
    }

    /// Current bytes of a live native buffer, `None` once destroyed.
    #[must_use]
    pub fn buffer_bytes(&self, buffer: RawBuffer) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&buffer.0)
            .map(|b| b.data.clone())
    }

    /// Number of live native buffer allocations.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    /// Makes a query slot's result available to subsequent polls.
    pub fn set_query_result(&self, pool: RawQueryPool, index: u32, value: u64) {
        if let Some(p) = self.state.borrow_mut().query_pools.get_mut(&pool.0)
            && let Some(slot) = p.results.get_mut(index as usize)
        {
            *slot = Some(value);
        }
    }

    /// Drains the recorded execution log.
    pub fn take_ops(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().ops)
    }

    /// Reflects attribute names from a cross-compiled vertex source:
    /// `attribute`/`in` declarations get explicit `layout(location = N)`
    /// locations when present, sequential ones otherwise.
    fn reflect_attributes(vertex: &str) -> FxHashMap<String, u32> {
        let mut attributes = FxHashMap::default();
        let mut next_location = 0u32;
        for line in vertex.lines() {
            let mut decl = line.trim_start();
            let mut explicit = None;
            if decl.starts_with("layout(")
                && let Some(close) = decl.find(')')
            {
                if let Some(eq) = decl[..close].find('=') {
                    explicit = decl[eq + 1..close].trim().parse::<u32>().ok();
                }
                decl = decl[close + 1..].trim_start();
            }
            let rest = decl
                .strip_prefix("attribute ")
                .or_else(|| decl.strip_prefix("in "));
            let Some(rest) = rest else { continue };
            let mut tokens = rest.split_whitespace();
            let (Some(_ty), Some(name)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            let name = name.trim_end_matches(';');
            let location = explicit.unwrap_or(next_location);
            next_location = location + 1;
            attributes.insert(name.to_string(), location);
        }
        attributes
    }
}

impl NativeContext for HeadlessContext {
    fn limits(&self) -> NativeLimits {
        self.limits
    }

    fn create_buffer(&self, size: u64, _usage: BufferUsage, _hint: UpdateHint) -> Result<RawBuffer> {
        if size > self.limits.max_buffer_size {
            return Err(PrismError::AllocationFailed(format!(
                "buffer of {size} bytes exceeds native limit {}",
                self.limits.max_buffer_size
            )));
        }
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.buffers.insert(
            handle,
            StoredBuffer {
                data: vec![0; size as usize],
            },
        );
        Ok(RawBuffer(handle))
    }

    fn write_buffer(&self, buffer: RawBuffer, offset: u64, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.buffers.get_mut(&buffer.0) {
            let start = offset as usize;
            let end = (start + data.len()).min(stored.data.len());
            stored.data[start..end].copy_from_slice(&data[..end - start]);
        }
    }

    fn destroy_buffer(&self, buffer: RawBuffer) {
        self.state.borrow_mut().buffers.remove(&buffer.0);
    }

    fn create_texture(&self, desc: &NativeTextureDesc) -> Result<RawTexture> {
        if desc.width > self.limits.max_texture_size || desc.height > self.limits.max_texture_size {
            return Err(PrismError::AllocationFailed(format!(
                "texture {}x{} exceeds native limit {}",
                desc.width, desc.height, self.limits.max_texture_size
            )));
        }
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.textures.insert(handle, *desc);
        Ok(RawTexture(handle))
    }

    fn destroy_texture(&self, texture: RawTexture) {
        self.state.borrow_mut().textures.remove(&texture.0);
    }

    fn create_sampler(&self, desc: &NativeSamplerDesc) -> Result<RawSampler> {
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.samplers.insert(handle, *desc);
        Ok(RawSampler(handle))
    }

    fn destroy_sampler(&self, sampler: RawSampler) {
        self.state.borrow_mut().samplers.remove(&sampler.0);
    }

    fn create_program(
        &self,
        vertex: Option<&str>,
        fragment: Option<&str>,
        compute: Option<&str>,
    ) -> Result<RawProgram> {
        if vertex.is_none() && fragment.is_none() && compute.is_none() {
            return Err(PrismError::ProgramLinkFailed("no stages supplied".into()));
        }
        let attributes = vertex.map(Self::reflect_attributes).unwrap_or_default();
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.programs.insert(
            handle,
            StoredProgram {
                attributes,
                uniform_slots: FxHashMap::default(),
            },
        );
        Ok(RawProgram(handle))
    }

    fn destroy_program(&self, program: RawProgram) {
        self.state.borrow_mut().programs.remove(&program.0);
    }

    fn create_render_target(
        &self,
        colors: &[RawTexture],
        depth: Option<RawTexture>,
    ) -> Result<RawRenderTarget> {
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        let attachment_count = colors.len() + usize::from(depth.is_some());
        state.render_targets.insert(handle, attachment_count);
        Ok(RawRenderTarget(handle))
    }

    fn destroy_render_target(&self, target: RawRenderTarget) {
        self.state.borrow_mut().render_targets.remove(&target.0);
    }

    fn create_query_pool(&self, _kind: QueryKind, count: u32) -> Result<RawQueryPool> {
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.query_pools.insert(
            handle,
            StoredQueryPool {
                results: vec![None; count as usize],
            },
        );
        Ok(RawQueryPool(handle))
    }

    fn destroy_query_pool(&self, pool: RawQueryPool) {
        self.state.borrow_mut().query_pools.remove(&pool.0);
    }

    fn attribute_location(&self, program: RawProgram, name: &str) -> Option<u32> {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .and_then(|p| p.attributes.get(name).copied())
    }

    fn bind_uniform_slot(&self, program: RawProgram, name: &str, slot: u32) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program.0) {
            p.uniform_slots.insert(name.to_string(), slot);
        }
    }

    fn begin_frame(&self) {
        self.state.borrow_mut().op("begin_frame".into());
    }

    fn end_frame(&self) {
        self.state.borrow_mut().op("end_frame".into());
    }

    fn begin_render_pass(
        &self,
        target: Option<RawRenderTarget>,
        _clear_color: Option<[f32; 4]>,
        _clear_depth: Option<f32>,
    ) {
        let label = target.map_or_else(|| "default".to_string(), |t| format!("#{}", t.0));
        self.state.borrow_mut().op(format!("begin_pass {label}"));
    }

    fn end_render_pass(&self) {
        self.state.borrow_mut().op("end_pass".into());
    }

    fn bind_program(&self, program: RawProgram) {
        self.state
            .borrow_mut()
            .op(format!("bind_program #{}", program.0));
    }

    fn set_render_state(&self, _state: &RenderState) {
        self.state.borrow_mut().op("set_render_state".into());
    }

    fn set_viewport(&self, x: f32, y: f32, width: f32, height: f32) {
        self.state
            .borrow_mut()
            .op(format!("set_viewport {x} {y} {width} {height}"));
    }

    fn set_scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state
            .borrow_mut()
            .op(format!("set_scissor {x} {y} {width} {height}"));
    }

    fn set_vertex_attribute(
        &self,
        location: u32,
        buffer: RawBuffer,
        _format: Format,
        offset: u64,
        stride: u32,
        _step: StepMode,
    ) {
        self.state.borrow_mut().op(format!(
            "set_vertex_attribute loc={location} #{} off={offset} stride={stride}",
            buffer.0
        ));
    }

    fn bind_index_buffer(&self, buffer: RawBuffer, _format: Format) {
        self.state
            .borrow_mut()
            .op(format!("bind_index_buffer #{}", buffer.0));
    }

    fn bind_uniform_buffer(&self, slot: u32, buffer: RawBuffer, offset: u64, size: u64) {
        self.state.borrow_mut().op(format!(
            "bind_uniform_buffer slot={slot} #{} off={offset} size={size}",
            buffer.0
        ));
    }

    fn bind_storage_buffer(&self, slot: u32, buffer: RawBuffer, offset: u64, size: u64) {
        self.state.borrow_mut().op(format!(
            "bind_storage_buffer slot={slot} #{} off={offset} size={size}",
            buffer.0
        ));
    }

    fn bind_texture(&self, slot: u32, texture: RawTexture, sampler: RawSampler) {
        self.state.borrow_mut().op(format!(
            "bind_texture slot={slot} #{} sampler=#{}",
            texture.0, sampler.0
        ));
    }

    fn draw(
        &self,
        _topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
    ) {
        self.state
            .borrow_mut()
            .op(format!("draw {vertex_count} {instance_count} {first_vertex}"));
    }

    fn draw_indexed(
        &self,
        _topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    ) {
        self.state.borrow_mut().op(format!(
            "draw_indexed {index_count} {instance_count} {first_index}"
        ));
    }

    fn dispatch(&self, x: u32, y: u32, z: u32) {
        self.state.borrow_mut().op(format!("dispatch {x} {y} {z}"));
    }

    fn begin_query(&self, pool: RawQueryPool, index: u32) {
        self.state
            .borrow_mut()
            .op(format!("begin_query #{} {index}", pool.0));
    }

    fn end_query(&self, pool: RawQueryPool) {
        self.state.borrow_mut().op(format!("end_query #{}", pool.0));
    }

    fn query_result(&self, pool: RawQueryPool, index: u32) -> Option<u64> {
        self.state
            .borrow()
            .query_pools
            .get(&pool.0)
            .and_then(|p| p.results.get(index as usize).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_storage_round_trip() {
        let ctx = HeadlessContext::new();
        let buf = ctx
            .create_buffer(8, BufferUsage::VERTEX, UpdateHint::Static)
            .unwrap();
        ctx.write_buffer(buf, 2, &[1, 2, 3]);
        assert_eq!(ctx.buffer_bytes(buf).unwrap(), vec![0, 0, 1, 2, 3, 0, 0, 0]);
        ctx.destroy_buffer(buf);
        assert!(ctx.buffer_bytes(buf).is_none());
    }

    #[test]
    fn test_attribute_reflection_sequential_and_explicit() {
        let ctx = HeadlessContext::new();
        let vs = "attribute vec3 a_Position;\nlayout(location = 5) in vec2 a_Uv;\nin vec4 a_Color;\n";
        let program = ctx.create_program(Some(vs), None, None).unwrap();
        assert_eq!(ctx.attribute_location(program, "a_Position"), Some(0));
        assert_eq!(ctx.attribute_location(program, "a_Uv"), Some(5));
        assert_eq!(ctx.attribute_location(program, "a_Color"), Some(6));
        assert_eq!(ctx.attribute_location(program, "a_Missing"), None);
    }

    #[test]
    fn test_query_results_are_polled() {
        let ctx = HeadlessContext::new();
        let pool = ctx.create_query_pool(QueryKind::Occlusion, 2).unwrap();
        assert_eq!(ctx.query_result(pool, 0), None);
        ctx.set_query_result(pool, 0, 42);
        assert_eq!(ctx.query_result(pool, 0), Some(42));
        assert_eq!(ctx.query_result(pool, 1), None);
    }
}
