//! Device & Pass Submission Tests
//!
//! Tests for:
//! - Backend selection over a preference order
//! - Leak detection: zero leaks after full cleanup, one report per omitted
//!   destroy
//! - Pipeline deduplication by structural descriptor identity
//! - Program reflection: merged sampler slots, uniform leaf metadata,
//!   missing vertex attributes silently skipped
//! - Pass submission: command order, redundant program-bind elision,
//!   bindings/pipeline mismatch, state-before-draw validation
//! - Compute gating per backend capability

use std::rc::Rc;

use prism::backend::{HeadlessContext, NativeContext};
use prism::shader::{ShaderStage, SourceUnit};
use prism::{
    BackendKind, BindingsDescriptor, BufferBinding, BufferDescriptor, BufferSource, BufferUsage,
    Device, DeviceDescriptor, Format, InputLayoutDescriptor, PrismError, ProgramDescriptor,
    RenderPassDescriptor, RenderPipelineDescriptor, RenderState, RenderTargetDescriptor,
    ResourceKind, SamplerDescriptor,
    StepMode, TextureBinding, TextureDescriptor, TextureUsage, VendorProfile, VertexAttribute,
    VertexBufferBinding, VertexBufferLayout, select_backend,
};

const VS: &str = "\
attribute vec3 a_Position;
attribute vec2 a_Uv;
varying vec2 v_Uv;
layout(std140) uniform Params {
    mat4 u_Projection;
    mat4 u_Model;
};
void main() {
    v_Uv = a_Uv;
    gl_Position = u_Projection * u_Model * vec4(a_Position, 1.0);
}
";

const FS: &str = "\
varying vec2 v_Uv;
uniform sampler2D u_Texture;
out vec4 o_Color;
void main() {
    o_Color = texture(SAMPLER_2D(u_Texture), v_Uv);
}
";

fn new_device(vendor: VendorProfile) -> (Rc<HeadlessContext>, Device) {
    let ctx = Rc::new(HeadlessContext::new());
    let device = Device::new(vendor, Rc::clone(&ctx) as Rc<dyn NativeContext>, DeviceDescriptor::default()).unwrap();
    (ctx, device)
}

fn render_program(device: &mut Device) -> Rc<prism::Program> {
    device
        .create_program(&ProgramDescriptor::render(
            SourceUnit::new(ShaderStage::Vertex, VS),
            SourceUnit::new(ShaderStage::Fragment, FS),
        ))
        .unwrap()
}

fn basic_pipeline(device: &mut Device) -> Rc<prism::RenderPipeline> {
    let program = render_program(device);
    let layout = device
        .create_input_layout(&InputLayoutDescriptor {
            buffers: &[VertexBufferLayout {
                stride: 20,
                step: StepMode::Vertex,
            }],
            attributes: &[
                VertexAttribute {
                    name: "a_Position",
                    location: Some(0),
                    buffer_index: 0,
                    format: Format::F32Rgb,
                    offset: 0,
                },
                VertexAttribute {
                    name: "a_Uv",
                    location: Some(1),
                    buffer_index: 0,
                    format: Format::F32Rg,
                    offset: 12,
                },
            ],
            index_format: Some(Format::U16R),
            label: Some("basic layout"),
        })
        .unwrap();
    device
        .create_render_pipeline(&RenderPipelineDescriptor {
            program: &program,
            input_layout: &layout,
            color_formats: &[Format::U8Rgba],
            depth_format: Some(Format::D24S8),
            state: RenderState::default(),
            label: Some("basic pipeline"),
        })
        .unwrap()
}

// ============================================================================
// Backend selection
// ============================================================================

#[test]
fn selection_walks_preference_order() {
    let (vendor, _ctx) = select_backend(
        &[BackendKind::Vulkan, BackendKind::Gles3, BackendKind::Gles2],
        |kind| {
            // Pretend the host only has the GL backends.
            (kind != BackendKind::Vulkan)
                .then(|| Rc::new(HeadlessContext::new()) as Rc<dyn NativeContext>)
        },
    )
    .unwrap();
    assert_eq!(vendor.backend, BackendKind::Gles3);
}

#[test]
fn selection_fails_when_nothing_is_available() {
    let err = select_backend(&[BackendKind::Vulkan], |_| None).unwrap_err();
    assert!(matches!(err, PrismError::BackendUnavailable { tried } if tried.len() == 1));
}

// ============================================================================
// Leak detection
// ============================================================================

#[test]
fn full_cleanup_reports_zero_leaks() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(64),
            BufferUsage::UNIFORM,
        ))
        .unwrap();
    let texture = device
        .create_texture(&TextureDescriptor::new(
            Format::U8Rgba,
            16,
            16,
            TextureUsage::SAMPLED,
        ))
        .unwrap();

    buffer.destroy().unwrap();
    texture.destroy().unwrap();

    assert!(device.check_for_leaks().is_empty());
    device.destroy().unwrap();
}

#[test]
fn one_omitted_destroy_reports_exactly_one_leak() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(64),
            BufferUsage::UNIFORM,
        ))
        .unwrap();
    let sampler = device
        .create_sampler(&SamplerDescriptor {
            label: Some("leaky sampler"),
            ..SamplerDescriptor::default()
        })
        .unwrap();
    buffer.destroy().unwrap();

    let leaks = device.check_for_leaks();
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].kind, ResourceKind::Sampler);
    assert_eq!(leaks[0].id, sampler.id());
    assert_eq!(leaks[0].label.as_deref(), Some("leaky sampler"));
    assert!(leaks[0].to_string().contains("leaky sampler"));
}

#[test]
fn destroyed_device_rejects_further_creation() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    device.destroy().unwrap();
    assert!(matches!(device.destroy().unwrap_err(), PrismError::DeviceDestroyed));
    assert!(matches!(
        device
            .create_buffer(&BufferDescriptor::new(
                BufferSource::Size(4),
                BufferUsage::VERTEX
            ))
            .unwrap_err(),
        PrismError::DeviceDestroyed
    ));
}

// ============================================================================
// Pipeline deduplication & program reflection
// ============================================================================

#[test]
fn value_identical_pipeline_descriptor_reuses_cached_object() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES3);
    let program = render_program(&mut device);
    let layout = device
        .create_input_layout(&InputLayoutDescriptor {
            buffers: &[VertexBufferLayout {
                stride: 12,
                step: StepMode::Vertex,
            }],
            attributes: &[VertexAttribute {
                name: "a_Position",
                location: Some(0),
                buffer_index: 0,
                format: Format::F32Rgb,
                offset: 0,
            }],
            index_format: None,
            label: None,
        })
        .unwrap();

    let desc = RenderPipelineDescriptor {
        program: &program,
        input_layout: &layout,
        color_formats: &[Format::U8Rgba],
        depth_format: None,
        state: RenderState::default(),
        label: None,
    };
    let live_before = device.live_resource_count();
    let first = device.create_render_pipeline(&desc).unwrap();
    let second = device.create_render_pipeline(&desc).unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(device.live_resource_count(), live_before + 1);

    let different = device
        .create_render_pipeline(&RenderPipelineDescriptor {
            state: RenderState {
                depth_write: false,
                ..RenderState::default()
            },
            ..desc
        })
        .unwrap();
    assert!(!Rc::ptr_eq(&first, &different));
}

#[test]
fn program_reflection_caches_samplers_and_uniform_leaves() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let program = render_program(&mut device);

    assert_eq!(program.samplers().len(), 1);
    assert_eq!(program.samplers()[0].name, "u_Texture");
    assert_eq!(program.samplers()[0].slot, 0);

    assert_eq!(program.uniform_blocks(), &["Params".to_string()]);
    assert_eq!(
        program.uniform_leaves(),
        &["u_Projection".to_string(), "u_Model".to_string()]
    );
}

#[test]
fn missing_attribute_names_are_skipped_on_legacy() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let program = render_program(&mut device);
    let layout = device
        .create_input_layout(&InputLayoutDescriptor {
            buffers: &[VertexBufferLayout {
                stride: 24,
                step: StepMode::Vertex,
            }],
            attributes: &[
                VertexAttribute {
                    name: "a_Position",
                    location: None,
                    buffer_index: 0,
                    format: Format::F32Rgb,
                    offset: 0,
                },
                VertexAttribute {
                    // Not declared by the vertex stage; may be compiled out.
                    name: "a_Tangent",
                    location: None,
                    buffer_index: 0,
                    format: Format::F32Rgb,
                    offset: 12,
                },
            ],
            index_format: None,
            label: None,
        })
        .unwrap();
    let pipeline = device
        .create_render_pipeline(&RenderPipelineDescriptor {
            program: &program,
            input_layout: &layout,
            color_formats: &[Format::U8Rgba],
            depth_format: None,
            state: RenderState::default(),
            label: None,
        })
        .unwrap();

    // Submitting a draw with a single-buffer vertex input works: the
    // unresolved attribute is simply absent from the native calls.
    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(240),
            BufferUsage::VERTEX,
        ))
        .unwrap();
    let mut pass = device
        .create_render_pass(&RenderPassDescriptor::default())
        .unwrap();
    pass.set_pipeline(&pipeline);
    pass.set_vertex_input(
        &[VertexBufferBinding {
            buffer: Rc::clone(&buffer),
            offset: 0,
        }],
        None,
    );
    pass.draw(3, 1, 0);
    device.submit_render_pass(pass).unwrap();
}

// ============================================================================
// Pass submission
// ============================================================================

#[test]
fn submission_preserves_recording_order() {
    let (ctx, mut device) = new_device(VendorProfile::GLES2);
    let pipeline = basic_pipeline(&mut device);

    let vertex_buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(200),
            BufferUsage::VERTEX,
        ))
        .unwrap();
    let index_buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(96),
            BufferUsage::INDEX,
        ))
        .unwrap();
    let uniform_buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(128),
            BufferUsage::UNIFORM,
        ))
        .unwrap();
    let texture = device
        .create_texture(&TextureDescriptor::new(
            Format::U8Rgba,
            4,
            4,
            TextureUsage::SAMPLED,
        ))
        .unwrap();
    let sampler = device.create_sampler(&SamplerDescriptor::default()).unwrap();
    let bindings = device
        .create_bindings(
            &pipeline,
            &BindingsDescriptor {
                uniform_buffers: &[Some(BufferBinding {
                    buffer: Rc::clone(&uniform_buffer),
                    offset: 0,
                    size: 128,
                })],
                samplers: &[Some(TextureBinding {
                    texture: Rc::clone(&texture),
                    sampler: Rc::clone(&sampler),
                })],
                storage_buffers: &[],
                label: None,
            },
        )
        .unwrap();

    ctx.take_ops();
    let mut pass = device
        .create_render_pass(&RenderPassDescriptor {
            clear_color: Some([0.0, 0.0, 0.0, 1.0]),
            ..RenderPassDescriptor::default()
        })
        .unwrap();
    pass.set_viewport(0.0, 0.0, 640.0, 480.0);
    pass.set_pipeline(&pipeline);
    pass.set_vertex_input(
        &[VertexBufferBinding {
            buffer: Rc::clone(&vertex_buffer),
            offset: 0,
        }],
        Some(&index_buffer),
    );
    pass.set_bindings(&bindings);
    pass.draw_indexed(36, 1, 0);
    device.submit_render_pass(pass).unwrap();

    let ops = ctx.take_ops();
    let pos = |needle: &str| {
        ops.iter()
            .position(|op| op.starts_with(needle))
            .unwrap_or_else(|| panic!("missing op {needle}: {ops:?}"))
    };

    assert_eq!(pos("begin_pass"), 0);
    assert!(pos("set_viewport") < pos("bind_program"));
    assert!(pos("bind_program") < pos("set_vertex_attribute"));
    assert!(pos("set_vertex_attribute") < pos("bind_index_buffer"));
    assert!(pos("bind_index_buffer") < pos("bind_uniform_buffer"));
    assert!(pos("bind_uniform_buffer") < pos("bind_texture slot=0"));
    assert!(pos("bind_texture slot=0") < pos("draw_indexed 36"));
    assert_eq!(ops.last().unwrap(), "end_pass");
}

#[test]
fn redundant_program_binds_are_elided() {
    let (ctx, mut device) = new_device(VendorProfile::GLES2);
    let pipeline = basic_pipeline(&mut device);
    ctx.take_ops();

    for _ in 0..3 {
        let mut pass = device
            .create_render_pass(&RenderPassDescriptor::default())
            .unwrap();
        pass.set_pipeline(&pipeline);
        pass.draw(3, 1, 0);
        device.submit_render_pass(pass).unwrap();
    }

    let ops = ctx.take_ops();
    let binds = ops.iter().filter(|op| op.starts_with("bind_program")).count();
    let state_sets = ops.iter().filter(|op| op.starts_with("set_render_state")).count();
    assert_eq!(binds, 1);
    assert_eq!(state_sets, 1);
}

#[test]
fn bindings_are_rejected_against_a_different_pipeline() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES3);
    let pipeline_a = basic_pipeline(&mut device);
    let pipeline_b = {
        let program = render_program(&mut device);
        let layout = device
            .create_input_layout(&InputLayoutDescriptor {
                buffers: &[VertexBufferLayout {
                    stride: 12,
                    step: StepMode::Vertex,
                }],
                attributes: &[VertexAttribute {
                    name: "a_Position",
                    location: Some(0),
                    buffer_index: 0,
                    format: Format::F32Rgb,
                    offset: 0,
                }],
                index_format: None,
                label: None,
            })
            .unwrap();
        device
            .create_render_pipeline(&RenderPipelineDescriptor {
                program: &program,
                input_layout: &layout,
                color_formats: &[Format::U8Rgba],
                depth_format: None,
                state: RenderState::default(),
                label: None,
            })
            .unwrap()
    };

    let bindings = device
        .create_bindings(&pipeline_a, &BindingsDescriptor::default())
        .unwrap();

    let mut pass = device
        .create_render_pass(&RenderPassDescriptor::default())
        .unwrap();
    pass.set_pipeline(&pipeline_b);
    pass.set_bindings(&bindings);
    let err = device.submit_render_pass(pass).unwrap_err();
    assert!(matches!(err, PrismError::BindingsPipelineMismatch { .. }));
}

#[test]
fn draw_before_pipeline_is_a_usage_error() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let mut pass = device
        .create_render_pass(&RenderPassDescriptor::default())
        .unwrap();
    pass.draw(3, 1, 0);
    assert!(matches!(
        device.submit_render_pass(pass).unwrap_err(),
        PrismError::PassStateMissing(_)
    ));
}

#[test]
fn indexed_draw_requires_an_index_buffer() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let pipeline = basic_pipeline(&mut device);
    let mut pass = device
        .create_render_pass(&RenderPassDescriptor::default())
        .unwrap();
    pass.set_pipeline(&pipeline);
    pass.draw_indexed(6, 1, 0);
    assert!(matches!(
        device.submit_render_pass(pass).unwrap_err(),
        PrismError::PassStateMissing(_)
    ));
}

#[test]
fn render_bundle_commands_splice_into_the_pass() {
    let (ctx, mut device) = new_device(VendorProfile::GLES2);
    let pipeline = basic_pipeline(&mut device);

    let mut bundle = device.create_render_bundle().unwrap();
    bundle.set_pipeline(&pipeline);
    bundle.draw(3, 1, 0);
    let bundle = Rc::new(bundle);

    ctx.take_ops();
    let mut pass = device
        .create_render_pass(&RenderPassDescriptor::default())
        .unwrap();
    pass.execute_bundle(&bundle);
    device.submit_render_pass(pass).unwrap();

    let ops = ctx.take_ops();
    assert!(ops.iter().any(|op| op.starts_with("draw 3")));
}

// ============================================================================
// Compute gating & frame lifecycle
// ============================================================================

#[test]
fn compute_requires_the_modern_backend() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES3);
    assert!(matches!(
        device.create_compute_pass().unwrap_err(),
        PrismError::ComputeUnsupported(BackendKind::Gles3)
    ));

    let (_ctx, mut device) = new_device(VendorProfile::VULKAN);
    let program = device
        .create_program(&ProgramDescriptor::compute(SourceUnit::new(
            ShaderStage::Compute,
            "void main() {\n}\n",
        )))
        .unwrap();
    let pipeline = device.create_compute_pipeline(&program, None).unwrap();
    let mut pass = device.create_compute_pass().unwrap();
    pass.set_pipeline(&pipeline);
    pass.dispatch(8, 8, 1);
    device.submit_compute_pass(pass).unwrap();
}

#[test]
fn frame_lifecycle_brackets_backend_hooks() {
    let (ctx, mut device) = new_device(VendorProfile::GLES2);
    ctx.take_ops();
    device.begin_frame().unwrap();
    device.end_frame().unwrap();
    assert_eq!(device.frame_index(), 1);
    assert_eq!(ctx.take_ops(), vec!["begin_frame", "end_frame"]);
}

// ============================================================================
// Capability mismatches
// ============================================================================

#[test]
fn float_render_targets_are_rejected_on_legacy() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let err = device
        .create_texture(&TextureDescriptor::new(
            Format::F16Rgba,
            8,
            8,
            TextureUsage::RENDER_TARGET,
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        PrismError::UnsupportedFormat {
            format: Format::F16Rgba,
            backend: BackendKind::Gles2
        }
    ));

    // Sampling the same format is still allowed.
    let texture = device
        .create_texture(&TextureDescriptor::new(
            Format::F16Rgba,
            8,
            8,
            TextureUsage::SAMPLED,
        ))
        .unwrap();
    texture.destroy().unwrap();
}

#[test]
fn multiple_render_targets_need_a_capable_backend() {
    let (_ctx, mut device) = new_device(VendorProfile::GLES2);
    let color_a = device
        .create_texture(&TextureDescriptor::new(
            Format::U8Rgba,
            8,
            8,
            TextureUsage::RENDER_TARGET,
        ))
        .unwrap();
    let color_b = device
        .create_texture(&TextureDescriptor::new(
            Format::U8Rgba,
            8,
            8,
            TextureUsage::RENDER_TARGET,
        ))
        .unwrap();

    let err = device
        .create_render_target(&RenderTargetDescriptor {
            colors: &[&color_a, &color_b],
            depth: None,
            label: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        PrismError::TooManyColorAttachments {
            requested: 2,
            supported: 1
        }
    ));
}

#[test]
fn render_target_pass_draws_offscreen() {
    let (ctx, mut device) = new_device(VendorProfile::GLES3);
    let color = device
        .create_texture(&TextureDescriptor::new(
            Format::U8Rgba,
            64,
            64,
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
        ))
        .unwrap();
    let depth = device
        .create_texture(&TextureDescriptor::new(
            Format::D24S8,
            64,
            64,
            TextureUsage::RENDER_TARGET,
        ))
        .unwrap();
    let target = device
        .create_render_target(&RenderTargetDescriptor {
            colors: &[&color],
            depth: Some(&depth),
            label: Some("offscreen"),
        })
        .unwrap();
    let pipeline = basic_pipeline(&mut device);

    ctx.take_ops();
    let mut pass = device
        .create_render_pass(&RenderPassDescriptor {
            target: Some(&target),
            clear_color: Some([0.0; 4]),
            clear_depth: Some(1.0),
            ..RenderPassDescriptor::default()
        })
        .unwrap();
    pass.set_pipeline(&pipeline);
    pass.draw(3, 1, 0);
    device.submit_render_pass(pass).unwrap();

    let ops = ctx.take_ops();
    assert!(ops[0].starts_with("begin_pass #"), "{ops:?}");
}
