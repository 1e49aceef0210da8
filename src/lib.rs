//! Prism: a unified GPU device layer.
//!
//! One descriptor-based interface over three incompatible native dialects:
//! a legacy fixed-binding GL API, its uniform-buffer successor, and a modern
//! explicit bind-group API. The two core subsystems are the
//! [`shader`] cross-compiler, which rewrites a single authoring dialect into
//! each backend's vocabulary and binding convention, and the
//! [`device`]/[`resources`] layer, which emulates modern GPU concepts
//! (explicit pipelines, bind groups, uniform buffers, occlusion queries) on
//! backends that lack them while tracking resource lifetime and detecting
//! leaks.
//!
//! Windowing, context creation and asset decoding are external
//! collaborators: a contribution acquires a [`backend::NativeContext`] and
//! hands it to [`Device::new`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod backend;
pub mod device;
pub mod errors;
pub mod format;
pub mod pass;
pub mod resources;
pub mod shader;
pub mod vendor;

pub use device::{Device, DeviceDescriptor, select_backend};
pub use errors::{PrismError, Result};
pub use format::{
    AddressMode, BlendFactor, BlendOp, BlendState, BufferUsage, ChannelWriteMask, CompareMode,
    CullMode, FilterMode, Format, MipFilterMode, PrimitiveTopology, QueryKind,
    RenderState, StepMode, TextureUsage, UpdateHint,
};
pub use pass::{ComputePass, RenderBundle, RenderPass, RenderPassDescriptor, VertexBufferBinding};
pub use resources::{
    Bindings, BindingsDescriptor, Buffer, BufferBinding, BufferDescriptor, BufferSource,
    ComputePipeline, InputLayout, InputLayoutDescriptor, LeakReport, Program, ProgramDescriptor,
    QueryPool, QueryPoolDescriptor, RenderPipeline, RenderPipelineDescriptor, RenderTarget,
    RenderTargetDescriptor, ResourceId, ResourceKind, Sampler, SamplerDescriptor, Texture,
    TextureBinding, TextureDescriptor, VertexAttribute, VertexBufferLayout,
};
pub use shader::{
    DefineValue, PreprocessedShader, SamplerBinding, SamplerKind, ShaderStage, SourceUnit,
    extract_defines, extract_uniform_leaf_names, preprocess,
};
pub use vendor::{BackendKind, ClipDepth, Dialect, VendorProfile, ViewportOrigin};
