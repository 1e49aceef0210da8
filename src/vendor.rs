//! Vendor Capability Descriptors
//!
//! A [`VendorProfile`] is the immutable set of per-backend facts that drives
//! both the shader cross-compiler and the device's emulation choices: which
//! dialect to emit, whether binding locations are explicit, whether combined
//! texture+sampler types must be split, and the clip-space / viewport
//! conventions consumed by downstream matrix utilities.
//!
//! Profiles are supplied once, at compiler invocation and at device
//! creation, and never mutated.

/// The three supported native backends, in the order a caller might prefer
/// them. Selection walks the caller's preference list and takes the first
/// backend the host supports (see [`crate::device::select_backend`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Legacy fixed-binding GL dialect (ES 2 class): attribute/varying
    /// vocabulary, combined samplers, no uniform buffers.
    Gles2,
    /// GL dialect with uniform buffers and explicit in/out qualifiers
    /// (ES 3 class).
    Gles3,
    /// Modern explicit bind-group dialect (Vulkan-style GLSL).
    Vulkan,
}

/// Shading-language dialect tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Glsl100,
    Glsl300Es,
    Glsl450,
}

/// Clip-space depth range convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipDepth {
    /// Depth in `[-1, 1]` (classic GL).
    NegOneToOne,
    /// Depth in `[0, 1]` (modern APIs).
    ZeroToOne,
}

/// Viewport Y-axis origin convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportOrigin {
    /// Y grows upward from the bottom-left corner (classic GL).
    BottomLeft,
    /// Y grows downward from the top-left corner (modern APIs).
    TopLeft,
}

/// Immutable per-backend capability facts.
///
/// | Field | Gles2 | Gles3 | Vulkan |
/// |-------|-------|-------|--------|
/// | version directive | — | `#version 300 es` | `#version 450` |
/// | explicit binding locations | no | no | yes |
/// | separate texture/sampler | no | no | yes |
/// | uniform buffers | no | yes | yes |
/// | multiple render targets | no | yes | yes |
/// | compute | no | no | yes |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VendorProfile {
    /// Which backend these facts describe.
    pub backend: BackendKind,
    /// Target shading-language dialect.
    pub dialect: Dialect,
    /// Version directive to prepend, when the dialect requires one.
    pub version_directive: Option<&'static str>,
    /// Binding locations are carried explicitly in the shader source.
    pub explicit_binding_locations: bool,
    /// Combined `sampler2D` types must be split into texture + sampler.
    pub separate_sampler_textures: bool,
    /// Uniform blocks stay buffer-backed; otherwise they are flattened.
    pub supports_uniform_buffers: bool,
    /// More than one color attachment per render target.
    pub supports_mrt: bool,
    /// Compute programs and compute passes.
    pub supports_compute: bool,
    /// Built-in vertex/instance indices use the `*Index` naming.
    pub swapped_index_names: bool,
    /// Clip-space depth range convention.
    pub clip_depth: ClipDepth,
    /// Viewport Y origin convention.
    pub viewport_origin: ViewportOrigin,
}

impl VendorProfile {
    /// Legacy fixed-binding GL profile.
    pub const GLES2: Self = Self {
        backend: BackendKind::Gles2,
        dialect: Dialect::Glsl100,
        version_directive: None,
        explicit_binding_locations: false,
        separate_sampler_textures: false,
        supports_uniform_buffers: false,
        supports_mrt: false,
        supports_compute: false,
        swapped_index_names: false,
        clip_depth: ClipDepth::NegOneToOne,
        viewport_origin: ViewportOrigin::BottomLeft,
    };

    /// Uniform-buffer GL profile.
    pub const GLES3: Self = Self {
        backend: BackendKind::Gles3,
        dialect: Dialect::Glsl300Es,
        version_directive: Some("#version 300 es"),
        explicit_binding_locations: false,
        separate_sampler_textures: false,
        supports_uniform_buffers: true,
        supports_mrt: true,
        supports_compute: false,
        swapped_index_names: false,
        clip_depth: ClipDepth::NegOneToOne,
        viewport_origin: ViewportOrigin::BottomLeft,
    };

    /// Modern explicit bind-group profile.
    pub const VULKAN: Self = Self {
        backend: BackendKind::Vulkan,
        dialect: Dialect::Glsl450,
        version_directive: Some("#version 450"),
        explicit_binding_locations: true,
        separate_sampler_textures: true,
        supports_uniform_buffers: true,
        supports_mrt: true,
        supports_compute: true,
        swapped_index_names: true,
        clip_depth: ClipDepth::ZeroToOne,
        viewport_origin: ViewportOrigin::TopLeft,
    };

    /// Returns the profile for a backend kind.
    #[must_use]
    pub fn for_backend(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Gles2 => Self::GLES2,
            BackendKind::Gles3 => Self::GLES3,
            BackendKind::Vulkan => Self::VULKAN,
        }
    }

    /// `true` for the oldest dialect, which needs the legacy vocabulary and
    /// extension shims.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self.dialect, Dialect::Glsl100)
    }
}
