//! Format & State Tables
//!
//! Declarative mappings between the abstract pixel/vertex formats and the
//! per-backend enumerations, byte sizes and component counts, plus the shared
//! fixed-function state enums and usage flags.
//!
//! Format names are byte-exact: the component type comes first, then the
//! channel layout, so [`Format::F32Rg`] is two 32-bit floats and
//! [`Format::U8Rgba`] is four 8-bit unsigned normalized channels.

use bitflags::bitflags;

/// Abstract pixel / vertex element format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// One 8-bit unsigned normalized channel.
    U8R,
    /// Two 8-bit unsigned normalized channels.
    U8Rg,
    /// Four 8-bit unsigned normalized channels.
    U8Rgba,
    /// One 16-bit unsigned integer (index buffers).
    U16R,
    /// One 32-bit unsigned integer (index buffers).
    U32R,
    /// Two 16-bit floats.
    F16Rg,
    /// Four 16-bit floats.
    F16Rgba,
    /// One 32-bit float.
    F32R,
    /// Two 32-bit floats.
    F32Rg,
    /// Three 32-bit floats.
    F32Rgb,
    /// Four 32-bit floats.
    F32Rgba,
    /// 24-bit depth with 8-bit stencil.
    D24S8,
    /// 32-bit float depth.
    D32F,
}

impl Format {
    /// Number of components per element.
    #[must_use]
    pub fn component_count(self) -> u32 {
        match self {
            Self::U8R | Self::U16R | Self::U32R | Self::F32R | Self::D32F => 1,
            Self::U8Rg | Self::F16Rg | Self::F32Rg | Self::D24S8 => 2,
            Self::F32Rgb => 3,
            Self::U8Rgba | Self::F16Rgba | Self::F32Rgba => 4,
        }
    }

    /// Byte size of one whole element (all components).
    #[must_use]
    pub fn bytes_per_element(self) -> u32 {
        match self {
            Self::U8R => 1,
            Self::U8Rg | Self::U16R => 2,
            Self::U8Rgba | Self::U32R | Self::F16Rg | Self::F32R | Self::D24S8 | Self::D32F => 4,
            Self::F16Rgba | Self::F32Rg => 8,
            Self::F32Rgb => 12,
            Self::F32Rgba => 16,
        }
    }

    /// `true` for depth (and depth-stencil) formats.
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(self, Self::D24S8 | Self::D32F)
    }

    /// `true` when the format carries a stencil aspect.
    #[must_use]
    pub fn has_stencil(self) -> bool {
        matches!(self, Self::D24S8)
    }

    /// `true` for unsigned normalized color formats.
    #[must_use]
    pub fn is_normalized(self) -> bool {
        matches!(self, Self::U8R | Self::U8Rg | Self::U8Rgba)
    }

    /// GL component-type enumeration for vertex attribute setup.
    #[must_use]
    pub fn gl_component_type(self) -> u32 {
        match self {
            Self::U8R | Self::U8Rg | Self::U8Rgba => gl::UNSIGNED_BYTE,
            Self::U16R => gl::UNSIGNED_SHORT,
            Self::U32R | Self::D24S8 => gl::UNSIGNED_INT,
            Self::F16Rg | Self::F16Rgba => gl::HALF_FLOAT,
            Self::F32R | Self::F32Rg | Self::F32Rgb | Self::F32Rgba | Self::D32F => gl::FLOAT,
        }
    }

    /// GL sized internal-format enumeration for texture storage.
    #[must_use]
    pub fn gl_internal_format(self) -> u32 {
        match self {
            Self::U8R => gl::R8,
            Self::U8Rg => gl::RG8,
            Self::U8Rgba => gl::RGBA8,
            Self::U16R => gl::R16UI,
            Self::U32R => gl::R32UI,
            Self::F16Rg => gl::RG16F,
            Self::F16Rgba => gl::RGBA16F,
            Self::F32R => gl::R32F,
            Self::F32Rg => gl::RG32F,
            Self::F32Rgb => gl::RGB32F,
            Self::F32Rgba => gl::RGBA32F,
            Self::D24S8 => gl::DEPTH24_STENCIL8,
            Self::D32F => gl::DEPTH_COMPONENT32F,
        }
    }

    /// Format name in the modern dialect's texture vocabulary.
    #[must_use]
    pub fn modern_name(self) -> &'static str {
        match self {
            Self::U8R => "r8unorm",
            Self::U8Rg => "rg8unorm",
            Self::U8Rgba => "rgba8unorm",
            Self::U16R => "r16uint",
            Self::U32R => "r32uint",
            Self::F16Rg => "rg16float",
            Self::F16Rgba => "rgba16float",
            Self::F32R => "r32float",
            Self::F32Rg => "rg32float",
            Self::F32Rgb => "rgb32float",
            Self::F32Rgba => "rgba32float",
            Self::D24S8 => "depth24plus-stencil8",
            Self::D32F => "depth32float",
        }
    }
}

/// Raw GL enumeration values referenced by the format tables.
#[allow(clippy::unreadable_literal)]
mod gl {
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;

    pub const R8: u32 = 0x8229;
    pub const RG8: u32 = 0x822B;
    pub const RGBA8: u32 = 0x8058;
    pub const R16UI: u32 = 0x8234;
    pub const R32UI: u32 = 0x8236;
    pub const R32F: u32 = 0x822E;
    pub const RG16F: u32 = 0x822F;
    pub const RG32F: u32 = 0x8230;
    pub const RGB32F: u32 = 0x8815;
    pub const RGBA16F: u32 = 0x881A;
    pub const RGBA32F: u32 = 0x8814;
    pub const DEPTH24_STENCIL8: u32 = 0x88F0;
    pub const DEPTH_COMPONENT32F: u32 = 0x8CAC;
}

bitflags! {
    /// How a buffer will be used on the GPU. Bitwise-combinable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX   = 1 << 0;
        const INDEX    = 1 << 1;
        const UNIFORM  = 1 << 2;
        const STORAGE  = 1 << 3;
        const INDIRECT = 1 << 4;
    }
}

bitflags! {
    /// How a texture will be used on the GPU. Bitwise-combinable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED       = 1 << 0;
        const RENDER_TARGET = 1 << 1;
        const STORAGE       = 1 << 2;
    }
}

bitflags! {
    /// Per-channel color write mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelWriteMask: u8 {
        const RED   = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE  = 1 << 2;
        const ALPHA = 1 << 3;
    }
}

impl ChannelWriteMask {
    /// All four channels enabled.
    pub const ALL: Self = Self::all();
}

/// Expected update frequency of a buffer, used as an allocation hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateHint {
    /// Written once, read many times.
    #[default]
    Static,
    /// Rewritten every few frames.
    Dynamic,
    /// Rewritten every frame.
    Stream,
}

/// Depth / stencil comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareMode {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Blend equation operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend equation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOp {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
}

/// Triangle face culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

/// Texture minification / magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Mipmap selection filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipFilterMode {
    /// Sample the base level only.
    #[default]
    None,
    Nearest,
    Linear,
}

/// Texture coordinate addressing outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

/// Primitive assembly topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Whether a vertex buffer advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepMode {
    #[default]
    Vertex,
    Instance,
}

/// What a query pool measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Samples-passed occlusion queries.
    Occlusion,
    /// GPU timestamps.
    Timestamp,
}

/// Color/alpha blend equation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub color_src: BlendFactor,
    pub color_dst: BlendFactor,
    pub color_op: BlendOp,
    pub alpha_src: BlendFactor,
    pub alpha_dst: BlendFactor,
    pub alpha_op: BlendOp,
}

impl BlendState {
    /// Standard source-over alpha blending.
    pub const ALPHA_BLENDING: Self = Self {
        color_src: BlendFactor::SrcAlpha,
        color_dst: BlendFactor::OneMinusSrcAlpha,
        color_op: BlendOp::Add,
        alpha_src: BlendFactor::One,
        alpha_dst: BlendFactor::OneMinusSrcAlpha,
        alpha_op: BlendOp::Add,
    };
}

/// The fixed-function state block baked into a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    /// `None` disables blending.
    pub blend: Option<BlendState>,
    pub depth_write: bool,
    pub depth_compare: CompareMode,
    pub write_mask: ChannelWriteMask,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::None,
            blend: None,
            depth_write: true,
            depth_compare: CompareMode::Less,
            write_mask: ChannelWriteMask::ALL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes_match_layouts() {
        assert_eq!(Format::U8Rgba.bytes_per_element(), 4);
        assert_eq!(Format::F32Rg.bytes_per_element(), 8);
        assert_eq!(Format::F32Rgb.bytes_per_element(), 12);
        assert_eq!(Format::U16R.bytes_per_element(), 2);
    }

    #[test]
    fn test_component_counts() {
        assert_eq!(Format::F32Rg.component_count(), 2);
        assert_eq!(Format::U8Rgba.component_count(), 4);
        assert_eq!(Format::D32F.component_count(), 1);
    }

    #[test]
    fn test_depth_classification() {
        assert!(Format::D24S8.is_depth());
        assert!(Format::D24S8.has_stencil());
        assert!(Format::D32F.is_depth());
        assert!(!Format::D32F.has_stencil());
        assert!(!Format::U8Rgba.is_depth());
    }

    #[test]
    fn test_usage_flags_combine() {
        let usage = BufferUsage::VERTEX | BufferUsage::STORAGE;
        assert!(usage.contains(BufferUsage::VERTEX));
        assert!(!usage.contains(BufferUsage::INDEX));
    }
}
