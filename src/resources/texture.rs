//! Textures, Samplers & Render Targets

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::backend::{
    NativeContext, NativeSamplerDesc, NativeTextureDesc, RawRenderTarget, RawSampler, RawTexture,
};
use crate::errors::{PrismError, Result};
use crate::format::{AddressMode, CompareMode, FilterMode, Format, MipFilterMode, TextureUsage};

use super::{ResourceCore, ResourceId, ResourceKind, ResourceRegistry};

/// Texture creation options.
#[derive(Debug, Clone, Copy)]
pub struct TextureDescriptor<'a> {
    pub format: Format,
    pub width: u32,
    pub height: u32,
    /// Array layers (1 for plain 2D textures, 6 for cube maps).
    pub layers: u32,
    pub mip_levels: u32,
    pub usage: TextureUsage,
    pub label: Option<&'a str>,
}

impl<'a> TextureDescriptor<'a> {
    /// A single-layer, single-level 2D texture.
    #[must_use]
    pub fn new(format: Format, width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            format,
            width,
            height,
            layers: 1,
            mip_levels: 1,
            usage,
            label: None,
        }
    }
}

/// A GPU texture wrapping one native handle.
pub struct Texture {
    core: ResourceCore,
    handle: RawTexture,
    format: Format,
    width: u32,
    height: u32,
    usage: TextureUsage,
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.core.id())
            .field("handle", &self.handle)
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("usage", &self.usage)
            .finish()
    }
}

impl Texture {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        desc: &TextureDescriptor<'_>,
    ) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 {
            return Err(PrismError::InvalidDescriptor(
                "texture dimensions must be non-zero".into(),
            ));
        }
        let handle = ctx.create_texture(&NativeTextureDesc {
            format: desc.format,
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            mip_levels: desc.mip_levels,
            usage: desc.usage,
        })?;
        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::Texture, desc.label),
            handle,
            format: desc.format,
            width: desc.width,
            height: desc.height,
            usage: desc.usage,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    pub(crate) fn raw(&self) -> Result<RawTexture> {
        self.core.ensure_alive()?;
        Ok(self.handle)
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()?;
        self.core.ctx().destroy_texture(self.handle);
        Ok(())
    }
}

/// Sampler creation options.
#[derive(Debug, Clone, Copy)]
pub struct SamplerDescriptor<'a> {
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mip_filter: MipFilterMode,
    /// Comparison sampling (shadow maps); `None` for plain sampling.
    pub compare: Option<CompareMode>,
    pub label: Option<&'a str>,
}

impl Default for SamplerDescriptor<'_> {
    fn default() -> Self {
        Self {
            address_u: AddressMode::ClampToEdge,
            address_v: AddressMode::ClampToEdge,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mip_filter: MipFilterMode::None,
            compare: None,
            label: None,
        }
    }
}

/// A GPU sampler wrapping one native handle.
pub struct Sampler {
    core: ResourceCore,
    handle: RawSampler,
}

impl Sampler {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        desc: &SamplerDescriptor<'_>,
    ) -> Result<Self> {
        let handle = ctx.create_sampler(&NativeSamplerDesc {
            address_u: desc.address_u,
            address_v: desc.address_v,
            min_filter: desc.min_filter,
            mag_filter: desc.mag_filter,
            mip_filter: desc.mip_filter,
            compare: desc.compare,
        })?;
        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::Sampler, desc.label),
            handle,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    pub(crate) fn raw(&self) -> Result<RawSampler> {
        self.core.ensure_alive()?;
        Ok(self.handle)
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()?;
        self.core.ctx().destroy_sampler(self.handle);
        Ok(())
    }
}

/// Render-target creation options: the attached textures.
pub struct RenderTargetDescriptor<'a> {
    pub colors: &'a [&'a Rc<Texture>],
    pub depth: Option<&'a Rc<Texture>>,
    pub label: Option<&'a str>,
}

/// A framebuffer object over previously created textures.
pub struct RenderTarget {
    core: ResourceCore,
    handle: RawRenderTarget,
    color_formats: SmallVec<[Format; 4]>,
    depth_format: Option<Format>,
}

impl std::fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTarget")
            .field("id", &self.core.id())
            .field("handle", &self.handle)
            .field("color_formats", &self.color_formats)
            .field("depth_format", &self.depth_format)
            .finish()
    }
}

impl RenderTarget {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        desc: &RenderTargetDescriptor<'_>,
    ) -> Result<Self> {
        let mut colors = SmallVec::<[RawTexture; 4]>::new();
        let mut color_formats = SmallVec::new();
        for texture in desc.colors {
            if !texture.usage().contains(TextureUsage::RENDER_TARGET) {
                return Err(PrismError::InvalidDescriptor(format!(
                    "texture #{} lacks RENDER_TARGET usage",
                    texture.id()
                )));
            }
            colors.push(texture.raw()?);
            color_formats.push(texture.format());
        }
        let depth = desc.depth.map(|t| t.raw()).transpose()?;
        let depth_format = desc.depth.map(|t| t.format());
        if let Some(format) = depth_format
            && !format.is_depth()
        {
            return Err(PrismError::InvalidDescriptor(format!(
                "{format:?} is not a depth format"
            )));
        }

        let handle = ctx.create_render_target(&colors, depth)?;
        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::RenderTarget, desc.label),
            handle,
            color_formats,
            depth_format,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn color_formats(&self) -> &[Format] {
        &self.color_formats
    }

    #[must_use]
    pub fn depth_format(&self) -> Option<Format> {
        self.depth_format
    }

    pub(crate) fn raw(&self) -> Result<RawRenderTarget> {
        self.core.ensure_alive()?;
        Ok(self.handle)
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()?;
        self.core.ctx().destroy_render_target(self.handle);
        Ok(())
    }
}
