//! GPU Buffer
//!
//! A [`Buffer`] owns a logical byte range backed by one or more native
//! allocations ("pages"). Paging is transparent: when the logical size
//! exceeds the backend's maximum single allocation, writes and binds are
//! sharded across pages, and [`page_span`] maps a logical byte range to the
//! set of (page, intra-page range) pairs it touches. The mapping is a pure
//! function so it stays unit-testable independent of any backend handle.

use std::cell::RefCell;
use std::rc::Rc;

use bytemuck::Pod;
use smallvec::SmallVec;

use crate::backend::{NativeContext, RawBuffer};
use crate::errors::{PrismError, Result};
use crate::format::{BufferUsage, UpdateHint};

use super::{ResourceCore, ResourceId, ResourceKind, ResourceRegistry};

/// Initial contents or bare size of a new buffer.
#[derive(Debug, Clone, Copy)]
pub enum BufferSource<'a> {
    /// Allocate `n` zeroed bytes.
    Size(u64),
    /// Allocate and upload the given bytes.
    Data(&'a [u8]),
}

impl<'a> BufferSource<'a> {
    /// Wraps a typed slice as initial contents.
    pub fn from_slice<T: Pod>(data: &'a [T]) -> Self {
        Self::Data(bytemuck::cast_slice(data))
    }

    /// Logical byte size of the buffer this source describes.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        match self {
            Self::Size(n) => *n,
            Self::Data(bytes) => bytes.len() as u64,
        }
    }
}

/// Buffer creation options.
#[derive(Debug, Clone, Copy)]
pub struct BufferDescriptor<'a> {
    pub source: BufferSource<'a>,
    pub usage: BufferUsage,
    /// Expected update frequency, forwarded to the native allocator.
    pub hint: UpdateHint,
    pub label: Option<&'a str>,
}

impl<'a> BufferDescriptor<'a> {
    /// A descriptor with the default (static) update hint.
    #[must_use]
    pub fn new(source: BufferSource<'a>, usage: BufferUsage) -> Self {
        Self {
            source,
            usage,
            hint: UpdateHint::Static,
            label: None,
        }
    }
}

/// One (page, intra-page range) pair touched by a logical byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// Index of the touched page.
    pub page_index: usize,
    /// Offset of the range inside that page.
    pub page_offset: u64,
    /// Offset into the source data where this page's slice starts.
    pub data_offset: usize,
    /// Bytes written to this page.
    pub len: usize,
}

/// Maps `(offset, len)` to the pages it touches under `page_size`-byte
/// paging.
#[must_use]
pub fn page_span(offset: u64, len: u64, page_size: u64) -> SmallVec<[PageRange; 2]> {
    let mut spans = SmallVec::new();
    if len == 0 || page_size == 0 {
        return spans;
    }
    let mut cursor = offset;
    let end = offset + len;
    while cursor < end {
        let page_index = (cursor / page_size) as usize;
        let page_offset = cursor % page_size;
        let take = (page_size - page_offset).min(end - cursor);
        spans.push(PageRange {
            page_index,
            page_offset,
            data_offset: (cursor - offset) as usize,
            len: take as usize,
        });
        cursor += take;
    }
    spans
}

/// A logical GPU buffer, possibly sharded across several native pages.
pub struct Buffer {
    core: ResourceCore,
    byte_size: u64,
    usage: BufferUsage,
    hint: UpdateHint,
    page_size: u64,
    pages: SmallVec<[RawBuffer; 1]>,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.core.id())
            .field("byte_size", &self.byte_size)
            .field("usage", &self.usage)
            .field("hint", &self.hint)
            .field("page_size", &self.page_size)
            .field("pages", &self.pages)
            .finish()
    }
}

impl Buffer {
    /// Allocates all backing pages; on partial failure every page already
    /// allocated is released and the whole call fails.
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        desc: &BufferDescriptor<'_>,
        page_size: u64,
    ) -> Result<Self> {
        let byte_size = desc.source.byte_size();
        if byte_size == 0 {
            return Err(PrismError::InvalidDescriptor(
                "buffer size must be non-zero".into(),
            ));
        }

        let page_count = byte_size.div_ceil(page_size) as usize;
        let mut pages: SmallVec<[RawBuffer; 1]> = SmallVec::new();
        for i in 0..page_count {
            let this_page = (byte_size - i as u64 * page_size).min(page_size);
            match ctx.create_buffer(this_page, desc.usage, desc.hint) {
                Ok(handle) => pages.push(handle),
                Err(e) => {
                    for allocated in pages {
                        ctx.destroy_buffer(allocated);
                    }
                    return Err(e);
                }
            }
        }

        let buffer = Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::Buffer, desc.label),
            byte_size,
            usage: desc.usage,
            hint: desc.hint,
            page_size,
            pages,
        };

        if let BufferSource::Data(bytes) = desc.source {
            buffer.set_sub_data(0, bytes)?;
        }
        Ok(buffer)
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    #[must_use]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    #[must_use]
    pub fn update_hint(&self) -> UpdateHint {
        self.hint
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    /// Uploads `data` at `offset`, splitting the write across page
    /// boundaries. The range must lie inside the logical size.
    pub fn set_sub_data(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.core.ensure_alive()?;
        let len = data.len() as u64;
        if offset + len > self.byte_size {
            return Err(PrismError::RangeOutOfBounds {
                offset,
                len,
                size: self.byte_size,
            });
        }
        for span in page_span(offset, len, self.page_size) {
            self.core.ctx().write_buffer(
                self.pages[span.page_index],
                span.page_offset,
                &data[span.data_offset..span.data_offset + span.len],
            );
        }
        Ok(())
    }

    /// Resolves a logical offset to its backing page and intra-page offset.
    pub(crate) fn page_for(&self, offset: u64) -> Result<(RawBuffer, u64)> {
        self.core.ensure_alive()?;
        let index = ((offset / self.page_size) as usize).min(self.pages.len() - 1);
        Ok((self.pages[index], offset % self.page_size))
    }

    /// Releases every backing page. Terminal; a second call is an error.
    pub fn destroy(&self) -> Result<()> {
        self.core.release()?;
        for page in &self.pages {
            self.core.ctx().destroy_buffer(*page);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_within_one_page() {
        let spans = page_span(16, 32, 256);
        assert_eq!(spans.len(), 1);
        assert_eq!(
            spans[0],
            PageRange {
                page_index: 0,
                page_offset: 16,
                data_offset: 0,
                len: 32
            }
        );
    }

    #[test]
    fn test_span_across_page_boundary() {
        let spans = page_span(250, 12, 256);
        assert_eq!(spans.len(), 2);
        assert_eq!(
            spans[0],
            PageRange {
                page_index: 0,
                page_offset: 250,
                data_offset: 0,
                len: 6
            }
        );
        assert_eq!(
            spans[1],
            PageRange {
                page_index: 1,
                page_offset: 0,
                data_offset: 6,
                len: 6
            }
        );
    }

    #[test]
    fn test_span_covering_three_pages() {
        let spans = page_span(0, 768, 256);
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| s.len == 256));
        assert_eq!(spans[2].page_index, 2);
    }

    #[test]
    fn test_empty_span() {
        assert!(page_span(10, 0, 256).is_empty());
    }
}
