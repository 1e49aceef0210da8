//! Resource Lifecycle & Buffer Paging Tests
//!
//! Tests for:
//! - Buffer paging: page count, cross-page writes with correct intra-page
//!   offsets, bounds validation
//! - The Created → Active → Destroyed lifecycle: destroyed-use and
//!   re-destroy are loud usage errors
//! - Input-layout descriptor validation (index format restriction)
//! - Query pools: non-blocking polling, index range validation

use std::rc::Rc;

use prism::backend::{HeadlessContext, RawBuffer};
use prism::{
    BufferDescriptor, BufferSource, BufferUsage, Device, DeviceDescriptor, Format,
    InputLayoutDescriptor, PrismError, QueryKind, QueryPoolDescriptor, SamplerDescriptor,
    StepMode, VendorProfile, VertexAttribute, VertexBufferLayout,
};

fn device_with_ctx(vendor: VendorProfile, ctx: Rc<HeadlessContext>) -> Device {
    Device::new(vendor, ctx, DeviceDescriptor::default()).unwrap()
}

// ============================================================================
// Buffer paging
// ============================================================================

#[test]
fn oversized_buffer_allocates_ceil_pages() {
    let ctx = Rc::new(HeadlessContext::with_max_buffer_size(256));
    let mut device = device_with_ctx(VendorProfile::GLES3, Rc::clone(&ctx));

    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(600),
            BufferUsage::VERTEX,
        ))
        .unwrap();
    assert_eq!(buffer.page_count(), 3);
    assert_eq!(buffer.byte_size(), 600);
    // Three pages plus the device's fallback buffer.
    assert_eq!(ctx.live_buffers(), 4);

    buffer.destroy().unwrap();
    assert_eq!(ctx.live_buffers(), 1);
}

#[test]
fn page_spanning_write_lands_in_both_pages() {
    let ctx = Rc::new(HeadlessContext::with_max_buffer_size(256));
    let mut device = device_with_ctx(VendorProfile::GLES3, Rc::clone(&ctx));

    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(512),
            BufferUsage::VERTEX,
        ))
        .unwrap();
    let data: Vec<u8> = (1..=12).collect();
    buffer.set_sub_data(250, &data).unwrap();

    // The fallback buffer takes native handle 1; the two pages follow.
    let page0 = ctx.buffer_bytes(RawBuffer(2)).unwrap();
    let page1 = ctx.buffer_bytes(RawBuffer(3)).unwrap();
    assert_eq!(&page0[250..256], &[1, 2, 3, 4, 5, 6]);
    assert_eq!(&page1[..6], &[7, 8, 9, 10, 11, 12]);
    assert!(page1[6..].iter().all(|&b| b == 0));

    buffer.destroy().unwrap();
}

#[test]
fn initial_data_upload_spans_pages() {
    let ctx = Rc::new(HeadlessContext::with_max_buffer_size(8));
    let mut device = device_with_ctx(VendorProfile::GLES3, Rc::clone(&ctx));

    let data: Vec<u8> = (0..20).collect();
    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Data(&data),
            BufferUsage::UNIFORM,
        ))
        .unwrap();
    assert_eq!(buffer.page_count(), 3);

    let page2 = ctx.buffer_bytes(RawBuffer(4)).unwrap();
    // Last page holds the 4-byte remainder.
    assert_eq!(page2, vec![16, 17, 18, 19]);

    buffer.destroy().unwrap();
}

#[test]
fn out_of_bounds_write_is_rejected() {
    let ctx = Rc::new(HeadlessContext::new());
    let mut device = device_with_ctx(VendorProfile::GLES3, ctx);

    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(16),
            BufferUsage::UNIFORM,
        ))
        .unwrap();
    let err = buffer.set_sub_data(10, &[0; 8]).unwrap_err();
    assert!(matches!(
        err,
        PrismError::RangeOutOfBounds {
            offset: 10,
            len: 8,
            size: 16
        }
    ));
    buffer.destroy().unwrap();
}

#[test]
fn zero_sized_buffer_is_rejected() {
    let ctx = Rc::new(HeadlessContext::new());
    let mut device = device_with_ctx(VendorProfile::GLES3, ctx);
    let err = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(0),
            BufferUsage::VERTEX,
        ))
        .unwrap_err();
    assert!(matches!(err, PrismError::InvalidDescriptor(_)));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn operations_on_destroyed_buffer_fail_loudly() {
    let ctx = Rc::new(HeadlessContext::new());
    let mut device = device_with_ctx(VendorProfile::GLES3, ctx);

    let buffer = device
        .create_buffer(&BufferDescriptor::new(
            BufferSource::Size(16),
            BufferUsage::UNIFORM,
        ))
        .unwrap();
    buffer.destroy().unwrap();

    assert!(buffer.is_destroyed());
    assert!(matches!(
        buffer.set_sub_data(0, &[1]).unwrap_err(),
        PrismError::ResourceDestroyed { .. }
    ));
    assert!(matches!(
        buffer.destroy().unwrap_err(),
        PrismError::ResourceDestroyed { .. }
    ));
}

#[test]
fn sampler_destroy_is_terminal() {
    let ctx = Rc::new(HeadlessContext::new());
    let mut device = device_with_ctx(VendorProfile::GLES3, ctx);

    let sampler = device.create_sampler(&SamplerDescriptor::default()).unwrap();
    sampler.destroy().unwrap();
    assert!(sampler.destroy().is_err());
}

// ============================================================================
// Input layout validation
// ============================================================================

#[test]
fn index_format_must_be_u16_or_u32() {
    let ctx = Rc::new(HeadlessContext::new());
    let mut device = device_with_ctx(VendorProfile::GLES3, ctx);

    let buffers = [VertexBufferLayout {
        stride: 12,
        step: StepMode::Vertex,
    }];
    let attributes = [VertexAttribute {
        name: "a_Position",
        location: Some(0),
        buffer_index: 0,
        format: Format::F32Rgb,
        offset: 0,
    }];

    for (index_format, ok) in [
        (None, true),
        (Some(Format::U16R), true),
        (Some(Format::U32R), true),
        (Some(Format::F32R), false),
    ] {
        let result = device.create_input_layout(&InputLayoutDescriptor {
            buffers: &buffers,
            attributes: &attributes,
            index_format,
            label: None,
        });
        match result {
            Ok(layout) => {
                assert!(ok, "{index_format:?} should have been rejected");
                layout.destroy().unwrap();
            }
            Err(err) => {
                assert!(!ok);
                assert!(matches!(err, PrismError::InvalidIndexFormat(Format::F32R)));
            }
        }
    }
}

// ============================================================================
// Query pools
// ============================================================================

#[test]
fn query_results_are_polled_not_awaited() {
    let ctx = Rc::new(HeadlessContext::new());
    let mut device = device_with_ctx(VendorProfile::GLES3, Rc::clone(&ctx));

    let pool = device
        .create_query_pool(&QueryPoolDescriptor {
            kind: QueryKind::Occlusion,
            count: 4,
            label: None,
        })
        .unwrap();

    assert_eq!(pool.result(2).unwrap(), None);
    ctx.set_query_result(prism::backend::RawQueryPool(2), 2, 17);
    assert_eq!(pool.result(2).unwrap(), Some(17));

    assert!(matches!(
        pool.result(4).unwrap_err(),
        PrismError::QueryIndexOutOfRange { index: 4, count: 4 }
    ));
    pool.destroy().unwrap();
}
