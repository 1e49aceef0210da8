//! Error Types
//!
//! This module defines the error types used throughout the device layer.
//!
//! # Overview
//!
//! The main error type [`PrismError`] covers all failure modes including:
//! - Backend selection and capability mismatches
//! - Descriptor validation failures
//! - Resource lifecycle misuse
//! - Shader compilation and program linking errors
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, PrismError>`.

use thiserror::Error;

use crate::format::Format;
use crate::resources::{ResourceId, ResourceKind};
use crate::vendor::BackendKind;

/// The main error type for the Prism device layer.
///
/// Variants fall into two families: **usage errors** (a programming mistake
/// in the caller, reported immediately and never silently degraded) and
/// **capability mismatches** (the active backend cannot satisfy the request,
/// reported at creation time with no automatic fallback).
#[derive(Error, Debug)]
pub enum PrismError {
    // ========================================================================
    // Backend & Capability Errors
    // ========================================================================
    /// None of the requested backends is available on this host.
    #[error("No requested backend is available (tried: {tried:?})")]
    BackendUnavailable {
        /// Backends that were probed, in preference order.
        tried: Vec<BackendKind>,
    },

    /// The active backend does not support the requested format.
    #[error("Format {format:?} is not supported by the {backend:?} backend")]
    UnsupportedFormat {
        /// The rejected format.
        format: Format,
        /// The active backend.
        backend: BackendKind,
    },

    /// More color attachments were requested than the backend supports.
    #[error("{requested} color attachments requested, backend supports {supported}")]
    TooManyColorAttachments { requested: usize, supported: u32 },

    /// Compute programs are not available on this backend.
    #[error("The {0:?} backend has no compute support")]
    ComputeUnsupported(BackendKind),

    /// The native context rejected an allocation.
    #[error("Native allocation failed: {0}")]
    AllocationFailed(String),

    // ========================================================================
    // Shader & Program Errors
    // ========================================================================
    /// Program compilation or linking failed in the native context.
    #[error("Program link failed: {0}")]
    ProgramLinkFailed(String),

    /// A program descriptor named an invalid stage combination.
    #[error("Invalid program stages: {0}")]
    InvalidProgramStages(&'static str),

    // ========================================================================
    // Descriptor Validation Errors
    // ========================================================================
    /// An index buffer format other than `U16R`/`U32R` was supplied.
    #[error("Index buffer format must be U16R or U32R, got {0:?}")]
    InvalidIndexFormat(Format),

    /// A descriptor field failed validation.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    // ========================================================================
    // Resource Lifecycle Errors (usage errors)
    // ========================================================================
    /// An operation was issued against a destroyed resource.
    #[error("{kind:?} #{id} has been destroyed")]
    ResourceDestroyed {
        /// Kind of the offending resource.
        kind: ResourceKind,
        /// Its process-unique identifier.
        id: ResourceId,
    },

    /// The device itself has been destroyed.
    #[error("Device has been destroyed")]
    DeviceDestroyed,

    /// A buffer write exceeded the logical buffer size.
    #[error("Write of {len} bytes at offset {offset} exceeds buffer size {size}")]
    RangeOutOfBounds { offset: u64, len: u64, size: u64 },

    /// A query index exceeded the pool's capacity.
    #[error("Query index {index} out of range (pool holds {count})")]
    QueryIndexOutOfRange { index: u32, count: u32 },

    /// Bindings were used with a pipeline they were not created from.
    #[error("Bindings #{bindings} were created for pipeline #{expected}, bound to #{actual}")]
    BindingsPipelineMismatch {
        bindings: ResourceId,
        expected: ResourceId,
        actual: ResourceId,
    },

    /// A draw or dispatch was recorded before the state it depends on.
    #[error("Pass command out of order: {0}")]
    PassStateMissing(&'static str),
}

/// Alias for `Result<T, PrismError>`.
pub type Result<T> = std::result::Result<T, PrismError>;
