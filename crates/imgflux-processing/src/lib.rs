//! Image transformation engine
//!
//! Decodes a source image, applies the operations of an
//! [`OperationSet`](imgflux_core::OperationSet) in their fixed order and encodes the result.
//! Everything here is synchronous and CPU-bound; callers run it off the async runtime.

pub mod compression;
pub mod image;

pub use compression::{resolve_format, EncodeOptions, ImageCompressor};
pub use self::image::{TransformEngine, TransformOutput};
