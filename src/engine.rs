// src/engine.rs
//
// The conversion engine: decode, resample, re-encode, and the batch
// orchestration on top. This file is a facade over the modules in engine/.

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
/// This is the same limit used by libvips/sharp.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

mod batch;
mod codec;
mod converter;
mod decoder;
mod encoder;
mod io;
mod memory;
mod pool;
mod resample;

pub use batch::{convert_batch, convert_batch_with_concurrency, ProgressFn};
pub use codec::{Codec, EngineCodec};
pub use converter::{convert_one, ConversionOutput};
pub use decoder::{check_dimensions, decode_image, detect_format, probe_dimensions};
pub use encoder::{encode_jpeg, encode_png, encode_webp, QualitySettings};
pub use io::Source;
pub use memory::{estimate_conversion_memory, memory_semaphore, MemoryPermit, WeightedSemaphore};
pub use pool::{effective_concurrency, MAX_CONCURRENCY};
pub use resample::{resize_image, scaled_dimensions};
