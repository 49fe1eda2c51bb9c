// src/engine/memory.rs
//
// Byte-weighted backpressure for decode/resize/encode work.
//
// Every conversion acquires a permit sized from the image header before any
// pixel buffer is allocated, so a batch of large images cannot OOM the process
// even when the thread pool would happily run them all at once.

use crate::engine::resample::scaled_dimensions;
use image::ImageFormat;
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, OnceLock};

/// Estimated memory per conversion when the header gives no usable dimensions.
pub const ESTIMATED_MEMORY_PER_CONVERSION: u64 = 100 * 1024 * 1024;

/// Memory reserved for the rest of the process.
const RESERVED_MEMORY: u64 = 64 * 1024 * 1024;

/// Lower bound for any estimate to avoid zero-ish weights.
const MIN_ESTIMATE_BYTES: u64 = 24 * 1024 * 1024;

/// Overhead for decode scratch and encoder output buffers (heuristic).
const DECODE_OVERHEAD_BYTES: u64 = 8 * 1024 * 1024;

/// Bytes-per-pixel assumptions for decoded images, per input format.
const BPP_JPEG: u64 = 3; // YCbCr -> RGB
const BPP_PNG: u64 = 4; // favor safety (alpha)
const BPP_WEBP: u64 = 4;
const BPP_UNKNOWN: u64 = 4;

/// Maximum conversions worth of capacity when memory detection fails.
const FALLBACK_CONCURRENT_CONVERSIONS: u64 = 16;

const FALLBACK_SEMAPHORE_CAPACITY: u64 =
    ESTIMATED_MEMORY_PER_CONVERSION * FALLBACK_CONCURRENT_CONVERSIONS;

/// In-memory weighted semaphore for byte-based backpressure.
#[derive(Debug)]
pub struct WeightedSemaphore {
    capacity: u64,
    state: Mutex<u64>, // available bytes
    cvar: Condvar,
}

#[derive(Debug)]
pub struct MemoryPermit {
    sem: Arc<WeightedSemaphore>,
    weight: u64,
}

impl WeightedSemaphore {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            state: Mutex::new(capacity),
            cvar: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn acquire(self: &Arc<Self>, weight: u64) -> MemoryPermit {
        let mut available = self.state.lock();
        // clamp absurd weights to capacity to avoid deadlock
        let need = weight.min(self.capacity);
        while *available < need {
            self.cvar.wait(&mut available);
        }
        *available -= need;
        MemoryPermit {
            sem: Arc::clone(self),
            weight: need,
        }
    }

    fn release(&self, weight: u64) {
        let mut available = self.state.lock();
        *available = (*available).saturating_add(weight).min(self.capacity);
        // notify_all: with heterogeneous weights, notify_one can strand a small
        // waiter behind a large one that still cannot fit.
        self.cvar.notify_all();
    }
}

impl Drop for MemoryPermit {
    fn drop(&mut self) {
        self.sem.release(self.weight);
    }
}

static GLOBAL_MEMORY_SEMAPHORE: OnceLock<Arc<WeightedSemaphore>> = OnceLock::new();

/// Global weighted semaphore shared by all conversions in the process.
pub fn memory_semaphore() -> Arc<WeightedSemaphore> {
    GLOBAL_MEMORY_SEMAPHORE
        .get_or_init(|| Arc::new(WeightedSemaphore::new(compute_semaphore_capacity())))
        .clone()
}

fn compute_semaphore_capacity() -> u64 {
    match detect_available_memory() {
        Some(mem) => mem.saturating_sub(RESERVED_MEMORY).max(MIN_ESTIMATE_BYTES),
        None => FALLBACK_SEMAPHORE_CAPACITY,
    }
}

/// Available memory from the cgroup limit (v2 then v1), else /proc/meminfo.
#[cfg(target_os = "linux")]
fn detect_available_memory() -> Option<u64> {
    if let Ok(s) = std::fs::read_to_string("/sys/fs/cgroup/memory.max") {
        if let Ok(bytes) = s.trim().parse::<u64>() {
            return Some(bytes);
        }
    }
    if let Ok(s) = std::fs::read_to_string("/sys/fs/cgroup/memory/memory.limit_in_bytes") {
        if let Ok(bytes) = s.trim().parse::<u64>() {
            // v1 reports a huge sentinel when unlimited
            if bytes < (1u64 << 60) {
                return Some(bytes);
            }
        }
    }
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let kb: u64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn detect_available_memory() -> Option<u64> {
    None
}

fn bytes_for_image(width: u32, height: u32, bytes_per_pixel: u64) -> u64 {
    (width as u64 * height as u64).saturating_mul(bytes_per_pixel)
}

fn default_bpp(format: Option<ImageFormat>) -> u64 {
    match format {
        Some(ImageFormat::Jpeg) => BPP_JPEG,
        Some(ImageFormat::Png) => BPP_PNG,
        Some(ImageFormat::WebP) => BPP_WEBP,
        _ => BPP_UNKNOWN,
    }
}

/// Peak memory estimate for one conversion, from header dimensions.
///
/// Peak = decoded source buffer + resized destination buffer + scratch
/// overhead. The resize path works on RGBA internally for alpha formats, so
/// the destination always assumes 4 bytes per pixel.
pub fn estimate_conversion_memory(
    width: u32,
    height: u32,
    format: Option<ImageFormat>,
    resize_percentage: u8,
) -> u64 {
    if width == 0 || height == 0 {
        return ESTIMATED_MEMORY_PER_CONVERSION;
    }
    let src = bytes_for_image(width, height, default_bpp(format));
    let (dst_w, dst_h) = scaled_dimensions(width, height, resize_percentage);
    let dst = if resize_percentage == 100 {
        0
    } else {
        bytes_for_image(dst_w, dst_h, 4)
    };
    src.saturating_add(dst)
        .saturating_add(DECODE_OVERHEAD_BYTES)
        .max(MIN_ESTIMATE_BYTES)
}
