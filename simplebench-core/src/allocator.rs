//! Allocation Tracking
//!
//! A `GlobalAlloc` wrapper around the system allocator that keeps the number
//! of live heap bytes and a resettable high-water mark. Install it in the
//! benchmark binary:
//!
//! ```ignore
//! use simplebench::TrackingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator;
//! ```
//!
//! Without it the counters never move, so the scheduler leaves the memory
//! sections out and logs a warning.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static LIVE_BYTES: AtomicU64 = AtomicU64::new(0);
static PEAK_BYTES: AtomicU64 = AtomicU64::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Global allocator that records live and peak heap usage
pub struct TrackingAllocator;

#[inline]
fn served(size: usize) {
    INSTALLED.store(true, Ordering::Relaxed);
    record_alloc(size);
}

#[inline]
fn record_alloc(size: usize) {
    let live = LIVE_BYTES.fetch_add(size as u64, Ordering::Relaxed) + size as u64;
    PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
}

#[inline]
fn record_dealloc(size: usize) {
    // Frees of memory allocated before tracking began must not underflow.
    let _ = LIVE_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
        Some(live.saturating_sub(size as u64))
    });
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded unchanged to the system allocator.
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            served(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded unchanged to the system allocator.
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            served(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: the caller upholds the `GlobalAlloc::dealloc` contract.
        unsafe { System.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: the caller upholds the `GlobalAlloc::realloc` contract.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            served(new_size);
        }
        new_ptr
    }
}

/// Snapshot of the allocation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationSnapshot {
    /// Heap bytes currently allocated
    pub live_bytes: u64,
    /// Highest live byte count since the last [`reset_peak_allocation`]
    pub peak_bytes: u64,
}

/// Read the current counters
pub fn current_allocation() -> AllocationSnapshot {
    AllocationSnapshot {
        live_bytes: LIVE_BYTES.load(Ordering::Relaxed),
        peak_bytes: PEAK_BYTES.load(Ordering::Relaxed),
    }
}

/// Restart the high-water mark from the current live byte count
pub fn reset_peak_allocation() {
    PEAK_BYTES.store(LIVE_BYTES.load(Ordering::Relaxed), Ordering::Relaxed);
}

/// Whether [`TrackingAllocator`] has served at least one allocation
pub fn tracking_installed() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

/// Memory measurement for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemoryProbe {
    start: AllocationSnapshot,
}

impl MemoryProbe {
    pub(crate) fn start() -> Self {
        reset_peak_allocation();
        Self {
            start: current_allocation(),
        }
    }

    /// Net bytes retained and peak bytes above the starting level
    pub(crate) fn finish(self) -> (i64, u64) {
        memory_usage(self.start, current_allocation())
    }
}

fn memory_usage(start: AllocationSnapshot, end: AllocationSnapshot) -> (i64, u64) {
    let delta = end.live_bytes as i64 - start.live_bytes as i64;
    let peak = end.peak_bytes.saturating_sub(start.live_bytes);
    (delta, peak)
}
