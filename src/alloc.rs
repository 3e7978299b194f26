//! Heap tracing for peak memory measurement.
//!
//! [TracingAllocator] must be installed as the `#[global_allocator]` of
//! the final binary, otherwise every [MemoryTrace] reports zero:
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: autoalgo::TracingAllocator = autoalgo::TracingAllocator;
//! ```
//!
//! The counters are process-wide.  Only one trace may be open at a time,
//! and allocations from other threads during a trace are attributed to it.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static LIVE: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// A [System] allocator that keeps track of live and peak heap bytes.
pub struct TracingAllocator;

fn grow(n: usize) {
    let live = LIVE.fetch_add(n, Ordering::SeqCst) + n;
    PEAK.fetch_max(live, Ordering::SeqCst);
}

fn shrink(n: usize) {
    LIVE.fetch_sub(n, Ordering::SeqCst);
}

unsafe impl GlobalAlloc for TracingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let p = System.alloc(layout);
        if !p.is_null() {
            INSTALLED.store(true, Ordering::Relaxed);
            grow(layout.size());
        }
        p
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let p = System.alloc_zeroed(layout);
        if !p.is_null() {
            INSTALLED.store(true, Ordering::Relaxed);
            grow(layout.size());
        }
        p
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let p = System.realloc(ptr, layout, new_size);
        if !p.is_null() {
            let old = layout.size();
            if new_size > old {
                grow(new_size - old);
            } else {
                shrink(old - new_size);
            }
        }
        p
    }
}

/// Whether [TracingAllocator] has served any allocation, i.e. whether it
/// is the global allocator of this process.
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

/// A tracing scope.  The peak is measured relative to the heap size at
/// [MemoryTrace::start], so memory that was live before does not count.
pub struct MemoryTrace {
    baseline: usize,
}

impl MemoryTrace {
    pub fn start() -> Self {
        let baseline = LIVE.load(Ordering::SeqCst);
        PEAK.store(baseline, Ordering::SeqCst);
        Self { baseline }
    }

    /// Peak heap growth since the trace started.
    pub fn peak_bytes(&self) -> usize {
        PEAK.load(Ordering::SeqCst).saturating_sub(self.baseline)
    }
}

#[cfg(test)]
#[global_allocator]
static GLOBAL: TracingAllocator = TracingAllocator;

// Tests that open a trace hold this so they don't reset each other's peak.
#[cfg(test)]
pub(crate) static TRACE_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
