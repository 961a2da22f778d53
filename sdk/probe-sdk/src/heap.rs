//! 堆探针
//!
//! `CountingAlloc` forwards to the system allocator and keeps live block and
//! byte counts. The counters are const-initialised thread locals without a
//! destructor, so touching them never allocates.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

thread_local! {
    static LIVE_BLOCKS: Cell<isize> = const { Cell::new(0) };
    static LIVE_BYTES: Cell<isize> = const { Cell::new(0) };
}

fn track(blocks: isize, bytes: isize) {
    let _ = LIVE_BLOCKS.try_with(|c| c.set(c.get() + blocks));
    let _ = LIVE_BYTES.try_with(|c| c.set(c.get() + bytes));
}

pub struct CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            track(1, layout.size() as isize);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            track(1, layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        track(-1, -(layout.size() as isize));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            track(0, new_size as isize - layout.size() as isize);
        }
        new_ptr
    }
}

/// Blocks allocated and not yet freed on this thread.
pub fn live_blocks() -> isize {
    LIVE_BLOCKS.try_with(Cell::get).unwrap_or(0)
}

pub fn live_bytes() -> isize {
    LIVE_BYTES.try_with(Cell::get).unwrap_or(0)
}

/// Narrows a counter to the `i32` the probe exports return, saturating.
pub fn probe_value(count: isize) -> i32 {
    i32::try_from(count).unwrap_or(if count < 0 { i32::MIN } else { i32::MAX })
}

/// Installs [`CountingAlloc`] as the global allocator and exports the
/// `heap_live_blocks` / `heap_live_bytes` probes read by the host.
#[macro_export]
macro_rules! export_heap_probe {
    () => {
        #[global_allocator]
        static HEAP_PROBE: $crate::heap::CountingAlloc = $crate::heap::CountingAlloc;

        #[no_mangle]
        pub extern "C" fn heap_live_blocks() -> i32 {
            $crate::heap::probe_value($crate::heap::live_blocks())
        }

        #[no_mangle]
        pub extern "C" fn heap_live_bytes() -> i32 {
            $crate::heap::probe_value($crate::heap::live_bytes())
        }
    };
}
