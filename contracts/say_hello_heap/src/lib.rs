//! Greeting fixture with a heap probe.
//!
//! Boxes a `u64` for the duration of the print so the allocator runs inside
//! the call; the box address is printed after the name.

use probe_sdk::{export_contract_alloc, export_heap_probe, print_f, read_string_from_host};

export_contract_alloc!();
export_heap_probe!();

/// # Safety
///
/// `name` must be valid for reads of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn say_hello(name: *const u8, size: u32) {
    let probe = Box::new(0u64);
    let name = read_string_from_host(name, size);
    print_f!("hello % %", name, &*probe as *const u64 as u64);
    drop(probe);
}
