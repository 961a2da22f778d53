use probe_sdk::{chain_print, export_contract_alloc, export_heap_probe, read_string_from_host};

export_contract_alloc!();
export_heap_probe!();

/// 合约入口：打印 `hello <name>`
///
/// # Safety
///
/// `name` must be valid for reads of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn say_hello(name: *const u8, size: u32) {
    let name = read_string_from_host(name, size);
    chain_print!("hello ", name);
}
