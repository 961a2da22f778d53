/// Exports the `alloc` / `dealloc` pair.
///
/// The host needs these to place call arguments in the contract's linear
/// memory; `dealloc` must be called with the same `len` that was allocated.
#[macro_export]
macro_rules! export_contract_alloc {
    () => {
        #[no_mangle]
        pub extern "C" fn alloc(len: usize) -> *mut u8 {
            let mut buf = ::std::vec::Vec::<u8>::with_capacity(len);
            let ptr = buf.as_mut_ptr();
            ::std::mem::forget(buf);
            ptr
        }

        /// # Safety
        ///
        /// `ptr` must come from `alloc(len)` and not have been freed yet.
        #[no_mangle]
        pub unsafe extern "C" fn dealloc(ptr: *mut u8, len: usize) {
            drop(::std::vec::Vec::from_raw_parts(ptr, 0, len));
        }
    };
}

/// Borrows `size` bytes passed by the host.
///
/// # Safety
///
/// - `ptr` must be valid for reads of `size` bytes
/// - the bytes must stay untouched for the returned lifetime
pub unsafe fn read_bytes_from_host<'a>(ptr: *const u8, size: u32) -> &'a [u8] {
    if size == 0 {
        return &[];
    }
    std::slice::from_raw_parts(ptr, size as usize)
}

/// Copies a string passed by the host; invalid UTF-8 is replaced.
///
/// # Safety
///
/// Same contract as [`read_bytes_from_host`].
pub unsafe fn read_string_from_host(ptr: *const u8, size: u32) -> String {
    String::from_utf8_lossy(read_bytes_from_host(ptr, size)).into_owned()
}
