//! Print intrinsics exposed by the host.
//!
//! The signatures follow the chain's console API. Callers always go through
//! `unsafe`, regardless of target, so contract code is identical on and off
//! chain.

#[cfg(target_arch = "wasm32")]
mod on_chain {
    #[link(wasm_import_module = "env")]
    extern "C" {
        pub fn prints(cstr: *const u8);
        pub fn prints_l(cstr: *const u8, len: u32);
        pub fn printi(value: i64);
        pub fn printui(value: u64);
        pub fn printi128(value: *const [u8; 16]);
        pub fn printui128(value: *const [u8; 16]);
        pub fn printsf(value: f32);
        pub fn printdf(value: f64);
        pub fn printn(name: u64);
        pub fn printhex(data: *const u8, len: u32);
    }
}

#[cfg(target_arch = "wasm32")]
pub use on_chain::*;

#[cfg(not(target_arch = "wasm32"))]
mod off_chain {
    use probe_types::console;
    use probe_types::Name;
    use std::cell::RefCell;
    use std::ffi::CStr;

    thread_local! {
        static CONSOLE: RefCell<String> = const { RefCell::new(String::new()) };
    }

    fn push(text: &str) {
        CONSOLE.with(|c| c.borrow_mut().push_str(text));
    }

    /// Drains everything printed on this thread so far.
    pub fn take_console() -> String {
        CONSOLE.with(|c| std::mem::take(&mut *c.borrow_mut()))
    }

    pub fn console() -> String {
        CONSOLE.with(|c| c.borrow().clone())
    }

    /// # Safety
    /// `cstr` must point to a NUL-terminated buffer.
    pub unsafe fn prints(cstr: *const u8) {
        let bytes = CStr::from_ptr(cstr.cast()).to_bytes();
        push(&String::from_utf8_lossy(bytes));
    }

    /// # Safety
    /// `cstr` must be valid for reads of `len` bytes.
    pub unsafe fn prints_l(cstr: *const u8, len: u32) {
        let bytes = std::slice::from_raw_parts(cstr, len as usize);
        push(&String::from_utf8_lossy(bytes));
    }

    /// # Safety
    /// Always safe; `unsafe` only to mirror the on-chain import.
    pub unsafe fn printi(value: i64) {
        push(&value.to_string());
    }

    /// # Safety
    /// Always safe; `unsafe` only to mirror the on-chain import.
    pub unsafe fn printui(value: u64) {
        push(&value.to_string());
    }

    /// # Safety
    /// `value` must point to 16 readable bytes.
    pub unsafe fn printi128(value: *const [u8; 16]) {
        push(&console::i128_from_le(*value).to_string());
    }

    /// # Safety
    /// `value` must point to 16 readable bytes.
    pub unsafe fn printui128(value: *const [u8; 16]) {
        push(&console::u128_from_le(*value).to_string());
    }

    /// # Safety
    /// Always safe; `unsafe` only to mirror the on-chain import.
    pub unsafe fn printsf(value: f32) {
        push(&console::format_f32(value));
    }

    /// # Safety
    /// Always safe; `unsafe` only to mirror the on-chain import.
    pub unsafe fn printdf(value: f64) {
        push(&console::format_f64(value));
    }

    /// # Safety
    /// Always safe; `unsafe` only to mirror the on-chain import.
    pub unsafe fn printn(name: u64) {
        push(&Name::raw(name).to_string());
    }

    /// # Safety
    /// `data` must be valid for reads of `len` bytes.
    pub unsafe fn printhex(data: *const u8, len: u32) {
        let bytes = std::slice::from_raw_parts(data, len as usize);
        push(&console::format_hex(bytes));
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use off_chain::*;
