use crate::intrinsics;
use probe_types::Name;

pub fn prints(s: &str) {
    unsafe { intrinsics::prints_l(s.as_ptr(), s.len() as u32) }
}

pub fn printi(value: i64) {
    unsafe { intrinsics::printi(value) }
}

pub fn printui(value: u64) {
    unsafe { intrinsics::printui(value) }
}

pub fn printi128(value: i128) {
    let bytes = value.to_le_bytes();
    unsafe { intrinsics::printi128(&bytes) }
}

pub fn printui128(value: u128) {
    let bytes = value.to_le_bytes();
    unsafe { intrinsics::printui128(&bytes) }
}

pub fn printsf(value: f32) {
    unsafe { intrinsics::printsf(value) }
}

pub fn printdf(value: f64) {
    unsafe { intrinsics::printdf(value) }
}

pub fn printn(name: Name) {
    unsafe { intrinsics::printn(name.value()) }
}

pub fn printhex(data: &[u8]) {
    unsafe { intrinsics::printhex(data.as_ptr(), data.len() as u32) }
}

/// A value that knows which console intrinsic renders it.
pub trait Printable {
    fn print(&self);
}

impl<T: Printable + ?Sized> Printable for &T {
    fn print(&self) {
        (**self).print();
    }
}

impl Printable for bool {
    fn print(&self) {
        prints(if *self { "true" } else { "false" });
    }
}

macro_rules! impl_printable {
    ($via:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl Printable for $t {
                fn print(&self) {
                    $via(*self as $wide);
                }
            }
        )*
    };
}

impl_printable!(printi as i64: i8, i16, i32, i64, isize);
impl_printable!(printui as u64: u8, u16, u32, u64, usize);
impl_printable!(printi128 as i128: i128);
impl_printable!(printui128 as u128: u128);
impl_printable!(printsf as f32: f32);
impl_printable!(printdf as f64: f64);

impl Printable for str {
    fn print(&self) {
        prints(self);
    }
}

impl Printable for String {
    fn print(&self) {
        prints(self);
    }
}

impl Printable for [u8] {
    fn print(&self) {
        printhex(self);
    }
}

impl Printable for Name {
    fn print(&self) {
        printn(*self);
    }
}

/// Prints `fmt`, substituting each `%` with the next argument.
///
/// Once the arguments run out the remainder of `fmt` is printed as is,
/// `%` included; surplus arguments are never printed.
pub fn print_f(fmt: &str, args: &[&dyn Printable]) {
    let mut args = args.iter();
    let mut rest = fmt;
    while let Some(pos) = rest.find('%') {
        let Some(arg) = args.next() else {
            break;
        };
        if pos > 0 {
            prints(&rest[..pos]);
        }
        arg.print();
        rest = &rest[pos + 1..];
    }
    if !rest.is_empty() {
        prints(rest);
    }
}

/// Prints every argument back to back.
///
/// ```ignore
/// chain_print!("hello ", name);
/// ```
#[macro_export]
macro_rules! chain_print {
    ($($arg:expr),* $(,)?) => {{
        $( $crate::print::Printable::print(&$arg); )*
    }};
}

/// ```ignore
/// print_f!("hello % %", name, 42u64);
/// ```
#[macro_export]
macro_rules! print_f {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::print::print_f($fmt, &[$(&$arg as &dyn $crate::print::Printable),*])
    };
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::take_console;

    fn capture(f: impl FnOnce()) -> String {
        let _ = take_console();
        f();
        take_console()
    }

    #[test]
    fn test_printable_scalars() {
        let out = capture(|| {
            crate::chain_print!(true, " ", -3i8, " ", 200u8, " ", u128::MAX, " ", -5i128);
        });
        assert_eq!(out, format!("true -3 200 {} -5", u128::MAX));
    }

    #[test]
    fn test_printable_text_bytes_and_names() {
        let owned = String::from("bob");
        let name: Name = "eosio.token".parse().unwrap();
        let out = capture(|| {
            crate::chain_print!("hi ", owned, " ", name, " ", [1u8, 255u8][..]);
        });
        assert_eq!(out, "hi bob eosio.token 01ff");
    }

    #[test]
    fn test_print_f_substitutes_in_order() {
        let out = capture(|| crate::print_f!("hello % %", "alice", 7u64));
        assert_eq!(out, "hello alice 7");
    }

    #[test]
    fn test_print_f_runs_out_of_args() {
        let out = capture(|| crate::print_f!("% and % and %", 1u32));
        assert_eq!(out, "1 and % and %");
    }

    #[test]
    fn test_print_f_ignores_surplus_args() {
        let out = capture(|| crate::print_f!("only %", "one", "two"));
        assert_eq!(out, "only one");
    }

    #[test]
    fn test_print_f_without_args() {
        let out = capture(|| crate::print_f!("100%"));
        assert_eq!(out, "100%");
        assert_eq!(capture(|| crate::print_f!("")), "");
    }

    #[test]
    fn test_print_f_adjacent_placeholders() {
        let out = capture(|| crate::print_f!("%%!", 1i32, 2i32));
        assert_eq!(out, "12!");
    }
}
