//! Guest-side SDK for probe contracts.
//!
//! On `wasm32` every print goes to the host through the `env` imports; on
//! native targets the same calls land in a thread-local console so contract
//! crates can be unit tested without a sandbox.

pub mod heap;
pub mod intrinsics;
pub mod logging;
pub mod memory;
pub mod print;

pub use memory::{read_bytes_from_host, read_string_from_host};
pub use print::{
    print_f, printdf, printhex, printi, printi128, printn, prints, printsf, printui, printui128,
    Printable,
};
pub use probe_types::{name, Name};

#[cfg(not(target_arch = "wasm32"))]
pub use intrinsics::{console, take_console};
