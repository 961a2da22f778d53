pub mod console;
pub mod error;
pub mod manager;
pub mod memory;
pub mod wasm_host;

#[cfg(test)]
mod test_support;

pub use console::{Console, HostState};
pub use error::{HostError, Result};
pub use manager::{CallOutcome, ContractManager, HeapBalance};
pub use wasm_host::{HostLimits, WasmHost};
