pub mod console;
pub mod name;

pub use name::{Name, NameError, ACTIVE, CODE, INVALID_NAME, OWNER, SAME_PAYER};
