pub mod config;
pub mod logging;
pub mod suite;

pub use self::config::{CaseConfig, LoggingConfig, SuiteConfig};
pub use suite::{CaseReport, SuiteReport, SuiteRunner};
