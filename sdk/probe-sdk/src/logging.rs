//! 合约日志
//!
//! Level macros forwarding to the host's `log_*` imports, where they end up
//! in the host's tracing output under the `contract` target. Off chain they
//! go straight to `tracing`.

#[cfg(target_arch = "wasm32")]
mod imports {
    #[link(wasm_import_module = "env")]
    extern "C" {
        pub fn log_trace(ptr: *const u8, len: usize);
        pub fn log_debug(ptr: *const u8, len: usize);
        pub fn log_info(ptr: *const u8, len: usize);
        pub fn log_warn(ptr: *const u8, len: usize);
        pub fn log_error(ptr: *const u8, len: usize);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[cfg(target_arch = "wasm32")]
pub fn emit(level: Level, msg: &str) {
    let (ptr, len) = (msg.as_ptr(), msg.len());
    unsafe {
        match level {
            Level::Trace => imports::log_trace(ptr, len),
            Level::Debug => imports::log_debug(ptr, len),
            Level::Info => imports::log_info(ptr, len),
            Level::Warn => imports::log_warn(ptr, len),
            Level::Error => imports::log_error(ptr, len),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn emit(level: Level, msg: &str) {
    match level {
        Level::Trace => tracing::trace!(target: "contract", "{}", msg),
        Level::Debug => tracing::debug!(target: "contract", "{}", msg),
        Level::Info => tracing::info!(target: "contract", "{}", msg),
        Level::Warn => tracing::warn!(target: "contract", "{}", msg),
        Level::Error => tracing::error!(target: "contract", "{}", msg),
    }
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Trace, &::std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Debug, &::std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Info, &::std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Warn, &::std::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Error, &::std::format!($($arg)*))
    };
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<(String, Level, String)>>>);

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            let meta = event.metadata();
            self.0
                .lock()
                .unwrap()
                .push((meta.target().to_string(), *meta.level(), visitor.0));
        }
    }

    #[test]
    fn test_macros_log_under_contract_target() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            crate::info!("hello {}", "alice");
            crate::trace!("t");
            crate::debug!("d");
            crate::warn!("w {}", 1);
            crate::error!("e");
        });

        let events = capture.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                ("contract".to_string(), Level::INFO, "hello alice".to_string()),
                ("contract".to_string(), Level::TRACE, "t".to_string()),
                ("contract".to_string(), Level::DEBUG, "d".to_string()),
                ("contract".to_string(), Level::WARN, "w 1".to_string()),
                ("contract".to_string(), Level::ERROR, "e".to_string()),
            ]
        );
    }
}
