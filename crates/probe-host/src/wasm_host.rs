use crate::console::HostState;
use crate::error::{HostError, Result};
use crate::memory::{guest_memory, read_array, read_bytes, read_cstr};
use probe_types::{console, Name};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use wasmtime::{Caller, Config, Engine, Linker, Module, Store};

const MAX_LOG_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostLimits {
    /// Console bytes kept per call; the rest is dropped and flagged.
    pub max_console_bytes: usize,
    /// Epoch ticker period. 0 disables the ticker, and with it the deadline.
    pub epoch_tick_ms: u64,
    /// Ticks a single guest call may run before it is interrupted.
    pub max_epoch_ticks: u64,
}

impl Default for HostLimits {
    fn default() -> Self {
        Self {
            max_console_bytes: 64 * 1024,
            epoch_tick_ms: 10,
            max_epoch_ticks: 500,
        }
    }
}

/// Advances the engine epoch until dropped.
struct EpochTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EpochTicker {
    fn spawn(engine: Engine, period: Duration) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = std::thread::Builder::new()
            .name("probe-epoch".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    std::thread::sleep(period);
                    engine.increment_epoch();
                }
            })
            .map_err(|e| HostError::Wasm(format!("failed to spawn epoch ticker: {}", e)))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for EpochTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub struct WasmHost {
    engine: Engine,
    limits: HostLimits,
    _ticker: Option<EpochTicker>,
}

impl WasmHost {
    pub fn new(limits: HostLimits) -> Result<Self> {
        let mut config = Config::new();
        config.epoch_interruption(true);
        config.cranelift_opt_level(wasmtime::OptLevel::Speed);

        let engine = Engine::new(&config)?;
        let ticker = if limits.epoch_tick_ms > 0 {
            Some(EpochTicker::spawn(
                engine.clone(),
                Duration::from_millis(limits.epoch_tick_ms),
            )?)
        } else {
            None
        };

        tracing::debug!(?limits, "wasm host ready");
        Ok(Self {
            engine,
            limits,
            _ticker: ticker,
        })
    }

    /// Compiles a contract; accepts a binary module or WAT text.
    pub fn load_module(&self, wasm_bytes: &[u8]) -> Result<Module> {
        Module::new(&self.engine, wasm_bytes)
            .map_err(|e| HostError::Instantiate(format!("{:#}", e)))
    }

    /// Fresh store for a new instance, with the epoch deadline armed.
    pub fn create_store(&self) -> Store<HostState> {
        let mut store = Store::new(&self.engine, HostState::new(self.limits.max_console_bytes));
        self.arm_deadline(&mut store);
        store
    }

    /// Resets the deadline to `max_epoch_ticks` from now.
    pub fn arm_deadline(&self, store: &mut Store<HostState>) {
        if self.limits.epoch_tick_ms > 0 {
            store.set_epoch_deadline(self.limits.max_epoch_ticks);
        } else {
            // 没有 ticker 时 epoch 不会前进
            store.set_epoch_deadline(u64::MAX);
        }
    }

    /// Linker with the console and logging imports under `env`.
    pub fn create_linker(&self) -> Result<Linker<HostState>> {
        let mut linker = Linker::new(&self.engine);
        Self::register_print_functions(&mut linker)?;
        Self::register_log_functions(&mut linker)?;
        Ok(linker)
    }

    fn register_print_functions(linker: &mut Linker<HostState>) -> Result<()> {
        linker.func_wrap("env", "prints", |mut caller: Caller<'_, HostState>, ptr: i32| {
            print_from_memory(&mut caller, |data| {
                Ok(String::from_utf8_lossy(read_cstr(data, ptr)?).into_owned())
            })
        })?;
        linker.func_wrap(
            "env",
            "prints_l",
            |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                print_from_memory(&mut caller, |data| {
                    Ok(String::from_utf8_lossy(read_bytes(data, ptr, len)?).into_owned())
                })
            },
        )?;
        linker.func_wrap("env", "printi", |mut caller: Caller<'_, HostState>, value: i64| {
            caller.data_mut().console.push(&value.to_string());
        })?;
        linker.func_wrap("env", "printui", |mut caller: Caller<'_, HostState>, value: i64| {
            caller.data_mut().console.push(&(value as u64).to_string());
        })?;
        linker.func_wrap("env", "printi128", |mut caller: Caller<'_, HostState>, ptr: i32| {
            print_from_memory(&mut caller, |data| {
                Ok(console::i128_from_le(read_array(data, ptr)?).to_string())
            })
        })?;
        linker.func_wrap("env", "printui128", |mut caller: Caller<'_, HostState>, ptr: i32| {
            print_from_memory(&mut caller, |data| {
                Ok(console::u128_from_le(read_array(data, ptr)?).to_string())
            })
        })?;
        linker.func_wrap("env", "printsf", |mut caller: Caller<'_, HostState>, value: f32| {
            caller.data_mut().console.push(&console::format_f32(value));
        })?;
        linker.func_wrap("env", "printdf", |mut caller: Caller<'_, HostState>, value: f64| {
            caller.data_mut().console.push(&console::format_f64(value));
        })?;
        linker.func_wrap("env", "printn", |mut caller: Caller<'_, HostState>, value: i64| {
            caller
                .data_mut()
                .console
                .push(&Name::raw(value as u64).to_string());
        })?;
        linker.func_wrap(
            "env",
            "printhex",
            |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                print_from_memory(&mut caller, |data| {
                    Ok(console::format_hex(read_bytes(data, ptr, len)?))
                })
            },
        )?;
        Ok(())
    }

    /// 注册所有日志级别的导入函数
    fn register_log_functions(linker: &mut Linker<HostState>) -> Result<()> {
        macro_rules! register_log {
            ($name:literal, $level:expr) => {
                linker.func_wrap(
                    "env",
                    $name,
                    move |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                        Self::handle_log(&mut caller, ptr, len, $level);
                    },
                )?;
            };
        }

        register_log!("log_trace", tracing::Level::TRACE);
        register_log!("log_debug", tracing::Level::DEBUG);
        register_log!("log_info", tracing::Level::INFO);
        register_log!("log_warn", tracing::Level::WARN);
        register_log!("log_error", tracing::Level::ERROR);
        Ok(())
    }

    /// 处理来自合约的日志调用；日志失败不会中断合约
    fn handle_log(caller: &mut Caller<'_, HostState>, ptr: i32, len: i32, level: tracing::Level) {
        let memory = match guest_memory(caller) {
            Ok(mem) => mem,
            Err(e) => {
                tracing::error!("Contract log: {}", e);
                return;
            }
        };

        let len = (len.max(0) as usize).min(MAX_LOG_LEN) as i32;
        if len == 0 {
            return;
        }

        let data = memory.data(caller);
        let slice = match read_bytes(data, ptr, len) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Invalid memory range in contract log: {}", e);
                return;
            }
        };

        match std::str::from_utf8(slice) {
            Ok(msg) => match level {
                tracing::Level::TRACE => tracing::trace!(target: "contract", "{}", msg),
                tracing::Level::DEBUG => tracing::debug!(target: "contract", "{}", msg),
                tracing::Level::INFO => tracing::info!(target: "contract", "{}", msg),
                tracing::Level::WARN => tracing::warn!(target: "contract", "{}", msg),
                _ => tracing::error!(target: "contract", "{}", msg),
            },
            Err(e) => {
                tracing::warn!("Invalid UTF-8 in contract log (len={}): {}", len, e);
            }
        }
    }
}

/// Renders text from guest memory and appends it to the console.
///
/// A bad pointer surfaces as a trap in the calling guest.
fn print_from_memory(
    caller: &mut Caller<'_, HostState>,
    render: impl FnOnce(&[u8]) -> Result<String>,
) -> anyhow::Result<()> {
    let memory = guest_memory(caller)?;
    let (data, state) = memory.data_and_store_mut(&mut *caller);
    let text = render(data)?;
    state.console.push(&text);
    Ok(())
}
