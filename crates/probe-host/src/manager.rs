use crate::console::HostState;
use crate::error::{HostError, Result};
use crate::memory::write_bytes_to_guest;
use crate::wasm_host::{HostLimits, WasmHost};
use std::collections::HashMap;
use std::sync::RwLock;
use wasmtime::{Func, Instance, Store, TypedFunc, Val, ValType, WasmParams, WasmResults};

/// Heap counters read from the contract around one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapBalance {
    pub blocks_before: i64,
    pub blocks_after: i64,
    pub bytes_before: i64,
    pub bytes_after: i64,
}

impl HeapBalance {
    pub fn is_balanced(&self) -> bool {
        self.blocks_before == self.blocks_after && self.bytes_before == self.bytes_after
    }

    /// Positive for leaks, negative for frees of memory the call did not own.
    pub fn leaked_blocks(&self) -> i64 {
        self.blocks_after - self.blocks_before
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub console: String,
    pub truncated: bool,
    /// `None` when the contract does not export the heap probe.
    pub heap: Option<HeapBalance>,
}

struct ContractInstance {
    store: Store<HostState>,
    instance: Instance,
}

pub struct ContractManager {
    host: WasmHost,
    instances: RwLock<HashMap<String, ContractInstance>>,
}

fn typed_export<P, R>(
    instance: &Instance,
    store: &mut Store<HostState>,
    name: &str,
) -> Result<TypedFunc<P, R>>
where
    P: WasmParams,
    R: WasmResults,
{
    let func = instance
        .get_func(&mut *store, name)
        .ok_or_else(|| HostError::MissingExport(name.to_string()))?;
    func.typed::<P, R>(&*store)
        .map_err(|e| HostError::Wasm(format!("'{}' has the wrong signature: {:#}", name, e)))
}

/// Looks up a `(ptr, len)` entry point; whatever it returns is discarded.
fn entry_export(
    instance: &Instance,
    store: &mut Store<HostState>,
    name: &str,
) -> Result<(Func, usize)> {
    let func = instance
        .get_func(&mut *store, name)
        .ok_or_else(|| HostError::MissingExport(name.to_string()))?;
    let ty = func.ty(&*store);
    let params: Vec<ValType> = ty.params().collect();
    if !matches!(params.as_slice(), [ValType::I32, ValType::I32]) {
        return Err(HostError::Wasm(format!(
            "'{}' takes {:?}, expected [I32, I32]",
            name, params
        )));
    }
    let n_results = ty.results().len();
    Ok((func, n_results))
}

struct HeapProbe {
    blocks: TypedFunc<(), i32>,
    bytes: TypedFunc<(), i32>,
}

impl HeapProbe {
    fn find(instance: &Instance, store: &mut Store<HostState>) -> Option<Self> {
        let blocks = instance
            .get_typed_func::<(), i32>(&mut *store, "heap_live_blocks")
            .ok()?;
        let bytes = instance
            .get_typed_func::<(), i32>(&mut *store, "heap_live_bytes")
            .ok()?;
        Some(Self { blocks, bytes })
    }

    fn read(&self, store: &mut Store<HostState>) -> Result<(i64, i64)> {
        let blocks = self
            .blocks
            .call(&mut *store, ())
            .map_err(|e| HostError::from_call("heap_live_blocks", e))?;
        let bytes = self
            .bytes
            .call(&mut *store, ())
            .map_err(|e| HostError::from_call("heap_live_bytes", e))?;
        Ok((blocks as i64, bytes as i64))
    }
}

impl ContractManager {
    pub fn new(limits: HostLimits) -> Result<Self> {
        Ok(Self {
            host: WasmHost::new(limits)?,
            instances: RwLock::new(HashMap::new()),
        })
    }

    pub fn load_contract(&self, contract_id: &str, wasm_bytes: &[u8]) -> Result<()> {
        let module = self.host.load_module(wasm_bytes)?;
        let linker = self.host.create_linker()?;
        let mut store = self.host.create_store();

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| HostError::Instantiate(format!("{:#}", e)))?;

        let mut instances = self
            .instances
            .write()
            .map_err(|e| HostError::Lock(e.to_string()))?;
        if instances
            .insert(contract_id.to_string(), ContractInstance { store, instance })
            .is_some()
        {
            tracing::info!(contract = contract_id, "contract reloaded");
        } else {
            tracing::info!(contract = contract_id, "contract loaded");
        }
        Ok(())
    }

    /// Returns whether an instance was registered under `contract_id`.
    pub fn unload_contract(&self, contract_id: &str) -> Result<bool> {
        let mut instances = self
            .instances
            .write()
            .map_err(|e| HostError::Lock(e.to_string()))?;
        Ok(instances.remove(contract_id).is_some())
    }

    pub fn contract_ids(&self) -> Result<Vec<String>> {
        let instances = self
            .instances
            .read()
            .map_err(|e| HostError::Lock(e.to_string()))?;
        let mut ids: Vec<String> = instances.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Calls `function(ptr, len)` with `input` copied into guest memory.
    ///
    /// The input buffer is released through `dealloc` whether or not the
    /// call succeeds, and the console is drained either way so output never
    /// leaks into the next call.
    pub fn call_entry(&self, contract_id: &str, function: &str, input: &[u8]) -> Result<CallOutcome> {
        let mut map = self
            .instances
            .write()
            .map_err(|e| HostError::Lock(e.to_string()))?;
        let contract = map
            .get_mut(contract_id)
            .ok_or_else(|| HostError::NotFound(contract_id.to_string()))?;

        let instance = contract.instance;
        let store = &mut contract.store;
        self.host.arm_deadline(store);

        // 1. Get exports
        let alloc_fn = typed_export::<i32, i32>(&instance, store, "alloc")?;
        let dealloc_fn = typed_export::<(i32, i32), ()>(&instance, store, "dealloc")?;
        let (target_fn, result_count) = entry_export(&instance, store, function)?;
        let memory = instance
            .get_memory(&mut *store, "memory")
            .ok_or_else(|| HostError::MissingExport("memory".to_string()))?;
        let probe = HeapProbe::find(&instance, store);

        let before = probe.as_ref().map(|p| p.read(&mut *store)).transpose()?;

        // 2. Write input to guest memory
        let (ptr, len) = write_bytes_to_guest(&mut *store, &memory, &alloc_fn, &dealloc_fn, input)?;

        // 3. Call the entry point
        let mut results = vec![Val::I32(0); result_count];
        let result = target_fn
            .call(&mut *store, &[Val::I32(ptr), Val::I32(len)], &mut results)
            .map_err(|e| HostError::from_call(function, e));

        // 4. 释放输入内存（无论调用成功与否）
        let dealloc_result = dealloc_fn
            .call(&mut *store, (ptr, len))
            .map_err(|e| HostError::from_call("dealloc", e));

        let (console, truncated) = store.data_mut().console.take();

        match (result, dealloc_result) {
            (Ok(()), Ok(())) => {}
            (Ok(()), Err(e)) => {
                tracing::error!(contract = contract_id, "Failed to deallocate input: {}", e);
                return Err(e);
            }
            (Err(e), Ok(())) => {
                tracing::warn!(contract = contract_id, console = %console, "call failed: {}", e);
                return Err(e);
            }
            (Err(e1), Err(e2)) => {
                tracing::error!(
                    contract = contract_id,
                    "call failed: {}; failed to deallocate input: {}",
                    e1,
                    e2
                );
                return Err(e1);
            }
        }

        // 5. Read the probe again
        let heap = match (probe, before) {
            (Some(p), Some((blocks_before, bytes_before))) => {
                let (blocks_after, bytes_after) = p.read(store)?;
                Some(HeapBalance {
                    blocks_before,
                    blocks_after,
                    bytes_before,
                    bytes_after,
                })
            }
            _ => None,
        };

        tracing::debug!(
            contract = contract_id,
            function,
            input_len = len,
            console_len = console.len(),
            "call finished"
        );

        Ok(CallOutcome {
            console,
            truncated,
            heap,
        })
    }

    pub fn call_say_hello(&self, contract_id: &str, name: &str) -> Result<CallOutcome> {
        self.call_entry(contract_id, "say_hello", name.as_bytes())
    }
}
