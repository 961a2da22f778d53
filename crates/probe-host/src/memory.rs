use crate::error::{HostError, Result};
use wasmtime::{AsContextMut, Caller, Extern, Memory, TypedFunc};

/// Looks up the guest's exported linear memory from inside a host import.
pub fn guest_memory<T>(caller: &mut Caller<'_, T>) -> Result<Memory> {
    match caller.get_export("memory") {
        Some(Extern::Memory(mem)) => Ok(mem),
        _ => Err(HostError::MissingExport("memory".to_string())),
    }
}

/// Bounds-checked view of `len` bytes at `ptr`.
///
/// Ptr and Len come straight from the guest as `i32`; they are reinterpreted
/// as unsigned wasm32 addresses.
pub fn read_bytes(data: &[u8], ptr: i32, len: i32) -> Result<&[u8]> {
    let start = ptr as u32 as usize;
    let len = len as u32 as usize;
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| {
            HostError::Memory(format!(
                "Pointer/Length out of bounds: ptr={}, len={}, memory_size={}",
                start,
                len,
                data.len()
            ))
        })
}

/// Reads a NUL-terminated string starting at `ptr`.
pub fn read_cstr(data: &[u8], ptr: i32) -> Result<&[u8]> {
    let start = ptr as u32 as usize;
    let tail = data.get(start..).ok_or_else(|| {
        HostError::Memory(format!(
            "Pointer out of bounds: ptr={}, memory_size={}",
            start,
            data.len()
        ))
    })?;
    match tail.iter().position(|&b| b == 0) {
        Some(end) => Ok(&tail[..end]),
        None => Err(HostError::Memory(format!(
            "Unterminated string at ptr={}",
            start
        ))),
    }
}

pub fn read_array<const N: usize>(data: &[u8], ptr: i32) -> Result<[u8; N]> {
    let bytes = read_bytes(data, ptr, N as i32)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Write a byte slice into guest memory through the guest's `alloc`.
///
/// Returns `(ptr, len)` of the written data; the caller owns the allocation.
/// If the write itself fails the allocation is handed back via `dealloc`.
pub fn write_bytes_to_guest(
    mut store: impl AsContextMut,
    memory: &Memory,
    alloc_fn: &TypedFunc<i32, i32>,
    dealloc_fn: &TypedFunc<(i32, i32), ()>,
    bytes: &[u8],
) -> Result<(i32, i32)> {
    let len = i32::try_from(bytes.len())
        .map_err(|_| HostError::Memory(format!("input too large: {} bytes", bytes.len())))?;
    let ptr = alloc_fn
        .call(&mut store, len)
        .map_err(|e| HostError::from_call("alloc", e))?;

    // 确保即使写入失败也能释放内存
    if let Err(e) = memory.write(&mut store, ptr as u32 as usize, bytes) {
        if let Err(dealloc_err) = dealloc_fn.call(&mut store, (ptr, len)) {
            tracing::error!("Failed to deallocate guest memory: {:#}", dealloc_err);
        }
        return Err(HostError::Memory(format!(
            "write of {} bytes at {} failed: {}",
            len, ptr, e
        )));
    }

    Ok((ptr, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bytes_bounds() {
        let data = b"hello world";
        assert_eq!(read_bytes(data, 6, 5).unwrap(), b"world");
        assert_eq!(read_bytes(data, 11, 0).unwrap(), b"");
        assert!(read_bytes(data, 7, 5).is_err());
        assert!(read_bytes(data, 12, 0).is_err());
        // 负数按 u32 解释，越界
        assert!(read_bytes(data, -1, 1).is_err());
    }

    #[test]
    fn test_read_cstr() {
        let data = b"abc\0def";
        assert_eq!(read_cstr(data, 0).unwrap(), b"abc");
        assert_eq!(read_cstr(data, 3).unwrap(), b"");
        assert!(read_cstr(data, 4).is_err());
        assert!(read_cstr(data, 100).is_err());
    }

    #[test]
    fn test_read_array() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(&42u128.to_le_bytes());
        let raw: [u8; 16] = read_array(&data, 4).unwrap();
        assert_eq!(u128::from_le_bytes(raw), 42);
        assert!(read_array::<16>(&data, 5).is_err());
    }
}
