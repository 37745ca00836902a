//! Host linear-memory access.
//!
//! On the wasm target the read goes through the `__get_memory` import the
//! embedder resolves at load time. Elsewhere a thread-local byte vector
//! stands in for debuggee memory so the primitives stay testable natively.

#[cfg(target_arch = "wasm32")]
extern "C" {
    fn __get_memory(offset: u32, size: u32, result: *mut u8);
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn read_byte(offset: u32) -> u8
{
    let mut byte = 0u8;
    unsafe {
        __get_memory(offset, 1, &mut byte);
    }
    byte
}

#[cfg(not(target_arch = "wasm32"))]
use std::cell::RefCell;

#[cfg(not(target_arch = "wasm32"))]
thread_local! {
    static HOST_MEMORY: RefCell<Vec<u8>> = RefCell::new(Vec::new());
}

/// Install the bytes subsequent reads observe as debuggee memory.
#[cfg(not(target_arch = "wasm32"))]
pub fn set_host_memory(bytes: &[u8])
{
    HOST_MEMORY.with(|memory| {
        let mut memory = memory.borrow_mut();
        memory.clear();
        memory.extend_from_slice(bytes);
    });
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn read_byte(offset: u32) -> u8
{
    HOST_MEMORY.with(|memory| memory.borrow().get(offset as usize).copied().unwrap_or(0))
}
