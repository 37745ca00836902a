//! # wasmlens-runtime
//!
//! The runtime support library compiled formatter modules link against.
//!
//! Every primitive renders one JSON value of the shape
//! `{"type":"T","name":"N","value":"V"}` into a caller-supplied window and
//! returns the number of bytes written, or `-ENOSPC` when the window is too
//! small. The terminating NUL is written after the content but never
//! counted. Compound values are assembled from `format_begin_array`,
//! `format_sep`, and `format_end_array` around recursively formatted
//! elements.
//!
//! ## Safety
//!
//! The exported routines use the C calling convention of the generated
//! formatter code: `name` and `type` are NUL-terminated strings, `value`
//! points at a staged raw value of the advertised width, and `buffer` is
//! writable for `size` bytes. The compiled caller upholds all of this; the
//! routines never write past `size`.

#![allow(unsafe_code)] // FFI surface of the wasm support object

pub mod cursor;
pub mod host;

pub use cursor::{Cursor, ENOSPC};
#[cfg(not(target_arch = "wasm32"))]
pub use host::set_host_memory;

/// Value formatters refuse windows that cannot hold even a one-byte result
/// plus its terminator.
const MIN_WINDOW: u32 = 2;

unsafe fn write_name(cursor: &mut Cursor<'_>, mut name: *const u8)
{
    if name.is_null() {
        return;
    }
    loop {
        let byte = *name;
        if byte == 0 {
            break;
        }
        cursor.put(byte);
        name = name.add(1);
    }
}

unsafe fn format_scalar(type_name: &str, value: i64, name: *const u8, buffer: *mut u8, size: u32) -> i32
{
    if size < MIN_WINDOW {
        return -ENOSPC;
    }
    let window = core::slice::from_raw_parts_mut(buffer, size as usize);
    let mut cursor = Cursor::new(window);
    cursor.write_str("{\"type\":\"");
    cursor.write_str(type_name);
    cursor.write_str("\",\"name\":\"");
    write_name(&mut cursor, name);
    cursor.write_str("\",\"value\":\"");
    cursor.emit_int(value);
    cursor.write_str("\"}");
    cursor.terminate();
    cursor.error_or_len()
}

#[no_mangle]
pub unsafe extern "C" fn format_int64_t(value: *const i64, name: *const u8, buffer: *mut u8, size: u32) -> i32
{
    format_scalar("long", *value, name, buffer, size)
}

#[no_mangle]
pub unsafe extern "C" fn format_int32_t(value: *const i32, name: *const u8, buffer: *mut u8, size: u32) -> i32
{
    format_scalar("int", i64::from(*value), name, buffer, size)
}

#[no_mangle]
pub unsafe extern "C" fn format_int(value: *const i32, name: *const u8, buffer: *mut u8, size: u32) -> i32
{
    format_scalar("int", i64::from(*value), name, buffer, size)
}

#[no_mangle]
pub unsafe extern "C" fn format_int8_t(value: *const i8, name: *const u8, buffer: *mut u8, size: u32) -> i32
{
    format_scalar("signed char", i64::from(*value), name, buffer, size)
}

/// Format a C string by its address in debuggee memory.
///
/// The pointee bytes are fetched one at a time through the host memory read
/// until the NUL terminator, or until the window runs out, which reports
/// `-ENOSPC` like any other overflow.
#[no_mangle]
pub unsafe extern "C" fn format_string(value: *const u32, name: *const u8, buffer: *mut u8, size: u32) -> i32
{
    if size < MIN_WINDOW {
        return -ENOSPC;
    }
    let window = core::slice::from_raw_parts_mut(buffer, size as usize);
    let mut cursor = Cursor::new(window);
    cursor.write_str("{\"type\":\"const char *\",\"name\":\"");
    write_name(&mut cursor, name);
    cursor.write_str("\",\"value\":\"");
    let mut address = *value;
    while cursor.has_room() {
        let byte = host::read_byte(address);
        if byte == 0 {
            break;
        }
        cursor.put(byte);
        address = address.wrapping_add(1);
    }
    cursor.write_str("\"}");
    cursor.terminate();
    cursor.error_or_len()
}

/// Open a compound value: `{"type":"T","name":"N","value":[`.
#[no_mangle]
pub unsafe extern "C" fn format_begin_array(name: *const u8, type_name: *const u8, buffer: *mut u8, size: u32) -> i32
{
    let window = core::slice::from_raw_parts_mut(buffer, size as usize);
    let mut cursor = Cursor::new(window);
    cursor.write_str("{\"type\":\"");
    write_name(&mut cursor, type_name);
    cursor.write_str("\",\"name\":\"");
    write_name(&mut cursor, name);
    cursor.write_str("\",\"value\":[");
    cursor.terminate();
    cursor.error_or_len()
}

#[no_mangle]
pub unsafe extern "C" fn format_sep(buffer: *mut u8, size: u32) -> i32
{
    let window = core::slice::from_raw_parts_mut(buffer, size as usize);
    let mut cursor = Cursor::new(window);
    cursor.put(b',');
    cursor.terminate();
    cursor.error_or_len()
}

#[no_mangle]
pub unsafe extern "C" fn format_end_array(buffer: *mut u8, size: u32) -> i32
{
    let window = core::slice::from_raw_parts_mut(buffer, size as usize);
    let mut cursor = Cursor::new(window);
    cursor.write_str("]}");
    cursor.terminate();
    cursor.error_or_len()
}
