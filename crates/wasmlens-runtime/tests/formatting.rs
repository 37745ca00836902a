//! End-to-end checks of the formatter primitives against exact JSON output.

use std::ffi::CString;

use wasmlens_runtime::{
    format_begin_array, format_end_array, format_int, format_int64_t, format_int8_t, format_sep, format_string,
    set_host_memory, ENOSPC,
};

/// Output window that advances past each primitive's result, the way the
/// compiled formatter code threads its buffer and capacity.
struct Window
{
    buf: Vec<u8>,
    pos: usize,
}

impl Window
{
    fn new(capacity: usize) -> Self
    {
        Window {
            buf: vec![0; capacity],
            pos: 0,
        }
    }

    fn call(&mut self, primitive: impl FnOnce(*mut u8, u32) -> i32) -> i32
    {
        let remaining = self.buf.len() - self.pos;
        let rc = primitive(unsafe { self.buf.as_mut_ptr().add(self.pos) }, remaining as u32);
        if rc >= 0 {
            self.pos += rc as usize;
        }
        rc
    }

    fn text(&self) -> &str
    {
        std::str::from_utf8(&self.buf[..self.pos]).unwrap()
    }
}

fn format_i64(value: i64, name: &str, capacity: usize) -> (i32, String, Vec<u8>)
{
    let name = CString::new(name).unwrap();
    let mut buf = vec![0xaa_u8; capacity];
    let rc = unsafe { format_int64_t(&value, name.as_ptr().cast(), buf.as_mut_ptr(), capacity as u32) };
    let text = if rc >= 0 {
        String::from_utf8(buf[..rc as usize].to_vec()).unwrap()
    } else {
        String::new()
    };
    (rc, text, buf)
}

#[test]
fn test_int64_exact_json()
{
    let (rc, text, buf) = format_i64(7, "Value", 128);
    assert_eq!(text, "{\"type\":\"long\",\"name\":\"Value\",\"value\":\"7\"}");
    assert_eq!(buf[rc as usize], 0, "terminator follows the content");
}

#[test]
fn test_int64_negative_zero_and_extremes()
{
    let (_, text, _) = format_i64(-10, "N", 128);
    assert!(text.ends_with("\"value\":\"-10\"}"));

    let (_, text, _) = format_i64(0, "N", 128);
    assert!(text.ends_with("\"value\":\"0\"}"));

    let (_, text, _) = format_i64(i64::MIN, "N", 128);
    assert!(text.contains("\"-9223372036854775808\""));

    let (_, text, _) = format_i64(i64::MAX, "N", 128);
    assert!(text.contains("\"9223372036854775807\""));
}

#[test]
fn test_window_too_small_reports_enospc()
{
    let (rc, _, _) = format_i64(7, "Value", 1);
    assert_eq!(rc, -ENOSPC);

    // Large enough to start writing but not to finish.
    let (rc, _, _) = format_i64(7, "Value", 8);
    assert_eq!(rc, -ENOSPC);
}

#[test]
fn test_exactly_full_window_reports_enospc()
{
    let (rc, text, _) = format_i64(7, "V", 256);
    let exact = text.len();
    let (rc_exact, _, _) = format_i64(7, "V", exact);
    assert!(rc > 0);
    assert_eq!(rc_exact, -ENOSPC);
    let (rc_fits, _, _) = format_i64(7, "V", exact + 1);
    assert_eq!(rc_fits as usize, exact);
}

#[test]
fn test_int8_and_int_type_names()
{
    let name = CString::new("c").unwrap();
    let mut buf = vec![0u8; 128];
    let value: i8 = -5;
    let rc = unsafe { format_int8_t(&value, name.as_ptr().cast(), buf.as_mut_ptr(), 128) };
    let text = std::str::from_utf8(&buf[..rc as usize]).unwrap();
    assert_eq!(text, "{\"type\":\"signed char\",\"name\":\"c\",\"value\":\"-5\"}");

    let value: i32 = 42;
    let rc = unsafe { format_int(&value, name.as_ptr().cast(), buf.as_mut_ptr(), 128) };
    let text = std::str::from_utf8(&buf[..rc as usize]).unwrap();
    assert_eq!(text, "{\"type\":\"int\",\"name\":\"c\",\"value\":\"42\"}");
}

#[test]
fn test_string_reads_debuggee_memory()
{
    let mut memory = vec![0u8; 32];
    memory[4..9].copy_from_slice(b"hello");
    set_host_memory(&memory);

    let name = CString::new("Msg").unwrap();
    let mut buf = vec![0u8; 128];
    let address: u32 = 4;
    let rc = unsafe { format_string(&address, name.as_ptr().cast(), buf.as_mut_ptr(), 128) };
    let text = std::str::from_utf8(&buf[..rc as usize]).unwrap();
    assert_eq!(text, "{\"type\":\"const char *\",\"name\":\"Msg\",\"value\":\"hello\"}");
}

#[test]
fn test_empty_string_and_overflowing_string()
{
    set_host_memory(&[0u8; 8]);
    let name = CString::new("s").unwrap();
    let mut buf = vec![0u8; 128];
    let address: u32 = 0;
    let rc = unsafe { format_string(&address, name.as_ptr().cast(), buf.as_mut_ptr(), 128) };
    let text = std::str::from_utf8(&buf[..rc as usize]).unwrap();
    assert_eq!(text, "{\"type\":\"const char *\",\"name\":\"s\",\"value\":\"\"}");

    let mut memory = vec![b'x'; 64];
    memory[63] = 0;
    set_host_memory(&memory);
    let rc = unsafe { format_string(&address, name.as_ptr().cast(), buf.as_mut_ptr(), 48) };
    assert_eq!(rc, -ENOSPC);
}

#[test]
fn test_array_assembly_matches_compound_shape()
{
    let mut window = Window::new(512);
    let name = CString::new("A").unwrap();
    let type_name = CString::new("int [4]").unwrap();

    let rc = window.call(|buf, size| unsafe {
        format_begin_array(name.as_ptr().cast(), type_name.as_ptr().cast(), buf, size)
    });
    assert!(rc > 0);

    for (index, value) in [1_i32, 2, 3, 4].iter().enumerate() {
        if index > 0 {
            assert!(window.call(|buf, size| unsafe { format_sep(buf, size) }) > 0);
        }
        let element = CString::new(format!("[{index}]")).unwrap();
        let rc = window.call(|buf, size| unsafe { format_int(value, element.as_ptr().cast(), buf, size) });
        assert!(rc > 0);
    }
    assert!(window.call(|buf, size| unsafe { format_end_array(buf, size) }) > 0);

    assert_eq!(
        window.text(),
        "{\"type\":\"int [4]\",\"name\":\"A\",\"value\":[\
         {\"type\":\"int\",\"name\":\"[0]\",\"value\":\"1\"},\
         {\"type\":\"int\",\"name\":\"[1]\",\"value\":\"2\"},\
         {\"type\":\"int\",\"name\":\"[2]\",\"value\":\"3\"},\
         {\"type\":\"int\",\"name\":\"[3]\",\"value\":\"4\"}]}"
    );
}

#[test]
fn test_capacity_propagation_aborts_on_first_failure()
{
    let mut window = Window::new(20);
    let name = CString::new("A").unwrap();
    let type_name = CString::new("int [4]").unwrap();

    let rc = window.call(|buf, size| unsafe {
        format_begin_array(name.as_ptr().cast(), type_name.as_ptr().cast(), buf, size)
    });
    assert_eq!(rc, -ENOSPC);
}
