//! Bounded output window shared by all formatter primitives.

/// Error code returned when the output window is too small.
pub const ENOSPC: i32 = 28;

/// Write cursor over a caller-supplied byte window.
///
/// Writes past the end of the window are dropped rather than trapping, and
/// an exhausted window makes the whole emission invalid: a result that
/// exactly fills the window leaves no room for the terminator and reports
/// `-ENOSPC` like any other overflow.
pub struct Cursor<'a>
{
    buf: &'a mut [u8],
    pos: usize,
    overflowed: bool,
}

impl<'a> Cursor<'a>
{
    pub fn new(buf: &'a mut [u8]) -> Self
    {
        Cursor {
            buf,
            pos: 0,
            overflowed: false,
        }
    }

    /// Append one byte, silently dropping it if the window is full.
    pub fn put(&mut self, byte: u8)
    {
        if self.pos < self.buf.len() {
            self.buf[self.pos] = byte;
            self.pos += 1;
        }
    }

    pub fn write_str(&mut self, text: &str)
    {
        for byte in text.bytes() {
            self.put(byte);
        }
    }

    pub fn has_room(&self) -> bool
    {
        self.pos < self.buf.len()
    }

    /// Mark the emission as overflowed regardless of remaining room.
    pub fn mark_overflow(&mut self)
    {
        self.overflowed = true;
    }

    /// Append the decimal rendering of `value`.
    ///
    /// Digits are produced least-significant first and the written span is
    /// reversed in place afterwards, sign included. Remainders are taken
    /// before negation so `i64::MIN` renders without overflow.
    pub fn emit_int(&mut self, value: i64)
    {
        if value == 0 {
            self.put(b'0');
            return;
        }

        let start = self.pos;
        let mut remaining = value;
        while remaining != 0 {
            if !self.has_room() {
                self.mark_overflow();
                return;
            }
            let digit = (remaining % 10).unsigned_abs() as u8;
            self.put(b'0' + digit);
            remaining /= 10;
        }
        if value < 0 {
            if !self.has_room() {
                self.mark_overflow();
                return;
            }
            self.put(b'-');
        }
        self.buf[start..self.pos].reverse();
    }

    /// Final byte count, or `-ENOSPC` if the window overflowed or was
    /// exhausted.
    pub fn error_or_len(&self) -> i32
    {
        if self.overflowed || self.pos >= self.buf.len() {
            -ENOSPC
        } else {
            self.pos as i32
        }
    }

    /// Write the NUL terminator after the content without counting it.
    pub fn terminate(&mut self)
    {
        if self.pos < self.buf.len() {
            self.buf[self.pos] = 0;
        }
    }
}
