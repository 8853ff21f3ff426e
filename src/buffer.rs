//! Scratch byte buffers for line formatting, recycled through a pool.

use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};

const INITIAL_CAPACITY: usize = 1024;
/// Buffers that grew past this are dropped instead of pooled
const MAX_POOLED_CAPACITY: usize = 16 << 10;
const MAX_IDLE: usize = 64;

/// Growable byte buffer with the few append operations a formatter needs.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    pub fn push_byte(&mut self, b: u8) {
        self.bytes.push(b);
    }

    pub fn push_bytes(&mut self, b: &[u8]) {
        self.bytes.extend_from_slice(b);
    }

    /// Append the decimal digits of `n`.
    pub fn push_uint(&mut self, mut n: u64) {
        let mut digits = [0u8; 20];
        let mut pos = digits.len();
        loop {
            pos -= 1;
            digits[pos] = b'0' + (n % 10) as u8;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        self.bytes.extend_from_slice(&digits[pos..]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Pool of idle buffers shared by concurrent formatting calls.
///
/// Each call borrows its own buffer; nothing is shared while in use.
#[derive(Debug, Default)]
pub struct BufferPool {
    idle: Mutex<Vec<Buffer>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| Buffer::with_capacity(INITIAL_CAPACITY));
        PooledBuffer { buf, pool: self }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buf: Buffer) {
        if buf.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        buf.clear();
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE {
            idle.push(buf);
        }
    }
}

/// A buffer on loan from a [`BufferPool`]; returned cleared on drop,
/// including during unwinding.
pub struct PooledBuffer<'a> {
    buf: Buffer,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Buffer {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
