//! Bounds-checked sequential byte cursors shared by the snapshot and save codecs.
//!
//! All multi-byte fields are little-endian. Every access checks the remaining
//! length first, so a malformed or truncated blob surfaces as a [`CursorError`]
//! instead of a panic.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("write of {len} bytes at offset {offset} overruns {capacity}-byte buffer")]
    WriteOverrun {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("read of {len} bytes at offset {offset} overruns {available}-byte buffer")]
    ReadOverrun {
        offset: usize,
        len: usize,
        available: usize,
    },

    #[error("seek to offset {offset} outside {len}-byte buffer")]
    SeekOutOfBounds { offset: usize, len: usize },
}

/// Sequential writer over a caller-owned buffer.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), CursorError> {
        let end = self
            .pos
            .checked_add(bytes.len())
            .filter(|&end| end <= self.buf.len())
            .ok_or(CursorError::WriteOverrun {
                offset: self.pos,
                len: bytes.len(),
                capacity: self.buf.len(),
            })?;
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn put_u8(&mut self, v: u8) -> Result<(), CursorError> {
        self.put_bytes(&[v])
    }

    pub fn put_u16(&mut self, v: u16) -> Result<(), CursorError> {
        self.put_bytes(&v.to_le_bytes())
    }

    pub fn put_u32(&mut self, v: u32) -> Result<(), CursorError> {
        self.put_bytes(&v.to_le_bytes())
    }

    pub fn put_u64(&mut self, v: u64) -> Result<(), CursorError> {
        self.put_bytes(&v.to_le_bytes())
    }

    pub fn put_i32(&mut self, v: i32) -> Result<(), CursorError> {
        self.put_bytes(&v.to_le_bytes())
    }

    pub fn put_f32(&mut self, v: f32) -> Result<(), CursorError> {
        self.put_bytes(&v.to_le_bytes())
    }

    pub fn put_f32s(&mut self, vs: &[f32]) -> Result<(), CursorError> {
        for &v in vs {
            self.put_f32(v)?;
        }
        Ok(())
    }

    pub fn put_zeros(&mut self, n: usize) -> Result<(), CursorError> {
        for _ in 0..n {
            self.put_u8(0)?;
        }
        Ok(())
    }

    /// Overwrite a u32 at an absolute offset already written.
    pub fn patch_u32(&mut self, offset: usize, v: u32) -> Result<(), CursorError> {
        let end = offset
            .checked_add(4)
            .filter(|&end| end <= self.pos)
            .ok_or(CursorError::WriteOverrun {
                offset,
                len: 4,
                capacity: self.pos,
            })?;
        self.buf[offset..end].copy_from_slice(&v.to_le_bytes());
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

/// Sequential reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn seek(&mut self, offset: usize) -> Result<(), CursorError> {
        if offset > self.buf.len() {
            return Err(CursorError::SeekOutOfBounds {
                offset,
                len: self.buf.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(CursorError::ReadOverrun {
                offset: self.pos,
                len,
                available: self.buf.len(),
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), CursorError> {
        self.bytes(len).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, CursorError> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, CursorError> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    pub fn u64(&mut self) -> Result<u64, CursorError> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    pub fn i32(&mut self) -> Result<i32, CursorError> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    pub fn f32(&mut self) -> Result<f32, CursorError> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    pub fn f32_array<const N: usize>(&mut self) -> Result<[f32; N], CursorError> {
        let mut out = [0.0f32; N];
        for v in out.iter_mut() {
            *v = self.f32()?;
        }
        Ok(out)
    }
}
