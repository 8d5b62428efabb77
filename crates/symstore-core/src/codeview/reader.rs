//! Bounds-checked little-endian reads over the debug-info buffer.
//!
//! The CodeView directory, symbol and type records come from a compiler (or a
//! malformed binary), so every access goes through [`ByteReader`]. A read that
//! would leave the buffer is a `Format` error, never a panic.

use scroll::{Pread, LE};

use crate::error::{Result, SymbolError};

/// Cursor-free reader over a borrowed byte slice.
///
/// Offsets are absolute positions in the slice. The reader is `Copy` so it can
/// be handed to record decoders by value.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a>
{
    data: &'a [u8],
}

impl<'a> ByteReader<'a>
{
    pub const fn new(data: &'a [u8]) -> Self
    {
        Self { data }
    }

    pub const fn len(&self) -> usize
    {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool
    {
        self.data.is_empty()
    }

    pub const fn as_slice(&self) -> &'a [u8]
    {
        self.data
    }

    /// Whether `len` bytes starting at `offset` lie inside the buffer.
    pub fn in_bounds(&self, offset: usize, len: usize) -> bool
    {
        offset.checked_add(len).is_some_and(|end| end <= self.data.len())
    }

    /// Fail unless `len` bytes starting at `offset` lie inside the buffer.
    pub fn check(&self, offset: usize, len: usize) -> Result<()>
    {
        if self.in_bounds(offset, len) {
            Ok(())
        } else {
            Err(SymbolError::Format(format!(
                "range {offset:#x}+{len:#x} is outside a buffer of {:#x} bytes",
                self.data.len()
            )))
        }
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8>
    {
        Ok(self.data.pread_with::<u8>(offset, LE)?)
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16>
    {
        Ok(self.data.pread_with::<u16>(offset, LE)?)
    }

    pub fn i16_at(&self, offset: usize) -> Result<i16>
    {
        Ok(self.data.pread_with::<i16>(offset, LE)?)
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32>
    {
        Ok(self.data.pread_with::<u32>(offset, LE)?)
    }

    pub fn i32_at(&self, offset: usize) -> Result<i32>
    {
        Ok(self.data.pread_with::<i32>(offset, LE)?)
    }

    pub fn u64_at(&self, offset: usize) -> Result<u64>
    {
        Ok(self.data.pread_with::<u64>(offset, LE)?)
    }

    pub fn f32_at(&self, offset: usize) -> Result<f32>
    {
        Ok(self.data.pread_with::<f32>(offset, LE)?)
    }

    pub fn f64_at(&self, offset: usize) -> Result<f64>
    {
        Ok(self.data.pread_with::<f64>(offset, LE)?)
    }

    /// `len` bytes starting at `offset`.
    pub fn slice_at(&self, offset: usize, len: usize) -> Result<&'a [u8]>
    {
        self.check(offset, len)?;
        Ok(&self.data[offset..offset + len])
    }

    /// Fixed-size byte array starting at `offset`.
    pub fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]>
    {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice_at(offset, N)?);
        Ok(out)
    }

    /// Length-prefixed string: one length byte followed by that many bytes.
    pub fn pas_string_at(&self, offset: usize) -> Result<&'a [u8]>
    {
        let len = self.u8_at(offset)?;
        self.slice_at(offset + 1, usize::from(len))
    }
}
