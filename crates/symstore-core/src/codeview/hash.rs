//! Hashed symbol tables (`OMFSymHash`).
//!
//! Each global, static and public symbol heap is followed by two tables with
//! the same layout: a name hash table and an address table. A table starts
//! with a bucket count, then per-bucket offsets and entry counts, then the
//! buckets themselves as `(symbol offset, value)` pairs. For the name table
//! the value is the name hash; for the address table it is the symbol's
//! offset within its segment, and buckets are indexed by segment.

use super::constants::{INVALID_BUCKET_COUNT, SYM_HASH_HEADER_LEN};
use super::reader::ByteReader;
use crate::error::{Result, SymbolError};

/// Case-insensitive hash of a symbol name.
///
/// Trailing bytes that do not fill a 32-bit word are folded into a separate
/// accumulator, last byte first; full words are XOR-ed in with a 4-bit
/// rotation after each one.
pub fn name_hash(name: &[u8]) -> u32
{
    const fn to_upper(b: u8) -> u32
    {
        (b & 0xdf) as u32
    }

    let mut len = name.len();
    let mut end: u32 = 0;

    while len & 3 != 0 {
        end |= to_upper(name[len - 1]);
        end <<= 8;
        len -= 1;
    }

    let mut sum: u32 = 0;
    for word in name[..len].chunks_exact(4) {
        let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        sum ^= word & 0xdfdf_dfdf;
        sum = sum.rotate_left(4);
    }

    sum ^ end
}

/// Header of a hashed symbol heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymHashHeader
{
    /// Hash function of the name table
    pub sym_hash: u16,
    /// Hash function of the address table
    pub addr_hash: u16,
    /// Byte size of the symbol records
    pub cb_symbol: u32,
    /// Byte size of the name hash table
    pub cb_hsym: u32,
    /// Byte size of the address table
    pub cb_haddr: u32,
}

impl SymHashHeader
{
    pub fn read(reader: &ByteReader<'_>, offset: usize) -> Result<Self>
    {
        Ok(Self {
            sym_hash: reader.u16_at(offset)?,
            addr_hash: reader.u16_at(offset + 2)?,
            cb_symbol: reader.u32_at(offset + 4)?,
            cb_hsym: reader.u32_at(offset + 8)?,
            cb_haddr: reader.u32_at(offset + 12)?,
        })
    }
}

/// Location of one hashed symbol heap in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolHeap
{
    /// Offset of the `OMFSymHash` header (the subsection start)
    pub subsection: usize,
    /// Byte size of the subsection
    pub size: usize,
    pub header: SymHashHeader,
}

impl SymbolHeap
{
    /// Read and validate a heap header at the start of a subsection.
    pub fn read(reader: &ByteReader<'_>, subsection: usize, size: usize) -> Result<Self>
    {
        if size < SYM_HASH_HEADER_LEN {
            return Err(SymbolError::Format(format!("symbol heap at {subsection:#x} is too small")));
        }
        let header = SymHashHeader::read(reader, subsection)?;
        let heap = Self { subsection, size, header };
        reader.check(heap.symbols_start(), header.cb_symbol as usize)?;
        Ok(heap)
    }

    /// Base offset symbol offsets in the tables are relative to.
    pub const fn symbols_start(&self) -> usize
    {
        self.subsection + SYM_HASH_HEADER_LEN
    }

    pub const fn symbols_end(&self) -> usize
    {
        self.symbols_start() + self.header.cb_symbol as usize
    }

    pub const fn name_table_start(&self) -> usize
    {
        self.symbols_end()
    }

    pub const fn addr_table_start(&self) -> usize
    {
        self.symbols_end() + self.header.cb_hsym as usize
    }
}

/// One `(symbol offset, value)` entry of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashPair
{
    /// Record offset relative to [`SymbolHeap::symbols_start`]
    pub symbol_offset: u32,
    /// Name hash, or address offset in an address table
    pub value: u32,
}

/// One bucket of a table: where its pairs start and how many there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket
{
    pub start: usize,
    pub count: u32,
}

/// A name hash table or address table.
#[derive(Debug, Clone, Copy)]
pub struct HashTable<'a>
{
    reader: ByteReader<'a>,
    start: usize,
    groups: u16,
}

impl<'a> HashTable<'a>
{
    /// Open the table at `start`, checking that its offset and count arrays
    /// are inside the buffer.
    pub fn new(reader: ByteReader<'a>, start: usize) -> Result<Self>
    {
        let groups = reader.u16_at(start)?;
        reader.check(start + 4, 8 * usize::from(groups))?;
        Ok(Self { reader, start, groups })
    }

    pub const fn group_count(&self) -> u16
    {
        self.groups
    }

    /// Bucket `index`, or `None` if it is out of range or marked invalid.
    pub fn bucket(&self, index: u32) -> Result<Option<Bucket>>
    {
        if index >= u32::from(self.groups) {
            return Ok(None);
        }
        let n = usize::from(self.groups);
        let z = index as usize;
        let offset = self.reader.u32_at(self.start + 4 + 4 * z)?;
        let count = self.reader.u32_at(self.start + 4 + 4 * n + 4 * z)?;

        if count == INVALID_BUCKET_COUNT {
            return Ok(None);
        }

        Ok(Some(Bucket {
            start: self.start + 4 + 8 * n + offset as usize,
            count,
        }))
    }

    /// Bucket holding names with this hash.
    pub fn bucket_for_hash(&self, hash: u32) -> Result<Option<Bucket>>
    {
        if self.groups == 0 {
            return Ok(None);
        }
        self.bucket(hash % u32::from(self.groups))
    }

    /// Bucket holding symbols of a 1-based segment.
    pub fn bucket_for_segment(&self, segment: u16) -> Result<Option<Bucket>>
    {
        match segment.checked_sub(1) {
            Some(z) => self.bucket(u32::from(z)),
            None => Ok(None),
        }
    }

    /// Entry `i` of a bucket.
    pub fn pair(&self, bucket: Bucket, i: u32) -> Result<HashPair>
    {
        let at = bucket.start + 8 * i as usize;
        Ok(HashPair {
            symbol_offset: self.reader.u32_at(at)?,
            value: self.reader.u32_at(at + 4)?,
        })
    }

    /// Entry of an address bucket with the largest offset not above `offset`.
    pub fn closest_preceding(&self, bucket: Bucket, offset: u32) -> Result<Option<HashPair>>
    {
        let mut best: Option<HashPair> = None;

        for i in 0..bucket.count {
            let pair = self.pair(bucket, i)?;
            if pair.value > offset {
                continue;
            }
            if pair.value == offset {
                return Ok(Some(pair));
            }
            if best.is_none_or(|b| pair.value > b.value) {
                best = Some(pair);
            }
        }

        Ok(best)
    }
}
