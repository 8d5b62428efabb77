//! Module headers and source line tables.
//!
//! A compiland's `sstModule` subsection names the object module and lists the
//! code segments it contributes. Its optional `sstSrcModule` subsection holds
//! a three-level table:
//!
//! ```text
//! source module   cFile, cSeg, file offsets[cFile], (start, end)[cSeg], seg[cSeg]
//!   source file   cSeg, line table offsets[cSeg], (start, end)[cSeg], name
//!     line table  seg, count, offsets[count], line numbers[count]
//! ```
//!
//! All offsets inside the table are relative to the start of the source
//! module subsection.

use super::reader::ByteReader;
use crate::error::{Result, SymbolError};
use crate::types::{FileSegmentInfo, SegmentInfo};

/// One code segment contribution listed in a module header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor
{
    pub segment: u16,
    pub offset: u32,
    pub size: u32,
}

impl SegmentDescriptor
{
    pub const fn contains(&self, segment: u16, offset: u32) -> bool
    {
        self.segment == segment && offset >= self.offset && offset - self.offset < self.size
    }
}

/// The `sstModule` subsection of one compiland.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHeader<'a>
{
    pub segments: Vec<SegmentDescriptor>,
    pub name: &'a [u8],
}

impl<'a> ModuleHeader<'a>
{
    pub fn read(reader: &ByteReader<'a>, offset: usize) -> Result<Self>
    {
        let count = usize::from(reader.u16_at(offset + 4)?);
        let table = offset + 8;
        reader.check(table, count * 12)?;

        let segments = (0..count)
            .map(|z| {
                let at = table + z * 12;
                Ok(SegmentDescriptor {
                    segment: reader.u16_at(at)?,
                    offset: reader.u32_at(at + 4)?,
                    size: reader.u32_at(at + 8)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            segments,
            name: reader.pas_string_at(table + count * 12)?,
        })
    }

    /// Segment ranges as [`SegmentInfo`] with no line counts.
    pub fn segment_info(&self) -> Vec<SegmentInfo>
    {
        self.segments
            .iter()
            .map(|desc| SegmentInfo {
                segment_index: desc.segment,
                line_count: 0,
                start_offset: desc.offset,
                end_offset: desc.offset.wrapping_add(desc.size).wrapping_sub(1),
            })
            .collect()
    }

    pub fn contains(&self, segment: u16, offset: u32) -> bool
    {
        self.segments.iter().any(|desc| desc.contains(segment, offset))
    }
}

/// Whether an address range from a line table covers `offset`. A `(0, 0)`
/// range means the range was not recorded and covers everything.
const fn range_covers(start: u32, end: u32, offset: u32) -> bool
{
    (start == 0 && end == 0) || (start <= offset && offset <= end)
}

/// View over the `sstSrcModule` subsection of one compiland.
#[derive(Debug, Clone, Copy)]
pub struct SourceModule<'a>
{
    reader: ByteReader<'a>,
    base: usize,
    file_count: u16,
    segment_count: u16,
}

impl<'a> SourceModule<'a>
{
    pub fn read(reader: ByteReader<'a>, base: usize) -> Result<Self>
    {
        let file_count = reader.u16_at(base)?;
        let segment_count = reader.u16_at(base + 2)?;
        reader.check(base + 4, 4 * usize::from(file_count) + 10 * usize::from(segment_count))?;

        Ok(Self {
            reader,
            base,
            file_count,
            segment_count,
        })
    }

    pub const fn file_count(&self) -> u16
    {
        self.file_count
    }

    pub const fn segment_count(&self) -> u16
    {
        self.segment_count
    }

    fn ranges_start(&self) -> usize
    {
        self.base + 4 + 4 * usize::from(self.file_count)
    }

    /// Code segments the module's line tables cover.
    pub fn segment_info(&self) -> Result<Vec<SegmentInfo>>
    {
        let ranges = self.ranges_start();
        let segs = ranges + 8 * usize::from(self.segment_count);

        (0..usize::from(self.segment_count))
            .map(|z| {
                Ok(SegmentInfo {
                    segment_index: self.reader.u16_at(segs + 2 * z)?,
                    line_count: 0,
                    start_offset: self.reader.u32_at(ranges + 8 * z)?,
                    end_offset: self.reader.u32_at(ranges + 8 * z + 4)?,
                })
            })
            .collect()
    }

    /// Source file `index` (0-based).
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` for an index past the file count, `Format` if the
    /// file's tables are out of bounds.
    pub fn file(&self, index: u16) -> Result<SourceFile<'a>>
    {
        if index >= self.file_count {
            return Err(SymbolError::InvalidArgument(format!(
                "file index {index} out of range ({} files)",
                self.file_count
            )));
        }
        let offset = self.reader.u32_at(self.base + 4 + 4 * usize::from(index))?;
        SourceFile::read(self.reader, self.base, self.base + offset as usize)
    }

    /// Every file of the module, in order.
    pub fn files(&self) -> impl Iterator<Item = Result<SourceFile<'a>>> + '_
    {
        (0..self.file_count).map(|z| self.file(z))
    }

    /// The file and segment instance whose line table covers an address.
    ///
    /// Module segments that match the address are tried in order, and
    /// within each the files in order; a file whose instances all miss does
    /// not end the search.
    pub fn find_file_segment(&self, segment: u16, offset: u32) -> Result<Option<(u16, FileSegmentInfo)>>
    {
        for info in self.segment_info()? {
            if info.segment_index != segment || !range_covers(info.start_offset, info.end_offset, offset) {
                continue;
            }
            for z in 0..self.file_count {
                if let Some(found) = self.file(z)?.find_segment(segment, offset)? {
                    return Ok(Some((z, found)));
                }
            }
        }

        Ok(None)
    }
}

/// View over one source file entry of a source module.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a>
{
    reader: ByteReader<'a>,
    module_base: usize,
    base: usize,
    segment_count: u16,
}

impl<'a> SourceFile<'a>
{
    fn read(reader: ByteReader<'a>, module_base: usize, base: usize) -> Result<Self>
    {
        let segment_count = reader.u16_at(base)?;
        reader.check(base + 4, 12 * usize::from(segment_count))?;

        Ok(Self {
            reader,
            module_base,
            base,
            segment_count,
        })
    }

    pub const fn segment_count(&self) -> u16
    {
        self.segment_count
    }

    /// File name; the length prefix is one byte.
    pub fn name(&self) -> Result<&'a [u8]>
    {
        self.reader.pas_string_at(self.base + 4 + 12 * usize::from(self.segment_count))
    }

    fn range(&self, instance: u16) -> Result<(u32, u32)>
    {
        let at = self.base + 4 + 4 * usize::from(self.segment_count) + 8 * usize::from(instance);
        Ok((self.reader.u32_at(at)?, self.reader.u32_at(at + 4)?))
    }

    fn line_table(&self, instance: u16) -> Result<usize>
    {
        let offset = self.reader.u32_at(self.base + 4 + 4 * usize::from(instance))?;
        Ok(self.module_base + offset as usize)
    }

    /// Segment index and entry count of an instance's line table.
    fn line_table_header(&self, instance: u16) -> Result<(u16, u16)>
    {
        let table = self.line_table(instance)?;
        Ok((self.reader.u16_at(table)?, self.reader.u16_at(table + 2)?))
    }

    /// Summary of every segment instance.
    pub fn segment_info(&self) -> Result<Vec<SegmentInfo>>
    {
        (0..self.segment_count)
            .map(|z| {
                let (segment_index, line_count) = self.line_table_header(z)?;
                let (start_offset, end_offset) = self.range(z)?;
                Ok(SegmentInfo {
                    segment_index,
                    line_count,
                    start_offset,
                    end_offset,
                })
            })
            .collect()
    }

    /// Full line table of one segment instance.
    pub fn segment(&self, instance: u16) -> Result<FileSegmentInfo>
    {
        if instance >= self.segment_count {
            return Err(SymbolError::InvalidArgument(format!(
                "segment instance {instance} out of range ({} instances)",
                self.segment_count
            )));
        }

        let table = self.line_table(instance)?;
        let (segment_index, count) = self.line_table_header(instance)?;
        let count = usize::from(count);
        let offsets_at = table + 4;
        let numbers_at = offsets_at + 4 * count;
        self.reader.check(offsets_at, 6 * count)?;

        let offsets = (0..count).map(|z| self.reader.u32_at(offsets_at + 4 * z)).collect::<Result<Vec<_>>>()?;
        let line_numbers =
            (0..count).map(|z| self.reader.u16_at(numbers_at + 2 * z)).collect::<Result<Vec<_>>>()?;
        let (start, end) = self.range(instance)?;

        Ok(FileSegmentInfo {
            segment_index,
            segment_instance: instance,
            start,
            end,
            offsets,
            line_numbers,
        })
    }

    /// The instance whose line table covers an address.
    pub fn find_segment(&self, segment: u16, offset: u32) -> Result<Option<FileSegmentInfo>>
    {
        for z in 0..self.segment_count {
            let (segment_index, _) = self.line_table_header(z)?;
            if segment_index != segment {
                continue;
            }
            let (start, end) = self.range(z)?;
            if range_covers(start, end, offset) {
                return self.segment(z).map(Some);
            }
        }

        Ok(None)
    }

    /// The instance whose line numbers span `line`, or failing that the
    /// nearest one.
    ///
    /// An instance ending before the line wins only when strictly closer than
    /// the nearest instance starting after it.
    pub fn find_segment_for_line(&self, line: u16) -> Result<Option<FileSegmentInfo>>
    {
        let mut closest_before: Option<(u16, u32)> = None;
        let mut closest_after: Option<(u16, u32)> = None;

        for z in 0..self.segment_count {
            let seg = self.segment(z)?;
            let (Some(&first), Some(&last)) = (seg.line_numbers.first(), seg.line_numbers.last()) else {
                continue;
            };

            if first <= line && line <= last {
                return Ok(Some(seg));
            }

            if last < line {
                let distance = u32::from(line - last);
                if closest_before.is_none_or(|(_, d)| distance < d) {
                    closest_before = Some((z, distance));
                }
            } else {
                let distance = u32::from(first.saturating_sub(line));
                if closest_after.is_none_or(|(_, d)| distance < d) {
                    closest_after = Some((z, distance));
                }
            }
        }

        let chosen = match (closest_before, closest_after) {
            (Some((before, d_before)), Some((_, d_after))) if d_before < d_after => before,
            (_, Some((after, _))) => after,
            (Some((before, _)), None) => before,
            (None, None) => return Ok(None),
        };

        self.segment(chosen).map(Some)
    }
}
