//! Compiland, source file and line table shapes.
//!
//! Both store backends return these owned values, so a caller never holds a
//! reference into a store's internal tables.

/// Summary of one compiland (translation unit).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompilandInfo
{
    /// Number of code segments the compiland contributes to
    pub segment_count: u16,
    /// Number of source files with line information
    pub file_count: u16,
    /// Compiland (object module) name
    pub name: Vec<u8>,
}

/// One code segment contribution of a compiland or source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentInfo
{
    /// 1-based section index
    pub segment_index: u16,
    /// Number of line entries, 0 when the segment has no line table
    pub line_count: u16,
    /// First offset covered
    pub start_offset: u32,
    /// Last offset covered (inclusive)
    pub end_offset: u32,
}

/// Summary of one source file of a compiland.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileInfo
{
    /// Number of segment instances with lines from this file
    pub segment_count: u16,
    /// Source file path as recorded by the compiler
    pub name: Vec<u8>,
}

/// One offset/line pair of a line table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfo
{
    pub offset: u32,
    pub line_number: u16,
}

/// The line table of one segment instance of a source file.
///
/// `offsets` and `line_numbers` are parallel and always the same length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSegmentInfo
{
    /// 1-based section index
    pub segment_index: u16,
    /// Position of this instance among the file's segment instances
    pub segment_instance: u16,
    /// First offset covered
    pub start: u32,
    /// Last offset covered (inclusive)
    pub end: u32,
    pub offsets: Vec<u32>,
    pub line_numbers: Vec<u16>,
}

impl FileSegmentInfo
{
    /// Number of line entries.
    pub fn line_count(&self) -> usize
    {
        self.offsets.len()
    }

    /// Iterate the entries as [`LineInfo`] pairs.
    pub fn lines(&self) -> impl Iterator<Item = LineInfo> + '_
    {
        self.offsets.iter().zip(&self.line_numbers).map(|(&offset, &line_number)| LineInfo { offset, line_number })
    }
}

/// Marker stored in [`LineNumber::number_end`] for the last line of a segment.
pub const LAST_LINE_NUMBER_END: u16 = 0x7fff;

/// A resolved source line with the address range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineNumber
{
    /// 1-based compiland index
    pub compiland_index: u16,
    /// 0-based file index within the compiland
    pub file_index: u16,
    /// Segment instance within the file
    pub segment_instance: u16,
    /// Entry index within the segment instance's line table
    pub line_index: u16,
    /// First source line
    pub number: u16,
    /// Last source line covered before the next entry starts
    pub number_end: u16,
    /// 1-based section index
    pub section: u16,
    /// Offset of the first instruction
    pub offset: u32,
    /// Number of code bytes covered
    pub length: u32,
}

impl LineNumber
{
    /// Whether `offset` falls within this line's code range.
    pub const fn contains(&self, offset: u32) -> bool
    {
        offset >= self.offset && offset - self.offset < self.length
    }
}
