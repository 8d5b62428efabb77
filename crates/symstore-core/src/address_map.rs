//! # Address Map
//!
//! Translation between section-relative `(section, offset)` pairs and the flat
//! RVA space of an image.
//!
//! The map is a plain table of `(rva, size, name)` triples, one per section,
//! built once when an image is loaded and never mutated afterwards. Section
//! indices handed out by the map are 1-based; index 0 means "no section".
//!
//! ## Lookup policy
//!
//! [`AddressMap::map_rva_to_sec_offset`] picks the section with the largest
//! start RVA that does not exceed the query. It is a best-fit-below policy,
//! not a containment check: an RVA in the gap between two sections, or past
//! the end of the last one, still resolves to the preceding section.
//!
//! ## Example
//!
//! ```rust
//! use symstore_core::address_map::{AddressMap, SectionHeader};
//!
//! let map = AddressMap::load_from_sections(&[
//!     SectionHeader::new(b".text", 0x1000, 0x800, 0x1000),
//!     SectionHeader::new(b".data", 0x3000, 0x200, 0x200),
//! ])?;
//!
//! assert_eq!(map.map_sec_offset_to_rva(1, 0x10), Some(0x1010));
//! assert_eq!(map.map_rva_to_sec_offset(0x3004), Some((2, 4)));
//! assert_eq!(map.find_section(b".data"), 2);
//! # Ok::<(), symstore_core::SymbolError>(())
//! ```

use object::pe::ImageSectionHeader;
use object::read::pe::{ImageNtHeaders, PeFile};
use object::read::ReadRef;
use object::LittleEndian as LE;

use crate::error::{Result, SymbolError};
use crate::pdb::PdbSegment;
use crate::types::SegmentOffset;

/// Sentinel RVA for "no such section".
///
/// Rust callers get `None` from [`AddressMap::map_sec_offset_to_rva`] instead;
/// the constant is exposed for consumers that store raw RVAs.
pub const INVALID_RVA: u32 = u32::MAX;

/// Width of a section name in a PE section header.
pub const SECTION_NAME_LEN: usize = 8;

/// Section count that is reserved as invalid.
const INVALID_SECTION_COUNT: usize = u16::MAX as usize;

/// The parts of a section header the address map needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader
{
    pub name: [u8; SECTION_NAME_LEN],
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub size_of_raw_data: u32,
}

impl SectionHeader
{
    /// Build a header from a short name, padding it with NULs to 8 bytes.
    ///
    /// Names longer than 8 bytes are truncated, as the PE format does.
    pub fn new(name: &[u8], virtual_address: u32, virtual_size: u32, size_of_raw_data: u32) -> Self
    {
        Self {
            name: pad_name(name),
            virtual_address,
            virtual_size,
            size_of_raw_data,
        }
    }

    /// Mapped size: the virtual size, or the raw size when the virtual size is 0.
    pub const fn mapped_size(&self) -> u32
    {
        if self.virtual_size > 0 {
            self.virtual_size
        } else {
            self.size_of_raw_data
        }
    }
}

impl From<&ImageSectionHeader> for SectionHeader
{
    fn from(header: &ImageSectionHeader) -> Self
    {
        Self {
            name: header.name,
            virtual_address: header.virtual_address.get(LE),
            virtual_size: header.virtual_size.get(LE),
            size_of_raw_data: header.size_of_raw_data.get(LE),
        }
    }
}

/// One mapped section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section
{
    pub rva: u32,
    pub size: u32,
    pub name: [u8; SECTION_NAME_LEN],
}

impl Section
{
    /// Section name with trailing padding removed.
    pub fn trimmed_name(&self) -> &[u8]
    {
        let end = self.name.iter().rposition(|&b| b != 0 && b != b' ').map_or(0, |i| i + 1);
        &self.name[..end]
    }
}

/// Immutable section table of one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressMap
{
    sections: Vec<Section>,
}

impl AddressMap
{
    /// Build the map from section headers.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidArgument` if the header count equals the reserved
    /// sentinel (`0xFFFF`) or does not fit a 16-bit section index, and
    /// `OutOfMemory` if the table cannot be allocated.
    pub fn load_from_sections(headers: &[SectionHeader]) -> Result<Self>
    {
        if headers.len() >= INVALID_SECTION_COUNT {
            return Err(SymbolError::InvalidArgument(format!("invalid section count {}", headers.len())));
        }

        let mut sections = Vec::new();
        sections
            .try_reserve_exact(headers.len())
            .map_err(|err| SymbolError::OutOfMemory(format!("section table: {err}")))?;
        sections.extend(headers.iter().map(|header| Section {
            rva: header.virtual_address,
            size: header.mapped_size(),
            name: header.name,
        }));

        Ok(Self { sections })
    }

    /// Build the map from a PE section table.
    ///
    /// ## Errors
    ///
    /// Same as [`AddressMap::load_from_sections`].
    pub fn load_from_pe_sections<'a, I>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ImageSectionHeader>,
    {
        let headers: Vec<SectionHeader> = headers.into_iter().map(SectionHeader::from).collect();
        Self::load_from_sections(&headers)
    }

    /// Build the map from a parsed PE image.
    ///
    /// ## Errors
    ///
    /// Same as [`AddressMap::load_from_sections`].
    pub fn from_pe<'data, Pe, R>(file: &PeFile<'data, Pe, R>) -> Result<Self>
    where
        Pe: ImageNtHeaders,
        R: ReadRef<'data>,
    {
        Self::load_from_pe_sections(file.section_table().iter())
    }

    /// Build the map from the segment enumeration of a PDB session.
    ///
    /// Segments are placed by their reported 1-based index; gaps in the
    /// numbering become empty sections so indices stay stable.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidArgument` for a segment numbered 0, otherwise the same
    /// as [`AddressMap::load_from_sections`].
    pub fn from_pdb_segments(segments: &[PdbSegment]) -> Result<Self>
    {
        let count = segments.iter().map(|segment| usize::from(segment.index)).max().unwrap_or(0);
        let mut headers = vec![SectionHeader::new(b"", 0, 0, 0); count];

        for segment in segments {
            let z = usize::from(segment.index)
                .checked_sub(1)
                .ok_or_else(|| SymbolError::InvalidArgument("segment index 0".to_string()))?;
            headers[z] = SectionHeader::new(&segment.name, segment.rva, segment.length, 0);
        }

        Self::load_from_sections(&headers)
    }

    /// Number of sections in the map.
    pub fn section_count(&self) -> u16
    {
        // load_from_sections bounds the count below u16::MAX
        self.sections.len() as u16
    }

    /// Section by 1-based index.
    pub fn section(&self, index: u16) -> Option<&Section>
    {
        let z = usize::from(index).checked_sub(1)?;
        self.sections.get(z)
    }

    /// Iterate sections in index order.
    pub fn sections(&self) -> impl Iterator<Item = &Section>
    {
        self.sections.iter()
    }

    /// Convert a section-relative offset to an RVA.
    ///
    /// Returns `None` for section 0 or an index past the last section. The
    /// offset is not checked against the section size; computed addresses may
    /// legitimately point past it.
    pub fn map_sec_offset_to_rva(&self, sec_index: u16, offset: u32) -> Option<u32>
    {
        self.section(sec_index).map(|section| section.rva.wrapping_add(offset))
    }

    /// Convert an RVA to a 1-based section index and offset.
    ///
    /// Picks the section with the largest start RVA not exceeding `rva`, so
    /// an RVA in a gap or past the end resolves to the preceding section.
    /// Empty sections never match; they only hold a place in the numbering.
    /// Returns `None` if every non-empty section starts above `rva`.
    pub fn map_rva_to_sec_offset(&self, rva: u32) -> Option<(u16, u32)>
    {
        let mut best: Option<(u16, u32)> = None;

        for (z, section) in self.sections.iter().enumerate() {
            if section.size == 0 || rva < section.rva {
                continue;
            }
            let offset = rva - section.rva;
            if best.is_none_or(|(_, best_offset)| offset < best_offset) {
                best = Some((z as u16 + 1, offset));
            }
        }

        best
    }

    /// [`AddressMap::map_rva_to_sec_offset`] as a [`SegmentOffset`].
    pub fn segment_offset(&self, rva: u32) -> Option<SegmentOffset>
    {
        self.map_rva_to_sec_offset(rva).map(|(segment, offset)| SegmentOffset::new(segment, offset))
    }

    /// Find a section by name.
    ///
    /// The comparison covers the full 8-byte field: `name` must match the
    /// leading bytes exactly and the remainder of the stored name must be
    /// padding (NUL or space). Returns the 1-based index, or 0 if absent.
    pub fn find_section(&self, name: &[u8]) -> u16
    {
        if name.len() > SECTION_NAME_LEN {
            return 0;
        }

        self.sections
            .iter()
            .position(|section| {
                section.name[..name.len()] == *name && section.name[name.len()..].iter().all(|&b| b == 0 || b == b' ')
            })
            .map_or(0, |z| z as u16 + 1)
    }
}

fn pad_name(name: &[u8]) -> [u8; SECTION_NAME_LEN]
{
    let mut padded = [0u8; SECTION_NAME_LEN];
    let len = name.len().min(SECTION_NAME_LEN);
    padded[..len].copy_from_slice(&name[..len]);
    padded
}
