//! CodeView symbol records and their [`SymbolInfo`] adapter.
//!
//! A symbol record is a 16-bit length (not counting itself), a 16-bit record
//! id and a packed body. [`CvSymbol::parse`] decodes the body of every record
//! kind that has a query surface into one variant of a closed enum; field
//! reads are bounded by the record's own declared extent.

use super::constants::*;
use super::numeric::{numeric_leaf_size, numeric_leaf_value};
use super::reader::ByteReader;
use crate::error::{Result, SymbolError};
use crate::info::SymbolInfo;
use crate::types::{DataKind, LocationType, SymTag, TypeIndex, Variant};

/// Register number of the x86 frame pointer; BP-relative symbols report it.
pub const CV_REG_EBP: u16 = 22;

/// The bytes of the symbol record starting at `offset`, header included.
pub(crate) fn record_at<'a>(reader: &ByteReader<'a>, offset: usize) -> Result<ByteReader<'a>>
{
    let len = reader.u16_at(offset)?;
    Ok(ByteReader::new(reader.slice_at(offset, usize::from(len) + 2)?))
}

/// Record id of a record obtained from [`record_at`].
pub(crate) fn record_id(record: &ByteReader<'_>) -> Result<u16>
{
    record.u16_at(2)
}

/// Offset of the name within a record, for record kinds that have one.
fn name_offset(id: u16, record: &ByteReader<'_>) -> Result<Option<usize>>
{
    Ok(Some(match id {
        S_REGISTER | S_OBJNAME => 8,
        S_CONSTANT => 6 + numeric_leaf_size(record, 6)?,
        S_UDT => 6,
        S_MANYREG => 7 + usize::from(record.u8_at(6)?),
        S_BPREL32 => 10,
        S_LDATA32 | S_GDATA32 | S_PUB32 | S_LTHREAD32 | S_GTHREAD32 => 12,
        S_LPROC32 | S_GPROC32 => 37,
        S_THUNK32 => 25,
        S_BLOCK32 | S_WITH32 => 22,
        S_LABEL32 => 11,
        S_REGREL32 => 12,
        _ => return Ok(None),
    }))
}

/// Name of a record, without decoding the rest of it.
///
/// Used by name lookups, which also need to see object-file name records.
pub(crate) fn record_name<'a>(record: &ByteReader<'a>) -> Result<Option<&'a [u8]>>
{
    let id = record_id(record)?;
    match name_offset(id, record)? {
        Some(at) => record.pas_string_at(at).map(Some),
        None => Ok(None),
    }
}

/// Which data record a [`CvSymbol::Data`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRecordKind
{
    Local,
    Global,
    Public,
    LocalThread,
    GlobalThread,
}

/// A decoded symbol record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CvSymbol<'a>
{
    Register
    {
        type_index: u16,
        register: u16,
        name: &'a [u8],
    },
    ManyReg
    {
        type_index: u16,
        registers: &'a [u8],
        name: &'a [u8],
    },
    Constant
    {
        type_index: u16,
        value: Variant<'a>,
        name: &'a [u8],
    },
    Udt
    {
        type_index: u16,
        name: &'a [u8],
    },
    BpRel
    {
        offset: i32,
        type_index: u16,
        name: &'a [u8],
    },
    Data
    {
        kind: DataRecordKind,
        offset: u32,
        segment: u16,
        type_index: u16,
        /// The symbol lives in the thread-local storage section
        in_tls_segment: bool,
        name: &'a [u8],
    },
    Proc
    {
        end: u32,
        length: u32,
        debug_start: u32,
        debug_end: u32,
        offset: u32,
        segment: u16,
        type_index: u16,
        flags: u8,
        name: &'a [u8],
    },
    Thunk
    {
        end: u32,
        offset: u32,
        segment: u16,
        length: u16,
        ordinal: u8,
        name: &'a [u8],
    },
    Block
    {
        end: u32,
        length: u32,
        offset: u32,
        segment: u16,
        name: &'a [u8],
    },
    Label
    {
        offset: u32,
        segment: u16,
        flags: u8,
        name: &'a [u8],
    },
    RegRel
    {
        offset: i32,
        register: u16,
        type_index: u16,
        name: &'a [u8],
    },
    EndOfArgs,
}

impl<'a> CvSymbol<'a>
{
    /// Decode the record at `offset`.
    ///
    /// `tls_segment` is the 1-based index of the thread-local storage section,
    /// or 0 if the image has none.
    ///
    /// ## Errors
    ///
    /// `Format` if the record or one of its fields is out of bounds, and
    /// `InvalidArgument` for a record kind without a query surface, such as a
    /// scope end marker or an alignment record.
    pub fn parse(reader: &ByteReader<'a>, offset: usize, tls_segment: u16) -> Result<Self>
    {
        let r = record_at(reader, offset)?;
        let id = record_id(&r)?;
        let name = || -> Result<&'a [u8]> {
            match name_offset(id, &r)? {
                Some(at) => r.pas_string_at(at),
                None => Ok(&[]),
            }
        };

        let symbol = match id {
            S_REGISTER => CvSymbol::Register {
                type_index: r.u16_at(4)?,
                register: r.u16_at(6)?,
                name: name()?,
            },
            S_MANYREG => {
                let count = r.u8_at(6)?;
                CvSymbol::ManyReg {
                    type_index: r.u16_at(4)?,
                    registers: r.slice_at(7, usize::from(count))?,
                    name: name()?,
                }
            }
            S_CONSTANT => CvSymbol::Constant {
                type_index: r.u16_at(4)?,
                value: numeric_leaf_value(&r, 6)?,
                name: name()?,
            },
            S_UDT => CvSymbol::Udt {
                type_index: r.u16_at(4)?,
                name: name()?,
            },
            S_BPREL32 => CvSymbol::BpRel {
                offset: r.i32_at(4)?,
                type_index: r.u16_at(8)?,
                name: name()?,
            },
            S_LDATA32 | S_GDATA32 | S_PUB32 | S_LTHREAD32 | S_GTHREAD32 => {
                let kind = match id {
                    S_LDATA32 => DataRecordKind::Local,
                    S_GDATA32 => DataRecordKind::Global,
                    S_PUB32 => DataRecordKind::Public,
                    S_LTHREAD32 => DataRecordKind::LocalThread,
                    _ => DataRecordKind::GlobalThread,
                };
                let segment = r.u16_at(8)?;
                CvSymbol::Data {
                    kind,
                    offset: r.u32_at(4)?,
                    segment,
                    type_index: r.u16_at(10)?,
                    in_tls_segment: tls_segment != 0 && segment == tls_segment,
                    name: name()?,
                }
            }
            S_LPROC32 | S_GPROC32 => CvSymbol::Proc {
                end: r.u32_at(8)?,
                length: r.u32_at(16)?,
                debug_start: r.u32_at(20)?,
                debug_end: r.u32_at(24)?,
                offset: r.u32_at(28)?,
                segment: r.u16_at(32)?,
                type_index: r.u16_at(34)?,
                flags: r.u8_at(36)?,
                name: name()?,
            },
            S_THUNK32 => CvSymbol::Thunk {
                end: r.u32_at(8)?,
                offset: r.u32_at(16)?,
                segment: r.u16_at(20)?,
                length: r.u16_at(22)?,
                ordinal: r.u8_at(24)?,
                name: name()?,
            },
            S_BLOCK32 => CvSymbol::Block {
                end: r.u32_at(8)?,
                length: r.u32_at(12)?,
                offset: r.u32_at(16)?,
                segment: r.u16_at(20)?,
                name: name()?,
            },
            S_LABEL32 => CvSymbol::Label {
                offset: r.u32_at(4)?,
                segment: r.u16_at(8)?,
                flags: r.u8_at(10)?,
                name: name()?,
            },
            S_REGREL32 => CvSymbol::RegRel {
                offset: r.i32_at(4)?,
                register: r.u16_at(8)?,
                type_index: r.u16_at(10)?,
                name: name()?,
            },
            S_ENDARG => CvSymbol::EndOfArgs,
            _ => {
                return Err(SymbolError::InvalidArgument(format!("no symbol info for record kind {id:#06x}")));
            }
        };

        Ok(symbol)
    }
}

impl SymbolInfo for CvSymbol<'_>
{
    fn sym_tag(&self) -> SymTag
    {
        match self {
            CvSymbol::Data {
                kind: DataRecordKind::Public,
                ..
            } => SymTag::PublicSymbol,
            CvSymbol::Register { .. }
            | CvSymbol::ManyReg { .. }
            | CvSymbol::Constant { .. }
            | CvSymbol::BpRel { .. }
            | CvSymbol::Data { .. }
            | CvSymbol::RegRel { .. } => SymTag::Data,
            CvSymbol::Udt { .. } => SymTag::Typedef,
            CvSymbol::Proc { .. } => SymTag::Function,
            CvSymbol::Thunk { .. } => SymTag::Thunk,
            CvSymbol::Block { .. } => SymTag::Block,
            CvSymbol::Label { .. } => SymTag::Label,
            CvSymbol::EndOfArgs => SymTag::EndOfArgs,
        }
    }

    fn name(&self) -> Option<&[u8]>
    {
        match *self {
            CvSymbol::Register { name, .. }
            | CvSymbol::ManyReg { name, .. }
            | CvSymbol::Constant { name, .. }
            | CvSymbol::Udt { name, .. }
            | CvSymbol::BpRel { name, .. }
            | CvSymbol::Data { name, .. }
            | CvSymbol::Proc { name, .. }
            | CvSymbol::Thunk { name, .. }
            | CvSymbol::Block { name, .. }
            | CvSymbol::Label { name, .. }
            | CvSymbol::RegRel { name, .. } => Some(name),
            CvSymbol::EndOfArgs => None,
        }
    }

    fn type_index(&self) -> Option<TypeIndex>
    {
        match *self {
            CvSymbol::Register { type_index, .. }
            | CvSymbol::ManyReg { type_index, .. }
            | CvSymbol::Constant { type_index, .. }
            | CvSymbol::Udt { type_index, .. }
            | CvSymbol::BpRel { type_index, .. }
            | CvSymbol::Data { type_index, .. }
            | CvSymbol::Proc { type_index, .. }
            | CvSymbol::RegRel { type_index, .. } => Some(TypeIndex::from(type_index)),
            _ => None,
        }
    }

    fn address_offset(&self) -> Option<u32>
    {
        match *self {
            CvSymbol::Data { offset, .. }
            | CvSymbol::Proc { offset, .. }
            | CvSymbol::Thunk { offset, .. }
            | CvSymbol::Block { offset, .. }
            | CvSymbol::Label { offset, .. } => Some(offset),
            _ => None,
        }
    }

    fn address_segment(&self) -> Option<u16>
    {
        match *self {
            CvSymbol::Data { segment, .. }
            | CvSymbol::Proc { segment, .. }
            | CvSymbol::Thunk { segment, .. }
            | CvSymbol::Block { segment, .. }
            | CvSymbol::Label { segment, .. } => Some(segment),
            _ => None,
        }
    }

    fn data_kind(&self) -> Option<DataKind>
    {
        match *self {
            CvSymbol::Register { .. } | CvSymbol::ManyReg { .. } | CvSymbol::RegRel { .. } => Some(DataKind::Local),
            CvSymbol::Constant { .. } => Some(DataKind::Constant),
            CvSymbol::BpRel { offset, .. } if offset < 0 => Some(DataKind::Param),
            CvSymbol::BpRel { .. } => Some(DataKind::Local),
            CvSymbol::Data { kind, .. } => Some(match kind {
                DataRecordKind::Local | DataRecordKind::LocalThread => DataKind::FileStatic,
                DataRecordKind::Global | DataRecordKind::GlobalThread | DataRecordKind::Public => DataKind::Global,
            }),
            _ => None,
        }
    }

    fn length(&self) -> Option<u64>
    {
        match *self {
            CvSymbol::Proc { length, .. } | CvSymbol::Block { length, .. } => Some(u64::from(length)),
            CvSymbol::Thunk { length, .. } => Some(u64::from(length)),
            _ => None,
        }
    }

    fn location(&self) -> Option<LocationType>
    {
        match *self {
            CvSymbol::Register { .. } | CvSymbol::ManyReg { .. } => Some(LocationType::Enregistered),
            CvSymbol::Constant { .. } => Some(LocationType::Constant),
            CvSymbol::BpRel { .. } | CvSymbol::RegRel { .. } => Some(LocationType::RegRel),
            CvSymbol::Data {
                kind: DataRecordKind::Public,
                ..
            } => None,
            CvSymbol::Data {
                kind: DataRecordKind::LocalThread | DataRecordKind::GlobalThread,
                ..
            } => Some(LocationType::Tls),
            CvSymbol::Data { in_tls_segment, .. } => {
                Some(if in_tls_segment { LocationType::Tls } else { LocationType::Static })
            }
            CvSymbol::Proc { .. } | CvSymbol::Thunk { .. } | CvSymbol::Block { .. } | CvSymbol::Label { .. } => {
                Some(LocationType::Static)
            }
            _ => None,
        }
    }

    fn offset(&self) -> Option<i32>
    {
        match *self {
            CvSymbol::BpRel { offset, .. } | CvSymbol::RegRel { offset, .. } => Some(offset),
            _ => None,
        }
    }

    fn register(&self) -> Option<u16>
    {
        match *self {
            CvSymbol::Register { register, .. } | CvSymbol::RegRel { register, .. } => Some(register),
            CvSymbol::BpRel { .. } => Some(CV_REG_EBP),
            _ => None,
        }
    }

    fn registers(&self) -> Option<&[u8]>
    {
        match *self {
            CvSymbol::ManyReg { registers, .. } => Some(registers),
            _ => None,
        }
    }

    fn count(&self) -> Option<u32>
    {
        match *self {
            CvSymbol::ManyReg { registers, .. } => Some(registers.len() as u32),
            _ => None,
        }
    }

    fn value(&self) -> Option<Variant<'_>>
    {
        match *self {
            CvSymbol::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    fn debug_start(&self) -> Option<u32>
    {
        match *self {
            CvSymbol::Proc { debug_start, .. } => Some(debug_start),
            _ => None,
        }
    }

    fn debug_end(&self) -> Option<u32>
    {
        match *self {
            CvSymbol::Proc { debug_end, .. } => Some(debug_end),
            _ => None,
        }
    }

    fn proc_flags(&self) -> Option<u8>
    {
        match *self {
            CvSymbol::Proc { flags, .. } | CvSymbol::Label { flags, .. } => Some(flags),
            _ => None,
        }
    }

    fn thunk_ordinal(&self) -> Option<u8>
    {
        match *self {
            CvSymbol::Thunk { ordinal, .. } => Some(ordinal),
            _ => None,
        }
    }
}
