//! CodeView type records, fields and primitive types.
//!
//! Three shapes of data carry type information:
//!
//! - **Records** in the global type table: a 16-bit length, a leaf id and a
//!   body. Type indices at or above `0x1000` refer to them.
//! - **Fields** inside a field list: a leaf id and a body, with no length of
//!   their own. [`field_length`] computes it from the layout.
//! - **Primitive indices** below `0x1000`, which encode a base type and an
//!   optional pointer mode in the index bits themselves.
//!
//! [`CvTypeInfo::parse`] decodes any of them into one [`CvType`] variant.

use super::constants::*;
use super::numeric::{numeric_leaf_size, numeric_leaf_uint, numeric_leaf_value};
use super::reader::ByteReader;
use crate::error::{Result, SymbolError};
use crate::info::SymbolInfo;
use crate::types::{
    BasicType, DataKind, LocationType, SymTag, TypeIndex, UdtKind, Variant, FIRST_RECORD_TYPE_INDEX,
};

/// Pointer mode bits of a primitive type index; 0 means a direct value.
pub const fn primitive_mode(index: u16) -> u16
{
    (index >> 8) & 0x7
}

/// Primitive type family and subtype of a primitive index.
const fn primitive_parts(index: u16) -> (u16, u16)
{
    ((index >> 4) & 0xf, index & 0xf)
}

/// Basic type and byte size of a primitive type index.
///
/// Returns `None` for families and subtypes with no basic type, which
/// includes every special type except `void`.
pub fn primitive_basic_type(index: u16) -> Option<(BasicType, u32)>
{
    let (family, sub) = primitive_parts(index);

    let sized = |basic: BasicType| -> Option<(BasicType, u32)> {
        match sub {
            0 => Some((basic, 1)),
            1 => Some((basic, 2)),
            2 => Some((basic, 4)),
            3 => Some((basic, 8)),
            4 => Some((basic, 16)),
            _ => None,
        }
    };
    let real = |basic: BasicType, scale: u32| -> Option<(BasicType, u32)> {
        let len = match sub {
            0 => 4,
            1 => 8,
            2 => 10,
            3 => 16,
            4 => 6,
            _ => return None,
        };
        Some((basic, len * scale))
    };

    match family {
        0 if sub == 3 => Some((BasicType::Void, 0)),
        1 => sized(BasicType::Int),
        2 => sized(BasicType::UInt),
        3 => sized(BasicType::Bool),
        4 => real(BasicType::Float, 1),
        5 => real(BasicType::Complex, 2),
        7 => match sub {
            0 => Some((BasicType::Char, 1)),
            1 => Some((BasicType::WChar, 2)),
            2 | 4 | 6 => Some((BasicType::Int, 1 << (sub / 2))),
            3 | 5 | 7 => Some((BasicType::UInt, 1 << (sub / 2))),
            // 32-bit character type emitted by D compilers
            8 => Some((BasicType::Char, 4)),
            _ => None,
        },
        _ => None,
    }
}

/// Length of the field starting at `offset`, leaf id included.
///
/// ## Errors
///
/// `Format` for a field kind with no known layout, or a layout that runs
/// past the buffer.
pub fn field_length(reader: &ByteReader<'_>, offset: usize) -> Result<usize>
{
    let id = reader.u16_at(offset)?;
    let name_len = |at: usize| -> Result<usize> { Ok(1 + usize::from(reader.u8_at(offset + at)?)) };

    let len = match id {
        LF_BCLASS => 6 + numeric_leaf_size(reader, offset + 6)?,
        LF_VBCLASS | LF_IVBCLASS => {
            let first = numeric_leaf_size(reader, offset + 8)?;
            8 + first + numeric_leaf_size(reader, offset + 8 + first)?
        }
        LF_ENUMERATE => {
            let value = 4 + numeric_leaf_size(reader, offset + 4)?;
            value + name_len(value)?
        }
        LF_FRIENDFCN | LF_NESTTYPE => 4 + name_len(4)?,
        LF_MEMBER => {
            let value = 6 + numeric_leaf_size(reader, offset + 6)?;
            value + name_len(value)?
        }
        LF_STMEMBER | LF_METHOD => 6 + name_len(6)?,
        LF_VFUNCTAB | LF_FRIENDCLS | LF_INDEX => 4,
        LF_ONEMETHOD => {
            let fixed = if is_intro_method(reader.u16_at(offset + 2)?) { 10 } else { 6 };
            fixed + name_len(fixed)?
        }
        LF_VFUNCOFF => 8,
        _ => return Err(SymbolError::Format(format!("unknown field kind {id:#06x} at {offset:#x}"))),
    };

    reader.check(offset, len)?;
    Ok(len)
}

/// Length of a method list entry: attribute, type and the vtable offset of
/// introducing virtuals.
pub fn method_list_entry_length(reader: &ByteReader<'_>, offset: usize) -> Result<usize>
{
    Ok(if is_intro_method(reader.u16_at(offset)?) { 8 } else { 4 })
}

/// A packed array of 16-bit type indices inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeIndexList<'a>
{
    bytes: &'a [u8],
}

impl<'a> TypeIndexList<'a>
{
    fn read(reader: &ByteReader<'a>, offset: usize, count: u16) -> Result<Self>
    {
        Ok(Self {
            bytes: reader.slice_at(offset, usize::from(count) * 2)?,
        })
    }

    pub const fn len(&self) -> usize
    {
        self.bytes.len() / 2
    }

    pub const fn is_empty(&self) -> bool
    {
        self.bytes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TypeIndex> + 'a
    {
        self.bytes
            .chunks_exact(2)
            .map(|pair| TypeIndex::from(u16::from_le_bytes([pair[0], pair[1]])))
    }
}

/// A decoded type record, field or primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CvType<'a>
{
    /// Primitive value type encoded in the index
    Primitive
    {
        index: u16
    },
    /// Pointer to a primitive, encoded in the index mode bits
    PrimitivePointer
    {
        index: u16
    },
    Pointer
    {
        attribute: u16,
        type_index: u16,
    },
    Array
    {
        element_type: u16,
        index_type: u16,
        length: u32,
        name: &'a [u8],
    },
    Aggregate
    {
        udt_kind: UdtKind,
        field_count: u16,
        field_list: u16,
        properties: u16,
        /// Derived list and vtable shape; unions have neither
        derived_list: Option<u16>,
        vshape: Option<u16>,
        length: u32,
        name: &'a [u8],
    },
    Enum
    {
        field_count: u16,
        underlying_type: u16,
        field_list: u16,
        properties: u16,
        name: &'a [u8],
    },
    Procedure
    {
        return_type: u16,
        call_conv: u8,
        param_count: u16,
        arg_list: u16,
    },
    MemberFunction
    {
        return_type: u16,
        class: u16,
        this: u16,
        call_conv: u8,
        param_count: u16,
        arg_list: u16,
        this_adjust: i32,
    },
    VtShape
    {
        count: u16,
        descriptors: &'a [u8],
    },
    Oem
    {
        oem_id: u16,
        oem_symbol_id: u16,
        types: TypeIndexList<'a>,
    },
    FieldList,
    /// Argument list or derived-class list
    TypeList
    {
        types: TypeIndexList<'a>
    },
    BaseClass
    {
        type_index: u16,
        attribute: u16,
        offset: u32,
        is_virtual: bool,
    },
    Enumerate
    {
        attribute: u16,
        value: Variant<'a>,
        name: &'a [u8],
    },
    FriendFunction
    {
        type_index: u16,
        name: &'a [u8],
    },
    Member
    {
        type_index: u16,
        attribute: u16,
        offset: u32,
        name: &'a [u8],
    },
    StaticMember
    {
        type_index: u16,
        attribute: u16,
        name: &'a [u8],
    },
    MethodOverloads
    {
        count: u16,
        method_list: u16,
        name: &'a [u8],
    },
    NestedType
    {
        type_index: u16,
        name: &'a [u8],
    },
    VfuncTab
    {
        type_index: u16
    },
    FriendClass
    {
        type_index: u16
    },
    OneMethod
    {
        attribute: u16,
        type_index: u16,
        vtable_offset: Option<u32>,
        name: &'a [u8],
    },
    VfuncOff
    {
        type_index: u16,
        offset: i32,
    },
    /// One entry of an overload's method list
    MethodListEntry
    {
        attribute: u16,
        type_index: u16,
        vtable_offset: Option<u32>,
    },
}

/// A type adapter: the decoded record plus the modifier bits stripped off on
/// the way to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvTypeInfo<'a>
{
    pub index: u16,
    pub modifier: u16,
    pub kind: CvType<'a>,
}

impl<'a> CvTypeInfo<'a>
{
    /// Decode a type.
    ///
    /// `record` is the buffer offset of the record or field, or `None` for a
    /// primitive index. `tag` is the leaf id the record is dispatched on.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` for a record index with no record or a leaf kind
    /// that has no adapter, and `Format` for out-of-bounds fields.
    pub fn parse(reader: &ByteReader<'a>, index: u16, record: Option<usize>, tag: u16, modifier: u16) -> Result<Self>
    {
        let kind = match record {
            Some(at) if tag < FIRST_FIELD_LEAF => parse_record(reader, at, tag)?,
            Some(at) if tag == LF_METHOD_OVERLOAD => parse_method_list_entry(reader, at)?,
            Some(at) => parse_field(reader, at, tag)?,
            None => parse_primitive(index)?,
        };

        Ok(Self { index, modifier, kind })
    }
}

fn parse_primitive(index: u16) -> Result<CvType<'static>>
{
    if TypeIndex::from(index) >= FIRST_RECORD_TYPE_INDEX {
        return Err(SymbolError::InvalidArgument(format!("type index {index:#x} has no record")));
    }

    Ok(if primitive_mode(index) == 0 {
        CvType::Primitive { index }
    } else {
        CvType::PrimitivePointer { index }
    })
}

fn parse_record<'a>(reader: &ByteReader<'a>, at: usize, tag: u16) -> Result<CvType<'a>>
{
    let len = reader.u16_at(at)?;
    let r = ByteReader::new(reader.slice_at(at, usize::from(len) + 2)?);
    // Offsets below are relative to the start of the record.
    const B: usize = 4;

    let kind = match tag {
        LF_POINTER => CvType::Pointer {
            attribute: r.u16_at(B)?,
            type_index: r.u16_at(B + 2)?,
        },
        LF_ARRAY => {
            let leaf = B + 4;
            CvType::Array {
                element_type: r.u16_at(B)?,
                index_type: r.u16_at(B + 2)?,
                length: numeric_leaf_uint(&r, leaf)?,
                name: r.pas_string_at(leaf + numeric_leaf_size(&r, leaf)?)?,
            }
        }
        LF_CLASS | LF_STRUCTURE => {
            let leaf = B + 10;
            CvType::Aggregate {
                udt_kind: if tag == LF_CLASS { UdtKind::Class } else { UdtKind::Struct },
                field_count: r.u16_at(B)?,
                field_list: r.u16_at(B + 2)?,
                properties: r.u16_at(B + 4)?,
                derived_list: Some(r.u16_at(B + 6)?),
                vshape: Some(r.u16_at(B + 8)?),
                length: numeric_leaf_uint(&r, leaf)?,
                name: r.pas_string_at(leaf + numeric_leaf_size(&r, leaf)?)?,
            }
        }
        LF_UNION => {
            let leaf = B + 6;
            CvType::Aggregate {
                udt_kind: UdtKind::Union,
                field_count: r.u16_at(B)?,
                field_list: r.u16_at(B + 2)?,
                properties: r.u16_at(B + 4)?,
                derived_list: None,
                vshape: None,
                length: numeric_leaf_uint(&r, leaf)?,
                name: r.pas_string_at(leaf + numeric_leaf_size(&r, leaf)?)?,
            }
        }
        LF_ENUM => CvType::Enum {
            field_count: r.u16_at(B)?,
            underlying_type: r.u16_at(B + 2)?,
            field_list: r.u16_at(B + 4)?,
            properties: r.u16_at(B + 6)?,
            name: r.pas_string_at(B + 8)?,
        },
        LF_PROCEDURE => CvType::Procedure {
            return_type: r.u16_at(B)?,
            call_conv: r.u8_at(B + 2)?,
            param_count: r.u16_at(B + 4)?,
            arg_list: r.u16_at(B + 6)?,
        },
        LF_MFUNCTION => CvType::MemberFunction {
            return_type: r.u16_at(B)?,
            class: r.u16_at(B + 2)?,
            this: r.u16_at(B + 4)?,
            call_conv: r.u8_at(B + 6)?,
            param_count: r.u16_at(B + 8)?,
            arg_list: r.u16_at(B + 10)?,
            this_adjust: r.i32_at(B + 12)?,
        },
        LF_VTSHAPE => {
            let count = r.u16_at(B)?;
            CvType::VtShape {
                count,
                descriptors: r.slice_at(B + 2, usize::from(count).div_ceil(2))?,
            }
        }
        LF_OEM => CvType::Oem {
            oem_id: r.u16_at(B)?,
            oem_symbol_id: r.u16_at(B + 2)?,
            types: TypeIndexList::read(&r, B + 6, r.u16_at(B + 4)?)?,
        },
        LF_FIELDLIST => CvType::FieldList,
        LF_ARGLIST | LF_DERIVED => CvType::TypeList {
            types: TypeIndexList::read(&r, B + 2, r.u16_at(B)?)?,
        },
        _ => return Err(SymbolError::InvalidArgument(format!("no type info for leaf {tag:#06x}"))),
    };

    Ok(kind)
}

fn parse_field<'a>(reader: &ByteReader<'a>, at: usize, tag: u16) -> Result<CvType<'a>>
{
    let r = ByteReader::new(reader.slice_at(at, field_length(reader, at)?)?);
    // Offsets below are relative to the start of the field.
    const B: usize = 2;

    let kind = match tag {
        LF_BCLASS => CvType::BaseClass {
            type_index: r.u16_at(B)?,
            attribute: r.u16_at(B + 2)?,
            offset: numeric_leaf_uint(&r, B + 4)?,
            is_virtual: false,
        },
        LF_VBCLASS | LF_IVBCLASS => CvType::BaseClass {
            type_index: r.u16_at(B)?,
            attribute: r.u16_at(B + 4)?,
            offset: numeric_leaf_uint(&r, B + 6)?,
            is_virtual: true,
        },
        LF_ENUMERATE => {
            let leaf = B + 2;
            CvType::Enumerate {
                attribute: r.u16_at(B)?,
                value: numeric_leaf_value(&r, leaf)?,
                name: r.pas_string_at(leaf + numeric_leaf_size(&r, leaf)?)?,
            }
        }
        LF_FRIENDFCN => CvType::FriendFunction {
            type_index: r.u16_at(B)?,
            name: r.pas_string_at(B + 2)?,
        },
        LF_MEMBER => {
            let leaf = B + 4;
            CvType::Member {
                type_index: r.u16_at(B)?,
                attribute: r.u16_at(B + 2)?,
                offset: numeric_leaf_uint(&r, leaf)?,
                name: r.pas_string_at(leaf + numeric_leaf_size(&r, leaf)?)?,
            }
        }
        LF_STMEMBER => CvType::StaticMember {
            type_index: r.u16_at(B)?,
            attribute: r.u16_at(B + 2)?,
            name: r.pas_string_at(B + 4)?,
        },
        LF_METHOD => CvType::MethodOverloads {
            count: r.u16_at(B)?,
            method_list: r.u16_at(B + 2)?,
            name: r.pas_string_at(B + 4)?,
        },
        LF_NESTTYPE => CvType::NestedType {
            type_index: r.u16_at(B)?,
            name: r.pas_string_at(B + 2)?,
        },
        LF_VFUNCTAB => CvType::VfuncTab {
            type_index: r.u16_at(B)?,
        },
        LF_FRIENDCLS => CvType::FriendClass {
            type_index: r.u16_at(B)?,
        },
        LF_ONEMETHOD => {
            let attribute = r.u16_at(B)?;
            let (vtable_offset, name_at) = if is_intro_method(attribute) {
                (Some(r.u32_at(B + 4)?), B + 8)
            } else {
                (None, B + 4)
            };
            CvType::OneMethod {
                attribute,
                type_index: r.u16_at(B + 2)?,
                vtable_offset,
                name: r.pas_string_at(name_at)?,
            }
        }
        LF_VFUNCOFF => CvType::VfuncOff {
            type_index: r.u16_at(B)?,
            offset: r.i32_at(B + 2)?,
        },
        _ => return Err(SymbolError::InvalidArgument(format!("no type info for field {tag:#06x}"))),
    };

    Ok(kind)
}

fn parse_method_list_entry<'a>(reader: &ByteReader<'a>, at: usize) -> Result<CvType<'a>>
{
    let attribute = reader.u16_at(at)?;
    Ok(CvType::MethodListEntry {
        attribute,
        type_index: reader.u16_at(at + 2)?,
        vtable_offset: if is_intro_method(attribute) { Some(reader.u32_at(at + 4)?) } else { None },
    })
}

/// Modifier bits carried by a pointer's own attribute word.
const fn pointer_modifier(attribute: u16) -> u16
{
    let mut bits = 0;
    if attribute & PTR_ATTR_CONST != 0 {
        bits |= MOD_CONST;
    }
    if attribute & PTR_ATTR_VOLATILE != 0 {
        bits |= MOD_VOLATILE;
    }
    if attribute & PTR_ATTR_UNALIGNED != 0 {
        bits |= MOD_UNALIGNED;
    }
    bits
}

impl SymbolInfo for CvTypeInfo<'_>
{
    fn sym_tag(&self) -> SymTag
    {
        match self.kind {
            CvType::Primitive { .. } => SymTag::BaseType,
            CvType::PrimitivePointer { .. } | CvType::Pointer { .. } => SymTag::PointerType,
            CvType::Array { .. } => SymTag::ArrayType,
            CvType::Aggregate { .. } => SymTag::Udt,
            CvType::Enum { .. } => SymTag::Enum,
            CvType::Procedure { .. } | CvType::MemberFunction { .. } => SymTag::FunctionType,
            CvType::VtShape { .. } => SymTag::VTableShape,
            CvType::Oem { .. } => SymTag::CustomType,
            CvType::FieldList => SymTag::FieldList,
            CvType::TypeList { .. } => SymTag::TypeList,
            CvType::BaseClass { .. } => SymTag::BaseClass,
            CvType::Enumerate { .. } | CvType::Member { .. } | CvType::StaticMember { .. } => SymTag::Data,
            CvType::FriendFunction { .. } | CvType::FriendClass { .. } => SymTag::Friend,
            CvType::MethodOverloads { .. } => SymTag::MethodOverloads,
            CvType::NestedType { .. } => SymTag::NestedType,
            CvType::VfuncTab { .. } | CvType::VfuncOff { .. } => SymTag::VTable,
            CvType::OneMethod { .. } | CvType::MethodListEntry { .. } => SymTag::Method,
        }
    }

    fn name(&self) -> Option<&[u8]>
    {
        match self.kind {
            CvType::Array { name, .. }
            | CvType::Aggregate { name, .. }
            | CvType::Enum { name, .. }
            | CvType::Enumerate { name, .. }
            | CvType::FriendFunction { name, .. }
            | CvType::Member { name, .. }
            | CvType::StaticMember { name, .. }
            | CvType::MethodOverloads { name, .. }
            | CvType::NestedType { name, .. }
            | CvType::OneMethod { name, .. } => Some(name),
            _ => None,
        }
    }

    fn type_index(&self) -> Option<TypeIndex>
    {
        let index = match self.kind {
            CvType::PrimitivePointer { index } => index & 0xff,
            CvType::Pointer { type_index, .. }
            | CvType::BaseClass { type_index, .. }
            | CvType::FriendFunction { type_index, .. }
            | CvType::Member { type_index, .. }
            | CvType::StaticMember { type_index, .. }
            | CvType::NestedType { type_index, .. }
            | CvType::VfuncTab { type_index }
            | CvType::FriendClass { type_index }
            | CvType::OneMethod { type_index, .. }
            | CvType::VfuncOff { type_index, .. }
            | CvType::MethodListEntry { type_index, .. } => type_index,
            CvType::Array { element_type, .. } => element_type,
            CvType::Enum { underlying_type, .. } => underlying_type,
            CvType::Procedure { return_type, .. } | CvType::MemberFunction { return_type, .. } => return_type,
            CvType::Oem { types, .. } => return types.iter().next(),
            _ => return None,
        };
        Some(TypeIndex::from(index))
    }

    fn data_kind(&self) -> Option<DataKind>
    {
        match self.kind {
            CvType::Enumerate { .. } => Some(DataKind::Constant),
            CvType::Member { .. } => Some(DataKind::Member),
            CvType::StaticMember { .. } => Some(DataKind::StaticMember),
            _ => None,
        }
    }

    fn length(&self) -> Option<u64>
    {
        match self.kind {
            CvType::Primitive { index } => primitive_basic_type(index).map(|(_, len)| u64::from(len)),
            CvType::Aggregate { length, .. } => Some(u64::from(length)),
            _ => None,
        }
    }

    fn location(&self) -> Option<LocationType>
    {
        match self.kind {
            CvType::Enumerate { .. } => Some(LocationType::Constant),
            CvType::Member { .. } => Some(LocationType::ThisRel),
            CvType::StaticMember { .. } => Some(LocationType::Static),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn offset(&self) -> Option<i32>
    {
        match self.kind {
            CvType::BaseClass { offset, .. } | CvType::Member { offset, .. } => Some(offset as i32),
            CvType::VfuncOff { offset, .. } => Some(offset),
            _ => None,
        }
    }

    fn udt_kind(&self) -> Option<UdtKind>
    {
        match self.kind {
            CvType::Aggregate { udt_kind, .. } => Some(udt_kind),
            _ => None,
        }
    }

    fn value(&self) -> Option<Variant<'_>>
    {
        match self.kind {
            CvType::Enumerate { value, .. } => Some(value),
            _ => None,
        }
    }

    fn basic_type(&self) -> Option<BasicType>
    {
        match self.kind {
            CvType::Primitive { index } => primitive_basic_type(index).map(|(basic, _)| basic),
            _ => None,
        }
    }

    fn index_type(&self) -> Option<TypeIndex>
    {
        match self.kind {
            CvType::Array { index_type, .. } => Some(TypeIndex::from(index_type)),
            _ => None,
        }
    }

    fn count(&self) -> Option<u32>
    {
        match self.kind {
            CvType::Array { length, .. } => Some(length),
            CvType::VtShape { count, .. } | CvType::MethodOverloads { count, .. } => Some(u32::from(count)),
            CvType::Oem { types, .. } | CvType::TypeList { types } => Some(types.len() as u32),
            _ => None,
        }
    }

    fn field_count(&self) -> Option<u16>
    {
        match self.kind {
            CvType::Aggregate { field_count, .. } | CvType::Enum { field_count, .. } => Some(field_count),
            _ => None,
        }
    }

    fn field_list(&self) -> Option<TypeIndex>
    {
        match self.kind {
            CvType::Aggregate { field_list, .. } | CvType::Enum { field_list, .. } => {
                Some(TypeIndex::from(field_list))
            }
            CvType::MethodOverloads { method_list, .. } => Some(TypeIndex::from(method_list)),
            _ => None,
        }
    }

    fn properties(&self) -> Option<u16>
    {
        match self.kind {
            CvType::Aggregate { properties, .. } | CvType::Enum { properties, .. } => Some(properties),
            _ => None,
        }
    }

    fn derived_list(&self) -> Option<TypeIndex>
    {
        match self.kind {
            CvType::Aggregate { derived_list, .. } => derived_list.map(TypeIndex::from),
            _ => None,
        }
    }

    fn vshape(&self) -> Option<TypeIndex>
    {
        match self.kind {
            CvType::Aggregate { vshape, .. } => vshape.map(TypeIndex::from),
            _ => None,
        }
    }

    fn call_conv(&self) -> Option<u8>
    {
        match self.kind {
            CvType::Procedure { call_conv, .. } | CvType::MemberFunction { call_conv, .. } => Some(call_conv),
            _ => None,
        }
    }

    fn param_count(&self) -> Option<u16>
    {
        match self.kind {
            CvType::Procedure { param_count, .. } | CvType::MemberFunction { param_count, .. } => Some(param_count),
            _ => None,
        }
    }

    fn param_list(&self) -> Option<TypeIndex>
    {
        match self.kind {
            CvType::Procedure { arg_list, .. } | CvType::MemberFunction { arg_list, .. } => {
                Some(TypeIndex::from(arg_list))
            }
            _ => None,
        }
    }

    fn class(&self) -> Option<TypeIndex>
    {
        match self.kind {
            CvType::MemberFunction { class, .. } => Some(TypeIndex::from(class)),
            _ => None,
        }
    }

    fn this(&self) -> Option<TypeIndex>
    {
        match self.kind {
            CvType::MemberFunction { this, .. } => Some(TypeIndex::from(this)),
            _ => None,
        }
    }

    fn this_adjust(&self) -> Option<i32>
    {
        match self.kind {
            CvType::MemberFunction { this_adjust, .. } => Some(this_adjust),
            _ => None,
        }
    }

    fn oem_id(&self) -> Option<u16>
    {
        match self.kind {
            CvType::Oem { oem_id, .. } => Some(oem_id),
            _ => None,
        }
    }

    fn oem_symbol_id(&self) -> Option<u16>
    {
        match self.kind {
            CvType::Oem { oem_symbol_id, .. } => Some(oem_symbol_id),
            _ => None,
        }
    }

    fn types(&self) -> Option<Vec<TypeIndex>>
    {
        match self.kind {
            CvType::Oem { types, .. } | CvType::TypeList { types } => Some(types.iter().collect()),
            _ => None,
        }
    }

    fn attribute(&self) -> Option<u16>
    {
        match self.kind {
            CvType::BaseClass { attribute, .. }
            | CvType::Enumerate { attribute, .. }
            | CvType::Member { attribute, .. }
            | CvType::StaticMember { attribute, .. }
            | CvType::OneMethod { attribute, .. }
            | CvType::MethodListEntry { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    fn vbase_offset(&self) -> Option<u32>
    {
        match self.kind {
            CvType::OneMethod { vtable_offset, .. } | CvType::MethodListEntry { vtable_offset, .. } => vtable_offset,
            _ => None,
        }
    }

    fn vtable_descriptor(&self, index: u32) -> Option<u8>
    {
        match self.kind {
            CvType::VtShape { count, descriptors } if index < u32::from(count) => {
                let packed = *descriptors.get((index / 2) as usize)?;
                Some(if index % 2 == 1 { packed >> 4 } else { packed & 0xf })
            }
            _ => None,
        }
    }

    fn modifier(&self) -> Option<u16>
    {
        match self.kind {
            CvType::Pointer { attribute, .. } => Some(self.modifier | pointer_modifier(attribute)),
            _ => Some(self.modifier),
        }
    }
}
