//! # Symbol Info
//!
//! The single query surface over symbol and type records.
//!
//! Every record kind of every backend implements [`SymbolInfo`]. Each
//! accessor returns `None` when the record kind has no such property, so a
//! caller can ask any record anything and branch on the answer, typically
//! after looking at [`SymbolInfo::sym_tag`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let info = store.symbol_info(handle)?;
//! if info.sym_tag() == SymTag::Function {
//!     let start = info.address_offset().unwrap_or(0);
//!     let len = info.length().unwrap_or(0);
//!     println!("{} at {start:#x}+{len:#x}", String::from_utf8_lossy(info.name().unwrap_or(b"")));
//! }
//! ```

use crate::types::{BasicType, DataKind, LocationType, SymTag, TypeIndex, UdtKind, Variant};

/// Accessors over one symbol or type record.
///
/// Only [`SymbolInfo::sym_tag`] is mandatory. Names and values borrow from
/// the adapter, which in turn borrows from its store.
pub trait SymbolInfo
{
    /// Kind of the record
    fn sym_tag(&self) -> SymTag;

    /// Name, undecorated bytes as stored
    fn name(&self) -> Option<&[u8]>
    {
        None
    }

    /// Type of the symbol, or the underlying type of a type record
    fn type_index(&self) -> Option<TypeIndex>
    {
        None
    }

    /// Offset within [`SymbolInfo::address_segment`]
    fn address_offset(&self) -> Option<u32>
    {
        None
    }

    /// 1-based section of the symbol's address
    fn address_segment(&self) -> Option<u16>
    {
        None
    }

    fn data_kind(&self) -> Option<DataKind>
    {
        None
    }

    /// Code length of a function, block or thunk, or byte size of a type
    fn length(&self) -> Option<u64>
    {
        None
    }

    fn location(&self) -> Option<LocationType>
    {
        None
    }

    /// Register-relative, frame-relative or this-relative offset
    fn offset(&self) -> Option<i32>
    {
        None
    }

    fn register(&self) -> Option<u16>
    {
        None
    }

    /// Registers of a multi-register value, in order
    fn registers(&self) -> Option<&[u8]>
    {
        None
    }

    fn udt_kind(&self) -> Option<UdtKind>
    {
        None
    }

    /// Constant value of a constant symbol or enumerator
    fn value(&self) -> Option<Variant<'_>>
    {
        None
    }

    /// Offset of the end of the prologue, relative to the function start
    fn debug_start(&self) -> Option<u32>
    {
        None
    }

    /// Offset of the start of the epilogue, relative to the function start
    fn debug_end(&self) -> Option<u32>
    {
        None
    }

    fn proc_flags(&self) -> Option<u8>
    {
        None
    }

    fn thunk_ordinal(&self) -> Option<u8>
    {
        None
    }

    fn basic_type(&self) -> Option<BasicType>
    {
        None
    }

    /// Index type of an array
    fn index_type(&self) -> Option<TypeIndex>
    {
        None
    }

    /// Element count of a type list or vtable shape, or overload count
    fn count(&self) -> Option<u32>
    {
        None
    }

    /// Number of members of an aggregate or enum
    fn field_count(&self) -> Option<u16>
    {
        None
    }

    fn field_list(&self) -> Option<TypeIndex>
    {
        None
    }

    /// Property bits of an aggregate or enum
    fn properties(&self) -> Option<u16>
    {
        None
    }

    fn derived_list(&self) -> Option<TypeIndex>
    {
        None
    }

    fn vshape(&self) -> Option<TypeIndex>
    {
        None
    }

    fn call_conv(&self) -> Option<u8>
    {
        None
    }

    fn param_count(&self) -> Option<u16>
    {
        None
    }

    fn param_list(&self) -> Option<TypeIndex>
    {
        None
    }

    /// Owning class of a member function type
    fn class(&self) -> Option<TypeIndex>
    {
        None
    }

    /// Type of `this` of a member function type
    fn this(&self) -> Option<TypeIndex>
    {
        None
    }

    fn this_adjust(&self) -> Option<i32>
    {
        None
    }

    fn oem_id(&self) -> Option<u16>
    {
        None
    }

    fn oem_symbol_id(&self) -> Option<u16>
    {
        None
    }

    /// Type indices of an argument list, derived list or OEM type
    fn types(&self) -> Option<Vec<TypeIndex>>
    {
        None
    }

    /// Member access and method property bits
    fn attribute(&self) -> Option<u16>
    {
        None
    }

    /// Offset of a virtual method in its vtable
    fn vbase_offset(&self) -> Option<u32>
    {
        None
    }

    /// 4-bit descriptor `index` of a vtable shape
    fn vtable_descriptor(&self, _index: u32) -> Option<u8>
    {
        None
    }

    /// Accumulated const/volatile/unaligned bits stripped off the type
    fn modifier(&self) -> Option<u16>
    {
        None
    }
}
