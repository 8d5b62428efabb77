//! # PDB Backend
//!
//! Adapter from an external indexed symbol database to the [`DebugStore`]
//! contract.
//!
//! The database itself is not parsed here. Callers supply a [`PdbSession`]
//! that answers id-keyed queries (a symbol by id, the children of a symbol,
//! the source files and line entries of a compiland), and [`PdbStore`]
//! reshapes those answers into the same handles, scopes and line structures
//! the CodeView backend produces.
//!
//! Symbols and types share one id space, so a type index is simply the id of
//! the type's symbol.
//!
//! [`DebugStore`]: crate::store::DebugStore

mod cache;
mod info;
mod store;

pub use cache::SymbolCache;
pub use info::PdbSymbolInfo;
pub use store::{PdbNamedSearch, PdbScope, PdbStore, PdbSymHandle, PdbTypeHandle, DEFAULT_SYMBOL_CACHE_CAPACITY};

use crate::error::Result;
use crate::types::{BasicType, DataKind, LocationType, SymTag, UdtKind, Variant};

/// One section of the image as the database enumerates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbSegment
{
    /// 1-based section number
    pub index: u16,
    pub name: Vec<u8>,
    pub rva: u32,
    pub length: u32,
}

/// A symbol record as the database reports it.
///
/// Properties the record kind does not have stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PdbSymbol
{
    pub id: u32,
    pub tag: SymTag,
    pub name: Option<Vec<u8>>,
    pub type_id: Option<u32>,
    pub address_section: Option<u16>,
    pub address_offset: Option<u32>,
    /// Section of a thunk's target
    pub target_section: Option<u16>,
    /// Offset of a thunk's target
    pub target_offset: Option<u32>,
    pub data_kind: Option<DataKind>,
    pub length: Option<u64>,
    pub location: Option<LocationType>,
    pub offset: Option<i32>,
    pub register: Option<u16>,
    pub udt_kind: Option<UdtKind>,
    pub value: Option<Variant<'static>>,
    pub basic_type: Option<BasicType>,
    pub count: Option<u32>,
    pub vshape: Option<u32>,
    pub call_conv: Option<u8>,
    /// Id of the owning class, or of a pointer to it
    pub class_parent: Option<u32>,
    pub object_pointer_type: Option<u32>,
    /// Argument or OEM type ids, when the database lists them directly
    pub type_ids: Option<Vec<u32>>,
    pub virtual_base_offset: Option<u32>,
    pub is_virtual: bool,
    pub is_const: bool,
    pub is_static: bool,
}

impl PdbSymbol
{
    /// A record with only its id and tag set.
    pub const fn new(id: u32, tag: SymTag) -> Self
    {
        Self {
            id,
            tag,
            name: None,
            type_id: None,
            address_section: None,
            address_offset: None,
            target_section: None,
            target_offset: None,
            data_kind: None,
            length: None,
            location: None,
            offset: None,
            register: None,
            udt_kind: None,
            value: None,
            basic_type: None,
            count: None,
            vshape: None,
            call_conv: None,
            class_parent: None,
            object_pointer_type: None,
            type_ids: None,
            virtual_base_offset: None,
            is_virtual: false,
            is_const: false,
            is_static: false,
        }
    }

    /// Section and offset of the symbol's address, if it has one.
    pub fn address(&self) -> Option<(u16, u32)>
    {
        Some((self.address_section?, self.address_offset?))
    }
}

/// One source file contributing to a compiland.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbFile
{
    /// Identifier unique across the database
    pub id: u32,
    pub name: Vec<u8>,
}

/// One line table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdbLine
{
    /// Id of the compiland symbol
    pub compiland: u32,
    /// Id of the source file
    pub file: u32,
    pub line: u32,
    pub line_end: u32,
    pub section: u16,
    pub offset: u32,
    pub length: u32,
}

/// An open symbol database.
///
/// Implementations answer from their own index; every method is a plain
/// synchronous query. Enumeration results are returned in the database's
/// order, which [`PdbStore`] preserves.
pub trait PdbSession
{
    /// Id of the global scope, the parent of all compilands and types.
    fn global_scope(&self) -> u32;

    /// The record for an id.
    ///
    /// ## Errors
    ///
    /// `NotFound` for an id the database does not know.
    fn symbol_by_id(&self, id: u32) -> Result<PdbSymbol>;

    /// Ids of the children of `parent`, optionally restricted to one tag and
    /// one name.
    fn find_children(&self, parent: u32, tag: Option<SymTag>, name: Option<&[u8]>, case_sensitive: bool) -> Vec<u32>;

    /// Id of the `index`-th child of `parent`, in [`PdbSession::find_children`]
    /// order.
    ///
    /// Scopes advance through this one position at a time. The default
    /// re-enumerates the children; databases with indexed child access
    /// should override it.
    fn child_at(&self, parent: u32, index: usize) -> Option<u32>
    {
        self.find_children(parent, None, None, false).get(index).copied()
    }

    /// Id of the symbol of kind `tag` nearest at or before an address.
    fn find_symbol_by_addr(&self, segment: u16, offset: u32, tag: SymTag) -> Option<u32>;

    /// Source files of a compiland.
    fn find_files(&self, compiland: u32) -> Vec<PdbFile>;

    /// Line entries of one file of a compiland, in address order.
    fn find_lines(&self, compiland: u32, file: u32) -> Vec<PdbLine>;

    /// Line entries overlapping `[offset, offset + length)`.
    fn find_lines_by_addr(&self, segment: u16, offset: u32, length: u32) -> Vec<PdbLine>;

    /// Line entries of a file at or after `line`, best match first.
    fn find_lines_by_linenum(&self, compiland: u32, file: u32, line: u16) -> Vec<PdbLine>;

    /// Sections of the image.
    fn segments(&self) -> Vec<PdbSegment>;
}
