//! # Debug Store
//!
//! The contract both backends implement: scoped enumeration of symbols and
//! types, hashed name and address lookups, and compiland/source line tables.
//!
//! ## Handles and scopes
//!
//! Handles are small `Copy` values owned by the caller. They stay meaningful
//! as long as the store that produced them is alive and never need to be
//! released. Scopes are cursors created by a `set_*_scope` call and advanced
//! by `next_*`; a scope holds only positions, so dropping it is enough.
//!
//! ## Misses
//!
//! Enumeration and index lookups that simply run out return `None`. Lookups
//! that can also fail for structural reasons return a [`Result`] whose miss
//! case is [`SymbolError::NotFound`](crate::error::SymbolError::NotFound).

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::Result;
use crate::info::SymbolInfo;
use crate::types::{
    CompilandInfo, FileInfo, FileSegmentInfo, LineInfo, LineNumber, SegmentInfo, SymbolHeapId, TypeIndex,
};

/// Abstract debug information store.
pub trait DebugStore
{
    /// Identifies one symbol record
    type SymHandle: Copy + Eq + Hash + Debug;
    /// Identifies one type record, field or primitive type
    type TypeHandle: Copy + Eq + Debug;
    /// Cursor over a list of symbols
    type SymbolScope: Debug;
    /// Cursor over a list of types or fields
    type TypeScope: Debug;
    /// State of a by-name search
    type NamedSearch: Debug;
    /// Adapter over a symbol record
    type SymInfo<'a>: SymbolInfo
    where
        Self: 'a;
    /// Adapter over a type record
    type TypeInfo<'a>: SymbolInfo
    where
        Self: 'a;

    /// Scope over all symbols of one hashed heap.
    fn set_symbol_scope(&self, heap: SymbolHeapId) -> Result<Self::SymbolScope>;

    /// Scope over every global symbol, the input of the session's name indices.
    fn set_global_symbol_scope(&self) -> Result<Self::SymbolScope>
    {
        self.set_symbol_scope(SymbolHeapId::Global)
    }

    /// Scope over the symbols of one compiland (1-based).
    fn set_compiland_symbol_scope(&self, compiland: u16) -> Result<Self::SymbolScope>;

    /// Scope over the children of a function, thunk, block or with symbol.
    fn set_child_symbol_scope(&self, handle: Self::SymHandle) -> Result<Self::SymbolScope>;

    /// Next symbol of a scope, with references already followed.
    fn next_symbol(&self, scope: &mut Self::SymbolScope) -> Option<Self::SymHandle>;

    /// Release a scope. Nothing to do for either backend.
    fn end_symbol_scope(&self, _scope: Self::SymbolScope) {}

    /// Start a by-name search in a heap.
    ///
    /// ## Errors
    ///
    /// `NotFound` if no symbol of that name exists in the heap.
    fn find_first_symbol(&self, heap: SymbolHeapId, name: &[u8]) -> Result<Self::NamedSearch>;

    /// Advance a by-name search to the next match.
    ///
    /// ## Errors
    ///
    /// `NotFound` when there are no further matches.
    fn find_next_symbol(&self, search: &mut Self::NamedSearch) -> Result<()>;

    /// Symbol the search currently points at.
    fn current_symbol(&self, search: &Self::NamedSearch) -> Result<Self::SymHandle>;

    /// Symbol of a heap whose start is the closest at or before the address.
    ///
    /// ## Returns
    ///
    /// The symbol and the distance of `offset` from its start.
    fn find_symbol(&self, heap: SymbolHeapId, segment: u16, offset: u32) -> Result<(Self::SymHandle, u32)>;

    fn symbol_info(&self, handle: Self::SymHandle) -> Result<Self::SymInfo<'_>>;

    /// Raw bytes of a symbol record.
    fn symbol_bytes(&self, handle: Self::SymHandle) -> Result<&[u8]>;

    /// Scope over every type record.
    fn set_global_type_scope(&self) -> Result<Self::TypeScope>;

    /// Scope over the fields of a field list or the entries of a method list.
    fn set_child_type_scope(&self, handle: Self::TypeHandle) -> Result<Self::TypeScope>;

    fn next_type(&self, scope: &mut Self::TypeScope) -> Option<Self::TypeHandle>;

    fn end_type_scope(&self, _scope: Self::TypeScope) {}

    /// Handle for a type index, `None` for index 0 or an unknown index.
    fn type_from_type_index(&self, index: TypeIndex) -> Option<Self::TypeHandle>;

    fn type_info(&self, handle: Self::TypeHandle) -> Result<Self::TypeInfo<'_>>;

    /// Raw bytes of a type record or field.
    fn type_bytes(&self, handle: Self::TypeHandle) -> Result<&[u8]>;

    fn compiland_count(&self) -> Result<u16>;

    /// Summary of compiland `index` (1-based).
    fn compiland_info(&self, index: u16) -> Result<CompilandInfo>;

    /// Code segments the compiland contributes to.
    fn compiland_segment_info(&self, index: u16) -> Result<Vec<SegmentInfo>>;

    /// Summary of source file `file` (0-based) of a compiland.
    fn file_info(&self, compiland: u16, file: u16) -> Result<FileInfo>;

    /// Segment instances a source file has lines in.
    fn file_segment_info(&self, compiland: u16, file: u16) -> Result<Vec<SegmentInfo>>;

    /// Line table of one segment instance of a source file.
    fn line_info(&self, compiland: u16, file: u16, segment_instance: u16) -> Result<Vec<LineInfo>>;

    /// Line table of one segment instance with its address range.
    fn file_segment(&self, compiland: u16, file: u16, segment_instance: u16) -> Option<FileSegmentInfo>;

    /// Line whose code covers the address.
    fn find_line(&self, segment: u16, offset: u32) -> Option<LineNumber>;

    /// Line closest at or after `line` in a source file.
    fn find_line_by_num(&self, compiland: u16, file: u16, line: u16) -> Option<LineNumber>;

    /// Every line entry a by-number search yields, best match first.
    fn find_lines_by_num(&self, compiland: u16, file: u16, line: u16) -> Vec<LineNumber>
    {
        self.find_line_by_num(compiland, file, line).into_iter().collect()
    }

    /// Line entries of all files matching `file_name` that overlap
    /// `[start_line, end_line]`.
    fn find_lines(&self, exact: bool, file_name: &[u8], start_line: u16, end_line: u16) -> Vec<LineNumber>;
}
