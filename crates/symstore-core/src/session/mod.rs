//! # Session
//!
//! The facade a consumer queries: one [`DebugStore`] plus the [`AddressMap`]
//! of the image it describes.
//!
//! On top of the store's cursors a session adds:
//!
//! - address translation relative to a settable load address
//! - a bounded cache of address-to-symbol answers ([`AddressCache`])
//! - name indices over the global symbols ([`NameIndex`]), built on first use
//!
//! A session mutates its caches in place and is meant to be driven from a
//! single thread. Open one session per thread if several are needed; they
//! share the store and the address map.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut session = source.open_session();
//! session.set_load_address(Address::new(0x40_0000));
//! let (function, delta) = session.find_outer_symbol_by_va(SymbolHeapId::Global, Address::new(0x40_1110))?;
//! ```

pub mod cache;
pub mod names;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

pub use cache::{AddressCache, DEFAULT_ADDRESS_CACHE_BUCKETS, DEFAULT_ADDRESS_CACHE_CAPACITY};
pub use names::{DebugHelper, ModuleSet, NameIndex};

use crate::address_map::AddressMap;
use crate::demangle;
use crate::error::{Result, SymbolError};
use crate::info::SymbolInfo;
use crate::store::DebugStore;
use crate::types::{Address, CompilandInfo, DataKind, LineNumber, SymTag, SymbolHeapId};

/// Default bound on the nesting depth [`Session::find_innermost_symbol`] follows.
pub const DEFAULT_INNERMOST_DEPTH_LIMIT: usize = 65535;

/// Tunables of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig
{
    /// Total number of cached address lookups
    pub address_cache_capacity: usize,
    /// Number of buckets the cached lookups are spread over
    pub address_cache_buckets: usize,
    /// Maximum number of scope levels descended below a function
    pub innermost_depth_limit: usize,
}

impl Default for SessionConfig
{
    fn default() -> Self
    {
        Self {
            address_cache_capacity: DEFAULT_ADDRESS_CACHE_CAPACITY,
            address_cache_buckets: DEFAULT_ADDRESS_CACHE_BUCKETS,
            innermost_depth_limit: DEFAULT_INNERMOST_DEPTH_LIMIT,
        }
    }
}

/// A store and an address map, with caches.
pub struct Session<S: DebugStore>
{
    store: Arc<S>,
    address_map: Arc<AddressMap>,
    load_address: Address,
    config: SessionConfig,
    cache: AddressCache<S::SymHandle>,
    names: Option<NameIndex<S::SymHandle>>,
}

impl<S: DebugStore> fmt::Debug for Session<S>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Session")
            .field("load_address", &self.load_address)
            .field("sections", &self.address_map.section_count())
            .field("cached_addresses", &self.cache.len())
            .field("names_indexed", &self.names.is_some())
            .finish_non_exhaustive()
    }
}

fn is_scope_symbol(tag: SymTag) -> bool
{
    matches!(tag, SymTag::Function | SymTag::Block | SymTag::Thunk)
}

fn contains(start: u32, length: u64, offset: u32) -> bool
{
    offset >= start && u64::from(offset - start) < length
}

impl<S: DebugStore> Session<S>
{
    pub fn new(store: Arc<S>, address_map: Arc<AddressMap>) -> Self
    {
        Self::with_config(store, address_map, SessionConfig::default())
    }

    pub fn with_config(store: Arc<S>, address_map: Arc<AddressMap>, config: SessionConfig) -> Self
    {
        Self {
            store,
            address_map,
            load_address: Address::ZERO,
            config,
            cache: AddressCache::new(config.address_cache_capacity, config.address_cache_buckets),
            names: None,
        }
    }

    pub fn store(&self) -> &S
    {
        &self.store
    }

    pub fn address_map(&self) -> &AddressMap
    {
        &self.address_map
    }

    pub fn config(&self) -> &SessionConfig
    {
        &self.config
    }

    pub fn load_address(&self) -> Address
    {
        self.load_address
    }

    /// Base the image was actually loaded at. Only VA translations change.
    pub fn set_load_address(&mut self, address: Address)
    {
        self.load_address = address;
    }

    // ---- address translation ----

    pub fn rva_from_sec_offset(&self, segment: u16, offset: u32) -> Option<u32>
    {
        self.address_map.map_sec_offset_to_rva(segment, offset)
    }

    /// Virtual address of a section offset, or zero if the section is unknown.
    pub fn va_from_sec_offset(&self, segment: u16, offset: u32) -> Address
    {
        match self.rva_from_sec_offset(segment, offset) {
            Some(rva) => self.load_address + u64::from(rva),
            None => Address::ZERO,
        }
    }

    /// Section and offset of an RVA. `None` stands for section 0.
    pub fn sec_offset_from_rva(&self, rva: u32) -> Option<(u16, u32)>
    {
        self.address_map.map_rva_to_sec_offset(rva)
    }

    /// Section and offset of a virtual address.
    ///
    /// Addresses below the load address, or more than 4 GiB above it, are in
    /// no section.
    pub fn sec_offset_from_va(&self, va: Address) -> Option<(u16, u32)>
    {
        va.rva_from(self.load_address).and_then(|rva| self.sec_offset_from_rva(rva))
    }

    // ---- navigation ----

    pub fn symbol_info(&self, handle: S::SymHandle) -> Result<S::SymInfo<'_>>
    {
        self.store.symbol_info(handle)
    }

    pub fn type_info(&self, handle: S::TypeHandle) -> Result<S::TypeInfo<'_>>
    {
        self.store.type_info(handle)
    }

    /// Child of a scoping symbol with exactly this name.
    ///
    /// ## Errors
    ///
    /// `NotFound` if no child has the name.
    pub fn find_child_symbol(&self, parent: S::SymHandle, name: &[u8]) -> Result<S::SymHandle>
    {
        let mut scope = self.store.set_child_symbol_scope(parent)?;
        let mut found = None;

        while let Some(child) = self.store.next_symbol(&mut scope) {
            if self.store.symbol_info(child)?.name() == Some(name) {
                found = Some(child);
                break;
            }
        }

        self.store.end_symbol_scope(scope);
        found.ok_or_else(|| SymbolError::NotFound(format!("child symbol {}", String::from_utf8_lossy(name))))
    }

    /// Member of a type with exactly this name.
    ///
    /// `parent` may be an aggregate, whose field list is searched, or a field
    /// list itself.
    ///
    /// ## Errors
    ///
    /// `NotFound` if no member has the name.
    pub fn find_child_type(&self, parent: S::TypeHandle, name: &[u8]) -> Result<S::TypeHandle>
    {
        let info = self.store.type_info(parent)?;
        let field_list = match info.sym_tag() {
            SymTag::Udt | SymTag::Enum => info.field_list().and_then(|index| self.store.type_from_type_index(index)),
            _ => None,
        }
        .unwrap_or(parent);

        let mut scope = self.store.set_child_type_scope(field_list)?;
        let mut found = None;

        while let Some(child) = self.store.next_type(&mut scope) {
            if self.store.type_info(child)?.name() == Some(name) {
                found = Some(child);
                break;
            }
        }

        self.store.end_type_scope(scope);
        found.ok_or_else(|| SymbolError::NotFound(format!("member {}", String::from_utf8_lossy(name))))
    }

    /// Symbol of a heap closest at or before a section offset.
    ///
    /// ## Returns
    ///
    /// The symbol and the distance of `offset` from its start.
    pub fn find_outer_symbol_by_addr(
        &mut self,
        heap: SymbolHeapId,
        segment: u16,
        offset: u32,
    ) -> Result<(S::SymHandle, u32)>
    {
        if let Some(hit) = self.cache.get(heap, segment, offset) {
            return Ok(hit);
        }

        let (handle, symbol_offset) = self.store.find_symbol(heap, segment, offset)?;
        self.cache.insert(heap, segment, offset, handle, symbol_offset);
        Ok((handle, symbol_offset))
    }

    pub fn find_outer_symbol_by_rva(&mut self, heap: SymbolHeapId, rva: u32) -> Result<(S::SymHandle, u32)>
    {
        let (segment, offset) = self
            .sec_offset_from_rva(rva)
            .ok_or_else(|| SymbolError::NotFound(format!("no section at rva {rva:#x}")))?;
        self.find_outer_symbol_by_addr(heap, segment, offset)
    }

    pub fn find_outer_symbol_by_va(&mut self, heap: SymbolHeapId, va: Address) -> Result<(S::SymHandle, u32)>
    {
        let (segment, offset) = self
            .sec_offset_from_va(va)
            .ok_or_else(|| SymbolError::NotFound(format!("no section at {va}")))?;
        self.find_outer_symbol_by_addr(heap, segment, offset)
    }

    /// Chain of nested scopes covering an address, outermost first.
    ///
    /// The chain starts with `function` itself and descends through blocks,
    /// nested functions and thunks whose range contains `offset`.
    ///
    /// ## Errors
    ///
    /// `NotFound` if the function is in another segment.
    pub fn find_innermost_symbol(&self, function: S::SymHandle, segment: u16, offset: u32) -> Result<Vec<S::SymHandle>>
    {
        if self.store.symbol_info(function)?.address_segment() != Some(segment) {
            return Err(SymbolError::NotFound(format!("function is not in segment {segment}")));
        }

        let mut chain = vec![function];
        let mut current = function;

        for _ in 0..self.config.innermost_depth_limit {
            let Ok(mut scope) = self.store.set_child_symbol_scope(current) else {
                break;
            };

            let mut inner = None;
            while let Some(child) = self.store.next_symbol(&mut scope) {
                let info = self.store.symbol_info(child)?;
                if !is_scope_symbol(info.sym_tag()) || info.address_segment() != Some(segment) {
                    continue;
                }
                if let (Some(start), Some(length)) = (info.address_offset(), info.length()) {
                    if contains(start, length, offset) {
                        inner = Some(child);
                        break;
                    }
                }
            }
            self.store.end_symbol_scope(scope);

            match inner {
                Some(child) => {
                    chain.push(child);
                    current = child;
                }
                None => break,
            }
        }

        Ok(chain)
    }

    /// Address of a global name, searching the global, static and public
    /// heaps in that order.
    ///
    /// `accept` can reject candidates, for example public symbols that merely
    /// share a data symbol's name.
    pub fn find_global_symbol_address<P>(
        &self,
        name: &[u8],
        mut accept: P,
    ) -> Option<(SymbolHeapId, S::SymHandle, Address)>
    where
        P: FnMut(&dyn SymbolInfo) -> bool,
    {
        for heap in SymbolHeapId::ALL {
            let Ok(mut search) = self.store.find_first_symbol(heap, name) else {
                continue;
            };

            loop {
                if let Ok(handle) = self.store.current_symbol(&search) {
                    if let Ok(info) = self.store.symbol_info(handle) {
                        if let (Some(segment), Some(offset)) = (info.address_segment(), info.address_offset()) {
                            if accept(&info) {
                                return Some((heap, handle, self.va_from_sec_offset(segment, offset)));
                            }
                        }
                    }
                }

                if self.store.find_next_symbol(&mut search).is_err() {
                    break;
                }
            }
        }

        None
    }

    /// Symbol name for display, demangled where it is a mangled Rust name.
    pub fn display_name(&self, handle: S::SymHandle) -> Result<String>
    {
        let info = self.store.symbol_info(handle)?;
        Ok(info.name().map(|name| demangle::display_name(name).into_owned()).unwrap_or_default())
    }

    // ---- lines and compilands ----

    pub fn find_line(&self, segment: u16, offset: u32) -> Option<LineNumber>
    {
        self.store.find_line(segment, offset)
    }

    pub fn find_line_by_num(&self, compiland: u16, file: u16, line: u16) -> Option<LineNumber>
    {
        self.store.find_line_by_num(compiland, file, line)
    }

    pub fn find_lines(&self, exact: bool, file_name: &[u8], start_line: u16, end_line: u16) -> Vec<LineNumber>
    {
        self.store.find_lines(exact, file_name, start_line, end_line)
    }

    pub fn compiland_count(&self) -> Result<u16>
    {
        self.store.compiland_count()
    }

    pub fn compiland_info(&self, index: u16) -> Result<CompilandInfo>
    {
        self.store.compiland_info(index)
    }

    // ---- name indices ----

    fn names(&mut self) -> Result<&NameIndex<S::SymHandle>>
    {
        if self.names.is_none() {
            self.names = Some(build_name_index(self.store.as_ref())?);
        }
        Ok(self.names.get_or_insert_with(NameIndex::new))
    }

    /// Short name of a fully qualified type name.
    pub fn find_udt_short_name(&mut self, long_name: &[u8]) -> Result<&[u8]>
    {
        self.names()?
            .udt_short_name(long_name)
            .ok_or_else(|| SymbolError::NotFound(format!("type {}", String::from_utf8_lossy(long_name))))
    }

    /// The fully qualified type name a short name stands for.
    ///
    /// ## Errors
    ///
    /// `Ambiguous` if several types share the short name.
    pub fn find_udt_long_name(&mut self, short_name: &[u8]) -> Result<&[u8]>
    {
        self.names()?.udt_long_name(short_name)
    }

    /// Short name of a fully qualified function name.
    pub fn find_func_short_name(&mut self, long_name: &[u8]) -> Result<&[u8]>
    {
        self.names()?
            .func_short_name(long_name)
            .ok_or_else(|| SymbolError::NotFound(format!("function {}", String::from_utf8_lossy(long_name))))
    }

    /// Global variables whose qualified name ends in `.name`.
    pub fn find_matching_globals(&mut self, name: &[u8]) -> Result<Vec<S::SymHandle>>
    {
        Ok(self.names()?.matching_globals(name))
    }

    /// Debug helper functions of the types named `type_name` or ending in
    /// `.type_name`.
    pub fn find_matching_debug_funcs(&mut self, type_name: &[u8]) -> Result<Vec<(DebugHelper, S::SymHandle)>>
    {
        Ok(self.names()?.matching_debug_funcs(type_name))
    }

    /// The outermost module prefixes seen among global names.
    pub fn module_names(&mut self) -> Result<Vec<Vec<u8>>>
    {
        Ok(self.names()?.modules().iter().map(<[u8]>::to_vec).collect())
    }
}

/// Scan every global symbol once and index its name.
fn build_name_index<S: DebugStore>(store: &S) -> Result<NameIndex<S::SymHandle>>
{
    let mut index = NameIndex::new();
    let mut scope = store.set_global_symbol_scope()?;

    while let Some(handle) = store.next_symbol(&mut scope) {
        let Ok(info) = store.symbol_info(handle) else {
            continue;
        };
        let Some(name) = info.name() else {
            continue;
        };

        match info.sym_tag() {
            SymTag::Function => index.add_function(name, handle),
            SymTag::Udt | SymTag::Enum | SymTag::Typedef => index.add_udt(name),
            SymTag::Data => {
                if matches!(
                    info.data_kind(),
                    Some(DataKind::FileStatic | DataKind::Global | DataKind::StaticLocal)
                ) {
                    index.add_global(name, handle);
                }
            }
            _ => {}
        }
    }
    store.end_symbol_scope(scope);
    index.finish();

    debug!(
        functions = index.function_count(),
        types = index.udt_count(),
        globals = index.global_count(),
        debug_helpers = index.debug_func_count(),
        modules = index.modules().len(),
        "built name indices"
    );
    Ok(index)
}
