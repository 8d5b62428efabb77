//! # CodeView Store
//!
//! [`CodeViewStore`] owns an NB09 debug-info blob and serves every
//! [`DebugStore`] query by reading it in place.
//!
//! ## Layout
//!
//! ```text
//! "NB09" lfoDir ... DirHeader DirEntry[cDir] ... subsections
//! ```
//!
//! `init_debug_info` validates the signature and every directory entry, then
//! sorts the entries into per-compiland slots (module header, symbols,
//! source lines), the three hashed symbol heaps and the global type table.
//! Nothing is copied out of the blob; handles and scopes are offsets into it.

use std::sync::Arc;

use tracing::{debug, warn};

use super::constants::*;
use super::hash::{name_hash, Bucket, HashTable, SymbolHeap};
use super::lines::{ModuleHeader, SourceModule};
use super::reader::ByteReader;
use super::symbols::{record_at, record_name, CvSymbol};
use super::types::{field_length, method_list_entry_length, CvTypeInfo};
use crate::error::{Result, SymbolError};
use crate::line_search::{
    closest_line_index, exact_file_name_match, find_offset_index, line_number_from_segment, partial_file_name_match,
};
use crate::store::DebugStore;
use crate::types::{
    CompilandInfo, FileInfo, FileSegmentInfo, LineInfo, LineNumber, SegmentInfo, SymbolHeapId, TypeIndex,
    FIRST_RECORD_TYPE_INDEX,
};

/// Size of a directory header.
const DIR_HEADER_LEN: usize = 16;
/// Smallest usable directory entry.
const DIR_ENTRY_LEN: usize = 12;
/// Bytes of a scope-bearing record up to and including its end offset.
const SCOPE_RECORD_MIN_LEN: u16 = 10;
/// Modifier records stripped before giving up on a chain.
const MAX_MODIFIER_DEPTH: usize = 32;

/// One entry of the subsection directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirEntry
{
    subsection: u16,
    module: u16,
    offset: u32,
    size: u32,
}

impl DirEntry
{
    fn read(reader: &ByteReader<'_>, at: usize) -> Result<Self>
    {
        let entry = Self {
            subsection: reader.u16_at(at)?,
            module: reader.u16_at(at + 2)?,
            offset: reader.u32_at(at + 4)?,
            size: reader.u32_at(at + 8)?,
        };
        if entry.offset > i32::MAX as u32 {
            return Err(SymbolError::Format(format!("directory entry at {at:#x} has a negative offset")));
        }
        reader.check(entry.offset as usize, entry.size as usize)?;
        Ok(entry)
    }

    const fn start(&self) -> usize
    {
        self.offset as usize
    }

    const fn end(&self) -> usize
    {
        self.offset as usize + self.size as usize
    }
}

/// Subsections belonging to one compiland.
#[derive(Debug, Clone, Copy)]
struct Compiland
{
    module: DirEntry,
    symbols: Option<DirEntry>,
    source: Option<DirEntry>,
}

/// Location of the global type table.
#[derive(Debug, Clone, Copy)]
struct TypeTable
{
    /// Offset of the `offsets[count]` array
    offsets: usize,
    count: u32,
    /// Record offsets are relative to this position
    base: usize,
}

/// Everything `init_debug_info` learned about the blob.
#[derive(Debug)]
struct Layout
{
    entry_count: usize,
    compilands: Vec<Compiland>,
    heaps: [Option<SymbolHeap>; 3],
    types: Option<TypeTable>,
}

/// Identifies a symbol record: its offset and the base its scope offsets are
/// relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CvSymHandle
{
    record: u32,
    heap_base: u32,
}

impl CvSymHandle
{
    /// Buffer offset of the record.
    pub const fn record_offset(&self) -> u32
    {
        self.record
    }
}

/// Identifies a type record, a field, a method list entry or a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CvTypeHandle
{
    index: u16,
    record: Option<u32>,
    tag: u16,
}

impl CvTypeHandle
{
    /// Type index; fields and method list entries report `0xffff`.
    pub const fn index(&self) -> u16
    {
        self.index
    }

    /// Leaf id the handle is dispatched on; 0 for primitives.
    pub const fn tag(&self) -> u16
    {
        self.tag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvSymbolScope
{
    current: usize,
    limit: usize,
    heap_base: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeScopeKind
{
    Global,
    FieldList,
    MethodList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvTypeScope
{
    kind: TypeScopeKind,
    current: usize,
    limit: usize,
    position: u32,
    count: u32,
    /// `LF_INDEX` continuations followed so far
    hops: u32,
}

/// State of a by-name search over one heap's name hash table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvNamedSearch
{
    name: Vec<u8>,
    hash: u32,
    heap: SymbolHeapId,
    bucket: Bucket,
    /// Index of the pair the current symbol came from
    pair: u32,
    current: CvSymHandle,
}

/// Debug store over an NB09 CodeView blob.
///
/// ## Example
///
/// ```rust,ignore
/// let mut store = CodeViewStore::new();
/// store.init_debug_info(bytes)?;
/// let search = store.find_first_symbol(SymbolHeapId::Global, b"main")?;
/// let info = store.symbol_info(store.current_symbol(&search)?)?;
/// ```
#[derive(Debug, Default)]
pub struct CodeViewStore
{
    data: Arc<[u8]>,
    layout: Option<Layout>,
    tls_segment: u16,
}

impl CodeViewStore
{
    /// An uninitialized store; every query fails until
    /// [`CodeViewStore::init_debug_info`] succeeds.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Parse and take ownership of a blob in one step.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self>
    {
        let mut store = Self::new();
        store.init_debug_info(data)?;
        Ok(store)
    }

    /// Validate the blob's signature and directory and index its subsections.
    ///
    /// ## Errors
    ///
    /// - `AlreadyInitialized` if a previous call succeeded
    /// - `InvalidArgument` for an empty buffer
    /// - `Format` for a bad signature, an out-of-bounds directory entry or
    ///   subsection, or a compiland reference to a module that does not exist
    ///
    /// On error the store stays uninitialized.
    pub fn init_debug_info(&mut self, data: impl Into<Arc<[u8]>>) -> Result<()>
    {
        if self.layout.is_some() {
            return Err(SymbolError::AlreadyInitialized);
        }

        let data: Arc<[u8]> = data.into();
        if data.is_empty() {
            return Err(SymbolError::InvalidArgument("empty debug info buffer".to_string()));
        }

        match parse_layout(&ByteReader::new(&data)) {
            Ok(layout) => {
                debug!(
                    entries = layout.entry_count,
                    compilands = layout.compilands.len(),
                    has_types = layout.types.is_some(),
                    "CodeView debug info initialized"
                );
                self.data = data;
                self.layout = Some(layout);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, size = data.len(), "rejected CodeView debug info");
                Err(err)
            }
        }
    }

    pub fn is_initialized(&self) -> bool
    {
        self.layout.is_some()
    }

    /// 1-based index of the thread-local storage section, 0 for none.
    pub fn set_tls_segment(&mut self, segment: u16)
    {
        self.tls_segment = segment;
    }

    pub fn tls_segment(&self) -> u16
    {
        self.tls_segment
    }

    fn reader(&self) -> ByteReader<'_>
    {
        ByteReader::new(&self.data)
    }

    fn layout(&self) -> Result<&Layout>
    {
        self.layout.as_ref().ok_or(SymbolError::NotInitialized)
    }

    fn heap(&self, heap: SymbolHeapId) -> Result<SymbolHeap>
    {
        self.layout()?.heaps[heap.index()].ok_or_else(|| SymbolError::NotFound(format!("no {heap} symbol heap")))
    }

    fn compiland(&self, index: u16) -> Result<Compiland>
    {
        let layout = self.layout()?;
        usize::from(index)
            .checked_sub(1)
            .and_then(|z| layout.compilands.get(z))
            .copied()
            .ok_or_else(|| {
                SymbolError::InvalidArgument(format!(
                    "compiland {index} out of range ({} compilands)",
                    layout.compilands.len()
                ))
            })
    }

    fn source_module(&self, index: u16) -> Result<SourceModule<'_>>
    {
        let entry = self
            .compiland(index)?
            .source
            .ok_or_else(|| SymbolError::InvalidArgument(format!("compiland {index} has no line information")))?;
        SourceModule::read(self.reader(), entry.start())
    }

    /// Resolve a `PROCREF`/`DATAREF` record to the definition it points at.
    ///
    /// Returns `None` for records of other kinds and for references that do
    /// not resolve to a record inside the target compiland's symbols.
    fn follow_reference(&self, record: usize) -> Option<CvSymHandle>
    {
        let reader = self.reader();
        let id = reader.u16_at(record + 2).ok()?;
        if !is_reference_symbol(id) {
            return None;
        }

        let target_offset = reader.u32_at(record + 8).ok()?;
        let module = reader.u16_at(record + 12).ok()?;
        let entry = self.compiland(module).ok()?.symbols?;
        if target_offset >= entry.size {
            return None;
        }

        let target = entry.start() + target_offset as usize;
        reader.check(target, 4).ok()?;
        Some(CvSymHandle {
            record: target as u32,
            heap_base: entry.offset,
        })
    }

    /// Handle for the hash table entry at `symbol_offset`, following a
    /// reference if it is one.
    ///
    /// When `name` is given the record's name must equal it byte for byte;
    /// for a reference, the hash it records must also equal `hash`.
    fn resolve_hashed_symbol(
        &self,
        heap: &SymbolHeap,
        symbol_offset: u32,
        name: Option<(&[u8], u32)>,
    ) -> Option<CvSymHandle>
    {
        let reader = self.reader();
        let record = heap.symbols_start() + symbol_offset as usize;
        reader.check(record, 4).ok()?;
        let id = reader.u16_at(record + 2).ok()?;

        let handle = if is_reference_symbol(id) {
            if let Some((_, hash)) = name {
                if reader.u32_at(record + 4).ok()? != hash {
                    return None;
                }
            }
            self.follow_reference(record)?
        } else {
            CvSymHandle {
                record: record as u32,
                heap_base: heap.symbols_start() as u32,
            }
        };

        if let Some((expected, _)) = name {
            let rec = record_at(&reader, handle.record as usize).ok()?;
            if record_name(&rec).ok()?? != expected {
                return None;
            }
        }

        Some(handle)
    }

    /// Scan a named search's bucket from pair `start` for the next symbol
    /// whose hash and name match.
    fn scan_bucket(&self, search: &CvNamedSearch, start: u32) -> Result<Option<(u32, CvSymHandle)>>
    {
        let heap = self.heap(search.heap)?;
        let table = HashTable::new(self.reader(), heap.name_table_start())?;

        for i in start..search.bucket.count {
            let pair = table.pair(search.bucket, i)?;
            if pair.value != search.hash {
                continue;
            }
            if let Some(handle) = self.resolve_hashed_symbol(&heap, pair.symbol_offset, Some((&search.name, search.hash)))
            {
                return Ok(Some((i, handle)));
            }
        }

        Ok(None)
    }

    fn type_table(&self) -> Result<TypeTable>
    {
        self.layout()?.types.ok_or_else(|| SymbolError::NotFound("no global types".to_string()))
    }

    fn type_record_offset(&self, table: &TypeTable, z: u32) -> Result<usize>
    {
        let offset = self.reader().u32_at(table.offsets + 4 * z as usize)?;
        Ok(table.base + offset as usize)
    }

    /// Read one field of a field list scope, hopping `LF_INDEX` continuations.
    fn next_field(&self, scope: &mut CvTypeScope) -> Option<CvTypeHandle>
    {
        let reader = self.reader();
        let mut hopped = false;

        loop {
            if scope.current >= scope.limit {
                return None;
            }
            let lead = reader.u8_at(scope.current).ok()?;
            if lead >= LF_PAD0 {
                scope.current += usize::from(lead - LF_PAD0);
            }
            if scope.current + 1 >= scope.limit {
                return None;
            }

            let id = reader.u16_at(scope.current).ok()?;
            if id == 0 {
                return None;
            }

            if id == LF_INDEX {
                // a chain longer than the type table must revisit a field list
                let max_hops = self.type_table().map_or(0, |table| table.count);
                if hopped || scope.hops >= max_hops {
                    scope.limit = scope.current;
                    return None;
                }
                scope.hops += 1;
                let next = reader.u16_at(scope.current + 2).ok()?;
                let handle = self.type_from_type_index(TypeIndex::from(next))?;
                let record = handle.record? as usize;
                if handle.tag != LF_FIELDLIST {
                    return None;
                }
                let len = usize::from(reader.u16_at(record).ok()?);
                scope.current = record + 4;
                scope.limit = record + len + 2;
                hopped = true;
                continue;
            }

            let Ok(len) = field_length(&reader, scope.current) else {
                scope.current = scope.limit;
                return None;
            };
            let handle = CvTypeHandle {
                index: FIELD_TYPE_INDEX,
                record: Some(scope.current as u32),
                tag: id,
            };
            scope.current += len;
            return Some(handle);
        }
    }

    /// The segment instance of a file whose line numbers best match `line`.
    pub fn find_compiland_file_segment_by_line(&self, line: u16, compiland: u16, file: u16)
        -> Option<FileSegmentInfo>
    {
        let module = self.source_module(compiland).ok()?;
        module.file(file).ok()?.find_segment_for_line(line).ok()?
    }

    /// The compiland, file and segment instance whose line table covers an
    /// address.
    pub fn find_compiland_file_segment_by_addr(&self, segment: u16, offset: u32)
        -> Option<(u16, u16, FileSegmentInfo)>
    {
        let layout = self.layout().ok()?;
        let reader = self.reader();

        for (z, compiland) in layout.compilands.iter().enumerate() {
            let Some(source) = compiland.source else {
                continue;
            };
            let Ok(module) = ModuleHeader::read(&reader, compiland.module.start()) else {
                continue;
            };
            if !module.contains(segment, offset) {
                continue;
            }
            let Ok(source) = SourceModule::read(reader, source.start()) else {
                continue;
            };
            if let Ok(Some((file, seg))) = source.find_file_segment(segment, offset) {
                return Some((z as u16 + 1, file, seg));
            }
        }

        None
    }
}

fn parse_layout(reader: &ByteReader<'_>) -> Result<Layout>
{
    let signature = reader.slice_at(0, SIGNATURE_LEN).map_err(|_| {
        SymbolError::Format(format!("debug info shorter than its {SIGNATURE_LEN}-byte signature"))
    })?;
    if &signature[..4] != NB09_SIGNATURE {
        return Err(SymbolError::Format(format!("bad signature {:?}", String::from_utf8_lossy(&signature[..4]))));
    }

    let dir = reader.i32_at(4)?;
    let dir = usize::try_from(dir).map_err(|_| SymbolError::Format(format!("negative directory offset {dir}")))?;
    reader.check(dir, DIR_HEADER_LEN)?;
    let header_len = usize::from(reader.u16_at(dir)?);
    let entry_len = usize::from(reader.u16_at(dir + 2)?);
    let entry_count = reader.u32_at(dir + 4)? as usize;

    if entry_len < DIR_ENTRY_LEN {
        return Err(SymbolError::Format(format!("directory entry size {entry_len} is too small")));
    }
    let first = dir + header_len;
    reader.check(first, entry_count.saturating_mul(entry_len))?;

    let entries = (0..entry_count)
        .map(|z| DirEntry::read(reader, first + z * entry_len))
        .collect::<Result<Vec<_>>>()?;

    let mut compilands: Vec<Compiland> = entries
        .iter()
        .filter(|entry| entry.subsection == SST_MODULE)
        .map(|&module| Compiland {
            module,
            symbols: None,
            source: None,
        })
        .collect();
    if compilands.len() > usize::from(u16::MAX) {
        return Err(SymbolError::Format(format!("too many compilands ({})", compilands.len())));
    }

    let mut heaps: [Option<SymbolHeap>; 3] = [None; 3];
    let mut types = None;

    for entry in &entries {
        match entry.subsection {
            SST_ALIGN_SYM | SST_SRC_MODULE => {
                let count = compilands.len();
                let compiland = usize::from(entry.module)
                    .checked_sub(1)
                    .and_then(|z| compilands.get_mut(z))
                    .ok_or_else(|| {
                        SymbolError::Format(format!(
                            "subsection {:#x} names module {} of {count}",
                            entry.subsection, entry.module
                        ))
                    })?;
                if entry.subsection == SST_ALIGN_SYM {
                    compiland.symbols = Some(*entry);
                } else {
                    compiland.source = Some(*entry);
                }
            }
            SST_GLOBAL_SYM => heaps[SymbolHeapId::Global.index()] = Some(read_heap(reader, entry)?),
            SST_STATIC_SYM => heaps[SymbolHeapId::Static.index()] = Some(read_heap(reader, entry)?),
            SST_GLOBAL_PUB => heaps[SymbolHeapId::Public.index()] = Some(read_heap(reader, entry)?),
            SST_GLOBAL_TYPES => types = Some(read_type_table(reader, entry)?),
            _ => {}
        }
    }

    Ok(Layout {
        entry_count,
        compilands,
        heaps,
        types,
    })
}

fn read_heap(reader: &ByteReader<'_>, entry: &DirEntry) -> Result<SymbolHeap>
{
    let heap = SymbolHeap::read(reader, entry.start(), entry.size as usize)?;
    if heap.symbols_end() > entry.end() {
        return Err(SymbolError::Format(format!("symbols of heap at {:#x} overrun the subsection", entry.offset)));
    }
    Ok(heap)
}

fn read_type_table(reader: &ByteReader<'_>, entry: &DirEntry) -> Result<TypeTable>
{
    let count = reader.u32_at(entry.start() + 4)?;
    let offsets = entry.start() + 8;
    let len = (count as usize)
        .checked_mul(4)
        .ok_or_else(|| SymbolError::Format(format!("type count {count} overflows")))?;
    reader.check(offsets, len)?;

    Ok(TypeTable {
        offsets,
        count,
        base: offsets + len,
    })
}

impl DebugStore for CodeViewStore
{
    type SymHandle = CvSymHandle;
    type TypeHandle = CvTypeHandle;
    type SymbolScope = CvSymbolScope;
    type TypeScope = CvTypeScope;
    type NamedSearch = CvNamedSearch;
    type SymInfo<'a> = CvSymbol<'a>;
    type TypeInfo<'a> = CvTypeInfo<'a>;

    fn set_symbol_scope(&self, heap: SymbolHeapId) -> Result<CvSymbolScope>
    {
        let heap = self.heap(heap)?;
        Ok(CvSymbolScope {
            current: heap.symbols_start(),
            limit: heap.symbols_end(),
            heap_base: heap.symbols_start(),
        })
    }

    fn set_compiland_symbol_scope(&self, compiland: u16) -> Result<CvSymbolScope>
    {
        let entry = self
            .compiland(compiland)?
            .symbols
            .ok_or_else(|| SymbolError::NotFound(format!("compiland {compiland} has no symbols")))?;

        // skip the 4-byte signature at the start of the subsection
        Ok(CvSymbolScope {
            current: entry.start() + 4,
            limit: entry.end(),
            heap_base: entry.start(),
        })
    }

    fn set_child_symbol_scope(&self, handle: CvSymHandle) -> Result<CvSymbolScope>
    {
        self.layout()?;
        let reader = self.reader();
        let record = handle.record as usize;
        let len = reader.u16_at(record)?;
        let id = reader.u16_at(record + 2)?;

        if len < SCOPE_RECORD_MIN_LEN || !is_scope_symbol(id) {
            return Err(SymbolError::InvalidArgument(format!("symbol kind {id:#06x} has no children")));
        }
        reader.check(record, usize::from(len) + 2)?;

        let end = reader.u32_at(record + 8)?;
        let limit = handle.heap_base as usize + end as usize;
        reader.check(limit, 4)?;
        if reader.u16_at(limit + 2)? != S_END {
            return Err(SymbolError::Format(format!("scope at {record:#x} does not end with an end record")));
        }

        Ok(CvSymbolScope {
            current: record + usize::from(len) + 2,
            limit,
            heap_base: handle.heap_base as usize,
        })
    }

    fn next_symbol(&self, scope: &mut CvSymbolScope) -> Option<CvSymHandle>
    {
        let reader = self.reader();

        loop {
            if scope.current + 3 >= scope.limit {
                return None;
            }
            let record = scope.current;
            let len = reader.u16_at(record).ok()?;
            let id = reader.u16_at(record + 2).ok()?;
            if len == 0 || id == 0 || !reader.in_bounds(record, usize::from(len) + 2) {
                return None;
            }

            scope.current = if is_scope_symbol(id) && len >= SCOPE_RECORD_MIN_LEN {
                // jump over the children and their end record
                let end = scope.heap_base + reader.u32_at(record + 8).ok()? as usize;
                if end <= record || reader.u16_at(end + 2).ok()? != S_END {
                    scope.current = scope.limit;
                    return None;
                }
                end + usize::from(reader.u16_at(end).ok()?) + 2
            } else {
                record + usize::from(len) + 2
            };

            if is_reference_symbol(id) {
                match self.follow_reference(record) {
                    Some(handle) => return Some(handle),
                    None => continue,
                }
            }

            return Some(CvSymHandle {
                record: record as u32,
                heap_base: scope.heap_base as u32,
            });
        }
    }

    fn find_first_symbol(&self, heap: SymbolHeapId, name: &[u8]) -> Result<CvNamedSearch>
    {
        let heap_info = self.heap(heap)?;
        if heap_info.header.sym_hash != SYM_HASH_NAME {
            return Err(SymbolError::NotFound(format!("{heap} heap has no name hash table")));
        }
        self.reader().check(heap_info.name_table_start(), heap_info.header.cb_hsym as usize)?;

        let hash = name_hash(name);
        let table = HashTable::new(self.reader(), heap_info.name_table_start())?;
        let not_found = || SymbolError::NotFound(format!("{} in {heap} heap", String::from_utf8_lossy(name)));
        let bucket = table.bucket_for_hash(hash)?.ok_or_else(not_found)?;

        let mut search = CvNamedSearch {
            name: name.to_vec(),
            hash,
            heap,
            bucket,
            pair: 0,
            current: CvSymHandle {
                record: 0,
                heap_base: 0,
            },
        };
        let (pair, handle) = self.scan_bucket(&search, 0)?.ok_or_else(not_found)?;
        search.pair = pair;
        search.current = handle;
        Ok(search)
    }

    fn find_next_symbol(&self, search: &mut CvNamedSearch) -> Result<()>
    {
        match self.scan_bucket(search, search.pair + 1)? {
            Some((pair, handle)) => {
                search.pair = pair;
                search.current = handle;
                Ok(())
            }
            None => Err(SymbolError::NotFound(format!(
                "no further {} in {} heap",
                String::from_utf8_lossy(&search.name),
                search.heap
            ))),
        }
    }

    fn current_symbol(&self, search: &CvNamedSearch) -> Result<CvSymHandle>
    {
        Ok(search.current)
    }

    fn find_symbol(&self, heap: SymbolHeapId, segment: u16, offset: u32) -> Result<(CvSymHandle, u32)>
    {
        let heap_info = self.heap(heap)?;
        if heap_info.header.addr_hash != SYM_HASH_ADDR {
            return Err(SymbolError::NotFound(format!("{heap} heap has no address table")));
        }

        let not_found = || SymbolError::NotFound(format!("{segment:#x}:{offset:#x} in {heap} heap"));
        let table = HashTable::new(self.reader(), heap_info.addr_table_start())?;
        let bucket = table.bucket_for_segment(segment)?.ok_or_else(not_found)?;
        let pair = table.closest_preceding(bucket, offset)?.ok_or_else(not_found)?;
        let handle = self.resolve_hashed_symbol(&heap_info, pair.symbol_offset, None).ok_or_else(not_found)?;

        Ok((handle, offset - pair.value))
    }

    fn symbol_info(&self, handle: CvSymHandle) -> Result<CvSymbol<'_>>
    {
        self.layout()?;
        CvSymbol::parse(&self.reader(), handle.record as usize, self.tls_segment)
    }

    fn symbol_bytes(&self, handle: CvSymHandle) -> Result<&[u8]>
    {
        self.layout()?;
        Ok(record_at(&self.reader(), handle.record as usize)?.as_slice())
    }

    fn set_global_type_scope(&self) -> Result<CvTypeScope>
    {
        let table = self.type_table()?;
        if table.count == 0 {
            return Err(SymbolError::NotFound("global type table is empty".to_string()));
        }

        let reader = self.reader();
        let first = self.type_record_offset(&table, 0)?;
        let last = self.type_record_offset(&table, table.count - 1)?;
        reader.check(last, 4)?;
        let last_len = usize::from(reader.u16_at(last)?);

        Ok(CvTypeScope {
            kind: TypeScopeKind::Global,
            current: first,
            limit: last + 2 + last_len,
            position: 0,
            count: table.count,
            hops: 0,
        })
    }

    fn set_child_type_scope(&self, handle: CvTypeHandle) -> Result<CvTypeScope>
    {
        let reader = self.reader();
        let record = handle
            .record
            .ok_or_else(|| SymbolError::InvalidArgument(format!("type {:#x} has no children", handle.index)))?
            as usize;
        reader.check(record, 4)?;

        match handle.tag {
            LF_FIELDLIST => {
                let len = usize::from(reader.u16_at(record)?);
                Ok(CvTypeScope {
                    kind: TypeScopeKind::FieldList,
                    current: record + 4,
                    limit: record + len + 2,
                    position: 0,
                    count: 0,
                    hops: 0,
                })
            }
            LF_METHOD => {
                let count = reader.u16_at(record + 2)?;
                let list_index = reader.u16_at(record + 4)?;
                let list = self
                    .type_from_type_index(TypeIndex::from(list_index))
                    .and_then(|list| list.record)
                    .ok_or_else(|| SymbolError::NotFound(format!("method list {list_index:#x}")))?
                    as usize;
                let len = usize::from(reader.u16_at(list)?);
                reader.check(list, len + 2)?;

                Ok(CvTypeScope {
                    kind: TypeScopeKind::MethodList,
                    current: list + 4,
                    limit: list + len + 2,
                    position: 0,
                    count: u32::from(count),
                    hops: 0,
                })
            }
            tag => Err(SymbolError::InvalidArgument(format!("type leaf {tag:#06x} has no children"))),
        }
    }

    fn next_type(&self, scope: &mut CvTypeScope) -> Option<CvTypeHandle>
    {
        let reader = self.reader();

        match scope.kind {
            TypeScopeKind::Global => {
                if scope.current + 3 >= scope.limit || scope.position >= scope.count {
                    return None;
                }
                let len = usize::from(reader.u16_at(scope.current).ok()?);
                let id = reader.u16_at(scope.current + 2).ok()?;
                if id == 0 || !reader.in_bounds(scope.current, len + 2) {
                    return None;
                }
                let index = u16::try_from(FIRST_RECORD_TYPE_INDEX + scope.position).ok()?;
                let handle = CvTypeHandle {
                    index,
                    record: Some(scope.current as u32),
                    tag: id,
                };
                scope.position += 1;
                scope.current += (len + 2).next_multiple_of(4);
                Some(handle)
            }
            TypeScopeKind::FieldList => self.next_field(scope),
            TypeScopeKind::MethodList => {
                if scope.position >= scope.count || scope.current + 4 > scope.limit {
                    return None;
                }
                let len = method_list_entry_length(&reader, scope.current).ok()?;
                let handle = CvTypeHandle {
                    index: FIELD_TYPE_INDEX,
                    record: Some(scope.current as u32),
                    tag: LF_METHOD_OVERLOAD,
                };
                scope.position += 1;
                scope.current += len;
                Some(handle)
            }
        }
    }

    fn type_from_type_index(&self, index: TypeIndex) -> Option<CvTypeHandle>
    {
        if index == 0 {
            return None;
        }
        let short = u16::try_from(index).ok()?;
        if index < FIRST_RECORD_TYPE_INDEX {
            return Some(CvTypeHandle {
                index: short,
                record: None,
                tag: 0,
            });
        }

        let table = self.type_table().ok()?;
        let z = index - FIRST_RECORD_TYPE_INDEX;
        if z >= table.count {
            return None;
        }
        let record = self.type_record_offset(&table, z).ok()?;
        let reader = self.reader();
        reader.check(record, 4).ok()?;

        Some(CvTypeHandle {
            index: short,
            record: Some(record as u32),
            tag: reader.u16_at(record + 2).ok()?,
        })
    }

    fn type_info(&self, handle: CvTypeHandle) -> Result<CvTypeInfo<'_>>
    {
        let reader = self.reader();
        let mut current = handle;
        let mut modifier = 0u16;

        for _ in 0..MAX_MODIFIER_DEPTH {
            if current.tag != LF_MODIFIER {
                return CvTypeInfo::parse(
                    &reader,
                    current.index,
                    current.record.map(|r| r as usize),
                    current.tag,
                    modifier,
                );
            }

            let record = current
                .record
                .ok_or_else(|| SymbolError::InvalidArgument("modifier without a record".to_string()))?
                as usize;
            modifier |= reader.u16_at(record + 4)?;
            let modified = reader.u16_at(record + 6)?;

            current = if TypeIndex::from(modified) >= FIRST_RECORD_TYPE_INDEX {
                self.type_from_type_index(TypeIndex::from(modified))
                    .ok_or_else(|| SymbolError::NotFound(format!("modified type {modified:#x}")))?
            } else {
                CvTypeHandle {
                    index: modified,
                    record: None,
                    tag: 0,
                }
            };
        }

        Err(SymbolError::Format(format!("modifier chain at type {:#x} is too deep", handle.index)))
    }

    fn type_bytes(&self, handle: CvTypeHandle) -> Result<&[u8]>
    {
        let reader = self.reader();
        let record = match handle.record {
            Some(record) if TypeIndex::from(handle.index) >= FIRST_RECORD_TYPE_INDEX => record as usize,
            _ => {
                return Err(SymbolError::InvalidArgument(format!("type {:#x} has no record", handle.index)));
            }
        };

        let len = if handle.tag < FIRST_FIELD_LEAF {
            usize::from(reader.u16_at(record)?) + 2
        } else if handle.tag == LF_METHOD_OVERLOAD {
            method_list_entry_length(&reader, record)?
        } else {
            field_length(&reader, record)?
        };

        reader.slice_at(record, len)
    }

    fn compiland_count(&self) -> Result<u16>
    {
        // parse_layout bounds the count to u16
        Ok(self.layout()?.compilands.len() as u16)
    }

    fn compiland_info(&self, index: u16) -> Result<CompilandInfo>
    {
        let compiland = self.compiland(index)?;
        let module = ModuleHeader::read(&self.reader(), compiland.module.start())?;

        let (segment_count, file_count) = match compiland.source {
            Some(source) => {
                let source = SourceModule::read(self.reader(), source.start())?;
                (source.segment_count(), source.file_count())
            }
            None => (module.segments.len() as u16, 0),
        };

        Ok(CompilandInfo {
            segment_count,
            file_count,
            name: module.name.to_vec(),
        })
    }

    fn compiland_segment_info(&self, index: u16) -> Result<Vec<SegmentInfo>>
    {
        let compiland = self.compiland(index)?;
        match compiland.source {
            Some(source) => SourceModule::read(self.reader(), source.start())?.segment_info(),
            None => Ok(ModuleHeader::read(&self.reader(), compiland.module.start())?.segment_info()),
        }
    }

    fn file_info(&self, compiland: u16, file: u16) -> Result<FileInfo>
    {
        let file = self.source_module(compiland)?.file(file)?;
        Ok(FileInfo {
            segment_count: file.segment_count(),
            name: file.name()?.to_vec(),
        })
    }

    fn file_segment_info(&self, compiland: u16, file: u16) -> Result<Vec<SegmentInfo>>
    {
        self.source_module(compiland)?.file(file)?.segment_info()
    }

    fn line_info(&self, compiland: u16, file: u16, segment_instance: u16) -> Result<Vec<LineInfo>>
    {
        let segment = self.source_module(compiland)?.file(file)?.segment(segment_instance)?;
        Ok(segment.lines().collect())
    }

    fn file_segment(&self, compiland: u16, file: u16, segment_instance: u16) -> Option<FileSegmentInfo>
    {
        self.source_module(compiland).ok()?.file(file).ok()?.segment(segment_instance).ok()
    }

    fn find_line(&self, segment: u16, offset: u32) -> Option<LineNumber>
    {
        let (compiland, file, seg) = self.find_compiland_file_segment_by_addr(segment, offset)?;
        let z = find_offset_index(&seg.offsets, offset)?;
        line_number_from_segment(compiland, file, &seg, z)
    }

    fn find_line_by_num(&self, compiland: u16, file: u16, line: u16) -> Option<LineNumber>
    {
        let seg = self.find_compiland_file_segment_by_line(line, compiland, file)?;
        let z = closest_line_index(&seg.line_numbers, line)?;
        line_number_from_segment(compiland, file, &seg, z)
    }

    fn find_lines(&self, exact: bool, file_name: &[u8], start_line: u16, end_line: u16) -> Vec<LineNumber>
    {
        let mut found = Vec::new();
        let Ok(count) = self.compiland_count() else {
            return found;
        };

        for compiland in 1..=count {
            let Ok(module) = self.source_module(compiland) else {
                continue;
            };
            for (z, file) in module.files().enumerate() {
                let Ok(file) = file else {
                    continue;
                };
                let matches = file.name().is_ok_and(|name| {
                    if exact {
                        exact_file_name_match(file_name, name)
                    } else {
                        partial_file_name_match(file_name, name)
                    }
                });
                if !matches {
                    continue;
                }

                for instance in 0..file.segment_count() {
                    let Ok(seg) = file.segment(instance) else {
                        continue;
                    };
                    found.extend(
                        (0..seg.line_count())
                            .filter_map(|i| line_number_from_segment(compiland, z as u16, &seg, i))
                            .filter(|line| line.number <= end_line && line.number_end >= start_line),
                    );
                }
            }
        }

        found
    }
}
