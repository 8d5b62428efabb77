use std::cell::RefCell;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use tracing::{debug, trace};

use super::cache::SymbolCache;
use super::info::PdbSymbolInfo;
use super::{PdbFile, PdbLine, PdbSession, PdbSymbol};
use crate::error::{Result, SymbolError};
use crate::line_search::{exact_file_name_match, partial_file_name_match};
use crate::store::DebugStore;
use crate::types::{
    CompilandInfo, FileInfo, FileSegmentInfo, LineInfo, LineNumber, SegmentInfo, SymTag, SymbolHeapId, TypeIndex,
};

/// Default number of symbol records kept by [`PdbStore`].
pub const DEFAULT_SYMBOL_CACHE_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PdbSymHandle
{
    pub id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PdbTypeHandle
{
    pub id: u32,
}

/// Children of one parent, walked by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdbScope
{
    parent: u32,
    next: usize,
}

impl PdbScope
{
    const fn new(parent: u32) -> Self
    {
        Self { parent, next: 0 }
    }

    pub const fn parent(&self) -> u32
    {
        self.parent
    }

    /// Position of the next child to be returned.
    pub const fn position(&self) -> usize
    {
        self.next
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbNamedSearch
{
    matches: Vec<u32>,
    position: usize,
}

/// [`DebugStore`] over a [`PdbSession`].
pub struct PdbStore<S>
{
    session: S,
    cache: RefCell<SymbolCache>,
    compilands: OnceCell<Vec<u32>>,
}

impl<S: PdbSession> PdbStore<S>
{
    pub fn new(session: S) -> Self
    {
        Self::with_cache_capacity(session, DEFAULT_SYMBOL_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(session: S, capacity: usize) -> Self
    {
        debug!(capacity, "opening PDB store");
        Self {
            session,
            cache: RefCell::new(SymbolCache::new(capacity)),
            compilands: OnceCell::new(),
        }
    }

    pub fn session(&self) -> &S
    {
        &self.session
    }

    /// The record for an id, from the cache when possible.
    pub fn symbol(&self, id: u32) -> Result<Rc<PdbSymbol>>
    {
        if let Some(symbol) = self.cache.borrow().get(id) {
            return Ok(symbol);
        }

        trace!(id, "symbol cache miss");
        let symbol = Rc::new(self.session.symbol_by_id(id)?);
        self.cache.borrow_mut().insert(Rc::clone(&symbol));
        Ok(symbol)
    }

    fn advance(&self, scope: &mut PdbScope) -> Option<u32>
    {
        let id = self.session.child_at(scope.parent, scope.next)?;
        scope.next += 1;
        Some(id)
    }

    fn compilands(&self) -> &[u32]
    {
        self.compilands.get_or_init(|| {
            self.session.find_children(self.session.global_scope(), Some(SymTag::Compiland), None, false)
        })
    }

    fn compiland_id(&self, index: u16) -> Result<u32>
    {
        let compilands = self.compilands();
        usize::from(index)
            .checked_sub(1)
            .and_then(|z| compilands.get(z))
            .copied()
            .ok_or_else(|| {
                SymbolError::InvalidArgument(format!(
                    "compiland {index} out of range ({} compilands)",
                    compilands.len()
                ))
            })
    }

    fn file(&self, compiland: u32, index: u16) -> Result<PdbFile>
    {
        let mut files = self.session.find_files(compiland);
        if usize::from(index) >= files.len() {
            return Err(SymbolError::InvalidArgument(format!(
                "file index {index} out of range ({} files)",
                files.len()
            )));
        }
        Ok(files.swap_remove(usize::from(index)))
    }

    /// Compiland and file indices of a line entry.
    fn locate(&self, line: &PdbLine) -> Option<(u16, u16)>
    {
        let compiland = self.compilands().iter().position(|&id| id == line.compiland)?;
        let file = self.session.find_files(line.compiland).iter().position(|file| file.id == line.file)?;
        Some((u16::try_from(compiland + 1).ok()?, u16::try_from(file).ok()?))
    }

    fn line_number(&self, line: &PdbLine, line_index: u16) -> Option<LineNumber>
    {
        let (compiland_index, file_index) = self.locate(line)?;
        Some(LineNumber {
            compiland_index,
            file_index,
            segment_instance: 0,
            line_index,
            number: line.line as u16,
            number_end: line.line_end as u16,
            section: line.section,
            offset: line.offset,
            length: line.length,
        })
    }
}

impl<S> std::fmt::Debug for PdbStore<S>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("PdbStore").field("cached", &self.cache.borrow().len()).finish_non_exhaustive()
    }
}

impl<S: PdbSession> DebugStore for PdbStore<S>
{
    type SymHandle = PdbSymHandle;
    type TypeHandle = PdbTypeHandle;
    type SymbolScope = PdbScope;
    type TypeScope = PdbScope;
    type NamedSearch = PdbNamedSearch;
    type SymInfo<'a>
        = PdbSymbolInfo<'a, S>
    where
        Self: 'a;
    type TypeInfo<'a>
        = PdbSymbolInfo<'a, S>
    where
        Self: 'a;

    fn set_symbol_scope(&self, _heap: SymbolHeapId) -> Result<PdbScope>
    {
        Err(SymbolError::NotImplemented("heap symbol scopes over a PDB session"))
    }

    fn set_global_symbol_scope(&self) -> Result<PdbScope>
    {
        let global = self.session.global_scope();
        Ok(PdbScope::new(global))
    }

    fn set_compiland_symbol_scope(&self, _compiland: u16) -> Result<PdbScope>
    {
        Err(SymbolError::NotImplemented("compiland symbol scopes over a PDB session"))
    }

    fn set_child_symbol_scope(&self, handle: PdbSymHandle) -> Result<PdbScope>
    {
        self.symbol(handle.id)?;
        Ok(PdbScope::new(handle.id))
    }

    fn next_symbol(&self, scope: &mut PdbScope) -> Option<PdbSymHandle>
    {
        self.advance(scope).map(|id| PdbSymHandle { id })
    }

    fn find_first_symbol(&self, heap: SymbolHeapId, name: &[u8]) -> Result<PdbNamedSearch>
    {
        if heap != SymbolHeapId::Global {
            return Err(SymbolError::NotImplemented("named search outside the global heap of a PDB session"));
        }

        let matches = self.session.find_children(self.session.global_scope(), None, Some(name), true);
        if matches.is_empty() {
            return Err(SymbolError::NotFound(String::from_utf8_lossy(name).into_owned()));
        }
        Ok(PdbNamedSearch { matches, position: 0 })
    }

    fn find_next_symbol(&self, search: &mut PdbNamedSearch) -> Result<()>
    {
        if search.position + 1 >= search.matches.len() {
            return Err(SymbolError::NotFound("no further matches".to_string()));
        }
        search.position += 1;
        Ok(())
    }

    fn current_symbol(&self, search: &PdbNamedSearch) -> Result<PdbSymHandle>
    {
        search
            .matches
            .get(search.position)
            .map(|&id| PdbSymHandle { id })
            .ok_or_else(|| SymbolError::InvalidArgument("search has no current symbol".to_string()))
    }

    fn find_symbol(&self, heap: SymbolHeapId, segment: u16, offset: u32) -> Result<(PdbSymHandle, u32)>
    {
        let tags: &[SymTag] = if heap == SymbolHeapId::Public {
            &[SymTag::PublicSymbol]
        } else {
            &[SymTag::Function, SymTag::Data]
        };

        let mut best: Option<(u32, u32)> = None;
        for &tag in tags {
            let Some(id) = self.session.find_symbol_by_addr(segment, offset, tag) else {
                continue;
            };
            let Ok(symbol) = self.symbol(id) else {
                continue;
            };
            let Some((section, start)) = symbol.address() else {
                continue;
            };
            if section != segment || start > offset {
                continue;
            }
            if best.is_none_or(|(_, b)| start >= b) {
                best = Some((id, start));
            }
        }

        best.map(|(id, start)| (PdbSymHandle { id }, offset - start))
            .ok_or_else(|| SymbolError::NotFound(format!("{segment:#x}:{offset:#x} in {heap} heap")))
    }

    fn symbol_info(&self, handle: PdbSymHandle) -> Result<PdbSymbolInfo<'_, S>>
    {
        Ok(PdbSymbolInfo::new(self, self.symbol(handle.id)?))
    }

    fn symbol_bytes(&self, _handle: PdbSymHandle) -> Result<&[u8]>
    {
        Err(SymbolError::NotImplemented("raw symbol records over a PDB session"))
    }

    fn set_global_type_scope(&self) -> Result<PdbScope>
    {
        let global = self.session.global_scope();
        Ok(PdbScope::new(global))
    }

    fn set_child_type_scope(&self, handle: PdbTypeHandle) -> Result<PdbScope>
    {
        self.symbol(handle.id)?;
        Ok(PdbScope::new(handle.id))
    }

    fn next_type(&self, scope: &mut PdbScope) -> Option<PdbTypeHandle>
    {
        self.advance(scope).map(|id| PdbTypeHandle { id })
    }

    fn type_from_type_index(&self, index: TypeIndex) -> Option<PdbTypeHandle>
    {
        Some(PdbTypeHandle { id: index })
    }

    fn type_info(&self, handle: PdbTypeHandle) -> Result<PdbSymbolInfo<'_, S>>
    {
        Ok(PdbSymbolInfo::new(self, self.symbol(handle.id)?))
    }

    fn type_bytes(&self, _handle: PdbTypeHandle) -> Result<&[u8]>
    {
        Err(SymbolError::NotImplemented("raw type records over a PDB session"))
    }

    fn compiland_count(&self) -> Result<u16>
    {
        Ok(u16::try_from(self.compilands().len()).unwrap_or(u16::MAX))
    }

    fn compiland_info(&self, index: u16) -> Result<CompilandInfo>
    {
        let id = self.compiland_id(index)?;
        let name = self.symbol(id)?.name.clone().unwrap_or_default();
        let file_count = self.session.find_files(id).len();

        Ok(CompilandInfo {
            segment_count: 1,
            file_count: u16::try_from(file_count).unwrap_or(u16::MAX),
            name,
        })
    }

    fn compiland_segment_info(&self, _index: u16) -> Result<Vec<SegmentInfo>>
    {
        Err(SymbolError::NotImplemented("compiland segment tables over a PDB session"))
    }

    fn file_info(&self, compiland: u16, file: u16) -> Result<FileInfo>
    {
        let file = self.file(self.compiland_id(compiland)?, file)?;
        Ok(FileInfo {
            segment_count: 1,
            name: file.name,
        })
    }

    fn file_segment_info(&self, _compiland: u16, _file: u16) -> Result<Vec<SegmentInfo>>
    {
        Err(SymbolError::NotImplemented("file segment tables over a PDB session"))
    }

    fn line_info(&self, _compiland: u16, _file: u16, _segment_instance: u16) -> Result<Vec<LineInfo>>
    {
        Err(SymbolError::NotImplemented("raw line tables over a PDB session"))
    }

    fn file_segment(&self, compiland: u16, file: u16, segment_instance: u16) -> Option<FileSegmentInfo>
    {
        // every file is reported as a single segment instance
        if segment_instance > 0 {
            return None;
        }
        let compiland = self.compiland_id(compiland).ok()?;
        let file = self.file(compiland, file).ok()?;
        let lines = self.session.find_lines(compiland, file.id);
        let first = lines.first()?;
        let last = lines.last()?;

        Some(FileSegmentInfo {
            segment_index: first.section,
            segment_instance: 0,
            start: first.offset,
            end: last.offset.wrapping_add(last.length.saturating_sub(1)),
            offsets: lines.iter().map(|line| line.offset).collect(),
            line_numbers: lines.iter().map(|line| line.line as u16).collect(),
        })
    }

    fn find_line(&self, segment: u16, offset: u32) -> Option<LineNumber>
    {
        let lines = self.session.find_lines_by_addr(segment, offset, 1);
        self.line_number(lines.first()?, 0)
    }

    fn find_line_by_num(&self, compiland: u16, file: u16, line: u16) -> Option<LineNumber>
    {
        self.find_lines_by_num(compiland, file, line).into_iter().next()
    }

    fn find_lines_by_num(&self, compiland: u16, file: u16, line: u16) -> Vec<LineNumber>
    {
        let Ok(compiland_id) = self.compiland_id(compiland) else {
            return Vec::new();
        };
        let Ok(file) = self.file(compiland_id, file) else {
            return Vec::new();
        };

        self.session
            .find_lines_by_linenum(compiland_id, file.id, line)
            .iter()
            .filter_map(|entry| self.line_number(entry, 0))
            .collect()
    }

    fn find_lines(&self, exact: bool, file_name: &[u8], start_line: u16, end_line: u16) -> Vec<LineNumber>
    {
        let mut found = Vec::new();

        for &compiland in self.compilands() {
            for file in self.session.find_files(compiland) {
                let matches = if exact {
                    exact_file_name_match(file_name, &file.name)
                } else {
                    partial_file_name_match(file_name, &file.name)
                };
                if !matches {
                    continue;
                }

                for entry in self.session.find_lines_by_linenum(compiland, file.id, start_line) {
                    let index = u16::try_from(found.len()).unwrap_or(u16::MAX);
                    if let Some(line) = self.line_number(&entry, index) {
                        if line.number <= end_line && line.number_end >= start_line {
                            found.push(line);
                        }
                    }
                }
            }
        }

        found
    }
}
