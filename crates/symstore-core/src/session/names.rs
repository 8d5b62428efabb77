//! Name indices over the global symbols.
//!
//! Built once from a single pass over every global symbol, the indices
//! answer the questions an expression evaluator asks about names:
//!
//! - the short display name of a fully qualified type or function, and back
//! - which global variables end in a given `.name` suffix
//! - which debug helper functions (`__debugOverview` and friends) exist
//! - where module boundaries lie
//!
//! Global variable names are stored reversed, so a suffix search becomes a
//! range scan over a sorted map.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use crate::error::{Result, SymbolError};

/// Qualified-name separator.
const SEPARATOR: u8 = b'.';

/// Functions a type can define to customize how a debugger shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DebugHelper
{
    Overview,
    Expanded,
    StringView,
}

impl DebugHelper
{
    pub const ALL: [DebugHelper; 3] = [DebugHelper::Overview, DebugHelper::Expanded, DebugHelper::StringView];

    pub const fn suffix(self) -> &'static [u8]
    {
        match self {
            DebugHelper::Overview => b"__debugOverview",
            DebugHelper::Expanded => b"__debugExpanded",
            DebugHelper::StringView => b"__debugStringView",
        }
    }

    /// The helper a function name ends with, and the name without the
    /// suffix and its separator.
    pub fn split(name: &[u8]) -> Option<(DebugHelper, &[u8])>
    {
        Self::ALL.into_iter().find_map(|helper| {
            let owner = name.strip_suffix(helper.suffix())?;
            Some((helper, owner.strip_suffix(b".").unwrap_or(owner)))
        })
    }
}

fn is_ident_byte(b: u8) -> bool
{
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Positions of the separators that are not nested inside parentheses.
fn top_level_separators(name: &[u8]) -> impl Iterator<Item = usize> + '_
{
    let mut depth = 0usize;
    name.iter().enumerate().filter_map(move |(i, &b)| {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            SEPARATOR if depth == 0 => return Some(i),
            _ => {}
        }
        None
    })
}

/// Everything before the last top-level separator.
pub fn module_prefix(name: &[u8]) -> Option<&[u8]>
{
    top_level_separators(name).last().map(|i| &name[..i])
}

/// The part after the last top-level separator.
pub fn last_segment(name: &[u8]) -> &[u8]
{
    match top_level_separators(name).last() {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

/// Index of the parenthesis closing the one at `open`.
fn matching_paren(name: &[u8], open: usize) -> Option<usize>
{
    let mut depth = 0usize;
    for (i, &b) in name.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collapse the compiler-generated `fun!(args).fun` pattern to `fun!(args)`.
///
/// Template instances of eponymous templates repeat the template name after
/// the argument list. The repeated identifier must equal the identifier
/// immediately before `!`, and both must be whole identifiers.
pub fn strip_template_duplication(name: &[u8]) -> Vec<u8>
{
    let mut out = name.to_vec();
    let mut i = 0;

    while i + 1 < out.len() {
        if out[i] != b'!' || out[i + 1] != b'(' {
            i += 1;
            continue;
        }

        let start = out[..i].iter().rposition(|&b| !is_ident_byte(b)).map_or(0, |p| p + 1);
        let ident = out[start..i].to_vec();
        let Some(close) = matching_paren(&out, i + 1) else {
            break;
        };

        let dup = close + 2;
        let dup_end = dup + ident.len();
        let duplicated = !ident.is_empty()
            && out.get(close + 1) == Some(&SEPARATOR)
            && out.get(dup..dup_end) == Some(ident.as_slice())
            && out.get(dup_end).is_none_or(|&b| !is_ident_byte(b));

        if duplicated {
            out.drain(close + 1..dup_end);
        }
        i = close + 1;
    }

    out
}

fn reversed(name: &[u8]) -> Vec<u8>
{
    name.iter().rev().copied().collect()
}

/// Short type name: the last segment after collapsing template duplication.
pub fn udt_short_name(name: &[u8]) -> Vec<u8>
{
    last_segment(&strip_template_duplication(name)).to_vec()
}

/// Minimal set of module prefixes.
///
/// A prefix that is further qualified by one already known is dropped, and
/// adding a shorter prefix removes the longer ones it qualifies.
#[derive(Debug, Default, Clone)]
pub struct ModuleSet
{
    modules: BTreeSet<Vec<u8>>,
}

impl ModuleSet
{
    pub fn insert(&mut self, prefix: &[u8])
    {
        if prefix.is_empty() || self.owner_of(prefix).is_some() {
            return;
        }

        let mut qualified = prefix.to_vec();
        qualified.push(SEPARATOR);
        let nested: Vec<Vec<u8>> = self
            .modules
            .range::<Vec<u8>, _>((Bound::Included(&qualified), Bound::Unbounded))
            .take_while(|m| m.starts_with(&qualified))
            .cloned()
            .collect();
        for m in nested {
            self.modules.remove(&m);
        }

        self.modules.insert(prefix.to_vec());
    }

    /// The known module that `name` is, or lies inside.
    pub fn owner_of(&self, name: &[u8]) -> Option<&[u8]>
    {
        if let Some(m) = self.modules.get(name) {
            return Some(m);
        }
        top_level_separators(name).find_map(|i| self.modules.get(&name[..i]).map(Vec::as_slice))
    }

    pub fn contains(&self, name: &[u8]) -> bool
    {
        self.modules.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]>
    {
        self.modules.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize
    {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.modules.is_empty()
    }
}

/// Long-to-short and short-to-long name maps.
#[derive(Debug, Default, Clone)]
struct ShortNames
{
    short: HashMap<Vec<u8>, Vec<u8>>,
    long: HashMap<Vec<u8>, BTreeSet<Vec<u8>>>,
}

impl ShortNames
{
    fn insert(&mut self, long: &[u8], short: Vec<u8>)
    {
        self.long.entry(short.clone()).or_default().insert(long.to_vec());
        self.short.insert(long.to_vec(), short);
    }

    fn short_name(&self, long: &[u8]) -> Option<&[u8]>
    {
        self.short.get(long).map(Vec::as_slice)
    }

    fn long_name(&self, short: &[u8]) -> Result<&[u8]>
    {
        let longs = self
            .long
            .get(short)
            .ok_or_else(|| SymbolError::NotFound(String::from_utf8_lossy(short).into_owned()))?;

        let mut iter = longs.iter();
        match (iter.next(), iter.next()) {
            (Some(long), None) => Ok(long),
            _ => Err(SymbolError::Ambiguous(format!(
                "{} names {} types",
                String::from_utf8_lossy(short),
                longs.len()
            ))),
        }
    }
}

/// All name indices of a session.
#[derive(Debug, Clone)]
pub struct NameIndex<H>
{
    globals: BTreeMap<Vec<u8>, Vec<H>>,
    debug_funcs: BTreeMap<Vec<u8>, Vec<(DebugHelper, H)>>,
    udts: ShortNames,
    funcs: ShortNames,
    pending_funcs: Vec<Vec<u8>>,
    modules: ModuleSet,
}

impl<H> Default for NameIndex<H>
{
    fn default() -> Self
    {
        Self {
            globals: BTreeMap::new(),
            debug_funcs: BTreeMap::new(),
            udts: ShortNames::default(),
            funcs: ShortNames::default(),
            pending_funcs: Vec::new(),
            modules: ModuleSet::default(),
        }
    }
}

impl<H: Copy> NameIndex<H>
{
    pub fn new() -> Self
    {
        Self::default()
    }

    fn note_module(&mut self, name: &[u8])
    {
        if let Some(prefix) = module_prefix(name) {
            self.modules.insert(prefix);
        }
    }

    /// Index a function by its fully qualified name.
    ///
    /// Short names depend on the final module set and are derived in
    /// [`NameIndex::finish`].
    pub fn add_function(&mut self, name: &[u8], handle: H)
    {
        if let Some((helper, owner)) = DebugHelper::split(name) {
            self.debug_funcs.entry(reversed(owner)).or_default().push((helper, handle));
        }
        self.note_module(name);
        self.pending_funcs.push(name.to_vec());
    }

    /// Index a user-defined type or enum.
    pub fn add_udt(&mut self, name: &[u8])
    {
        self.note_module(name);
        self.udts.insert(name, udt_short_name(name));
    }

    /// Index a global, file-static or static-local variable.
    pub fn add_global(&mut self, name: &[u8], handle: H)
    {
        self.note_module(name);
        self.globals.entry(reversed(name)).or_default().push(handle);
    }

    /// Derive function short names now that every module is known.
    pub fn finish(&mut self)
    {
        for name in std::mem::take(&mut self.pending_funcs) {
            let local = match self.modules.owner_of(&name) {
                Some(module) if module.len() < name.len() => &name[module.len() + 1..],
                _ => &name[..],
            };
            let short = strip_template_duplication(local);
            self.funcs.insert(&name, short);
        }
    }

    pub fn udt_short_name(&self, long: &[u8]) -> Option<&[u8]>
    {
        self.udts.short_name(long)
    }

    /// The one fully qualified type name with this short name.
    ///
    /// ## Errors
    ///
    /// `NotFound` for an unknown short name, `Ambiguous` when several types
    /// share it.
    pub fn udt_long_name(&self, short: &[u8]) -> Result<&[u8]>
    {
        self.udts.long_name(short)
    }

    pub fn func_short_name(&self, long: &[u8]) -> Option<&[u8]>
    {
        self.funcs.short_name(long)
    }

    pub fn func_long_name(&self, short: &[u8]) -> Result<&[u8]>
    {
        self.funcs.long_name(short)
    }

    /// Globals whose qualified name ends in `.name`.
    ///
    /// A global named exactly `name` is not a match; callers look that up
    /// directly in the symbol heaps first.
    pub fn matching_globals(&self, name: &[u8]) -> Vec<H>
    {
        let mut key = reversed(name);
        key.push(SEPARATOR);

        self.globals
            .range::<Vec<u8>, _>((Bound::Included(&key), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(&key))
            .flat_map(|(_, handles)| handles.iter().copied())
            .collect()
    }

    /// Debug helpers of every type named `name` or ending in `.name`.
    pub fn matching_debug_funcs(&self, name: &[u8]) -> Vec<(DebugHelper, H)>
    {
        let key = reversed(name);

        self.debug_funcs
            .range::<Vec<u8>, _>((Bound::Included(&key), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(&key))
            .filter(|(k, _)| k.len() == key.len() || k[key.len()] == SEPARATOR)
            .flat_map(|(_, funcs)| funcs.iter().copied())
            .collect()
    }

    pub fn modules(&self) -> &ModuleSet
    {
        &self.modules
    }

    pub fn global_count(&self) -> usize
    {
        self.globals.len()
    }

    pub fn udt_count(&self) -> usize
    {
        self.udts.short.len()
    }

    pub fn function_count(&self) -> usize
    {
        self.funcs.short.len()
    }

    pub fn debug_func_count(&self) -> usize
    {
        self.debug_funcs.values().map(Vec::len).sum()
    }
}
