//! Shared fixtures: an in-memory `NB09` image builder and a fake PDB session.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;

use symstore_core::address_map::SectionHeader;
use symstore_core::codeview::constants::*;
use symstore_core::codeview::name_hash;
use symstore_core::pdb::{PdbFile, PdbLine, PdbSegment, PdbSession, PdbSymbol};
use symstore_core::types::{DataKind, SymTag};
use symstore_core::{Result, SymbolError};

fn put_u32(buf: &mut [u8], at: usize, value: u32)
{
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn pad4(buf: &mut Vec<u8>)
{
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Pad a field to 4 bytes with `LF_PAD` leaves, each counting the bytes left.
fn pad_leaf(buf: &mut Vec<u8>)
{
    let pad = (4 - buf.len() % 4) % 4;
    for left in (1..=pad).rev() {
        buf.push(LF_PAD0 + left as u8);
    }
}

pub fn pascal(name: &[u8]) -> Vec<u8>
{
    let mut out = vec![name.len() as u8];
    out.extend_from_slice(name);
    out
}

pub fn words(values: &[u16]) -> Vec<u8>
{
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A symbol record: length, id and body.
pub fn sym_record(id: u16, body: &[u8]) -> Vec<u8>
{
    let mut out = ((body.len() + 2) as u16).to_le_bytes().to_vec();
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// `S_PROCREF`/`S_DATAREF` pointing at `target` in compiland `module`.
pub fn reference(id: u16, name: &[u8], target: u32, module: u16) -> Vec<u8>
{
    let mut body = name_hash(name).to_le_bytes().to_vec();
    body.extend_from_slice(&target.to_le_bytes());
    body.extend_from_slice(&module.to_le_bytes());
    sym_record(id, &body)
}

/// `S_GDATA32`/`S_LDATA32`/`S_PUB32`.
pub fn data32(id: u16, name: &[u8], segment: u16, offset: u32, type_index: u16) -> Vec<u8>
{
    let mut body = offset.to_le_bytes().to_vec();
    body.extend_from_slice(&segment.to_le_bytes());
    body.extend_from_slice(&type_index.to_le_bytes());
    body.extend_from_slice(&pascal(name));
    sym_record(id, &body)
}

pub fn udt(name: &[u8], type_index: u16) -> Vec<u8>
{
    let mut body = type_index.to_le_bytes().to_vec();
    body.extend_from_slice(&pascal(name));
    sym_record(S_UDT, &body)
}

pub fn bprel32(name: &[u8], offset: i32, type_index: u16) -> Vec<u8>
{
    let mut body = offset.to_le_bytes().to_vec();
    body.extend_from_slice(&type_index.to_le_bytes());
    body.extend_from_slice(&pascal(name));
    sym_record(S_BPREL32, &body)
}

/// A run of symbol records whose scope end offsets are patched relative to
/// the heap base.
///
/// Compiland symbol subsections start with a 4-byte signature, so their
/// records sit 4 bytes past the base; heap records start at the base.
#[derive(Debug, Default)]
pub struct SymbolStream
{
    bytes: Vec<u8>,
    base: u32,
}

impl SymbolStream
{
    pub fn heap() -> Self
    {
        Self { bytes: Vec::new(), base: 0 }
    }

    pub fn compiland() -> Self
    {
        Self { bytes: Vec::new(), base: 4 }
    }

    /// Offset the next record will have, relative to the heap base.
    pub fn offset(&self) -> u32
    {
        self.base + self.bytes.len() as u32
    }

    pub fn push(&mut self, record: Vec<u8>) -> u32
    {
        let at = self.offset();
        self.bytes.extend(record);
        at
    }

    /// Open a `S_GPROC32`/`S_LPROC32` scope; close it with [`SymbolStream::end`].
    pub fn proc32(&mut self, global: bool, name: &[u8], segment: u16, offset: u32, len: u32) -> u32
    {
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_le_bytes()); // parent
        body.extend_from_slice(&0u32.to_le_bytes()); // end, patched later
        body.extend_from_slice(&0u32.to_le_bytes()); // next
        body.extend_from_slice(&len.to_le_bytes());
        body.extend_from_slice(&4u32.to_le_bytes()); // debug start
        body.extend_from_slice(&(len.saturating_sub(2)).to_le_bytes()); // debug end
        body.extend_from_slice(&offset.to_le_bytes());
        body.extend_from_slice(&segment.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes()); // type
        body.push(0); // flags
        body.extend_from_slice(&pascal(name));
        self.push(sym_record(if global { S_GPROC32 } else { S_LPROC32 }, &body))
    }

    pub fn block32(&mut self, segment: u16, offset: u32, len: u32) -> u32
    {
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&len.to_le_bytes());
        body.extend_from_slice(&offset.to_le_bytes());
        body.extend_from_slice(&segment.to_le_bytes());
        body.push(0);
        self.push(sym_record(S_BLOCK32, &body))
    }

    /// Close the scope opened at `scope`.
    pub fn end(&mut self, scope: u32)
    {
        let end = self.push(sym_record(S_END, &[]));
        let at = (scope - self.base) as usize + 8;
        put_u32(&mut self.bytes, at, end);
    }

    pub fn into_bytes(self) -> Vec<u8>
    {
        self.bytes
    }
}

/// A global, static or public symbol heap with name and address tables.
#[derive(Debug, Default)]
pub struct HeapBuilder
{
    symbols: Vec<u8>,
    names: Vec<(u32, u32)>,
    addresses: Vec<(u16, u32, u32)>,
}

impl HeapBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Append a record, entering it in the name table under `name` and in the
    /// address table at `address`.
    pub fn add(&mut self, record: Vec<u8>, name: Option<&[u8]>, address: Option<(u16, u32)>) -> u32
    {
        let at = self.symbols.len() as u32;
        self.symbols.extend(record);
        if let Some(name) = name {
            self.names.push((at, name_hash(name)));
        }
        if let Some((segment, offset)) = address {
            self.addresses.push((segment, at, offset));
        }
        at
    }

    pub fn build(&self, name_buckets: u16) -> Vec<u8>
    {
        let mut by_hash = vec![Vec::new(); usize::from(name_buckets)];
        for &(offset, hash) in &self.names {
            by_hash[(hash % u32::from(name_buckets)) as usize].push((offset, hash));
        }
        let segments = self.addresses.iter().map(|a| a.0).max().unwrap_or(0);
        let mut by_segment = vec![Vec::new(); usize::from(segments)];
        for &(segment, offset, value) in &self.addresses {
            by_segment[usize::from(segment - 1)].push((offset, value));
        }

        let names = hash_table(&by_hash);
        let addresses = hash_table(&by_segment);

        let mut out = Vec::new();
        out.extend_from_slice(&SYM_HASH_NAME.to_le_bytes());
        out.extend_from_slice(&SYM_HASH_ADDR.to_le_bytes());
        out.extend_from_slice(&(self.symbols.len() as u32).to_le_bytes());
        out.extend_from_slice(&(names.len() as u32).to_le_bytes());
        out.extend_from_slice(&(addresses.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.symbols);
        out.extend(names);
        out.extend(addresses);
        out
    }
}

fn hash_table(buckets: &[Vec<(u32, u32)>]) -> Vec<u8>
{
    let mut out = Vec::new();
    out.extend_from_slice(&(buckets.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    let mut start = 0u32;
    for bucket in buckets {
        out.extend_from_slice(&start.to_le_bytes());
        start += 8 * bucket.len() as u32;
    }
    for bucket in buckets {
        out.extend_from_slice(&(bucket.len() as u32).to_le_bytes());
    }
    for &(offset, value) in buckets.iter().flatten() {
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// The global type table. Records are numbered from `0x1000` in the order
/// they are added.
#[derive(Debug, Default)]
pub struct TypeTableBuilder
{
    records: Vec<Vec<u8>>,
}

impl TypeTableBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn next_index(&self) -> u16
    {
        0x1000 + self.records.len() as u16
    }

    pub fn add(&mut self, leaf: u16, body: &[u8]) -> u16
    {
        let index = self.next_index();
        let mut record = ((body.len() + 2) as u16).to_le_bytes().to_vec();
        record.extend_from_slice(&leaf.to_le_bytes());
        record.extend_from_slice(body);
        pad4(&mut record);
        self.records.push(record);
        index
    }

    pub fn build(&self) -> Vec<u8>
    {
        let mut out = Vec::new();
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        let mut offset = 0u32;
        for record in &self.records {
            out.extend_from_slice(&offset.to_le_bytes());
            offset += record.len() as u32;
        }
        for record in &self.records {
            out.extend_from_slice(record);
        }
        out
    }
}

pub fn member_field(type_index: u16, offset: u16, name: &[u8]) -> Vec<u8>
{
    let mut out = words(&[LF_MEMBER, type_index, 3, offset]);
    out.extend_from_slice(&pascal(name));
    pad_leaf(&mut out);
    out
}

pub fn enumerate_field(value: u16, name: &[u8]) -> Vec<u8>
{
    let mut out = words(&[LF_ENUMERATE, 3, value]);
    out.extend_from_slice(&pascal(name));
    pad_leaf(&mut out);
    out
}

pub fn index_field(next: u16) -> Vec<u8>
{
    words(&[LF_INDEX, next])
}

pub fn structure_body(field_count: u16, field_list: u16, size: u16, name: &[u8]) -> Vec<u8>
{
    let mut out = words(&[field_count, field_list, 0, 0, 0, size]);
    out.extend_from_slice(&pascal(name));
    out
}

pub fn modifier_body(attribute: u16, type_index: u16) -> Vec<u8>
{
    words(&[attribute, type_index])
}

/// One segment instance of a source file: its range and line entries.
#[derive(Debug, Clone)]
pub struct LineBlock
{
    pub segment: u16,
    pub start: u32,
    pub end: u32,
    pub lines: Vec<(u32, u16)>,
}

#[derive(Debug, Clone)]
pub struct SourceFile
{
    pub name: Vec<u8>,
    pub blocks: Vec<LineBlock>,
}

/// An `sstSrcModule` subsection for `files`.
pub fn source_module(files: &[SourceFile]) -> Vec<u8>
{
    let mut segments: Vec<(u16, u32, u32)> = Vec::new();
    for block in files.iter().flat_map(|f| &f.blocks) {
        match segments.iter_mut().find(|s| s.0 == block.segment) {
            Some(s) => {
                s.1 = s.1.min(block.start);
                s.2 = s.2.max(block.end);
            }
            None => segments.push((block.segment, block.start, block.end)),
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(&(files.len() as u16).to_le_bytes());
    out.extend_from_slice(&(segments.len() as u16).to_le_bytes());
    let file_offsets = out.len();
    out.resize(out.len() + 4 * files.len(), 0);
    for &(_, start, end) in &segments {
        out.extend_from_slice(&start.to_le_bytes());
        out.extend_from_slice(&end.to_le_bytes());
    }
    for &(segment, _, _) in &segments {
        out.extend_from_slice(&segment.to_le_bytes());
    }
    pad4(&mut out);

    for (z, file) in files.iter().enumerate() {
        let file_at = out.len();
        put_u32(&mut out, file_offsets + 4 * z, file_at as u32);

        out.extend_from_slice(&(file.blocks.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        let table_offsets = out.len();
        out.resize(out.len() + 4 * file.blocks.len(), 0);
        for block in &file.blocks {
            out.extend_from_slice(&block.start.to_le_bytes());
            out.extend_from_slice(&block.end.to_le_bytes());
        }
        out.extend_from_slice(&pascal(&file.name));
        pad4(&mut out);

        for (i, block) in file.blocks.iter().enumerate() {
            let table_at = out.len();
            put_u32(&mut out, table_offsets + 4 * i, table_at as u32);
            out.extend_from_slice(&block.segment.to_le_bytes());
            out.extend_from_slice(&(block.lines.len() as u16).to_le_bytes());
            for &(offset, _) in &block.lines {
                out.extend_from_slice(&offset.to_le_bytes());
            }
            for &(_, line) in &block.lines {
                out.extend_from_slice(&line.to_le_bytes());
            }
            pad4(&mut out);
        }
    }

    out
}

/// An `sstModule` subsection.
pub fn module_header(name: &[u8], segments: &[(u16, u32, u32)]) -> Vec<u8>
{
    let mut out = words(&[0, 0, segments.len() as u16]);
    out.extend_from_slice(b"CV");
    for &(segment, offset, size) in segments {
        out.extend_from_slice(&segment.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
    }
    out.extend_from_slice(&pascal(name));
    out
}

/// Assembles subsections into an `NB09` blob with a trailing directory.
#[derive(Debug, Default)]
pub struct Nb09Builder
{
    subsections: Vec<(u16, u16, Vec<u8>)>,
}

impl Nb09Builder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn add(&mut self, kind: u16, module: u16, bytes: Vec<u8>) -> &mut Self
    {
        self.subsections.push((kind, module, bytes));
        self
    }

    /// A compiland's symbols, behind their 4-byte signature.
    pub fn compiland_symbols(&mut self, module: u16, stream: SymbolStream) -> &mut Self
    {
        let mut bytes = 1u32.to_le_bytes().to_vec();
        bytes.extend(stream.into_bytes());
        self.add(SST_ALIGN_SYM, module, bytes)
    }

    pub fn build(&self) -> Vec<u8>
    {
        let mut out = NB09_SIGNATURE.to_vec();
        out.extend_from_slice(&0u32.to_le_bytes());

        let mut entries = Vec::new();
        for (kind, module, bytes) in &self.subsections {
            pad4(&mut out);
            entries.push((*kind, *module, out.len() as u32, bytes.len() as u32));
            out.extend_from_slice(bytes);
        }
        pad4(&mut out);

        let dir = out.len();
        put_u32(&mut out, 4, dir as u32);
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(&12u16.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        for (kind, module, offset, size) in entries {
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(&module.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }
        out
    }
}

/// `.text`, `.data` and `.tls` of the fixture images.
pub fn sections() -> Vec<SectionHeader>
{
    vec![
        SectionHeader::new(b".text", 0x1000, 0x1000, 0x1000),
        SectionHeader::new(b".data", 0x3000, 0x200, 0x200),
        SectionHeader::new(b".tls", 0x4000, 0x100, 0x100),
    ]
}

/// One compiland with a single global function `foo` at 1:0x100, listed in
/// the global heap through a `S_PROCREF`.
pub fn minimal_image() -> Vec<u8>
{
    let mut symbols = SymbolStream::compiland();
    let foo = symbols.proc32(true, b"foo", 1, 0x100, 0x20);
    symbols.end(foo);

    let mut globals = HeapBuilder::new();
    globals.add(reference(S_PROCREF, b"foo", foo, 1), Some(b"foo"), Some((1, 0x100)));

    let mut image = Nb09Builder::new();
    image
        .add(SST_MODULE, 1, module_header(b"foo.obj", &[(1, 0x100, 0x20)]))
        .compiland_symbols(1, symbols)
        .add(SST_GLOBAL_SYM, 0, globals.build(4));
    image.build()
}

/// Type indices of the rich fixture.
pub const POINT_FIELDS: u16 = 0x1000;
pub const POINT_FIELDS_MORE: u16 = 0x1001;
pub const POINT: u16 = 0x1002;
pub const CONST_POINT: u16 = 0x1003;
pub const CONST_VOLATILE_POINT: u16 = 0x1004;
pub const COLOR_FIELDS: u16 = 0x1005;
pub const COLOR: u16 = 0x1006;
pub const CONST_INT: u16 = 0x1007;

/// A two-compiland image with nested scopes, line tables, types and all
/// three heaps.
///
/// Compiland 1 `main.obj`, segment 1 `[0x100, 0x1c0)`:
/// - `foo` at 0x100+0x20 with parameter `arg` and a block at 0x108+0x10
///   holding local `tmp`
/// - `app.main.run` at 0x140+0x30
/// - `app.main.Point.__debugOverview` at 0x180+0x10
/// - file static `app.main.counter` at 2:0x10
///
/// Compiland 2 `util.obj`, segment 1 `[0x200, 0x240)`:
/// - static function `helper` at 0x200+0x40
pub fn rich_image() -> Vec<u8>
{
    let mut main = SymbolStream::compiland();
    let foo = main.proc32(true, b"foo", 1, 0x100, 0x20);
    main.push(bprel32(b"arg", -8, 0x74));
    let block = main.block32(1, 0x108, 0x10);
    main.push(bprel32(b"tmp", 4, 0x74));
    main.end(block);
    main.end(foo);
    let run = main.proc32(true, b"app.main.run", 1, 0x140, 0x30);
    main.end(run);
    let overview = main.proc32(true, b"app.main.Point.__debugOverview", 1, 0x180, 0x10);
    main.end(overview);
    let counter = main.push(data32(S_LDATA32, b"app.main.counter", 2, 0x10, 0x74));

    let mut util = SymbolStream::compiland();
    let helper = util.proc32(false, b"helper", 1, 0x200, 0x40);
    util.end(helper);

    let mut globals = HeapBuilder::new();
    globals.add(reference(S_PROCREF, b"foo", foo, 1), Some(b"foo"), Some((1, 0x100)));
    globals.add(reference(S_PROCREF, b"app.main.run", run, 1), Some(b"app.main.run"), Some((1, 0x140)));
    globals.add(
        reference(S_PROCREF, b"app.main.Point.__debugOverview", overview, 1),
        Some(b"app.main.Point.__debugOverview"),
        Some((1, 0x180)),
    );
    for (name, offset) in [
        (&b"app.main.total"[..], 0x20),
        (&b"lib.total"[..], 0x24),
        (&b"total"[..], 0x28),
        (&b"subtotal"[..], 0x2c),
    ] {
        globals.add(data32(S_GDATA32, name, 2, offset, 0x74), Some(name), Some((2, offset)));
    }
    globals.add(data32(S_GDATA32, b"app.main.slot", 3, 0x8, 0x74), Some(b"app.main.slot"), Some((3, 0x8)));
    globals.add(udt(b"app.main.Point", POINT), Some(b"app.main.Point"), None);
    globals.add(udt(b"lib.Point", POINT), Some(b"lib.Point"), None);
    globals.add(udt(b"app.main.Color", COLOR), Some(b"app.main.Color"), None);

    let mut statics = HeapBuilder::new();
    statics.add(reference(S_DATAREF, b"app.main.counter", counter, 1), Some(b"app.main.counter"), Some((2, 0x10)));
    statics.add(reference(S_PROCREF, b"helper", helper, 2), Some(b"helper"), Some((1, 0x200)));

    let mut publics = HeapBuilder::new();
    publics.add(data32(S_PUB32, b"_foo", 1, 0x100, 0), Some(b"_foo"), Some((1, 0x100)));
    let mangled = b"_ZN4core3fmt5write17h0123456789abcdefE";
    publics.add(data32(S_PUB32, mangled, 1, 0x1a0, 0), Some(mangled), Some((1, 0x1a0)));

    let mut types = TypeTableBuilder::new();
    let mut fields = member_field(0x74, 0, b"x");
    fields.extend(member_field(0x74, 4, b"y"));
    fields.extend(index_field(POINT_FIELDS_MORE));
    assert_eq!(types.add(LF_FIELDLIST, &fields), POINT_FIELDS);
    assert_eq!(types.add(LF_FIELDLIST, &member_field(0x74, 8, b"z")), POINT_FIELDS_MORE);
    assert_eq!(types.add(LF_STRUCTURE, &structure_body(3, POINT_FIELDS, 12, b"app.main.Point")), POINT);
    assert_eq!(types.add(LF_MODIFIER, &modifier_body(MOD_CONST, POINT)), CONST_POINT);
    assert_eq!(types.add(LF_MODIFIER, &modifier_body(MOD_VOLATILE, CONST_POINT)), CONST_VOLATILE_POINT);
    let mut colors = enumerate_field(0, b"Red");
    colors.extend(enumerate_field(1, b"Green"));
    assert_eq!(types.add(LF_FIELDLIST, &colors), COLOR_FIELDS);
    let mut color = words(&[2, 0x74, COLOR_FIELDS, 0]);
    color.extend_from_slice(&pascal(b"app.main.Color"));
    assert_eq!(types.add(LF_ENUM, &color), COLOR);
    assert_eq!(types.add(LF_MODIFIER, &modifier_body(MOD_CONST, 0x74)), CONST_INT);

    let main_lines = source_module(&[
        SourceFile {
            name: b"src\\main.d".to_vec(),
            blocks: vec![LineBlock {
                segment: 1,
                start: 0x100,
                end: 0x17f,
                lines: vec![(0x100, 10), (0x108, 11), (0x120, 20), (0x140, 30), (0x160, 31)],
            }],
        },
        SourceFile {
            name: b"src\\point.d".to_vec(),
            blocks: vec![LineBlock {
                segment: 1,
                start: 0x180,
                end: 0x1bf,
                lines: vec![(0x180, 5), (0x188, 6)],
            }],
        },
    ]);
    let util_lines = source_module(&[SourceFile {
        name: b"lib\\util.d".to_vec(),
        blocks: vec![LineBlock {
            segment: 1,
            start: 0x200,
            end: 0x23f,
            lines: vec![(0x200, 10), (0x210, 12)],
        }],
    }]);

    let mut image = Nb09Builder::new();
    image
        .add(SST_MODULE, 1, module_header(b"main.obj", &[(1, 0x100, 0xc0)]))
        .add(SST_MODULE, 2, module_header(b"util.obj", &[(1, 0x200, 0x40)]))
        .compiland_symbols(1, main)
        .add(SST_SRC_MODULE, 1, main_lines)
        .compiland_symbols(2, util)
        .add(SST_SRC_MODULE, 2, util_lines)
        .add(SST_GLOBAL_SYM, 0, globals.build(8))
        .add(SST_STATIC_SYM, 0, statics.build(4))
        .add(SST_GLOBAL_PUB, 0, publics.build(4))
        .add(SST_GLOBAL_TYPES, 0, types.build());
    image.build()
}

/// Two field lists whose `LF_INDEX` continuations point at each other, and a
/// struct over the first.
pub fn cyclic_fields_image() -> Vec<u8>
{
    let mut types = TypeTableBuilder::new();
    let mut first = member_field(0x74, 0, b"a");
    first.extend(index_field(0x1001));
    assert_eq!(types.add(LF_FIELDLIST, &first), 0x1000);
    let mut second = member_field(0x74, 4, b"b");
    second.extend(index_field(0x1000));
    assert_eq!(types.add(LF_FIELDLIST, &second), 0x1001);
    assert_eq!(types.add(LF_STRUCTURE, &structure_body(2, 0x1000, 8, b"Loop")), 0x1002);

    let mut image = Nb09Builder::new();
    image.add(SST_GLOBAL_TYPES, 0, types.build());
    image.build()
}

/// Global heap with two data symbols whose names hash identically and share
/// the only bucket.
pub fn colliding_names_image() -> Vec<u8>
{
    let mut globals = HeapBuilder::new();
    globals.add(data32(S_GDATA32, b"foo", 2, 0x10, 0x74), Some(b"foo"), Some((2, 0x10)));
    globals.add(data32(S_GDATA32, b"FOO", 2, 0x20, 0x74), Some(b"FOO"), Some((2, 0x20)));

    let mut image = Nb09Builder::new();
    image.add(SST_GLOBAL_SYM, 0, globals.build(1));
    image.build()
}

/// An in-memory PDB session.
#[derive(Debug, Default)]
pub struct FakePdbSession
{
    pub global: u32,
    pub symbols: HashMap<u32, PdbSymbol>,
    pub children: HashMap<u32, Vec<u32>>,
    pub segments: Vec<PdbSegment>,
    /// Source files per compiland id
    pub files: HashMap<u32, Vec<PdbFile>>,
    /// Line entries in address order
    pub lines: Vec<PdbLine>,
    /// Number of `symbol_by_id` calls answered
    pub lookups: Cell<usize>,
    /// Number of `find_children` enumerations answered
    pub enumerations: Cell<usize>,
}

impl FakePdbSession
{
    pub fn new(global: u32) -> Self
    {
        let mut session = Self {
            global,
            ..Self::default()
        };
        session.symbols.insert(global, PdbSymbol::new(global, SymTag::Exe));
        session
    }

    /// Register `symbol` as a child of `parent`.
    pub fn add(&mut self, parent: u32, symbol: PdbSymbol) -> u32
    {
        let id = symbol.id;
        self.children.entry(parent).or_default().push(id);
        self.symbols.insert(id, symbol);
        id
    }
}

impl PdbSession for FakePdbSession
{
    fn global_scope(&self) -> u32
    {
        self.global
    }

    fn symbol_by_id(&self, id: u32) -> Result<PdbSymbol>
    {
        self.lookups.set(self.lookups.get() + 1);
        self.symbols.get(&id).cloned().ok_or_else(|| SymbolError::NotFound(format!("symbol {id}")))
    }

    fn find_children(&self, parent: u32, tag: Option<SymTag>, name: Option<&[u8]>, case_sensitive: bool) -> Vec<u32>
    {
        self.enumerations.set(self.enumerations.get() + 1);
        let Some(children) = self.children.get(&parent) else {
            return Vec::new();
        };
        children
            .iter()
            .copied()
            .filter(|id| {
                let symbol = &self.symbols[id];
                let tag_ok = tag.is_none_or(|tag| symbol.tag == tag);
                let name_ok = name.is_none_or(|name| {
                    symbol.name.as_deref().is_some_and(|own| {
                        if case_sensitive {
                            own == name
                        } else {
                            own.eq_ignore_ascii_case(name)
                        }
                    })
                });
                tag_ok && name_ok
            })
            .collect()
    }

    fn child_at(&self, parent: u32, index: usize) -> Option<u32>
    {
        self.children.get(&parent)?.get(index).copied()
    }

    fn find_symbol_by_addr(&self, segment: u16, offset: u32, tag: SymTag) -> Option<u32>
    {
        self.symbols
            .values()
            .filter(|symbol| symbol.tag == tag)
            .filter_map(|symbol| Some((symbol.id, symbol.address()?)))
            .filter(|&(_, (section, start))| section == segment && start <= offset)
            .max_by_key(|&(_, (_, start))| start)
            .map(|(id, _)| id)
    }

    fn find_files(&self, compiland: u32) -> Vec<PdbFile>
    {
        self.files.get(&compiland).cloned().unwrap_or_default()
    }

    fn find_lines(&self, compiland: u32, file: u32) -> Vec<PdbLine>
    {
        self.lines.iter().copied().filter(|l| l.compiland == compiland && l.file == file).collect()
    }

    fn find_lines_by_addr(&self, segment: u16, offset: u32, length: u32) -> Vec<PdbLine>
    {
        let end = offset + length;
        self.lines
            .iter()
            .copied()
            .filter(|l| l.section == segment && l.offset < end && offset < l.offset + l.length)
            .collect()
    }

    fn find_lines_by_linenum(&self, compiland: u32, file: u32, line: u16) -> Vec<PdbLine>
    {
        let mut found: Vec<PdbLine> = self
            .find_lines(compiland, file)
            .into_iter()
            .filter(|l| l.line >= u32::from(line))
            .collect();
        found.sort_by_key(|l| l.line);
        found
    }

    fn segments(&self) -> Vec<PdbSegment>
    {
        self.segments.clone()
    }
}

/// A PDB session shaped like the rich CodeView fixture: two compilands, a
/// function with a nested block, a global, a struct and line entries.
///
/// Ids: global scope 1, compilands 10 and 11, `foo` 20, its block 21,
/// `app.main.total` 30, `app.main.Point` 40 with members 41 and 42,
/// public `_foo` 50.
pub fn fake_pdb() -> FakePdbSession
{
    let mut pdb = FakePdbSession::new(1);
    pdb.segments = vec![
        PdbSegment {
            index: 1,
            name: b".text".to_vec(),
            rva: 0x1000,
            length: 0x1000,
        },
        PdbSegment {
            index: 2,
            name: b".data".to_vec(),
            rva: 0x3000,
            length: 0x200,
        },
    ];

    let mut main = PdbSymbol::new(10, SymTag::Compiland);
    main.name = Some(b"main.obj".to_vec());
    pdb.add(1, main);
    let mut util = PdbSymbol::new(11, SymTag::Compiland);
    util.name = Some(b"util.obj".to_vec());
    pdb.add(1, util);

    let mut foo = PdbSymbol::new(20, SymTag::Function);
    foo.name = Some(b"foo".to_vec());
    foo.address_section = Some(1);
    foo.address_offset = Some(0x100);
    foo.length = Some(0x20);
    pdb.add(1, foo);

    let mut block = PdbSymbol::new(21, SymTag::Block);
    block.address_section = Some(1);
    block.address_offset = Some(0x108);
    block.length = Some(0x10);
    pdb.add(20, block);

    let mut total = PdbSymbol::new(30, SymTag::Data);
    total.name = Some(b"app.main.total".to_vec());
    total.data_kind = Some(DataKind::Global);
    total.address_section = Some(2);
    total.address_offset = Some(0x20);
    pdb.add(1, total);

    let mut point = PdbSymbol::new(40, SymTag::Udt);
    point.name = Some(b"app.main.Point".to_vec());
    point.length = Some(8);
    pdb.add(1, point);
    for (id, name, offset) in [(41, &b"x"[..], 0), (42, &b"y"[..], 4)] {
        let mut field = PdbSymbol::new(id, SymTag::Data);
        field.name = Some(name.to_vec());
        field.data_kind = Some(DataKind::Member);
        field.offset = Some(offset);
        pdb.add(40, field);
    }

    let mut public = PdbSymbol::new(50, SymTag::PublicSymbol);
    public.name = Some(b"_foo".to_vec());
    public.address_section = Some(1);
    public.address_offset = Some(0x100);
    pdb.add(1, public);

    pdb.files.insert(
        10,
        vec![PdbFile {
            id: 100,
            name: b"src\\main.d".to_vec(),
        }],
    );
    pdb.files.insert(
        11,
        vec![PdbFile {
            id: 101,
            name: b"lib\\util.d".to_vec(),
        }],
    );
    for (compiland, file, line, offset, length) in
        [(10, 100, 10, 0x100, 8), (10, 100, 11, 0x108, 0x18), (10, 100, 20, 0x120, 0x20), (11, 101, 10, 0x200, 0x10)]
    {
        pdb.lines.push(PdbLine {
            compiland,
            file,
            line,
            line_end: line,
            section: 1,
            offset,
            length,
        });
    }

    pdb
}
