//! Tests for the PDB adapter over an in-memory session

mod common;

use common::*;
use symstore_core::error::SymbolError;
use symstore_core::pdb::{PdbStore, PdbSymHandle, PdbTypeHandle};
use symstore_core::types::{Address, SymTag, SymbolHeapId};
use symstore_core::{DataSource, DebugStore, SymbolInfo};

fn store() -> PdbStore<FakePdbSession>
{
    PdbStore::new(fake_pdb())
}

#[test]
fn test_segments_become_the_address_map()
{
    let source = DataSource::from_pdb_session(fake_pdb()).unwrap();
    assert_eq!(source.address_map().section_count(), 2);

    let mut session = source.open_session();
    session.set_load_address(Address::new(0x1000_0000));
    assert_eq!(session.rva_from_sec_offset(2, 0x20), Some(0x3020));
    assert_eq!(session.sec_offset_from_rva(0x1104), Some((1, 0x104)));
}

#[test]
fn test_named_search_in_global_scope()
{
    let store = store();

    let mut search = store.find_first_symbol(SymbolHeapId::Global, b"foo").unwrap();
    let handle = store.current_symbol(&search).unwrap();
    assert_eq!(handle, PdbSymHandle { id: 20 });
    assert!(store.find_next_symbol(&mut search).unwrap_err().is_not_found());

    assert!(store.find_first_symbol(SymbolHeapId::Global, b"FOO").unwrap_err().is_not_found());
    assert!(matches!(
        store.find_first_symbol(SymbolHeapId::Static, b"foo"),
        Err(SymbolError::NotImplemented(_))
    ));
}

#[test]
fn test_address_lookup_picks_nearest_symbol()
{
    let store = store();

    let (handle, distance) = store.find_symbol(SymbolHeapId::Global, 1, 0x110).unwrap();
    assert_eq!((handle.id, distance), (20, 0x10));

    let (handle, distance) = store.find_symbol(SymbolHeapId::Global, 2, 0x28).unwrap();
    assert_eq!((handle.id, distance), (30, 8));

    let (handle, distance) = store.find_symbol(SymbolHeapId::Public, 1, 0x104).unwrap();
    assert_eq!((handle.id, distance), (50, 4));

    assert!(store.find_symbol(SymbolHeapId::Global, 1, 0x10).unwrap_err().is_not_found());
}

#[test]
fn test_symbol_records_are_cached()
{
    let store = store();
    let handle = PdbSymHandle { id: 20 };

    for _ in 0..4 {
        let info = store.symbol_info(handle).unwrap();
        assert_eq!(info.name(), Some(&b"foo"[..]));
        assert_eq!(info.sym_tag(), SymTag::Function);
    }
    assert_eq!(store.session().lookups.get(), 1);

    assert!(store.symbol_info(PdbSymHandle { id: 999 }).unwrap_err().is_not_found());
}

#[test]
fn test_scopes_walk_children()
{
    let store = store();

    let mut scope = store.set_global_symbol_scope().unwrap();
    let mut ids = Vec::new();
    while let Some(handle) = store.next_symbol(&mut scope) {
        ids.push(handle.id);
    }
    assert_eq!(ids, vec![10, 11, 20, 30, 40, 50]);

    let mut scope = store.set_child_symbol_scope(PdbSymHandle { id: 20 }).unwrap();
    assert_eq!(store.next_symbol(&mut scope), Some(PdbSymHandle { id: 21 }));
    assert_eq!(store.next_symbol(&mut scope), None);

    assert!(matches!(
        store.set_symbol_scope(SymbolHeapId::Global),
        Err(SymbolError::NotImplemented(_))
    ));
    assert!(matches!(store.set_compiland_symbol_scope(1), Err(SymbolError::NotImplemented(_))));
}

#[test]
fn test_scopes_fetch_children_by_position()
{
    let store = store();
    let before = store.session().enumerations.get();

    let mut scope = store.set_global_symbol_scope().unwrap();
    assert_eq!(scope.parent(), 1);
    assert_eq!(store.next_symbol(&mut scope), Some(PdbSymHandle { id: 10 }));
    assert_eq!(store.next_symbol(&mut scope), Some(PdbSymHandle { id: 11 }));
    assert_eq!(scope.position(), 2);

    // a copied cursor resumes independently
    let mut resumed = scope;
    assert_eq!(store.next_symbol(&mut resumed), Some(PdbSymHandle { id: 20 }));
    assert_eq!(store.next_symbol(&mut scope), Some(PdbSymHandle { id: 20 }));

    while store.next_symbol(&mut scope).is_some() {}
    assert_eq!(scope.position(), 6);
    assert_eq!(store.session().enumerations.get(), before);
}

#[test]
fn test_types_share_the_symbol_id_space()
{
    let store = store();

    let point = store.type_from_type_index(40).unwrap();
    assert_eq!(point, PdbTypeHandle { id: 40 });
    let info = store.type_info(point).unwrap();
    assert_eq!(info.sym_tag(), SymTag::Udt);
    assert_eq!(info.length(), Some(8));

    let mut scope = store.set_child_type_scope(point).unwrap();
    let x = store.next_type(&mut scope).unwrap();
    assert_eq!(store.type_info(x).unwrap().name(), Some(&b"x"[..]));
    assert!(matches!(store.type_bytes(point), Err(SymbolError::NotImplemented(_))));
}

#[test]
fn test_compilands_and_files()
{
    let store = store();

    assert_eq!(store.compiland_count().unwrap(), 2);
    let info = store.compiland_info(1).unwrap();
    assert_eq!(info.name, b"main.obj");
    assert_eq!((info.segment_count, info.file_count), (1, 1));
    assert_eq!(store.file_info(2, 0).unwrap().name, b"lib\\util.d");

    assert!(matches!(store.compiland_info(3), Err(SymbolError::InvalidArgument(_))));
    assert!(matches!(store.file_info(1, 1), Err(SymbolError::InvalidArgument(_))));
    assert!(matches!(store.compiland_segment_info(1), Err(SymbolError::NotImplemented(_))));
}

#[test]
fn test_file_segment_spans_all_lines()
{
    let store = store();

    let segment = store.file_segment(1, 0, 0).unwrap();
    assert_eq!(segment.segment_index, 1);
    assert_eq!(segment.offsets, vec![0x100, 0x108, 0x120]);
    assert_eq!(segment.line_numbers, vec![10, 11, 20]);
    assert_eq!((segment.start, segment.end), (0x100, 0x13f));

    assert!(store.file_segment(1, 0, 1).is_none());
}

#[test]
fn test_line_lookups()
{
    let store = store();

    let line = store.find_line(1, 0x10c).unwrap();
    assert_eq!((line.compiland_index, line.file_index, line.number), (1, 0, 11));
    assert_eq!((line.offset, line.length), (0x108, 0x18));

    let line = store.find_line(1, 0x204).unwrap();
    assert_eq!((line.compiland_index, line.number), (2, 10));
    assert!(store.find_line(2, 0x10).is_none());

    let lines = store.find_lines_by_num(1, 0, 11);
    assert_eq!(lines.iter().map(|l| l.number).collect::<Vec<_>>(), vec![11, 20]);
    assert_eq!(store.find_line_by_num(1, 0, 12).unwrap().number, 20);
    assert!(store.find_lines_by_num(1, 4, 11).is_empty());
}

#[test]
fn test_find_lines_numbers_results()
{
    let store = store();

    let lines = store.find_lines(false, b"main.d", 10, 20);
    assert_eq!(lines.iter().map(|l| l.number).collect::<Vec<_>>(), vec![10, 11, 20]);
    assert_eq!(lines.iter().map(|l| l.line_index).collect::<Vec<_>>(), vec![0, 1, 2]);

    assert_eq!(store.find_lines(true, b"LIB/UTIL.D", 1, 50).len(), 1);
    assert!(store.find_lines(true, b"util.d", 1, 50).is_empty());
}

#[test]
fn test_session_over_pdb()
{
    let source = DataSource::from_pdb_session(fake_pdb()).unwrap();
    let mut session = source.open_session();
    session.set_load_address(Address::new(0x1000_0000));

    let (foo, _) = session.find_outer_symbol_by_rva(SymbolHeapId::Global, 0x110c).unwrap();
    let chain = session.find_innermost_symbol(foo, 1, 0x10c).unwrap();
    assert_eq!(chain, vec![PdbSymHandle { id: 20 }, PdbSymHandle { id: 21 }]);

    let (heap, _, va) = session.find_global_symbol_address(b"app.main.total", |_| true).unwrap();
    assert_eq!((heap, va), (SymbolHeapId::Global, Address::new(0x1000_3020)));

    let y = session.find_child_type(PdbTypeHandle { id: 40 }, b"y").unwrap();
    assert_eq!(session.type_info(y).unwrap().offset(), Some(4));

    assert_eq!(session.find_udt_short_name(b"app.main.Point").unwrap(), b"Point");
    assert_eq!(session.module_names().unwrap(), vec![b"app.main".to_vec()]);
}
