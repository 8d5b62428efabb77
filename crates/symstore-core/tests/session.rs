//! Tests for sessions: address translation, cached lookups, scope chains
//! and the name indices

mod common;

use common::*;
use symstore_core::codeview::CodeViewStore;
use symstore_core::error::SymbolError;
use symstore_core::session::DebugHelper;
use symstore_core::types::{Address, LocationType, SymTag, SymbolHeapId};
use symstore_core::{DataSource, DebugStore, Session, SessionConfig, SymbolInfo};

const LOAD: u64 = 0x40_0000;

fn data_source() -> DataSource<CodeViewStore>
{
    DataSource::from_codeview_bytes(rich_image(), &sections()).unwrap()
}

fn session() -> Session<CodeViewStore>
{
    let mut session = data_source().open_session();
    session.set_load_address(Address::new(LOAD));
    session
}

fn name(session: &Session<CodeViewStore>, handle: symstore_core::codeview::CvSymHandle) -> Vec<u8>
{
    session.symbol_info(handle).unwrap().name().unwrap_or_default().to_vec()
}

#[test]
fn test_address_translation()
{
    let session = session();

    assert_eq!(session.rva_from_sec_offset(2, 0x20), Some(0x3020));
    assert_eq!(session.va_from_sec_offset(2, 0x20), Address::new(LOAD + 0x3020));
    assert_eq!(session.va_from_sec_offset(9, 0x20), Address::ZERO);

    assert_eq!(session.sec_offset_from_rva(0x3024), Some((2, 0x24)));
    assert_eq!(session.sec_offset_from_rva(0x10), None);
    assert_eq!(session.sec_offset_from_va(Address::new(LOAD + 0x1104)), Some((1, 0x104)));
    assert_eq!(session.sec_offset_from_va(Address::new(0x1000)), None);
}

#[test]
fn test_tls_section_is_detected()
{
    let source = data_source();
    assert_eq!(source.store().tls_segment(), 3);

    let session = source.open_session();
    let (_, handle, _) = session.find_global_symbol_address(b"app.main.slot", |_| true).unwrap();
    assert_eq!(session.symbol_info(handle).unwrap().location(), Some(LocationType::Tls));
}

#[test]
fn test_outer_symbol_lookups_agree()
{
    let mut session = session();

    let (by_addr, distance) = session.find_outer_symbol_by_addr(SymbolHeapId::Global, 1, 0x110).unwrap();
    assert_eq!(name(&session, by_addr), b"foo");
    assert_eq!(distance, 0x10);

    // repeated lookups come from the cache and must not change the answer
    for _ in 0..3 {
        let hit = session.find_outer_symbol_by_addr(SymbolHeapId::Global, 1, 0x110).unwrap();
        assert_eq!(hit, (by_addr, 0x10));
    }

    assert_eq!(session.find_outer_symbol_by_rva(SymbolHeapId::Global, 0x1110).unwrap(), (by_addr, 0x10));
    assert_eq!(
        session.find_outer_symbol_by_va(SymbolHeapId::Global, Address::new(LOAD + 0x1110)).unwrap(),
        (by_addr, 0x10)
    );
}

#[test]
fn test_outer_symbol_misses()
{
    let mut session = session();

    assert!(session.find_outer_symbol_by_rva(SymbolHeapId::Global, 0x10).unwrap_err().is_not_found());
    assert!(session.find_outer_symbol_by_va(SymbolHeapId::Global, Address::new(0x10)).unwrap_err().is_not_found());
    assert!(session.find_outer_symbol_by_addr(SymbolHeapId::Global, 1, 0x80).unwrap_err().is_not_found());
    // misses are not cached as hits
    assert!(session.find_outer_symbol_by_addr(SymbolHeapId::Global, 1, 0x80).is_err());
}

#[test]
fn test_innermost_symbol_chain()
{
    let mut session = session();
    let (foo, _) = session.find_outer_symbol_by_addr(SymbolHeapId::Global, 1, 0x10c).unwrap();

    let chain = session.find_innermost_symbol(foo, 1, 0x10c).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0], foo);
    let block = session.symbol_info(chain[1]).unwrap();
    assert_eq!(block.sym_tag(), SymTag::Block);
    assert_eq!(block.address_offset(), Some(0x108));

    // outside the block only the function itself covers the address
    assert_eq!(session.find_innermost_symbol(foo, 1, 0x104).unwrap(), vec![foo]);

    let err = session.find_innermost_symbol(foo, 2, 0x10c).unwrap_err();
    assert!(matches!(err, SymbolError::NotFound(_)));
}

#[test]
fn test_innermost_depth_limit()
{
    let config = SessionConfig {
        innermost_depth_limit: 0,
        ..SessionConfig::default()
    };
    let mut session = data_source().open_session_with(config);
    let (foo, _) = session.find_outer_symbol_by_addr(SymbolHeapId::Global, 1, 0x10c).unwrap();

    assert_eq!(session.find_innermost_symbol(foo, 1, 0x10c).unwrap(), vec![foo]);
}

#[test]
fn test_find_child_symbol_and_type()
{
    let mut session = session();
    let (foo, _) = session.find_outer_symbol_by_addr(SymbolHeapId::Global, 1, 0x100).unwrap();

    let arg = session.find_child_symbol(foo, b"arg").unwrap();
    assert_eq!(name(&session, arg), b"arg");
    assert!(session.find_child_symbol(foo, b"tmp").unwrap_err().is_not_found());

    let point = session.store().type_from_type_index(u32::from(POINT)).unwrap();
    let z = session.find_child_type(point, b"z").unwrap();
    assert_eq!(session.type_info(z).unwrap().offset(), Some(8));
    assert!(session.find_child_type(point, b"w").unwrap_err().is_not_found());
}

#[test]
fn test_global_symbol_address_by_heap()
{
    let session = session();

    let (heap, _, va) = session.find_global_symbol_address(b"app.main.total", |_| true).unwrap();
    assert_eq!((heap, va), (SymbolHeapId::Global, Address::new(LOAD + 0x3020)));

    let (heap, _, va) = session.find_global_symbol_address(b"app.main.counter", |_| true).unwrap();
    assert_eq!((heap, va), (SymbolHeapId::Static, Address::new(LOAD + 0x3010)));

    let (heap, _, va) = session.find_global_symbol_address(b"_foo", |_| true).unwrap();
    assert_eq!((heap, va), (SymbolHeapId::Public, Address::new(LOAD + 0x1100)));

    let reject_publics = |info: &dyn SymbolInfo| info.sym_tag() != SymTag::PublicSymbol;
    assert!(session.find_global_symbol_address(b"_foo", reject_publics).is_none());
    assert!(session.find_global_symbol_address(b"missing", |_| true).is_none());
}

#[test]
fn test_display_name_demangles()
{
    let mut session = session();
    let (handle, _) = session.find_outer_symbol_by_addr(SymbolHeapId::Public, 1, 0x1a0).unwrap();
    assert_eq!(session.display_name(handle).unwrap(), "core::fmt::write");

    let (handle, _) = session.find_outer_symbol_by_addr(SymbolHeapId::Public, 1, 0x100).unwrap();
    assert_eq!(session.display_name(handle).unwrap(), "_foo");
}

#[test]
fn test_udt_short_and_long_names()
{
    let mut session = session();

    assert_eq!(session.find_udt_short_name(b"app.main.Point").unwrap(), b"Point");
    assert_eq!(session.find_udt_long_name(b"Color").unwrap(), b"app.main.Color");
    assert!(matches!(session.find_udt_long_name(b"Point"), Err(SymbolError::Ambiguous(_))));
    assert!(session.find_udt_long_name(b"Line").unwrap_err().is_not_found());
    assert!(session.find_udt_short_name(b"app.main.Line").unwrap_err().is_not_found());
}

#[test]
fn test_function_short_names()
{
    let mut session = session();

    assert_eq!(session.find_func_short_name(b"app.main.run").unwrap(), b"run");
    assert_eq!(session.find_func_short_name(b"foo").unwrap(), b"foo");
    assert_eq!(
        session.find_func_short_name(b"app.main.Point.__debugOverview").unwrap(),
        b"Point.__debugOverview"
    );
    // file-local functions live in the static heap and are not indexed
    assert!(session.find_func_short_name(b"helper").is_err());
}

#[test]
fn test_matching_globals()
{
    let mut session = session();

    let found = session.find_matching_globals(b"total").unwrap();
    let mut names: Vec<Vec<u8>> = found.into_iter().map(|h| name(&session, h)).collect();
    names.sort();
    assert_eq!(names, vec![b"app.main.total".to_vec(), b"lib.total".to_vec()]);

    assert!(session.find_matching_globals(b"otal").unwrap().is_empty());
}

#[test]
fn test_matching_debug_funcs()
{
    let mut session = session();

    let found = session.find_matching_debug_funcs(b"Point").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, DebugHelper::Overview);
    assert_eq!(name(&session, found[0].1), b"app.main.Point.__debugOverview");

    assert_eq!(session.find_matching_debug_funcs(b"app.main.Point").unwrap().len(), 1);
    assert!(session.find_matching_debug_funcs(b"lib.Point").unwrap().is_empty());
}

#[test]
fn test_module_names()
{
    let mut session = session();
    assert_eq!(session.module_names().unwrap(), vec![b"app.main".to_vec(), b"lib".to_vec()]);
}

#[test]
fn test_sessions_share_the_store()
{
    let source = data_source();
    let mut first = source.open_session();
    let mut second = source.open_session();
    second.set_load_address(Address::new(LOAD));

    assert_eq!(first.compiland_count().unwrap(), 2);
    assert_eq!(second.compiland_info(2).unwrap().name, b"util.obj");

    // each session has its own load address and caches
    assert_eq!(first.load_address(), Address::ZERO);
    let a = first.find_outer_symbol_by_rva(SymbolHeapId::Global, 0x1140).unwrap();
    let b = second.find_outer_symbol_by_va(SymbolHeapId::Global, Address::new(LOAD + 0x1140)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_line_delegation()
{
    let session = session();

    let line = session.find_line(1, 0x144).unwrap();
    assert_eq!(line.number, 30);
    assert_eq!(session.find_line_by_num(2, 0, 11).unwrap().number, 12);
    assert_eq!(session.find_lines(false, b"util.d", 1, 100).len(), 2);
}
