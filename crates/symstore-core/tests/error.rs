//! Tests for error handling

use symstore_core::error::{Result, SymbolError};

#[test]
fn test_format_error_display()
{
    let err = SymbolError::Format("bad signature".to_string());
    let message = format!("{err}");
    assert!(message.contains("Invalid debug info format"));
    assert!(message.contains("bad signature"));
}

#[test]
fn test_not_found_display()
{
    let err = SymbolError::NotFound("foo".to_string());
    assert_eq!(format!("{err}"), "Not found: foo");
}

#[test]
fn test_not_implemented_display()
{
    let err = SymbolError::NotImplemented("line_info");
    assert!(format!("{err}").contains("line_info"));
}

#[test]
fn test_misses_are_not_found()
{
    assert!(SymbolError::NotFound(String::new()).is_not_found());
    assert!(SymbolError::Ambiguous(String::new()).is_not_found());
    assert!(!SymbolError::AlreadyInitialized.is_not_found());
    assert!(!SymbolError::Format(String::new()).is_not_found());
}

#[test]
fn test_io_error_conversion()
{
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.exe");
    let err: SymbolError = io.into();

    match err {
        SymbolError::Io(inner) => assert_eq!(inner.kind(), std::io::ErrorKind::NotFound),
        _ => panic!("Expected Io variant"),
    }
}

#[test]
fn test_scroll_error_becomes_format()
{
    let err: SymbolError = scroll::Error::TooBig { size: 8, len: 4 }.into();
    assert!(matches!(err, SymbolError::Format(_)));
}

#[test]
fn test_result_alias()
{
    fn lookup(found: bool) -> Result<u32>
    {
        if found { Ok(7) } else { Err(SymbolError::NotFound("x".to_string())) }
    }

    assert_eq!(lookup(true).unwrap(), 7);
    assert!(lookup(false).is_err());
}
