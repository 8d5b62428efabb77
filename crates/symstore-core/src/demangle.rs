//! Symbol name demangling.
//!
//! Public symbols carry linker names. Rust-mangled names (legacy `_ZN...E`
//! and v0 `_R...`) are turned back into paths with `rustc_demangle`. The
//! leading underscore that 32-bit C compilers add is also stripped before a
//! retry, since CodeView publics keep it. Everything else is shown as stored.

use std::borrow::Cow;

use rustc_demangle::try_demangle;

/// Language a mangled name was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLanguage
{
    Rust,
    Cpp,
    Unknown,
}

/// Guess the language of a raw symbol name from its mangling prefix.
pub fn detect_language(raw: &str) -> NameLanguage
{
    let raw = raw.strip_prefix('_').filter(|r| r.starts_with('_')).unwrap_or(raw);
    if raw.starts_with("_R") || (raw.starts_with("_ZN") && try_demangle(raw).is_ok()) || raw.contains("::") {
        NameLanguage::Rust
    } else if raw.starts_with("_Z") || raw.starts_with('?') {
        NameLanguage::Cpp
    } else {
        NameLanguage::Unknown
    }
}

/// Demangled form of `raw`, if it is a Rust-mangled name.
pub fn demangle(raw: &str) -> Option<String>
{
    if let Ok(d) = try_demangle(raw) {
        return Some(format!("{d:#}"));
    }

    // `__ZN...` as emitted with a C-style underscore prefix
    raw.strip_prefix('_')
        .and_then(|r| try_demangle(r).ok())
        .map(|d| format!("{d:#}"))
}

/// Name as it should be shown to a user.
pub fn display_name(raw: &[u8]) -> Cow<'_, str>
{
    let text = String::from_utf8_lossy(raw);
    match demangle(&text) {
        Some(demangled) => Cow::Owned(demangled),
        None => text,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_demangles_legacy_rust_names()
    {
        let raw = "_ZN4core3fmt5write17h0123456789abcdefE";
        assert_eq!(demangle(raw).as_deref(), Some("core::fmt::write"));
        assert_eq!(display_name(raw.as_bytes()), "core::fmt::write");
        assert_eq!(detect_language(raw), NameLanguage::Rust);
    }

    #[test]
    fn test_strips_c_underscore_before_retry()
    {
        let raw = "__ZN4core3fmt5write17h0123456789abcdefE";
        assert_eq!(demangle(raw).as_deref(), Some("core::fmt::write"));
    }

    #[test]
    fn test_plain_names_pass_through()
    {
        assert_eq!(demangle("_main"), None);
        assert_eq!(display_name(b"_main"), "_main");
        assert_eq!(detect_language("?foo@@YAXXZ"), NameLanguage::Cpp);
        assert_eq!(detect_language("main"), NameLanguage::Unknown);
    }
}
