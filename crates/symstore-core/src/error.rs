//! # Error Types
//!
//! Error handling for the symbol store, address map and session layers.
//!
//! We use `thiserror` to generate the `Error` trait implementations and the
//! display messages. Every operation in this crate returns [`SymbolResult`];
//! there is no panicking control flow on malformed input.
//!
//! ## Misses are normal
//!
//! A lookup miss (`NotFound`) is the most common error and is expected during
//! ordinary use, for example while trying the global, static and public heaps
//! in turn. It never invalidates the store or the session.

use thiserror::Error;

/// Main error type for symbol store operations
///
/// ## Error Categories
///
/// 1. **Input errors**: Format (bad signature, out-of-bounds records)
/// 2. **Lookup errors**: NotFound, Ambiguous
/// 3. **State errors**: AlreadyInitialized, NotInitialized
/// 4. **Capability errors**: NotImplemented (backend has no analogue)
/// 5. **Caller errors**: InvalidArgument
/// 6. **Container errors**: Io, Object (reading and parsing PE images)
#[derive(Error, Debug)]
pub enum SymbolError
{
    /// The debug information is malformed
    ///
    /// Raised for a signature mismatch, a directory entry that lies outside
    /// the buffer, or any record whose declared extent is out of bounds.
    #[error("Invalid debug info format: {0}")]
    Format(String),

    /// A name, address or index lookup found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// A short name maps to more than one fully qualified name
    #[error("Ambiguous name: {0}")]
    Ambiguous(String),

    /// `init_debug_info` was called on a store that is already initialized
    #[error("Debug info is already initialized")]
    AlreadyInitialized,

    /// The store was queried before a successful `init_debug_info`
    #[error("Debug info is not initialized")]
    NotInitialized,

    /// An allocation needed to build a table or index failed
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// The backend has no implementation for this operation
    ///
    /// The PDB-backed store reports this for the CodeView heap scopes and the
    /// raw segment/line tables it cannot express.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Invalid argument passed to a store or session function
    ///
    /// Examples:
    /// - A 0 or out-of-range compiland index
    /// - A section count equal to the invalid sentinel
    /// - A handle that does not refer to a scope-bearing record
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error while reading an image from disk
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The executable container could not be parsed
    #[error("Image parse error: {0}")]
    Object(#[from] object::read::Error),
}

impl SymbolError
{
    /// Whether this error is a lookup miss rather than a real failure.
    ///
    /// Ambiguous short names count as misses: the caller asked for one name
    /// and there is no single answer.
    #[must_use]
    pub const fn is_not_found(&self) -> bool
    {
        matches!(self, Self::NotFound(_) | Self::Ambiguous(_))
    }
}

impl From<scroll::Error> for SymbolError
{
    fn from(err: scroll::Error) -> Self
    {
        Self::Format(err.to_string())
    }
}

/// Convenience type alias for `Result<T, SymbolError>`
///
/// ```rust
/// use symstore_core::error::SymbolResult;
/// fn foo() -> SymbolResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SymbolResult<T> = std::result::Result<T, SymbolError>;

/// Short alias used throughout the crate.
pub type Result<T> = SymbolResult<T>;
