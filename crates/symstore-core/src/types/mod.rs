//! # Types
//!
//! Value types shared by the address map, both store backends and the session.
//!
//! None of these types borrow from a store, so they can be kept around after
//! the query that produced them.

pub mod address;
pub mod lines;
pub mod symbols;

// Re-export all public types
pub use address::{Address, SegmentOffset};
pub use lines::{CompilandInfo, FileInfo, FileSegmentInfo, LineInfo, LineNumber, SegmentInfo, LAST_LINE_NUMBER_END};
pub use symbols::{
    BasicType, DataKind, LocationType, SymTag, SymbolHeapId, TypeIndex, UdtKind, Variant, FIRST_RECORD_TYPE_INDEX,
};
