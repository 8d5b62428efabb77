//! # CodeView Backend
//!
//! Reader for NB09 CodeView debug information embedded in an image.
//!
//! ## Modules
//!
//! - `reader`: bounds-checked reads over the blob
//! - `constants`: subsection kinds, record ids and leaf ids
//! - `numeric`: numeric leaf sizes and values
//! - `hash`: the name and address tables of the symbol heaps
//! - `symbols`: symbol records and their [`SymbolInfo`](crate::info::SymbolInfo) adapter
//! - `types`: type records, fields and primitive types
//! - `lines`: module headers and source line tables
//! - `store`: [`CodeViewStore`], the [`DebugStore`](crate::store::DebugStore) over all of the above

pub mod constants;
pub mod hash;
pub mod lines;
pub mod numeric;
pub mod reader;
pub mod store;
pub mod symbols;
pub mod types;

pub use hash::name_hash;
pub use reader::ByteReader;
pub use store::{CodeViewStore, CvNamedSearch, CvSymHandle, CvSymbolScope, CvTypeHandle, CvTypeScope};
pub use symbols::{CvSymbol, DataRecordKind};
pub use types::{CvType, CvTypeInfo};
