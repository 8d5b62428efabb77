//! Common module for library exports

pub use crate::address_map::{AddressMap, SectionHeader};
pub use crate::codeview::CodeViewStore;
pub use crate::data_source::DataSource;
pub use crate::error::{SymbolError, SymbolResult};
pub use crate::info::SymbolInfo;
pub use crate::pdb::{PdbSession, PdbStore};
pub use crate::session::{Session, SessionConfig};
pub use crate::store::DebugStore;
pub use crate::types::{Address, DataKind, LineNumber, SegmentOffset, SymTag, SymbolHeapId};
