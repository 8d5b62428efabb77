//! # symstore-core
//!
//! Reader and indexer for CodeView (NB09) and PDB debug information.
//!
//! This crate turns debug-info blobs into a navigable model of compilands,
//! types, symbols, source lines and address mappings:
//! - [`AddressMap`]: section offsets to RVAs and back
//! - [`CodeViewStore`]: parses an NB09 blob in place, without copying records
//! - [`PdbStore`]: adapts an external PDB session to the same contract
//! - [`Session`]: address translation, cached address lookups and name indices
//! - [`DataSource`]: loads an image and opens sessions over it
//!
//! Both stores implement [`DebugStore`], and every record they return is
//! queried through [`SymbolInfo`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use symstore_core::prelude::*;
//!
//! let source = DataSource::load_image("app.exe")?;
//! let mut session = source.open_session();
//! let (function, delta) = session.find_outer_symbol_by_rva(SymbolHeapId::Global, 0x1110)?;
//! println!("{} + {delta:#x}", session.display_name(function)?);
//! # Ok::<(), symstore_core::SymbolError>(())
//! ```

pub mod address_map;
pub mod codeview;
pub mod data_source;
pub mod demangle;
pub mod error;
pub mod info;
pub mod line_search;
pub mod pdb;
pub mod prelude;
pub mod session;
pub mod store;
pub mod types;

pub use address_map::{AddressMap, SectionHeader};
pub use codeview::CodeViewStore;
pub use data_source::DataSource;
pub use error::{Result, SymbolError, SymbolResult};
pub use info::SymbolInfo;
pub use pdb::{PdbSession, PdbStore};
pub use session::{Session, SessionConfig};
pub use store::DebugStore;
