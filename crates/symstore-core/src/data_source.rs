//! # Data Source
//!
//! Loads the debug information of one image and hands out sessions over it.
//!
//! A data source owns the store and the address map behind `Arc`s so that
//! every [`Session`] it opens shares them.
//!
//! ## Sources
//!
//! - A PE32/PE32+ image whose debug directory carries an embedded `NB09`
//!   CodeView blob ([`DataSource::load_image`], [`DataSource::from_image_bytes`])
//! - A raw `NB09` blob plus the image's section headers
//!   ([`DataSource::from_codeview_bytes`])
//! - A caller-supplied PDB session ([`DataSource::from_pdb_session`])
//!
//! Images that point at an external PDB (`RSDS`) are reported as
//! `NotImplemented`: the PDB itself has to be opened by the caller and
//! supplied as a session.

use std::fs;
use std::mem::size_of;
use std::path::Path;
use std::sync::Arc;

use object::pe::{ImageDebugDirectory, IMAGE_DEBUG_TYPE_CODEVIEW, IMAGE_DIRECTORY_ENTRY_DEBUG};
use object::read::pe::{ImageNtHeaders, PeFile, PeFile32, PeFile64};
use object::{FileKind, LittleEndian as LE, ReadRef};
use tracing::{debug, warn};

use crate::address_map::{AddressMap, SectionHeader};
use crate::codeview::constants::NB09_SIGNATURE;
use crate::codeview::CodeViewStore;
use crate::error::{Result, SymbolError};
use crate::pdb::{PdbSession, PdbStore};
use crate::session::{Session, SessionConfig};
use crate::store::DebugStore;

/// Signature of a CodeView entry naming an external PDB 7.0 file.
const RSDS_SIGNATURE: &[u8; 4] = b"RSDS";

/// Name of the section holding thread-local storage.
const TLS_SECTION: &[u8] = b".tls";

/// A loaded store together with the address map of its image.
#[derive(Debug)]
pub struct DataSource<S: DebugStore>
{
    store: Arc<S>,
    address_map: Arc<AddressMap>,
}

impl<S: DebugStore> Clone for DataSource<S>
{
    fn clone(&self) -> Self
    {
        Self {
            store: Arc::clone(&self.store),
            address_map: Arc::clone(&self.address_map),
        }
    }
}

impl<S: DebugStore> DataSource<S>
{
    /// Wrap an already initialized store.
    pub fn new(store: S, address_map: AddressMap) -> Self
    {
        Self {
            store: Arc::new(store),
            address_map: Arc::new(address_map),
        }
    }

    pub fn store(&self) -> &S
    {
        &self.store
    }

    pub fn address_map(&self) -> &AddressMap
    {
        &self.address_map
    }

    /// A new session with default tunables.
    pub fn open_session(&self) -> Session<S>
    {
        self.open_session_with(SessionConfig::default())
    }

    pub fn open_session_with(&self, config: SessionConfig) -> Session<S>
    {
        Session::with_config(Arc::clone(&self.store), Arc::clone(&self.address_map), config)
    }
}

impl DataSource<CodeViewStore>
{
    /// Read a PE image from disk and load its embedded CodeView information.
    ///
    /// ## Errors
    ///
    /// `Io` if the file cannot be read, otherwise as
    /// [`DataSource::from_image_bytes`].
    pub fn load_image(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path).inspect_err(|err| warn!(path = %path.display(), %err, "cannot read image"))?;
        debug!(path = %path.display(), size = bytes.len(), "read image");
        Self::from_image_bytes(&bytes)
    }

    /// Load the embedded CodeView information of a PE image in memory.
    ///
    /// ## Errors
    ///
    /// - `Object` if the bytes are not a PE image
    /// - `NotFound` if the image has no CodeView debug entry
    /// - `NotImplemented` if the entry names an external PDB
    /// - `Format` if the embedded blob is malformed
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self>
    {
        let result = match FileKind::parse(bytes)? {
            FileKind::Pe32 => Self::from_pe(&PeFile32::parse(bytes)?, bytes),
            FileKind::Pe64 => Self::from_pe(&PeFile64::parse(bytes)?, bytes),
            other => Err(SymbolError::InvalidArgument(format!("not a PE image: {other:?}"))),
        };
        result.inspect_err(|err| warn!(%err, "image rejected"))
    }

    fn from_pe<'data, Pe, R>(file: &PeFile<'data, Pe, R>, bytes: &[u8]) -> Result<Self>
    where
        Pe: ImageNtHeaders,
        R: ReadRef<'data>,
    {
        let address_map = AddressMap::from_pe(file)?;
        let blob = codeview_blob(file, bytes)?;
        Self::with_address_map(blob.to_vec(), address_map)
    }

    /// Load a raw `NB09` blob described by explicit section headers.
    ///
    /// ## Errors
    ///
    /// `Format` if the blob is malformed, `InvalidArgument` for an unusable
    /// section table.
    pub fn from_codeview_bytes(bytes: impl Into<Arc<[u8]>>, sections: &[SectionHeader]) -> Result<Self>
    {
        let address_map = AddressMap::load_from_sections(sections)?;
        Self::with_address_map(bytes, address_map)
    }

    fn with_address_map(bytes: impl Into<Arc<[u8]>>, address_map: AddressMap) -> Result<Self>
    {
        let mut store = CodeViewStore::from_bytes(bytes)?;
        store.set_tls_segment(address_map.find_section(TLS_SECTION));
        debug!(
            sections = address_map.section_count(),
            tls_segment = store.tls_segment(),
            "loaded CodeView data source"
        );
        Ok(Self::new(store, address_map))
    }
}

impl<P: PdbSession> DataSource<PdbStore<P>>
{
    /// Adapt an open PDB session, taking the address map from its segments.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if the session reports an unusable segment table.
    pub fn from_pdb_session(session: P) -> Result<Self>
    {
        let address_map = AddressMap::from_pdb_segments(&session.segments())
            .inspect_err(|err| warn!(%err, "PDB segment table rejected"))?;
        debug!(sections = address_map.section_count(), "loaded PDB data source");
        Ok(Self::new(PdbStore::new(session), address_map))
    }
}

/// The CodeView blob a PE debug directory points at.
fn codeview_blob<'a, 'data, Pe, R>(file: &PeFile<'data, Pe, R>, bytes: &'a [u8]) -> Result<&'a [u8]>
where
    Pe: ImageNtHeaders,
    R: ReadRef<'data>,
{
    let missing = || SymbolError::NotFound("no CodeView debug information".to_string());

    let directory = file.data_directory(IMAGE_DIRECTORY_ENTRY_DEBUG).ok_or_else(missing)?;
    let table = directory.data(file.data(), &file.section_table())?;
    let count = table.len() / size_of::<ImageDebugDirectory>();
    let (entries, _) = object::pod::slice_from_bytes::<ImageDebugDirectory>(table, count)
        .map_err(|()| SymbolError::Format("debug directory table".to_string()))?;

    for entry in entries {
        if entry.typ.get(LE) != IMAGE_DEBUG_TYPE_CODEVIEW {
            continue;
        }

        let start = entry.pointer_to_raw_data.get(LE) as usize;
        let size = entry.size_of_data.get(LE) as usize;
        let blob = start
            .checked_add(size)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| SymbolError::Format(format!("CodeView entry at {start:#x}+{size:#x} out of bounds")))?;

        if blob.starts_with(NB09_SIGNATURE) {
            return Ok(blob);
        }
        if blob.starts_with(RSDS_SIGNATURE) {
            let name_start = 24.min(blob.len());
            let name = blob[name_start..].split(|&b| b == 0).next().unwrap_or_default();
            warn!(pdb = %String::from_utf8_lossy(name), "image refers to an external PDB");
            return Err(SymbolError::NotImplemented("external PDB files need a PDB session"));
        }
    }

    Err(missing())
}
