//! Store construction.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::ResourceStore;
use crate::archive::{ArchiveCodec, ArchiveEvents, SilentEvents, ZipCodec};
use crate::error::StoreResult;

/// Builder for [`ResourceStore`] instances.
///
/// Every knob has a sensible default; the terminal methods are
/// [`open`](Self::open), [`open_bytes`](Self::open_bytes) and
/// [`create`](Self::create).
///
/// # Example
///
/// ```ignore
/// use zipstore::{ResourceStore, SilentEvents};
///
/// let store = ResourceStore::builder()
///     .indent_unit("\t")
///     .open(std::path::Path::new("save.dat"))?;
/// ```
pub struct StoreBuilder<C = ZipCodec> {
    codec: C,
    events: Box<dyn ArchiveEvents>,
    temp_in: Option<PathBuf>,
    indent_unit: String,
}

impl StoreBuilder<ZipCodec> {
    /// Create a builder with the zip codec, no event sink, the system temp
    /// directory, and a two-space indent unit.
    pub fn new() -> Self {
        Self {
            codec: ZipCodec,
            events: Box::new(SilentEvents),
            temp_in: None,
            indent_unit: "  ".to_string(),
        }
    }
}

impl Default for StoreBuilder<ZipCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ArchiveCodec> StoreBuilder<C> {
    /// Use a different archive codec.
    pub fn codec<D: ArchiveCodec>(self, codec: D) -> StoreBuilder<D> {
        StoreBuilder {
            codec,
            events: self.events,
            temp_in: self.temp_in,
            indent_unit: self.indent_unit,
        }
    }

    /// Receive extraction progress on `events` while opening.
    pub fn events(mut self, events: impl ArchiveEvents + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    /// Create the private working directory under `parent` instead of the
    /// system temp directory.
    pub fn temp_in(mut self, parent: impl Into<PathBuf>) -> Self {
        self.temp_in = Some(parent.into());
        self
    }

    /// Indent unit for written JSON documents.
    pub fn indent_unit(mut self, unit: impl Into<String>) -> Self {
        self.indent_unit = unit.into();
        self
    }

    /// Open an existing archive file.
    pub fn open(self, archive: &Path) -> StoreResult<ResourceStore<C>> {
        let bytes = fs::read(archive)?;
        self.open_bytes(&bytes)
    }

    /// Open an archive already held in memory.
    pub fn open_bytes(self, archive: &[u8]) -> StoreResult<ResourceStore<C>> {
        let workdir = self.make_workdir()?;
        self.codec
            .extract(archive, workdir.path(), self.events.as_ref())?;
        Ok(ResourceStore::from_parts(self.codec, self.indent_unit, workdir))
    }

    /// Start an empty store (no unpack source; only ever repacks).
    pub fn create(self) -> StoreResult<ResourceStore<C>> {
        let workdir = self.make_workdir()?;
        Ok(ResourceStore::from_parts(self.codec, self.indent_unit, workdir))
    }

    fn make_workdir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("zipstore-");
        match &self.temp_in {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
    }
}
