//! Archive packing and unpacking.
//!
//! The store consumes archives through the [`ArchiveCodec`] trait; the
//! provided implementation is [`ZipCodec`], a plain zip reader/writer.
//!
//! ## Reading strategy
//!
//! Zip files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the archive's tail
//! 2. Read the Central Directory to get metadata for all entries
//! 3. For extraction, resolve each entry's Local File Header and inflate
//!
//! Entry paths always use `/` separators regardless of host conventions.

mod format;
mod reader;
mod writer;

pub use format::CompressionMethod;

use std::path::Path;

use thiserror::Error;

// =============================================================================
// ArchiveCodec
// =============================================================================

/// A directory-tree ⇄ single-file archive transform.
///
/// Implementations must satisfy these invariants:
/// - `extract` then `pack` of the resulting directory reproduces the same
///   logical tree (entry order and metadata may differ).
/// - Entry names use `/` separators on every host.
/// - Entry names that would escape the target directory are rejected, never
///   resolved.
/// - All I/O errors are propagated, never silently ignored.
pub trait ArchiveCodec: Send + Sync {
    /// Unpack `archive` into the directory `into` (which must exist).
    ///
    /// Progress is reported to `events`; pass [`SilentEvents`] to discard it.
    fn extract(
        &self,
        archive: &[u8],
        into: &Path,
        events: &dyn ArchiveEvents,
    ) -> Result<(), ArchiveError>;

    /// Pack the directory tree under `from` into archive bytes.
    fn pack(&self, from: &Path) -> Result<Vec<u8>, ArchiveError>;
}

// =============================================================================
// ArchiveEvents
// =============================================================================

/// Observer for archive extraction progress.
///
/// Injected per call rather than registered globally, so embedders can route
/// progress wherever they like (or nowhere; see [`SilentEvents`]).
pub trait ArchiveEvents {
    /// Extraction is starting; `total` entries will be visited.
    fn begin(&self, total: usize) {
        let _ = total;
    }

    /// An entry is about to be written.
    fn entry(&self, name: &str, uncompressed_size: u64) {
        let _ = (name, uncompressed_size);
    }

    /// Extraction finished.
    fn finish(&self) {}
}

/// No-op event sink.
pub struct SilentEvents;

impl ArchiveEvents for SilentEvents {}

// =============================================================================
// ZipCodec
// =============================================================================

/// Zip implementation of [`ArchiveCodec`].
///
/// Supports stored and deflate entries. Zip64 archives are rejected; the
/// stores this crate backs are bounded far below the 32-bit zip limits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipCodec;

impl ArchiveCodec for ZipCodec {
    fn extract(
        &self,
        archive: &[u8],
        into: &Path,
        events: &dyn ArchiveEvents,
    ) -> Result<(), ArchiveError> {
        reader::extract(archive, into, events)
    }

    fn pack(&self, from: &Path) -> Result<Vec<u8>, ArchiveError> {
        writer::pack(from)
    }
}

// =============================================================================
// ArchiveError
// =============================================================================

/// Error from archive packing or unpacking.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No valid End of Central Directory record was found.
    #[error("not a valid zip archive")]
    NotAZip,

    /// A fixed-format record failed to parse.
    #[error("invalid {0} record")]
    InvalidRecord(&'static str),

    /// The archive uses zip64 extensions.
    #[error("zip64 archives are not supported")]
    Zip64Unsupported,

    /// An entry uses a compression method this codec cannot decode.
    #[error("unsupported compression method {method} for entry `{name}`")]
    UnsupportedMethod {
        /// Entry name as stored in the archive.
        name: String,
        /// Raw method id from the central directory.
        method: u16,
    },

    /// Decompressed data did not match the stored checksum.
    #[error("CRC-32 mismatch for entry `{name}`: stored {stored:08x}, computed {computed:08x}")]
    CrcMismatch {
        /// Entry name as stored in the archive.
        name: String,
        /// Checksum recorded in the central directory.
        stored: u32,
        /// Checksum of the extracted data.
        computed: u32,
    },

    /// An entry name is absolute or contains `.`/`..` segments and would
    /// escape the extraction directory.
    #[error("unsafe entry name `{0}`")]
    UnsafeEntryName(String),

    /// The tree being packed exceeds the 32-bit zip limits.
    #[error("archive would exceed 32-bit zip limits")]
    TooLarge,

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
