//! Zip parsing and extraction.
//!
//! Operates on an in-memory archive slice. The End of Central Directory is
//! located first (fast path when the archive carries no comment, bounded
//! backward search otherwise), then the Central Directory yields one
//! [`ZipEntry`] per stored file or directory.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use rustc_hash::FxHashSet;
use tracing::debug;

use super::format::{
    CDFH_SIGNATURE, CompressionMethod, EndOfCentralDirectory, LFH_SIGNATURE, LFH_SIZE, ZipEntry,
};
use super::{ArchiveError, ArchiveEvents};

/// Maximum zip comment size allowed by the format (65535 bytes).
///
/// Limits the search area when looking for an EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

// =============================================================================
// Extraction
// =============================================================================

/// Unpack every entry of `archive` into `into`.
pub(super) fn extract(
    archive: &[u8],
    into: &Path,
    events: &dyn ArchiveEvents,
) -> Result<(), ArchiveError> {
    let entries = list_entries(archive)?;
    debug!(entries = entries.len(), "extracting archive");
    events.begin(entries.len());

    // Directories already created, to skip repeated create_dir_all calls.
    let mut created: FxHashSet<PathBuf> = FxHashSet::default();

    for entry in &entries {
        events.entry(&entry.name, entry.uncompressed_size);
        let target = into.join(sanitize_entry_name(&entry.name)?);

        if entry.is_directory {
            if created.insert(target.clone()) {
                fs::create_dir_all(&target)?;
            }
            continue;
        }

        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
            && created.insert(parent.to_path_buf())
        {
            fs::create_dir_all(parent)?;
        }

        let data = read_entry(archive, entry)?;
        fs::write(&target, &data)?;
    }

    events.finish();
    Ok(())
}

/// Map an archive entry name to a relative path that cannot escape the
/// extraction directory. Absolute names, backslashes, and `.`/`..` segments
/// are rejected rather than resolved.
fn sanitize_entry_name(name: &str) -> Result<PathBuf, ArchiveError> {
    if name.starts_with('/') || name.contains('\\') {
        return Err(ArchiveError::UnsafeEntryName(name.to_string()));
    }
    let mut path = PathBuf::new();
    for segment in name.split('/') {
        match segment {
            "" => continue, // directory entries end with '/'
            "." | ".." => return Err(ArchiveError::UnsafeEntryName(name.to_string())),
            _ => path.push(segment),
        }
    }
    if path.as_os_str().is_empty() {
        return Err(ArchiveError::UnsafeEntryName(name.to_string()));
    }
    Ok(path)
}

// =============================================================================
// Central directory
// =============================================================================

/// List all entries in the archive.
pub(super) fn list_entries(archive: &[u8]) -> Result<Vec<ZipEntry>, ArchiveError> {
    let eocd = find_eocd(archive)?;
    if eocd.is_zip64() {
        return Err(ArchiveError::Zip64Unsupported);
    }

    let cd_start = eocd.cd_offset as usize;
    let cd_end = cd_start + eocd.cd_size as usize;
    let cd = archive
        .get(cd_start..cd_end)
        .ok_or(ArchiveError::InvalidRecord("Central Directory"))?;

    let mut cursor = Cursor::new(cd);
    let mut entries = Vec::with_capacity(eocd.total_entries as usize);
    for _ in 0..eocd.total_entries {
        entries.push(parse_cdfh(&mut cursor)?);
    }
    Ok(entries)
}

/// Find and parse the End of Central Directory record.
///
/// Tries the no-comment position first, then searches backwards through the
/// maximum comment span for the signature, verifying that the comment length
/// field accounts for the remaining bytes.
fn find_eocd(archive: &[u8]) -> Result<EndOfCentralDirectory, ArchiveError> {
    const EOCD_SIZE: usize = EndOfCentralDirectory::SIZE;

    if archive.len() < EOCD_SIZE {
        return Err(ArchiveError::NotAZip);
    }

    // Fast path: no comment, EOCD flush against the end.
    let tail = &archive[archive.len() - EOCD_SIZE..];
    if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
        return EndOfCentralDirectory::from_bytes(tail);
    }

    // Bounded backward search for an EOCD followed by a comment.
    let search_len = (MAX_COMMENT_SIZE + EOCD_SIZE).min(archive.len());
    let window = &archive[archive.len() - search_len..];
    for i in (0..window.len().saturating_sub(EOCD_SIZE)).rev() {
        if &window[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
            let comment_len = u16::from_le_bytes([window[i + 20], window[i + 21]]) as usize;
            if comment_len == window.len() - i - EOCD_SIZE {
                return EndOfCentralDirectory::from_bytes(&window[i..i + EOCD_SIZE]);
            }
        }
    }

    Err(ArchiveError::NotAZip)
}

/// Parse one Central Directory File Header at the cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry, ArchiveError> {
    let invalid = || ArchiveError::InvalidRecord("Central Directory File Header");

    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).map_err(|_| invalid())?;
    if sig != CDFH_SIGNATURE {
        return Err(invalid());
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()?;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let comment_len = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()?;

    // Per-entry zip64 sentinels only appear in zip64 archives.
    if compressed_size == 0xFFFF_FFFF || uncompressed_size == 0xFFFF_FFFF
        || lfh_offset == 0xFFFF_FFFF
    {
        return Err(ArchiveError::Zip64Unsupported);
    }

    let mut name_bytes = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name_bytes).map_err(|_| invalid())?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();
    let is_directory = name.ends_with('/');

    // Skip extra field and comment.
    cursor.set_position(cursor.position() + extra_len as u64 + comment_len as u64);

    Ok(ZipEntry {
        name,
        method: CompressionMethod::from_u16(method),
        compressed_size: compressed_size as u64,
        uncompressed_size: uncompressed_size as u64,
        crc32,
        lfh_offset: lfh_offset as u64,
        is_directory,
    })
}

// =============================================================================
// Entry data
// =============================================================================

/// Read and decompress one entry, verifying its checksum.
fn read_entry(archive: &[u8], entry: &ZipEntry) -> Result<Vec<u8>, ArchiveError> {
    let offset = data_offset(archive, entry)?;
    let compressed = archive
        .get(offset..offset + entry.compressed_size as usize)
        .ok_or(ArchiveError::InvalidRecord("entry data"))?;

    let data = match entry.method {
        CompressionMethod::Stored => compressed.to_vec(),
        CompressionMethod::Deflate => {
            let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
            DeflateDecoder::new(compressed).read_to_end(&mut out)?;
            out
        }
        CompressionMethod::Unknown(method) => {
            return Err(ArchiveError::UnsupportedMethod {
                name: entry.name.clone(),
                method,
            });
        }
    };

    let computed = crc32fast::hash(&data);
    if computed != entry.crc32 {
        return Err(ArchiveError::CrcMismatch {
            name: entry.name.clone(),
            stored: entry.crc32,
            computed,
        });
    }
    Ok(data)
}

/// Resolve where an entry's data begins.
///
/// The Local File Header repeats the variable-length name and extra fields
/// with lengths that may differ from the central directory's, so the data
/// offset must be computed from the LFH itself.
fn data_offset(archive: &[u8], entry: &ZipEntry) -> Result<usize, ArchiveError> {
    let invalid = || ArchiveError::InvalidRecord("Local File Header");

    let start = entry.lfh_offset as usize;
    let lfh = archive.get(start..start + LFH_SIZE).ok_or_else(invalid)?;
    if &lfh[0..4] != LFH_SIGNATURE {
        return Err(invalid());
    }

    let name_len = u16::from_le_bytes([lfh[26], lfh[27]]) as usize;
    let extra_len = u16::from_le_bytes([lfh[28], lfh[29]]) as usize;
    Ok(start + LFH_SIZE + name_len + extra_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_names() {
        assert_eq!(sanitize_entry_name("a/b/c.txt").unwrap(), PathBuf::from("a/b/c.txt"));
        assert_eq!(sanitize_entry_name("dir/").unwrap(), PathBuf::from("dir"));
    }

    #[test]
    fn test_sanitize_rejects_escapes() {
        assert!(sanitize_entry_name("../evil").is_err());
        assert!(sanitize_entry_name("a/../../evil").is_err());
        assert!(sanitize_entry_name("/etc/passwd").is_err());
        assert!(sanitize_entry_name("a\\b").is_err());
        assert!(sanitize_entry_name("").is_err());
    }

    #[test]
    fn test_find_eocd_rejects_non_zip() {
        assert!(matches!(find_eocd(b"not a zip at all, nope"), Err(ArchiveError::NotAZip)));
        assert!(matches!(find_eocd(b""), Err(ArchiveError::NotAZip)));
    }
}
