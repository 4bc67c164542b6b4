//! Directory → zip bytes.
//!
//! Writes entries in walk order: per file a Local File Header followed by the
//! (possibly deflated) data, then the Central Directory, then the End of
//! Central Directory record. Directories are emitted as explicit zero-length
//! entries with a trailing `/` so that empty directories survive the
//! round-trip.

use std::fs;
use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::Utc;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use tracing::debug;
use walkdir::WalkDir;

use super::ArchiveError;
use super::format::{
    CDFH_SIGNATURE, CompressionMethod, EndOfCentralDirectory, LFH_SIGNATURE, VERSION_NEEDED,
    to_dos_datetime,
};

/// Central-directory bookkeeping for one written entry.
struct WrittenEntry {
    name: String,
    method: CompressionMethod,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    lfh_offset: u32,
    is_directory: bool,
}

/// Pack the directory tree under `from` into zip archive bytes.
pub(super) fn pack(from: &Path) -> Result<Vec<u8>, ArchiveError> {
    let (dos_time, dos_date) = to_dos_datetime(Utc::now());
    let mut out: Vec<u8> = Vec::new();
    let mut written: Vec<WrittenEntry> = Vec::new();

    for walked in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let walked = walked.map_err(std::io::Error::from)?;
        let Ok(rel) = walked.path().strip_prefix(from) else {
            continue;
        };
        let mut name = rel
            .iter()
            .map(|seg| seg.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if walked.file_type().is_dir() {
            name.push('/');
            let offset = checked_offset(&out)?;
            write_lfh(&mut out, &name, CompressionMethod::Stored, 0, 0, 0, dos_time, dos_date)?;
            written.push(WrittenEntry {
                name,
                method: CompressionMethod::Stored,
                crc32: 0,
                compressed_size: 0,
                uncompressed_size: 0,
                lfh_offset: offset,
                is_directory: true,
            });
        } else if walked.file_type().is_file() {
            let data = fs::read(walked.path())?;
            let uncompressed_size =
                u32::try_from(data.len()).map_err(|_| ArchiveError::TooLarge)?;
            let crc32 = crc32fast::hash(&data);

            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            let deflated = encoder.finish()?;

            // Store when deflate does not help (already-compressed payloads).
            let (method, payload) = if deflated.len() < data.len() {
                (CompressionMethod::Deflate, deflated)
            } else {
                (CompressionMethod::Stored, data)
            };
            let compressed_size =
                u32::try_from(payload.len()).map_err(|_| ArchiveError::TooLarge)?;

            let offset = checked_offset(&out)?;
            write_lfh(
                &mut out,
                &name,
                method,
                crc32,
                compressed_size,
                uncompressed_size,
                dos_time,
                dos_date,
            )?;
            out.extend_from_slice(&payload);
            written.push(WrittenEntry {
                name,
                method,
                crc32,
                compressed_size,
                uncompressed_size,
                lfh_offset: offset,
                is_directory: false,
            });
        }
        // Anything else (symlinks, sockets) is not part of the store contract.
    }

    let cd_offset = checked_offset(&out)?;
    for entry in &written {
        write_cdfh(&mut out, entry, dos_time, dos_date)?;
    }
    let cd_end = checked_offset(&out)?;
    let total_entries =
        u16::try_from(written.len()).map_err(|_| ArchiveError::TooLarge)?;

    EndOfCentralDirectory {
        disk_entries: total_entries,
        total_entries,
        cd_size: cd_end - cd_offset,
        cd_offset,
        comment_len: 0,
    }
    .write_to(&mut out)?;

    debug!(entries = written.len(), bytes = out.len(), "packed archive");
    Ok(out)
}

fn checked_offset(out: &[u8]) -> Result<u32, ArchiveError> {
    u32::try_from(out.len()).map_err(|_| ArchiveError::TooLarge)
}

#[allow(clippy::too_many_arguments)]
fn write_lfh(
    out: &mut Vec<u8>,
    name: &str,
    method: CompressionMethod,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    dos_time: u16,
    dos_date: u16,
) -> Result<(), ArchiveError> {
    let name_len = u16::try_from(name.len()).map_err(|_| ArchiveError::TooLarge)?;
    out.extend_from_slice(LFH_SIGNATURE);
    out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
    out.write_u16::<LittleEndian>(0)?; // flags
    out.write_u16::<LittleEndian>(method.as_u16())?;
    out.write_u16::<LittleEndian>(dos_time)?;
    out.write_u16::<LittleEndian>(dos_date)?;
    out.write_u32::<LittleEndian>(crc32)?;
    out.write_u32::<LittleEndian>(compressed_size)?;
    out.write_u32::<LittleEndian>(uncompressed_size)?;
    out.write_u16::<LittleEndian>(name_len)?;
    out.write_u16::<LittleEndian>(0)?; // extra field length
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

fn write_cdfh(
    out: &mut Vec<u8>,
    entry: &WrittenEntry,
    dos_time: u16,
    dos_date: u16,
) -> Result<(), ArchiveError> {
    let name_len = u16::try_from(entry.name.len()).map_err(|_| ArchiveError::TooLarge)?;
    // FAT directory attribute, so extractors recreate directory entries.
    let external_attrs: u32 = if entry.is_directory { 0x10 } else { 0 };

    out.extend_from_slice(CDFH_SIGNATURE);
    out.write_u16::<LittleEndian>(VERSION_NEEDED)?; // version made by
    out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
    out.write_u16::<LittleEndian>(0)?; // flags
    out.write_u16::<LittleEndian>(entry.method.as_u16())?;
    out.write_u16::<LittleEndian>(dos_time)?;
    out.write_u16::<LittleEndian>(dos_date)?;
    out.write_u32::<LittleEndian>(entry.crc32)?;
    out.write_u32::<LittleEndian>(entry.compressed_size)?;
    out.write_u32::<LittleEndian>(entry.uncompressed_size)?;
    out.write_u16::<LittleEndian>(name_len)?;
    out.write_u16::<LittleEndian>(0)?; // extra field length
    out.write_u16::<LittleEndian>(0)?; // comment length
    out.write_u16::<LittleEndian>(0)?; // disk number start
    out.write_u16::<LittleEndian>(0)?; // internal attributes
    out.write_u32::<LittleEndian>(external_attrs)?;
    out.write_u32::<LittleEndian>(entry.lfh_offset)?;
    out.extend_from_slice(entry.name.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use crate::archive::{ArchiveCodec, SilentEvents, ZipCodec};

    fn collect_tree(root: &Path) -> Vec<(String, Option<Vec<u8>>)> {
        let mut items: Vec<(String, Option<Vec<u8>>)> = walkdir::WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| {
                let e = e.unwrap();
                let rel = e
                    .path()
                    .strip_prefix(root)
                    .unwrap()
                    .iter()
                    .map(|s| s.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let content = e
                    .file_type()
                    .is_file()
                    .then(|| fs::read(e.path()).unwrap());
                (rel, content)
            })
            .collect();
        items.sort();
        items
    }

    #[test]
    fn test_pack_extract_round_trip() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("sub/deeper")).unwrap();
        fs::create_dir_all(source.path().join("empty")).unwrap();
        fs::write(source.path().join("top.txt"), b"top level").unwrap();
        fs::write(source.path().join("sub/data.bin"), (0u8..=255).collect::<Vec<_>>()).unwrap();
        // Highly repetitive content exercises the deflate path.
        fs::write(source.path().join("sub/deeper/rep.txt"), "abc".repeat(2000)).unwrap();

        let archive = ZipCodec.pack(source.path()).unwrap();

        let target = TempDir::new().unwrap();
        ZipCodec
            .extract(&archive, target.path(), &SilentEvents)
            .unwrap();

        assert_eq!(collect_tree(source.path()), collect_tree(target.path()));
    }

    #[test]
    fn test_pack_empty_directory() {
        let source = TempDir::new().unwrap();
        let archive = ZipCodec.pack(source.path()).unwrap();

        let target = TempDir::new().unwrap();
        ZipCodec
            .extract(&archive, target.path(), &SilentEvents)
            .unwrap();
        assert!(collect_tree(target.path()).is_empty());
    }

    #[test]
    fn test_incompressible_data_is_stored() {
        // A tiny high-entropy file must still round-trip even though deflate
        // cannot shrink it (the writer falls back to method 0).
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("noise.bin"), [0x37, 0xc1, 0x9e]).unwrap();

        let archive = ZipCodec.pack(source.path()).unwrap();
        let target = TempDir::new().unwrap();
        ZipCodec
            .extract(&archive, target.path(), &SilentEvents)
            .unwrap();
        assert_eq!(fs::read(target.path().join("noise.bin")).unwrap(), [0x37, 0xc1, 0x9e]);
    }
}
