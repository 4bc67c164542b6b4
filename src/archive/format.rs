//! Zip record structures.
//!
//! Fixed-layout records shared by the reader and writer. All multi-byte
//! fields are little-endian.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Datelike, Timelike, Utc};

use super::ArchiveError;

/// Zip compression methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Method 0, no compression.
    Stored,
    /// Method 8, raw deflate.
    Deflate,
    /// Any other method id.
    Unknown(u16),
}

impl CompressionMethod {
    /// Decode a raw method id.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    /// The raw method id.
    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

// =============================================================================
// End of Central Directory
// =============================================================================

/// End of Central Directory (EOCD) - 22 bytes minimum.
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ArchiveError> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(ArchiveError::InvalidRecord("End of Central Directory"));
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _disk_with_cd = cursor.read_u16::<LittleEndian>()?;

        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Whether any field carries a zip64 sentinel value.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFF_FFFF
            || self.cd_offset == 0xFFFF_FFFF
    }

    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), ArchiveError> {
        out.extend_from_slice(Self::SIGNATURE);
        out.write_u16::<LittleEndian>(0)?; // disk number
        out.write_u16::<LittleEndian>(0)?; // disk with central directory
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }
}

// =============================================================================
// Header signatures
// =============================================================================

/// Central Directory File Header (CDFH) - 46 bytes minimum.
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local File Header (LFH) - 30 bytes.
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Version needed to extract: 2.0 (deflate, directories).
pub const VERSION_NEEDED: u16 = 20;

// =============================================================================
// Entries
// =============================================================================

/// A parsed zip entry, as listed by the central directory.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub is_directory: bool,
}

// =============================================================================
// DOS timestamps
// =============================================================================

/// Encode an instant as the MS-DOS (time, date) pair zip records carry.
///
/// DOS time has two-second resolution and no dates before 1980; earlier
/// instants clamp to the epoch of the format.
pub fn to_dos_datetime(t: DateTime<Utc>) -> (u16, u16) {
    let year = t.year();
    if year < 1980 {
        return (0, 0x21); // 1980-01-01 00:00:00
    }
    let date = (((year - 1980) as u16) << 9) | ((t.month() as u16) << 5) | t.day() as u16;
    let time =
        ((t.hour() as u16) << 11) | ((t.minute() as u16) << 5) | (t.second() as u16 / 2);
    (time, date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_compression_method_round_trip() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12).as_u16(), 12);
    }

    #[test]
    fn test_eocd_round_trip() {
        let eocd = EndOfCentralDirectory {
            disk_entries: 3,
            total_entries: 3,
            cd_size: 150,
            cd_offset: 1024,
            comment_len: 0,
        };
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);

        let parsed = EndOfCentralDirectory::from_bytes(&buf).unwrap();
        assert_eq!(parsed.total_entries, 3);
        assert_eq!(parsed.cd_offset, 1024);
        assert!(!parsed.is_zip64());
    }

    #[test]
    fn test_eocd_rejects_bad_signature() {
        let buf = vec![0u8; EndOfCentralDirectory::SIZE];
        assert!(EndOfCentralDirectory::from_bytes(&buf).is_err());
    }

    #[test]
    fn test_dos_datetime_fields() {
        let t = Utc.with_ymd_and_hms(2015, 7, 23, 14, 34, 5).unwrap();
        let (time, date) = to_dos_datetime(t);
        assert_eq!((date >> 9) + 1980, 2015);
        assert_eq!((date >> 5) & 0x0F, 7);
        assert_eq!(date & 0x1F, 23);
        assert_eq!(time >> 11, 14);
        assert_eq!((time >> 5) & 0x3F, 34);
        assert_eq!((time & 0x1F) * 2, 4); // two-second resolution
    }

    #[test]
    fn test_dos_datetime_clamps_pre_1980() {
        let t = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_dos_datetime(t), (0, 0x21));
    }
}
