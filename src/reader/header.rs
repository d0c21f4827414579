//! Wire header parsing
//!
//! Every record on the wire is prefixed by a fixed 8-byte header:
//! - record format version (u16, big-endian)
//! - type name length including its NUL terminator (u16, big-endian)
//! - data region length (u32, big-endian)

use crate::error::StreamError;

/// Size of the fixed record header in bytes.
pub const REC_HDR_SIZE: usize = 8;

/// Record format version this client speaks.
///
/// There is no negotiation; any other version on the wire is a fatal
/// stream error.
pub const REC_VERSION: u16 = 2;

/// Parsed fixed-size record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    /// Record format version from the wire.
    pub version: u16,
    /// Length of the NUL-terminated type name region.
    pub type_len: usize,
    /// Length of the record's data region.
    pub data_len: usize,
}

impl WireHeader {
    /// Parse a record header from its 8 raw bytes.
    ///
    /// # Errors
    /// `StreamError::VersionMismatch` when the version is not
    /// [`REC_VERSION`]; nothing after a mismatched header can be trusted.
    pub fn parse(bytes: &[u8; REC_HDR_SIZE]) -> Result<Self, StreamError> {
        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        if version != REC_VERSION {
            return Err(StreamError::VersionMismatch {
                found: version,
                expected: REC_VERSION,
            });
        }

        Ok(Self {
            version,
            type_len: u16::from_be_bytes([bytes[2], bytes[3]]) as usize,
            data_len: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize,
        })
    }

    /// Total size of the record body following this header.
    pub fn record_size(&self) -> usize {
        self.type_len + self.data_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to build header bytes
    fn header_bytes(version: u16, type_len: u16, data_len: u32) -> [u8; REC_HDR_SIZE] {
        let mut bytes = [0u8; REC_HDR_SIZE];
        bytes[0..2].copy_from_slice(&version.to_be_bytes());
        bytes[2..4].copy_from_slice(&type_len.to_be_bytes());
        bytes[4..8].copy_from_slice(&data_len.to_be_bytes());
        bytes
    }

    #[test]
    fn test_parse_valid_header() {
        let header = WireHeader::parse(&header_bytes(REC_VERSION, 5, 4)).unwrap();
        assert_eq!(header.version, REC_VERSION);
        assert_eq!(header.type_len, 5);
        assert_eq!(header.data_len, 4);
        assert_eq!(header.record_size(), 9);
    }

    #[test]
    fn test_parse_version_mismatch() {
        let err = WireHeader::parse(&header_bytes(3, 5, 4)).unwrap_err();
        assert!(matches!(
            err,
            StreamError::VersionMismatch {
                found: 3,
                expected: REC_VERSION
            }
        ));
    }

    #[test]
    fn test_parse_large_data_length() {
        let header = WireHeader::parse(&header_bytes(REC_VERSION, 16, 1_000_000)).unwrap();
        assert_eq!(header.record_size(), 1_000_016);
    }
}
