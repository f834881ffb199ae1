use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::latin1_trimmed;
use crate::error::MdfError;

const FILE_ID: &str = "MDF     ";

/// File identification block occupying bytes 0..64.
///
/// The three 8-character strings sit at offset 0; the numeric fields
/// follow at the fixed offset 24.
#[derive(Debug, Clone)]
pub struct IdentificationBlock {
    pub file_id: String,       // 8 bytes, "MDF     "
    pub format_id: String,     // 8 bytes, e.g. "3.30    "
    pub program_id: String,    // 8 bytes, writing program
    pub byte_order: u16,       // 0 = little-endian
    pub float_format: u16,     // 0 = IEEE 754
    pub version: u16,          // e.g. 300, 330
    pub code_page: u16,
}

impl IdentificationBlock {
    /// Parses the identification block from the first 64 bytes of a file
    /// and rejects files this reader cannot handle.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let expected_bytes = 64;
        if bytes.len() < expected_bytes {
            return Err(MdfError::Truncated {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        let file_id: String = bytes[0..8].iter().map(|&b| b as char).collect();
        if file_id != FILE_ID {
            return Err(MdfError::BadTag {
                actual: file_id,
                expected: FILE_ID.to_string(),
            });
        }

        let block = IdentificationBlock {
            file_id,
            format_id: latin1_trimmed(&bytes[8..16]),
            program_id: latin1_trimmed(&bytes[16..24]),
            byte_order: LittleEndian::read_u16(&bytes[24..26]),
            float_format: LittleEndian::read_u16(&bytes[26..28]),
            version: LittleEndian::read_u16(&bytes[28..30]),
            code_page: LittleEndian::read_u16(&bytes[30..32]),
        };

        if block.byte_order != 0 {
            return Err(MdfError::UnsupportedEndian);
        }
        if !(300..=330).contains(&block.version) {
            return Err(MdfError::UnsupportedVersion(block.version));
        }

        Ok(block)
    }
}
