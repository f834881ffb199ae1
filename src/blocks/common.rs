// src/blocks/common.rs
use byteorder::{ByteOrder, LittleEndian};

use crate::error::MdfError;

/// Common 4-byte prefix of every MDF 3 block: a 2-character ASCII tag
/// followed by the block size as a little-endian u16.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub tag: String,
    pub block_len: u16,
}

impl BlockHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        if bytes.len() < 4 {
            return Err(MdfError::Truncated {
                actual:   bytes.len(),
                expected: 4,
                file:     file!(),
                line:     line!(),
            });
        }
        Ok(BlockHeader {
            tag: latin1_trimmed(&bytes[0..2]),
            block_len: LittleEndian::read_u16(&bytes[2..4]),
        })
    }
}

/// Parsing interface for fixed-schema blocks.
pub trait BlockParse: Sized {
    /// Two-character ASCII tag expected at the block start.
    const TAG: &'static str;

    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError>;

    /// Reads the common header and verifies the tag against [`Self::TAG`].
    fn parse_header(bytes: &[u8]) -> Result<BlockHeader, MdfError> {
        let header = BlockHeader::from_bytes(bytes)?;
        if header.tag != Self::TAG {
            return Err(MdfError::BadTag {
                actual: header.tag,
                expected: Self::TAG.to_string(),
            });
        }
        Ok(header)
    }
}

/// Bounds-checked view of `need` bytes starting at an absolute offset.
pub fn block_at(data: &[u8], offset: u32, need: usize) -> Result<&[u8], MdfError> {
    let start = offset as usize;
    let end = start.checked_add(need).unwrap_or(usize::MAX);
    if end > data.len() {
        return Err(MdfError::Truncated {
            actual:   data.len(),
            expected: end,
            file:     file!(),
            line:     line!(),
        });
    }
    Ok(&data[start..end])
}

/// Bounds-checked view of everything from an absolute offset to the end
/// of the file. Used to hand a block parser its tail slice.
pub fn block_tail(data: &[u8], offset: u32) -> Result<&[u8], MdfError> {
    let start = offset as usize;
    if start >= data.len() {
        return Err(MdfError::Truncated {
            actual:   data.len(),
            expected: start + 4,
            file:     file!(),
            line:     line!(),
        });
    }
    Ok(&data[start..])
}

/// Decodes a latin-1 buffer, trimming trailing NUL padding.
///
/// MDF 3 predates UTF-8 adoption; every byte maps to its latin-1 code
/// point so decoding cannot fail.
pub fn latin1_trimmed(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    bytes[..end].iter().map(|&b| b as char).collect()
}

fn read_text_payload(data: &[u8], offset: u32, expected_tag: &str) -> Result<String, MdfError> {
    let fixed = block_at(data, offset, 4)?;
    let header = BlockHeader::from_bytes(fixed)?;
    if header.tag != expected_tag {
        return Err(MdfError::BadTag {
            actual: header.tag,
            expected: expected_tag.to_string(),
        });
    }
    let payload_len = (header.block_len as usize).saturating_sub(4);
    let start = offset as usize + 4;
    let end = start + payload_len;
    if end > data.len() {
        return Err(MdfError::Truncated {
            actual:   data.len(),
            expected: end,
            file:     file!(),
            line:     line!(),
        });
    }
    Ok(latin1_trimmed(&data[start..end]))
}

/// Reads the `TX` block at `offset`; a null offset yields `None`.
pub fn read_text_block(data: &[u8], offset: u32) -> Result<Option<String>, MdfError> {
    if offset == 0 {
        return Ok(None);
    }
    read_text_payload(data, offset, "TX").map(Some)
}

/// Reads the `PR` (program specific) block at `offset`; a null offset
/// yields `None`.
pub fn read_program_block(data: &[u8], offset: u32) -> Result<Option<String>, MdfError> {
    if offset == 0 {
        return Ok(None);
    }
    read_text_payload(data, offset, "PR").map(Some)
}
