use crate::blocks::common::{BlockParse, BlockHeader, latin1_trimmed};
use crate::error::MdfError;

/// Variable-length text block (`TX`): header plus `BlockSize - 4` bytes
/// of null-terminated latin-1 text.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub header: BlockHeader,
    pub text: String,
}

impl BlockParse for TextBlock {
    const TAG: &'static str = "TX";

    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let header = Self::parse_header(bytes)?;
        let expected_bytes = header.block_len as usize;
        if bytes.len() < expected_bytes {
            return Err(MdfError::Truncated {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }
        let text = latin1_trimmed(&bytes[4..expected_bytes]);
        Ok(Self { header, text })
    }
}

/// Program-specific block (`PR`), same shape as [`TextBlock`].
#[derive(Debug, Clone)]
pub struct ProgramBlock {
    pub header: BlockHeader,
    pub text: String,
}

impl BlockParse for ProgramBlock {
    const TAG: &'static str = "PR";

    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let header = Self::parse_header(bytes)?;
        let expected_bytes = header.block_len as usize;
        if bytes.len() < expected_bytes {
            return Err(MdfError::Truncated {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }
        let text = latin1_trimmed(&bytes[4..expected_bytes]);
        Ok(Self { header, text })
    }
}
