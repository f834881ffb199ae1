use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::BlockHeader;
use crate::blocks::common::BlockParse;
use crate::blocks::common::read_text_block;
use crate::error::MdfError;

#[derive(Debug, Clone)]
pub struct ChannelGroupBlock {
    pub header: BlockHeader,   // Common header
    pub next_cg_addr: u32,
    pub first_cn_addr: u32,
    pub comment_addr: u32,
    pub record_id: u16,        // prefix byte value when record IDs are present
    pub num_channels: u16,
    pub record_size: u16,      // data record size in bytes, record IDs excluded
    pub num_records: u32,

    pub comment: Option<String>,
}

impl BlockParse for ChannelGroupBlock {
    const TAG: &'static str = "CG";

    /// Creates a ChannelGroupBlock from a 26-byte slice.
    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 26;
        if bytes.len() < expected_bytes {
            return Err(MdfError::Truncated {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        Ok(Self {
            header,
            next_cg_addr: LittleEndian::read_u32(&bytes[4..8]),
            first_cn_addr: LittleEndian::read_u32(&bytes[8..12]),
            comment_addr: LittleEndian::read_u32(&bytes[12..16]),
            record_id: LittleEndian::read_u16(&bytes[16..18]),
            num_channels: LittleEndian::read_u16(&bytes[18..20]),
            record_size: LittleEndian::read_u16(&bytes[20..22]),
            num_records: LittleEndian::read_u32(&bytes[22..26]),
            comment: None,
        })
    }
}

impl ChannelGroupBlock {
    /// Resolves the comment text block referenced by this group.
    pub fn resolve_comment(&mut self, file_data: &[u8]) -> Result<(), MdfError> {
        if self.comment.is_none() && self.comment_addr != 0 {
            self.comment = read_text_block(file_data, self.comment_addr)?;
        }
        Ok(())
    }
}
