use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::BlockParse;
use crate::blocks::common::BlockHeader;
use crate::error::MdfError;

#[derive(Debug, Clone)]
pub struct DataGroupBlock {
    pub header: BlockHeader,   // Common header
    pub next_dg_addr: u32,
    pub first_cg_addr: u32,
    pub trigger_addr: u32,     // trigger block, unused by this reader
    pub data_addr: u32,        // first data record
    pub num_channel_groups: u16,
    pub num_record_ids: u16,   // 0, 1 or 2
}

impl BlockParse for DataGroupBlock {
    const TAG: &'static str = "DG";

    /// Parse a `DataGroupBlock` from a 24 byte slice.
    ///
    /// # Arguments
    /// * `bytes` - Byte slice beginning at the DG block header.
    ///
    /// # Returns
    /// The populated [`DataGroupBlock`] on success or an [`MdfError`] if
    /// the slice is too small or malformed.
    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 24;
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
            next_dg_addr: LittleEndian::read_u32(&bytes[4..8]),
            first_cg_addr: LittleEndian::read_u32(&bytes[8..12]),
            trigger_addr: LittleEndian::read_u32(&bytes[12..16]),
            data_addr: LittleEndian::read_u32(&bytes[16..20]),
            num_channel_groups: LittleEndian::read_u16(&bytes[20..22]),
            num_record_ids: LittleEndian::read_u16(&bytes[22..24]),
        })
    }
}
