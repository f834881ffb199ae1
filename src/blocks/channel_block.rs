use byteorder::{ByteOrder, LittleEndian};

use crate::error::MdfError;
use crate::blocks::common::BlockParse;
use crate::blocks::common::{BlockHeader, latin1_trimmed, read_text_block};
use crate::blocks::conversion::ConversionBlock;

/// Channel type code for the group's independent variable (usually time).
pub const CHANNEL_TYPE_MASTER: u16 = 1;

#[derive(Debug, Clone)]
pub struct ChannelBlock {
    pub header: BlockHeader,   // Common header
    pub next_cn_addr: u32,       // 4 bytes
    pub conversion_addr: u32,    // 4 bytes - pointer to the CC block
    pub source_ext_addr: u32,    // 4 bytes - CE block, skipped by this reader
    pub dependency_addr: u32,    // 4 bytes - CD block, skipped by this reader
    pub comment_addr: u32,       // 4 bytes - pointer to a TX comment
    pub channel_type: u16,       // 0 = data, 1 = master
    pub short_name: String,      // 32-byte latin-1 buffer
    pub description: String,     // 128-byte latin-1 buffer
    pub first_bit: u16,          // bit index of the value in the record
    pub bit_count: u16,          // value width in bits
    pub signal_data_type: u16,   // signal data type code
    pub value_range_valid: bool,
    pub value_min: f64,
    pub value_max: f64,
    pub sample_rate: f64,
    pub long_name_addr: u32,     // 4 bytes - pointer to the ASAM long name TX
    pub display_name_addr: u32,  // 4 bytes - pointer to the identifier TX
    pub additional_byte_offset: u16,

    pub long_name: Option<String>,
    pub display_name: Option<String>,
    pub comment: Option<String>,
    pub conversion: Option<ConversionBlock>,
}

impl BlockParse for ChannelBlock {
    const TAG: &'static str = "CN";

    /// Creates a ChannelBlock from a 228-byte slice.
    /// This version does NOT automatically resolve the linked text blocks.
    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 228;
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
            next_cn_addr: LittleEndian::read_u32(&bytes[4..8]),
            conversion_addr: LittleEndian::read_u32(&bytes[8..12]),
            source_ext_addr: LittleEndian::read_u32(&bytes[12..16]),
            dependency_addr: LittleEndian::read_u32(&bytes[16..20]),
            comment_addr: LittleEndian::read_u32(&bytes[20..24]),
            channel_type: LittleEndian::read_u16(&bytes[24..26]),
            short_name: latin1_trimmed(&bytes[26..58]),
            description: latin1_trimmed(&bytes[58..186]),
            first_bit: LittleEndian::read_u16(&bytes[186..188]),
            bit_count: LittleEndian::read_u16(&bytes[188..190]),
            signal_data_type: LittleEndian::read_u16(&bytes[190..192]),
            value_range_valid: LittleEndian::read_u16(&bytes[192..194]) != 0,
            value_min: LittleEndian::read_f64(&bytes[194..202]),
            value_max: LittleEndian::read_f64(&bytes[202..210]),
            sample_rate: LittleEndian::read_f64(&bytes[210..218]),
            long_name_addr: LittleEndian::read_u32(&bytes[218..222]),
            display_name_addr: LittleEndian::read_u32(&bytes[222..226]),
            additional_byte_offset: LittleEndian::read_u16(&bytes[226..228]),
            long_name: None,
            display_name: None,
            comment: None,
            conversion: None,
        })
    }
}

impl ChannelBlock {
    /// Byte position of the value inside the record body.
    pub fn byte_offset(&self) -> usize {
        self.first_bit as usize / 8
    }

    /// Bit position of the value inside its first byte.
    pub fn bit_offset(&self) -> u8 {
        (self.first_bit % 8) as u8
    }

    /// Number of whole bytes covering the value.
    pub fn byte_width(&self) -> usize {
        (self.bit_count as usize).div_ceil(8)
    }

    pub fn is_master(&self) -> bool {
        self.channel_type == CHANNEL_TYPE_MASTER
    }

    /// Resolves the ASAM long name referenced by `long_name_addr`.
    /// This function must be explicitly called.
    pub fn resolve_long_name(&mut self, file_data: &[u8]) -> Result<(), MdfError> {
        if self.long_name.is_none() && self.long_name_addr != 0 {
            self.long_name = read_text_block(file_data, self.long_name_addr)?;
        }
        Ok(())
    }

    /// Resolves the comment and identifier text blocks.
    pub fn resolve_texts(&mut self, file_data: &[u8]) -> Result<(), MdfError> {
        if self.comment.is_none() && self.comment_addr != 0 {
            self.comment = read_text_block(file_data, self.comment_addr)?;
        }
        if self.display_name.is_none() && self.display_name_addr != 0 {
            self.display_name = read_text_block(file_data, self.display_name_addr)?;
        }
        Ok(())
    }

    /// Resolves the conversion block from the file data using the
    /// `conversion_addr` field. A null pointer means the channel values
    /// are already physical (identity conversion).
    pub fn resolve_conversion(&mut self, file_data: &[u8]) -> Result<(), MdfError> {
        if self.conversion.is_none() && self.conversion_addr != 0 {
            let offset = self.conversion_addr as usize;

            let expected_bytes = offset + 46;
            if file_data.len() < expected_bytes {
                return Err(MdfError::Truncated {
                    actual:   file_data.len(),
                    expected: expected_bytes,
                    file:     file!(),
                    line:     line!(),
                });
            }

            let mut conv_block = ConversionBlock::from_bytes(&file_data[offset..])?;
            conv_block.resolve_texts(file_data)?;
            self.conversion = Some(conv_block);
        }
        Ok(())
    }
}
