use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{BlockParse, BlockHeader, latin1_trimmed, read_program_block, read_text_block};
use crate::error::MdfError;

/// Header block (`HD`) at the fixed file offset 64.
///
/// The 164-byte base layout is common to all 3.x versions; files written
/// as 3.20 or later append the UTC time fields and declare a 208-byte
/// block size.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub header: BlockHeader,
    pub first_dg_addr: u32,
    pub comment_addr: u32,     // TX
    pub program_addr: u32,     // PR
    pub num_data_groups: u16,
    pub date: String,          // "dd:mm:yyyy"
    pub time: String,          // "hh:mm:ss"
    pub author: String,
    pub organisation: String,
    pub project: String,
    pub subject: String,

    // 3.20+ only
    pub timestamp_ns: Option<u64>,
    pub utc_offset_hours: Option<i16>,
    pub time_quality: Option<u16>,
    pub timer_id: Option<String>,

    // resolved text blocks
    pub comment: Option<String>,
    pub program_notes: Option<String>,
}

impl BlockParse for HeaderBlock {
    const TAG: &'static str = "HD";

    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let header = Self::parse_header(bytes)?;

        let extended = header.block_len >= 208;
        let expected_bytes = if extended { 208 } else { 164 };
        if bytes.len() < expected_bytes {
            return Err(MdfError::Truncated {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        let mut block = HeaderBlock {
            header,
            first_dg_addr: LittleEndian::read_u32(&bytes[4..8]),
            comment_addr: LittleEndian::read_u32(&bytes[8..12]),
            program_addr: LittleEndian::read_u32(&bytes[12..16]),
            num_data_groups: LittleEndian::read_u16(&bytes[16..18]),
            date: latin1_trimmed(&bytes[18..28]),
            time: latin1_trimmed(&bytes[28..36]),
            author: latin1_trimmed(&bytes[36..68]),
            organisation: latin1_trimmed(&bytes[68..100]),
            project: latin1_trimmed(&bytes[100..132]),
            subject: latin1_trimmed(&bytes[132..164]),
            timestamp_ns: None,
            utc_offset_hours: None,
            time_quality: None,
            timer_id: None,
            comment: None,
            program_notes: None,
        };

        if extended {
            block.timestamp_ns = Some(LittleEndian::read_u64(&bytes[164..172]));
            block.utc_offset_hours = Some(LittleEndian::read_i16(&bytes[172..174]));
            block.time_quality = Some(LittleEndian::read_u16(&bytes[174..176]));
            block.timer_id = Some(latin1_trimmed(&bytes[176..208]));
        }

        Ok(block)
    }
}

impl HeaderBlock {
    /// Resolves the comment (`TX`) and program (`PR`) blocks referenced
    /// by this header. Null pointers leave the fields unset.
    pub fn resolve_texts(&mut self, file_data: &[u8]) -> Result<(), MdfError> {
        self.comment = read_text_block(file_data, self.comment_addr)?;
        self.program_notes = read_program_block(file_data, self.program_addr)?;
        Ok(())
    }

    /// Measurement date converted from `dd:mm:yyyy` to ISO-8601
    /// `yyyy-mm-dd`; the raw string is returned when it does not match
    /// the expected shape.
    pub fn iso_date(&self) -> String {
        let parts: Vec<&str> = self.date.split(':').collect();
        match parts.as_slice() {
            [day, month, year] => format!("{year}-{month}-{day}"),
            _ => self.date.clone(),
        }
    }
}
