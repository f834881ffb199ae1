use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{BlockHeader, BlockParse, latin1_trimmed, read_text_block};
use crate::error::MdfError;
use super::types::ConversionKind;

/// One `{lower, upper, text}` triple of a text range table. The text is
/// stored behind a pointer and filled in by
/// [`ConversionBlock::resolve_texts`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextRange {
    pub lower: f64,
    pub upper: f64,
    pub text_addr: u32,
    pub text: String,
}

/// Type-dependent conversion rule attached to a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// phys = raw * p2 + p1
    Linear { p1: f64, p2: f64 },
    TabularInterp { pairs: Vec<(f64, f64)> },
    Tabular { pairs: Vec<(f64, f64)> },
    Polynomial { p: [f64; 6] },
    Exponential { p: [f64; 7] },
    Logarithmic { p: [f64; 7] },
    Rational { p: [f64; 6] },
    Formula { text: String },
    TextTable { pairs: Vec<(f64, String)> },
    /// First triple is the default text for unmatched values.
    TextRangeTable { ranges: Vec<TextRange> },
    Identity,
}

impl Conversion {
    /// True for the linear rule that cannot change any value. Such
    /// conversions are dropped at build time so the raw dtype survives.
    pub fn is_identity(&self) -> bool {
        match self {
            Conversion::Identity => true,
            Conversion::Linear { p1, p2 } => *p2 == 1.0 && *p1 == 0.0,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionBlock {
    pub header: BlockHeader,
    pub value_range_valid: bool,
    pub value_min: f64,
    pub value_max: f64,
    pub unit: String,          // 20-byte latin-1 buffer
    pub kind: ConversionKind,
    pub num_pairs: u16,
    pub conversion: Conversion,
}

impl BlockParse for ConversionBlock {
    const TAG: &'static str = "CC";

    fn from_bytes(bytes: &[u8]) -> Result<Self, MdfError> {
        let header = Self::parse_header(bytes)?;

        let expected_bytes = 46;
        if bytes.len() < expected_bytes {
            return Err(MdfError::Truncated {
                actual:   bytes.len(),
                expected: expected_bytes,
                file:     file!(),
                line:     line!(),
            });
        }

        let value_range_valid = LittleEndian::read_u16(&bytes[4..6]) != 0;
        let value_min = LittleEndian::read_f64(&bytes[6..14]);
        let value_max = LittleEndian::read_f64(&bytes[14..22]);
        let unit = latin1_trimmed(&bytes[22..42]);
        let kind = ConversionKind::from_u16(LittleEndian::read_u16(&bytes[42..44]));
        let num_pairs = LittleEndian::read_u16(&bytes[44..46]);

        let mut offset = 46;
        let conversion = match kind {
            ConversionKind::Linear => {
                let p1 = read_f64(bytes, &mut offset)?;
                let p2 = read_f64(bytes, &mut offset)?;
                Conversion::Linear { p1, p2 }
            }
            ConversionKind::TabularInterp | ConversionKind::Tabular => {
                let mut pairs = Vec::with_capacity(num_pairs as usize);
                for _ in 0..num_pairs {
                    let int = read_f64(bytes, &mut offset)?;
                    let phys = read_f64(bytes, &mut offset)?;
                    pairs.push((int, phys));
                }
                if kind == ConversionKind::TabularInterp {
                    Conversion::TabularInterp { pairs }
                } else {
                    Conversion::Tabular { pairs }
                }
            }
            ConversionKind::Polynomial | ConversionKind::Rational => {
                let mut p = [0.0; 6];
                for slot in p.iter_mut() {
                    *slot = read_f64(bytes, &mut offset)?;
                }
                if kind == ConversionKind::Polynomial {
                    Conversion::Polynomial { p }
                } else {
                    Conversion::Rational { p }
                }
            }
            ConversionKind::Exponential | ConversionKind::Logarithmic => {
                let mut p = [0.0; 7];
                for slot in p.iter_mut() {
                    *slot = read_f64(bytes, &mut offset)?;
                }
                if kind == ConversionKind::Exponential {
                    Conversion::Exponential { p }
                } else {
                    Conversion::Logarithmic { p }
                }
            }
            ConversionKind::Formula => {
                let text = latin1_trimmed(read_slice(bytes, &mut offset, 256)?);
                Conversion::Formula { text }
            }
            ConversionKind::TextTable => {
                let mut pairs = Vec::with_capacity(num_pairs as usize);
                for _ in 0..num_pairs {
                    let int = read_f64(bytes, &mut offset)?;
                    let text = latin1_trimmed(read_slice(bytes, &mut offset, 32)?);
                    pairs.push((int, text));
                }
                Conversion::TextTable { pairs }
            }
            ConversionKind::TextRangeTable => {
                let mut ranges = Vec::with_capacity(num_pairs as usize);
                for _ in 0..num_pairs {
                    let lower = read_f64(bytes, &mut offset)?;
                    let upper = read_f64(bytes, &mut offset)?;
                    let text_addr = read_u32(bytes, &mut offset)?;
                    ranges.push(TextRange { lower, upper, text_addr, text: String::new() });
                }
                Conversion::TextRangeTable { ranges }
            }
            ConversionKind::Identity | ConversionKind::Unknown(_) => Conversion::Identity,
        };

        Ok(Self {
            header,
            value_range_valid,
            value_min,
            value_max,
            unit,
            kind,
            num_pairs,
            conversion,
        })
    }
}

impl ConversionBlock {
    /// Resolves the text blocks referenced by a range table. Null or
    /// unreadable pointers yield empty strings.
    ///
    /// # Arguments
    /// * `file_data` - Memory mapped MDF bytes used to read the texts.
    pub fn resolve_texts(&mut self, file_data: &[u8]) -> Result<(), MdfError> {
        if let Conversion::TextRangeTable { ranges } = &mut self.conversion {
            for range in ranges.iter_mut() {
                range.text = read_text_block(file_data, range.text_addr)
                    .unwrap_or(None)
                    .unwrap_or_default();
            }
        }
        Ok(())
    }
}

fn read_slice<'a>(bytes: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8], MdfError> {
    if bytes.len() < *offset + len {
        return Err(MdfError::Truncated {
            actual: bytes.len(),
            expected: *offset + len,
            file: file!(),
            line: line!(),
        });
    }
    let slice = &bytes[*offset..*offset + len];
    *offset += len;
    Ok(slice)
}

fn read_f64(bytes: &[u8], offset: &mut usize) -> Result<f64, MdfError> {
    let slice = read_slice(bytes, offset, 8)?;
    Ok(LittleEndian::read_f64(slice))
}

fn read_u32(bytes: &[u8], offset: &mut usize) -> Result<u32, MdfError> {
    let slice = read_slice(bytes, offset, 4)?;
    Ok(LittleEndian::read_u32(slice))
}
