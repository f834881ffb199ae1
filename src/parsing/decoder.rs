//! Columnar decoding of fixed-width records.

use std::collections::HashSet;

use crate::blocks::common::{block_at, latin1_trimmed};
use crate::error::MdfError;
use crate::parsing::layout::{Endianness, FieldKind, RecordLayout};

/// A decoded channel column. One variant per supported storage type;
/// conversion replaces the variant (typically with `F64` or `Str`).
#[derive(Debug, Clone, PartialEq)]
pub enum SampleColumn {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Str { width: usize, values: Vec<String> },
    Bytes { width: usize, values: Vec<Vec<u8>> },
}

impl SampleColumn {
    pub fn len(&self) -> usize {
        match self {
            SampleColumn::U8(v) => v.len(),
            SampleColumn::U16(v) => v.len(),
            SampleColumn::U32(v) => v.len(),
            SampleColumn::U64(v) => v.len(),
            SampleColumn::I8(v) => v.len(),
            SampleColumn::I16(v) => v.len(),
            SampleColumn::I32(v) => v.len(),
            SampleColumn::I64(v) => v.len(),
            SampleColumn::F32(v) => v.len(),
            SampleColumn::F64(v) => v.len(),
            SampleColumn::Str { values, .. } => values.len(),
            SampleColumn::Bytes { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens a numeric column to `f64` values; `None` for strings and
    /// opaque bytes.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        let values = match self {
            SampleColumn::U8(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::U16(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::U32(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::U64(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::I8(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::I16(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::I32(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::I64(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::F32(v) => v.iter().map(|&x| x as f64).collect(),
            SampleColumn::F64(v) => v.clone(),
            SampleColumn::Str { .. } | SampleColumn::Bytes { .. } => return None,
        };
        Some(values)
    }
}

/// Decodes `record_count` contiguous records of a sorted data group into
/// one column per channel slot.
///
/// # Arguments
/// * `file_data` - The complete file bytes.
/// * `data_addr` - Absolute offset of the first record.
/// * `layout` - Record schema of the channel group.
/// * `record_count` - Number of records to decode.
/// * `selected` - Channel indices to decode; `None` decodes every slot.
///
/// # Returns
/// `(channel_index, column)` pairs in slot order, or an [`MdfError`] when
/// the data block overruns the file.
pub fn decode_sorted(
    file_data: &[u8],
    data_addr: u32,
    layout: &RecordLayout,
    record_count: usize,
    selected: Option<&HashSet<usize>>,
) -> Result<Vec<(usize, SampleColumn)>, MdfError> {
    let stride = layout.stride();
    let buf = block_at(file_data, data_addr, stride * record_count)?;

    let mut columns = Vec::new();
    for slot in &layout.slots {
        if let Some(wanted) = selected {
            if !wanted.contains(&slot.channel_index) {
                continue;
            }
        }
        let field = &layout.fields[slot.field_index];
        let base = layout.record_id_prefix + field.byte_offset;

        let raw_at = |record: usize| -> u64 {
            let pos = record * stride + base;
            let bytes = &buf[pos..pos + field.byte_width];
            match field.endian {
                Endianness::Little => bytes
                    .iter()
                    .rev()
                    .fold(0u64, |acc, &b| (acc << 8) | b as u64),
                Endianness::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
            }
        };
        let unsigned_at = |record: usize| -> u64 {
            let shifted = raw_at(record) >> slot.bit_offset;
            shifted & width_mask(slot.bit_width)
        };
        let signed_at = |record: usize| -> i64 {
            sign_extend(unsigned_at(record), slot.bit_width)
        };

        let column = match slot.kind {
            FieldKind::U8 => {
                SampleColumn::U8((0..record_count).map(|r| unsigned_at(r) as u8).collect())
            }
            FieldKind::U16 => {
                SampleColumn::U16((0..record_count).map(|r| unsigned_at(r) as u16).collect())
            }
            FieldKind::U32 => {
                SampleColumn::U32((0..record_count).map(|r| unsigned_at(r) as u32).collect())
            }
            FieldKind::U64 => {
                SampleColumn::U64((0..record_count).map(unsigned_at).collect())
            }
            FieldKind::I8 => {
                SampleColumn::I8((0..record_count).map(|r| signed_at(r) as i8).collect())
            }
            FieldKind::I16 => {
                SampleColumn::I16((0..record_count).map(|r| signed_at(r) as i16).collect())
            }
            FieldKind::I32 => {
                SampleColumn::I32((0..record_count).map(|r| signed_at(r) as i32).collect())
            }
            FieldKind::I64 => {
                SampleColumn::I64((0..record_count).map(signed_at).collect())
            }
            FieldKind::F32 => SampleColumn::F32(
                (0..record_count)
                    .map(|r| f32::from_bits(raw_at(r) as u32))
                    .collect(),
            ),
            FieldKind::F64 => SampleColumn::F64(
                (0..record_count).map(|r| f64::from_bits(raw_at(r))).collect(),
            ),
            FieldKind::Str(width) => SampleColumn::Str {
                width,
                values: (0..record_count)
                    .map(|r| {
                        let pos = r * stride + base;
                        latin1_trimmed(&buf[pos..pos + width])
                    })
                    .collect(),
            },
            FieldKind::Bytes(width) => SampleColumn::Bytes {
                width,
                values: (0..record_count)
                    .map(|r| {
                        let pos = r * stride + base;
                        buf[pos..pos + width].to_vec()
                    })
                    .collect(),
            },
        };
        columns.push((slot.channel_index, column));
    }

    Ok(columns)
}

fn width_mask(bit_width: usize) -> u64 {
    if bit_width >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_width) - 1
    }
}

fn sign_extend(unsigned: u64, bit_width: usize) -> i64 {
    if bit_width == 0 || bit_width >= 64 {
        return unsigned as i64;
    }
    let mask = width_mask(bit_width);
    let sign_bit = 1u64 << (bit_width - 1);
    if unsigned & sign_bit != 0 {
        (unsigned as i64) | !(mask as i64)
    } else {
        unsigned as i64
    }
}
