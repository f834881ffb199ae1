//! Record layout resolution for one channel group.
//!
//! The resolver turns channel metadata into the byte-level schema of a
//! fixed-width record: which byte-aligned raw fields exist, and how each
//! channel's value is carved out of its field. Channels sharing a byte
//! offset are co-located sub-byte fields; only the first one contributes
//! a raw field, the rest are derived by shift-and-mask during decode.

use crate::error::MdfError;
use crate::parsing::mdf_file::RawChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Storage type of a decoded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Fixed-length latin-1 string of the given byte width.
    Str(usize),
    /// Opaque byte array of the given byte width.
    Bytes(usize),
}

/// One byte-aligned raw field of the record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub byte_offset: usize,
    pub bit_offset: u8,
    pub bit_width: usize,
    pub kind: FieldKind,
    pub endian: Endianness,
    /// Whole bytes covering the widest value co-located in this field.
    pub byte_width: usize,
}

/// Maps one channel onto the raw field feeding it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSlot {
    /// Index into the channel group's (bit-ordered) channel list.
    pub channel_index: usize,
    pub field_index: usize,
    pub bit_offset: u8,
    pub bit_width: usize,
    /// Output dtype of the decoded column.
    pub kind: FieldKind,
    /// Value requires shift-and-mask over the field bytes.
    pub needs_mask: bool,
}

/// Byte-level schema of a channel group's record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    /// Record-ID prefix size in bytes, 0 or 1.
    pub record_id_prefix: usize,
    /// A second record-ID byte trails the record body.
    pub trailing_record_id: bool,
    /// Record body size in bytes, record IDs excluded.
    pub record_size: usize,
    pub fields: Vec<RecordField>,
    pub slots: Vec<ChannelSlot>,
}

impl RecordLayout {
    /// Computes the layout of one channel group. `channels` must already
    /// be ordered by ascending first-bit position.
    pub fn resolve(
        num_record_ids: u16,
        record_size: u16,
        channels: &[RawChannel],
        default_endian: Endianness,
    ) -> Result<Self, MdfError> {
        let (record_id_prefix, trailing_record_id) = match num_record_ids {
            0 => (0, false),
            1 => (1, false),
            _ => (1, true),
        };

        let mut fields: Vec<RecordField> = Vec::new();
        let mut slots = Vec::with_capacity(channels.len());
        let mut previous_byte_offset: Option<usize> = None;

        for (channel_index, channel) in channels.iter().enumerate() {
            let block = &channel.block;
            let byte_offset = block.byte_offset();
            let bit_offset = block.bit_offset();
            let bit_width = block.bit_count as usize;
            let byte_width = block.byte_width();
            let kind = field_kind(block.signal_data_type, bit_width, byte_width);
            let endian = field_endian(block.signal_data_type, default_endian);
            let covering = (bit_offset as usize + bit_width).div_ceil(8).max(1);

            let field_index = if previous_byte_offset == Some(byte_offset) && !fields.is_empty() {
                // Co-located with the previous channel: widen its field
                // if this value reaches further into the byte run.
                let index = fields.len() - 1;
                let field = &mut fields[index];
                field.byte_width = field.byte_width.max(covering);
                index
            } else {
                fields.push(RecordField {
                    name: channel.name.clone(),
                    byte_offset,
                    bit_offset,
                    bit_width,
                    kind,
                    endian,
                    byte_width: byte_width.max(covering),
                });
                fields.len() - 1
            };
            previous_byte_offset = Some(byte_offset);

            let needs_mask = matches!(
                kind,
                FieldKind::U8
                    | FieldKind::U16
                    | FieldKind::U32
                    | FieldKind::U64
                    | FieldKind::I8
                    | FieldKind::I16
                    | FieldKind::I32
                    | FieldKind::I64
            ) && (bit_offset != 0 || bit_width % 8 != 0);

            let slot_kind = if needs_mask {
                narrowest_unsigned(bit_width)
            } else {
                kind
            };

            slots.push(ChannelSlot {
                channel_index,
                field_index,
                bit_offset,
                bit_width,
                kind: slot_kind,
                needs_mask,
            });
        }

        let layout = RecordLayout {
            record_id_prefix,
            trailing_record_id,
            record_size: record_size as usize,
            fields,
            slots,
        };

        for field in &layout.fields {
            if field.byte_offset + field.byte_width > layout.record_size {
                return Err(MdfError::Truncated {
                    actual:   layout.record_size,
                    expected: field.byte_offset + field.byte_width,
                    file:     file!(),
                    line:     line!(),
                });
            }
        }

        Ok(layout)
    }

    /// Total distance between two consecutive records in the data block.
    pub fn stride(&self) -> usize {
        self.record_id_prefix + self.record_size + usize::from(self.trailing_record_id)
    }
}

/// Signal-type and bit-width to column dtype, following the MDF 3 code
/// table. Unknown codes and malformed float widths surface as opaque
/// bytes rather than failing the whole group.
fn field_kind(signal_data_type: u16, bit_width: usize, byte_width: usize) -> FieldKind {
    match signal_data_type {
        0 | 9 | 11 | 13 | 14 => narrowest_unsigned(bit_width),
        1 | 10 => match bit_width {
            0..=8 => FieldKind::I8,
            9..=16 => FieldKind::I16,
            17..=32 => FieldKind::I32,
            _ => FieldKind::I64,
        },
        2 | 3 => match bit_width {
            32 => FieldKind::F32,
            64 => FieldKind::F64,
            _ => FieldKind::Bytes(byte_width),
        },
        7 => FieldKind::Str(byte_width),
        _ => FieldKind::Bytes(byte_width),
    }
}

fn narrowest_unsigned(bit_width: usize) -> FieldKind {
    match bit_width {
        0..=8 => FieldKind::U8,
        9..=16 => FieldKind::U16,
        17..=32 => FieldKind::U32,
        _ => FieldKind::U64,
    }
}

fn field_endian(signal_data_type: u16, default_endian: Endianness) -> Endianness {
    match signal_data_type {
        3 | 9 | 10 => Endianness::Big,
        11 | 13 | 14 => default_endian,
        _ => Endianness::Little,
    }
}
