//! Test fixture builder emitting well-formed MDF 3.30 files.
//!
//! Follows the byte layout of the classic MDF 3.3 writers: ID and HD up
//! front, then per data group a DG/CG/CN chain with trailing TX and CC
//! blocks, pointers patched as the blocks are laid down.

#![allow(dead_code)]

use std::io::Write;

#[derive(Debug, Clone)]
pub enum ConvSpec {
    Identity,
    Linear(f64, f64),
    TabInterp(Vec<(f64, f64)>),
    Tab(Vec<(f64, f64)>),
    Poly([f64; 6]),
    Exp([f64; 7]),
    Log([f64; 7]),
    Rational([f64; 6]),
    Formula(String),
    TextTable(Vec<(f64, String)>),
    TextRange(Vec<(f64, f64, String)>),
}

impl ConvSpec {
    fn type_code(&self) -> u16 {
        match self {
            ConvSpec::Identity => 65535,
            ConvSpec::Linear(..) => 0,
            ConvSpec::TabInterp(_) => 1,
            ConvSpec::Tab(_) => 2,
            ConvSpec::Poly(_) => 6,
            ConvSpec::Exp(_) => 7,
            ConvSpec::Log(_) => 8,
            ConvSpec::Rational(_) => 9,
            ConvSpec::Formula(_) => 10,
            ConvSpec::TextTable(_) => 11,
            ConvSpec::TextRange(_) => 12,
        }
    }

    fn pair_count(&self) -> u16 {
        match self {
            ConvSpec::TabInterp(pairs) | ConvSpec::Tab(pairs) => pairs.len() as u16,
            ConvSpec::TextTable(pairs) => pairs.len() as u16,
            ConvSpec::TextRange(ranges) => ranges.len() as u16,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub short_name: String,
    pub long_name: Option<String>,
    pub description: String,
    /// 0 = data channel, 1 = master channel.
    pub channel_type: u16,
    pub first_bit: u16,
    pub bit_count: u16,
    pub signal_data_type: u16,
    pub unit: String,
    pub conversion: Option<ConvSpec>,
}

impl ChannelSpec {
    pub fn new(name: &str, first_bit: u16, bit_count: u16, signal_data_type: u16) -> Self {
        ChannelSpec {
            short_name: name.to_string(),
            long_name: None,
            description: String::new(),
            channel_type: 0,
            first_bit,
            bit_count,
            signal_data_type,
            unit: String::new(),
            conversion: None,
        }
    }

    pub fn master(mut self) -> Self {
        self.channel_type = 1;
        self
    }

    pub fn with_conversion(mut self, conversion: ConvSpec) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn with_long_name(mut self, long_name: &str) -> Self {
        self.long_name = Some(long_name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// One data group with a single (sorted) channel group.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub channels: Vec<ChannelSpec>,
    pub record_size: u16,
    pub record_count: u32,
    /// `record_count * record_size` raw record bytes.
    pub data: Vec<u8>,
}

/// Byte image of a built file plus the positions negative tests patch.
#[derive(Debug, Clone)]
pub struct BuiltFile {
    pub bytes: Vec<u8>,
    /// Offset of the HD data-group count field.
    pub hd_count_pos: usize,
    pub dg_positions: Vec<usize>,
    pub cg_positions: Vec<usize>,
}

pub fn build_file(groups: &[GroupSpec]) -> BuiltFile {
    let mut buf: Vec<u8> = Vec::new();

    // ID block, 64 bytes.
    push_exact(&mut buf, "MDF     ", 8);
    push_exact(&mut buf, "3.30    ", 8);
    push_exact(&mut buf, "mdf3-rs ", 8);
    buf.extend_from_slice(&0u16.to_le_bytes()); // byte order: little-endian
    buf.extend_from_slice(&0u16.to_le_bytes()); // floating point format
    buf.extend_from_slice(&330u16.to_le_bytes()); // version
    buf.extend_from_slice(&28591u16.to_le_bytes()); // code page, latin-1
    buf.extend_from_slice(&[0u8; 32]); // reserved

    // HD block, 208 bytes at offset 64.
    push_exact(&mut buf, "HD", 2);
    buf.extend_from_slice(&208u16.to_le_bytes());
    let hd_dg_pos = reserve_u32(&mut buf); // first DG
    buf.extend_from_slice(&0u32.to_le_bytes()); // file comment TX
    buf.extend_from_slice(&0u32.to_le_bytes()); // PR block
    let hd_count_pos = buf.len();
    buf.extend_from_slice(&(groups.len() as u16).to_le_bytes());
    push_exact(&mut buf, "02:01:2024", 10);
    push_exact(&mut buf, "12:30:00", 8);
    push_padded(&mut buf, "test author", 32);
    push_padded(&mut buf, "test organisation", 32);
    push_padded(&mut buf, "test project", 32);
    push_padded(&mut buf, "test subject", 32);
    buf.extend_from_slice(&1_700_000_000_000_000_000u64.to_le_bytes());
    buf.extend_from_slice(&1i16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    push_padded(&mut buf, "Local PC Reference Time", 32);

    let mut dg_positions = Vec::new();
    let mut cg_positions = Vec::new();
    let mut previous_dg_next: Option<usize> = None;

    for group in groups {
        // DG block.
        let dg_start = buf.len();
        dg_positions.push(dg_start);
        match previous_dg_next {
            Some(pos) => patch_u32(&mut buf, pos, dg_start as u32),
            None => patch_u32(&mut buf, hd_dg_pos, dg_start as u32),
        }
        push_exact(&mut buf, "DG", 2);
        buf.extend_from_slice(&28u16.to_le_bytes());
        let dg_next_pos = reserve_u32(&mut buf);
        let dg_cg_pos = reserve_u32(&mut buf);
        buf.extend_from_slice(&0u32.to_le_bytes()); // trigger block
        let dg_data_pos = reserve_u32(&mut buf);
        buf.extend_from_slice(&1u16.to_le_bytes()); // one channel group: sorted
        buf.extend_from_slice(&0u16.to_le_bytes()); // no record IDs
        buf.extend_from_slice(&[0u8; 4]); // reserved
        previous_dg_next = Some(dg_next_pos);

        // CG block.
        let cg_start = buf.len();
        cg_positions.push(cg_start);
        patch_u32(&mut buf, dg_cg_pos, cg_start as u32);
        push_exact(&mut buf, "CG", 2);
        buf.extend_from_slice(&30u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes()); // next CG
        let cg_cn_pos = reserve_u32(&mut buf);
        buf.extend_from_slice(&0u32.to_le_bytes()); // comment TX
        buf.extend_from_slice(&0u16.to_le_bytes()); // record ID
        buf.extend_from_slice(&(group.channels.len() as u16).to_le_bytes());
        buf.extend_from_slice(&group.record_size.to_le_bytes());
        buf.extend_from_slice(&group.record_count.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes()); // sample reduction block

        let mut previous_cn_next: Option<usize> = None;
        for channel in &group.channels {
            // CN block.
            let cn_start = buf.len();
            match previous_cn_next {
                Some(pos) => patch_u32(&mut buf, pos, cn_start as u32),
                None => patch_u32(&mut buf, cg_cn_pos, cn_start as u32),
            }
            push_exact(&mut buf, "CN", 2);
            buf.extend_from_slice(&228u16.to_le_bytes());
            let cn_next_pos = reserve_u32(&mut buf);
            let cn_cc_pos = reserve_u32(&mut buf);
            buf.extend_from_slice(&0u32.to_le_bytes()); // CE block
            buf.extend_from_slice(&0u32.to_le_bytes()); // CD block
            buf.extend_from_slice(&0u32.to_le_bytes()); // comment TX
            buf.extend_from_slice(&channel.channel_type.to_le_bytes());
            push_padded(&mut buf, &channel.short_name, 32);
            push_padded(&mut buf, &channel.description, 128);
            buf.extend_from_slice(&channel.first_bit.to_le_bytes());
            buf.extend_from_slice(&channel.bit_count.to_le_bytes());
            buf.extend_from_slice(&channel.signal_data_type.to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes()); // value range not valid
            buf.extend_from_slice(&0f64.to_le_bytes());
            buf.extend_from_slice(&0f64.to_le_bytes());
            buf.extend_from_slice(&0f64.to_le_bytes()); // sample rate
            let cn_long_pos = reserve_u32(&mut buf);
            buf.extend_from_slice(&0u32.to_le_bytes()); // display name TX
            buf.extend_from_slice(&0u16.to_le_bytes()); // additional byte offset
            previous_cn_next = Some(cn_next_pos);

            if let Some(long_name) = &channel.long_name {
                let tx_start = write_tx(&mut buf, long_name);
                patch_u32(&mut buf, cn_long_pos, tx_start as u32);
            }

            if channel.conversion.is_some() || !channel.unit.is_empty() {
                let conversion = channel
                    .conversion
                    .clone()
                    .unwrap_or(ConvSpec::Identity);
                let cc_start = write_cc(&mut buf, &channel.unit, &conversion);
                patch_u32(&mut buf, cn_cc_pos, cc_start as u32);
            }
        }

        // Data block: raw records, no framing.
        let data_pos = buf.len() as u32;
        patch_u32(&mut buf, dg_data_pos, data_pos);
        buf.extend_from_slice(&group.data);
    }

    BuiltFile {
        bytes: buf,
        hd_count_pos,
        dg_positions,
        cg_positions,
    }
}

fn write_tx(buf: &mut Vec<u8>, text: &str) -> usize {
    let start = buf.len();
    push_exact(buf, "TX", 2);
    buf.extend_from_slice(&((4 + text.len() + 1) as u16).to_le_bytes());
    buf.extend(text.chars().map(|c| c as u8));
    buf.push(0);
    start
}

fn write_cc(buf: &mut Vec<u8>, unit: &str, conversion: &ConvSpec) -> usize {
    let start = buf.len();
    push_exact(buf, "CC", 2);
    let size_pos = buf.len();
    buf.extend_from_slice(&0u16.to_le_bytes()); // patched below
    buf.extend_from_slice(&0u16.to_le_bytes()); // value range not valid
    buf.extend_from_slice(&0f64.to_le_bytes());
    buf.extend_from_slice(&0f64.to_le_bytes());
    push_padded(buf, unit, 20);
    buf.extend_from_slice(&conversion.type_code().to_le_bytes());
    buf.extend_from_slice(&conversion.pair_count().to_le_bytes());

    let mut text_patches: Vec<(usize, String)> = Vec::new();
    match conversion {
        ConvSpec::Identity => {}
        ConvSpec::Linear(p1, p2) => {
            buf.extend_from_slice(&p1.to_le_bytes());
            buf.extend_from_slice(&p2.to_le_bytes());
        }
        ConvSpec::TabInterp(pairs) | ConvSpec::Tab(pairs) => {
            for (int, phys) in pairs {
                buf.extend_from_slice(&int.to_le_bytes());
                buf.extend_from_slice(&phys.to_le_bytes());
            }
        }
        ConvSpec::Poly(p) | ConvSpec::Rational(p) => {
            for value in p {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        ConvSpec::Exp(p) | ConvSpec::Log(p) => {
            for value in p {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        ConvSpec::Formula(text) => {
            push_padded(buf, text, 256);
        }
        ConvSpec::TextTable(pairs) => {
            for (int, text) in pairs {
                buf.extend_from_slice(&int.to_le_bytes());
                push_padded(buf, text, 32);
            }
        }
        ConvSpec::TextRange(ranges) => {
            for (lower, upper, text) in ranges {
                buf.extend_from_slice(&lower.to_le_bytes());
                buf.extend_from_slice(&upper.to_le_bytes());
                let patch_pos = reserve_u32(buf);
                text_patches.push((patch_pos, text.clone()));
            }
        }
    }

    let block_len = (buf.len() - start) as u16;
    patch_u16(buf, size_pos, block_len);

    // Range texts live in TX blocks after the CC block itself.
    for (patch_pos, text) in text_patches {
        let tx_start = write_tx(buf, &text);
        patch_u32(buf, patch_pos, tx_start as u32);
    }

    start
}

fn push_exact(buf: &mut Vec<u8>, text: &str, len: usize) {
    let bytes: Vec<u8> = text.chars().map(|c| c as u8).collect();
    assert_eq!(bytes.len(), len, "fixed field {text:?} must be {len} bytes");
    buf.extend_from_slice(&bytes);
}

fn push_padded(buf: &mut Vec<u8>, text: &str, len: usize) {
    let mut bytes: Vec<u8> = text.chars().map(|c| c as u8).collect();
    bytes.truncate(len - 1);
    bytes.resize(len, 0);
    buf.extend_from_slice(&bytes);
}

fn reserve_u32(buf: &mut Vec<u8>) -> usize {
    let pos = buf.len();
    buf.extend_from_slice(&0u32.to_le_bytes());
    pos
}

pub fn patch_u32(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn patch_u16(buf: &mut [u8], pos: usize, value: u16) {
    buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

/// Writes the bytes to a temp file kept alive by the returned handle.
pub fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

pub fn temp_path(file: &tempfile::NamedTempFile) -> &str {
    file.path().to_str().expect("temp path is valid UTF-8")
}
