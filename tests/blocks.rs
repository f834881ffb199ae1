mod common;

use mdf3_rs::blocks::channel_block::ChannelBlock;
use mdf3_rs::blocks::channel_group_block::ChannelGroupBlock;
use mdf3_rs::blocks::common::{BlockParse, latin1_trimmed, read_text_block};
use mdf3_rs::blocks::conversion::{Conversion, ConversionKind};
use mdf3_rs::blocks::data_group_block::DataGroupBlock;
use mdf3_rs::blocks::header_block::HeaderBlock;
use mdf3_rs::blocks::identification_block::IdentificationBlock;
use mdf3_rs::blocks::text_block::TextBlock;
use mdf3_rs::error::MdfError;

use common::{ChannelSpec, ConvSpec, GroupSpec, build_file, patch_u16};

fn one_channel_file(channel: ChannelSpec) -> common::BuiltFile {
    build_file(&[GroupSpec {
        channels: vec![channel],
        record_size: 8,
        record_count: 1,
        data: vec![0u8; 8],
    }])
}

#[test]
fn identification_block_parses() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let id = IdentificationBlock::from_bytes(&built.bytes)?;
    assert_eq!(id.file_id, "MDF     ");
    assert_eq!(id.format_id, "3.30    ");
    assert_eq!(id.version, 330);
    assert_eq!(id.byte_order, 0);
    assert_eq!(id.code_page, 28591);
    Ok(())
}

#[test]
fn identification_block_rejects_wrong_magic() {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let mut bytes = built.bytes;
    bytes[0..8].copy_from_slice(b"MDF4    ");
    match IdentificationBlock::from_bytes(&bytes) {
        Err(MdfError::BadTag { .. }) => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn identification_block_rejects_big_endian() {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let mut bytes = built.bytes;
    patch_u16(&mut bytes, 24, 1);
    match IdentificationBlock::from_bytes(&bytes) {
        Err(MdfError::UnsupportedEndian) => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn identification_block_rejects_version_out_of_range() {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let mut bytes = built.bytes;
    patch_u16(&mut bytes, 28, 400);
    match IdentificationBlock::from_bytes(&bytes) {
        Err(MdfError::UnsupportedVersion(400)) => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn header_block_extended_fields() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let header = HeaderBlock::from_bytes(&built.bytes[64..])?;
    assert_eq!(header.num_data_groups, 1);
    assert_eq!(header.author, "test author");
    assert_eq!(header.date, "02:01:2024");
    assert_eq!(header.iso_date(), "2024-01-02");
    assert_eq!(header.timestamp_ns, Some(1_700_000_000_000_000_000));
    assert_eq!(header.utc_offset_hours, Some(1));
    assert_eq!(header.timer_id.as_deref(), Some("Local PC Reference Time"));
    Ok(())
}

#[test]
fn header_block_base_layout_has_no_time_fields() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let mut bytes = built.bytes;
    // Shrink the declared size to the pre-3.20 layout.
    patch_u16(&mut bytes, 64 + 2, 164);
    let header = HeaderBlock::from_bytes(&bytes[64..])?;
    assert_eq!(header.timestamp_ns, None);
    assert_eq!(header.timer_id, None);
    Ok(())
}

#[test]
fn data_group_block_chain_fields() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let dg = DataGroupBlock::from_bytes(&built.bytes[built.dg_positions[0]..])?;
    assert_eq!(dg.num_channel_groups, 1);
    assert_eq!(dg.num_record_ids, 0);
    assert_eq!(dg.next_dg_addr, 0);
    assert_eq!(dg.first_cg_addr as usize, built.cg_positions[0]);
    assert_ne!(dg.data_addr, 0);
    Ok(())
}

#[test]
fn channel_group_block_fields() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 64, 0));
    let cg = ChannelGroupBlock::from_bytes(&built.bytes[built.cg_positions[0]..])?;
    assert_eq!(cg.num_channels, 1);
    assert_eq!(cg.record_size, 8);
    assert_eq!(cg.num_records, 1);
    Ok(())
}

#[test]
fn channel_block_fields_and_derived_offsets() -> Result<(), MdfError> {
    let built = one_channel_file(
        ChannelSpec::new("pressure", 19, 2, 0).with_description("manifold pressure"),
    );
    let cg = ChannelGroupBlock::from_bytes(&built.bytes[built.cg_positions[0]..])?;
    let mut cn = ChannelBlock::from_bytes(&built.bytes[cg.first_cn_addr as usize..])?;
    cn.resolve_long_name(&built.bytes)?;
    assert_eq!(cn.short_name, "pressure");
    assert_eq!(cn.description, "manifold pressure");
    assert_eq!(cn.first_bit, 19);
    assert_eq!(cn.byte_offset(), 2);
    assert_eq!(cn.bit_offset(), 3);
    assert_eq!(cn.byte_width(), 1);
    assert_eq!(cn.long_name, None);
    Ok(())
}

#[test]
fn channel_block_resolves_long_name() -> Result<(), MdfError> {
    let built = one_channel_file(
        ChannelSpec::new("eng", 0, 8, 0).with_long_name("engine\\device42"),
    );
    let cg = ChannelGroupBlock::from_bytes(&built.bytes[built.cg_positions[0]..])?;
    let mut cn = ChannelBlock::from_bytes(&built.bytes[cg.first_cn_addr as usize..])?;
    cn.resolve_long_name(&built.bytes)?;
    assert_eq!(cn.long_name.as_deref(), Some("engine\\device42"));
    Ok(())
}

#[test]
fn conversion_block_linear_payload() -> Result<(), MdfError> {
    let built = one_channel_file(
        ChannelSpec::new("ch", 0, 64, 2)
            .with_unit("rpm")
            .with_conversion(ConvSpec::Linear(1.0, 2.0)),
    );
    let cg = ChannelGroupBlock::from_bytes(&built.bytes[built.cg_positions[0]..])?;
    let mut cn = ChannelBlock::from_bytes(&built.bytes[cg.first_cn_addr as usize..])?;
    cn.resolve_conversion(&built.bytes)?;
    let cc = cn.conversion.expect("conversion present");
    assert_eq!(cc.kind, ConversionKind::Linear);
    assert_eq!(cc.unit, "rpm");
    assert_eq!(cc.conversion, Conversion::Linear { p1: 1.0, p2: 2.0 });
    Ok(())
}

#[test]
fn conversion_block_text_range_resolves_texts() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("state", 0, 8, 0).with_conversion(
        ConvSpec::TextRange(vec![
            (0.0, 0.0, "default".to_string()),
            (1.0, 5.0, "low".to_string()),
            (6.0, 10.0, "high".to_string()),
        ]),
    ));
    let cg = ChannelGroupBlock::from_bytes(&built.bytes[built.cg_positions[0]..])?;
    let mut cn = ChannelBlock::from_bytes(&built.bytes[cg.first_cn_addr as usize..])?;
    cn.resolve_conversion(&built.bytes)?;
    let cc = cn.conversion.expect("conversion present");
    match cc.conversion {
        Conversion::TextRangeTable { ranges } => {
            assert_eq!(ranges.len(), 3);
            assert_eq!(ranges[0].text, "default");
            assert_eq!(ranges[1].text, "low");
            assert_eq!(ranges[2].text, "high");
            assert_eq!(ranges[2].lower, 6.0);
            assert_eq!(ranges[2].upper, 10.0);
        }
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[test]
fn conversion_block_missing_pointer_is_identity() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 8, 0));
    let cg = ChannelGroupBlock::from_bytes(&built.bytes[built.cg_positions[0]..])?;
    let mut cn = ChannelBlock::from_bytes(&built.bytes[cg.first_cn_addr as usize..])?;
    cn.resolve_conversion(&built.bytes)?;
    assert!(cn.conversion.is_none());
    Ok(())
}

#[test]
fn text_block_roundtrip() -> Result<(), MdfError> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"TX");
    bytes.extend_from_slice(&(4u16 + 6).to_le_bytes());
    bytes.extend_from_slice(b"hello\0");
    let parsed = TextBlock::from_bytes(&bytes)?;
    assert_eq!(parsed.text, "hello");
    Ok(())
}

#[test]
fn text_block_truncated_payload() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"TX");
    bytes.extend_from_slice(&64u16.to_le_bytes());
    bytes.extend_from_slice(b"short\0");
    match TextBlock::from_bytes(&bytes) {
        Err(MdfError::Truncated { .. }) => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn text_block_wrong_tag() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"XX");
    bytes.extend_from_slice(&10u16.to_le_bytes());
    bytes.extend_from_slice(b"text\0\0");
    match TextBlock::from_bytes(&bytes) {
        Err(MdfError::BadTag { actual, expected }) => {
            assert_eq!(actual, "XX");
            assert_eq!(expected, "TX");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn null_pointer_reads_as_absent_text() -> Result<(), MdfError> {
    let built = one_channel_file(ChannelSpec::new("ch", 0, 8, 0));
    assert_eq!(read_text_block(&built.bytes, 0)?, None);
    Ok(())
}

#[test]
fn latin1_trims_trailing_nulls_only() {
    assert_eq!(latin1_trimmed(b"ab\0\0\0"), "ab");
    assert_eq!(latin1_trimmed(b"\0\0"), "");
    assert_eq!(latin1_trimmed(b"a\0b\0"), "a\0b");
    // 0xE9 is é in latin-1; decoding never fails.
    assert_eq!(latin1_trimmed(&[0x65, 0xE9, 0x00]), "e\u{e9}");
}

#[test]
fn conversion_kind_codes_roundtrip() {
    for code in [0u16, 1, 2, 6, 7, 8, 9, 10, 11, 12, 65535] {
        assert_eq!(ConversionKind::from_u16(code).to_u16(), code);
    }
    assert_eq!(ConversionKind::from_u16(42), ConversionKind::Unknown(42));
}
