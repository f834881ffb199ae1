use memmap2::Mmap;
use std::fs::File;

use crate::blocks::{
    common::BlockParse,
    common::block_tail,
    channel_block::ChannelBlock,
    channel_group_block::ChannelGroupBlock,
    data_group_block::DataGroupBlock,
    header_block::HeaderBlock,
    identification_block::IdentificationBlock,
};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::MdfError;
use crate::options::{MetadataLevel, ReadOptions};
use crate::parsing::naming::NameResolver;

/// A channel block together with its disambiguated name.
#[derive(Debug)]
pub struct RawChannel {
    pub block: ChannelBlock,
    pub name: String,
    pub device: Option<String>,
}

/// A channel group with its channels ordered by first-bit position, the
/// order the record bytes follow.
#[derive(Debug)]
pub struct RawChannelGroup {
    pub block: ChannelGroupBlock,
    pub channels: Vec<RawChannel>,
}

#[derive(Debug)]
pub struct RawDataGroup {
    pub block: DataGroupBlock,
    pub channel_groups: Vec<RawChannelGroup>,
}

#[derive(Debug)]
pub struct MdfFile {
    pub identification: IdentificationBlock,
    pub header: HeaderBlock,
    pub data_groups: Vec<RawDataGroup>,
    pub mmap: Mmap, // Keep the mmap in the MdfFile to guarantee lifetime for our slices.
}

impl MdfFile {
    /// Parse the metadata graph of an MDF 3.x file.
    ///
    /// Walks ID → HD → DG chain → CG chain → CN chain → CC, resolving
    /// the text blocks allowed by `options.metadata`. Each chain follows
    /// its next-pointer until null; a disagreement with the declared
    /// count is reported as a [`Diagnostic::CountMismatch`] because the
    /// pointer is the authoritative signal.
    ///
    /// # Arguments
    /// * `path` - Path to the MDF 3.x file on disk.
    /// * `options` - Metadata depth, naming and cancellation settings.
    /// * `sink` - Receives non-fatal warnings.
    ///
    /// # Returns
    /// An [`MdfFile`] containing all parsed blocks or an [`MdfError`] if
    /// the file could not be read or decoded.
    pub fn parse_from_file(
        path: &str,
        options: &ReadOptions,
        sink: &mut DiagnosticSink,
    ) -> Result<Self, MdfError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let identification = IdentificationBlock::from_bytes(&mmap)?;

        // HD block sits at the fixed offset 64.
        let mut header = HeaderBlock::from_bytes(block_tail(&mmap, 64)?)?;
        if options.metadata == MetadataLevel::Full {
            header.resolve_texts(&mmap)?;
        }

        let mut resolver = NameResolver::new(options.filter_channel_names);
        let mut data_groups = Vec::new();
        let mut dg_addr = header.first_dg_addr;
        while dg_addr != 0 {
            if options.check_cancelled() {
                return Err(MdfError::Cancelled);
            }
            let dg_index = data_groups.len();
            let block = DataGroupBlock::from_bytes(block_tail(&mmap, dg_addr)?)?;
            let next_dg_addr = block.next_dg_addr;

            resolver.begin_data_group();
            let channel_groups = if options.metadata == MetadataLevel::GroupsOnly {
                Vec::new()
            } else {
                read_channel_groups(&mmap, &block, dg_index, options, &mut resolver, sink)?
            };

            data_groups.push(RawDataGroup { block, channel_groups });
            dg_addr = next_dg_addr;
        }

        if data_groups.len() != header.num_data_groups as usize {
            sink.emit(Diagnostic::CountMismatch {
                chain: "DG",
                declared: header.num_data_groups as usize,
                walked: data_groups.len(),
            });
        }

        Ok(Self {
            identification,
            header,
            data_groups,
            mmap,
        })
    }
}

fn read_channel_groups(
    mmap: &[u8],
    dg_block: &DataGroupBlock,
    dg_index: usize,
    options: &ReadOptions,
    resolver: &mut NameResolver,
    sink: &mut DiagnosticSink,
) -> Result<Vec<RawChannelGroup>, MdfError> {
    let mut channel_groups = Vec::new();
    let mut cg_addr = dg_block.first_cg_addr;
    while cg_addr != 0 {
        let cg_index = channel_groups.len();
        let mut block = ChannelGroupBlock::from_bytes(block_tail(mmap, cg_addr)?)?;
        let next_cg_addr = block.next_cg_addr;
        if options.metadata == MetadataLevel::Full {
            block.resolve_comment(mmap)?;
        }

        let mut channels = read_channels(mmap, &block, dg_index, cg_index, options, resolver, sink)?;
        // Records list values in first-bit order, not declaration order;
        // the decoder relies on the channel list matching the bytes.
        channels.sort_by_key(|channel| channel.block.first_bit);

        channel_groups.push(RawChannelGroup { block, channels });
        cg_addr = next_cg_addr;
    }

    if channel_groups.len() != dg_block.num_channel_groups as usize {
        sink.emit(Diagnostic::CountMismatch {
            chain: "CG",
            declared: dg_block.num_channel_groups as usize,
            walked: channel_groups.len(),
        });
    }

    Ok(channel_groups)
}

fn read_channels(
    mmap: &[u8],
    cg_block: &ChannelGroupBlock,
    dg_index: usize,
    cg_index: usize,
    options: &ReadOptions,
    resolver: &mut NameResolver,
    sink: &mut DiagnosticSink,
) -> Result<Vec<RawChannel>, MdfError> {
    let mut channels = Vec::new();
    let mut cn_addr = cg_block.first_cn_addr;
    while cn_addr != 0 {
        let cn_index = channels.len();
        let mut block = ChannelBlock::from_bytes(block_tail(mmap, cn_addr)?)?;
        let next_cn_addr = block.next_cn_addr;

        // The ASAM long name participates in disambiguation, so it is
        // read at every metadata level that reaches channels.
        block.resolve_long_name(mmap)?;
        if options.metadata == MetadataLevel::Full {
            block.resolve_texts(mmap)?;
        }
        block.resolve_conversion(mmap)?;

        let resolved = resolver.resolve(
            &block.short_name,
            block.long_name.as_deref(),
            dg_index,
            cg_index,
            cn_index,
        );

        channels.push(RawChannel {
            block,
            name: resolved.name,
            device: resolved.device,
        });
        cn_addr = next_cn_addr;
    }

    if channels.len() != cg_block.num_channels as usize {
        sink.emit(Diagnostic::CountMismatch {
            chain: "CN",
            declared: cg_block.num_channels as usize,
            walked: channels.len(),
        });
    }

    Ok(channels)
}
