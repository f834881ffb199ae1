//! Metadata-only file catalogue.
//!
//! An [`MdfIndex`] lists the groups and channels of a file without
//! decoding any sample data, and serializes to JSON so the listing can
//! be built once and reused.

use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticSink;
use crate::error::MdfError;
use crate::options::{MetadataLevel, ReadOptions};
use crate::parsing::mdf_file::MdfFile;

/// Channel metadata as listed in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChannel {
    pub name: String,
    pub master: String,
    pub unit: String,
    pub description: String,
    pub bit_count: u16,
    pub signal_data_type: u16,
    /// Conversion type code, absent when the channel stores physical
    /// values directly: no conversion block, or one whose rule cannot
    /// change any value (identity, unity linear).
    pub conversion_type: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChannelGroup {
    pub record_size: u16,
    pub record_count: u32,
    pub channels: Vec<IndexedChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDataGroup {
    /// Master key shared by all channels of this group.
    pub master: String,
    pub channel_groups: Vec<IndexedChannelGroup>,
}

/// Lightweight catalogue of an MDF 3.x file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdfIndex {
    pub version: u16,
    pub data_groups: Vec<IndexedDataGroup>,
}

impl MdfIndex {
    /// Builds an index by reading only the metadata graph of a file.
    pub fn from_file(path: &str) -> Result<Self, MdfError> {
        let options = ReadOptions {
            metadata: MetadataLevel::NoComments,
            ..ReadOptions::default()
        };
        let mut sink = DiagnosticSink::new();
        let file = MdfFile::parse_from_file(path, &options, &mut sink)?;

        let data_groups = file
            .data_groups
            .iter()
            .enumerate()
            .map(|(dg_index, group)| {
                let master = format!("{}{}", options.master_prefix, dg_index);
                let channel_groups = group
                    .channel_groups
                    .iter()
                    .map(|channel_group| IndexedChannelGroup {
                        record_size: channel_group.block.record_size,
                        record_count: channel_group.block.num_records,
                        channels: channel_group
                            .channels
                            .iter()
                            .map(|channel| IndexedChannel {
                                name: if channel.block.is_master() {
                                    master.clone()
                                } else {
                                    channel.name.clone()
                                },
                                master: master.clone(),
                                unit: channel
                                    .block
                                    .conversion
                                    .as_ref()
                                    .map(|block| block.unit.clone())
                                    .unwrap_or_default(),
                                description: channel.block.description.clone(),
                                bit_count: channel.block.bit_count,
                                signal_data_type: channel.block.signal_data_type,
                                conversion_type: channel
                                    .block
                                    .conversion
                                    .as_ref()
                                    .filter(|block| !block.conversion.is_identity())
                                    .map(|block| block.kind.to_u16()),
                            })
                            .collect(),
                    })
                    .collect();
                IndexedDataGroup { master, channel_groups }
            })
            .collect();

        Ok(MdfIndex {
            version: file.identification.version,
            data_groups,
        })
    }

    /// All channel names in file order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.data_groups
            .iter()
            .flat_map(|group| &group.channel_groups)
            .flat_map(|channel_group| &channel_group.channels)
            .map(|channel| channel.name.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, MdfError> {
        serde_json::to_string_pretty(self)
            .map_err(|error| MdfError::Serialization(error.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, MdfError> {
        serde_json::from_str(json).map_err(|error| MdfError::Serialization(error.to_string()))
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), MdfError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self, MdfError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
