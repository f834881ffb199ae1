use std::collections::{HashMap, HashSet};
use std::thread;

use crate::api::channel::ChannelEntry;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::MdfError;
use crate::options::{CancelToken, MetadataLevel, ReadOptions};
use crate::parsing::decoder::{SampleColumn, decode_sorted};
use crate::parsing::layout::{Endianness, RecordLayout};
use crate::parsing::mdf_file::{MdfFile, RawChannelGroup, RawDataGroup};

/// Columns of one data group: `(cg_index, [(cn_index, column)])`.
type GroupColumns = Vec<(usize, Vec<(usize, SampleColumn)>)>;

/// High level representation of an MDF 3.x file.
///
/// `open` reads the whole file eagerly: metadata graph, record decode
/// and (by default) conversion to physical values. The file handle and
/// mapping are released before `open` returns; everything the struct
/// holds is owned.
#[derive(Debug)]
pub struct Mdf {
    version: u16,
    data_group_count: usize,
    author: String,
    organisation: String,
    project: String,
    subject: String,
    comment: String,
    date: String,
    time: String,
    timestamp_ns: Option<u64>,
    utc_offset_hours: Option<i16>,
    time_quality: Option<u16>,
    timer_id: Option<String>,
    program_notes: Option<String>,

    channels: Vec<(String, ChannelEntry)>,
    lookup: HashMap<String, usize>,
    masters: Vec<(String, Vec<String>)>,
    diagnostics: DiagnosticSink,
    cancel: Option<CancelToken>,
}

impl Mdf {
    /// Parse and decode an MDF 3.x file from disk with default options.
    ///
    /// # Arguments
    /// * `path` - Path to the file.
    ///
    /// # Returns
    /// A new [`Mdf`] on success or [`MdfError`] on failure.
    pub fn open(path: &str) -> Result<Self, MdfError> {
        Self::open_with(path, ReadOptions::default())
    }

    /// Parse and decode an MDF 3.x file with explicit [`ReadOptions`].
    pub fn open_with(path: &str, options: ReadOptions) -> Result<Self, MdfError> {
        let mut sink = DiagnosticSink::new();
        let file = MdfFile::parse_from_file(path, &options, &mut sink)?;

        let mut mdf = Mdf {
            version: file.identification.version,
            data_group_count: file.data_groups.len(),
            author: file.header.author.clone(),
            organisation: file.header.organisation.clone(),
            project: file.header.project.clone(),
            subject: file.header.subject.clone(),
            comment: file.header.comment.clone().unwrap_or_default(),
            date: file.header.iso_date(),
            time: file.header.time.clone(),
            timestamp_ns: file.header.timestamp_ns,
            utc_offset_hours: file.header.utc_offset_hours,
            time_quality: file.header.time_quality,
            timer_id: file.header.timer_id.clone(),
            program_notes: file.header.program_notes.clone(),
            channels: Vec::new(),
            lookup: HashMap::new(),
            masters: Vec::new(),
            diagnostics: sink,
            cancel: options.cancel.clone(),
        };

        if options.metadata != MetadataLevel::GroupsOnly {
            let decoded = decode_all(&file, &options)?;
            mdf.build_index(&file, decoded, &options);
        }

        if options.convert_after_read {
            mdf.convert_all()?;
        }

        // The mapping (and with it the file handle) is dropped here;
        // every column above is owned.
        Ok(mdf)
    }

    fn build_index(&mut self, file: &MdfFile, decoded: Vec<GroupColumns>, options: &ReadOptions) {
        for (dg_index, (group, group_columns)) in
            file.data_groups.iter().zip(decoded).enumerate()
        {
            let master_key = format!("{}{}", options.master_prefix, dg_index);
            let mut members = Vec::new();

            for (cg_index, columns) in group_columns {
                let channel_group = &group.channel_groups[cg_index];
                for (cn_index, column) in columns {
                    let raw = &channel_group.channels[cn_index];
                    let name = if raw.block.is_master() {
                        master_key.clone()
                    } else {
                        raw.name.clone()
                    };
                    let conversion_block = raw.block.conversion.as_ref();
                    let unit = conversion_block
                        .map(|block| block.unit.clone())
                        .unwrap_or_default();
                    let conversion = conversion_block
                        .map(|block| &block.conversion)
                        .filter(|conversion| !conversion.is_identity())
                        .cloned();

                    let entry = ChannelEntry {
                        data: column,
                        master: master_key.clone(),
                        unit,
                        description: raw.block.description.clone(),
                        device: raw.device.clone(),
                        conversion,
                    };

                    members.push(name.clone());
                    match self.lookup.get(&name) {
                        Some(&index) => self.channels[index] = (name, entry),
                        None => {
                            self.lookup.insert(name.clone(), self.channels.len());
                            self.channels.push((name, entry));
                        }
                    }
                }
            }

            if !members.is_empty() {
                self.masters.push((master_key, members));
            }
        }
    }

    /// Names of all channels, in file order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Whether a channel exists; never fails.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Channel entry without triggering conversion. A missing name is a
    /// value, not an error.
    pub fn entry(&self, name: &str) -> Option<&ChannelEntry> {
        self.lookup.get(name).map(|&index| &self.channels[index].1)
    }

    /// Samples of a channel, converting to physical values on first
    /// access. Returns `None` for unknown names.
    pub fn get(&mut self, name: &str) -> Option<&SampleColumn> {
        let index = *self.lookup.get(name)?;
        self.convert_index(index);
        Some(&self.channels[index].1.data)
    }

    /// Applies the pending conversion of one channel, if any.
    pub fn convert_channel(&mut self, name: &str) -> bool {
        match self.lookup.get(name) {
            Some(&index) => {
                self.convert_index(index);
                true
            }
            None => false,
        }
    }

    /// Converts every channel that still holds raw values. Applying this
    /// twice is equivalent to applying it once.
    pub fn convert_all(&mut self) -> Result<(), MdfError> {
        for index in 0..self.channels.len() {
            if self
                .cancel
                .as_ref()
                .is_some_and(CancelToken::is_cancelled)
            {
                return Err(MdfError::Cancelled);
            }
            self.convert_index(index);
        }
        Ok(())
    }

    fn convert_index(&mut self, index: usize) {
        let (name, entry) = &mut self.channels[index];
        if let Some(conversion) = entry.conversion.take() {
            if let Some(converted) =
                conversion.apply_column(&entry.data, name, &mut self.diagnostics)
            {
                entry.data = converted;
            }
        }
    }

    /// Drops every channel not named in `subset`. Masters referenced by
    /// a kept channel are retained even when not named.
    pub fn keep(&mut self, subset: &[&str]) {
        let wanted: HashSet<&str> = subset.iter().copied().collect();
        let mut kept: HashSet<String> = self
            .channels
            .iter()
            .filter(|(name, _)| wanted.contains(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect();
        let masters_needed: HashSet<String> = self
            .channels
            .iter()
            .filter(|(name, _)| kept.contains(name))
            .map(|(_, entry)| entry.master.clone())
            .collect();
        kept.extend(masters_needed.iter().cloned());

        self.channels.retain(|(name, _)| kept.contains(name));
        self.lookup = self
            .channels
            .iter()
            .enumerate()
            .map(|(index, (name, _))| (name.clone(), index))
            .collect();
        self.masters.retain_mut(|(master, members)| {
            if !masters_needed.contains(master) {
                return false;
            }
            members.retain(|name| kept.contains(name));
            !members.is_empty()
        });
    }

    /// Master keys with the channels sharing each master, in the order
    /// imposed by the record layout.
    pub fn master_channel_list(&self) -> &[(String, Vec<String>)] {
        &self.masters
    }

    /// Channels aligned with the given master key.
    pub fn channels_of_master(&self, master: &str) -> Option<&[String]> {
        self.masters
            .iter()
            .find(|(key, _)| key == master)
            .map(|(_, members)| members.as_slice())
    }

    /// Warnings collected while reading and converting.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    /// Removes and returns all collected warnings.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn data_group_count(&self) -> usize {
        self.data_group_count
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn organisation(&self) -> &str {
        &self.organisation
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Measurement date as ISO-8601 `yyyy-mm-dd`.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Measurement time as `hh:mm:ss`.
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Absolute start time in nanoseconds since epoch, 3.20+ files only.
    pub fn timestamp_ns(&self) -> Option<u64> {
        self.timestamp_ns
    }

    pub fn utc_offset_hours(&self) -> Option<i16> {
        self.utc_offset_hours
    }

    pub fn time_quality(&self) -> Option<u16> {
        self.time_quality
    }

    pub fn timer_id(&self) -> Option<&str> {
        self.timer_id.as_deref()
    }

    pub fn program_notes(&self) -> Option<&str> {
        self.program_notes.as_deref()
    }
}

/// Decodes every data group, optionally on one worker thread per group.
/// Data groups are disjoint, so the parallel path shares only the mapped
/// bytes and joins before returning.
fn decode_all(file: &MdfFile, options: &ReadOptions) -> Result<Vec<GroupColumns>, MdfError> {
    let data: &[u8] = &file.mmap;

    if options.parallel && file.data_groups.len() > 1 {
        if options.check_cancelled() {
            return Err(MdfError::Cancelled);
        }
        return thread::scope(|scope| {
            let handles: Vec<_> = file
                .data_groups
                .iter()
                .enumerate()
                .map(|(dg_index, group)| {
                    scope.spawn(move || decode_data_group(data, dg_index, group, options))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });
    }

    let mut decoded = Vec::with_capacity(file.data_groups.len());
    for (dg_index, group) in file.data_groups.iter().enumerate() {
        if options.check_cancelled() {
            return Err(MdfError::Cancelled);
        }
        decoded.push(decode_data_group(data, dg_index, group, options)?);
    }
    Ok(decoded)
}

fn decode_data_group(
    data: &[u8],
    dg_index: usize,
    group: &RawDataGroup,
    options: &ReadOptions,
) -> Result<GroupColumns, MdfError> {
    if group.channel_groups.len() > 1 {
        // Multiple channel groups share one record-ID-dispatched data
        // block; this reader only handles sorted groups.
        return Err(MdfError::UnsupportedLayout {
            data_group: dg_index,
            channel_groups: group.channel_groups.len(),
        });
    }

    let mut decoded = Vec::new();
    for (cg_index, channel_group) in group.channel_groups.iter().enumerate() {
        let record_count = channel_group.block.num_records as usize;
        if record_count == 0 || group.block.data_addr == 0 {
            continue;
        }

        let selected = select_channels(channel_group, options);
        if let Some(wanted) = &selected {
            if wanted.is_empty() {
                continue;
            }
        }

        let layout = RecordLayout::resolve(
            group.block.num_record_ids,
            channel_group.block.record_size,
            &channel_group.channels,
            Endianness::Little,
        )?;
        let columns = decode_sorted(
            data,
            group.block.data_addr,
            &layout,
            record_count,
            selected.as_ref(),
        )?;
        decoded.push((cg_index, columns));
    }
    Ok(decoded)
}

/// Channel indices to decode for one group, honouring the channel list.
/// The master channel rides along whenever any group member is wanted.
fn select_channels(
    channel_group: &RawChannelGroup,
    options: &ReadOptions,
) -> Option<HashSet<usize>> {
    let list = options.channel_list.as_ref()?;
    let mut selected: HashSet<usize> = channel_group
        .channels
        .iter()
        .enumerate()
        .filter(|(_, channel)| list.iter().any(|wanted| wanted == &channel.name))
        .map(|(index, _)| index)
        .collect();
    if !selected.is_empty() {
        for (index, channel) in channel_group.channels.iter().enumerate() {
            if channel.block.is_master() {
                selected.insert(index);
            }
        }
    }
    Some(selected)
}
