use crate::blocks::conversion::Conversion;
use crate::parsing::decoder::SampleColumn;

/// One channel of the public index.
///
/// Holds the decoded column plus the metadata a caller needs to read it:
/// the master channel it is aligned with, its unit and description, and
/// the conversion still pending when the column is raw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEntry {
    /// Decoded samples, raw or physical.
    pub data: SampleColumn,
    /// Key of the master channel sharing this entry's sample index.
    pub master: String,
    pub unit: String,
    pub description: String,
    /// Device name split off the raw channel name, when present.
    pub device: Option<String>,
    /// Conversion not applied yet; `None` once the column is physical.
    pub conversion: Option<Conversion>,
}

impl ChannelEntry {
    /// True while the column still holds unconverted values.
    pub fn is_raw(&self) -> bool {
        self.conversion.is_some()
    }
}
