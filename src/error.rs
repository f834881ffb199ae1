use thiserror::Error;

#[derive(Debug, Error)]
pub enum MdfError {
    #[error("Invalid file handling")]
    IoError(#[from] std::io::Error),

    #[error("Truncated block at {file}:{line}: need at least {expected} bytes, got {actual}")]
    Truncated {
        actual:   usize,
        expected: usize,
        file:     &'static str,
        line:     u32,
    },

    #[error("Invalid block tag: Expected {expected:?}, got {actual:?}")]
    BadTag {
        actual: String,
        expected: String,
    },

    #[error("Unsupported format version {0}: this reader handles MDF 3.00 to 3.30")]
    UnsupportedVersion(u16),

    #[error("Default byte order is big-endian, which is not supported")]
    UnsupportedEndian,

    #[error("Unsorted data group {data_group}: {channel_groups} channel groups share one data block")]
    UnsupportedLayout {
        data_group: usize,
        channel_groups: usize,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Index serialization error: {0}")]
    Serialization(String),
}
