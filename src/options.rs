//! Reader configuration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How much of the block graph to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLevel {
    /// Read every block, including comment and identifier texts.
    Full,
    /// Read DG, CG, CN and CC blocks but skip comment/identifier/program
    /// text blocks. ASAM long names are still read because channel
    /// naming depends on them.
    NoComments,
    /// Read only the data group chain.
    GroupsOnly,
}

/// Cooperative cancellation flag shared with long operations.
///
/// Checked between data groups while reading and between channels while
/// converting, never finer-grained than one channel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options accepted by [`crate::api::mdf::Mdf::open_with`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub metadata: MetadataLevel,
    /// Keep only the last dot-delimited segment of long channel names.
    pub filter_channel_names: bool,
    /// When set, only the named channels (plus the master channel of any
    /// group containing one of them) are decoded.
    pub channel_list: Option<Vec<String>>,
    /// Apply all pending conversions before `open` returns. When false,
    /// entries keep their raw columns and conversion descriptors.
    pub convert_after_read: bool,
    /// Decode data groups on worker threads, one group per task.
    pub parallel: bool,
    /// Prefix of the synthetic master channel key, `master<dg>` by default.
    pub master_prefix: String,
    pub cancel: Option<CancelToken>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            metadata: MetadataLevel::Full,
            filter_channel_names: false,
            channel_list: None,
            convert_after_read: true,
            parallel: false,
            master_prefix: String::from("master"),
            cancel: None,
        }
    }
}

impl ReadOptions {
    pub(crate) fn check_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
