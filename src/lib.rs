//! Utilities for reading ASAM MDF 3.x (Measured Data Format) files.
//!
//! The crate exposes a high level API under [`api`] to open a recording,
//! look channels up by name and convert raw samples to physical values,
//! plus a metadata-only [`index::MdfIndex`] catalogue. MDF 4.x files and
//! writing are out of scope.

pub mod blocks;
pub mod error;
pub mod diagnostics;
pub mod options;
pub mod index;

pub mod parsing {
    pub mod decoder;
    pub mod layout;
    pub mod mdf_file;
    pub mod naming;
}

pub mod api {
    pub mod mdf;
    pub mod channel;
}
