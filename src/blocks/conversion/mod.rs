pub mod base;
pub mod types;
pub mod formula;
pub mod logic;

pub use base::{Conversion, ConversionBlock, TextRange};
pub use types::ConversionKind;
