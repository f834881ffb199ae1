/// Represents the conversion type (cc_type) from a conversion block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// 0: Parametric, linear
    Linear,
    /// 1: Tabular with interpolation
    TabularInterp,
    /// 2: Tabular
    Tabular,
    /// 6: Polynomial
    Polynomial,
    /// 7: Exponential
    Exponential,
    /// 8: Logarithmic
    Logarithmic,
    /// 9: Rational
    Rational,
    /// 10: ASAM-MCD2 text formula
    Formula,
    /// 11: ASAM-MCD2 text table
    TextTable,
    /// 12: Text range table
    TextRangeTable,
    /// 65535: 1:1 conversion, raw is physical
    Identity,
    /// For any other unrecognized conversion type.
    Unknown(u16),
}

impl ConversionKind {
    /// Converts a raw u16 value to the corresponding ConversionKind.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => ConversionKind::Linear,
            1 => ConversionKind::TabularInterp,
            2 => ConversionKind::Tabular,
            6 => ConversionKind::Polynomial,
            7 => ConversionKind::Exponential,
            8 => ConversionKind::Logarithmic,
            9 => ConversionKind::Rational,
            10 => ConversionKind::Formula,
            11 => ConversionKind::TextTable,
            12 => ConversionKind::TextRangeTable,
            65535 => ConversionKind::Identity,
            other => ConversionKind::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            ConversionKind::Linear => 0,
            ConversionKind::TabularInterp => 1,
            ConversionKind::Tabular => 2,
            ConversionKind::Polynomial => 6,
            ConversionKind::Exponential => 7,
            ConversionKind::Logarithmic => 8,
            ConversionKind::Rational => 9,
            ConversionKind::Formula => 10,
            ConversionKind::TextTable => 11,
            ConversionKind::TextRangeTable => 12,
            ConversionKind::Identity => 65535,
            ConversionKind::Unknown(other) => other,
        }
    }
}
