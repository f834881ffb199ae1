use crate::blocks::conversion::base::{Conversion, TextRange};
use crate::blocks::conversion::formula::parse_formula;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::parsing::decoder::SampleColumn;

impl Conversion {
    /// Applies the conversion rule to a whole channel column.
    ///
    /// Numeric conversions produce an `F64` column, text look-ups a
    /// `Str` column. `None` means the caller keeps the raw column: the
    /// rule is an identity, the input dtype does not fit the rule, or
    /// the parameters are unusable (reported through `sink` — parameter
    /// problems are warnings, never errors).
    ///
    /// # Parameters
    /// * `column`: The decoded raw column.
    /// * `channel`: Channel name used in diagnostics.
    /// * `sink`: Receives conversion warnings.
    pub fn apply_column(
        &self,
        column: &SampleColumn,
        channel: &str,
        sink: &mut DiagnosticSink,
    ) -> Option<SampleColumn> {
        if self.is_identity() {
            return None;
        }

        match self {
            Conversion::Identity => None,
            Conversion::Linear { p1, p2 } => {
                let raw = column.numeric_values()?;
                Some(SampleColumn::F64(
                    raw.iter().map(|&x| x * p2 + p1).collect(),
                ))
            }
            Conversion::TabularInterp { pairs } => {
                table_lookup(column, pairs, true, channel, sink)
            }
            Conversion::Tabular { pairs } => table_lookup(column, pairs, false, channel, sink),
            Conversion::Polynomial { p } => {
                let raw = column.numeric_values()?;
                let out = raw
                    .iter()
                    .map(|&x| {
                        let shifted = x - p[4] - p[5];
                        let den = p[2] * shifted - p[0];
                        if den == 0.0 {
                            f64::NAN
                        } else {
                            (p[1] - p[3] * shifted) / den
                        }
                    })
                    .collect();
                Some(SampleColumn::F64(out))
            }
            Conversion::Exponential { p } => exp_log(column, p, f64::exp, channel, sink),
            Conversion::Logarithmic { p } => exp_log(column, p, f64::ln, channel, sink),
            Conversion::Rational { p } => {
                let raw = column.numeric_values()?;
                let out = raw
                    .iter()
                    .map(|&x| {
                        let num = p[0] * x * x + p[1] * x + p[2];
                        let den = p[3] * x * x + p[4] * x + p[5];
                        if den == 0.0 { f64::NAN } else { num / den }
                    })
                    .collect();
                Some(SampleColumn::F64(out))
            }
            Conversion::Formula { text } => {
                let Some(parsed) = parse_formula(text) else {
                    sink.emit(Diagnostic::UnsupportedFormula {
                        channel: channel.to_string(),
                        formula: text.clone(),
                    });
                    return None;
                };
                let raw = column.numeric_values()?;
                Some(SampleColumn::F64(
                    raw.iter().map(|&x| parsed.eval(x)).collect(),
                ))
            }
            Conversion::TextTable { pairs } => {
                let raw = column.numeric_values()?;
                let values: Vec<String> = raw
                    .iter()
                    .map(|&x| {
                        pairs
                            .iter()
                            .find(|(key, _)| *key == x)
                            .map(|(_, text)| text.clone())
                            .unwrap_or_default()
                    })
                    .collect();
                Some(SampleColumn::Str { width: 32, values })
            }
            Conversion::TextRangeTable { ranges } => range_table_lookup(column, ranges),
        }
    }
}

/// Tabular conversion shared by types 1 and 2.
///
/// Keys must be strictly increasing. Values outside the key range clamp
/// to the nearest endpoint; inside, either linear interpolation or the
/// nearest key's value (ties to the lower key) is used.
fn table_lookup(
    column: &SampleColumn,
    pairs: &[(f64, f64)],
    interpolate: bool,
    channel: &str,
    sink: &mut DiagnosticSink,
) -> Option<SampleColumn> {
    let raw = column.numeric_values()?;
    if pairs.is_empty() {
        return None;
    }
    if !pairs.windows(2).all(|w| w[1].0 > w[0].0) {
        sink.emit(Diagnostic::NonIncreasingInterpolation {
            channel: channel.to_string(),
        });
        return None;
    }

    let last = pairs.len() - 1;
    let out = raw
        .iter()
        .map(|&x| {
            if x <= pairs[0].0 {
                return pairs[0].1;
            }
            if x >= pairs[last].0 {
                return pairs[last].1;
            }
            for window in pairs.windows(2) {
                let (k0, v0) = window[0];
                let (k1, v1) = window[1];
                if x >= k0 && x <= k1 {
                    if interpolate {
                        let t = (x - k0) / (k1 - k0);
                        return v0 + t * (v1 - v0);
                    }
                    let d0 = x - k0;
                    let d1 = k1 - x;
                    return if d1 < d0 { v1 } else { v0 };
                }
            }
            pairs[last].1
        })
        .collect();
    Some(SampleColumn::F64(out))
}

/// Exponential/logarithmic conversion. One of two parameter branches
/// must hold; otherwise the parameters cannot express a function and the
/// raw column is kept.
fn exp_log(
    column: &SampleColumn,
    p: &[f64; 7],
    f: fn(f64) -> f64,
    channel: &str,
    sink: &mut DiagnosticSink,
) -> Option<SampleColumn> {
    let raw = column.numeric_values()?;
    let out: Vec<f64> = if p[3] == 0.0 && p[0] != 0.0 && p[1] != 0.0 {
        raw.iter()
            .map(|&x| f(((x - p[6]) * p[5] - p[2]) / p[0]) / p[1])
            .collect()
    } else if p[0] == 0.0 && p[3] != 0.0 && p[4] != 0.0 {
        raw.iter()
            .map(|&x| f((p[2] / (x - p[6]) - p[5]) / p[3]) / p[4])
            .collect()
    } else {
        sink.emit(Diagnostic::UnrepresentableConversion {
            channel: channel.to_string(),
        });
        return None;
    };
    Some(SampleColumn::F64(out))
}

/// Text range table: the first triple is the default, the remaining
/// triples are scanned in order for the first `lower <= x <= upper` hit.
fn range_table_lookup(column: &SampleColumn, ranges: &[TextRange]) -> Option<SampleColumn> {
    let raw = column.numeric_values()?;
    let default = ranges.first()?;
    let values: Vec<String> = raw
        .iter()
        .map(|&x| {
            ranges[1..]
                .iter()
                .find(|range| range.lower <= x && x <= range.upper)
                .unwrap_or(default)
                .text
                .clone()
        })
        .collect();
    let width = ranges.iter().map(|range| range.text.len()).max().unwrap_or(0);
    Some(SampleColumn::Str { width, values })
}
