use std::{
    fs::File,
    io::{self, Write},
};

use crate::{
    error::RuntimeError,
    interpreter::{dataset::Dataset, evaluator::core::EvalResult, value::core::Value},
    util::num::is_na,
};

/// Where `print` requests and warnings are written.
#[derive(Debug, Default)]
pub enum PrintSink {
    /// Accumulate text in memory.
    #[default]
    Buffer,
    /// Write to standard output.
    Stdout,
    /// Write to an open file.
    File(File),
    /// Discard everything.
    Null,
}

/// A print sink plus the text captured in buffer mode.
#[derive(Debug, Default)]
pub struct Printer {
    sink:   PrintSink,
    buffer: String,
}

impl Printer {
    /// Creates a printer writing to `sink`.
    #[must_use]
    pub fn new(sink: PrintSink) -> Self {
        Self { sink,
               buffer: String::new() }
    }

    /// Writes `text` followed by a newline.
    ///
    /// # Errors
    /// Returns `RuntimeError::Io` if writing to stdout or a file fails.
    pub fn emit(&mut self, text: &str, line: usize) -> EvalResult<()> {
        let result = match &mut self.sink {
            PrintSink::Buffer => {
                self.buffer.push_str(text);
                self.buffer.push('\n');
                Ok(())
            },
            PrintSink::Stdout => writeln!(io::stdout(), "{text}"),
            PrintSink::File(f) => writeln!(f, "{text}"),
            PrintSink::Null => Ok(()),
        };
        result.map_err(|e| RuntimeError::Io { path: "<output>".to_string(),
                                              details: e.to_string(),
                                              line })
    }

    /// Takes the text captured so far in buffer mode.
    pub fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

/// Formats a number the way values are printed.
///
/// Integers print without a decimal point, missing values print as `NA`,
/// and everything else gets six significant digits.
///
/// # Example
/// ```
/// use genr::{interpreter::output::format_number, util::num::NADBL};
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(0.125), "0.125");
/// assert_eq!(format_number(2.0 / 3.0), "0.666667");
/// assert_eq!(format_number(NADBL), "NA");
/// ```
#[must_use]
pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if is_na(x) {
        return "NA".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{x:.0}");
    }
    let magnitude = x.abs().log10().floor();
    if !(-4.0..15.0).contains(&magnitude) {
        let s = format!("{x:.5e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{exp}", trim_zeros(mantissa)),
            None => s,
        };
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let decimals = (5.0 - magnitude).max(0.0) as usize;
    trim_zeros(&format!("{x:.decimals$}")).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Renders a value for a `print` request.
///
/// Series print one observation per line over the current sample, lists
/// print their member names, and named scalars and strings print as
/// `name = value`.
#[must_use]
pub fn render(name: Option<&str>, value: &Value, dataset: &Dataset) -> String {
    match value {
        Value::Scalar(_) | Value::Str(_) => match name {
            Some(n) => format!("{n} = {value}"),
            None => value.to_string(),
        },
        Value::Series(s) => {
            let mut out = name.map(|n| format!("{n}:\n")).unwrap_or_default();
            let width = dataset.n().to_string().len();
            for t in dataset.t1()..=dataset.t2() {
                if let Some(&x) = s.data.get(t) {
                    out.push_str(&format!("{:>width$} {}\n", t + 1, format_number(x)));
                }
            }
            out.trim_end().to_string()
        },
        Value::Matrix(m) => {
            let header = name.map(|n| format!("{n} ({} x {})\n", m.rows(), m.cols()))
                             .unwrap_or_default();
            format!("{header}{m}").trim_end().to_string()
        },
        Value::List(ids) => {
            let names: Vec<&str> = ids.iter().map(|&id| dataset.name(id)).collect();
            match name {
                Some(n) => format!("{n}: {}", names.join(" ")),
                None => names.join(" "),
            }
        },
        Value::Bundle(b) => {
            let body = b.to_string();
            match name {
                Some(n) => format!("{n} {}", body.trim_end()),
                None => body.trim_end().to_string(),
            }
        },
        Value::Null => name.map_or_else(|| "null".to_string(), |n| format!("{n} = null")),
    }
}
