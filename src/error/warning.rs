use std::fmt;

/// A non-fatal condition raised while writing a result.
///
/// The statement that raised a warning still completes; the warning is
/// recorded on the context, logged, and echoed to the print sink unless
/// warnings are switched off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Non-finite values were replaced by the missing-value marker before
    /// being stored.
    MissingGenerated {
        /// The variable being written.
        target: String,
        /// How many values were replaced.
        count:  usize,
        /// The source line of the statement.
        line:   usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGenerated { target, count, line } => {
                write!(f,
                       "Warning on line {line}: generated {count} missing value{} in '{target}'.",
                       if *count == 1 { "" } else { "s" })
            },
        }
    }
}
