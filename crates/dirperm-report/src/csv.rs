//! Minimal CSV line encoding.
//!
//! Every field is wrapped in double quotes and fields are comma-joined.
//! Embedded quotes are written as-is.

/// Line terminator appended after every row.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";

/// Line terminator appended after every row.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

const QUOTE: char = '"';
const DELIMITER: char = ',';

/// A row being assembled field by field.
#[derive(Debug, Default)]
pub(crate) struct CsvLine {
    line: String,
    fields: usize,
}

impl CsvLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: &str) {
        if self.fields > 0 {
            self.line.push(DELIMITER);
        }
        self.line.push(QUOTE);
        self.line.push_str(value);
        self.line.push(QUOTE);
        self.fields += 1;
    }

    /// Append the finished row and its terminator to `out`.
    pub fn finish(self, out: &mut String) {
        out.push_str(&self.line);
        out.push_str(LINE_ENDING);
    }
}
