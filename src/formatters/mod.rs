use crate::buffer::Buffer;
use crate::record::Record;

/// Written in place of a field-order entry that is not a known field
pub const BAD_FIELD: &str = "!BAD-BUILD-IN";
/// Written in place of a timestamp the configured layout cannot render
pub const BAD_TIME: &str = "!BAD-TIME";
/// Written in place of a value that failed JSON encoding
pub const BAD_JSON: &str = "!BAD-JSON";

/// Trait for rendering records into a line buffer
pub trait RecordFormatter: Send + Sync {
    /// Append exactly one newline-terminated line for `record`.
    fn format_record(&self, record: &Record, buf: &mut Buffer);

    fn format_to_string(&self, record: &Record) -> String {
        let mut buf = Buffer::default();
        self.format_record(record, &mut buf);
        buf.as_str_lossy().into_owned()
    }
}

pub mod json;
pub mod line;
pub mod text;
