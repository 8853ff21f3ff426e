use crate::buffer::Buffer;
use crate::mode::RenderMode;
use crate::record::Attrs;
use std::fmt::Write as _;

/// Label used in front of the attribute block in detailed mode
pub const TEXT_LABEL: &str = "\"text\":";

/// Write `key=value` pairs separated by single spaces, in attribute order.
pub fn write_pairs(buf: &mut Buffer, attrs: &Attrs) {
    for (i, (key, value)) in attrs.iter().enumerate() {
        if i > 0 {
            buf.push_byte(b' ');
        }
        buf.push_str(key);
        buf.push_byte(b'=');
        // Writing into a Buffer cannot fail
        let _ = write!(buf, "{}", value);
    }
}

/// Attribute block in text encoding.
///
/// Detailed mode wraps the pairs as `"text":"k=v k=v"`. Values are not
/// escaped inside the quotes.
pub fn write_attrs(buf: &mut Buffer, attrs: &Attrs, render: RenderMode) {
    match render {
        RenderMode::Simplified => write_pairs(buf, attrs),
        RenderMode::Detailed => {
            buf.push_str(TEXT_LABEL);
            buf.push_byte(b'"');
            write_pairs(buf, attrs);
            buf.push_byte(b'"');
        }
    }
}
