use crate::buffer::Buffer;
use crate::formatters::text::TEXT_LABEL;
use crate::formatters::BAD_JSON;
use crate::mode::RenderMode;
use crate::record::Attrs;
use serde_json::{Map, Value as JsonValue};

/// Write `s` as a JSON string literal.
pub fn write_quoted(buf: &mut Buffer, s: &str) {
    let start = buf.len();
    if serde_json::to_writer(&mut *buf, s).is_err() {
        buf.truncate(start);
        buf.push_str(BAD_JSON);
    }
}

/// Flat JSON object of the attributes, every value as its string rendering.
pub fn attrs_to_json(attrs: &Attrs) -> JsonValue {
    let map: Map<String, JsonValue> = attrs
        .iter()
        .map(|(key, value)| (key.to_string(), JsonValue::String(value.to_string())))
        .collect();
    JsonValue::Object(map)
}

/// Attribute block in JSON encoding. Detailed mode keeps the `"text":` label.
pub fn write_attrs(buf: &mut Buffer, attrs: &Attrs, render: RenderMode) {
    if render == RenderMode::Detailed {
        buf.push_str(TEXT_LABEL);
    }
    let start = buf.len();
    if serde_json::to_writer(&mut *buf, &attrs_to_json(attrs)).is_err() {
        buf.truncate(start);
        buf.push_str(BAD_JSON);
    }
}
