//! crates/logging-sink/src/format.rs
//! Record renderers.
//!
//! Both renderers append to a caller-supplied buffer so the sink can reuse one
//! allocation for every record.

use std::fmt::Write as _;
use std::time::UNIX_EPOCH;

use logging::{Record, Value};
use serde_json::{Map, Number, Value as Json};

/// Output encoding of a [`WriterSink`](crate::WriterSink).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    /// `LEVEL [file:line] logger: message key=value ...`
    #[default]
    Text,
    /// One JSON object per record.
    Json,
}

/// Renders `record` as a single text line without the terminator.
///
/// # Examples
///
/// ```
/// use logging::{Field, Frame, Level, Record};
///
/// let mut record = Record::new(Level::WARN, "slow request");
/// record.caller = Some(Frame::new("app::serve", "/srv/app/src/server.rs", 42));
/// record.fields.push(Field::new("ms", 812u32));
///
/// let mut out = String::new();
/// logging_sink::render_text(&record, &mut out);
/// assert_eq!(out, "WARN  [server.rs:42] slow request ms=812");
/// ```
pub fn render_text(record: &Record, out: &mut String) {
    let _ = write!(out, "{:<5}", record.level.to_string());
    if let Some(caller) = &record.caller {
        let _ = write!(out, " [{}:{}]", caller.basename(), caller.line);
    }
    if let Some(logger) = &record.logger {
        out.push(' ');
        push_escaped(out, logger);
        out.push(':');
    }
    out.push(' ');
    push_escaped(out, &record.message);
    for field in &record.fields {
        let _ = write!(out, " {}=", field.key);
        match &field.value {
            Value::Str(text) if needs_quoting(text) => {
                let _ = write!(out, "{text:?}");
            }
            value => {
                let _ = write!(out, "{value}");
            }
        }
    }
}

/// Appends `text` with control characters escaped so a record stays on one line.
fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
}

fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '"' || c == '=')
}

/// Renders `record` as one JSON object.
///
/// Keys `ts`, `level`, `msg`, and, when present, `logger` and `caller` are
/// written first; fields follow and may not overwrite them.
pub fn render_json(record: &Record, out: &mut Vec<u8>) -> Result<(), serde_json::Error> {
    let mut object = Map::new();
    let ts = record
        .timestamp
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default();
    object.insert("ts".to_owned(), Number::from_f64(ts).map_or(Json::Null, Json::Number));
    object.insert("level".to_owned(), Json::String(record.level.to_string()));
    if let Some(logger) = &record.logger {
        object.insert("logger".to_owned(), Json::String(logger.to_string()));
    }
    if let Some(caller) = &record.caller {
        object.insert(
            "caller".to_owned(),
            Json::String(format!("{}:{}", caller.file, caller.line)),
        );
    }
    object.insert("msg".to_owned(), Json::String(record.message.clone()));
    for field in &record.fields {
        if object.contains_key(&field.key) {
            continue;
        }
        object.insert(field.key.clone(), json_value(&field.value));
    }
    serde_json::to_writer(out, &Json::Object(object))
}

fn json_value(value: &Value) -> Json {
    match value {
        Value::Str(text) => Json::String(text.clone()),
        Value::I64(number) => Json::from(*number),
        Value::U64(number) => Json::from(*number),
        Value::F64(number) => Number::from_f64(*number).map_or(Json::Null, Json::Number),
        Value::Bool(flag) => Json::Bool(*flag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::{Field, Frame, Level};

    fn record() -> Record {
        let mut record = Record::new(Level::ERROR, "request failed");
        record.caller = Some(Frame::new("app::serve", "/srv/app/src/server.rs", 7));
        record.fields.push(Field::new("peer", "10.0.0.1"));
        record.fields.push(Field::new("reason", "timed out"));
        record
    }

    #[test]
    fn text_quotes_values_with_spaces() {
        let mut out = String::new();
        render_text(&record(), &mut out);
        assert_eq!(
            out,
            "ERROR [server.rs:7] request failed peer=10.0.0.1 reason=\"timed out\""
        );
    }

    #[test]
    fn text_includes_logger_name() {
        let mut record = Record::new(Level::INFO, "up");
        record.logger = Some("net".into());
        let mut out = String::new();
        render_text(&record, &mut out);
        assert_eq!(out, "INFO  net: up");
    }

    #[test]
    fn text_escapes_control_characters_in_message() {
        let record = Record::new(Level::WARN, "first\nsecond\tend\r");
        let mut out = String::new();
        render_text(&record, &mut out);
        assert_eq!(out, "WARN  first\\nsecond\\tend\\r");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn json_contains_core_keys_and_fields() {
        let mut out = Vec::new();
        render_json(&record(), &mut out).unwrap();
        let parsed: Json = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["level"], "ERROR");
        assert_eq!(parsed["msg"], "request failed");
        assert_eq!(parsed["caller"], "/srv/app/src/server.rs:7");
        assert_eq!(parsed["peer"], "10.0.0.1");
        assert!(parsed["ts"].is_f64());
    }

    #[test]
    fn json_fields_do_not_shadow_core_keys() {
        let mut record = Record::new(Level::INFO, "real");
        record.fields.push(Field::new("msg", "fake"));
        record.fields.push(Field::new("count", -2i64));
        let mut out = Vec::new();
        render_json(&record, &mut out).unwrap();
        let parsed: Json = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["msg"], "real");
        assert_eq!(parsed["count"], -2);
        assert!(parsed.get("caller").is_none());
    }
}
