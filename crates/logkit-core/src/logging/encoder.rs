//! Record encodings and timestamp rendering.
//!
//! Production records are single-line JSON objects:
//!
//! ```text
//! {"level":"info","ts":"2024/03/05 10:00:00","caller":"src/api.rs:42","msg":"served","trace-id":"..."}
//! ```
//!
//! Development records are tab-separated console lines, with any fields
//! appended as one JSON object:
//!
//! ```text
//! 2024/03/05 10:00:00	INFO	served	{"trace-id":"..."}
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};

use super::entry::LogEntry;

/// Timestamp layout of every record
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Date layout of log file names
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

pub const LEVEL_KEY: &str = "level";
pub const TIME_KEY: &str = "ts";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "msg";

const RESERVED_KEYS: [&str; 4] = [LEVEL_KEY, TIME_KEY, CALLER_KEY, MESSAGE_KEY];

/// Render `time` in `zone`, independent of the host's local zone.
pub fn format_timestamp(time: DateTime<Utc>, zone: &Tz) -> String {
    time.with_timezone(zone).format(TIME_FORMAT).to_string()
}

/// The calendar date of `time` in `zone`.
pub fn local_date(time: DateTime<Utc>, zone: &Tz) -> NaiveDate {
    time.with_timezone(zone).date_naive()
}

/// How records are laid out on a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One JSON object per line
    Json,
    /// Human-readable tab-separated line
    Console,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Console => "console",
        }
    }

    /// Encode one record as a single line without the trailing newline.
    ///
    /// `initial` holds the logger's permanent fields; they precede the
    /// record's own fields, and a record field with the same key is
    /// written as `fields.<key>` instead of replacing them.
    pub fn encode(&self, entry: &LogEntry, initial: &Map<String, Value>, zone: &Tz) -> String {
        let ts = format_timestamp(entry.time, zone);
        match self {
            Self::Json => {
                let mut object = Map::new();
                object.insert(LEVEL_KEY.into(), Value::String(entry.level.as_str().into()));
                object.insert(TIME_KEY.into(), Value::String(ts));
                if let Some(caller) = &entry.caller {
                    object.insert(CALLER_KEY.into(), Value::String(caller.clone()));
                }
                object.insert(MESSAGE_KEY.into(), Value::String(entry.message.clone()));
                merge_context(&mut object, initial, &entry.fields);
                Value::Object(object).to_string()
            }
            Self::Console => {
                let mut line = format!("{}\t{}\t{}", ts, entry.level.as_capital(), entry.message);
                let mut context = Map::new();
                merge_context(&mut context, initial, &entry.fields);
                if !context.is_empty() {
                    line.push('\t');
                    line.push_str(&Value::Object(context).to_string());
                }
                line
            }
        }
    }
}

fn merge_context(
    target: &mut Map<String, Value>,
    initial: &Map<String, Value>,
    fields: &Map<String, Value>,
) {
    for (key, value) in initial {
        target.insert(key.clone(), value.clone());
    }
    for (key, value) in fields {
        let key = if initial.contains_key(key) {
            renamed(key)
        } else {
            context_key(key)
        };
        target.insert(key, value.clone());
    }
}

/// Keep fields from overwriting the record's own keys.
fn context_key(key: &str) -> String {
    if RESERVED_KEYS.contains(&key) {
        renamed(key)
    } else {
        key.to_string()
    }
}

fn renamed(key: &str) -> String {
    format!("fields.{}", key)
}
