//! Logger construction and the logging call shapes.

use std::error::Error as StdError;
use std::fmt::Display;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, Dispatch};
use tracing_subscriber::layer::SubscriberExt;

use super::encoder::{local_date, Encoding, FILE_DATE_FORMAT};
use super::entry::{Field, Level, LogEntry};
use super::layer::LoggerLayer;
use super::options::{LogOptions, DEFAULT_DIR};
use super::sampler::{Sampler, SamplingPolicy};
use super::writer::SinkSet;
use crate::error::{LogError, Result};
use crate::request_id::{self, RequestIdGenerator};

pub const TRACE_ID_KEY: &str = "trace-id";
pub const REF_ID_KEY: &str = "ref-id";

/// Loosely typed key/value parameters for [`Logger::log`]
pub type Params = Map<String, Value>;

/// `[<prefix>-]<YYYY-MM-DD>.log`
pub fn log_file_name(prefix: &str, date: NaiveDate) -> String {
    let name = format!("{}.log", date.format(FILE_DATE_FORMAT));
    if prefix.is_empty() {
        name
    } else {
        format!("{}-{}", prefix, name)
    }
}

/// Path of the dated log file inside `dir`.
pub fn log_file_path(dir: impl AsRef<Path>, prefix: &str, date: NaiveDate) -> PathBuf {
    dir.as_ref().join(log_file_name(prefix, date))
}

/// Use `directory`, or the default one when empty, creating it and any
/// missing parents.
pub fn resolve_directory(directory: &str) -> Result<PathBuf> {
    let path = PathBuf::from(if directory.is_empty() {
        DEFAULT_DIR
    } else {
        directory
    });

    if !path.is_dir() {
        fs::create_dir_all(&path).map_err(|source| LogError::CreateDir {
            path: path.clone(),
            source,
        })?;
        debug!(dir = %path.display(), "created log directory");
    }
    Ok(path)
}

/// Permanent fields for a logger built with `options`.
///
/// `trace-id` is drawn from `generator` only when requested; `ref-id` is
/// copied verbatim when non-empty. Both may be present.
pub fn initial_fields(
    options: &LogOptions,
    generator: &RequestIdGenerator,
) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    match (options.has_ref_id(), options.with_trace) {
        (true, true) => {
            fields.insert(TRACE_ID_KEY.into(), Value::String(generator.next_id()?));
            fields.insert(REF_ID_KEY.into(), Value::String(options.ref_id.clone()));
        }
        (true, false) => {
            fields.insert(REF_ID_KEY.into(), Value::String(options.ref_id.clone()));
        }
        (false, true) => {
            fields.insert(TRACE_ID_KEY.into(), Value::String(generator.next_id()?));
        }
        (false, false) => {}
    }
    Ok(fields)
}

/// State shared by every handle of one logger.
pub(crate) struct Core {
    file: PathBuf,
    time_zone: Tz,
    min_level: Level,
    encoding: Encoding,
    annotate_caller: bool,
    sampler: Option<Sampler>,
    initial_fields: Map<String, Value>,
    sinks: SinkSet,
}

impl Core {
    pub(crate) fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    pub(crate) fn emit(
        &self,
        level: Level,
        message: String,
        caller: Option<String>,
        fields: Map<String, Value>,
    ) {
        if !self.enabled(level) {
            return;
        }
        if let Some(sampler) = &self.sampler {
            if !sampler.allow(level, &message) {
                return;
            }
        }

        let mut entry = LogEntry::new(level, message).with_fields(fields);
        if self.annotate_caller {
            if let Some(caller) = caller {
                entry = entry.with_caller(caller);
            }
        }

        let line = self.encoding.encode(&entry, &self.initial_fields, &self.time_zone);
        self.sinks.write_line(&line);
    }

    pub(crate) fn flush(&self) {
        self.sinks.flush();
    }
}

fn caller_of(location: &Location<'_>) -> String {
    format!("{}:{}", location.file(), location.line())
}

fn fields_to_map(fields: &[Field]) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| (f.key.clone(), f.value.clone()))
        .collect()
}

fn pairs_to_map<K, V, I>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Serialize,
{
    pairs
        .into_iter()
        .map(|(k, v)| {
            let field = Field::any(k, &v);
            (field.key, field.value)
        })
        .collect()
}

/// A configured logger writing to a dated file and any extra sinks.
///
/// Cloning is cheap; clones share sinks, sampler and permanent fields.
/// Sinks are flushed when the last clone is dropped.
///
/// ```no_run
/// use logkit_core::{Field, LogOptions, Logger};
///
/// let logger = Logger::new("log/oauth", "", &LogOptions::default().with_trace())?;
/// logger.info("token issued", &[Field::string("client", "web")]);
/// logger.log("token refresh", None, None);
/// # Ok::<(), logkit_core::LogError>(())
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<Core>,
}

impl Logger {
    /// Build a logger, drawing any trace-id from the process-wide
    /// identifier generator.
    pub fn new(directory: &str, prefix: &str, options: &LogOptions) -> Result<Self> {
        Self::with_generator(directory, prefix, options, request_id::global())
    }

    /// Build a logger, drawing any trace-id from `generator`.
    pub fn with_generator(
        directory: &str,
        prefix: &str,
        options: &LogOptions,
        generator: &RequestIdGenerator,
    ) -> Result<Self> {
        let time_zone = options.resolve_time_zone()?;
        let dir = resolve_directory(directory)?;
        let file = log_file_path(&dir, prefix, local_date(Utc::now(), &time_zone));
        let initial_fields = initial_fields(options, generator)?;
        let sinks = SinkSet::open(&file, &options.output)?;

        let sampler = if options.development {
            None
        } else {
            Some(Sampler::new(SamplingPolicy::PRODUCTION))
        };

        debug!(
            file = %file.display(),
            sinks = sinks.len(),
            development = options.development,
            "logger built"
        );

        Ok(Self {
            core: Arc::new(Core {
                file,
                time_zone,
                min_level: options.min_level(),
                encoding: options.encoding(),
                annotate_caller: !options.development,
                sampler,
                initial_fields,
                sinks,
            }),
        })
    }

    fn emit(&self, level: Level, msg: &str, fields: &[Field], caller: &Location<'_>) {
        if !self.core.enabled(level) {
            return;
        }
        let caller = Some(caller_of(caller));
        self.core.emit(level, msg.to_string(), caller, fields_to_map(fields));
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, fields: &[Field]) {
        self.emit(Level::Debug, msg, fields, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, msg: &str, fields: &[Field]) {
        self.emit(Level::Info, msg, fields, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, fields: &[Field]) {
        self.emit(Level::Warn, msg, fields, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, msg: &str, fields: &[Field]) {
        self.emit(Level::Error, msg, fields, Location::caller());
    }

    /// Write a fatal record, flush every sink and exit with status 1.
    #[track_caller]
    pub fn fatal(&self, msg: &str, fields: &[Field]) -> ! {
        self.emit(Level::Fatal, msg, fields, Location::caller());
        self.core.flush();
        std::process::exit(1)
    }

    /// Single call site for success and failure paths.
    ///
    /// With an error the record is written at error level and its message
    /// is the error's text; `msg` is not used. Without one it is written
    /// at info level with `msg`. Params become record fields either way.
    #[track_caller]
    pub fn log(&self, msg: &str, params: Option<&Params>, err: Option<&dyn StdError>) {
        let caller = Some(caller_of(Location::caller()));
        let fields = params.cloned().unwrap_or_default();
        match err {
            Some(err) => self.core.emit(Level::Error, err.to_string(), caller, fields),
            None => self.core.emit(Level::Info, msg.to_string(), caller, fields),
        }
    }

    /// Loosely typed view of this logger.
    pub fn sugar(&self) -> SugaredLogger {
        SugaredLogger {
            core: Arc::clone(&self.core),
        }
    }

    /// A `tracing` layer writing through this logger.
    pub fn layer(&self) -> LoggerLayer {
        LoggerLayer::new(Arc::clone(&self.core))
    }

    /// A dispatcher routing `tracing` events to this logger.
    pub fn dispatch(&self) -> Dispatch {
        Dispatch::new(tracing_subscriber::registry().with(self.layer()))
    }

    /// Install this logger as the global `tracing` subscriber.
    pub fn init_global(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch())
            .map_err(|_| LogError::AlreadyInitialized)
    }

    /// Flush every sink.
    pub fn sync(&self) {
        self.core.flush();
    }

    /// Path of the dated log file
    pub fn output_file(&self) -> &Path {
        &self.core.file
    }

    pub fn time_zone(&self) -> Tz {
        self.core.time_zone
    }

    /// Fields attached to every record
    pub fn initial_fields(&self) -> &Map<String, Value> {
        &self.core.initial_fields
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.core.initial_fields.get(TRACE_ID_KEY).and_then(Value::as_str)
    }

    pub fn ref_id(&self) -> Option<&str> {
        self.core.initial_fields.get(REF_ID_KEY).and_then(Value::as_str)
    }

    /// Sink names in write order
    pub fn sinks(&self) -> Vec<String> {
        self.core.sinks.names()
    }

    pub fn min_level(&self) -> Level {
        self.core.min_level
    }

    pub fn encoding(&self) -> Encoding {
        self.core.encoding
    }

    pub fn is_development(&self) -> bool {
        self.core.encoding == Encoding::Console
    }

    pub fn is_sampled(&self) -> bool {
        self.core.sampler.is_some()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("file", &self.core.file)
            .field("time_zone", &self.core.time_zone)
            .field("min_level", &self.core.min_level)
            .field("encoding", &self.core.encoding)
            .field("sinks", &self.core.sinks)
            .finish()
    }
}

/// Loosely typed logging: `Display` messages and ad-hoc key/value pairs.
#[derive(Clone)]
pub struct SugaredLogger {
    core: Arc<Core>,
}

impl SugaredLogger {
    #[track_caller]
    fn emit(&self, level: Level, msg: impl Display, fields: Map<String, Value>) {
        if !self.core.enabled(level) {
            return;
        }
        let caller = Some(caller_of(Location::caller()));
        self.core.emit(level, msg.to_string(), caller, fields);
    }

    #[track_caller]
    pub fn debug(&self, msg: impl Display) {
        self.emit(Level::Debug, msg, Map::new());
    }

    #[track_caller]
    pub fn info(&self, msg: impl Display) {
        self.emit(Level::Info, msg, Map::new());
    }

    #[track_caller]
    pub fn warn(&self, msg: impl Display) {
        self.emit(Level::Warn, msg, Map::new());
    }

    #[track_caller]
    pub fn error(&self, msg: impl Display) {
        self.emit(Level::Error, msg, Map::new());
    }

    #[track_caller]
    pub fn debugw<K, V, I>(&self, msg: impl Display, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.emit(Level::Debug, msg, pairs_to_map(pairs));
    }

    #[track_caller]
    pub fn infow<K, V, I>(&self, msg: impl Display, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.emit(Level::Info, msg, pairs_to_map(pairs));
    }

    #[track_caller]
    pub fn warnw<K, V, I>(&self, msg: impl Display, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.emit(Level::Warn, msg, pairs_to_map(pairs));
    }

    #[track_caller]
    pub fn errorw<K, V, I>(&self, msg: impl Display, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.emit(Level::Error, msg, pairs_to_map(pairs));
    }

    /// Write a fatal record, flush and exit with status 1. Use
    /// `format_args!` for templated messages.
    #[track_caller]
    pub fn fatal(&self, msg: impl Display) -> ! {
        self.emit(Level::Fatal, msg, Map::new());
        self.core.flush();
        std::process::exit(1)
    }
}
