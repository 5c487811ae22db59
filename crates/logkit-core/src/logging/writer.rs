//! Sinks and fan-out.
//!
//! A logger writes every record to each sink in its [`SinkSet`], in order.
//! The primary dated log file always comes first; extra sinks follow in the
//! order they were configured. Sinks are not de-duplicated: a destination
//! listed twice is opened twice and receives every record twice.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;

use super::encoder::TIME_FORMAT;
use crate::error::{LogError, Result};

/// Token naming the process's standard output
pub const STDOUT: &str = "stdout";

/// Token naming the process's standard error
pub const STDERR: &str = "stderr";

/// A single destination for encoded records.
pub enum Sink {
    Stdout,
    Stderr,
    File {
        path: PathBuf,
        writer: Mutex<BufWriter<File>>,
    },
}

impl Sink {
    /// Open a sink from a configuration token: `stdout`, `stderr` or a
    /// file path (opened in append mode, created if missing).
    pub fn open(token: &str) -> Result<Self> {
        match token {
            STDOUT => Ok(Self::Stdout),
            STDERR => Ok(Self::Stderr),
            path => Self::open_file(Path::new(path)),
        }
    }

    pub fn open_file(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::OpenSink {
                sink: path.display().to_string(),
                source,
            })?;

        Ok(Self::File {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Token this sink was opened from
    pub fn name(&self) -> String {
        match self {
            Self::Stdout => STDOUT.to_string(),
            Self::Stderr => STDERR.to_string(),
            Self::File { path, .. } => path.display().to_string(),
        }
    }

    /// Write one line and flush it through to the OS.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
            Self::Stderr => {
                let mut out = io::stderr().lock();
                writeln!(out, "{}", line)
            }
            Self::File { writer, .. } => {
                let mut writer = writer.lock();
                writeln!(writer, "{}", line)?;
                writer.flush()
            }
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().flush(),
            Self::Stderr => io::stderr().flush(),
            Self::File { writer, .. } => writer.lock().flush(),
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Sink").field(&self.name()).finish()
    }
}

/// Record sinks plus the sinks that receive the engine's own write errors.
#[derive(Debug)]
pub struct SinkSet {
    outputs: Vec<Sink>,
    error_outputs: Vec<Sink>,
}

impl SinkSet {
    /// Open the primary file followed by every extra token, for both
    /// record output and error output.
    pub fn open(primary: &Path, extra: &[String]) -> Result<Self> {
        let open_all = || -> Result<Vec<Sink>> {
            let mut sinks = Vec::with_capacity(extra.len() + 1);
            sinks.push(Sink::open_file(primary)?);
            for token in extra {
                sinks.push(Sink::open(token)?);
            }
            Ok(sinks)
        };

        Ok(Self {
            outputs: open_all()?,
            error_outputs: open_all()?,
        })
    }

    /// Sink names in write order
    pub fn names(&self) -> Vec<String> {
        self.outputs.iter().map(Sink::name).collect()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Write a line to every sink. A failing sink does not stop the
    /// others; the failure is reported on the error outputs.
    pub fn write_line(&self, line: &str) {
        for sink in &self.outputs {
            if let Err(e) = sink.write_line(line) {
                self.report_error(sink, &e);
            }
        }
    }

    /// Flush every sink, reporting failures like write errors.
    pub fn flush(&self) {
        for sink in &self.outputs {
            if let Err(e) = sink.flush() {
                self.report_error(sink, &e);
            }
        }
    }

    fn report_error(&self, failed: &Sink, err: &io::Error) {
        let line = format!(
            "{} write error: sink {}: {}",
            Utc::now().format(TIME_FORMAT),
            failed.name(),
            err
        );

        let mut reported = false;
        for sink in &self.error_outputs {
            reported |= sink.write_line(&line).is_ok();
        }
        if !reported {
            eprintln!("{}", line);
        }
    }
}

impl Drop for SinkSet {
    fn drop(&mut self) {
        self.flush();
    }
}
