//! logkit core library
//!
//! Opinionated structured logging for services.
//!
//! ## Overview
//!
//! - **Request identifiers**: `<host>.<random>-<counter>` strings, unique
//!   within a process and distinguishable across processes
//!   ([`generate_request_id`])
//! - **Loggers**: dated log files with optional console fan-out, JSON or
//!   console encoding, zone-stable timestamps and permanent `trace-id` /
//!   `ref-id` fields ([`Logger`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use logkit_core::{LogOptions, Logger, Params};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let opts = LogOptions::default().with_trace().with_output("stdout");
//!     let logger = Logger::new("log", "billing", &opts)?;
//!
//!     let mut params = Params::new();
//!     params.insert("invoice".into(), "INV-1".into());
//!     logger.log("invoice sent", Some(&params), None);
//!
//!     let err = std::io::Error::new(std::io::ErrorKind::Other, "smtp timeout");
//!     logger.log("", Some(&params), Some(&err));
//!
//!     println!("logging to {}", logger.output_file().display());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod request_id;

// Re-exports
pub use error::{LogError, Result};
pub use logging::{
    Encoding, Field, Level, LogOptions, Logger, LoggerLayer, Params, SugaredLogger,
};
pub use request_id::{generate_request_id, RequestIdGenerator};
