//! Logger configuration, construction and output routing.
//!
//! A [`Logger`] is built once from a directory, a file prefix and
//! [`LogOptions`], and is immutable afterwards:
//!
//! ```text
//! log/
//! ├── 2026-01-21.log          # Logger::new("", "", ..)
//! └── oauth/
//!     └── api-2026-01-21.log  # Logger::new("log/oauth", "api", ..)
//! ```
//!
//! Every record goes to the dated file first, then to each extra sink in
//! `LogOptions::output` (`stdout`, `stderr` or another file path).
//!
//! | `development` | encoding | minimum level | sampling | caller |
//! |---|---|---|---|---|
//! | `false` | JSON | info | first 100/s per message, then every 100th | yes |
//! | `true` | console | debug | none | no |
//!
//! `with_trace` attaches a fresh `trace-id` to every record and a non-empty
//! `ref_id` attaches `ref-id`; both may be set at once.
//!
//! ## Usage
//!
//! ```ignore
//! use logkit_core::logging::{LogOptions, Logger, Params};
//!
//! let opts = LogOptions::default().development().with_trace().with_output("stdout");
//! let logger = Logger::new("log/oauth", "", &opts)?;
//!
//! let mut params = Params::new();
//! params.insert("request".into(), "a request".into());
//! logger.log("a full service", Some(&params), None);
//!
//! // or route `tracing` macros through it
//! logger.init_global()?;
//! tracing::info!(user = "ada", "signed in");
//! ```
//!
//! ### Querying production logs with jq
//!
//! ```bash
//! jq 'select(.level == "error")' log/*.log
//! jq 'select(."trace-id" == "api-7.Qx3vT9aLm2-000042")' log/*.log
//! ```

pub mod encoder;
pub mod entry;
pub mod layer;
pub mod logger;
pub mod options;
pub mod sampler;
pub mod writer;

// Re-exports for convenience
pub use encoder::{format_timestamp, local_date, Encoding, TIME_FORMAT};
pub use entry::{Field, Level, LogEntry};
pub use layer::LoggerLayer;
pub use logger::{
    initial_fields, log_file_name, log_file_path, resolve_directory, Logger, Params,
    SugaredLogger, REF_ID_KEY, TRACE_ID_KEY,
};
pub use options::{LogOptions, DEFAULT_DIR, DEFAULT_TIME_ZONE};
pub use sampler::{Sampler, SamplingPolicy};
pub use writer::{Sink, SinkSet, STDERR, STDOUT};
