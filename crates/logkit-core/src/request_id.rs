//! Request identifiers.
//!
//! An identifier has the form `<host>.<random>-<counter>`, e.g.
//! `api-7.Qx3vT9aLm2-000042`:
//!
//! - `host` is the machine hostname (`localhost` when it cannot be read)
//! - `random` is 10 base64 characters (without `+` and `/`) drawn from the
//!   OS secure random source on every call
//! - `counter` is an atomically incremented per-process sequence number,
//!   zero-padded to 6 digits
//!
//! The counter alone guarantees uniqueness inside one process; host and
//! random part make identifiers from different processes distinguishable.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Result;

/// Hostname used when the OS lookup fails or returns nothing
pub const FALLBACK_HOST: &str = "localhost";

/// Number of random characters in an identifier
pub const RANDOM_LEN: usize = 10;

/// Process-wide generator backing [`generate_request_id`]
static GLOBAL: RequestIdGenerator = RequestIdGenerator::new();

/// Generate an identifier from the process-wide generator.
///
/// Fails only when the secure random source fails; a degraded identifier
/// is never returned.
pub fn generate_request_id() -> Result<String> {
    GLOBAL.next_id()
}

/// The process-wide generator.
///
/// It is handed out shared, so its sequence can only move forward.
pub fn global() -> &'static RequestIdGenerator {
    &GLOBAL
}

/// Owns the sequence counter identifiers are numbered from.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    counter: AtomicU64,
}

impl RequestIdGenerator {
    /// Create a generator whose first identifier carries sequence 1
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Issue the next identifier.
    pub fn next_id(&self) -> Result<String> {
        let random = random_component()?;
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("{}.{}-{:06}", host_name(), random, seq))
    }

    /// Number of identifiers issued so far
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Restart the sequence at 1.
    ///
    /// Requires exclusive access, so the process-wide generator can never
    /// be restarted:
    ///
    /// ```compile_fail
    /// logkit_core::request_id::global().reset();
    /// ```
    pub fn reset(&mut self) {
        *self.counter.get_mut() = 0;
    }
}

fn host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_HOST.to_string())
}

/// Draw random bytes until the filtered encoding is long enough.
fn random_component() -> Result<String> {
    let mut buf = [0u8; 12];
    loop {
        getrandom::getrandom(&mut buf)?;
        let encoded: String = STANDARD
            .encode(buf)
            .chars()
            .filter(|c| *c != '+' && *c != '/')
            .collect();
        if encoded.len() >= RANDOM_LEN {
            return Ok(encoded[..RANDOM_LEN].to_string());
        }
    }
}
