//! Cache-busting marker for non-idempotent operations.
//!
//! Environment providers may memoize runs by recipe fingerprint. Every
//! operation with a network side effect sets [`CACHE_BUSTER_VAR`] to a fresh
//! value so its recipe is never seen twice.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};

/// Environment variable carrying the marker.
pub const CACHE_BUSTER_VAR: &str = "CACHE_BUSTER";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A new marker value: nanosecond timestamp plus a process-wide sequence
/// number, so two calls within the same clock tick still differ.
#[must_use]
pub fn fresh_marker() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{seq}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
    )
}
