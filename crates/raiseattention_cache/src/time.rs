use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch, saturating to `0` if the clock is somehow set
/// before it. Used only for index bookkeeping (LRU ordering, TTL pruning),
/// never for cache key material.
#[must_use]
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
