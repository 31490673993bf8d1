//! Pure computation helpers shared by the sequence backends.
//!
//! All functions are deterministic and side-effect free; store state is
//! passed in explicitly.

/// Whether `step` is a valid increment amount.
#[inline]
pub fn is_valid_step(step: i64) -> bool {
    step > 0
}

/// Compute the fallback default used to initialize a sequence that has
/// never been written: the observed baseline plus the requested step.
///
/// Returns `None` on i64 overflow.
#[inline]
pub fn fallback_default(baseline: i64, step: i64) -> Option<i64> {
    baseline.checked_add(step)
}

/// Parse a stored counter value. Counters are stored as decimal strings.
#[inline]
pub fn parse_counter_value(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Name of the mutex guarding first-use initialization of `key`.
///
/// Scoped per sequence key, never shared across unrelated sequences.
#[inline]
pub fn lock_name_for(key: &str) -> String {
    format!("lock:sequence:{key}")
}
