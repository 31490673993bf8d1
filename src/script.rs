//! Embedded atomic scripts for the scripted backend.
//!
//! The scripts fuse the exists-check and the mutation into one server-side
//! unit, so two clients racing on first use cannot both win initialization
//! and no increment can interleave with one. `step` and the optional
//! default cross the wire as decimal strings and are parsed back by the
//! script itself; this stays correct across client libraries that narrow or
//! widen native integers inconsistently, and must not be "simplified" to
//! native integer transport.

/// Increment the key when it exists, otherwise report absence.
pub const NEXT_VALUE_SCRIPT: &str = include_str!("scripts/next_value.lua");

/// Increment the key when it exists, otherwise initialize it to the
/// supplied default and return the default itself (not default + step).
pub const NEXT_VALUE_WITH_DEFAULT_SCRIPT: &str = include_str!("scripts/next_value_with_default.lua");

/// Marshal script arguments: the step first, then the default when present,
/// both as decimal strings.
pub fn script_args(step: i64, default: Option<i64>) -> Vec<String> {
    let mut args = Vec::with_capacity(2);
    args.push(step.to_string());
    if let Some(default) = default {
        args.push(default.to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_are_decimal_strings() {
        assert_eq!(script_args(10, None), vec!["10".to_string()]);
        assert_eq!(script_args(10, Some(110)), vec!["10".to_string(), "110".to_string()]);
    }

    #[test]
    fn scripts_are_distinct_variants() {
        assert!(!NEXT_VALUE_SCRIPT.contains("ARGV[2]"));
        assert!(NEXT_VALUE_WITH_DEFAULT_SCRIPT.contains("ARGV[2]"));
    }
}
