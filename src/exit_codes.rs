//! Exit code constants for the bosun CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state)
//! - 2: Configuration/environment failure (no meaningful work possible)
//! - 3: Record store failure (issue record could not be read or written)
//! - 4: Internal invariant violation

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid state.
pub const USER_ERROR: i32 = 1;

/// Configuration failure: missing/invalid config file, missing issues
/// directory, or a required setting that was not provided.
pub const CONFIG_FAILURE: i32 = 2;

/// Record store failure: an issue record could not be read or written back.
pub const RECORD_FAILURE: i32 = 3;

/// Internal invariant violation (e.g. assignment recorded against a
/// saturated agent).
pub const INTERNAL_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            CONFIG_FAILURE,
            RECORD_FAILURE,
            INTERNAL_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
        assert_eq!(CONFIG_FAILURE, 2);
        assert_eq!(RECORD_FAILURE, 3);
        assert_eq!(INTERNAL_FAILURE, 4);
    }
}
