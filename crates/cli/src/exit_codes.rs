//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success                                         |
//! | 1    | General error (unspecified)                     |
//! | 2    | CLI usage error (bad args)                      |
//! | 3    | Policy config failed to parse or validate       |
//! | 4    | Input is not an array of record objects         |
//! | 5    | File could not be found, read or written        |

use cinemerge_merge::MergeError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Policy config rejected (TOML syntax, unknown policy, bad priority list).
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Canonical input is structurally invalid.
pub const EXIT_INVALID_INPUT: u8 = 4;

/// IO failure: no input file found, unreadable input, unwritable output.
pub const EXIT_IO: u8 = 5;

/// Map an engine error to its exit code.
pub fn merge_exit_code(err: &MergeError) -> u8 {
    match err {
        MergeError::ConfigParse(_) | MergeError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        MergeError::InvalidInput { .. } => EXIT_INVALID_INPUT,
        MergeError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_INVALID_CONFIG, EXIT_INVALID_INPUT, EXIT_IO];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn engine_errors_map_to_codes() {
        assert_eq!(merge_exit_code(&MergeError::ConfigParse("x".into())), EXIT_INVALID_CONFIG);
        assert_eq!(
            merge_exit_code(&MergeError::InvalidInput { index: Some(0), reason: "x".into() }),
            EXIT_INVALID_INPUT
        );
        assert_eq!(merge_exit_code(&MergeError::Io("x".into())), EXIT_IO);
    }
}
