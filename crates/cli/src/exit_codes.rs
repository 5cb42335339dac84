//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `matplan` exit codes.
//! Scripts rely on them, so codes are never renumbered.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args; clap also exits with 2)       |
//! | 3    | Config file cannot be parsed or fails validation     |
//! | 4    | Input table or model file cannot be read             |
//! | 5    | Too few C-checks with consumption to train           |
//! | 6    | Model file is not a valid saved predictor            |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config parse or validation error.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A file could not be read, has the wrong table kind or misses columns,
/// or a table the command needs is not configured.
pub const EXIT_LOAD: u8 = 4;

/// Training refused: fewer rows than `min_training_samples`.
pub const EXIT_INSUFFICIENT_DATA: u8 = 5;

/// Saved model is malformed, from another format version, or has a
/// different feature layout.
pub const EXIT_MODEL_INVALID: u8 = 6;
