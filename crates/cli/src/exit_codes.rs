//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: the instrument workstation
//! scripts branch on them.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Success                                                    |
//! | 1    | General error (unspecified)                                |
//! | 2    | Usage error (bad arguments, nothing to do)                 |
//! | 3    | Required input missing (table, template, dye mapping)      |
//! | 4    | Plan table unreadable or inconsistent with the layout      |
//! | 5    | Template XML malformed                                     |
//! | 6    | Output could not be written                                |
//! | 7    | Configuration invalid (layout file, dye mapping, record)   |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// An input file named on the command line (or its default) does not exist.
pub const EXIT_INPUT_MISSING: u8 = 3;

/// The plan table could not be read, or a row does not fit the layout
/// (non-numeric step key, unparseable bleach time, unknown sheet).
pub const EXIT_TABLE: u8 = 4;

/// The template is not well-formed XML.
pub const EXIT_TEMPLATE: u8 = 5;

/// Writing the output document (or the run-setting record) failed.
pub const EXIT_WRITE: u8 = 6;

/// A layout file or dye mapping is malformed.
pub const EXIT_CONFIG: u8 = 7;
