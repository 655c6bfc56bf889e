//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success, nothing to do, or deletion cancelled at the prompt
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Policy error - a changed chart's version may not be deleted, or the
/// version pattern is invalid
pub const POLICY_ERROR: i32 = 2;

/// Git error - a git command failed or the pages branch is unusable
pub const GIT_ERROR: i32 = 3;

/// API error - GitHub rejected a request or could not be reached
pub const API_ERROR: i32 = 4;

/// IO error - index file missing or unreadable, local file errors
pub const IO_ERROR: i32 = 5;

/// Partial failure - some releases or tags could not be deleted
pub const PARTIAL_FAILURE: i32 = 6;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// No token available (sysexits.h EX_NOPERM)
pub const AUTH_REQUIRED: i32 = 77;
