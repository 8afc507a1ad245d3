//! Process exit codes.
//!
//! Scripts branch on these, so the values are fixed.

/// Success.
pub const OK: u8 = 0;
/// Failure while running a well-formed request, e.g. an unreadable profile.
pub const RUNTIME_ERROR: u8 = 1;
/// Reserved for bag validation failures.
pub const BAG_INVALID: u8 = 2;
/// Bad or missing input, or a request its profile rejects.
pub const USER_ERROR: u8 = 3;
/// A remote service could not be reached or refused the request.
pub const REQUEST_ERROR: u8 = 4;
/// The requested record does not exist.
pub const ITEM_NOT_FOUND: u8 = 5;
