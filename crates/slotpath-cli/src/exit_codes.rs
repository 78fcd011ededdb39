pub const OK: i32 = 0;
/// Unreadable input, malformed JSON or an expression that does not parse.
pub const INVALID: i32 = 1;
pub const NO_MATCH: i32 = 2;
