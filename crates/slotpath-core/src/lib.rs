//! slotpath-core: path-based selection and mutation over dynamic value graphs
//!
//! A path expression such as `/About["demo"]/Items[*]/Title` addresses zero
//! or more slots in a [`Value`] graph:
//! - `select` and the typed accessors (`get_int`, `strs`, ...) read matches
//! - `assign` writes a value into every reachable slot, creating missing
//!   pointers, sequence elements and map entries along the way
//! - `json` converts graphs to and from JSON documents
//!
//! Failures never raise: malformed expressions, missing structure and type
//! mismatches only shrink the match set. Dropped branches are reported as
//! `tracing` events at `trace` level.
pub mod json;
pub mod literal;
pub mod path;
pub mod value;

mod assign;
mod follow;
mod read;
mod resolve;
mod slot;
mod staging;

pub use assign::assign;
pub use json::{JsonError, JsonOpts, from_json, load_json_file, to_json, write_json_file};
pub use path::{Path, clean};
pub use read::{
    bools, floats, get_bool, get_float, get_int, get_str, get_uint, ints, select, strs, uints,
};
pub use value::{
    FieldDef, FloatWidth, IntWidth, Key, Kind, List, Map, Record, RecordType, Type, Value,
};
