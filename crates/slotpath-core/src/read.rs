//! Single accessors answer only for exactly one match of the kind; plural
//! ones keep every match of the kind in traversal order.

use std::borrow::Cow;

use tracing::debug;

use crate::resolve::Resolver;
use crate::value::Value;

/// Every value `expr` reaches under `root`, in traversal order. Never creates.
pub fn select<'a>(root: &'a Value, expr: &str) -> Vec<Cow<'a, Value>> {
    let slots = Resolver::reader(root).resolve(expr);
    let found: Vec<_> = slots.iter().filter_map(|s| s.read(root)).collect();
    debug!(expr, matched = found.len(), "select");
    found
}

fn single<T>(root: &Value, expr: &str, pick: impl Fn(&Value) -> Option<T>) -> Option<T> {
    match select(root, expr).as_slice() {
        [only] => pick(&**only),
        _ => None,
    }
}

fn plural<T>(root: &Value, expr: &str, pick: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    select(root, expr).iter().filter_map(|v| pick(&**v)).collect()
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Int(_, n) => Some(*n),
        _ => None,
    }
}

fn as_uint(v: &Value) -> Option<u64> {
    match v {
        Value::Uint(_, n) => Some(*n),
        _ => None,
    }
}

fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Float(_, x) => Some(*x),
        _ => None,
    }
}

fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

pub fn get_bool(root: &Value, expr: &str) -> Option<bool> {
    single(root, expr, as_bool)
}

pub fn get_int(root: &Value, expr: &str) -> Option<i64> {
    single(root, expr, as_int)
}

pub fn get_uint(root: &Value, expr: &str) -> Option<u64> {
    single(root, expr, as_uint)
}

pub fn get_float(root: &Value, expr: &str) -> Option<f64> {
    single(root, expr, as_float)
}

pub fn get_str(root: &Value, expr: &str) -> Option<String> {
    single(root, expr, as_string)
}

pub fn bools(root: &Value, expr: &str) -> Vec<bool> {
    plural(root, expr, as_bool)
}

pub fn ints(root: &Value, expr: &str) -> Vec<i64> {
    plural(root, expr, as_int)
}

pub fn uints(root: &Value, expr: &str) -> Vec<u64> {
    plural(root, expr, as_uint)
}

pub fn floats(root: &Value, expr: &str) -> Vec<f64> {
    plural(root, expr, as_float)
}

pub fn strs(root: &Value, expr: &str) -> Vec<String> {
    plural(root, expr, as_string)
}
