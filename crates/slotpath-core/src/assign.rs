//! Evaluate-for-write.

use tracing::{debug, trace};

use crate::resolve::Resolver;
use crate::value::{Type, Value};

/// Writes `value` into every settable slot `expr` reaches under `root`,
/// building missing structure on the way, and returns how many slots were
/// written.
///
/// `root` must be a pointer: the pointer itself is never assigned, its
/// target is. Slots whose declared type cannot hold `value` are skipped.
///
/// ```
/// use slotpath_core::{Value, assign, get_int};
///
/// let mut doc = Value::pointer(Value::from(1i64));
/// assert_eq!(assign(&mut doc, "/", 7i64), 1);
/// assert_eq!(get_int(&doc, "/"), Some(7));
/// ```
pub fn assign(root: &mut Value, expr: &str, value: impl Into<Value>) -> usize {
    let want = settle(value.into());
    let mut resolver = Resolver::writer(root);
    let slots = resolver.resolve(expr);

    let mut updated = 0;
    if let Some(want) = &want {
        for slot in slots.iter().filter(|s| s.is_settable()) {
            let Some(target) = resolver.value_mut(slot) else {
                continue;
            };
            if store(target, want) {
                updated += 1;
            } else {
                trace!(have = ?target.kind(), want = ?want.kind(), "incompatible slot skipped");
            }
        }
    }
    resolver.commit();
    debug!(expr, matched = slots.len(), updated, "assign");
    updated
}

/// Strips pointers and `Any` holders; `None` when nothing is held.
fn settle(mut value: Value) -> Option<Value> {
    loop {
        value = match value {
            Value::Ptr { .. } | Value::Any(_) => value.into_pointee()?,
            concrete => return Some(concrete),
        };
    }
}

fn store(target: &mut Value, want: &Value) -> bool {
    if let Value::Any(holder) = target {
        *holder = Some(Box::new(want.clone()));
        return true;
    }
    let ty = target.type_of();
    if ty == want.type_of() {
        *target = want.clone();
        return true;
    }
    match convert(want, &ty) {
        Some(v) => {
            *target = v;
            true
        }
        None => false,
    }
}

/// Numeric conversion with the truncating semantics of `as` casts.
fn convert(value: &Value, ty: &Type) -> Option<Value> {
    let converted = match (value, ty) {
        (Value::Int(_, n), Type::Int(w)) => Value::Int(*w, w.wrap_int(*n)),
        (Value::Int(_, n), Type::Uint(w)) => Value::Uint(*w, w.wrap_uint(*n as u64)),
        (Value::Int(_, n), Type::Float(w)) => Value::Float(*w, w.round(*n as f64)),
        (Value::Uint(_, n), Type::Int(w)) => Value::Int(*w, w.wrap_int(*n as i64)),
        (Value::Uint(_, n), Type::Uint(w)) => Value::Uint(*w, w.wrap_uint(*n)),
        (Value::Uint(_, n), Type::Float(w)) => Value::Float(*w, w.round(*n as f64)),
        (Value::Float(_, x), Type::Int(w)) => Value::Int(*w, w.wrap_int(*x as i64)),
        (Value::Float(_, x), Type::Uint(w)) => Value::Uint(*w, w.wrap_uint(*x as u64)),
        (Value::Float(_, x), Type::Float(w)) => Value::Float(*w, w.round(*x)),
        _ => return None,
    };
    Some(converted)
}
