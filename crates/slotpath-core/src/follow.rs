//! Indirection handling between selection steps.
//!
//! Every slot entering the frontier is followed through pointers and `Any`
//! holders down to a concrete value. In build mode, null pointers and nil
//! maps at writable slots are allocated so the path can continue.

use tracing::trace;

use crate::resolve::Resolver;
use crate::slot::{Slot, Step};
use crate::value::Value;

enum Action {
    Keep,
    Unwrap,
    Allocate,
    AllocateMap,
    Drop(&'static str),
}

impl Resolver<'_> {
    /// Follows `slot` to its concrete target. `last` marks the final
    /// selection step, where a writable `Any` is itself the target.
    pub(crate) fn follow(&mut self, mut slot: Slot, last: bool) -> Option<Slot> {
        if slot.is_byte() {
            return Some(slot);
        }
        loop {
            let writable = self.build && slot.is_settable();
            let action = match self.value(&slot) {
                None => Action::Drop("unreachable"),
                Some(Value::Ptr { to: Some(_), .. }) => Action::Unwrap,
                Some(Value::Ptr { to: None, .. }) if writable => Action::Allocate,
                Some(Value::Ptr { to: None, .. }) => Action::Drop("null pointer"),
                Some(Value::Any(_)) if writable && last => Action::Keep,
                Some(Value::Any(Some(_))) => Action::Unwrap,
                Some(Value::Any(None)) => Action::Drop("empty any"),
                Some(Value::Map(m)) if writable && m.is_nil() => Action::AllocateMap,
                Some(_) => Action::Keep,
            };
            match action {
                Action::Keep => return Some(slot),
                Action::Drop(reason) => {
                    trace!(reason, steps = slot.steps.len(), "branch dropped");
                    return None;
                }
                Action::AllocateMap => {
                    if let Some(Value::Map(m)) = self.value_mut(&slot) {
                        m.allocate();
                    }
                    return Some(slot);
                }
                Action::Allocate => {
                    if let Some(Value::Ptr { target, to }) = self.value_mut(&slot) {
                        *to = Some(Box::new(target.zero()));
                    }
                    slot = pointer_child(&slot);
                }
                Action::Unwrap => {
                    slot = if matches!(self.value(&slot), Some(Value::Ptr { .. })) {
                        pointer_child(&slot)
                    } else {
                        slot.child(Step::Unwrap, slot.access)
                    };
                }
            }
        }
    }

    pub(crate) fn follow_into(&mut self, slot: Slot, last: bool, next: &mut Vec<Slot>) {
        if let Some(slot) = self.follow(slot, last) {
            next.push(slot);
        }
    }
}

fn pointer_child(slot: &Slot) -> Slot {
    slot.child(Step::Unwrap, slot.access.through_pointer())
}
