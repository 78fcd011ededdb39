//! Slots are addresses: an origin plus the steps taken from it.

use std::borrow::Cow;

use crate::value::{IntWidth, Key, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    /// Reached through a pointer; may be assigned.
    Writable,
    /// The bare root value; readable, but nothing links it back to the caller.
    Detached,
    /// Reached through an unexported field, or a text byte.
    ReadOnly,
}

impl Access {
    pub(crate) fn through_field(self, exported: bool) -> Self {
        if exported { self } else { Access::ReadOnly }
    }

    pub(crate) fn through_pointer(self) -> Self {
        match self {
            Access::Detached => Access::Writable,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Root,
    Cell(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    Field(usize),
    Index(usize),
    Key(Key),
    Unwrap,
    /// A byte of text. Always the final step.
    Byte(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) origin: Origin,
    pub(crate) steps: Vec<Step>,
    pub(crate) access: Access,
}

impl Slot {
    pub(crate) fn root() -> Self {
        Self {
            origin: Origin::Root,
            steps: Vec::new(),
            access: Access::Detached,
        }
    }

    pub(crate) fn cell(index: usize) -> Self {
        Self {
            origin: Origin::Cell(index),
            steps: Vec::new(),
            access: Access::Writable,
        }
    }

    pub(crate) fn child(&self, step: Step, access: Access) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self {
            origin: self.origin,
            steps,
            access,
        }
    }

    pub(crate) fn is_settable(&self) -> bool {
        self.access == Access::Writable
    }

    pub(crate) fn is_byte(&self) -> bool {
        matches!(self.steps.last(), Some(Step::Byte(_)))
    }

    /// Resolves a root-origin slot for reading. Text bytes come back owned.
    pub(crate) fn read<'a>(&self, root: &'a Value) -> Option<Cow<'a, Value>> {
        if self.origin != Origin::Root {
            return None;
        }
        match self.steps.split_last() {
            Some((Step::Byte(i), head)) => {
                let Value::Str(text) = walk(root, head)? else {
                    return None;
                };
                let byte = *text.as_bytes().get(*i)?;
                Some(Cow::Owned(Value::Uint(IntWidth::W8, byte as u64)))
            }
            _ => walk(root, &self.steps).map(Cow::Borrowed),
        }
    }
}

pub(crate) fn walk<'v>(mut cur: &'v Value, steps: &[Step]) -> Option<&'v Value> {
    for step in steps {
        cur = match (step, cur) {
            (Step::Field(i), Value::Record(r)) => r.values().get(*i)?,
            (Step::Index(i), Value::Seq(l) | Value::Array(l)) => l.items().get(*i)?,
            (Step::Key(k), Value::Map(m)) => m.get(k)?,
            (Step::Unwrap, Value::Ptr { to: Some(v), .. } | Value::Any(Some(v))) => &**v,
            _ => return None,
        };
    }
    Some(cur)
}

pub(crate) fn walk_mut<'v>(mut cur: &'v mut Value, steps: &[Step]) -> Option<&'v mut Value> {
    for step in steps {
        cur = match cur {
            Value::Record(r) => match step {
                Step::Field(i) => r.values_mut().get_mut(*i)?,
                _ => return None,
            },
            Value::Seq(l) | Value::Array(l) => match step {
                Step::Index(i) => l.items_mut().get_mut(*i)?,
                _ => return None,
            },
            Value::Map(m) => match step {
                Step::Key(k) => m.get_mut(k)?,
                _ => return None,
            },
            Value::Ptr { to: Some(v), .. } | Value::Any(Some(v)) => match step {
                Step::Unwrap => &mut **v,
                _ => return None,
            },
            _ => return None,
        };
    }
    Some(cur)
}
