use std::sync::Arc;

use tracing::{debug, trace};

use crate::literal;
use crate::path::{FieldSel, KeySel, Op, Path};
use crate::slot::{Access, Origin, Slot, Step, walk, walk_mut};
use crate::staging::Staging;
use crate::value::{Key, Type, Value};

pub(crate) enum Root<'g> {
    Shared(&'g Value),
    Exclusive(&'g mut Value),
}

pub(crate) struct Resolver<'g> {
    root: Root<'g>,
    pub(crate) build: bool,
    pub(crate) staging: Staging,
}

/// What a key selector sees of a slot, detached from the graph borrow.
enum Shape {
    List { len: usize, growable: bool },
    Text { len: usize },
    Map { key_type: Type },
    Other,
}

impl Shape {
    fn of(value: &Value) -> Self {
        match value {
            Value::Seq(l) => Shape::List { len: l.len(), growable: true },
            Value::Array(l) => Shape::List { len: l.len(), growable: false },
            Value::Str(s) => Shape::Text { len: s.len() },
            Value::Map(m) => Shape::Map { key_type: m.key_type().clone() },
            _ => Shape::Other,
        }
    }
}

impl<'g> Resolver<'g> {
    pub(crate) fn reader(root: &'g Value) -> Self {
        Self {
            root: Root::Shared(root),
            build: false,
            staging: Staging::default(),
        }
    }

    pub(crate) fn writer(root: &'g mut Value) -> Self {
        Self {
            root: Root::Exclusive(root),
            build: true,
            staging: Staging::default(),
        }
    }

    pub(crate) fn value(&self, slot: &Slot) -> Option<&Value> {
        let base = match slot.origin {
            Origin::Root => match &self.root {
                Root::Shared(v) => *v,
                Root::Exclusive(v) => &**v,
            },
            Origin::Cell(i) => self.staging.cell(i)?,
        };
        walk(base, &slot.steps)
    }

    pub(crate) fn value_mut(&mut self, slot: &Slot) -> Option<&mut Value> {
        let base = match slot.origin {
            Origin::Root => match &mut self.root {
                Root::Shared(_) => return None,
                Root::Exclusive(v) => &mut **v,
            },
            Origin::Cell(i) => self.staging.cell_mut(i)?,
        };
        walk_mut(base, &slot.steps)
    }

    pub(crate) fn commit(self) {
        if let Root::Exclusive(root) = self.root {
            self.staging.flush(root);
        }
    }

    /// Evaluates `expr` to its final frontier. Malformed expressions, and in
    /// build mode a root that is not a pointer, resolve to nothing.
    pub(crate) fn resolve(&mut self, expr: &str) -> Vec<Slot> {
        let Some(path) = Path::parse(expr) else {
            debug!(expr, "path expression rejected");
            return Vec::new();
        };
        if self.build && !matches!(self.value(&Slot::root()), Some(Value::Ptr { .. })) {
            debug!(expr, "write root is not a pointer");
            return Vec::new();
        }

        let ops = path.ops();
        let mut frontier = Vec::with_capacity(1);
        self.follow_into(Slot::root(), ops.is_empty(), &mut frontier);

        let mut next = Vec::new();
        for (i, op) in ops.iter().enumerate() {
            if frontier.is_empty() {
                break;
            }
            let last = i + 1 == ops.len();
            next.clear();
            match op {
                Op::Field(sel) => self.select_field(sel, &frontier, last, &mut next),
                Op::Key(sel) => self.select_key(sel, &frontier, last, &mut next),
            }
            std::mem::swap(&mut frontier, &mut next);
        }
        trace!(expr, matches = frontier.len(), staged = self.staging.len(), "resolved");
        frontier
    }

    fn select_field(&mut self, sel: &FieldSel, track: &[Slot], last: bool, next: &mut Vec<Slot>) {
        for slot in track {
            let Some(Value::Record(record)) = self.value(slot) else {
                trace!(?sel, "field selection on a non-record dropped");
                continue;
            };
            let ty = Arc::clone(record.record_type());
            match sel {
                FieldSel::Wildcard => {
                    for (i, def) in ty.fields.iter().enumerate() {
                        let child = slot.child(Step::Field(i), slot.access.through_field(def.exported));
                        self.follow_into(child, last, next);
                    }
                }
                FieldSel::Name(name) => match ty.position(name) {
                    Some(i) => {
                        let exported = ty.fields[i].exported;
                        let child = slot.child(Step::Field(i), slot.access.through_field(exported));
                        self.follow_into(child, last, next);
                    }
                    None => trace!(field = %name, record = %ty.name, "no such field"),
                },
            }
        }
    }

    fn select_key(&mut self, sel: &KeySel, track: &[Slot], last: bool, next: &mut Vec<Slot>) {
        for slot in track {
            let Some(shape) = self.value(slot).map(Shape::of) else {
                continue;
            };
            match (sel, shape) {
                (KeySel::Wildcard, Shape::List { len, .. }) => {
                    for i in 0..len {
                        self.follow_into(slot.child(Step::Index(i), slot.access), last, next);
                    }
                }
                (KeySel::Wildcard, Shape::Text { len }) => {
                    next.extend((0..len).map(|i| slot.child(Step::Byte(i), Access::ReadOnly)));
                }
                (KeySel::Wildcard, Shape::Map { .. }) => {
                    let keys: Vec<Key> = match self.value(slot) {
                        Some(Value::Map(m)) => m.keys().cloned().collect(),
                        _ => Vec::new(),
                    };
                    for key in keys {
                        self.enter_entry(slot, key, last, next);
                    }
                }
                (KeySel::Literal(text), Shape::List { len, growable }) => {
                    let Some(i) = literal::parse_index(text) else {
                        trace!(index = %text, "malformed index");
                        continue;
                    };
                    if i >= len {
                        if !(growable && self.build && slot.is_settable()) {
                            trace!(index = i, len, "index out of range");
                            continue;
                        }
                        let Some(want) = i.checked_add(1) else {
                            trace!(index = i, "index past addressable range");
                            continue;
                        };
                        let grown = match self.value_mut(slot) {
                            Some(Value::Seq(list)) => list.grow(want),
                            _ => false,
                        };
                        if !grown {
                            trace!(index = i, len, "sequence cannot grow to index");
                            continue;
                        }
                    }
                    self.follow_into(slot.child(Step::Index(i), slot.access), last, next);
                }
                (KeySel::Literal(text), Shape::Text { len }) => match literal::parse_index(text) {
                    Some(i) if i < len => next.push(slot.child(Step::Byte(i), Access::ReadOnly)),
                    _ => trace!(index = %text, len, "text index rejected"),
                },
                (KeySel::Literal(text), Shape::Map { key_type }) => {
                    match literal::parse_key(text, &key_type) {
                        Some(key) => self.enter_entry(slot, key, last, next),
                        None => trace!(key = %text, ?key_type, "map key literal rejected"),
                    }
                }
                (_, Shape::Other) => trace!(?sel, "key selection on a non-container dropped"),
            }
        }
    }

    /// Selects `key` of the map at `map_slot`. Writable maps in build mode
    /// get a staged entry; otherwise only existing entries are reachable.
    fn enter_entry(&mut self, map_slot: &Slot, key: Key, last: bool, next: &mut Vec<Slot>) {
        if !(self.build && map_slot.is_settable()) {
            self.follow_into(map_slot.child(Step::Key(key), map_slot.access), last, next);
            return;
        }
        let Some(Value::Map(map)) = self.value(map_slot) else {
            return;
        };
        let entry = map.get(&key).cloned().unwrap_or_else(|| map.elem_type().zero());
        let cell = self.staging.stage(map_slot.clone(), key, entry);
        self.follow_into(Slot::cell(cell), last, next);
    }
}
