//! Deferred map commits.
//!
//! Writes through a map key never alias the map's storage. The entry (or a
//! zero value when absent) is copied into a cell, traversal and assignment
//! mutate the cell, and `flush` writes every cell back exactly once.

use tracing::trace;

use crate::slot::{Origin, Slot, walk_mut};
use crate::value::{Key, Value};

#[derive(Debug)]
struct Commit {
    container: Slot,
    key: Key,
    cell: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Staging {
    cells: Vec<Value>,
    commits: Vec<Commit>,
}

impl Staging {
    /// Stages `value` for `key` of the map at `container`; returns the cell.
    pub(crate) fn stage(&mut self, container: Slot, key: Key, value: Value) -> usize {
        let cell = self.cells.len();
        self.cells.push(value);
        self.commits.push(Commit {
            container,
            key,
            cell,
        });
        cell
    }

    pub(crate) fn cell(&self, index: usize) -> Option<&Value> {
        self.cells.get(index)
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.cells.get_mut(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.commits.len()
    }

    /// Writes all cells back into their maps, newest first. A commit whose
    /// container lives in a cell is always registered after that cell, so
    /// reverse registration order commits every child before its parent.
    pub(crate) fn flush(mut self, root: &mut Value) {
        while let Some(commit) = self.commits.pop() {
            let value = std::mem::replace(&mut self.cells[commit.cell], Value::Any(None));
            let base = match commit.container.origin {
                Origin::Root => &mut *root,
                Origin::Cell(i) => &mut self.cells[i],
            };
            match walk_mut(base, &commit.container.steps) {
                Some(Value::Map(map)) => map.insert(commit.key, value),
                _ => trace!(key = %commit.key, "staged map no longer reachable"),
            }
        }
    }
}
