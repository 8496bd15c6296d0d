// Undo/redo stacks over stroke-list snapshots
//
// Snapshots share stroke storage: a snapshot is a Vec of Arc<Stroke>, so a
// push clones pointers, not point buffers. External semantics are the classic
// linear-history pair of stacks: recording a new action clears redo.
use crate::ink::stroke::Stroke;
use std::sync::Arc;

pub type Snapshot = Vec<Arc<Stroke>>;

#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state preceding a new action. Invalidates redo history.
    pub fn record(&mut self, before: &Snapshot) {
        self.undo.push(before.clone());
        self.redo.clear();
    }

    /// Drop the most recent record without touching redo. Used when a
    /// pointer-down turns out to commit nothing (tap, eraser pass).
    pub fn discard_record(&mut self) {
        self.undo.pop();
    }

    /// Pop the previous state, stashing `current` for redo. None when empty.
    pub fn undo(&mut self, current: &Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    /// Pop the next state, stashing `current` for undo. None when empty.
    pub fn redo(&mut self, current: &Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push(current.clone());
        Some(next)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
