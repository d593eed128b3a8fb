//! Snapshot-based undo/redo history.
//!
//! Every entry is a full copy of the document taken after a change, together
//! with the viewport and the structural path of the selected node. The cursor
//! points at the entry that matches the live scene.

use std::collections::VecDeque;
use std::fmt;

use crate::model::{Document, NodePath};
use crate::viewport::Viewport;

/// Label of a history commit. Consecutive commits with equal labels coalesce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Load,
    CreateNode,
    DeleteNode,
    EditText,
    EditGeometry,
    EditBaseline,
    MoveNode,
    Reparent,
    EditProperty,
    Protect,
    EditGroup,
    TableStructure,
    TableGrid,
    Other(String),
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Load => "load",
            Self::CreateNode => "create node",
            Self::DeleteNode => "delete node",
            Self::EditText => "edit text",
            Self::EditGeometry => "edit geometry",
            Self::EditBaseline => "edit baseline",
            Self::MoveNode => "move node",
            Self::Reparent => "reparent",
            Self::EditProperty => "edit property",
            Self::Protect => "protect",
            Self::EditGroup => "edit group",
            Self::TableStructure => "table structure",
            Self::TableGrid => "table grid",
            Self::Other(label) => label,
        };
        f.write_str(label)
    }
}

/// Immutable scene snapshot.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub document: Document,
    pub viewport: Viewport,
    pub selected: Option<NodePath>,
    pub change: ChangeType,
    serial: u64,
}

impl HistoryEntry {
    /// Unique stamp of this snapshot; a coalesced overwrite gets a new one.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Bounded ring buffer of snapshots.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    capacity: usize,
    next_serial: u64,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            cursor: 0,
            capacity: capacity.max(1),
            next_serial: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry matching the live scene.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    fn stamp(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Drops every entry and starts over from `document`.
    pub fn reset(&mut self, document: Document, viewport: Viewport, selected: Option<NodePath>) -> u64 {
        self.entries.clear();
        self.cursor = 0;
        let serial = self.stamp();
        self.entries.push_back(HistoryEntry {
            document,
            viewport,
            selected,
            change: ChangeType::Load,
            serial,
        });
        serial
    }

    /// Records the state after a change and returns its serial.
    ///
    /// Entries after the cursor are discarded first. When the entry under the
    /// cursor then carries the same label, it is overwritten instead of
    /// appending, also right after an undo.
    pub fn commit(
        &mut self,
        document: Document,
        viewport: Viewport,
        selected: Option<NodePath>,
        change: ChangeType,
    ) -> u64 {
        let serial = self.stamp();
        let entry = HistoryEntry {
            document,
            viewport,
            selected,
            change,
            serial,
        };

        if self.entries.is_empty() {
            self.entries.push_back(entry);
            self.cursor = 0;
            return serial;
        }

        if self.cursor + 1 < self.entries.len() {
            tracing::trace!(dropped = self.entries.len() - self.cursor - 1, "truncating redo entries");
            self.entries.truncate(self.cursor + 1);
        }

        if self.entries[self.cursor].change == entry.change {
            tracing::trace!(change = %entry.change, "coalescing history entry");
            self.entries[self.cursor] = entry;
            return serial;
        }

        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        serial
    }

    /// Steps back one entry; `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Steps forward one entry; `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}
