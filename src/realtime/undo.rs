//! Local undo/redo history.
//!
//! Automerge keeps no undo log of its own, so each local edit records its
//! inverse: which elements it wrote and what it replaced. Elements are anchored
//! with Automerge cursors, so a revert touches only what the local edit wrote
//! even after remote changes have shifted or removed things around it. Remote
//! changes are never recorded.

use automerge::{AutoCommit, Cursor, ObjId, ReadDoc};

use crate::error::{CollabError, CollabResult};
use super::list::ListValue;

/// One local edit to a single object.
///
/// Cursors are taken right after the edit is written. An element still belongs
/// to the edit while the cursor at its current position equals the stored one.
/// Cursors for what the edit replaced are kept too, so that a revert which
/// re-creates those elements can hand their identity to older records.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UndoRecord {
    /// A text splice: the chars it inserted, and the chars it removed to be
    /// restored before `anchor`.
    Text {
        obj: ObjId,
        inserted: Vec<Cursor>,
        removed: String,
        removed_cursors: Vec<Cursor>,
        anchor: Cursor,
    },
    /// A list slot overwritten from `old` to `new`. `prev` is the write that
    /// held `old`.
    ListSet {
        obj: ObjId,
        slot: Cursor,
        prev: Cursor,
        old: ListValue,
        new: ListValue,
    },
    /// A list value inserted at `slot`.
    ListInsert {
        obj: ObjId,
        slot: Cursor,
        value: ListValue,
    },
    /// A list value removed from before `anchor`.
    ListRemove {
        obj: ObjId,
        anchor: Cursor,
        removed: Cursor,
        value: ListValue,
    },
}

/// An element re-created by a revert: `(old cursor, new cursor)`.
pub(crate) type Remap = (Cursor, Cursor);

impl UndoRecord {
    fn cursors_mut(&mut self) -> Vec<&mut Cursor> {
        match self {
            UndoRecord::Text {
                inserted,
                removed_cursors,
                anchor,
                ..
            } => inserted
                .iter_mut()
                .chain(removed_cursors.iter_mut())
                .chain(std::iter::once(anchor))
                .collect(),
            UndoRecord::ListSet { slot, prev, .. } => vec![slot, prev],
            UndoRecord::ListInsert { slot, .. } => vec![slot],
            UndoRecord::ListRemove {
                anchor, removed, ..
            } => vec![anchor, removed],
        }
    }

    /// Points cursors at re-created elements.
    pub(crate) fn remap(&mut self, remaps: &[Remap]) {
        for cursor in self.cursors_mut() {
            if let Some((_, to)) = remaps.iter().find(|(from, _)| from == &*cursor) {
                *cursor = to.clone();
            }
        }
    }
}

/// Cursor for the element at `index`, or the end of the sequence.
pub(crate) fn anchor_at(doc: &AutoCommit, obj: &ObjId, index: usize) -> CollabResult<Cursor> {
    if index >= doc.length(obj) {
        return Ok(Cursor::End);
    }
    Ok(doc.get_cursor(obj, index, None)?)
}

/// Cursors for the `count` elements starting at `index`.
pub(crate) fn cursors_from(
    doc: &AutoCommit,
    obj: &ObjId,
    index: usize,
    count: usize,
) -> CollabResult<Vec<Cursor>> {
    (index..index + count)
        .map(|i| Ok(doc.get_cursor(obj, i, None)?))
        .collect()
}

/// Current index of `cursor`.
pub(crate) fn resolve(doc: &AutoCommit, obj: &ObjId, cursor: &Cursor) -> CollabResult<usize> {
    Ok(doc.get_cursor_position(obj, cursor, None)?)
}

/// Current index of the element `cursor` was taken from, if that element is
/// still visible and nobody has written over it.
pub(crate) fn live_index(
    doc: &AutoCommit,
    obj: &ObjId,
    cursor: &Cursor,
) -> CollabResult<Option<usize>> {
    let index = resolve(doc, obj, cursor)?;
    if index >= doc.length(obj) {
        return Ok(None);
    }
    let current = doc.get_cursor(obj, index, None)?;
    Ok((current == *cursor).then_some(index))
}

/// One user-visible undo step.
pub(crate) type UndoStep = Vec<UndoRecord>;

#[derive(Debug)]
struct CompoundOperation {
    name: String,
    depth: usize,
    records: UndoStep,
}

/// Undo and redo stacks for one model.
#[derive(Debug, Default)]
pub(crate) struct UndoManager {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    compound: Option<CompoundOperation>,
}

impl UndoManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a local edit. Inside a compound operation the record joins the
    /// open step; otherwise it becomes a step of its own.
    pub(crate) fn record(&mut self, record: UndoRecord) {
        match self.compound.as_mut() {
            Some(op) => op.records.push(record),
            None => {
                self.undo_stack.push(vec![record]);
                self.redo_stack.clear();
            }
        }
    }

    pub(crate) fn begin_compound(&mut self, name: &str) {
        match self.compound.as_mut() {
            Some(op) => op.depth += 1,
            None => {
                self.compound = Some(CompoundOperation {
                    name: name.to_string(),
                    depth: 1,
                    records: Vec::new(),
                })
            }
        }
    }

    /// Closes one nesting level. Returns the name of the operation when the
    /// outermost level closes.
    pub(crate) fn end_compound(&mut self) -> CollabResult<Option<String>> {
        let op = self
            .compound
            .as_mut()
            .ok_or_else(|| CollabError::compound_operation("no compound operation in progress"))?;
        op.depth -= 1;
        if op.depth > 0 {
            return Ok(None);
        }
        let Some(op) = self.compound.take() else {
            return Ok(None);
        };
        if !op.records.is_empty() {
            self.undo_stack.push(op.records);
            self.redo_stack.clear();
        }
        Ok(Some(op.name))
    }

    pub(crate) fn in_compound(&self) -> bool {
        self.compound.is_some()
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// `(can_undo, can_redo)`.
    pub(crate) fn state(&self) -> (bool, bool) {
        (self.can_undo(), self.can_redo())
    }

    pub(crate) fn pop_undo(&mut self) -> Option<UndoStep> {
        self.undo_stack.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<UndoStep> {
        self.redo_stack.pop()
    }

    pub(crate) fn push_undo(&mut self, step: UndoStep) {
        self.undo_stack.push(step);
    }

    pub(crate) fn push_redo(&mut self, step: UndoStep) {
        self.redo_stack.push(step);
    }

    /// Applies remaps to every recorded step.
    pub(crate) fn remap(&mut self, remaps: &[Remap]) {
        if remaps.is_empty() {
            return;
        }
        let open = self.compound.iter_mut().flat_map(|op| op.records.iter_mut());
        self.undo_stack
            .iter_mut()
            .chain(self.redo_stack.iter_mut())
            .flatten()
            .chain(open)
            .for_each(|record| record.remap(remaps));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use automerge::{transaction::Transactable, ObjType, ROOT};

    fn text_doc(text: &str) -> (AutoCommit, ObjId) {
        let mut doc = AutoCommit::new();
        let obj = doc.put_object(ROOT, "text", ObjType::Text).unwrap();
        doc.splice_text(&obj, 0, 0, text).unwrap();
        (doc, obj)
    }

    fn text_record(obj: &ObjId) -> UndoRecord {
        UndoRecord::Text {
            obj: obj.clone(),
            inserted: Vec::new(),
            removed: String::new(),
            removed_cursors: Vec::new(),
            anchor: Cursor::End,
        }
    }

    #[test]
    fn test_remap_reaches_both_stacks() {
        let (doc, obj) = text_doc("ab");
        let old = doc.get_cursor(&obj, 0, None).unwrap();
        let new = doc.get_cursor(&obj, 1, None).unwrap();
        let record = UndoRecord::Text {
            obj: obj.clone(),
            inserted: vec![old.clone()],
            removed: String::new(),
            removed_cursors: Vec::new(),
            anchor: Cursor::End,
        };

        let mut undo = UndoManager::new();
        undo.record(record.clone());
        undo.push_redo(vec![record]);
        undo.remap(&[(old, new.clone())]);

        let expected = |step: UndoStep| match &step[0] {
            UndoRecord::Text { inserted, .. } => assert_eq!(inserted, &vec![new.clone()]),
            other => panic!("unexpected record {:?}", other),
        };
        expected(undo.pop_undo().unwrap());
        expected(undo.pop_redo().unwrap());
    }

    #[test]
    fn test_cursor_follows_earlier_insert() {
        let (mut doc, obj) = text_doc("Hello!");
        let cursor = doc.get_cursor(&obj, 5, None).unwrap();
        doc.splice_text(&obj, 0, 0, "Oh ").unwrap();
        assert_eq!(live_index(&doc, &obj, &cursor).unwrap(), Some(8));
    }

    #[test]
    fn test_deleted_element_is_not_live() {
        let (mut doc, obj) = text_doc("abc");
        let cursor = doc.get_cursor(&obj, 1, None).unwrap();
        doc.splice_text(&obj, 1, 1, "").unwrap();
        assert_eq!(live_index(&doc, &obj, &cursor).unwrap(), None);
        assert_eq!(resolve(&doc, &obj, &cursor).unwrap(), 1);
    }

    #[test]
    fn test_overwritten_slot_is_not_live() {
        let mut doc = AutoCommit::new();
        let obj = doc.put_object(ROOT, "list", ObjType::List).unwrap();
        doc.insert(&obj, 0, true).unwrap();
        doc.put(&obj, 0, false).unwrap();
        let slot = doc.get_cursor(&obj, 0, None).unwrap();
        assert_eq!(live_index(&doc, &obj, &slot).unwrap(), Some(0));

        doc.put(&obj, 0, true).unwrap();
        assert_eq!(live_index(&doc, &obj, &slot).unwrap(), None);
    }

    #[test]
    fn test_anchor_past_end() {
        let (doc, obj) = text_doc("ab");
        assert_eq!(anchor_at(&doc, &obj, 2).unwrap(), Cursor::End);
        assert_eq!(cursors_from(&doc, &obj, 0, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_record_clears_redo() {
        let (_, obj) = text_doc("");
        let mut undo = UndoManager::new();
        undo.record(text_record(&obj));
        let step = undo.pop_undo().unwrap();
        undo.push_redo(step);
        assert_eq!(undo.state(), (false, true));

        undo.record(text_record(&obj));
        assert_eq!(undo.state(), (true, false));
    }

    #[test]
    fn test_compound_groups_records() {
        let (_, obj) = text_doc("");
        let mut undo = UndoManager::new();
        undo.begin_compound("typing");
        undo.begin_compound("inner");
        undo.record(text_record(&obj));
        assert_eq!(undo.end_compound().unwrap(), None);
        undo.record(text_record(&obj));
        assert!(!undo.can_undo());
        assert_eq!(undo.end_compound().unwrap(), Some("typing".to_string()));

        let step = undo.pop_undo().unwrap();
        assert_eq!(step.len(), 2);
        assert!(!undo.in_compound());
    }

    #[test]
    fn test_end_without_begin_fails() {
        let mut undo = UndoManager::new();
        assert!(matches!(
            undo.end_compound(),
            Err(CollabError::CompoundOperation(_))
        ));
    }

    #[test]
    fn test_empty_compound_adds_no_step() {
        let mut undo = UndoManager::new();
        undo.begin_compound("noop");
        undo.end_compound().unwrap();
        assert!(!undo.can_undo());
    }
}
