//! The collaborative model: an Automerge document plus undo history and listeners.
//!
//! `Model` is a cheap, cloneable handle. All clones share one document. The model
//! is single-threaded: mutations borrow the document, queue events, and deliver
//! them after the borrow is released so listeners may read or write the model.

use std::cell::RefCell;
use std::rc::Rc;

use automerge::{transaction::Transactable, AutoCommit, ChangeHash, ObjId, ObjType, ReadDoc, ROOT};
use autosurgeon::{hydrate, Hydrate};
use tracing::{debug, info};

use crate::error::{CollabError, CollabResult};
use super::diff::Splice;
use super::event::{
    dispatch, Event, EventTarget, EventType, ListenerId, ListenerRegistry, Target,
    TextDeletedEvent, TextInsertedEvent, UndoRedoStateChangedEvent, ValueChangedEvent,
    ValuesAddedEvent, ValuesRemovedEvent, ValuesSetEvent,
};
use super::list::{read_list, ListValue};
use super::map::CollaborativeMap;
use super::undo::{
    anchor_at, cursors_from, live_index, resolve, Remap, UndoManager, UndoRecord, UndoStep,
};

/// Events queued during a mutation.
pub(crate) type PendingEvents = Vec<(Target, Event)>;

/// A collaborative value that is not yet attached to the document.
///
/// Created by [`Model::create_string`] or [`Model::create_list`] and attached
/// with [`CollaborativeMap::set`].
#[derive(Debug, Clone, PartialEq)]
pub enum DetachedValue {
    String(String),
    List(Vec<ListValue>),
}

pub(crate) struct ModelState {
    pub(crate) doc: AutoCommit,
    pub(crate) undo: UndoManager,
    /// Last `(can_undo, can_redo)` announced to listeners.
    undo_state: (bool, bool),
}

/// Handle to a shared collaborative model.
#[derive(Clone)]
pub struct Model {
    state: Rc<RefCell<ModelState>>,
    listeners: Rc<RefCell<ListenerRegistry>>,
}

impl Model {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates an empty model.
    pub fn new() -> Self {
        Self::with_doc(AutoCommit::new())
    }

    /// Creates a model from saved binary data.
    pub fn from_bytes(bytes: &[u8]) -> CollabResult<Self> {
        let doc = AutoCommit::load(bytes)?;
        debug!(bytes = bytes.len(), "Loaded model");
        Ok(Self::with_doc(doc))
    }

    fn with_doc(doc: AutoCommit) -> Self {
        Self {
            state: Rc::new(RefCell::new(ModelState {
                doc,
                undo: UndoManager::new(),
                undo_state: (false, false),
            })),
            listeners: Rc::new(RefCell::new(ListenerRegistry::default())),
        }
    }

    /// Saves the document to binary format.
    pub fn save(&self) -> Vec<u8> {
        self.state.borrow_mut().doc.save()
    }

    /// Returns the current heads (for sync protocol).
    pub fn get_heads(&self) -> Vec<ChangeHash> {
        self.state.borrow_mut().doc.get_heads()
    }

    /// Gets the actor ID for this replica.
    pub fn actor_id(&self) -> String {
        self.state.borrow().doc.get_actor().to_hex_string()
    }

    // =========================================================================
    // OBJECTS
    // =========================================================================

    /// Describes a new collaborative string with the given initial text.
    pub fn create_string(&self, initial: impl Into<String>) -> DetachedValue {
        DetachedValue::String(initial.into())
    }

    /// Describes a new collaborative list with the given initial values.
    pub fn create_list<I, V>(&self, values: I) -> DetachedValue
    where
        I: IntoIterator<Item = V>,
        V: Into<ListValue>,
    {
        DetachedValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Returns the root map of the document.
    pub fn get_root(&self) -> CollaborativeMap {
        CollaborativeMap::new(self.clone(), ROOT)
    }

    /// Hydrates the root map into a Rust struct.
    pub fn hydrate_root<T: Hydrate>(&self) -> CollabResult<T> {
        let state = self.state.borrow();
        Ok(hydrate(&state.doc)?)
    }

    // =========================================================================
    // UNDO / REDO
    // =========================================================================

    /// True if a local change can be undone.
    pub fn can_undo(&self) -> bool {
        self.state.borrow().undo.can_undo()
    }

    /// True if an undone change can be redone.
    pub fn can_redo(&self) -> bool {
        self.state.borrow().undo.can_redo()
    }

    /// Reverts the most recent local undo step. Returns false if there was none.
    ///
    /// Only what the step itself wrote is reverted. Remote changes merged since
    /// then are kept.
    pub fn undo(&self) -> CollabResult<bool> {
        self.mutate(|state, pending| {
            if state.undo.in_compound() {
                return Err(CollabError::compound_operation(
                    "cannot undo inside a compound operation",
                ));
            }
            let Some(step) = state.undo.pop_undo() else {
                return Ok(false);
            };
            match revert_step(&mut state.doc, &step, pending) {
                Ok((inverse, remaps)) => {
                    debug!(records = step.len(), reverted = inverse.len(), "Undo");
                    state.undo.remap(&remaps);
                    if !inverse.is_empty() {
                        state.undo.push_redo(inverse);
                    }
                    Ok(true)
                }
                Err(err) => {
                    state.undo.push_undo(step);
                    Err(err)
                }
            }
        })
    }

    /// Re-applies the most recently undone step. Returns false if there was none.
    pub fn redo(&self) -> CollabResult<bool> {
        self.mutate(|state, pending| {
            if state.undo.in_compound() {
                return Err(CollabError::compound_operation(
                    "cannot redo inside a compound operation",
                ));
            }
            let Some(step) = state.undo.pop_redo() else {
                return Ok(false);
            };
            match revert_step(&mut state.doc, &step, pending) {
                Ok((inverse, remaps)) => {
                    debug!(records = step.len(), reverted = inverse.len(), "Redo");
                    state.undo.remap(&remaps);
                    if !inverse.is_empty() {
                        state.undo.push_undo(inverse);
                    }
                    Ok(true)
                }
                Err(err) => {
                    state.undo.push_redo(step);
                    Err(err)
                }
            }
        })
    }

    /// Starts grouping local changes into a single undo step. May be nested.
    pub fn begin_compound_operation(&self, name: &str) {
        self.state.borrow_mut().undo.begin_compound(name);
    }

    /// Closes the innermost compound operation.
    pub fn end_compound_operation(&self) -> CollabResult<()> {
        self.mutate(|state, _| {
            if let Some(name) = state.undo.end_compound()? {
                debug!(%name, "Compound operation closed");
            }
            Ok(())
        })
    }

    // =========================================================================
    // SYNC OPERATIONS
    // =========================================================================

    /// Merges another replica into this one. Changes arrive as remote events.
    pub fn merge(&self, other: &Model) -> CollabResult<()> {
        if Rc::ptr_eq(&self.state, &other.state) {
            return Ok(());
        }
        let observed = self.listeners.borrow().observed_objects();
        self.mutate(|state, pending| {
            let before = observe(&state.doc, &observed);
            let mut other_state = other.state.borrow_mut();
            let applied = state.doc.merge(&mut other_state.doc)?;
            info!(changes = applied.len(), "Merged remote replica");
            let after = observe(&state.doc, &observed);
            remote_events(&before, &after, pending);
            Ok(())
        })
    }

    /// Generates sync message for incremental sync.
    /// Returns None if there are no changes since their_heads.
    pub fn generate_sync_message(&self, their_heads: &[ChangeHash]) -> Option<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        let changes = state.doc.get_changes(their_heads);
        if changes.is_empty() {
            return None;
        }
        let mut bytes = Vec::new();
        for change in changes {
            bytes.extend_from_slice(change.raw_bytes());
        }
        Some(bytes)
    }

    /// Applies sync message from peer.
    pub fn apply_sync_message(&self, msg: &[u8]) -> CollabResult<()> {
        let observed = self.listeners.borrow().observed_objects();
        self.mutate(|state, pending| {
            let before = observe(&state.doc, &observed);
            let ops = state.doc.load_incremental(msg)?;
            debug!(ops, bytes = msg.len(), "Applied sync message");
            let after = observe(&state.doc, &observed);
            remote_events(&before, &after, pending);
            Ok(())
        })
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    /// Runs a read against the document.
    pub(crate) fn read<R, F>(&self, f: F) -> CollabResult<R>
    where
        F: FnOnce(&AutoCommit) -> CollabResult<R>,
    {
        let state = self.state.borrow();
        f(&state.doc)
    }

    /// Runs a mutation, then announces undo state changes and delivers queued events.
    pub(crate) fn mutate<R, F>(&self, f: F) -> CollabResult<R>
    where
        F: FnOnce(&mut ModelState, &mut PendingEvents) -> CollabResult<R>,
    {
        let mut pending = Vec::new();
        let result = {
            let mut state = self.state.borrow_mut();
            let result = f(&mut *state, &mut pending);
            let current = state.undo.state();
            if current != state.undo_state {
                state.undo_state = current;
                pending.push((
                    Target::Model,
                    Event::UndoRedoStateChanged(UndoRedoStateChangedEvent {
                        can_undo: current.0,
                        can_redo: current.1,
                    }),
                ));
            }
            result
        };
        dispatch(&self.listeners, pending);
        result
    }

    pub(crate) fn listen<F>(&self, target: Target, kind: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
    {
        self.listeners.borrow_mut().add(target, kind, listener)
    }

    pub(crate) fn unlisten(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTarget for Model {
    fn add_event_listener<F>(&self, kind: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
    {
        self.listen(Target::Model, kind, listener)
    }

    fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.unlisten(id)
    }
}

// =============================================================================
// DOCUMENT WRITES
// =============================================================================

/// Overwrites a text object with one splice. Returns the undo record if
/// anything changed.
pub(crate) fn write_text(
    doc: &mut AutoCommit,
    obj: &ObjId,
    target: &str,
    pending: &mut PendingEvents,
) -> CollabResult<Option<UndoRecord>> {
    let before = doc.text(obj)?;
    let old: Vec<char> = before.chars().collect();
    let new: Vec<char> = target.chars().collect();
    let Some(splice) = Splice::between(&old, &new) else {
        return Ok(None);
    };
    let removed_cursors = cursors_from(doc, obj, splice.index, splice.removed.len())?;
    let inserted: String = splice.inserted.iter().collect();
    doc.splice_text(obj, splice.index, splice.removed.len() as isize, &inserted)?;
    text_events(obj, &before, target, true, pending);

    let end = splice.index + splice.inserted.len();
    Ok(Some(UndoRecord::Text {
        obj: obj.clone(),
        inserted: cursors_from(doc, obj, splice.index, splice.inserted.len())?,
        removed: splice.removed.iter().collect(),
        removed_cursors,
        anchor: anchor_at(doc, obj, end)?,
    }))
}

/// Reverts a step as one change and returns its inverse along with the
/// elements it re-created. On error the change is rolled back and no events
/// are queued.
fn revert_step(
    doc: &mut AutoCommit,
    step: &UndoStep,
    pending: &mut PendingEvents,
) -> CollabResult<(UndoStep, Vec<Remap>)> {
    doc.commit();
    let queued = pending.len();
    let mut records = step.clone();
    let mut inverse: UndoStep = Vec::with_capacity(records.len());
    let mut remaps = Vec::new();
    while let Some(record) = records.pop() {
        let mut created = Vec::new();
        match revert_record(doc, &record, &mut created, pending) {
            Ok(Some(record)) => inverse.push(record),
            Ok(None) => {}
            Err(err) => {
                doc.rollback();
                pending.truncate(queued);
                return Err(err);
            }
        }
        if !created.is_empty() {
            records.iter_mut().for_each(|r| r.remap(&created));
            inverse.iter_mut().for_each(|r| r.remap(&created));
            remaps.extend(created);
        }
    }
    doc.commit();
    Ok((inverse, remaps))
}

/// Reverts one record and returns the record that reverts it back. Returns
/// None if nothing the record wrote is still in place.
fn revert_record(
    doc: &mut AutoCommit,
    record: &UndoRecord,
    created: &mut Vec<Remap>,
    pending: &mut PendingEvents,
) -> CollabResult<Option<UndoRecord>> {
    match record {
        UndoRecord::Text {
            obj,
            inserted,
            removed,
            removed_cursors,
            anchor,
        } => {
            let before = doc.text(obj)?;
            let chars: Vec<char> = before.chars().collect();
            let mut live = Vec::with_capacity(inserted.len());
            for cursor in inserted {
                if let Some(index) = live_index(doc, obj, cursor)? {
                    live.push((index, cursor.clone()));
                }
            }
            live.sort_unstable_by_key(|(index, _)| *index);
            if live.is_empty() && removed.is_empty() {
                return Ok(None);
            }

            let deleted: String = live.iter().map(|(index, _)| chars[*index]).collect();
            for (index, _) in live.iter().rev() {
                doc.splice_text(obj, *index, 1, "")?;
            }
            let at = resolve(doc, obj, anchor)?.min(doc.length(obj));
            doc.splice_text(obj, at, 0, removed)?;
            let after = doc.text(obj)?;
            text_events(obj, &before, &after, true, pending);

            let restored = cursors_from(doc, obj, at, removed.chars().count())?;
            created.extend(removed_cursors.iter().cloned().zip(restored.iter().cloned()));
            Ok(Some(UndoRecord::Text {
                obj: obj.clone(),
                inserted: restored,
                removed: deleted,
                removed_cursors: live.into_iter().map(|(_, cursor)| cursor).collect(),
                anchor: anchor.clone(),
            }))
        }
        UndoRecord::ListSet {
            obj,
            slot,
            prev,
            old,
            new,
        } => {
            let Some(index) = live_index(doc, obj, slot)? else {
                return Ok(None);
            };
            doc.put(obj, index, old.to_scalar())?;
            pending.push((
                Target::Object(obj.clone()),
                Event::ValuesSet(ValuesSetEvent {
                    index,
                    old_values: vec![new.clone()],
                    new_values: vec![old.clone()],
                    is_local: true,
                }),
            ));
            let written = doc.get_cursor(obj, index, None)?;
            created.push((prev.clone(), written.clone()));
            Ok(Some(UndoRecord::ListSet {
                obj: obj.clone(),
                slot: written,
                prev: slot.clone(),
                old: new.clone(),
                new: old.clone(),
            }))
        }
        UndoRecord::ListInsert { obj, slot, value } => {
            let Some(index) = live_index(doc, obj, slot)? else {
                return Ok(None);
            };
            doc.delete(obj, index)?;
            pending.push((
                Target::Object(obj.clone()),
                Event::ValuesRemoved(ValuesRemovedEvent {
                    index,
                    values: vec![value.clone()],
                    is_local: true,
                }),
            ));
            Ok(Some(UndoRecord::ListRemove {
                obj: obj.clone(),
                anchor: anchor_at(doc, obj, index)?,
                removed: slot.clone(),
                value: value.clone(),
            }))
        }
        UndoRecord::ListRemove {
            obj,
            anchor,
            removed,
            value,
        } => {
            let index = resolve(doc, obj, anchor)?.min(doc.length(obj));
            doc.insert(obj, index, value.to_scalar())?;
            pending.push((
                Target::Object(obj.clone()),
                Event::ValuesAdded(ValuesAddedEvent {
                    index,
                    values: vec![value.clone()],
                    is_local: true,
                }),
            ));
            let written = doc.get_cursor(obj, index, None)?;
            created.push((removed.clone(), written.clone()));
            Ok(Some(UndoRecord::ListInsert {
                obj: obj.clone(),
                slot: written,
                value: value.clone(),
            }))
        }
    }
}

// =============================================================================
// EVENT DERIVATION
// =============================================================================

pub(crate) fn text_events(
    obj: &ObjId,
    before: &str,
    after: &str,
    is_local: bool,
    pending: &mut PendingEvents,
) {
    let old: Vec<char> = before.chars().collect();
    let new: Vec<char> = after.chars().collect();
    let Some(splice) = Splice::between(&old, &new) else {
        return;
    };
    if !splice.removed.is_empty() {
        pending.push((
            Target::Object(obj.clone()),
            Event::TextDeleted(TextDeletedEvent {
                index: splice.index,
                text: splice.removed.iter().collect(),
                is_local,
            }),
        ));
    }
    if !splice.inserted.is_empty() {
        pending.push((
            Target::Object(obj.clone()),
            Event::TextInserted(TextInsertedEvent {
                index: splice.index,
                text: splice.inserted.iter().collect(),
                is_local,
            }),
        ));
    }
}

pub(crate) fn list_events(
    obj: &ObjId,
    splice: Splice<ListValue>,
    is_local: bool,
    pending: &mut PendingEvents,
) {
    let target = Target::Object(obj.clone());
    if splice.is_in_place() {
        pending.push((
            target,
            Event::ValuesSet(ValuesSetEvent {
                index: splice.index,
                old_values: splice.removed,
                new_values: splice.inserted,
                is_local,
            }),
        ));
        return;
    }
    if !splice.removed.is_empty() {
        pending.push((
            target.clone(),
            Event::ValuesRemoved(ValuesRemovedEvent {
                index: splice.index,
                values: splice.removed,
                is_local,
            }),
        ));
    }
    if !splice.inserted.is_empty() {
        pending.push((
            target,
            Event::ValuesAdded(ValuesAddedEvent {
                index: splice.index,
                values: splice.inserted,
                is_local,
            }),
        ));
    }
}

/// Content of an observed object, captured around a remote change.
#[derive(Debug, Clone, PartialEq)]
enum Observed {
    Text(String),
    List(Vec<ListValue>),
    Map(Vec<(String, String)>),
}

fn observe(doc: &AutoCommit, objects: &[ObjId]) -> Vec<(ObjId, Observed)> {
    objects
        .iter()
        .filter_map(|obj| {
            let content = match doc.object_type(obj).ok()? {
                ObjType::Text => Observed::Text(doc.text(obj).ok()?),
                ObjType::List => Observed::List(read_list(doc, obj).ok()?),
                ObjType::Map | ObjType::Table => Observed::Map(map_entries(doc, obj)),
            };
            Some((obj.clone(), content))
        })
        .collect()
}

/// Map keys with a printable form of their current value, for change detection.
fn map_entries(doc: &AutoCommit, obj: &ObjId) -> Vec<(String, String)> {
    doc.keys(obj)
        .map(|key| {
            let repr = match doc.get(obj, key.as_str()) {
                Ok(Some((value, id))) => format!("{:?}@{:?}", value, id),
                _ => String::new(),
            };
            (key, repr)
        })
        .collect()
}

fn remote_events(
    before: &[(ObjId, Observed)],
    after: &[(ObjId, Observed)],
    pending: &mut PendingEvents,
) {
    for (obj, new) in after {
        let Some((_, old)) = before.iter().find(|(id, _)| id == obj) else {
            continue;
        };
        match (old, new) {
            (Observed::Text(old), Observed::Text(new)) => {
                text_events(obj, old, new, false, pending);
            }
            (Observed::List(old), Observed::List(new)) => {
                if let Some(splice) = Splice::between(old, new) {
                    list_events(obj, splice, false, pending);
                }
            }
            (Observed::Map(old), Observed::Map(new)) => {
                let removed = old
                    .iter()
                    .filter(|(key, _)| !new.iter().any(|(k, _)| k == key));
                let changed = new.iter().filter(|entry| !old.contains(entry));
                for (key, _) in changed.chain(removed) {
                    pending.push((
                        Target::Object(obj.clone()),
                        Event::ValueChanged(ValueChangedEvent {
                            property: key.clone(),
                            is_local: false,
                        }),
                    ));
                }
            }
            _ => {}
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::string::CollaborativeString;

    fn model_with_text(text: &str) -> (Model, CollaborativeString) {
        let model = Model::new();
        let value = model.create_string(text);
        model.get_root().set("text", value).unwrap();
        let string = model.get_root().get_string("text").unwrap();
        (model, string)
    }

    #[test]
    fn test_new_model_has_no_undo() {
        let model = Model::new();
        assert!(!model.can_undo());
        assert!(!model.can_redo());
        assert!(!model.undo().unwrap());
        assert!(!model.redo().unwrap());
    }

    #[test]
    fn test_root_set_is_not_undoable() {
        let (model, string) = model_with_text("Hello");
        assert_eq!(string.text().unwrap(), "Hello");
        assert!(!model.can_undo());
    }

    #[test]
    fn test_undo_redo_text() {
        let (model, string) = model_with_text("Hello");
        string.set_text("Hello World").unwrap();
        assert!(model.can_undo());

        assert!(model.undo().unwrap());
        assert_eq!(string.text().unwrap(), "Hello");
        assert!(model.can_redo());

        assert!(model.redo().unwrap());
        assert_eq!(string.text().unwrap(), "Hello World");
        assert!(!model.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let (model, string) = model_with_text("a");
        string.set_text("ab").unwrap();
        model.undo().unwrap();
        string.set_text("ac").unwrap();
        assert!(!model.can_redo());
    }

    #[test]
    fn test_undo_state_events() {
        let (model, string) = model_with_text("a");
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = states.clone();
        model.add_event_listener(EventType::UndoRedoStateChanged, move |e| {
            if let Event::UndoRedoStateChanged(ev) = e {
                sink.borrow_mut().push((ev.can_undo, ev.can_redo));
            }
        });

        string.set_text("ab").unwrap();
        string.set_text("abc").unwrap();
        model.undo().unwrap();
        model.undo().unwrap();

        assert_eq!(
            *states.borrow(),
            vec![(true, false), (true, true), (false, true)]
        );
    }

    #[test]
    fn test_compound_operation_undoes_in_one_step() {
        let (model, string) = model_with_text("");
        model.begin_compound_operation("typing");
        string.set_text("a").unwrap();
        string.set_text("ab").unwrap();
        model.end_compound_operation().unwrap();

        assert!(model.undo().unwrap());
        assert_eq!(string.text().unwrap(), "");
        assert!(!model.can_undo());
    }

    #[test]
    fn test_undo_inside_compound_fails() {
        let (model, string) = model_with_text("");
        string.set_text("a").unwrap();
        model.begin_compound_operation("typing");
        assert!(model.undo().is_err());
        model.end_compound_operation().unwrap();
        assert!(model.end_compound_operation().is_err());
    }

    #[test]
    fn test_undo_keeps_remote_text_edit() {
        let (model, string) = model_with_text("Hello");
        let peer = Model::from_bytes(&model.save()).unwrap();

        string.set_text("Hello!").unwrap();
        peer.get_root()
            .get_string("text")
            .unwrap()
            .set_text("Oh Hello")
            .unwrap();
        model.merge(&peer).unwrap();
        assert_eq!(string.text().unwrap(), "Oh Hello!");

        assert!(model.undo().unwrap());
        assert_eq!(string.text().unwrap(), "Oh Hello");
        assert!(model.redo().unwrap());
        assert_eq!(string.text().unwrap(), "Oh Hello!");
    }

    #[test]
    fn test_undo_restores_removed_text_around_remote_edit() {
        let (model, string) = model_with_text("Hello World");
        let peer = Model::from_bytes(&model.save()).unwrap();

        string.remove_range(5, 11).unwrap();
        peer.get_root()
            .get_string("text")
            .unwrap()
            .insert_string(0, ">> ")
            .unwrap();
        model.merge(&peer).unwrap();
        assert_eq!(string.text().unwrap(), ">> Hello");

        model.undo().unwrap();
        assert_eq!(string.text().unwrap(), ">> Hello World");
    }

    #[test]
    fn test_undo_skips_text_removed_by_peer() {
        let (model, string) = model_with_text("ab");
        string.set_text("abXY").unwrap();

        let peer = Model::from_bytes(&model.save()).unwrap();
        peer.get_root()
            .get_string("text")
            .unwrap()
            .remove_range(2, 3)
            .unwrap();
        model.merge(&peer).unwrap();
        assert_eq!(string.text().unwrap(), "abY");

        model.undo().unwrap();
        assert_eq!(string.text().unwrap(), "ab");
    }

    #[test]
    fn test_undo_keeps_remote_list_edit() {
        let model = Model::new();
        let value = model.create_list([true, false, true]);
        model.get_root().set("myList", value).unwrap();
        let list = model.get_root().get_list("myList").unwrap();
        let peer = Model::from_bytes(&model.save()).unwrap();

        list.set(0, false).unwrap();
        peer.get_root().get_list("myList").unwrap().set(2, false).unwrap();
        model.merge(&peer).unwrap();
        assert_eq!(list.as_vec().unwrap(), vec![ListValue::Bool(false); 3]);

        model.undo().unwrap();
        assert_eq!(
            list.as_vec().unwrap(),
            vec![
                ListValue::Bool(true),
                ListValue::Bool(false),
                ListValue::Bool(false)
            ]
        );
    }

    #[test]
    fn test_undo_leaves_slot_overwritten_by_peer() {
        let model = Model::new();
        let value = model.create_list([true]);
        model.get_root().set("myList", value).unwrap();
        let list = model.get_root().get_list("myList").unwrap();

        list.set(0, false).unwrap();
        let peer = Model::from_bytes(&model.save()).unwrap();
        peer.get_root().get_list("myList").unwrap().set(0, true).unwrap();
        peer.get_root().get_list("myList").unwrap().set(0, false).unwrap();
        model.merge(&peer).unwrap();

        assert!(model.undo().unwrap());
        assert_eq!(list.get(0).unwrap(), ListValue::Bool(false));
        assert!(!model.can_redo());
    }

    #[test]
    fn test_undo_list_insert_and_remove() {
        let model = Model::new();
        let value = model.create_list([1, 2, 3]);
        model.get_root().set("list", value).unwrap();
        let list = model.get_root().get_list("list").unwrap();

        list.remove(1).unwrap();
        list.push(4).unwrap();
        model.undo().unwrap();
        model.undo().unwrap();
        assert_eq!(list.as_vec().unwrap(), ints(&[1, 2, 3]));

        model.redo().unwrap();
        model.redo().unwrap();
        assert_eq!(list.as_vec().unwrap(), ints(&[1, 3, 4]));
    }

    fn ints(values: &[i64]) -> Vec<ListValue> {
        values.iter().map(|v| ListValue::Int(*v)).collect()
    }

    #[test]
    fn test_undo_through_delete_and_retype() {
        let (model, string) = model_with_text("");
        string.set_text("a").unwrap();
        string.set_text("").unwrap();
        string.set_text("b").unwrap();

        model.undo().unwrap();
        assert_eq!(string.text().unwrap(), "");
        model.undo().unwrap();
        assert_eq!(string.text().unwrap(), "a");
        model.undo().unwrap();
        assert_eq!(string.text().unwrap(), "");
        assert!(!model.can_undo());

        model.redo().unwrap();
        model.redo().unwrap();
        model.redo().unwrap();
        assert_eq!(string.text().unwrap(), "b");
        assert!(!model.can_redo());
    }

    #[test]
    fn test_undo_repeated_sets_on_one_slot() {
        let model = Model::new();
        let value = model.create_list([true]);
        model.get_root().set("myList", value).unwrap();
        let list = model.get_root().get_list("myList").unwrap();

        list.set(0, false).unwrap();
        list.set(0, true).unwrap();
        list.set(0, false).unwrap();
        for expected in [true, false, true] {
            model.undo().unwrap();
            assert_eq!(list.get(0).unwrap(), ListValue::Bool(expected));
        }
        assert!(!model.can_undo());

        for expected in [false, true, false] {
            model.redo().unwrap();
            assert_eq!(list.get(0).unwrap(), ListValue::Bool(expected));
        }
    }

    #[test]
    fn test_failed_undo_rolls_back() {
        let (model, string) = model_with_text("Hello");
        string.set_text("Hello World").unwrap();

        let mut foreign = AutoCommit::new();
        let missing = foreign.put_object(ROOT, "x", ObjType::List).unwrap();
        {
            let mut state = model.state.borrow_mut();
            let mut step = state.undo.pop_undo().unwrap();
            step.insert(
                0,
                UndoRecord::ListRemove {
                    obj: missing,
                    anchor: automerge::Cursor::End,
                    removed: automerge::Cursor::Start,
                    value: ListValue::Bool(true),
                },
            );
            state.undo.push_undo(step);
        }
        let seen = Rc::new(RefCell::new(0));
        let sink = seen.clone();
        string.add_event_listener(EventType::TextDeleted, move |_| *sink.borrow_mut() += 1);

        assert!(model.undo().is_err());
        assert_eq!(string.text().unwrap(), "Hello World");
        assert_eq!(*seen.borrow(), 0);
        assert!(model.can_undo());
        assert!(!model.can_redo());
    }

    #[test]
    fn test_save_and_load() {
        let (model, string) = model_with_text("Hello");
        string.set_text("Hello again").unwrap();

        let loaded = Model::from_bytes(&model.save()).unwrap();
        let text = loaded.get_root().get_string("text").unwrap();
        assert_eq!(text.text().unwrap(), "Hello again");
        assert!(!loaded.can_undo());
    }

    #[test]
    fn test_merge_raises_remote_events() {
        let (model, string) = model_with_text("Hello");
        let peer = Model::from_bytes(&model.save()).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        string.add_event_listener(EventType::TextInserted, move |e| {
            if let Event::TextInserted(ev) = e {
                sink.borrow_mut().push((ev.index, ev.text.clone(), ev.is_local));
            }
        });

        let peer_text = peer.get_root().get_string("text").unwrap();
        peer_text.set_text("Hello, peer").unwrap();
        model.merge(&peer).unwrap();

        assert_eq!(string.text().unwrap(), "Hello, peer");
        assert_eq!(*seen.borrow(), vec![(5, ", peer".to_string(), false)]);
        assert!(!model.can_undo());
    }

    #[test]
    fn test_sync_messages() {
        let (model, _) = model_with_text("Hello");
        let peer = Model::from_bytes(&model.save()).unwrap();
        let heads = peer.get_heads();
        assert!(model.generate_sync_message(&heads).is_none());

        model.get_root().get_string("text").unwrap().set_text("Hello!").unwrap();
        let msg = model.generate_sync_message(&heads).unwrap();
        peer.apply_sync_message(&msg).unwrap();

        let text = peer.get_root().get_string("text").unwrap();
        assert_eq!(text.text().unwrap(), "Hello!");
    }

    #[test]
    fn test_merge_with_self_is_noop() {
        let (model, string) = model_with_text("x");
        model.merge(&model.clone()).unwrap();
        assert_eq!(string.text().unwrap(), "x");
    }
}
