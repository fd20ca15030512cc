//! Collaborative string backed by an Automerge text object.

use automerge::{ObjId, ReadDoc};

use crate::error::{CollabError, CollabResult};
use super::event::{Event, EventTarget, EventType, ListenerId, Target};
use super::model::{write_text, Model};

/// Handle to a text object in the shared document.
///
/// Indices are counted in chars. Every local edit raises at most one
/// `TextDeleted` followed by at most one `TextInserted`, describing the
/// smallest change between the old and new value.
#[derive(Clone)]
pub struct CollaborativeString {
    model: Model,
    obj: ObjId,
}

impl CollaborativeString {
    pub(crate) fn new(model: Model, obj: ObjId) -> Self {
        Self { model, obj }
    }

    /// The Automerge object id backing this string.
    pub fn id(&self) -> &ObjId {
        &self.obj
    }

    /// Current value.
    pub fn text(&self) -> CollabResult<String> {
        self.model.read(|doc| Ok(doc.text(&self.obj)?))
    }

    /// Length in chars.
    pub fn len(&self) -> CollabResult<usize> {
        Ok(self.text()?.chars().count())
    }

    pub fn is_empty(&self) -> CollabResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Replaces the whole value.
    pub fn set_text(&self, text: &str) -> CollabResult<()> {
        self.edit(|_| Ok(text.to_string()))
    }

    /// Inserts `text` before the char at `index`.
    pub fn insert_string(&self, index: usize, text: &str) -> CollabResult<()> {
        self.edit(|current| {
            let chars: Vec<char> = current.chars().collect();
            if index > chars.len() {
                return Err(CollabError::index_out_of_bounds(index, chars.len()));
            }
            let mut updated: String = chars[..index].iter().collect();
            updated.push_str(text);
            updated.extend(&chars[index..]);
            Ok(updated)
        })
    }

    /// Removes the chars in `start..end`.
    pub fn remove_range(&self, start: usize, end: usize) -> CollabResult<()> {
        self.edit(|current| {
            let chars: Vec<char> = current.chars().collect();
            if end > chars.len() {
                return Err(CollabError::index_out_of_bounds(end, chars.len()));
            }
            if start > end {
                return Err(CollabError::index_out_of_bounds(start, end));
            }
            Ok(chars[..start].iter().chain(&chars[end..]).collect())
        })
    }

    fn edit<F>(&self, f: F) -> CollabResult<()>
    where
        F: FnOnce(&str) -> CollabResult<String>,
    {
        let obj = self.obj.clone();
        self.model.mutate(|state, pending| {
            let current = state.doc.text(&obj)?;
            let target = f(&current)?;
            if let Some(record) = write_text(&mut state.doc, &obj, &target, pending)? {
                state.undo.record(record);
            }
            Ok(())
        })
    }
}

impl EventTarget for CollaborativeString {
    fn add_event_listener<F>(&self, kind: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
    {
        self.model.listen(Target::Object(self.obj.clone()), kind, listener)
    }

    fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.model.unlisten(id)
    }
}
