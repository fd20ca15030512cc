//! Collaborative list of scalar values.

use automerge::{transaction::Transactable, AutoCommit, ObjId, ReadDoc, ScalarValue, Value};
use serde::{Deserialize, Serialize};

use crate::error::{CollabError, CollabResult};
use super::event::{
    Event, EventTarget, EventType, ListenerId, Target, ValuesAddedEvent, ValuesRemovedEvent,
    ValuesSetEvent,
};
use super::model::Model;
use super::undo::{anchor_at, UndoRecord};

/// A scalar stored in a collaborative list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

impl ListValue {
    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ListValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub(crate) fn to_scalar(&self) -> ScalarValue {
        match self {
            ListValue::Bool(b) => ScalarValue::Boolean(*b),
            ListValue::Int(i) => ScalarValue::Int(*i),
            ListValue::Float(f) => ScalarValue::F64(*f),
            ListValue::Str(s) => ScalarValue::Str(s.as_str().into()),
            ListValue::Null => ScalarValue::Null,
        }
    }

    pub(crate) fn from_scalar(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Boolean(b) => ListValue::Bool(*b),
            ScalarValue::Int(i) => ListValue::Int(*i),
            ScalarValue::Uint(u) => ListValue::Int(*u as i64),
            ScalarValue::F64(f) => ListValue::Float(*f),
            ScalarValue::Str(s) => ListValue::Str(s.to_string()),
            ScalarValue::Timestamp(t) => ListValue::Int(*t),
            _ => ListValue::Null,
        }
    }
}

impl From<bool> for ListValue {
    fn from(value: bool) -> Self {
        ListValue::Bool(value)
    }
}

impl From<i64> for ListValue {
    fn from(value: i64) -> Self {
        ListValue::Int(value)
    }
}

impl From<i32> for ListValue {
    fn from(value: i32) -> Self {
        ListValue::Int(value as i64)
    }
}

impl From<f64> for ListValue {
    fn from(value: f64) -> Self {
        ListValue::Float(value)
    }
}

impl From<&str> for ListValue {
    fn from(value: &str) -> Self {
        ListValue::Str(value.to_string())
    }
}

impl From<String> for ListValue {
    fn from(value: String) -> Self {
        ListValue::Str(value)
    }
}

/// Reads every value of a list object. Nested objects read as `Null`.
pub(crate) fn read_list(doc: &AutoCommit, obj: &ObjId) -> CollabResult<Vec<ListValue>> {
    let len = doc.length(obj);
    let mut values = Vec::with_capacity(len);
    for index in 0..len {
        let value = match doc.get(obj, index)? {
            Some((Value::Scalar(s), _)) => ListValue::from_scalar(s.as_ref()),
            _ => ListValue::Null,
        };
        values.push(value);
    }
    Ok(values)
}

/// Handle to a list in the shared document.
#[derive(Clone)]
pub struct CollaborativeList {
    model: Model,
    obj: ObjId,
}

impl CollaborativeList {
    pub(crate) fn new(model: Model, obj: ObjId) -> Self {
        Self { model, obj }
    }

    /// The Automerge object id backing this list.
    pub fn id(&self) -> &ObjId {
        &self.obj
    }

    /// Number of values.
    pub fn len(&self) -> CollabResult<usize> {
        self.model.read(|doc| Ok(doc.length(&self.obj)))
    }

    /// Returns true if the list has no values.
    pub fn is_empty(&self) -> CollabResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All values, in order.
    pub fn as_vec(&self) -> CollabResult<Vec<ListValue>> {
        self.model.read(|doc| read_list(doc, &self.obj))
    }

    /// Value at `index`.
    pub fn get(&self, index: usize) -> CollabResult<ListValue> {
        let values = self.as_vec()?;
        let length = values.len();
        values
            .into_iter()
            .nth(index)
            .ok_or_else(|| CollabError::index_out_of_bounds(index, length))
    }

    /// Overwrites the value at `index`. Always raises `ValuesSet`, even when the
    /// value is unchanged.
    pub fn set(&self, index: usize, value: impl Into<ListValue>) -> CollabResult<()> {
        let value = value.into();
        let obj = self.obj.clone();
        self.model.mutate(|state, pending| {
            let before = read_list(&state.doc, &obj)?;
            let old = before
                .get(index)
                .cloned()
                .ok_or_else(|| CollabError::index_out_of_bounds(index, before.len()))?;
            let prev = state.doc.get_cursor(&obj, index, None)?;
            state.doc.put(&obj, index, value.to_scalar())?;
            if old != value {
                state.undo.record(UndoRecord::ListSet {
                    obj: obj.clone(),
                    slot: state.doc.get_cursor(&obj, index, None)?,
                    prev,
                    old: old.clone(),
                    new: value.clone(),
                });
            }
            pending.push((
                Target::Object(obj.clone()),
                Event::ValuesSet(ValuesSetEvent {
                    index,
                    old_values: vec![old],
                    new_values: vec![value],
                    is_local: true,
                }),
            ));
            Ok(())
        })
    }

    /// Inserts a value at `index`, shifting later values right.
    pub fn insert(&self, index: usize, value: impl Into<ListValue>) -> CollabResult<()> {
        let value = value.into();
        let obj = self.obj.clone();
        self.model.mutate(|state, pending| {
            let before = read_list(&state.doc, &obj)?;
            if index > before.len() {
                return Err(CollabError::index_out_of_bounds(index, before.len()));
            }
            state.doc.insert(&obj, index, value.to_scalar())?;
            state.undo.record(UndoRecord::ListInsert {
                obj: obj.clone(),
                slot: state.doc.get_cursor(&obj, index, None)?,
                value: value.clone(),
            });
            pending.push((
                Target::Object(obj.clone()),
                Event::ValuesAdded(ValuesAddedEvent {
                    index,
                    values: vec![value],
                    is_local: true,
                }),
            ));
            Ok(())
        })
    }

    /// Appends a value.
    pub fn push(&self, value: impl Into<ListValue>) -> CollabResult<()> {
        let len = self.len()?;
        self.insert(len, value)
    }

    /// Removes and returns the value at `index`.
    pub fn remove(&self, index: usize) -> CollabResult<ListValue> {
        let obj = self.obj.clone();
        self.model.mutate(|state, pending| {
            let before = read_list(&state.doc, &obj)?;
            if index >= before.len() {
                return Err(CollabError::index_out_of_bounds(index, before.len()));
            }
            let removed = before[index].clone();
            let cursor = state.doc.get_cursor(&obj, index, None)?;
            state.doc.delete(&obj, index)?;
            state.undo.record(UndoRecord::ListRemove {
                obj: obj.clone(),
                anchor: anchor_at(&state.doc, &obj, index)?,
                removed: cursor,
                value: removed.clone(),
            });
            pending.push((
                Target::Object(obj.clone()),
                Event::ValuesRemoved(ValuesRemovedEvent {
                    index,
                    values: vec![removed.clone()],
                    is_local: true,
                }),
            ));
            Ok(removed)
        })
    }
}

impl EventTarget for CollaborativeList {
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
