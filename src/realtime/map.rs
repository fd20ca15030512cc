//! Collaborative map. The document root is one.

use automerge::{transaction::Transactable, ObjId, ObjType, ReadDoc, Value};
use tracing::debug;

use crate::error::{CollabError, CollabResult};
use super::event::{Event, EventTarget, EventType, ListenerId, Target, ValueChangedEvent};
use super::list::CollaborativeList;
use super::model::{DetachedValue, Model};
use super::string::CollaborativeString;

/// A collaborative object stored under a map key.
#[derive(Clone)]
pub enum CollaborativeObject {
    String(CollaborativeString),
    List(CollaborativeList),
    Map(CollaborativeMap),
}

impl CollaborativeObject {
    /// Short name of the object kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CollaborativeObject::String(_) => "string",
            CollaborativeObject::List(_) => "list",
            CollaborativeObject::Map(_) => "map",
        }
    }
}

/// Handle to a map in the shared document.
#[derive(Clone)]
pub struct CollaborativeMap {
    model: Model,
    obj: ObjId,
}

impl CollaborativeMap {
    pub(crate) fn new(model: Model, obj: ObjId) -> Self {
        Self { model, obj }
    }

    /// Attaches a new collaborative value under `key`, replacing any previous one.
    ///
    /// Not recorded in the undo history.
    pub fn set(&self, key: &str, value: DetachedValue) -> CollabResult<CollaborativeObject> {
        let obj = self.obj.clone();
        self.model.mutate(|state, pending| {
            let object = match value {
                DetachedValue::String(text) => {
                    let id = state.doc.put_object(&obj, key, ObjType::Text)?;
                    state.doc.update_text(&id, &text)?;
                    CollaborativeObject::String(CollaborativeString::new(self.model.clone(), id))
                }
                DetachedValue::List(values) => {
                    let id = state.doc.put_object(&obj, key, ObjType::List)?;
                    for (index, value) in values.iter().enumerate() {
                        state.doc.insert(&id, index, value.to_scalar())?;
                    }
                    CollaborativeObject::List(CollaborativeList::new(self.model.clone(), id))
                }
            };
            debug!(key, kind = object.kind(), "Attached collaborative object");
            pending.push((
                Target::Object(obj.clone()),
                Event::ValueChanged(ValueChangedEvent {
                    property: key.to_string(),
                    is_local: true,
                }),
            ));
            Ok(object)
        })
    }

    /// The object under `key`, if any. Scalars are a type mismatch.
    pub fn get(&self, key: &str) -> CollabResult<Option<CollaborativeObject>> {
        self.model.read(|doc| match doc.get(&self.obj, key)? {
            None => Ok(None),
            Some((Value::Object(ObjType::Text), id)) => Ok(Some(CollaborativeObject::String(
                CollaborativeString::new(self.model.clone(), id),
            ))),
            Some((Value::Object(ObjType::List), id)) => Ok(Some(CollaborativeObject::List(
                CollaborativeList::new(self.model.clone(), id),
            ))),
            Some((Value::Object(ObjType::Map | ObjType::Table), id)) => Ok(Some(
                CollaborativeObject::Map(CollaborativeMap::new(self.model.clone(), id)),
            )),
            Some((Value::Scalar(s), _)) => Err(CollabError::type_mismatch(
                key,
                "collaborative object",
                format!("{:?}", s),
            )),
        })
    }

    /// The string under `key`.
    pub fn get_string(&self, key: &str) -> CollabResult<CollaborativeString> {
        match self.get(key)? {
            Some(CollaborativeObject::String(s)) => Ok(s),
            Some(other) => Err(CollabError::type_mismatch(key, "string", other.kind())),
            None => Err(CollabError::key_not_found(key)),
        }
    }

    /// The list under `key`.
    pub fn get_list(&self, key: &str) -> CollabResult<CollaborativeList> {
        match self.get(key)? {
            Some(CollaborativeObject::List(l)) => Ok(l),
            Some(other) => Err(CollabError::type_mismatch(key, "list", other.kind())),
            None => Err(CollabError::key_not_found(key)),
        }
    }

    pub fn has(&self, key: &str) -> CollabResult<bool> {
        self.model.read(|doc| Ok(doc.get(&self.obj, key)?.is_some()))
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> CollabResult<Vec<String>> {
        self.model.read(|doc| Ok(doc.keys(&self.obj).collect()))
    }

    pub fn len(&self) -> CollabResult<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> CollabResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl EventTarget for CollaborativeMap {
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
