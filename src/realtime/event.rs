//! Typed events raised by collaborative objects and the model.
//!
//! Every emitter (string, list, map, model) implements [`EventTarget`]. Listeners
//! subscribe to one [`EventType`] and receive the matching [`Event`] variant.

use std::cell::RefCell;
use std::rc::Rc;

use automerge::ObjId;
use tracing::debug;

use super::list::ListValue;

/// Kind of event a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    TextInserted,
    TextDeleted,
    ValuesSet,
    ValuesAdded,
    ValuesRemoved,
    ValueChanged,
    UndoRedoStateChanged,
}

/// Text was inserted into a collaborative string.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInsertedEvent {
    /// Char index of the first inserted char.
    pub index: usize,
    pub text: String,
    pub is_local: bool,
}

/// Text was removed from a collaborative string.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDeletedEvent {
    /// Char index of the first removed char.
    pub index: usize,
    pub text: String,
    pub is_local: bool,
}

/// A run of list values was overwritten in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesSetEvent {
    pub index: usize,
    pub old_values: Vec<ListValue>,
    pub new_values: Vec<ListValue>,
    pub is_local: bool,
}

/// Values were inserted into a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesAddedEvent {
    pub index: usize,
    pub values: Vec<ListValue>,
    pub is_local: bool,
}

/// Values were removed from a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesRemovedEvent {
    pub index: usize,
    pub values: Vec<ListValue>,
    pub is_local: bool,
}

/// A key of a collaborative map was (re)assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChangedEvent {
    pub property: String,
    pub is_local: bool,
}

/// Undo or redo availability changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRedoStateChangedEvent {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// An event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TextInserted(TextInsertedEvent),
    TextDeleted(TextDeletedEvent),
    ValuesSet(ValuesSetEvent),
    ValuesAdded(ValuesAddedEvent),
    ValuesRemoved(ValuesRemovedEvent),
    ValueChanged(ValueChangedEvent),
    UndoRedoStateChanged(UndoRedoStateChangedEvent),
}

impl Event {
    /// Returns the kind of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            Event::TextInserted(_) => EventType::TextInserted,
            Event::TextDeleted(_) => EventType::TextDeleted,
            Event::ValuesSet(_) => EventType::ValuesSet,
            Event::ValuesAdded(_) => EventType::ValuesAdded,
            Event::ValuesRemoved(_) => EventType::ValuesRemoved,
            Event::ValueChanged(_) => EventType::ValueChanged,
            Event::UndoRedoStateChanged(_) => EventType::UndoRedoStateChanged,
        }
    }

    /// Whether the change originated in this replica. Undo state events are always local.
    pub fn is_local(&self) -> bool {
        match self {
            Event::TextInserted(e) => e.is_local,
            Event::TextDeleted(e) => e.is_local,
            Event::ValuesSet(e) => e.is_local,
            Event::ValuesAdded(e) => e.is_local,
            Event::ValuesRemoved(e) => e.is_local,
            Event::ValueChanged(e) => e.is_local,
            Event::UndoRedoStateChanged(_) => true,
        }
    }
}

/// Handle returned by `add_event_listener`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Subscribe/unsubscribe contract shared by every event emitter.
pub trait EventTarget {
    /// Registers `listener` for events of `kind` raised by this target.
    fn add_event_listener<F>(&self, kind: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static;

    /// Removes a listener. Returns false if it was not registered on this model.
    fn remove_event_listener(&self, id: ListenerId) -> bool;
}

type Callback = Rc<RefCell<dyn FnMut(&Event)>>;

/// Which emitter a listener is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Target {
    Model,
    Object(ObjId),
}

struct ListenerEntry {
    id: ListenerId,
    target: Target,
    kind: EventType,
    callback: Callback,
}

/// Listener storage for one model.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    entries: Vec<ListenerEntry>,
}

impl ListenerRegistry {
    pub(crate) fn add<F>(&mut self, target: Target, kind: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(ListenerEntry {
            id,
            target,
            kind,
            callback: Rc::new(RefCell::new(listener)),
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    fn matching(&self, target: &Target, kind: EventType) -> Vec<(ListenerId, Callback)> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && &entry.target == target)
            .map(|entry| (entry.id, entry.callback.clone()))
            .collect()
    }

    /// Objects with at least one listener, in registration order.
    pub(crate) fn observed_objects(&self) -> Vec<ObjId> {
        let mut objects: Vec<ObjId> = Vec::new();
        for entry in &self.entries {
            if let Target::Object(obj) = &entry.target {
                if !objects.contains(obj) {
                    objects.push(obj.clone());
                }
            }
        }
        objects
    }
}

/// Delivers queued events in order.
///
/// The registry is only borrowed while collecting callbacks, so listeners can
/// subscribe, unsubscribe, or mutate the model. A listener that is already on
/// the stack is skipped for nested events.
pub(crate) fn dispatch(registry: &RefCell<ListenerRegistry>, pending: Vec<(Target, Event)>) {
    for (target, event) in pending {
        let callbacks = registry.borrow().matching(&target, event.event_type());
        for (id, callback) in callbacks {
            match callback.try_borrow_mut() {
                Ok(mut listener) => listener(&event),
                Err(_) => debug!(?id, kind = ?event.event_type(), "Skipping re-entrant listener"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inserted(text: &str) -> Event {
        Event::TextInserted(TextInsertedEvent {
            index: 0,
            text: text.to_string(),
            is_local: true,
        })
    }

    #[test]
    fn test_event_type_matches_variant() {
        assert_eq!(inserted("a").event_type(), EventType::TextInserted);
        let undo = Event::UndoRedoStateChanged(UndoRedoStateChangedEvent {
            can_undo: true,
            can_redo: false,
        });
        assert_eq!(undo.event_type(), EventType::UndoRedoStateChanged);
        assert!(undo.is_local());
    }

    #[test]
    fn test_dispatch_filters_by_kind_and_target() {
        let registry = RefCell::new(ListenerRegistry::default());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        registry
            .borrow_mut()
            .add(Target::Model, EventType::TextInserted, move |e| {
                if let Event::TextInserted(ev) = e {
                    sink.borrow_mut().push(ev.text.clone());
                }
            });
        let sink = seen.clone();
        registry
            .borrow_mut()
            .add(Target::Model, EventType::TextDeleted, move |_| {
                sink.borrow_mut().push("deleted".to_string());
            });

        dispatch(&registry, vec![(Target::Model, inserted("hi"))]);
        assert_eq!(*seen.borrow(), vec!["hi".to_string()]);
    }

    #[test]
    fn test_remove_listener() {
        let registry = RefCell::new(ListenerRegistry::default());
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = registry
            .borrow_mut()
            .add(Target::Model, EventType::TextInserted, move |_| {
                *sink.borrow_mut() += 1;
            });

        dispatch(&registry, vec![(Target::Model, inserted("a"))]);
        assert!(registry.borrow_mut().remove(id));
        assert!(!registry.borrow_mut().remove(id));
        dispatch(&registry, vec![(Target::Model, inserted("b"))]);
        assert_eq!(*count.borrow(), 1);
    }
}
