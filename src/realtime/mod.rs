//! Realtime collaborative document model.
//!
//! A shared document with a root map of collaborative strings and lists, typed
//! change events, local undo/redo, and Automerge-based sync between replicas.

pub(crate) mod diff;
pub mod document;
pub mod event;
pub mod list;
pub mod map;
pub mod model;
pub mod string;
pub(crate) mod undo;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use document::Document;
pub use event::{
    Event, EventTarget, EventType, ListenerId, TextDeletedEvent, TextInsertedEvent,
    UndoRedoStateChangedEvent, ValueChangedEvent, ValuesAddedEvent, ValuesRemovedEvent,
    ValuesSetEvent,
};
pub use list::{CollaborativeList, ListValue};
pub use map::{CollaborativeMap, CollaborativeObject};
pub use model::{DetachedValue, Model};
pub use string::CollaborativeString;

#[cfg(feature = "wasm")]
pub use wasm::JsRealtimeDocument;
