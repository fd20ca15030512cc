//! QuickCollab - a realtime collaborative quickstart on top of Automerge.
//!
//! A shared document holds a collaborative string and a boolean list. Two text
//! areas show the string, undo/redo buttons follow the model's undo state, and
//! a toggle button flips the first list value:
//!
//! - **Model**: an Automerge document with typed change events and local undo/redo
//! - **Binder**: two-way sync between a collaborative string and a text area
//! - **Loader**: creates or reopens documents and runs the initializer and UI hooks
//!
//! # Example
//!
//! ```rust
//! use quickcollab::{quickstart, Document, Page};
//!
//! // Create a document and seed its root
//! let doc = Document::create("Quickstart");
//! quickstart::initialize_model(doc.get_model()).unwrap();
//!
//! // Wire the controls
//! let page = Page::quickstart();
//! quickstart::on_file_loaded(&doc, &page).unwrap();
//!
//! // User types into the first editor; the second follows
//! page.text_area(quickstart::EDITOR_1).unwrap().type_text("Hi there");
//! assert_eq!(page.text_area(quickstart::EDITOR_2).unwrap().value(), "Hi there");
//!
//! // Save for sync
//! let bytes = doc.save();
//! assert!(!bytes.is_empty());
//! ```

pub mod error;
pub mod loader;
pub mod quickstart;
pub mod realtime;
pub mod ui;

// Re-exports for convenience
pub use error::{CollabError, CollabResult};
pub use loader::{quickstart_loader, LoadedFile, RealtimeLoader, RealtimeOptions};
pub use quickstart::{QuickstartRoot, QuickstartSession};
pub use realtime::{
    CollaborativeList, CollaborativeMap, CollaborativeObject, CollaborativeString, DetachedValue,
    Document, Event, EventTarget, EventType, ListValue, ListenerId, Model,
};
pub use ui::{bind_string, Button, Page, TextArea, TextBinding};

#[cfg(feature = "wasm")]
pub use realtime::JsRealtimeDocument;
