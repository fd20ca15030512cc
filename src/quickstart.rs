//! The quickstart: a greeting string and a boolean list wired to a page.
//!
//! [`initialize_model`] runs once when a document is created.
//! [`on_file_loaded`] runs every time a document is loaded, new or reopened.

use std::rc::Rc;

use automerge::ObjId;
use autosurgeon::{hydrate_prop, Hydrate, HydrateError, ReadDoc, Text};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CollabResult;
use crate::realtime::{
    CollaborativeList, CollaborativeString, Document, Event, EventTarget, EventType, ListenerId,
    Model,
};
use crate::ui::{bind_string, Page, TextBinding};

/// Root key of the shared text.
pub const TEXT_KEY: &str = "text";
/// Root key of the shared boolean list.
pub const LIST_KEY: &str = "myList";
/// Initial content of the shared text.
pub const GREETING: &str = "Hello Realtime World!";
/// Initial content of the shared list.
pub const INITIAL_LIST: [bool; 3] = [true, false, true];

pub const EDITOR_1: &str = "editor1";
pub const EDITOR_2: &str = "editor2";
pub const UNDO_BUTTON: &str = "undoButton";
pub const REDO_BUTTON: &str = "redoButton";
pub const TOGGLE_BUTTON: &str = "own_button";
pub const AUTHORIZE_BUTTON: &str = "authorizeButton";

// =============================================================================
// MODEL INITIALIZER
// =============================================================================

/// Seeds a new document's root with the greeting text and the initial list.
pub fn initialize_model(model: &Model) -> CollabResult<()> {
    let root = model.get_root();

    let string = model.create_string(GREETING);
    root.set(TEXT_KEY, string)?;

    let list = model.create_list(INITIAL_LIST);
    root.set(LIST_KEY, list)?;

    info!("Initialized quickstart model");
    Ok(())
}

// =============================================================================
// UI BINDER
// =============================================================================

/// Handles kept alive by a loaded quickstart page.
pub struct QuickstartSession {
    pub text: CollaborativeString,
    pub list: CollaborativeList,
    /// Declarative binding of `editor1`.
    pub binding: TextBinding,
    /// Manually registered model listeners.
    pub listeners: Vec<ListenerId>,
}

/// Wires the page controls to the loaded document.
pub fn on_file_loaded(doc: &Document, page: &Page) -> CollabResult<QuickstartSession> {
    let model = doc.get_model();
    let mut listeners = Vec::new();

    // editor1 is kept in sync by a string binder.
    let string = model.get_root().get_string(TEXT_KEY)?;
    let editor1 = page.text_area(EDITOR_1)?;
    let binding = bind_string(&string, &editor1)?;
    editor1.set_disabled(false);

    // editor2 is kept in sync by hand: copy on text events, overwrite on keyup.
    let manual = model.get_root().get_string(TEXT_KEY)?;
    let editor2 = page.text_area(EDITOR_2)?;
    let update_editor2: Rc<dyn Fn()> = {
        let area = editor2.clone();
        let source = manual.clone();
        Rc::new(move || match source.text() {
            Ok(text) => area.set_value(text),
            Err(err) => warn!(%err, "Failed to refresh editor2"),
        })
    };
    for kind in [EventType::TextInserted, EventType::TextDeleted] {
        let update = update_editor2.clone();
        listeners.push(manual.add_event_listener(kind, move |_| update()));
    }
    {
        let area = editor2.clone();
        let target = manual.clone();
        editor2.set_onkeyup(move || {
            if let Err(err) = target.set_text(&area.value()) {
                warn!(%err, "Failed to write editor2");
            }
        });
    }
    update_editor2();
    editor2.set_disabled(false);

    // Undo and redo buttons follow the model's undo state.
    let undo_button = page.button(UNDO_BUTTON)?;
    let redo_button = page.button(REDO_BUTTON)?;
    {
        let model = model.clone();
        undo_button.set_onclick(move || {
            if let Err(err) = model.undo() {
                warn!(%err, "Undo failed");
            }
        });
    }
    {
        let model = model.clone();
        redo_button.set_onclick(move || {
            if let Err(err) = model.redo() {
                warn!(%err, "Redo failed");
            }
        });
    }
    let apply_undo_state = {
        let undo_button = undo_button.clone();
        let redo_button = redo_button.clone();
        move |can_undo: bool, can_redo: bool| {
            undo_button.set_disabled(!can_undo);
            redo_button.set_disabled(!can_redo);
        }
    };
    apply_undo_state(model.can_undo(), model.can_redo());
    listeners.push(model.add_event_listener(EventType::UndoRedoStateChanged, move |e| {
        if let Event::UndoRedoStateChanged(ev) = e {
            apply_undo_state(ev.can_undo, ev.can_redo);
        }
    }));

    // The toggle flips myList[0] and disables itself for good on the first ValuesSet.
    let list = model.get_root().get_list(LIST_KEY)?;
    let toggle = page.button(TOGGLE_BUTTON)?;
    {
        let list = list.clone();
        toggle.set_onclick(move || {
            let current = match list.get(0) {
                Ok(value) => value.as_bool().unwrap_or(false),
                Err(err) => {
                    warn!(%err, "Failed to read toggle value");
                    return;
                }
            };
            if let Err(err) = list.set(0, !current) {
                warn!(%err, "Failed to flip toggle value");
            }
        });
    }
    {
        let toggle = toggle.clone();
        listeners.push(list.add_event_listener(EventType::ValuesSet, move |_| {
            toggle.set_disabled(true);
        }));
    }

    info!(id = doc.id(), "Quickstart UI bound");
    Ok(QuickstartSession {
        text: string,
        list,
        binding,
        listeners,
    })
}

// =============================================================================
// ROOT SNAPSHOT
// =============================================================================

/// Hydrated view of the quickstart root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickstartRoot {
    pub text: String,
    #[serde(rename = "myList")]
    pub my_list: Vec<bool>,
}

impl QuickstartRoot {
    /// The root a freshly initialized document holds.
    pub fn initial() -> Self {
        Self {
            text: GREETING.to_string(),
            my_list: INITIAL_LIST.to_vec(),
        }
    }
}

impl Hydrate for QuickstartRoot {
    fn hydrate_map<D: ReadDoc>(doc: &D, obj: &ObjId) -> Result<Self, HydrateError> {
        let text: Text = hydrate_prop(doc, obj, TEXT_KEY)?;
        let my_list: Vec<bool> = hydrate_prop(doc, obj, LIST_KEY)?;
        Ok(Self {
            text: text.as_str().to_string(),
            my_list,
        })
    }
}

/// Reads the quickstart root of a document.
pub fn snapshot(doc: &Document) -> CollabResult<QuickstartRoot> {
    doc.get_model().hydrate_root()
}

// =============================================================================
// TESTS
// =============================================================================
