//! WASM bindings for the quickstart document.
//!
//! This module provides a JavaScript-friendly wrapper around a quickstart
//! document so a browser page can drive the shared text and list directly.

use automerge::ChangeHash;
use js_sys::{Array, Function, Uint8Array};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::error::CollabError;
use crate::quickstart::{self, LIST_KEY, TEXT_KEY};
use super::document::Document;
use super::event::{Event, EventTarget, EventType};

/// Serialize a value to JsValue with maps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<CollabError> for JsValue {
    fn from(err: CollabError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

/// Helper macro for Result conversion
macro_rules! js_result {
    ($expr:expr) => {
        $expr.map_err(|e: CollabError| JsValue::from(e))
    };
}

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around a quickstart document.
#[wasm_bindgen]
pub struct JsRealtimeDocument {
    inner: Document,
}

#[wasm_bindgen]
impl JsRealtimeDocument {
    /// Creates and initializes a new quickstart document.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const doc = new JsRealtimeDocument("New Realtime Quickstart File");
    /// doc.getText(); // "Hello Realtime World!"
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(title: &str) -> Result<JsRealtimeDocument, JsValue> {
        let inner = Document::create(title);
        js_result!(quickstart::initialize_model(inner.get_model()))?;
        Ok(JsRealtimeDocument { inner })
    }

    /// Reopens a document from binary bytes (Uint8Array).
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(id: &str, title: &str, bytes: &[u8]) -> Result<JsRealtimeDocument, JsValue> {
        let inner = js_result!(Document::open(id, title, bytes))?;
        Ok(JsRealtimeDocument { inner })
    }

    /// Saves to binary bytes (returns Uint8Array).
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&self) -> Uint8Array {
        let bytes = self.inner.save();
        Uint8Array::from(&bytes[..])
    }

    /// Document id.
    pub fn id(&self) -> String {
        self.inner.id().to_string()
    }

    /// Gets the actor ID for this replica.
    #[wasm_bindgen(js_name = actorId)]
    pub fn actor_id(&self) -> String {
        self.inner.get_model().actor_id()
    }

    /// Gets the root as `{ text, myList }`.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        let state = js_result!(quickstart::snapshot(&self.inner))?;
        Ok(to_js_value(&state)?)
    }
}

// =============================================================================
// TEXT AND LIST METHODS
// =============================================================================

#[wasm_bindgen]
impl JsRealtimeDocument {
    /// Current value of the shared text.
    #[wasm_bindgen(js_name = getText)]
    pub fn get_text(&self) -> Result<String, JsValue> {
        let string = js_result!(self.inner.get_model().get_root().get_string(TEXT_KEY))?;
        Ok(js_result!(string.text())?)
    }

    /// Overwrites the shared text (e.g. from a textarea keyup handler).
    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&self, text: &str) -> Result<(), JsValue> {
        let string = js_result!(self.inner.get_model().get_root().get_string(TEXT_KEY))?;
        js_result!(string.set_text(text))?;
        Ok(())
    }

    /// Flips `myList[0]` and returns the new value.
    #[wasm_bindgen(js_name = toggleFirst)]
    pub fn toggle_first(&self) -> Result<bool, JsValue> {
        let list = js_result!(self.inner.get_model().get_root().get_list(LIST_KEY))?;
        let current = js_result!(list.get(0))?.as_bool().unwrap_or(false);
        js_result!(list.set(0, !current))?;
        Ok(!current)
    }

    /// Calls `callback(text)` whenever the shared text changes.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// doc.onTextChanged(text => { textArea2.value = text; });
    /// ```
    #[wasm_bindgen(js_name = onTextChanged)]
    pub fn on_text_changed(&self, callback: Function) -> Result<(), JsValue> {
        let string = js_result!(self.inner.get_model().get_root().get_string(TEXT_KEY))?;
        for kind in [EventType::TextInserted, EventType::TextDeleted] {
            let source = string.clone();
            let callback = callback.clone();
            string.add_event_listener(kind, move |_| match source.text() {
                Ok(text) => {
                    if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&text)) {
                        warn!(?err, "onTextChanged callback threw");
                    }
                }
                Err(err) => warn!(%err, "Failed to read shared text"),
            });
        }
        Ok(())
    }

    /// Calls `callback(canUndo, canRedo)` whenever undo availability changes.
    #[wasm_bindgen(js_name = onUndoRedoStateChanged)]
    pub fn on_undo_redo_state_changed(&self, callback: Function) {
        self.inner
            .get_model()
            .add_event_listener(EventType::UndoRedoStateChanged, move |e| {
                if let Event::UndoRedoStateChanged(ev) = e {
                    let result = callback.call2(
                        &JsValue::NULL,
                        &JsValue::from_bool(ev.can_undo),
                        &JsValue::from_bool(ev.can_redo),
                    );
                    if let Err(err) = result {
                        warn!(?err, "onUndoRedoStateChanged callback threw");
                    }
                }
            });
    }

    /// Calls `callback(index, newValues, isLocal)` whenever values in `myList`
    /// are overwritten, locally or by a peer.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// doc.onListValuesSet(() => { ownButton.disabled = true; });
    /// ```
    #[wasm_bindgen(js_name = onListValuesSet)]
    pub fn on_list_values_set(&self, callback: Function) -> Result<(), JsValue> {
        let list = js_result!(self.inner.get_model().get_root().get_list(LIST_KEY))?;
        list.add_event_listener(EventType::ValuesSet, move |e| {
            let Event::ValuesSet(ev) = e else {
                return;
            };
            let values = match to_js_value(&ev.new_values) {
                Ok(values) => values,
                Err(err) => {
                    warn!(%err, "Failed to convert list values");
                    return;
                }
            };
            let result = callback.call3(
                &JsValue::NULL,
                &JsValue::from_f64(ev.index as f64),
                &values,
                &JsValue::from_bool(ev.is_local),
            );
            if let Err(err) = result {
                warn!(?err, "onListValuesSet callback threw");
            }
        });
        Ok(())
    }
}

// =============================================================================
// UNDO / REDO
// =============================================================================

#[wasm_bindgen]
impl JsRealtimeDocument {
    pub fn undo(&self) -> Result<bool, JsValue> {
        Ok(js_result!(self.inner.get_model().undo())?)
    }

    pub fn redo(&self) -> Result<bool, JsValue> {
        Ok(js_result!(self.inner.get_model().redo())?)
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.get_model().can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.get_model().can_redo()
    }
}

// =============================================================================
// SYNC PROTOCOL METHODS
// =============================================================================

#[wasm_bindgen]
impl JsRealtimeDocument {
    /// Gets the current heads as hex strings.
    #[wasm_bindgen(js_name = getHeads)]
    pub fn get_heads(&self) -> Array {
        let array = Array::new();
        for head in self.inner.get_model().get_heads() {
            array.push(&JsValue::from_str(&head.to_string()));
        }
        array
    }

    /// Generates a sync message for changes since their heads.
    ///
    /// Returns a Uint8Array, or null if there are no changes.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const msg = doc.generateSyncMessage(peerHeads);
    /// if (msg) ws.send(msg);
    /// ```
    #[wasm_bindgen(js_name = generateSyncMessage)]
    pub fn generate_sync_message(&self, their_heads: Array) -> Result<JsValue, JsValue> {
        let mut heads = Vec::new();
        for head in their_heads.iter() {
            let hex = head
                .as_string()
                .ok_or_else(|| JsValue::from_str("heads must be strings"))?;
            let hash: ChangeHash = hex
                .parse()
                .map_err(|_| JsValue::from_str(&format!("invalid head: {}", hex)))?;
            heads.push(hash);
        }
        match self.inner.get_model().generate_sync_message(&heads) {
            Some(bytes) => Ok(Uint8Array::from(&bytes[..]).into()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Applies a sync message from a peer.
    #[wasm_bindgen(js_name = applySyncMessage)]
    pub fn apply_sync_message(&self, msg: &[u8]) -> Result<(), JsValue> {
        js_result!(self.inner.get_model().apply_sync_message(msg))?;
        Ok(())
    }
}
