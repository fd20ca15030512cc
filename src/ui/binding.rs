//! Two-way binding between a collaborative string and a text area.

use tracing::{debug, warn};

use crate::error::{CollabError, CollabResult};
use crate::realtime::{CollaborativeString, EventTarget, EventType, ListenerId};
use super::element::{HandlerId, TextArea};

/// A live binding. Dropping it keeps the binding; call [`TextBinding::unbind`]
/// to detach.
pub struct TextBinding {
    string: CollaborativeString,
    area: TextArea,
    model_listeners: Vec<ListenerId>,
    input_listener: HandlerId,
}

/// Keeps `area` and `string` in sync in both directions.
///
/// The area shows the current value immediately. User edits overwrite the
/// string; text events from local or remote changes refresh the area.
pub fn bind_string(string: &CollaborativeString, area: &TextArea) -> CollabResult<TextBinding> {
    let initial = string.text()?;
    if !area.mark_bound() {
        return Err(CollabError::already_bound(area.id()));
    }
    area.set_value(initial);

    let mut model_listeners = Vec::with_capacity(2);
    for kind in [EventType::TextInserted, EventType::TextDeleted] {
        let target = area.clone();
        let source = string.clone();
        let id = string.add_event_listener(kind, move |_| match source.text() {
            Ok(text) => target.set_value(text),
            Err(err) => warn!(%err, "Failed to read bound string"),
        });
        model_listeners.push(id);
    }

    let source = string.clone();
    let input_listener = area.add_input_listener(move |value| {
        if let Err(err) = source.set_text(value) {
            warn!(%err, "Failed to write bound string");
        }
    });

    debug!(element = %area.id(), "Bound string to text area");
    Ok(TextBinding {
        string: string.clone(),
        area: area.clone(),
        model_listeners,
        input_listener,
    })
}

impl TextBinding {
    /// Id of the bound text area.
    pub fn element_id(&self) -> String {
        self.area.id()
    }

    /// Removes both directions of the binding.
    pub fn unbind(self) {
        for id in &self.model_listeners {
            self.string.remove_event_listener(*id);
        }
        self.area.remove_input_listener(self.input_listener);
        self.area.clear_bound();
        debug!(element = %self.area.id(), "Unbound text area");
    }
}
