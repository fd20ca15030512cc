//! Element registry, looked up by id.

use std::collections::HashMap;

use crate::error::{CollabError, CollabResult};
use crate::quickstart::{AUTHORIZE_BUTTON, EDITOR_1, EDITOR_2, REDO_BUTTON, TOGGLE_BUTTON, UNDO_BUTTON};
use super::element::{Button, TextArea};

/// A control registered on a page.
#[derive(Clone)]
pub enum Element {
    TextArea(TextArea),
    Button(Button),
}

/// The set of controls the binder can look up.
#[derive(Clone, Default)]
pub struct Page {
    elements: HashMap<String, Element>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// The quickstart layout. Editors and undo/redo start disabled; the
    /// toggle and authorize buttons start enabled.
    pub fn quickstart() -> Self {
        let mut page = Self::new();
        page.add_text_area(TextArea::new(EDITOR_1).with_disabled(true));
        page.add_text_area(TextArea::new(EDITOR_2).with_disabled(true));
        page.add_button(Button::new(UNDO_BUTTON).with_disabled(true));
        page.add_button(Button::new(REDO_BUTTON).with_disabled(true));
        page.add_button(Button::new(TOGGLE_BUTTON));
        page.add_button(Button::new(AUTHORIZE_BUTTON));
        page
    }

    pub fn add_text_area(&mut self, area: TextArea) {
        self.elements.insert(area.id(), Element::TextArea(area));
    }

    pub fn add_button(&mut self, button: Button) {
        self.elements.insert(button.id(), Element::Button(button));
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// The text area registered under `id`.
    pub fn text_area(&self, id: &str) -> CollabResult<TextArea> {
        match self.elements.get(id) {
            Some(Element::TextArea(area)) => Ok(area.clone()),
            Some(Element::Button(_)) => Err(CollabError::type_mismatch(id, "text area", "button")),
            None => Err(CollabError::element_not_found(id)),
        }
    }

    /// The button registered under `id`.
    pub fn button(&self, id: &str) -> CollabResult<Button> {
        match self.elements.get(id) {
            Some(Element::Button(button)) => Ok(button.clone()),
            Some(Element::TextArea(_)) => Err(CollabError::type_mismatch(id, "button", "text area")),
            None => Err(CollabError::element_not_found(id)),
        }
    }
}
