//! Headless UI controls.
//!
//! Controls are shared handles. Programmatic updates (`set_value`,
//! `set_disabled`) never fire handlers; simulated user actions (`type_text`,
//! `click`) do, and are ignored while the control is disabled.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

type InputHandler = Rc<RefCell<dyn FnMut(&str)>>;
type ActionHandler = Rc<RefCell<dyn FnMut()>>;

/// Handle returned by `add_input_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

fn run(handler: &ActionHandler, element: &str) {
    match handler.try_borrow_mut() {
        Ok(mut f) => f(),
        Err(_) => debug!(element, "Skipping re-entrant handler"),
    }
}

// =============================================================================
// TEXT AREA
// =============================================================================

struct TextAreaState {
    id: String,
    value: String,
    disabled: bool,
    bound: bool,
    next_handler: u64,
    input_listeners: Vec<(HandlerId, InputHandler)>,
    onkeyup: Option<ActionHandler>,
}

/// A multi-line text input.
#[derive(Clone)]
pub struct TextArea {
    inner: Rc<RefCell<TextAreaState>>,
}

impl TextArea {
    /// Creates an enabled, empty text area.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TextAreaState {
                id: id.into(),
                value: String::new(),
                disabled: false,
                bound: false,
                next_handler: 0,
                input_listeners: Vec::new(),
                onkeyup: None,
            })),
        }
    }

    /// Builder: Set the initial disabled flag.
    pub fn with_disabled(self, disabled: bool) -> Self {
        self.set_disabled(disabled);
        self
    }

    pub fn id(&self) -> String {
        self.inner.borrow().id.clone()
    }

    pub fn value(&self) -> String {
        self.inner.borrow().value.clone()
    }

    /// Replaces the displayed value without firing any handler.
    pub fn set_value(&self, value: impl Into<String>) {
        self.inner.borrow_mut().value = value.into();
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.borrow().disabled
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.inner.borrow_mut().disabled = disabled;
    }

    /// Subscribes to user edits. The listener receives the new full value.
    pub fn add_input_listener<F>(&self, listener: F) -> HandlerId
    where
        F: FnMut(&str) + 'static,
    {
        let mut state = self.inner.borrow_mut();
        state.next_handler += 1;
        let id = HandlerId(state.next_handler);
        state.input_listeners.push((id, Rc::new(RefCell::new(listener))));
        id
    }

    pub fn remove_input_listener(&self, id: HandlerId) -> bool {
        let mut state = self.inner.borrow_mut();
        let before = state.input_listeners.len();
        state.input_listeners.retain(|(handler, _)| *handler != id);
        state.input_listeners.len() != before
    }

    /// Sets the single keyup handler, replacing any previous one.
    pub fn set_onkeyup<F>(&self, handler: F)
    where
        F: FnMut() + 'static,
    {
        self.inner.borrow_mut().onkeyup = Some(Rc::new(RefCell::new(handler)));
    }

    /// Simulates the user replacing the content: input listeners fire, then keyup.
    /// Returns false if the area is disabled.
    pub fn type_text(&self, value: &str) -> bool {
        let (id, listeners, onkeyup) = {
            let mut state = self.inner.borrow_mut();
            if state.disabled {
                return false;
            }
            state.value = value.to_string();
            let listeners: Vec<InputHandler> = state
                .input_listeners
                .iter()
                .map(|(_, handler)| handler.clone())
                .collect();
            (state.id.clone(), listeners, state.onkeyup.clone())
        };
        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut f) => f(value),
                Err(_) => debug!(element = %id, "Skipping re-entrant input listener"),
            }
        }
        if let Some(handler) = onkeyup {
            run(&handler, &id);
        }
        true
    }

    /// Marks the area as bound. Returns false if it already was.
    pub(crate) fn mark_bound(&self) -> bool {
        let mut state = self.inner.borrow_mut();
        if state.bound {
            return false;
        }
        state.bound = true;
        true
    }

    pub(crate) fn clear_bound(&self) {
        self.inner.borrow_mut().bound = false;
    }
}

// =============================================================================
// BUTTON
// =============================================================================

struct ButtonState {
    id: String,
    disabled: bool,
    onclick: Option<ActionHandler>,
}

/// A push button.
#[derive(Clone)]
pub struct Button {
    inner: Rc<RefCell<ButtonState>>,
}

impl Button {
    /// Creates an enabled button.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ButtonState {
                id: id.into(),
                disabled: false,
                onclick: None,
            })),
        }
    }

    /// Builder: Set the initial disabled flag.
    pub fn with_disabled(self, disabled: bool) -> Self {
        self.set_disabled(disabled);
        self
    }

    pub fn id(&self) -> String {
        self.inner.borrow().id.clone()
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.borrow().disabled
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.inner.borrow_mut().disabled = disabled;
    }

    /// Sets the click handler, replacing any previous one.
    pub fn set_onclick<F>(&self, handler: F)
    where
        F: FnMut() + 'static,
    {
        self.inner.borrow_mut().onclick = Some(Rc::new(RefCell::new(handler)));
    }

    /// Simulates a click. Returns false if the button is disabled.
    pub fn click(&self) -> bool {
        let (id, handler) = {
            let state = self.inner.borrow();
            if state.disabled {
                return false;
            }
            (state.id.clone(), state.onclick.clone())
        };
        if let Some(handler) = handler {
            run(&handler, &id);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_text_fires_input_then_keyup() {
        let area = TextArea::new("editor");
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = log.clone();
        area.add_input_listener(move |value| sink.borrow_mut().push(format!("input:{value}")));
        let sink = log.clone();
        let reader = area.clone();
        area.set_onkeyup(move || sink.borrow_mut().push(format!("keyup:{}", reader.value())));

        assert!(area.type_text("abc"));
        assert_eq!(*log.borrow(), vec!["input:abc".to_string(), "keyup:abc".to_string()]);
    }

    #[test]
    fn test_disabled_area_ignores_typing() {
        let area = TextArea::new("editor").with_disabled(true);
        assert!(!area.type_text("abc"));
        assert_eq!(area.value(), "");
    }

    #[test]
    fn test_set_value_is_silent() {
        let area = TextArea::new("editor");
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = area.add_input_listener(move |_| *sink.borrow_mut() += 1);
        area.set_value("quiet");
        assert_eq!(*count.borrow(), 0);
        assert!(area.remove_input_listener(id));
        assert!(!area.remove_input_listener(id));
    }

    #[test]
    fn test_button_click() {
        let button = Button::new("b");
        let clicks = Rc::new(RefCell::new(0));
        let sink = clicks.clone();
        button.set_onclick(move || *sink.borrow_mut() += 1);

        assert!(button.click());
        button.set_disabled(true);
        assert!(!button.click());
        assert_eq!(*clicks.borrow(), 1);
    }

    #[test]
    fn test_handler_may_disable_its_button() {
        let button = Button::new("once");
        let target = button.clone();
        button.set_onclick(move || target.set_disabled(true));
        assert!(button.click());
        assert!(button.is_disabled());
    }
}
