//! Headless UI layer: text areas, buttons, a page registry, and the string binder.

pub mod binding;
pub mod element;
pub mod page;

pub use binding::{bind_string, TextBinding};
pub use element::{Button, HandlerId, TextArea};
pub use page::{Element, Page};
