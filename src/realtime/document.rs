//! A titled, identified document wrapping one model.

use tracing::info;
use uuid::Uuid;

use crate::error::CollabResult;
use super::model::Model;

/// A realtime document: file metadata plus its collaborative model.
#[derive(Clone)]
pub struct Document {
    id: String,
    title: String,
    model: Model,
}

impl Document {
    /// Creates a new, empty document with a random id.
    pub fn create(title: impl Into<String>) -> Self {
        let id = Uuid::new_v4().to_string();
        let title = title.into();
        info!(%id, %title, "Creating document");
        Self {
            id,
            title,
            model: Model::new(),
        }
    }

    /// Reopens a document from saved bytes.
    pub fn open(id: impl Into<String>, title: impl Into<String>, bytes: &[u8]) -> CollabResult<Self> {
        let id = id.into();
        let model = Model::from_bytes(bytes)?;
        info!(%id, bytes = bytes.len(), "Opened document");
        Ok(Self {
            id,
            title: title.into(),
            model,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The collaborative model of this document.
    pub fn get_model(&self) -> &Model {
        &self.model
    }

    /// Saves the model to binary format.
    pub fn save(&self) -> Vec<u8> {
        self.model.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_uuid() {
        let a = Document::create("A");
        let b = Document::create("B");
        assert_eq!(a.id().len(), 36);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.title(), "A");
    }

    #[test]
    fn test_open_roundtrip() {
        let doc = Document::create("Notes");
        let model = doc.get_model();
        model
            .get_root()
            .set("text", model.create_string("saved"))
            .unwrap();

        let reopened = Document::open(doc.id(), doc.title(), &doc.save()).unwrap();
        assert_eq!(reopened.id(), doc.id());
        let text = reopened.get_model().get_root().get_string("text").unwrap();
        assert_eq!(text.text().unwrap(), "saved");
    }

    #[test]
    fn test_open_rejects_garbage() {
        assert!(Document::open("x", "x", b"not an automerge document").is_err());
    }
}
