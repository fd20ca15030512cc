//! Document loader: options, file creation and reopening, and the two hooks.
//!
//! The loader owns the control flow around a document. A newly created document
//! runs the model initializer exactly once and then the file-loaded hook; a
//! reopened document runs only the file-loaded hook.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CollabError, CollabResult};
use crate::quickstart::{self, QuickstartSession, AUTHORIZE_BUTTON};
use crate::realtime::{Document, Model};
use crate::ui::Page;

/// Options passed to [`RealtimeLoader::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeOptions {
    /// Application identifier.
    pub client_id: String,

    /// Id of the button that triggers authorization.
    pub auth_button_element_id: String,

    /// Create a new document right after authorization.
    #[serde(default = "default_auto_create")]
    pub auto_create: bool,

    /// Title for auto-created documents.
    #[serde(default = "default_title")]
    pub default_title: String,
}

fn default_auto_create() -> bool {
    true
}

fn default_title() -> String {
    "New Realtime Quickstart File".to_string()
}

impl RealtimeOptions {
    /// Creates options with the default title and auto-create enabled.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            auth_button_element_id: AUTHORIZE_BUTTON.to_string(),
            auto_create: default_auto_create(),
            default_title: default_title(),
        }
    }

    /// Builder: Set the authorize button id.
    pub fn with_auth_button(mut self, id: impl Into<String>) -> Self {
        self.auth_button_element_id = id.into();
        self
    }

    /// Builder: Set auto-create.
    pub fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    /// Builder: Set the default title.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Parses options from JSON (camelCase keys).
    pub fn from_json(json: &str) -> CollabResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks that required fields are present.
    pub fn validate(&self) -> CollabResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(CollabError::invalid_config("clientId must not be empty"));
        }
        if self.auth_button_element_id.trim().is_empty() {
            return Err(CollabError::invalid_config(
                "authButtonElementId must not be empty",
            ));
        }
        Ok(())
    }
}

type InitializeModelHook = Box<dyn Fn(&Model) -> CollabResult<()>>;
type FileLoadedHook<T> = Box<dyn Fn(&Document, &Page) -> CollabResult<T>>;

/// A loaded document together with whatever the file-loaded hook returned.
pub struct LoadedFile<T> {
    pub document: Document,
    pub ui: T,
    /// True if the document was created by this load.
    pub created: bool,
}

/// Creates or reopens documents and runs the hooks.
pub struct RealtimeLoader<T> {
    options: RealtimeOptions,
    initialize_model: InitializeModelHook,
    on_file_loaded: FileLoadedHook<T>,
}

impl<T> RealtimeLoader<T> {
    pub fn new<I, L>(options: RealtimeOptions, initialize_model: I, on_file_loaded: L) -> Self
    where
        I: Fn(&Model) -> CollabResult<()> + 'static,
        L: Fn(&Document, &Page) -> CollabResult<T> + 'static,
    {
        Self {
            options,
            initialize_model: Box::new(initialize_model),
            on_file_loaded: Box::new(on_file_loaded),
        }
    }

    pub fn options(&self) -> &RealtimeOptions {
        &self.options
    }

    /// Validates the options and retires the authorize button.
    pub fn authorize(&self, page: &Page) -> CollabResult<()> {
        self.options.validate()?;
        let auth_button = page.button(&self.options.auth_button_element_id)?;
        auth_button.set_disabled(true);
        info!(client_id = %self.options.client_id, "Realtime loader authorized");
        Ok(())
    }

    /// Authorizes, then with auto-create on creates and loads a document titled
    /// `default_title`.
    pub fn start(&self, page: &Page) -> CollabResult<Option<LoadedFile<T>>> {
        self.authorize(page)?;
        if !self.options.auto_create {
            return Ok(None);
        }
        let title = self.options.default_title.clone();
        self.create_new_file(page, &title).map(Some)
    }

    /// Creates a document, initializes its model, and loads it.
    pub fn create_new_file(&self, page: &Page, title: &str) -> CollabResult<LoadedFile<T>> {
        let document = Document::create(title);
        (self.initialize_model)(document.get_model())?;
        let ui = (self.on_file_loaded)(&document, page)?;
        Ok(LoadedFile {
            document,
            ui,
            created: true,
        })
    }

    /// Reopens a saved document and loads it. The initializer does not run.
    pub fn load_file(
        &self,
        page: &Page,
        id: &str,
        title: &str,
        bytes: &[u8],
    ) -> CollabResult<LoadedFile<T>> {
        let document = Document::open(id, title, bytes)?;
        let ui = (self.on_file_loaded)(&document, page)?;
        Ok(LoadedFile {
            document,
            ui,
            created: false,
        })
    }
}

/// A loader wired to the quickstart hooks.
pub fn quickstart_loader(options: RealtimeOptions) -> RealtimeLoader<QuickstartSession> {
    RealtimeLoader::new(options, quickstart::initialize_model, quickstart::on_file_loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::quickstart::{snapshot, QuickstartRoot, EDITOR_1, GREETING};

    #[test]
    fn test_options_from_json() {
        let options = RealtimeOptions::from_json(
            r#"{"clientId": "app-123", "authButtonElementId": "authorizeButton"}"#,
        )
        .unwrap();
        assert_eq!(options.client_id, "app-123");
        assert!(options.auto_create);
        assert_eq!(options.default_title, "New Realtime Quickstart File");
    }

    #[test]
    fn test_options_validation() {
        assert!(matches!(
            RealtimeOptions::from_json(r#"{"clientId": "", "authButtonElementId": "a"}"#),
            Err(CollabError::InvalidConfig(_))
        ));
        assert!(matches!(
            RealtimeOptions::from_json("{"),
            Err(CollabError::Serialization(_))
        ));
        assert!(RealtimeOptions::new("app").with_auth_button(" ").validate().is_err());
    }

    #[test]
    fn test_start_auto_creates() {
        let page = Page::quickstart();
        let loader = quickstart_loader(RealtimeOptions::new("app"));
        let loaded = loader.start(&page).unwrap().unwrap();

        assert!(loaded.created);
        assert_eq!(loaded.document.title(), "New Realtime Quickstart File");
        assert_eq!(snapshot(&loaded.document).unwrap(), QuickstartRoot::initial());
        assert_eq!(page.text_area(EDITOR_1).unwrap().value(), GREETING);
        assert!(page.button(AUTHORIZE_BUTTON).unwrap().is_disabled());
    }

    #[test]
    fn test_start_without_auto_create() {
        let page = Page::quickstart();
        let loader = quickstart_loader(RealtimeOptions::new("app").with_auto_create(false));
        assert!(loader.start(&page).unwrap().is_none());
    }

    #[test]
    fn test_start_requires_auth_button() {
        let page = Page::new();
        let loader = quickstart_loader(RealtimeOptions::new("app"));
        assert!(matches!(
            loader.start(&page),
            Err(CollabError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_authorize_before_reopen() {
        let saved = Document::create("Saved");
        quickstart::initialize_model(saved.get_model()).unwrap();

        let page = Page::quickstart();
        let loader = quickstart_loader(RealtimeOptions::new("app").with_auto_create(false));
        loader.authorize(&page).unwrap();
        let loaded = loader
            .load_file(&page, saved.id(), "Saved", &saved.save())
            .unwrap();

        assert!(page.button(AUTHORIZE_BUTTON).unwrap().is_disabled());
        assert_eq!(loaded.document.title(), "Saved");
        assert_eq!(page.text_area(EDITOR_1).unwrap().value(), GREETING);
    }

    #[test]
    fn test_initializer_runs_only_on_create() {
        let inits = Rc::new(Cell::new(0));
        let loads = Rc::new(Cell::new(0));
        let (i, l) = (inits.clone(), loads.clone());
        let loader = RealtimeLoader::new(
            RealtimeOptions::new("app"),
            move |model: &Model| {
                i.set(i.get() + 1);
                quickstart::initialize_model(model)
            },
            move |_: &Document, _: &Page| {
                l.set(l.get() + 1);
                Ok(())
            },
        );

        let page = Page::quickstart();
        let created = loader.create_new_file(&page, "Doc").unwrap();
        let reopened = loader
            .load_file(&page, created.document.id(), "Doc", &created.document.save())
            .unwrap();

        assert!(!reopened.created);
        assert_eq!(inits.get(), 1);
        assert_eq!(loads.get(), 2);
        assert_eq!(snapshot(&reopened.document).unwrap().text, GREETING);
    }
}
