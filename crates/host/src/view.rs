use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use bridge::ScriptInterface;
use common::{BridgeError, BridgeResult};

use crate::engine::{ScriptEngine, TracingDiagnostics};

/// What a container shows in place of page content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// The engine view is shown.
    Content,
    /// The engine view is hidden behind a "no database" notice.
    NoData,
}

/// A surface that can hold the engine view.
pub trait Container: Send + Sync {
    fn add_view(&self);

    fn remove_view(&self);

    fn set_visibility(&self, _visibility: Visibility) {}
}

static SHARED_VIEW: OnceLock<Arc<EngineView>> = OnceLock::new();

/// The one engine instance, moved between containers instead of recreated.
///
/// The view remembers the last container it was placed in, without owning
/// it, so it can detach before being reattached elsewhere.
pub struct EngineView {
    engine: Mutex<Box<dyn ScriptEngine>>,
    last_parent: Mutex<Option<Weak<dyn Container>>>,
}

impl EngineView {
    pub fn new(mut engine: Box<dyn ScriptEngine>) -> Self {
        engine.set_diagnostics(Arc::new(TracingDiagnostics));
        Self {
            engine: Mutex::new(engine),
            last_parent: Mutex::new(None),
        }
    }

    /// The process-wide view, created by `factory` on first call only.
    pub fn init_once<F>(factory: F) -> Arc<EngineView>
    where
        F: FnOnce() -> Box<dyn ScriptEngine>,
    {
        SHARED_VIEW
            .get_or_init(|| {
                tracing::debug!("creating shared engine view");
                Arc::new(EngineView::new(factory()))
            })
            .clone()
    }

    /// The process-wide view, if [`EngineView::init_once`] has run.
    pub fn shared() -> Option<Arc<EngineView>> {
        SHARED_VIEW.get().cloned()
    }

    /// Move the view into `container`, detaching it from the previous one.
    pub fn attach(&self, container: &Arc<dyn Container>) -> BridgeResult<()> {
        let mut last = self
            .last_parent
            .lock()
            .map_err(|_| BridgeError::InvalidState("view parent lock poisoned".into()))?;
        if let Some(previous) = last.take().and_then(|weak| weak.upgrade()) {
            previous.remove_view();
        }
        container.add_view();
        *last = Some(Arc::downgrade(container));
        Ok(())
    }

    /// Whether `container` currently holds the view.
    pub fn is_attached_to(&self, container: &Arc<dyn Container>) -> bool {
        self.last_parent
            .lock()
            .ok()
            .and_then(|last| last.as_ref().and_then(Weak::upgrade))
            .is_some_and(|current| Arc::ptr_eq(&current, container))
    }

    pub fn load(&self, url: &str) -> BridgeResult<()> {
        let mut engine = self.engine()?;
        engine.clear();
        engine.load_url(url)
    }

    pub fn load_inline_content(&self, data: &str, mime_type: &str, encoding: &str) -> BridgeResult<()> {
        let mut engine = self.engine()?;
        engine.clear();
        engine.load_data(data, mime_type, encoding)
    }

    pub fn evaluate(&self, script: &str) -> BridgeResult<()> {
        self.engine()?.evaluate(script)
    }

    pub fn add_interface(&self, name: &str, object: Arc<dyn ScriptInterface>) -> BridgeResult<()> {
        self.engine()?.add_interface(name, object);
        Ok(())
    }

    pub fn remove_interface(&self, name: &str) -> BridgeResult<()> {
        self.engine()?.remove_interface(name);
        Ok(())
    }

    fn engine(&self) -> BridgeResult<MutexGuard<'_, Box<dyn ScriptEngine>>> {
        self.engine
            .lock()
            .map_err(|_| BridgeError::InvalidState("engine lock poisoned".into()))
    }
}

impl std::fmt::Debug for EngineView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineView").finish_non_exhaustive()
    }
}
