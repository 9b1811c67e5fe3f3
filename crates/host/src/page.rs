use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use bridge::{
    Control, ControlInterface, HandleRegistry, ScriptInterface, TableDataInterface,
    TableViewLauncher,
};
use common::{BridgeError, BridgeResult, Config};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use storage::DataStore;

use crate::ui::UiExecutor;
use crate::view::{Container, EngineView, Visibility};

/// Lifecycle of a hosted page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    Created,
    /// Script interfaces are wired to a live store.
    Bound,
    Unbound,
    Destroyed,
}

/// What a page persists across a save/restore of its host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub file_name: Option<String>,
    /// Responses not yet pulled by the script, oldest first.
    pub response_json: Vec<String>,
}

impl PageSnapshot {
    pub fn to_json(&self) -> BridgeResult<String> {
        serde_json::to_string(self)
            .map_err(|err| BridgeError::InvalidState(format!("cannot encode page snapshot: {err}")))
    }

    pub fn from_json(text: &str) -> BridgeResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| BridgeError::InvalidState(format!("invalid page snapshot: {err}")))
    }
}

/// Responses waiting for the script to pull them, in arrival order.
#[derive(Debug, Default)]
pub struct ResponseQueue {
    items: Mutex<VecDeque<String>>,
}

impl ResponseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(items: Vec<String>) -> Self {
        Self {
            items: Mutex::new(items.into()),
        }
    }

    pub fn push(&self, payload: String) -> BridgeResult<()> {
        self.lock()?.push_back(payload);
        Ok(())
    }

    /// Oldest queued response, or `None` when nothing is pending.
    pub fn pop(&self) -> BridgeResult<Option<String>> {
        Ok(self.lock()?.pop_front())
    }

    pub fn pending(&self) -> BridgeResult<Vec<String>> {
        Ok(self.lock()?.iter().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> BridgeResult<MutexGuard<'_, VecDeque<String>>> {
        self.items
            .lock()
            .map_err(|_| BridgeError::InvalidState("response queue lock poisoned".into()))
    }
}

/// Script view of a page's response queue.
pub struct DataInterface {
    queue: Weak<ResponseQueue>,
}

impl DataInterface {
    pub fn new(queue: &Arc<ResponseQueue>) -> Self {
        Self {
            queue: Arc::downgrade(queue),
        }
    }
}

impl ScriptInterface for DataInterface {
    fn call(&self, method: &str, _args: &[JsonValue]) -> BridgeResult<JsonValue> {
        let queue = self
            .queue
            .upgrade()
            .ok_or_else(|| BridgeError::InvalidState("page was released".into()))?;
        match method {
            "getResponseJSON" => Ok(queue.pop()?.map_or(JsonValue::Null, JsonValue::String)),
            other => Err(BridgeError::Script(format!("data has no method '{other}'"))),
        }
    }
}

/// Notified after a page has handled a change in store availability.
pub trait DatabaseConnectionListener: Send + Sync {
    fn database_available(&self);

    fn database_unavailable(&self);
}

struct PageInner {
    state: PageState,
    file_name: Option<String>,
    store: Option<Arc<dyn DataStore>>,
    /// Strong owner of the router; the script side only holds it weakly.
    control: Option<Arc<Control>>,
    launcher: Option<Arc<dyn TableViewLauncher>>,
    listener: Option<Arc<dyn DatabaseConnectionListener>>,
}

/// A page hosted in the shared engine view, bound to the store while one is
/// available.
pub struct WebPage {
    config: Config,
    view: Arc<EngineView>,
    ui: Arc<dyn UiExecutor>,
    container: Arc<dyn Container>,
    queue: Arc<ResponseQueue>,
    data: Arc<DataInterface>,
    handles: Arc<HandleRegistry>,
    inner: Mutex<PageInner>,
}

impl WebPage {
    /// Create a page inside `container`.
    ///
    /// The file name comes from `saved` if present there, otherwise from
    /// `arg_file_name`. Pending responses in `saved` are queued again in
    /// their original order.
    pub fn create(
        config: Config,
        view: Arc<EngineView>,
        ui: Arc<dyn UiExecutor>,
        container: Arc<dyn Container>,
        saved: Option<PageSnapshot>,
        arg_file_name: Option<String>,
    ) -> BridgeResult<Self> {
        let saved = saved.unwrap_or_default();
        let file_name = saved.file_name.or(arg_file_name);
        let queue = Arc::new(ResponseQueue::restore(saved.response_json));
        view.attach(&container)?;
        tracing::debug!(?file_name, pending = queue.len(), "page created");
        Ok(Self {
            data: Arc::new(DataInterface::new(&queue)),
            config,
            view,
            ui,
            container,
            queue,
            handles: Arc::new(HandleRegistry::new()),
            inner: Mutex::new(PageInner {
                state: PageState::Created,
                file_name,
                store: None,
                control: None,
                launcher: None,
                listener: None,
            }),
        })
    }

    pub fn state(&self) -> PageState {
        self.inner
            .lock()
            .map(|inner| inner.state)
            .unwrap_or(PageState::Destroyed)
    }

    pub fn file_name(&self) -> BridgeResult<Option<String>> {
        Ok(self.live()?.file_name.clone())
    }

    pub fn handles(&self) -> &Arc<HandleRegistry> {
        &self.handles
    }

    /// The router currently exposed to script, if bound.
    pub fn control(&self) -> BridgeResult<Option<Arc<Control>>> {
        Ok(self.live()?.control.clone())
    }

    pub fn register_listener(&self, listener: Arc<dyn DatabaseConnectionListener>) -> BridgeResult<()> {
        self.live()?.listener = Some(listener);
        Ok(())
    }

    /// Launcher handed to every router this page creates from now on.
    pub fn set_table_view_launcher(&self, launcher: Arc<dyn TableViewLauncher>) -> BridgeResult<()> {
        self.live()?.launcher = Some(launcher);
        Ok(())
    }

    /// Move the shared view back into this page's container.
    pub fn attach(&self) -> BridgeResult<()> {
        self.ensure_live()?;
        self.view.attach(&self.container)
    }

    pub fn save_state(&self) -> BridgeResult<PageSnapshot> {
        let file_name = self.live()?.file_name.clone();
        Ok(PageSnapshot {
            file_name,
            response_json: self.queue.pending()?,
        })
    }

    /// Bind the page to `store`.
    ///
    /// A fresh [`Control`] is created on every call; the response queue and
    /// the `data` object are kept. Without a file name nothing is loaded and
    /// the page stays unbound. Returns whether the page is now bound.
    pub fn database_available(&self, store: Arc<dyn DataStore>) -> BridgeResult<bool> {
        let (bound, listener) = {
            let mut inner = self.live()?;
            inner.store = Some(store.clone());
            let bound = match inner.file_name.clone() {
                Some(file_name) => {
                    let mut control = Control::from_config(store, &self.config);
                    if let Some(launcher) = &inner.launcher {
                        control = control.with_launcher(launcher.clone());
                    }
                    let control = Arc::new(control);
                    self.handles.clear()?;
                    self.view.add_interface(
                        &self.config.control_handle,
                        Arc::new(ControlInterface::new(&control, self.handles.clone())),
                    )?;
                    self.view
                        .add_interface(&self.config.data_handle, self.data.clone())?;
                    self.view.add_interface(
                        &self.config.table_data_handle,
                        Arc::new(TableDataInterface::new(&control, self.handles.clone())),
                    )?;
                    self.container.set_visibility(Visibility::Content);
                    inner.control = Some(control);
                    inner.state = PageState::Bound;
                    self.view.load(&self.file_url(&file_name))?;
                    true
                }
                None => {
                    tracing::debug!("store available but page has no file to show");
                    false
                }
            };
            (bound, inner.listener.clone())
        };
        if let Some(listener) = listener {
            listener.database_available();
        }
        Ok(bound)
    }

    /// Drop the binding and show the "no data" state.
    pub fn database_unavailable(&self) -> BridgeResult<()> {
        let listener = {
            let mut inner = self.live()?;
            inner.store = None;
            if inner.control.take().is_some() {
                inner.state = PageState::Unbound;
            }
            self.handles.clear()?;
            self.container.set_visibility(Visibility::NoData);
            inner.listener.clone()
        };
        tracing::info!("store unavailable, page unbound");
        if let Some(listener) = listener {
            listener.database_unavailable();
        }
        Ok(())
    }

    /// Show another file, rebinding against the last known store.
    pub fn set_file_name(&self, file_name: impl Into<String>) -> BridgeResult<bool> {
        let store = {
            let mut inner = self.live()?;
            inner.file_name = Some(file_name.into());
            inner.store.clone()
        };
        match store {
            Some(store) => self.database_available(store),
            None => Ok(false),
        }
    }

    /// Queue `payload` and tell the script, on the UI thread, that a
    /// response is ready.
    pub fn signal_response_available(&self, payload: impl Into<String>) -> BridgeResult<()> {
        self.ensure_live()?;
        self.queue.push(payload.into())?;
        let view = self.view.clone();
        let script = self.config.response_callback.clone();
        self.ui.run_on_ui_thread(Box::new(move || {
            if let Err(err) = view.evaluate(&script) {
                tracing::warn!(%err, "response notification failed");
            }
        }))
    }

    /// Oldest pending response, or `None` when the queue is empty.
    pub fn get_response_json(&self) -> BridgeResult<Option<String>> {
        self.ensure_live()?;
        self.queue.pop()
    }

    /// Tear the page down. Every later call fails with `InvalidState`.
    ///
    /// The script objects are only removed while the shared view still sits
    /// in this page's container; a page that has since taken the view over
    /// keeps its own.
    pub fn destroy(&self) -> BridgeResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| BridgeError::InvalidState("page lock poisoned".into()))?;
        if inner.state == PageState::Destroyed {
            return Ok(());
        }
        if inner.control.take().is_some() && self.view.is_attached_to(&self.container) {
            for name in [
                &self.config.control_handle,
                &self.config.data_handle,
                &self.config.table_data_handle,
            ] {
                self.view.remove_interface(name)?;
            }
        }
        inner.store = None;
        inner.listener = None;
        inner.state = PageState::Destroyed;
        self.handles.clear()?;
        tracing::debug!("page destroyed");
        Ok(())
    }

    fn file_url(&self, file_name: &str) -> String {
        format!("file://{}", self.config.app_dir().join(file_name).display())
    }

    fn live(&self) -> BridgeResult<MutexGuard<'_, PageInner>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| BridgeError::InvalidState("page lock poisoned".into()))?;
        if inner.state == PageState::Destroyed {
            return Err(BridgeError::InvalidState("page was destroyed".into()));
        }
        Ok(inner)
    }

    fn ensure_live(&self) -> BridgeResult<()> {
        self.live().map(drop)
    }
}

impl std::fmt::Debug for WebPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebPage")
            .field("state", &self.state())
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}
