//! Stand-ins for the embedding environment.
//!
//! [`RecordingEngine`] records what a page does to the script engine and
//! lets tests call the injected objects the way script would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bridge::ScriptInterface;
use common::{BridgeError, BridgeResult};
use host::{ConsoleLevel, Container, DiagnosticSink, ScriptEngine, Visibility};
use serde_json::Value as JsonValue;

/// One call observed by a [`RecordingEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    Clear,
    LoadUrl(String),
    LoadData { data: String, mime_type: String },
    Evaluate(String),
}

#[derive(Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    interfaces: HashMap<String, Arc<dyn ScriptInterface>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    evaluate_threads: Vec<Option<String>>,
}

/// A script engine that records calls. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    state: Arc<Mutex<EngineState>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn ScriptEngine> {
        Box::new(self.clone())
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().expect("engine state").calls.clone()
    }

    /// Names of the threads `evaluate` ran on, in call order.
    pub fn evaluate_threads(&self) -> Vec<Option<String>> {
        self.state.lock().expect("engine state").evaluate_threads.clone()
    }

    pub fn interface_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .expect("engine state")
            .interfaces
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// The object currently injected as `name`.
    pub fn interface(&self, name: &str) -> Option<Arc<dyn ScriptInterface>> {
        self.state
            .lock()
            .expect("engine state")
            .interfaces
            .get(name)
            .cloned()
    }

    /// Call `method` on the injected global `name`, as script would.
    pub fn call(&self, name: &str, method: &str, args: &[JsonValue]) -> BridgeResult<JsonValue> {
        let object = self
            .interface(name)
            .ok_or_else(|| BridgeError::Script(format!("{name} is not defined")))?;
        object.call(method, args)
    }

    /// Report a console message through the registered sink.
    pub fn emit_console(&self, level: ConsoleLevel, message: &str) -> bool {
        let sink = self.state.lock().expect("engine state").diagnostics.clone();
        match sink {
            Some(sink) => {
                sink.console_message(level, message, 1, "test.html");
                true
            }
            None => false,
        }
    }
}

impl ScriptEngine for RecordingEngine {
    fn clear(&mut self) {
        self.state.lock().expect("engine state").calls.push(EngineCall::Clear);
    }

    fn load_url(&mut self, url: &str) -> BridgeResult<()> {
        self.state
            .lock()
            .expect("engine state")
            .calls
            .push(EngineCall::LoadUrl(url.to_string()));
        Ok(())
    }

    fn load_data(&mut self, data: &str, mime_type: &str, _encoding: &str) -> BridgeResult<()> {
        self.state
            .lock()
            .expect("engine state")
            .calls
            .push(EngineCall::LoadData {
                data: data.to_string(),
                mime_type: mime_type.to_string(),
            });
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> BridgeResult<()> {
        let mut state = self.state.lock().expect("engine state");
        state.calls.push(EngineCall::Evaluate(script.to_string()));
        state
            .evaluate_threads
            .push(std::thread::current().name().map(str::to_string));
        Ok(())
    }

    fn add_interface(&mut self, name: &str, object: Arc<dyn ScriptInterface>) {
        self.state
            .lock()
            .expect("engine state")
            .interfaces
            .insert(name.to_string(), object);
    }

    fn remove_interface(&mut self, name: &str) {
        self.state.lock().expect("engine state").interfaces.remove(name);
    }

    fn set_diagnostics(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.state.lock().expect("engine state").diagnostics = Some(sink);
    }
}

/// One change observed by a [`RecordingContainer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerEvent {
    Added,
    Removed,
    Shown(Visibility),
}

#[derive(Default)]
pub struct RecordingContainer {
    events: Mutex<Vec<ContainerEvent>>,
}

impl RecordingContainer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ContainerEvent> {
        self.events.lock().expect("container events").clone()
    }

    /// The visibility most recently applied, if any.
    pub fn visibility(&self) -> Option<Visibility> {
        self.events().into_iter().rev().find_map(|event| match event {
            ContainerEvent::Shown(visibility) => Some(visibility),
            _ => None,
        })
    }
}

impl Container for RecordingContainer {
    fn add_view(&self) {
        self.events.lock().expect("container events").push(ContainerEvent::Added);
    }

    fn remove_view(&self) {
        self.events.lock().expect("container events").push(ContainerEvent::Removed);
    }

    fn set_visibility(&self, visibility: Visibility) {
        self.events
            .lock()
            .expect("container events")
            .push(ContainerEvent::Shown(visibility));
    }
}
