//! Page state, queue and view plumbing with an inline UI executor.

use std::sync::{Arc, Mutex};

use common::{BridgeError, Config};
use host::{
    Container, DatabaseConnectionListener, EngineView, InlineExecutor, PageSnapshot, PageState,
    UiExecutor, UiThread, Visibility, WebPage,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use testsupport::prelude::*;

struct Harness {
    engine: RecordingEngine,
    container: Arc<RecordingContainer>,
    page: WebPage,
}

fn harness(saved: Option<PageSnapshot>, file: Option<&str>) -> Harness {
    let engine = RecordingEngine::new();
    let view = Arc::new(EngineView::new(engine.boxed()));
    let container = RecordingContainer::new();
    let config = Config::builder().data_dir("/data".into()).build();
    let page = WebPage::create(
        config,
        view,
        Arc::new(InlineExecutor),
        container.clone(),
        saved,
        file.map(str::to_string),
    )
    .unwrap();
    Harness {
        engine,
        container,
        page,
    }
}

#[test]
fn queue_is_fifo() {
    let h = harness(None, Some("index.html"));
    h.page.signal_response_available("a").unwrap();
    h.page.signal_response_available("b").unwrap();
    assert_eq!(h.page.get_response_json().unwrap().as_deref(), Some("a"));
    assert_eq!(h.page.get_response_json().unwrap().as_deref(), Some("b"));
    assert_eq!(h.page.get_response_json().unwrap(), None);
}

#[test]
fn queue_survives_save_and_restore() {
    let h = harness(None, Some("index.html"));
    for payload in ["one", "two", "three"] {
        h.page.signal_response_available(payload).unwrap();
    }
    h.page.get_response_json().unwrap();
    let json = h.page.save_state().unwrap().to_json().unwrap();

    let restored = harness(Some(PageSnapshot::from_json(&json).unwrap()), None);
    assert_eq!(restored.page.file_name().unwrap().as_deref(), Some("index.html"));
    assert_eq!(restored.page.get_response_json().unwrap().as_deref(), Some("two"));
    assert_eq!(restored.page.get_response_json().unwrap().as_deref(), Some("three"));
    assert_eq!(restored.page.get_response_json().unwrap(), None);
}

#[test]
fn saved_file_name_takes_precedence() {
    let saved = PageSnapshot {
        file_name: Some("saved.html".into()),
        response_json: vec![],
    };
    let h = harness(Some(saved), Some("args.html"));
    assert_eq!(h.page.file_name().unwrap().as_deref(), Some("saved.html"));

    let h = harness(Some(PageSnapshot::default()), Some("args.html"));
    assert_eq!(h.page.file_name().unwrap().as_deref(), Some("args.html"));
}

#[test]
fn signal_evaluates_callback() {
    let h = harness(None, Some("index.html"));
    h.page.signal_response_available("{}").unwrap();
    assert_eq!(
        h.engine.calls().last(),
        Some(&EngineCall::Evaluate("datarsp.responseAvailable();".into()))
    );
}

#[test]
fn binding_injects_interfaces_and_loads_file() {
    let h = harness(None, Some("index.html"));
    assert_eq!(h.page.state(), PageState::Created);
    assert!(h.page.database_available(clients_store()).unwrap());
    assert_eq!(h.page.state(), PageState::Bound);

    assert_eq!(
        h.engine.calls(),
        vec![
            EngineCall::Clear,
            EngineCall::LoadUrl("file:///data/tables/index.html".into()),
        ]
    );
    assert_eq!(h.engine.interface_names(), vec!["control", "data", "tableData"]);
    assert_eq!(
        h.engine.call("control", "listTables", &[]).unwrap(),
        json!(["Clients"])
    );
    assert_eq!(
        h.container.events(),
        vec![ContainerEvent::Added, ContainerEvent::Shown(Visibility::Content)]
    );
}

#[test]
fn unavailable_store_shows_no_data_and_rebind_recreates_control() {
    let h = harness(None, Some("index.html"));
    h.page.database_available(clients_store()).unwrap();
    let first = h.page.control().unwrap().unwrap();
    let old_control = h.engine.interface("control").unwrap();
    let old_table_data = h.engine.interface("tableData").unwrap();

    h.page.database_unavailable().unwrap();
    assert_eq!(h.page.state(), PageState::Unbound);
    assert!(h.page.control().unwrap().is_none());
    assert_eq!(h.container.visibility(), Some(Visibility::NoData));
    drop(first);
    assert_backend_unavailable(old_control.call("listTables", &[]));
    assert_backend_unavailable(old_table_data.call("getCount", &[json!("gone")]));

    h.page.signal_response_available("kept").unwrap();
    h.page.database_available(clients_store()).unwrap();
    assert_eq!(h.page.state(), PageState::Bound);
    assert_eq!(h.page.get_response_json().unwrap().as_deref(), Some("kept"));
    assert_backend_unavailable(old_control.call("listTables", &[]));
}

#[test]
fn data_interface_is_shared_across_rebinds() {
    let h = harness(None, Some("index.html"));
    h.page.database_available(clients_store()).unwrap();
    let data = h.engine.interface("data").unwrap();
    h.page.database_available(clients_store()).unwrap();
    assert!(Arc::ptr_eq(&data, &h.engine.interface("data").unwrap()));

    h.page.signal_response_available("x").unwrap();
    assert_eq!(data.call("getResponseJSON", &[]).unwrap(), json!("x"));
    assert_eq!(data.call("getResponseJSON", &[]).unwrap(), json!(null));
}

#[test]
fn no_file_means_no_binding() {
    let h = harness(None, None);
    assert!(!h.page.database_available(clients_store()).unwrap());
    assert_eq!(h.page.state(), PageState::Created);
    assert!(h.engine.interface("control").is_none());

    assert!(h.page.set_file_name("late.html").unwrap());
    assert_eq!(h.page.state(), PageState::Bound);
    assert_eq!(
        h.engine.calls().last(),
        Some(&EngineCall::LoadUrl("file:///data/tables/late.html".into()))
    );
}

#[test]
fn destroyed_page_rejects_calls() {
    let h = harness(None, Some("index.html"));
    h.page.database_available(clients_store()).unwrap();
    h.page.destroy().unwrap();
    assert_eq!(h.page.state(), PageState::Destroyed);
    assert!(h.engine.interface_names().is_empty());
    assert!(matches!(
        h.page.get_response_json(),
        Err(BridgeError::InvalidState(_))
    ));
    assert!(matches!(h.page.attach(), Err(BridgeError::InvalidState(_))));
    assert!(matches!(
        h.page.signal_response_available("late"),
        Err(BridgeError::InvalidState(_))
    ));
    assert!(h.page.database_available(clients_store()).is_err());
    assert!(h.page.destroy().is_ok());
}

#[test]
fn attach_moves_view_between_containers() {
    let view = EngineView::new(RecordingEngine::new().boxed());
    let first = RecordingContainer::new();
    let second = RecordingContainer::new();
    let first_dyn: Arc<dyn Container> = first.clone();
    let second_dyn: Arc<dyn Container> = second.clone();

    view.attach(&first_dyn).unwrap();
    view.attach(&second_dyn).unwrap();
    assert_eq!(first.events(), vec![ContainerEvent::Added, ContainerEvent::Removed]);
    assert_eq!(second.events(), vec![ContainerEvent::Added]);
    assert!(view.is_attached_to(&second_dyn));
    assert!(!view.is_attached_to(&first_dyn));
}

#[test]
fn inline_content_clears_first() {
    let engine = RecordingEngine::new();
    let view = EngineView::new(engine.boxed());
    view.load_inline_content("<p>hi</p>", "text/html", "utf-8").unwrap();
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::Clear,
            EngineCall::LoadData {
                data: "<p>hi</p>".into(),
                mime_type: "text/html".into(),
            },
        ]
    );
}

#[test]
fn ui_thread_runs_tasks_in_order() {
    let ui = UiThread::spawn("ui-test").unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..5 {
        let seen = seen.clone();
        ui.run_on_ui_thread(Box::new(move || seen.lock().unwrap().push(i)))
            .unwrap();
    }
    ui.flush().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    assert!(!ui.is_current());
}

#[derive(Default)]
struct CountingListener {
    events: Mutex<Vec<&'static str>>,
}

impl DatabaseConnectionListener for CountingListener {
    fn database_available(&self) {
        self.events.lock().unwrap().push("available");
    }

    fn database_unavailable(&self) {
        self.events.lock().unwrap().push("unavailable");
    }
}

#[test]
fn listener_hears_after_page_handles_change() {
    let h = harness(None, None);
    let listener = Arc::new(CountingListener::default());
    h.page.register_listener(listener.clone()).unwrap();
    h.page.database_available(clients_store()).unwrap();
    h.page.database_unavailable().unwrap();
    assert_eq!(*listener.events.lock().unwrap(), vec!["available", "unavailable"]);
}
