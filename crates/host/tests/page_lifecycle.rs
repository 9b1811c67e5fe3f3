//! A hosted page driven end to end through the recording engine.

use std::sync::Arc;

use common::GroupCountStrategy;
use host::{EngineView, PageSnapshot, PageState, UiThread, Visibility, WebPage};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use testsupport::prelude::*;
use testsupport::proptest_generators::arb_payloads;

struct Page {
    engine: RecordingEngine,
    container: Arc<RecordingContainer>,
    ui: Arc<UiThread>,
    page: WebPage,
    _dir: TempConfig,
}

fn open(saved: Option<PageSnapshot>, file: Option<&str>) -> Page {
    let dir = TempConfig::new();
    let mut config = dir.config.clone();
    config.group_count_strategy = GroupCountStrategy::Aggregate;
    let engine = RecordingEngine::new();
    let view = Arc::new(EngineView::new(engine.boxed()));
    let container = RecordingContainer::new();
    let ui = Arc::new(UiThread::spawn("ui").unwrap());
    let page = WebPage::create(
        config,
        view,
        ui.clone(),
        container.clone(),
        saved,
        file.map(str::to_string),
    )
    .unwrap();
    Page {
        engine,
        container,
        ui,
        page,
        _dir: dir,
    }
}

#[test]
fn script_reads_tables_through_injected_objects() {
    let p = open(None, Some("forms/list.html"));
    assert!(p.page.database_available(demo_store()).unwrap());
    assert_eq!(p.engine.interface_names(), vec!["control", "data", "tableData"]);
    assert_eq!(p.container.visibility(), Some(Visibility::Content));

    let loaded = p.engine.calls();
    match loaded.last() {
        Some(EngineCall::LoadUrl(url)) => {
            assert!(url.starts_with("file://"), "{url}");
            assert!(url.ends_with("tables/forms/list.html"), "{url}");
        }
        other => panic!("expected a url load, got {other:?}"),
    }

    let handle = p
        .engine
        .call("control", "query", &[json!("Orders"), json!("")])
        .unwrap();
    let regions = p
        .engine
        .call("tableData", "getColumnData", &[handle.clone(), json!("Region")])
        .unwrap();
    assert_json_str_eq(regions.as_str().unwrap(), &json!(["East", "West", "East"]));
    assert_eq!(
        p.engine
            .call("tableData", "getCollectionSize", &[handle.clone(), json!(1)])
            .unwrap(),
        json!(1)
    );
    let columns = p
        .engine
        .call("tableData", "getColumns", &[handle])
        .unwrap();
    assert_json_str_eq(
        columns.as_str().unwrap(),
        &json!({"Item": "text", "Region": "text"}),
    );
}

#[test]
fn responses_are_announced_on_the_ui_thread() {
    let p = open(None, Some("index.html"));
    p.page.database_available(demo_store()).unwrap();
    p.page.signal_response_available(r#"{"id":1}"#).unwrap();
    p.page.signal_response_available(r#"{"id":2}"#).unwrap();
    p.ui.flush().unwrap();

    let evaluations: Vec<EngineCall> = p
        .engine
        .calls()
        .into_iter()
        .filter(|call| matches!(call, EngineCall::Evaluate(_)))
        .collect();
    assert_eq!(
        evaluations,
        vec![EngineCall::Evaluate("datarsp.responseAvailable();".into()); 2]
    );
    assert_eq!(p.engine.evaluate_threads(), vec![Some("ui".to_string()); 2]);

    assert_eq!(p.engine.call("data", "getResponseJSON", &[]).unwrap(), json!(r#"{"id":1}"#));
    assert_eq!(p.engine.call("data", "getResponseJSON", &[]).unwrap(), json!(r#"{"id":2}"#));
    assert_eq!(p.engine.call("data", "getResponseJSON", &[]).unwrap(), json!(null));
}

#[test]
fn outage_degrades_to_no_data_and_recovers() {
    let p = open(None, Some("index.html"));
    let store = demo_store();
    p.page.database_available(store.clone()).unwrap();

    store.set_available(false);
    assert_backend_unavailable(p.engine.call("control", "listTables", &[]));
    p.page.database_unavailable().unwrap();
    assert_eq!(p.page.state(), PageState::Unbound);
    assert_eq!(p.container.visibility(), Some(Visibility::NoData));
    assert_backend_unavailable(p.engine.call("control", "listTables", &[]));
    assert_backend_unavailable(p.engine.call("tableData", "getCount", &[json!("any")]));

    store.set_available(true);
    p.page.database_available(store).unwrap();
    assert_eq!(p.page.state(), PageState::Bound);
    assert_eq!(
        p.engine.call("control", "listTables", &[]).unwrap(),
        json!(["Clients", "Orders"])
    );
}

#[test]
fn handles_do_not_outlive_a_binding() {
    let p = open(None, Some("index.html"));
    p.page.database_available(demo_store()).unwrap();
    let handle = p
        .engine
        .call("control", "query", &[json!("Clients"), json!("")])
        .unwrap();
    assert_eq!(p.page.handles().len(), 1);

    p.page.database_unavailable().unwrap();
    assert!(p.page.handles().is_empty());
    assert_backend_unavailable(p.engine.call("tableData", "getCount", &[handle.clone()]));

    p.page.database_available(demo_store()).unwrap();
    assert_error_contains(
        p.engine.call("tableData", "getCount", &[handle]),
        "unknown table handle",
    );
}

#[test]
fn destroying_a_page_leaves_the_next_pages_objects() {
    let dir = TempConfig::new();
    let engine = RecordingEngine::new();
    let view = Arc::new(EngineView::new(engine.boxed()));
    let ui = Arc::new(UiThread::spawn("ui").unwrap());
    let first_container = RecordingContainer::new();
    let second_container = RecordingContainer::new();
    let page = |container: &Arc<RecordingContainer>| {
        WebPage::create(
            dir.config.clone(),
            view.clone(),
            ui.clone(),
            container.clone(),
            None,
            Some("index.html".into()),
        )
        .unwrap()
    };

    let first = page(&first_container);
    first.database_available(demo_store()).unwrap();
    let second = page(&second_container);
    second.database_available(demo_store()).unwrap();

    first.destroy().unwrap();
    assert_eq!(engine.interface_names(), vec!["control", "data", "tableData"]);
    assert_eq!(
        engine.call("control", "listTables", &[]).unwrap(),
        json!(["Clients", "Orders"])
    );
    second.signal_response_available("still here").unwrap();
    assert_eq!(
        engine.call("data", "getResponseJSON", &[]).unwrap(),
        json!("still here")
    );

    second.destroy().unwrap();
    assert!(engine.interface_names().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn queue_round_trips_through_snapshot(payloads in arb_payloads(), popped in 0usize..5) {
        let p = open(None, Some("index.html"));
        for payload in &payloads {
            p.page.signal_response_available(payload.clone()).unwrap();
        }
        let popped = popped.min(payloads.len());
        for _ in 0..popped {
            p.page.get_response_json().unwrap();
        }
        let json = p.page.save_state().unwrap().to_json().unwrap();

        let restored = open(Some(PageSnapshot::from_json(&json).unwrap()), None);
        let mut drained = Vec::new();
        while let Some(item) = restored.page.get_response_json().unwrap() {
            drained.push(item);
        }
        prop_assert_eq!(drained, payloads[popped..].to_vec());
        let file_name = restored.page.file_name().unwrap();
        prop_assert_eq!(file_name.as_deref(), Some("index.html"));
    }
}
