//! The process-wide view; kept in its own test binary so no other test
//! initialises it first.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use host::{ConsoleLevel, Container, EngineView};
use testsupport::prelude::*;

#[test]
fn init_once_creates_a_single_view() {
    assert!(EngineView::shared().is_none());

    let created = AtomicUsize::new(0);
    let engine = RecordingEngine::new();
    let first = EngineView::init_once(|| {
        created.fetch_add(1, Ordering::SeqCst);
        engine.boxed()
    });
    let second = EngineView::init_once(|| {
        created.fetch_add(1, Ordering::SeqCst);
        RecordingEngine::new().boxed()
    });

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &EngineView::shared().unwrap()));
    assert!(engine.emit_console(ConsoleLevel::Log, "diagnostics are wired"));

    let a = RecordingContainer::new();
    let b = RecordingContainer::new();
    let a_dyn: Arc<dyn Container> = a.clone();
    let b_dyn: Arc<dyn Container> = b.clone();
    second.attach(&a_dyn).unwrap();
    first.attach(&b_dyn).unwrap();
    assert_eq!(a.events(), vec![ContainerEvent::Added, ContainerEvent::Removed]);
    assert_eq!(b.events(), vec![ContainerEvent::Added]);
}
