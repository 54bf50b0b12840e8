use serde_json::json;

use super::test_helpers::{FailingStore, Failures, MockProvider, RecordingNavigator, RecordingNotifier, fields, identity};
use super::*;
use crate::identity::Credentials;

fn collaborators(store: Arc<FailingStore>, notifier: Arc<RecordingNotifier>) -> Collaborators {
    Collaborators {
        identity: Arc::new(MockProvider::new(vec![Ok(identity("uid-1", "reader@example.com"))])),
        documents: store,
        notifier,
        navigator: Arc::new(RecordingNavigator::default()),
    }
}

#[tokio::test]
async fn mount_populates_records_and_leaves_session_anonymous() {
    let store = Arc::new(FailingStore::new(Failures::default()));
    store.inner.insert("Books Borrowed", &fields(&[("title", json!("Dune"))])).await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState::mount(collaborators(store, notifier.clone()), Collections::default(), Routes::default()).await;

    assert_eq!(state.records.snapshot().len(), 1);
    assert!(state.session.identity().is_none());
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn mount_with_unreachable_store_notifies_once() {
    let store = Arc::new(FailingStore::new(Failures { list: true, ..Failures::default() }));
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState::mount(collaborators(store, notifier.clone()), Collections::default(), Routes::default()).await;

    assert!(state.records.snapshot().is_empty());
    assert_eq!(notifier.toasts().len(), 1);
}

#[tokio::test]
async fn services_are_independent() {
    let store = Arc::new(FailingStore::new(Failures::default()));
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::mount(collaborators(store.clone(), notifier), Collections::default(), Routes::default()).await;
    let cloned = state.clone();

    cloned
        .session
        .authenticate(&Credentials::new("reader@example.com", "pw"))
        .await
        .unwrap();

    assert!(state.session.identity().is_some());
    assert_eq!(store.writes(), Vec::<&str>::new());
}

#[tokio::test]
async fn new_does_not_touch_store() {
    let store = Arc::new(FailingStore::new(Failures::default()));
    store.inner.insert("Books Borrowed", &fields(&[("title", json!("Dune"))])).await.unwrap();

    let state = AppState::new(
        collaborators(store, Arc::new(RecordingNotifier::default())),
        Collections::default(),
        Routes::default(),
    );

    assert!(state.records.snapshot().is_empty());
    state.records.refresh().await.unwrap();
    assert_eq!(state.records.snapshot().len(), 1);
}
