use std::sync::Arc;

use bookshelf::config::Config;
use bookshelf::docstore::DocumentStore;
use bookshelf::docstore::firestore::FirestoreClient;
use bookshelf::docstore::memory::MemoryStore;
use bookshelf::identity::Credentials;
use bookshelf::identity::firebase::FirebaseAuth;
use bookshelf::notify::{TracingNavigator, TracingNotifier};
use bookshelf::state::{AppState, Collaborators};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("invalid configuration");
    let offline = std::env::var("BOOKSHELF_OFFLINE").is_ok_and(|v| v == "1");

    let identity = Arc::new(FirebaseAuth::new(&config.firebase, config.timeouts).expect("identity client init failed"));
    let firestore = if offline {
        tracing::info!("offline mode, using in-memory document store");
        None
    } else {
        let client = FirestoreClient::new(&config.firebase, config.timeouts).expect("firestore client init failed");
        Some(Arc::new(client))
    };
    let documents: Arc<dyn DocumentStore> = match &firestore {
        Some(client) => client.clone(),
        None => Arc::new(MemoryStore::new()),
    };

    let collaborators = Collaborators {
        identity,
        documents,
        notifier: Arc::new(TracingNotifier),
        navigator: Arc::new(TracingNavigator),
    };
    let state = AppState::new(collaborators, config.collections.clone(), config.routes.clone());

    // Firestore calls carry whatever token the session holds at request time.
    if let Some(client) = &firestore {
        client.set_token_source(state.session.clone());
        if let (Ok(email), Ok(password)) = (std::env::var("BOOKSHELF_EMAIL"), std::env::var("BOOKSHELF_PASSWORD")) {
            if let Err(e) = state.session.authenticate(&Credentials::new(email, password)).await {
                tracing::warn!(error = %e, "sign-in failed, continuing unauthenticated");
            }
        }
    }

    if state.records.refresh().await.is_err() {
        return;
    }

    let records = state.records.snapshot();
    tracing::info!(
        project = %config.firebase.project_id,
        collection = %config.collections.borrowed,
        count = records.len(),
        "borrowed books loaded"
    );
    for record in &records {
        let fields = serde_json::to_string(&record.fields).unwrap_or_default();
        tracing::info!(id = %record.id, %fields, "borrowed book");
    }
}
