#![allow(dead_code)]

use async_trait::async_trait;
use eventos::config::Config;
use eventos::context::AppContext;
use eventos::error::{auth_error, firestore_error, AppResult};
use eventos::firebase::auth::{AuthListener, AuthStateNotifier};
use eventos::firebase::{AuthProvider, AuthSubscription, Document, DocumentStore, User};
use eventos::firebase::FirebaseOptions;
use eventos::navigation::{self, Route, RouteStack};
use eventos::screens::{ConfirmDialog, Dialogs};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// In-memory document store with call counters and failure switches
#[derive(Debug, Default)]
pub struct MockStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    pub get_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_deletes: AtomicBool,
    next_id: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, collection: &str, id: &str, fields: Value) {
        let fields = fields.as_object().cloned().unwrap_or_default();
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id, fields));
    }

    pub async fn fields(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.collections
            .lock()
            .await
            .get(collection)?
            .iter()
            .find(|document| document.id == id)
            .map(|document| document.fields.clone())
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(firestore_error("HTTP 503 - UNAVAILABLE"));
        }
        Ok(self
            .collections
            .lock()
            .await
            .get(collection)
            .and_then(|documents| documents.iter().find(|d| d.id == id).cloned()))
    }

    async fn delete_document(&self, collection: &str, id: &str) -> AppResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(firestore_error("HTTP 403 - PERMISSION_DENIED"));
        }
        if let Some(documents) = self.collections.lock().await.get_mut(collection) {
            documents.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn add_document(&self, collection: &str, fields: Map<String, Value>) -> AppResult<String> {
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> AppResult<()> {
        let mut collections = self.collections.lock().await;
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| firestore_error("HTTP 404 - NOT_FOUND"))?;
        for (key, value) in fields {
            document.fields.insert(key, value);
        }
        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> AppResult<Vec<Document>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(firestore_error("HTTP 503 - UNAVAILABLE"));
        }
        Ok(self
            .collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }
}

/// Auth provider driven by the test through `publish`
#[derive(Debug, Default)]
pub struct MockAuth {
    notifier: AuthStateNotifier,
    /// email -> password
    accounts: Mutex<HashMap<String, String>>,
}

impl MockAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Already resolved, with `user` signed in (or nobody)
    pub fn resolved(user: Option<User>) -> Self {
        let auth = Self::new();
        auth.publish(user);
        auth
    }

    pub fn publish(&self, user: Option<User>) {
        self.notifier.publish(user);
    }

    pub async fn add_account(&self, email: &str, password: &str) {
        self.accounts
            .lock()
            .await
            .insert(email.to_string(), password.to_string());
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    fn current_user(&self) -> Option<User> {
        self.notifier.current_user()
    }

    fn on_auth_state_changed(&self, listener: AuthListener) -> AuthSubscription {
        self.notifier.subscribe(listener)
    }

    async fn id_token(&self) -> AppResult<Option<String>> {
        Ok(self.current_user().map(|user| format!("token-{}", user.uid)))
    }

    async fn sign_in_with_email_and_password(&self, email: &str, password: &str) -> AppResult<User> {
        let accounts = self.accounts.lock().await;
        match accounts.get(email) {
            Some(stored) if stored == password => {
                let user = User::new(format!("uid-{}", email)).with_email(email);
                self.publish(Some(user.clone()));
                Ok(user)
            }
            _ => Err(auth_error("HTTP 400 - INVALID_LOGIN_CREDENTIALS")),
        }
    }

    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<User> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(auth_error("HTTP 400 - EMAIL_EXISTS"));
        }
        accounts.insert(email.to_string(), password.to_string());
        let user = User::new(format!("uid-{}", email)).with_email(email);
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.publish(None);
        Ok(())
    }
}

/// Dialogs answered from a script, recording what was shown
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    pub confirm_answer: AtomicBool,
    pub confirms: Mutex<Vec<ConfirmDialog>>,
    pub alerts: Mutex<Vec<(String, String)>>,
}

impl ScriptedDialogs {
    pub fn answering(confirm: bool) -> Self {
        let dialogs = Self::default();
        dialogs.confirm_answer.store(confirm, Ordering::SeqCst);
        dialogs
    }
}

#[async_trait]
impl Dialogs for ScriptedDialogs {
    async fn confirm(&self, dialog: &ConfirmDialog) -> bool {
        self.confirms.lock().await.push(dialog.clone());
        self.confirm_answer.load(Ordering::SeqCst)
    }

    async fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .await
            .push((title.to_string(), message.to_string()));
    }
}

pub fn test_config() -> Config {
    Config::new(FirebaseOptions::new("test-key", "demo-project"))
}

/// Context over the given mocks, starting at `route`
pub fn context(auth: Arc<MockAuth>, store: Arc<MockStore>, route: Route) -> AppContext {
    AppContext::new(
        Arc::new(RwLock::new(test_config())),
        auth,
        store,
        navigation::shared(RouteStack::with_initial(route)),
    )
}

pub fn event_fields(title: &str, created_by: &str) -> Value {
    json!({
        "title": title,
        "description": "Música en vivo y comida",
        "date": "2024-06-01T18:00:00Z",
        "location": "Plaza Mayor",
        "createdBy": created_by,
        "createdAt": "2024-05-01T10:00:00Z",
        "attendees": ["u2", "u3"]
    })
}

/// Wait until the navigator reaches `route`, failing after a second
pub async fn wait_for_route(ctx: &AppContext, route: &Route) {
    let reached = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if ctx.current_route().await == *route {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "navigator never reached {}", route);
}

/// Give spawned listener tasks a chance to run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
