use super::{ConfirmDialog, Dialogs};
use crate::context::AppContext;
use crate::error::Error;
use crate::firebase::DocumentStore;
use crate::models::{Event, EVENTS_COLLECTION};
use crate::navigation::Route;
use crate::utils::time::DisplaySettings;
use rust_i18n::t;
use tracing::{debug, error, info, warn};

/// What a single point read produced. Kept distinct from what is shown.
#[derive(Debug)]
pub enum FetchOutcome {
    Found(Event),
    Missing,
    Failed(Error),
}

/// Screen state: `Loading` until the one fetch of this mount completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Found(Event),
    NotFound,
}

/// Result of the delete action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
    Failed,
    /// The viewer is not the creator, so the control is not shown
    NotPermitted,
    /// No event is loaded
    Unavailable,
}

/// Rendered content of the detail screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailView {
    Loading,
    NotFound,
    Found(EventCard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCard {
    pub title: String,
    pub date: String,
    pub location: String,
    pub attendee_count: usize,
    pub description: String,
    /// Edit and delete controls
    pub show_owner_actions: bool,
}

impl DetailView {
    pub fn render(&self) -> String {
        match self {
            DetailView::Loading => t!("loading").to_string(),
            DetailView::NotFound => t!("event_not_found").to_string(),
            DetailView::Found(card) => {
                let mut lines = Vec::new();

                let mut header = format!("[{}]", t!("back_button"));
                if card.show_owner_actions {
                    header.push_str(&format!(
                        "  [{}] [{}]",
                        t!("edit_button"),
                        t!("delete_button")
                    ));
                }
                lines.push(header);
                lines.push(String::new());
                lines.push(card.title.clone());
                lines.push(format!("{}: {}", t!("date_label"), card.date));
                lines.push(format!("{}: {}", t!("location_label"), card.location));
                lines.push(t!("attendees_count", count = card.attendee_count).to_string());
                lines.push(String::new());
                lines.push(t!("description_label").to_string());
                lines.push(card.description.clone());
                lines.push(String::new());
                lines.push(format!("[{}]", t!("attend_button")));

                lines.join("\n")
            }
        }
    }
}

/// Detail screen for one event, mounted per navigation
#[derive(Debug)]
pub struct EventDetailScreen {
    event_id: String,
    state: DetailState,
}

impl EventDetailScreen {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            state: DetailState::Loading,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn event(&self) -> Option<&Event> {
        match &self.state {
            DetailState::Found(event) => Some(event),
            _ => None,
        }
    }

    /// One point read of `events/{event_id}`
    pub async fn fetch(store: &dyn DocumentStore, event_id: &str) -> FetchOutcome {
        match store.get_document(EVENTS_COLLECTION, event_id).await {
            Ok(Some(document)) => match document.decode::<Event>() {
                Ok(event) => FetchOutcome::Found(event),
                Err(e) => FetchOutcome::Failed(e),
            },
            Ok(None) => FetchOutcome::Missing,
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    /// Run this mount's fetch. Failures are logged and shown as not found.
    pub async fn load(&mut self, store: &dyn DocumentStore) -> &DetailState {
        self.state = DetailState::Loading;

        self.state = match Self::fetch(store, &self.event_id).await {
            FetchOutcome::Found(event) => DetailState::Found(event),
            FetchOutcome::Missing => {
                debug!("Event {} does not exist", self.event_id);
                DetailState::NotFound
            }
            FetchOutcome::Failed(e) => {
                error!("Error fetching event {}: {}", self.event_id, e);
                DetailState::NotFound
            }
        };

        &self.state
    }

    /// Whether the session user created the loaded event
    pub fn is_event_creator(&self, session_uid: Option<&str>) -> bool {
        self.event()
            .is_some_and(|event| event.is_created_by(session_uid))
    }

    pub fn view(&self, session_uid: Option<&str>, settings: &DisplaySettings) -> DetailView {
        match &self.state {
            DetailState::Loading => DetailView::Loading,
            DetailState::NotFound => DetailView::NotFound,
            DetailState::Found(event) => DetailView::Found(EventCard {
                title: event.title.clone(),
                date: event
                    .formatted_date(settings)
                    .unwrap_or_else(|| t!("invalid_date").to_string()),
                location: event.location.clone(),
                attendee_count: event.attendee_count(),
                description: event.description.clone(),
                show_owner_actions: event.is_created_by(session_uid),
            }),
        }
    }

    /// Confirm, delete the event, then go to the event list.
    ///
    /// A failed delete shows an alert and leaves the screen as it was.
    pub async fn delete(&self, ctx: &AppContext, dialogs: &dyn Dialogs) -> DeleteOutcome {
        let Some(event) = self.event() else {
            return DeleteOutcome::Unavailable;
        };
        if !event.is_created_by(ctx.session_uid().as_deref()) {
            warn!("Delete of event {} requested by a non-creator", self.event_id);
            return DeleteOutcome::NotPermitted;
        }

        let dialog = ConfirmDialog {
            title: t!("delete_title").to_string(),
            message: t!("delete_message").to_string(),
            cancel_label: t!("cancel").to_string(),
            confirm_label: t!("delete_button").to_string(),
        };
        if !dialogs.confirm(&dialog).await {
            debug!("Delete of event {} cancelled", self.event_id);
            return DeleteOutcome::Cancelled;
        }

        match ctx.store.delete_document(EVENTS_COLLECTION, &self.event_id).await {
            Ok(()) => {
                info!("Deleted event {}", self.event_id);
                ctx.navigator.write().await.push(Route::Events);
                DeleteOutcome::Deleted
            }
            Err(e) => {
                error!("Error deleting event {}: {}", self.event_id, e);
                dialogs
                    .alert(&t!("error_title"), &t!("delete_failed"))
                    .await;
                DeleteOutcome::Failed
            }
        }
    }

    /// Open the edit route for this event (creator control)
    pub async fn edit(&self, ctx: &AppContext) -> bool {
        if !self.is_event_creator(ctx.session_uid().as_deref()) {
            return false;
        }
        self.open_edit_route(ctx).await
    }

    /// The "Asistir" control. Routes to the edit screen like the edit control.
    pub async fn attend(&self, ctx: &AppContext) -> bool {
        if self.event().is_none() {
            return false;
        }
        self.open_edit_route(ctx).await
    }

    async fn open_edit_route(&self, ctx: &AppContext) -> bool {
        info!("Navigating to event: {}", self.event_id);
        ctx.navigator
            .write()
            .await
            .push(Route::EditEvent(self.event_id.clone()));
        true
    }
}
