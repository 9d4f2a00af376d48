use super::event_detail::{EventDetailScreen, FetchOutcome};
use crate::context::AppContext;
use crate::error::{auth_error, AppResult};
use crate::models::{DraftField, EventDraft, EVENTS_COLLECTION};
use crate::navigation::Route;
use crate::utils::time::now_rfc3339;
use rust_i18n::t;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Loading,
    Editing,
    /// The event could not be loaded
    NotFound,
    /// Only the creator may edit an event
    NotPermitted,
}

/// Create/edit form for an event
#[derive(Debug)]
pub struct EventFormScreen {
    mode: FormMode,
    state: FormState,
    draft: EventDraft,
}

impl EventFormScreen {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            state: FormState::Editing,
            draft: EventDraft::default(),
        }
    }

    pub fn edit(event_id: impl Into<String>) -> Self {
        Self {
            mode: FormMode::Edit(event_id.into()),
            state: FormState::Loading,
            draft: EventDraft::default(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    /// Prefill the draft in edit mode
    pub async fn load(&mut self, ctx: &AppContext) -> &FormState {
        let FormMode::Edit(event_id) = &self.mode else {
            self.state = FormState::Editing;
            return &self.state;
        };

        self.state = match EventDetailScreen::fetch(ctx.store.as_ref(), event_id).await {
            FetchOutcome::Found(event) if event.is_created_by(ctx.session_uid().as_deref()) => {
                self.draft = EventDraft::from_event(&event);
                FormState::Editing
            }
            FetchOutcome::Found(_) => FormState::NotPermitted,
            FetchOutcome::Missing => FormState::NotFound,
            FetchOutcome::Failed(e) => {
                error!("Error fetching event {}: {}", event_id, e);
                FormState::NotFound
            }
        };

        &self.state
    }

    /// Update one field of the draft. Ignored unless the form is editable.
    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) -> bool {
        if self.state != FormState::Editing {
            return false;
        }
        self.draft.set(field, value);
        true
    }

    /// Validate and write the draft. Returns the event id.
    ///
    /// Creating replaces the form with the new event's detail screen;
    /// editing goes back. On error the draft is left as it was.
    pub async fn save(&self, ctx: &AppContext) -> AppResult<String> {
        if self.state != FormState::Editing {
            return Err(auth_error("this event cannot be edited"));
        }
        self.draft.validate()?;

        let uid = ctx
            .session_uid()
            .ok_or_else(|| auth_error("sign in to save events"))?;

        match &self.mode {
            FormMode::Create => {
                let fields = self.draft.to_new_event_fields(&uid, &now_rfc3339());
                let id = ctx.store.add_document(EVENTS_COLLECTION, fields).await?;
                info!("Created event {}", id);

                ctx.navigator
                    .write()
                    .await
                    .replace(Route::EventDetail(id.clone()));
                Ok(id)
            }
            FormMode::Edit(id) => {
                ctx.store
                    .update_document(EVENTS_COLLECTION, id, self.draft.to_fields())
                    .await?;
                info!("Updated event {}", id);

                ctx.navigator.write().await.back();
                Ok(id.clone())
            }
        }
    }

    pub fn render(&self) -> String {
        match self.state {
            FormState::Loading => return t!("loading").to_string(),
            FormState::NotFound => return t!("event_not_found").to_string(),
            FormState::NotPermitted => return t!("edit_not_permitted").to_string(),
            FormState::Editing => {}
        }

        let heading = match self.mode {
            FormMode::Create => t!("form_create_title"),
            FormMode::Edit(_) => t!("form_edit_title"),
        };

        [
            heading.to_string(),
            String::new(),
            format!("{}: {}", t!("title_label"), self.draft.title),
            format!("{}: {}", t!("description_label"), self.draft.description),
            format!("{}: {}", t!("date_label"), self.draft.date),
            format!("{}: {}", t!("location_label"), self.draft.location),
            String::new(),
            t!("form_hint").to_string(),
        ]
        .join("\n")
    }
}
