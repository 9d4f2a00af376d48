//! Headless screen models. Each screen owns its state, exposes the
//! operations its controls trigger, and renders to plain text.

pub mod event_detail;
pub mod event_form;
pub mod event_list;
pub mod login;

pub use event_detail::{DeleteOutcome, DetailState, DetailView, EventDetailScreen, FetchOutcome};
pub use event_form::{EventFormScreen, FormMode, FormState};
pub use event_list::{EventListScreen, ListState};
pub use login::{AuthScreen, AuthScreenMode};

use crate::context::AppContext;
use crate::navigation::Route;
use async_trait::async_trait;
use rust_i18n::t;

/// A blocking two-choice confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub cancel_label: String,
    pub confirm_label: String,
}

/// Modal dialogs shown by screens
#[async_trait]
pub trait Dialogs: Send + Sync {
    /// Ask the user to confirm; true only for the confirming choice
    async fn confirm(&self, dialog: &ConfirmDialog) -> bool;

    /// Show a dismissible message
    async fn alert(&self, title: &str, message: &str);
}

/// The screen mounted for the active route
#[derive(Debug)]
pub enum MountedScreen {
    Auth(AuthScreen),
    Events(EventListScreen),
    Detail(EventDetailScreen),
    Form(EventFormScreen),
    NotFound,
}

impl MountedScreen {
    /// Mount the screen for `route` and run its initial load
    pub async fn mount(route: &Route, ctx: &AppContext) -> Self {
        match route {
            Route::Login => MountedScreen::Auth(AuthScreen::new(AuthScreenMode::SignIn)),
            Route::Register => MountedScreen::Auth(AuthScreen::new(AuthScreenMode::SignUp)),
            Route::Events => {
                let mut screen = EventListScreen::new();
                screen.load(ctx).await;
                MountedScreen::Events(screen)
            }
            Route::EventDetail(id) => {
                let mut screen = EventDetailScreen::new(id.clone());
                screen.load(ctx.store.as_ref()).await;
                MountedScreen::Detail(screen)
            }
            Route::CreateEvent => MountedScreen::Form(EventFormScreen::create()),
            Route::EditEvent(id) => {
                let mut screen = EventFormScreen::edit(id.clone());
                screen.load(ctx).await;
                MountedScreen::Form(screen)
            }
            Route::NotFound => MountedScreen::NotFound,
        }
    }

    /// Text rendering of the screen for the current session
    pub async fn render(&self, ctx: &AppContext) -> String {
        match self {
            MountedScreen::Auth(screen) => screen.render(),
            MountedScreen::Events(screen) => {
                let settings = ctx.display_settings().await.unwrap_or_default();
                screen.render(&settings)
            }
            MountedScreen::Detail(screen) => {
                let settings = ctx.display_settings().await.unwrap_or_default();
                screen
                    .view(ctx.session_uid().as_deref(), &settings)
                    .render()
            }
            MountedScreen::Form(screen) => screen.render(),
            MountedScreen::NotFound => t!("screen_not_found").to_string(),
        }
    }
}
