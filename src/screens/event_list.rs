use crate::context::AppContext;
use crate::models::{Event, EVENTS_COLLECTION};
use crate::navigation::Route;
use crate::utils::time::{parse_event_datetime, DisplaySettings};
use chrono_tz::Tz;
use rust_i18n::t;
use std::cmp::Ordering;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Loading,
    Loaded(Vec<Event>),
    Failed,
}

/// The main `(app)/events` screen
#[derive(Debug)]
pub struct EventListScreen {
    state: ListState,
}

impl Default for EventListScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl EventListScreen {
    pub fn new() -> Self {
        Self {
            state: ListState::Loading,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn events(&self) -> &[Event] {
        match &self.state {
            ListState::Loaded(events) => events.as_slice(),
            _ => &[],
        }
    }

    /// Read the whole collection, soonest first
    pub async fn load(&mut self, ctx: &AppContext) -> &ListState {
        self.state = ListState::Loading;

        let documents = match ctx.store.list_documents(EVENTS_COLLECTION).await {
            Ok(documents) => documents,
            Err(e) => {
                error!("Error fetching events: {}", e);
                self.state = ListState::Failed;
                return &self.state;
            }
        };

        let mut events: Vec<Event> = documents
            .iter()
            .filter_map(|document| match document.decode::<Event>() {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Skipping event {}: {}", document.id, e);
                    None
                }
            })
            .collect();

        let tz = ctx
            .display_settings()
            .await
            .map(|settings| settings.timezone)
            .unwrap_or(Tz::UTC);
        sort_by_date(&mut events, tz);

        self.state = ListState::Loaded(events);
        &self.state
    }

    /// Push the detail route of a listed event. Accepts an id or a 1-based position.
    pub async fn open(&self, ctx: &AppContext, selector: &str) -> Option<Route> {
        let events = self.events();
        let event = events
            .iter()
            .find(|event| event.id == selector)
            .or_else(|| {
                selector
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| events.get(index))
            })?;

        let route = Route::EventDetail(event.id.clone());
        ctx.navigator.write().await.push(route.clone());
        Some(route)
    }

    pub async fn create(&self, ctx: &AppContext) {
        ctx.navigator.write().await.push(Route::CreateEvent);
    }

    pub fn render(&self, settings: &DisplaySettings) -> String {
        match &self.state {
            ListState::Loading => t!("loading").to_string(),
            ListState::Failed => t!("events_load_failed").to_string(),
            ListState::Loaded(events) if events.is_empty() => {
                format!("{}\n\n{}", t!("events_title"), t!("events_empty"))
            }
            ListState::Loaded(events) => {
                let mut lines = vec![t!("events_title").to_string(), String::new()];
                for (index, event) in events.iter().enumerate() {
                    let date = event
                        .formatted_date(settings)
                        .unwrap_or_else(|| t!("invalid_date").to_string());
                    lines.push(format!(
                        "{:>3}. {}  ({}, {})  [{}]",
                        index + 1,
                        event.title,
                        date,
                        event.location,
                        event.id
                    ));
                }
                lines.join("\n")
            }
        }
    }
}

/// Ascending by date; unparseable dates go last, ties keep store order
fn sort_by_date(events: &mut [Event], tz: Tz) {
    events.sort_by(|a, b| {
        match (
            parse_event_datetime(&a.date, tz),
            parse_event_datetime(&b.date, tz),
        ) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}
