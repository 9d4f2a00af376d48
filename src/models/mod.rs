pub mod event;

pub use event::{DraftField, Event, EventDraft, EVENTS_COLLECTION};
