use crate::error::{validation_error, AppResult};
use crate::utils::time::{format_event_date, is_valid_event_date, DisplaySettings};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Collection holding event documents
pub const EVENTS_COLLECTION: &str = "events";

/// Stored field names
pub mod fields {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const DATE: &str = "date";
    pub const LOCATION: &str = "location";
    pub const CREATED_BY: &str = "createdBy";
    pub const CREATED_AT: &str = "createdAt";
    pub const ATTENDEES: &str = "attendees";
}

/// A community event as stored in the `events` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_by: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attendees: Vec<String>,
}

impl Event {
    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }

    /// Whether `uid` is the creator. Without a session this is always false.
    pub fn is_created_by(&self, uid: Option<&str>) -> bool {
        uid.is_some_and(|uid| self.created_by == uid)
    }

    /// Display date, or `None` when the stored date cannot be parsed
    pub fn formatted_date(&self, settings: &DisplaySettings) -> Option<String> {
        format_event_date(&self.date, settings)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fields a user can edit on the event form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    Date,
    Location,
}

impl FromStr for DraftField {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" | "titulo" | "título" => Ok(DraftField::Title),
            "description" | "descripcion" | "descripción" => Ok(DraftField::Description),
            "date" | "fecha" => Ok(DraftField::Date),
            "location" | "lugar" | "ubicacion" | "ubicación" => Ok(DraftField::Location),
            other => Err(validation_error(&format!("Unknown field: {}", other))),
        }
    }
}

/// Editable part of an event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
}

impl EventDraft {
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date.clone(),
            location: event.location.clone(),
        }
    }

    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Title => self.title = value,
            DraftField::Description => self.description = value,
            DraftField::Date => self.date = value,
            DraftField::Location => self.location = value,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(validation_error("title is required"));
        }
        if self.location.trim().is_empty() {
            return Err(validation_error("location is required"));
        }
        if !is_valid_event_date(&self.date) {
            return Err(validation_error(&format!("invalid date: {}", self.date)));
        }
        Ok(())
    }

    /// The four editable fields, as written by an edit
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(fields::TITLE.to_string(), Value::String(self.title.trim().to_string()));
        map.insert(
            fields::DESCRIPTION.to_string(),
            Value::String(self.description.trim().to_string()),
        );
        map.insert(fields::DATE.to_string(), Value::String(self.date.trim().to_string()));
        map.insert(
            fields::LOCATION.to_string(),
            Value::String(self.location.trim().to_string()),
        );
        map
    }

    /// Full document for a new event created by `created_by`
    pub fn to_new_event_fields(&self, created_by: &str, created_at: &str) -> Map<String, Value> {
        let mut map = self.to_fields();
        map.insert(fields::CREATED_BY.to_string(), Value::String(created_by.to_string()));
        map.insert(fields::CREATED_AT.to_string(), Value::String(created_at.to_string()));
        map.insert(fields::ATTENDEES.to_string(), Value::Array(Vec::new()));
        map
    }
}
