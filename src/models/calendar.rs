// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar record and scheduler event descriptors.
//!
//! Field names follow the scheduler widget's JSON so the client can store
//! and reload its events verbatim.

use crate::time_utils::add_fifteen_minutes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Maximum number of events kept per user.
pub const MAX_EVENTS: u64 = 1000;

/// Per-user calendar document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCalendar {
    /// Strava athlete ID (also used as document ID)
    #[serde(rename = "UserID")]
    pub user_id: u64,
    /// Ordered event sequence, replaced wholesale on update
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    pub created_at: String,
    pub updated_at: String,
}

/// How an event repeats. Serialized as the scheduler's integer code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EventRepetition {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Annually,
    Weekday,
}

impl TryFrom<u8> for EventRepetition {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => EventRepetition::None,
            1 => EventRepetition::Daily,
            2 => EventRepetition::Weekly,
            3 => EventRepetition::Biweekly,
            4 => EventRepetition::Monthly,
            5 => EventRepetition::Annually,
            6 => EventRepetition::Weekday,
            other => return Err(format!("unknown repetition code {other}")),
        })
    }
}

impl From<EventRepetition> for u8 {
    fn from(repeat: EventRepetition) -> Self {
        match repeat {
            EventRepetition::None => 0,
            EventRepetition::Daily => 1,
            EventRepetition::Weekly => 2,
            EventRepetition::Biweekly => 3,
            EventRepetition::Monthly => 4,
            EventRepetition::Annually => 5,
            EventRepetition::Weekday => 6,
        }
    }
}

/// Named calendar (category) an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTag {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// The scheduler accepts either one calendar or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalendarRef {
    One(CalendarTag),
    Many(Vec<CalendarTag>),
}

impl CalendarRef {
    pub fn tags(&self) -> &[CalendarTag] {
        match self {
            CalendarRef::One(tag) => std::slice::from_ref(tag),
            CalendarRef::Many(tags) => tags,
        }
    }
}

/// Display style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EventStyle {
    #[serde(
        rename = "backgroundColor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(custom(function = "validate_color"))]
    pub background_color: Option<String>,
}

/// Un-repeated occurrence an expanded repeating event was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOccurrence {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub calendar: CalendarRef,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EventStyle>,
}

/// One scheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_event"))]
pub struct CalendarEvent {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub from: DateTime<Utc>,
    /// Defaults to 15 minutes after `from`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repeat: EventRepetition,
    pub calendar: CalendarRef,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub style: Option<EventStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Box<EventOccurrence>>,
}

impl CalendarEvent {
    /// Fill in the default end time when the client omitted it.
    pub fn with_default_end(mut self) -> Self {
        if self.to.is_none() {
            self.to = Some(add_fifteen_minutes(self.from));
        }
        self
    }
}

fn validate_event(event: &CalendarEvent) -> Result<(), ValidationError> {
    if event.to.is_some_and(|to| to < event.from) {
        return Err(ValidationError::new("end_before_start"));
    }
    if event.calendar.tags().iter().any(|tag| tag.name.trim().is_empty()) {
        return Err(ValidationError::new("empty_calendar_name"));
    }
    Ok(())
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| ValidationError::new("color_format"))?;
    let valid_len = matches!(hex.len(), 3 | 6);
    if !valid_len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new("color_format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_json() -> serde_json::Value {
        json!({
            "name": "Tempo run",
            "from": "2024-01-15T10:00:00Z",
            "to": "2024-01-15T11:00:00Z",
            "repeat": 2,
            "calendar": {"name": "Training", "enabled": true},
            "is_current": false,
            "style": {"backgroundColor": "#ff8800"}
        })
    }

    #[test]
    fn test_event_json_shape_preserved() {
        let event: CalendarEvent = serde_json::from_value(event_json()).unwrap();
        assert_eq!(event.repeat, EventRepetition::Weekly);
        assert!(event.validate().is_ok());

        assert_eq!(serde_json::to_value(&event).unwrap(), event_json());
    }

    #[test]
    fn test_calendar_list_shape_preserved() {
        let mut value = event_json();
        value["calendar"] = json!([
            {"name": "Training", "enabled": true},
            {"name": "Races", "enabled": false}
        ]);

        let event: CalendarEvent = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(event.calendar.tags().len(), 2);
        assert_eq!(serde_json::to_value(&event).unwrap(), value);
    }

    #[test]
    fn test_unknown_repetition_code_rejected() {
        let mut value = event_json();
        value["repeat"] = json!(9);
        assert!(serde_json::from_value::<CalendarEvent>(value).is_err());
    }

    #[test]
    fn test_missing_end_defaults_to_fifteen_minutes() {
        let mut value = event_json();
        value.as_object_mut().unwrap().remove("to");

        let event: CalendarEvent = serde_json::from_value(value).unwrap();
        let event = event.with_default_end();
        assert_eq!(
            event.to.unwrap().to_rfc3339(),
            "2024-01-15T10:15:00+00:00"
        );
    }

    #[test]
    fn test_end_before_start_invalid() {
        let mut value = event_json();
        value["to"] = json!("2024-01-15T09:00:00Z");
        let event: CalendarEvent = serde_json::from_value(value).unwrap();
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_bad_color_invalid() {
        let mut value = event_json();
        value["style"] = json!({"backgroundColor": "red; background: url(x)"});
        let event: CalendarEvent = serde_json::from_value(value).unwrap();
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_empty_name_invalid() {
        let mut value = event_json();
        value["name"] = json!("");
        let event: CalendarEvent = serde_json::from_value(value).unwrap();
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_calendar_record_uses_user_id_key() {
        let record = UserCalendar {
            user_id: 42,
            events: vec![],
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["UserID"], 42);
        assert_eq!(value["events"], json!([]));
    }
}
