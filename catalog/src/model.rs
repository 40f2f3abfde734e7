//! Domain rows, enum codecs and mutation/filter payloads.
//!
//! Enum columns are stored as lowercase `TEXT` in the schema and round-tripped
//! through `as_str`/`FromStr`; the stores never persist the Rust wrapper.
//! Patch types render only the fields that are present — `None` fields are
//! dropped before any SET clause is built.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::SqlValue;
use crate::store::CatalogError;

// ── Enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Preplay,
    Inplay,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Preplay => "preplay",
            EventType::Inplay => "inplay",
        }
    }
}

impl FromStr for EventType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preplay" => Ok(EventType::Preplay),
            "inplay" => Ok(EventType::Inplay),
            other => Err(CatalogError::Validation(format!(
                "unknown event type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Started,
    Ended,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Started => "started",
            EventStatus::Ended => "ended",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for EventStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "started" => Ok(EventStatus::Started),
            "ended" => Ok(EventStatus::Ended),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(CatalogError::Validation(format!(
                "unknown event status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOutcome {
    Unsettled,
    Void,
    Lose,
    Win,
}

impl SelectionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionOutcome::Unsettled => "unsettled",
            SelectionOutcome::Void => "void",
            SelectionOutcome::Lose => "lose",
            SelectionOutcome::Win => "win",
        }
    }
}

impl FromStr for SelectionOutcome {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsettled" => Ok(SelectionOutcome::Unsettled),
            "void" => Ok(SelectionOutcome::Void),
            "lose" => Ok(SelectionOutcome::Lose),
            "win" => Ok(SelectionOutcome::Win),
            other => Err(CatalogError::Validation(format!(
                "unknown selection outcome '{other}'"
            ))),
        }
    }
}

// ── Persisted rows ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub active: bool,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub sport_id: i32,
    pub status: EventStatus,
    pub scheduled_start: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub id: i32,
    pub name: String,
    pub event_id: i32,
    pub price: f64,
    pub active: bool,
    pub outcome: SelectionOutcome,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Creation payloads ──────────────────────────────────────────────────

/// Payload for creating a sport. The slug is derived from `name` by the
/// store at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSport {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub active: bool,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub sport_id: i32,
    pub status: EventStatus,
    pub scheduled_start: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSelection {
    pub name: String,
    pub event_id: i32,
    pub price: f64,
    pub active: bool,
    pub outcome: SelectionOutcome,
}

// ── Sparse update payloads ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SportPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl SportPatch {
    /// Render the present fields as `(column, value)` pairs, dropping `None`s.
    pub fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        if let Some(name) = &self.name {
            cols.push(("name", SqlValue::from(name.as_str())));
        }
        if let Some(active) = self.active {
            cols.push(("active", SqlValue::Bool(active)));
        }
        cols
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
}

impl EventPatch {
    /// Stamp `actual_start` when the patch transitions the event to
    /// [`EventStatus::Started`] and no explicit value was supplied. Must run
    /// before the patch is rendered so the stamp lands in the same UPDATE.
    pub fn stamp_actual_start(&mut self, now: DateTime<Utc>) {
        if self.status == Some(EventStatus::Started) && self.actual_start.is_none() {
            self.actual_start = Some(now);
        }
    }

    pub fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        if let Some(name) = &self.name {
            cols.push(("name", SqlValue::from(name.as_str())));
        }
        if let Some(active) = self.active {
            cols.push(("active", SqlValue::Bool(active)));
        }
        if let Some(event_type) = self.event_type {
            cols.push(("type", SqlValue::from(event_type.as_str())));
        }
        if let Some(status) = self.status {
            cols.push(("status", SqlValue::from(status.as_str())));
        }
        if let Some(scheduled_start) = self.scheduled_start {
            cols.push(("scheduled_start", SqlValue::Timestamp(scheduled_start)));
        }
        if let Some(actual_start) = self.actual_start {
            cols.push(("actual_start", SqlValue::Timestamp(actual_start)));
        }
        cols
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub active: Option<bool>,
    pub outcome: Option<SelectionOutcome>,
}

impl SelectionPatch {
    pub fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        let mut cols = Vec::new();
        if let Some(name) = &self.name {
            cols.push(("name", SqlValue::from(name.as_str())));
        }
        if let Some(price) = self.price {
            cols.push(("price", SqlValue::Float(price)));
        }
        if let Some(active) = self.active {
            cols.push(("active", SqlValue::Bool(active)));
        }
        if let Some(outcome) = self.outcome {
            cols.push(("outcome", SqlValue::from(outcome.as_str())));
        }
        cols
    }
}

// ── Filter criteria ────────────────────────────────────────────────────

/// Criteria for filtering sports by their active events.
///
/// All dimensions are optional; the assembler appends a clause per present
/// field. `threshold` is the minimum count of active child events a sport
/// must exceed (strict greater-than) and defaults to 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SportFilter {
    pub name_regex: Option<String>,
    pub active: Option<bool>,
    pub threshold: Option<i64>,
    pub start_time_from: Option<DateTime<Utc>>,
    pub start_time_to: Option<DateTime<Utc>>,
}

/// Criteria for filtering events by their active selections. The time window
/// applies to the event's own `scheduled_start`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub name_regex: Option<String>,
    pub active: Option<bool>,
    pub threshold: Option<i64>,
    pub start_time_from: Option<DateTime<Utc>>,
    pub start_time_to: Option<DateTime<Utc>>,
}

/// Criteria for the flat selections filter (no child aggregation).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionFilter {
    pub name_regex: Option<String>,
    pub active: Option<bool>,
}

/// One row of a sports/events filter result: the parent's identity columns
/// plus `threshold`, the count of active children (0 for rows matched only
/// by the time window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMatch {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub active: bool,
    pub threshold: i64,
}
