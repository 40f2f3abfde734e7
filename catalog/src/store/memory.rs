//! In-memory store implementations.
//!
//! A second backend over the same traits as the Postgres repositories,
//! backed by shared `BTreeMap` tables behind an `RwLock`. It mirrors the SQL
//! semantics — foreign keys, slug uniqueness, regex name matching (Postgres
//! `~`), threshold aggregation and the time-window union — so the cascade
//! and service layers can be exercised without a live database.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::model::{
    Event, EventFilter, EventPatch, FilterMatch, NewEvent, NewSelection, NewSport, Selection,
    SelectionFilter, SelectionPatch, Sport, SportFilter, SportPatch,
};
use crate::slug::to_slug;
use crate::store::{CatalogError, EventStore, SelectionStore, SportStore};

#[derive(Default)]
struct Tables {
    sports: BTreeMap<i32, Sport>,
    events: BTreeMap<i32, Event>,
    selections: BTreeMap<i32, Selection>,
    next_sport_id: i32,
    next_event_id: i32,
    next_selection_id: i32,
}

/// Shared in-memory database. Clone-cheap; every store created from the same
/// handle sees the same tables.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sports(&self) -> MemorySportStore {
        MemorySportStore { db: self.clone() }
    }

    pub fn events(&self) -> MemoryEventStore {
        MemoryEventStore { db: self.clone() }
    }

    pub fn selections(&self) -> MemorySelectionStore {
        MemorySelectionStore { db: self.clone() }
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, CatalogError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(f(&tables))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, CatalogError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(f(&mut tables))
    }
}

fn compile_regex(pattern: &str) -> Result<regex::Regex, CatalogError> {
    // Matches the Postgres behavior: a malformed pattern is an execution-time
    // database error, not a validation failure.
    regex::Regex::new(pattern).map_err(|e| CatalogError::Database(e.to_string()))
}

fn in_window(
    ts: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    from.is_none_or(|f| ts >= f) && to.is_none_or(|t| ts <= t)
}

pub struct MemorySportStore {
    db: MemoryDb,
}

impl SportStore for MemorySportStore {
    async fn get_all(&self) -> Result<Vec<Sport>, CatalogError> {
        self.db.read(|t| t.sports.values().cloned().collect())
    }

    async fn create(&self, sport: &NewSport) -> Result<Sport, CatalogError> {
        let slug = to_slug(&sport.name)?;
        self.db.write(|t| {
            if t.sports.values().any(|s| s.slug == slug) {
                return Err(CatalogError::Database(format!(
                    "duplicate key value violates unique constraint on sports.slug ('{slug}')"
                )));
            }
            t.next_sport_id += 1;
            let now = Utc::now();
            let row = Sport {
                id: t.next_sport_id,
                name: sport.name.clone(),
                slug,
                active: sport.active,
                created_at: now,
                updated_at: now,
            };
            t.sports.insert(row.id, row.clone());
            Ok(row)
        })?
    }

    async fn update(&self, id: i32, patch: &SportPatch) -> Result<Sport, CatalogError> {
        if patch.columns().is_empty() {
            return Err(CatalogError::Configuration(
                "update query requires SET data".into(),
            ));
        }
        self.db.write(|t| {
            let row = t
                .sports
                .get_mut(&id)
                .ok_or_else(|| CatalogError::Update(format!("sport {id} not found")))?;
            if let Some(name) = &patch.name {
                row.name = name.clone();
            }
            if let Some(active) = patch.active {
                row.active = active;
            }
            Ok(row.clone())
        })?
    }

    async fn set_inactive(&self, id: i32) -> Result<(), CatalogError> {
        self.db.write(|t| {
            let row = t
                .sports
                .get_mut(&id)
                .ok_or_else(|| CatalogError::Update(format!("sport {id} not found")))?;
            row.active = false;
            Ok(())
        })?
    }

    async fn filter(&self, filter: &SportFilter) -> Result<Vec<FilterMatch>, CatalogError> {
        let name_regex = filter
            .name_regex
            .as_deref()
            .map(compile_regex)
            .transpose()?;
        let threshold = filter.threshold.unwrap_or(1);
        let windowed = filter.start_time_from.is_some() || filter.start_time_to.is_some();

        self.db.read(|t| {
            let mut matches: Vec<FilterMatch> = Vec::new();
            for sport in t.sports.values() {
                if let Some(re) = &name_regex {
                    if !re.is_match(&sport.name) {
                        continue;
                    }
                }
                if let Some(active) = filter.active {
                    if sport.active != active {
                        continue;
                    }
                }
                let count = t
                    .events
                    .values()
                    .filter(|e| e.sport_id == sport.id && e.active)
                    .count() as i64;
                if count > threshold {
                    matches.push(FilterMatch {
                        id: sport.id,
                        name: sport.name.clone(),
                        slug: sport.slug.clone(),
                        active: sport.active,
                        threshold: count,
                    });
                }
            }

            if windowed {
                for sport in t.sports.values() {
                    if matches.iter().any(|m| m.id == sport.id) {
                        continue;
                    }
                    let hit = t.events.values().any(|e| {
                        e.sport_id == sport.id
                            && in_window(
                                e.scheduled_start,
                                filter.start_time_from,
                                filter.start_time_to,
                            )
                    });
                    if hit {
                        matches.push(FilterMatch {
                            id: sport.id,
                            name: sport.name.clone(),
                            slug: sport.slug.clone(),
                            active: sport.active,
                            threshold: 0,
                        });
                    }
                }
            }

            matches.sort_by_key(|m| m.id);
            matches
        })
    }
}

pub struct MemoryEventStore {
    db: MemoryDb,
}

impl EventStore for MemoryEventStore {
    async fn get_all(&self) -> Result<Vec<Event>, CatalogError> {
        self.db.read(|t| t.events.values().cloned().collect())
    }

    async fn create(&self, event: &NewEvent) -> Result<Event, CatalogError> {
        let slug = to_slug(&event.name)?;
        self.db.write(|t| {
            if !t.sports.contains_key(&event.sport_id) {
                return Err(CatalogError::ForeignKey(format!(
                    "events.sport_id references missing sport {}",
                    event.sport_id
                )));
            }
            if t.events.values().any(|e| e.slug == slug) {
                return Err(CatalogError::Database(format!(
                    "duplicate key value violates unique constraint on events.slug ('{slug}')"
                )));
            }
            t.next_event_id += 1;
            let now = Utc::now();
            let row = Event {
                id: t.next_event_id,
                name: event.name.clone(),
                slug,
                active: event.active,
                event_type: event.event_type,
                sport_id: event.sport_id,
                status: event.status,
                scheduled_start: event.scheduled_start,
                actual_start: event.actual_start,
                created_at: now,
                updated_at: now,
            };
            t.events.insert(row.id, row.clone());
            Ok(row)
        })?
    }

    async fn update(&self, id: i32, patch: &EventPatch) -> Result<Event, CatalogError> {
        if patch.columns().is_empty() {
            return Err(CatalogError::Configuration(
                "update query requires SET data".into(),
            ));
        }
        self.db.write(|t| {
            let row = t
                .events
                .get_mut(&id)
                .ok_or_else(|| CatalogError::Update(format!("event {id} not found")))?;
            if let Some(name) = &patch.name {
                row.name = name.clone();
            }
            if let Some(active) = patch.active {
                row.active = active;
            }
            if let Some(event_type) = patch.event_type {
                row.event_type = event_type;
            }
            if let Some(status) = patch.status {
                row.status = status;
            }
            if let Some(scheduled_start) = patch.scheduled_start {
                row.scheduled_start = scheduled_start;
            }
            if let Some(actual_start) = patch.actual_start {
                row.actual_start = Some(actual_start);
            }
            Ok(row.clone())
        })?
    }

    async fn set_inactive(&self, id: i32) -> Result<(), CatalogError> {
        self.db.write(|t| {
            let row = t
                .events
                .get_mut(&id)
                .ok_or_else(|| CatalogError::Update(format!("event {id} not found")))?;
            row.active = false;
            Ok(())
        })?
    }

    async fn filter(&self, filter: &EventFilter) -> Result<Vec<FilterMatch>, CatalogError> {
        let name_regex = filter
            .name_regex
            .as_deref()
            .map(compile_regex)
            .transpose()?;
        let threshold = filter.threshold.unwrap_or(1);
        let windowed = filter.start_time_from.is_some() || filter.start_time_to.is_some();

        self.db.read(|t| {
            let mut matches: Vec<FilterMatch> = Vec::new();
            for event in t.events.values() {
                if let Some(re) = &name_regex {
                    if !re.is_match(&event.name) {
                        continue;
                    }
                }
                if let Some(active) = filter.active {
                    if event.active != active {
                        continue;
                    }
                }
                let count = t
                    .selections
                    .values()
                    .filter(|s| s.event_id == event.id && s.active)
                    .count() as i64;
                if count > threshold {
                    matches.push(FilterMatch {
                        id: event.id,
                        name: event.name.clone(),
                        slug: event.slug.clone(),
                        active: event.active,
                        threshold: count,
                    });
                }
            }

            if windowed {
                for event in t.events.values() {
                    if matches.iter().any(|m| m.id == event.id) {
                        continue;
                    }
                    if in_window(
                        event.scheduled_start,
                        filter.start_time_from,
                        filter.start_time_to,
                    ) {
                        matches.push(FilterMatch {
                            id: event.id,
                            name: event.name.clone(),
                            slug: event.slug.clone(),
                            active: event.active,
                            threshold: 0,
                        });
                    }
                }
            }

            matches.sort_by_key(|m| m.id);
            matches
        })
    }

    async fn count_active_for_sport(&self, sport_id: i32) -> Result<i64, CatalogError> {
        self.db.read(|t| {
            t.events
                .values()
                .filter(|e| e.sport_id == sport_id && e.active)
                .count() as i64
        })
    }

    async fn parent_sport_id(&self, event_id: i32) -> Result<i32, CatalogError> {
        self.db.read(|t| {
            t.events
                .get(&event_id)
                .map(|e| e.sport_id)
                .ok_or_else(|| CatalogError::Update(format!("event {event_id} not found")))
        })?
    }
}

pub struct MemorySelectionStore {
    db: MemoryDb,
}

impl SelectionStore for MemorySelectionStore {
    async fn get_all(&self) -> Result<Vec<Selection>, CatalogError> {
        self.db.read(|t| t.selections.values().cloned().collect())
    }

    async fn create(&self, selection: &NewSelection) -> Result<Selection, CatalogError> {
        self.db.write(|t| {
            if !t.events.contains_key(&selection.event_id) {
                return Err(CatalogError::ForeignKey(format!(
                    "selections.event_id references missing event {}",
                    selection.event_id
                )));
            }
            t.next_selection_id += 1;
            let now = Utc::now();
            let row = Selection {
                id: t.next_selection_id,
                name: selection.name.clone(),
                event_id: selection.event_id,
                price: selection.price,
                active: selection.active,
                outcome: selection.outcome,
                created_at: now,
                updated_at: now,
            };
            t.selections.insert(row.id, row.clone());
            Ok(row)
        })?
    }

    async fn update(&self, id: i32, patch: &SelectionPatch) -> Result<Selection, CatalogError> {
        if patch.columns().is_empty() {
            return Err(CatalogError::Configuration(
                "update query requires SET data".into(),
            ));
        }
        self.db.write(|t| {
            let row = t
                .selections
                .get_mut(&id)
                .ok_or_else(|| CatalogError::Update(format!("selection {id} not found")))?;
            if let Some(name) = &patch.name {
                row.name = name.clone();
            }
            if let Some(price) = patch.price {
                row.price = price;
            }
            if let Some(active) = patch.active {
                row.active = active;
            }
            if let Some(outcome) = patch.outcome {
                row.outcome = outcome;
            }
            Ok(row.clone())
        })?
    }

    async fn filter(&self, filter: &SelectionFilter) -> Result<Vec<Selection>, CatalogError> {
        let name_regex = filter
            .name_regex
            .as_deref()
            .map(compile_regex)
            .transpose()?;

        self.db.read(|t| {
            t.selections
                .values()
                .filter(|s| {
                    name_regex.as_ref().is_none_or(|re| re.is_match(&s.name))
                        && filter.active.is_none_or(|a| s.active == a)
                })
                .cloned()
                .collect()
        })
    }

    async fn count_active_for_event(&self, event_id: i32) -> Result<i64, CatalogError> {
        self.db.read(|t| {
            t.selections
                .values()
                .filter(|s| s.event_id == event_id && s.active)
                .count() as i64
        })
    }

    async fn parent_event_id(&self, selection_id: i32) -> Result<i32, CatalogError> {
        self.db.read(|t| {
            t.selections
                .get(&selection_id)
                .map(|s| s.event_id)
                .ok_or_else(|| CatalogError::Update(format!("selection {selection_id} not found")))
        })?
    }

    async fn list_by_event(&self, event_id: i32) -> Result<Vec<Selection>, CatalogError> {
        self.db.read(|t| {
            t.selections
                .values()
                .filter(|s| s.event_id == event_id)
                .cloned()
                .collect()
        })
    }

    async fn list_by_sport(&self, sport_id: i32) -> Result<Vec<Selection>, CatalogError> {
        self.db.read(|t| {
            t.selections
                .values()
                .filter(|s| {
                    t.events
                        .get(&s.event_id)
                        .is_some_and(|e| e.sport_id == sport_id)
                })
                .cloned()
                .collect()
        })
    }
}
