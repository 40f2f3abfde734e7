//! Service layer: catalog operations plus the cascade hook.
//!
//! [`Catalog`] owns the three stores and wires the
//! [`CascadeCoordinator`] into every mutation that can deactivate an entity.
//! Stores stay single-table; all cross-table behavior lives here.

mod cascade;

pub use cascade::CascadeCoordinator;

use chrono::Utc;

use crate::model::{
    Event, EventFilter, EventPatch, FilterMatch, NewEvent, NewSelection, NewSport, Selection,
    SelectionFilter, SelectionPatch, Sport, SportFilter, SportPatch,
};
use crate::store::{CatalogError, EventStore, SelectionStore, SportStore};

/// The catalog service over a sport/event/selection store triple.
///
/// Generic over the store traits so the same orchestration runs against the
/// Postgres repositories in production and the in-memory backend in tests.
pub struct Catalog<S, E, L> {
    sports: S,
    events: E,
    selections: L,
}

impl<S, E, L> Catalog<S, E, L>
where
    S: SportStore,
    E: EventStore,
    L: SelectionStore,
{
    pub fn new(sports: S, events: E, selections: L) -> Self {
        Self {
            sports,
            events,
            selections,
        }
    }

    fn cascade(&self) -> CascadeCoordinator<'_, S, E, L> {
        CascadeCoordinator::new(&self.sports, &self.events, &self.selections)
    }

    // ── Sports ─────────────────────────────────────────────────────────

    pub async fn sports(&self) -> Result<Vec<Sport>, CatalogError> {
        self.sports.get_all().await
    }

    pub async fn create_sport(&self, sport: &NewSport) -> Result<Sport, CatalogError> {
        tracing::info!(name = %sport.name, "creating sport");
        self.sports.create(sport).await
    }

    /// Direct sport updates do not cascade; deactivation only propagates
    /// upward, never down to events or selections.
    pub async fn update_sport(&self, id: i32, patch: &SportPatch) -> Result<Sport, CatalogError> {
        tracing::info!(id, "updating sport");
        self.sports.update(id, patch).await
    }

    pub async fn filter_sports(&self, filter: &SportFilter) -> Result<Vec<FilterMatch>, CatalogError> {
        self.sports.filter(filter).await
    }

    // ── Events ─────────────────────────────────────────────────────────

    pub async fn events(&self) -> Result<Vec<Event>, CatalogError> {
        self.events.get_all().await
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<Event, CatalogError> {
        tracing::info!(name = %event.name, sport_id = event.sport_id, "creating event");
        self.events.create(event).await
    }

    /// Update an event. A status transition to `Started` stamps
    /// `actual_start` in the same statement; setting `active = false` runs
    /// the event→sport cascade after the write.
    pub async fn update_event(&self, id: i32, patch: &EventPatch) -> Result<Event, CatalogError> {
        let mut patch = patch.clone();
        patch.stamp_actual_start(Utc::now());

        tracing::info!(id, "updating event");
        let event = self.events.update(id, &patch).await?;

        if patch.active == Some(false) {
            self.cascade().on_event_deactivated(id).await?;
        }
        Ok(event)
    }

    pub async fn filter_events(&self, filter: &EventFilter) -> Result<Vec<FilterMatch>, CatalogError> {
        self.events.filter(filter).await
    }

    // ── Selections ─────────────────────────────────────────────────────

    pub async fn selections(&self) -> Result<Vec<Selection>, CatalogError> {
        self.selections.get_all().await
    }

    pub async fn create_selection(
        &self,
        selection: &NewSelection,
    ) -> Result<Selection, CatalogError> {
        tracing::info!(name = %selection.name, event_id = selection.event_id, "creating selection");
        self.selections.create(selection).await
    }

    /// Update a selection. Setting `active = false` runs the full
    /// selection→event→sport cascade after the write.
    pub async fn update_selection(
        &self,
        id: i32,
        patch: &SelectionPatch,
    ) -> Result<Selection, CatalogError> {
        tracing::info!(id, "updating selection");
        let selection = self.selections.update(id, patch).await?;

        if patch.active == Some(false) {
            self.cascade().on_selection_deactivated(id).await?;
        }
        Ok(selection)
    }

    pub async fn filter_selections(
        &self,
        filter: &SelectionFilter,
    ) -> Result<Vec<Selection>, CatalogError> {
        self.selections.filter(filter).await
    }

    pub async fn selections_by_event(&self, event_id: i32) -> Result<Vec<Selection>, CatalogError> {
        self.selections.list_by_event(event_id).await
    }

    pub async fn selections_by_sport(&self, sport_id: i32) -> Result<Vec<Selection>, CatalogError> {
        self.selections.list_by_sport(sport_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventStatus, EventType, SelectionOutcome};
    use crate::store::memory::{MemoryDb, MemoryEventStore, MemorySelectionStore, MemorySportStore};
    use chrono::{TimeZone, Utc};

    fn catalog(db: &MemoryDb) -> Catalog<MemorySportStore, MemoryEventStore, MemorySelectionStore> {
        Catalog::new(db.sports(), db.events(), db.selections())
    }

    fn deactivate() -> SelectionPatch {
        SelectionPatch {
            active: Some(false),
            ..Default::default()
        }
    }

    /// The full scenario from the service contract: a sport with one event
    /// and two selections goes inactive only when the last selection does.
    #[tokio::test]
    async fn end_to_end_cascade_scenario() {
        let db = MemoryDb::new();
        let catalog = catalog(&db);

        let tennis = catalog
            .create_sport(&NewSport {
                name: "Tennis".into(),
                active: true,
            })
            .await
            .unwrap();
        assert_eq!(tennis.slug, "tennis");

        let final_match = catalog
            .create_event(&NewEvent {
                name: "Final".into(),
                active: true,
                event_type: EventType::Inplay,
                sport_id: tennis.id,
                status: EventStatus::Pending,
                scheduled_start: Utc.with_ymd_and_hms(2024, 7, 14, 14, 0, 0).unwrap(),
                actual_start: None,
            })
            .await
            .unwrap();
        assert_eq!(final_match.slug, "final");
        assert!(final_match.active);

        let mut selection_ids = Vec::new();
        for name in ["Player One", "Player Two"] {
            let sel = catalog
                .create_selection(&NewSelection {
                    name: name.into(),
                    event_id: final_match.id,
                    price: 1.91,
                    active: true,
                    outcome: SelectionOutcome::Unsettled,
                })
                .await
                .unwrap();
            selection_ids.push(sel.id);
        }

        // First deactivation: one active selection remains, event untouched.
        catalog
            .update_selection(selection_ids[0], &deactivate())
            .await
            .unwrap();
        let events = catalog.events().await.unwrap();
        assert!(events[0].active);

        // Second deactivation: event goes inactive, and with it the sport's
        // only active event, so the sport follows.
        catalog
            .update_selection(selection_ids[1], &deactivate())
            .await
            .unwrap();
        let events = catalog.events().await.unwrap();
        assert!(!events[0].active);
        let sports = catalog.sports().await.unwrap();
        assert!(!sports[0].active);
    }

    #[tokio::test]
    async fn reactivation_does_not_cascade() {
        let db = MemoryDb::new();
        let catalog = catalog(&db);
        let sport = catalog
            .create_sport(&NewSport {
                name: "Golf".into(),
                active: true,
            })
            .await
            .unwrap();
        let event = catalog
            .create_event(&NewEvent {
                name: "Open".into(),
                active: true,
                event_type: EventType::Preplay,
                sport_id: sport.id,
                status: EventStatus::Pending,
                scheduled_start: Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap(),
                actual_start: None,
            })
            .await
            .unwrap();
        let sel = catalog
            .create_selection(&NewSelection {
                name: "Winner".into(),
                event_id: event.id,
                price: 3.2,
                active: false,
                outcome: SelectionOutcome::Unsettled,
            })
            .await
            .unwrap();

        // active: Some(true) must not trigger any recount.
        catalog
            .update_selection(
                sel.id,
                &SelectionPatch {
                    active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(catalog.events().await.unwrap()[0].active);
    }

    #[tokio::test]
    async fn update_event_to_started_stamps_actual_start() {
        let db = MemoryDb::new();
        let catalog = catalog(&db);
        let sport = catalog
            .create_sport(&NewSport {
                name: "Boxing".into(),
                active: true,
            })
            .await
            .unwrap();
        let event = catalog
            .create_event(&NewEvent {
                name: "Title Fight".into(),
                active: true,
                event_type: EventType::Inplay,
                sport_id: sport.id,
                status: EventStatus::Pending,
                scheduled_start: Utc.with_ymd_and_hms(2024, 9, 1, 20, 0, 0).unwrap(),
                actual_start: None,
            })
            .await
            .unwrap();
        assert!(event.actual_start.is_none());

        let updated = catalog
            .update_event(
                event.id,
                &EventPatch {
                    status: Some(EventStatus::Started),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, EventStatus::Started);
        assert!(updated.actual_start.is_some());
    }

    #[tokio::test]
    async fn deactivating_event_directly_cascades_to_sport() {
        let db = MemoryDb::new();
        let catalog = catalog(&db);
        let sport = catalog
            .create_sport(&NewSport {
                name: "Cycling".into(),
                active: true,
            })
            .await
            .unwrap();
        let event = catalog
            .create_event(&NewEvent {
                name: "Tour".into(),
                active: true,
                event_type: EventType::Preplay,
                sport_id: sport.id,
                status: EventStatus::Pending,
                scheduled_start: Utc.with_ymd_and_hms(2024, 7, 1, 11, 0, 0).unwrap(),
                actual_start: None,
            })
            .await
            .unwrap();

        catalog
            .update_event(
                event.id,
                &EventPatch {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!catalog.sports().await.unwrap()[0].active);
    }

    #[tokio::test]
    async fn foreign_key_violation_is_typed() {
        let db = MemoryDb::new();
        let catalog = catalog(&db);
        let err = catalog
            .create_selection(&NewSelection {
                name: "Orphan".into(),
                event_id: 12345,
                price: 2.0,
                active: true,
                outcome: SelectionOutcome::Unsettled,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ForeignKey(_)));
    }
}
