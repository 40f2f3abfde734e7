//! Activity cascade across the sport → event → selection hierarchy.

use crate::store::{CatalogError, EventStore, SelectionStore, SportStore};

/// Propagates deactivation up the hierarchy.
///
/// Runs synchronously as a side effect of an explicit deactivation: when a
/// selection goes inactive and its event has no active selections left, the
/// event is deactivated; the same rule then applies from the event to its
/// sport. Each parent is deactivated at most once per trigger, and a parent
/// with at least one active child is left untouched.
///
/// The count-then-act sequence is deliberately not transactional: a sibling
/// activated concurrently between the count read and the parent write can
/// leave the parent inactive despite having an active child. The cascade is
/// best-effort — it does not run on bulk import or initial load, and it
/// performs no compensation.
///
/// The coordinator never writes a table directly; every mutation goes
/// through the owning store's `set_inactive`.
pub struct CascadeCoordinator<'a, S, E, L> {
    sports: &'a S,
    events: &'a E,
    selections: &'a L,
}

impl<'a, S, E, L> CascadeCoordinator<'a, S, E, L>
where
    S: SportStore,
    E: EventStore,
    L: SelectionStore,
{
    pub fn new(sports: &'a S, events: &'a E, selections: &'a L) -> Self {
        Self {
            sports,
            events,
            selections,
        }
    }

    /// Selection branch: re-count the owning event's active selections and
    /// deactivate the event when none remain, then evaluate the event→sport
    /// branch.
    pub async fn on_selection_deactivated(&self, selection_id: i32) -> Result<(), CatalogError> {
        let event_id = self.selections.parent_event_id(selection_id).await?;
        let active = self.selections.count_active_for_event(event_id).await?;
        tracing::debug!(selection_id, event_id, active, "cascade recount");
        if active == 0 {
            self.events.set_inactive(event_id).await?;
            tracing::info!(event_id, "event deactivated: no active selections remain");
            self.on_event_deactivated(event_id).await?;
        }
        Ok(())
    }

    /// Event branch: re-count the owning sport's active events and deactivate
    /// the sport when none remain. Terminal either way.
    pub async fn on_event_deactivated(&self, event_id: i32) -> Result<(), CatalogError> {
        let sport_id = self.events.parent_sport_id(event_id).await?;
        let active = self.events.count_active_for_sport(sport_id).await?;
        tracing::debug!(event_id, sport_id, active, "cascade recount");
        if active == 0 {
            self.sports.set_inactive(sport_id).await?;
            tracing::info!(sport_id, "sport deactivated: no active events remain");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        EventStatus, EventType, NewEvent, NewSelection, NewSport, SelectionOutcome, SelectionPatch,
    };
    use crate::store::memory::MemoryDb;
    use chrono::{TimeZone, Utc};

    struct Fixture {
        db: MemoryDb,
        sport_id: i32,
        event_id: i32,
        selection_ids: Vec<i32>,
    }

    /// One sport, one event, `selections` active selections underneath.
    async fn fixture(selections: usize) -> Fixture {
        let db = MemoryDb::new();
        let sport = db
            .sports()
            .create(&NewSport {
                name: "Tennis".into(),
                active: true,
            })
            .await
            .unwrap();
        let event = db
            .events()
            .create(&NewEvent {
                name: "Final".into(),
                active: true,
                event_type: EventType::Inplay,
                sport_id: sport.id,
                status: EventStatus::Pending,
                scheduled_start: Utc.with_ymd_and_hms(2024, 7, 1, 14, 0, 0).unwrap(),
                actual_start: None,
            })
            .await
            .unwrap();
        let mut selection_ids = Vec::new();
        for i in 0..selections {
            let sel = db
                .selections()
                .create(&NewSelection {
                    name: format!("Selection {i}"),
                    event_id: event.id,
                    price: 2.0,
                    active: true,
                    outcome: SelectionOutcome::Unsettled,
                })
                .await
                .unwrap();
            selection_ids.push(sel.id);
        }
        Fixture {
            db,
            sport_id: sport.id,
            event_id: event.id,
            selection_ids,
        }
    }

    async fn deactivate_selection(db: &MemoryDb, id: i32) {
        db.selections()
            .update(
                id,
                &SelectionPatch {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn surviving_sibling_leaves_event_active() {
        let fx = fixture(2).await;
        let (sports, events, selections) = (fx.db.sports(), fx.db.events(), fx.db.selections());
        let cascade = CascadeCoordinator::new(&sports, &events, &selections);

        deactivate_selection(&fx.db, fx.selection_ids[0]).await;
        cascade
            .on_selection_deactivated(fx.selection_ids[0])
            .await
            .unwrap();

        let events = fx.db.events().get_all().await.unwrap();
        assert!(events[0].active);
        let sports = fx.db.sports().get_all().await.unwrap();
        assert!(sports[0].active);
    }

    #[tokio::test]
    async fn last_selection_deactivates_event_and_sport() {
        let fx = fixture(2).await;
        let (sports, events, selections) = (fx.db.sports(), fx.db.events(), fx.db.selections());
        let cascade = CascadeCoordinator::new(&sports, &events, &selections);

        for id in &fx.selection_ids {
            deactivate_selection(&fx.db, *id).await;
            cascade.on_selection_deactivated(*id).await.unwrap();
        }

        let events = fx.db.events().get_all().await.unwrap();
        assert!(!events[0].active);
        // The sport's only event went inactive, so the sport follows.
        let sports = fx.db.sports().get_all().await.unwrap();
        assert!(!sports[0].active);
    }

    #[tokio::test]
    async fn sibling_event_keeps_sport_active() {
        let fx = fixture(1).await;
        let (sports, events, selections) = (fx.db.sports(), fx.db.events(), fx.db.selections());
        fx.db
            .events()
            .create(&NewEvent {
                name: "Semi Final".into(),
                active: true,
                event_type: EventType::Preplay,
                sport_id: fx.sport_id,
                status: EventStatus::Pending,
                scheduled_start: Utc.with_ymd_and_hms(2024, 7, 2, 14, 0, 0).unwrap(),
                actual_start: None,
            })
            .await
            .unwrap();
        let cascade = CascadeCoordinator::new(&sports, &events, &selections);

        deactivate_selection(&fx.db, fx.selection_ids[0]).await;
        cascade
            .on_selection_deactivated(fx.selection_ids[0])
            .await
            .unwrap();

        let all_events = fx.db.events().get_all().await.unwrap();
        assert!(!all_events.iter().find(|e| e.id == fx.event_id).unwrap().active);
        let sports = fx.db.sports().get_all().await.unwrap();
        assert!(sports[0].active);
    }

    #[tokio::test]
    async fn event_branch_alone_deactivates_sport() {
        let fx = fixture(0).await;
        let (sports, events, selections) = (fx.db.sports(), fx.db.events(), fx.db.selections());
        let cascade = CascadeCoordinator::new(&sports, &events, &selections);

        fx.db.events().set_inactive(fx.event_id).await.unwrap();
        cascade.on_event_deactivated(fx.event_id).await.unwrap();

        let sports = fx.db.sports().get_all().await.unwrap();
        assert!(!sports[0].active);
    }

    #[tokio::test]
    async fn unknown_selection_propagates_typed_error() {
        let fx = fixture(0).await;
        let (sports, events, selections) = (fx.db.sports(), fx.db.events(), fx.db.selections());
        let cascade = CascadeCoordinator::new(&sports, &events, &selections);

        let err = cascade.on_selection_deactivated(999).await.unwrap_err();
        assert!(matches!(err, CatalogError::Update(_)));
    }
}
