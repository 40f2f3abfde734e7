//! Postgres-backed repository for events.

use sqlx::PgPool;

use super::{bind_all, classify};
use crate::model::{Event, EventFilter, EventPatch, FilterMatch, NewEvent};
use crate::query::{events_filter_query, QueryBuilder, SqlValue};
use crate::slug::to_slug;
use crate::store::{CatalogError, EventStore};

/// Postgres implementation of [`EventStore`]. Owns all SQL construction and
/// execution for the `events` table.
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EventStore for PgEventRepository {
    async fn get_all(&self) -> Result<Vec<Event>, CatalogError> {
        let (sql, _) = QueryBuilder::new("events").build_query();
        sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn create(&self, event: &NewEvent) -> Result<Event, CatalogError> {
        let slug = to_slug(&event.name)?;
        let mut row = vec![
            ("name", SqlValue::from(event.name.as_str())),
            ("slug", SqlValue::from(slug)),
            ("active", SqlValue::Bool(event.active)),
            ("type", SqlValue::from(event.event_type.as_str())),
            ("sport_id", SqlValue::from(event.sport_id)),
            ("status", SqlValue::from(event.status.as_str())),
            ("scheduled_start", SqlValue::Timestamp(event.scheduled_start)),
        ];
        if let Some(actual_start) = event.actual_start {
            row.push(("actual_start", SqlValue::Timestamp(actual_start)));
        }

        let mut builder = QueryBuilder::new("events");
        builder.add_insert_data(row);
        let (sql, params) = builder
            .build_insert_query()
            .ok_or_else(|| CatalogError::Configuration("no insert data staged".into()))?;

        bind_all(sqlx::query_as::<_, Event>(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn update(&self, id: i32, patch: &EventPatch) -> Result<Event, CatalogError> {
        let mut builder = QueryBuilder::new("events");
        builder.add_condition("id", id);
        builder.add_update_data(patch.columns());
        let (sql, params) = builder.build_update_query()?;

        bind_all(sqlx::query_as::<_, Event>(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::Update(format!("event {id} not found")))
    }

    async fn set_inactive(&self, id: i32) -> Result<(), CatalogError> {
        let result = sqlx::query("UPDATE events SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::Update(format!("event {id} not found")));
        }
        Ok(())
    }

    async fn filter(&self, filter: &EventFilter) -> Result<Vec<FilterMatch>, CatalogError> {
        let (sql, params) = events_filter_query(filter);
        tracing::debug!(sql = %sql, "filtering events");
        bind_all(sqlx::query_as::<_, FilterMatch>(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn count_active_for_sport(&self, sport_id: i32) -> Result<i64, CatalogError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM events WHERE sport_id = $1 AND active = TRUE",
        )
        .bind(sport_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn parent_sport_id(&self, event_id: i32) -> Result<i32, CatalogError> {
        sqlx::query_scalar::<_, i32>("SELECT sport_id FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::Update(format!("event {event_id} not found")))
    }
}
