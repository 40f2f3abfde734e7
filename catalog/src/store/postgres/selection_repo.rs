//! Postgres-backed repository for selections.

use sqlx::PgPool;

use super::{bind_all, classify};
use crate::model::{NewSelection, Selection, SelectionFilter, SelectionPatch};
use crate::query::{selections_filter_query, QueryBuilder, SqlValue};
use crate::store::{CatalogError, SelectionStore};

/// Postgres implementation of [`SelectionStore`]. Owns all SQL construction
/// and execution for the `selections` table.
pub struct PgSelectionRepository {
    pool: PgPool,
}

impl PgSelectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SelectionStore for PgSelectionRepository {
    async fn get_all(&self) -> Result<Vec<Selection>, CatalogError> {
        let (sql, _) = QueryBuilder::new("selections").build_query();
        sqlx::query_as::<_, Selection>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn create(&self, selection: &NewSelection) -> Result<Selection, CatalogError> {
        let mut builder = QueryBuilder::new("selections");
        builder.add_insert_data(vec![
            ("name", SqlValue::from(selection.name.as_str())),
            ("event_id", SqlValue::from(selection.event_id)),
            ("price", SqlValue::Float(selection.price)),
            ("active", SqlValue::Bool(selection.active)),
            ("outcome", SqlValue::from(selection.outcome.as_str())),
        ]);
        let (sql, params) = builder
            .build_insert_query()
            .ok_or_else(|| CatalogError::Configuration("no insert data staged".into()))?;

        bind_all(sqlx::query_as::<_, Selection>(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn update(&self, id: i32, patch: &SelectionPatch) -> Result<Selection, CatalogError> {
        let mut builder = QueryBuilder::new("selections");
        builder.add_condition("id", id);
        builder.add_update_data(patch.columns());
        let (sql, params) = builder.build_update_query()?;

        bind_all(sqlx::query_as::<_, Selection>(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::Update(format!("selection {id} not found")))
    }

    async fn filter(&self, filter: &SelectionFilter) -> Result<Vec<Selection>, CatalogError> {
        let (sql, params) = selections_filter_query(filter);
        tracing::debug!(sql = %sql, "filtering selections");
        bind_all(sqlx::query_as::<_, Selection>(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn count_active_for_event(&self, event_id: i32) -> Result<i64, CatalogError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM selections WHERE event_id = $1 AND active = TRUE",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn parent_event_id(&self, selection_id: i32) -> Result<i32, CatalogError> {
        sqlx::query_scalar::<_, i32>("SELECT event_id FROM selections WHERE id = $1")
            .bind(selection_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::Update(format!("selection {selection_id} not found")))
    }

    async fn list_by_event(&self, event_id: i32) -> Result<Vec<Selection>, CatalogError> {
        sqlx::query_as::<_, Selection>("SELECT * FROM selections WHERE event_id = $1 ORDER BY id")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn list_by_sport(&self, sport_id: i32) -> Result<Vec<Selection>, CatalogError> {
        sqlx::query_as::<_, Selection>(
            "SELECT s.* FROM selections s \
             JOIN events e ON e.id = s.event_id \
             WHERE e.sport_id = $1 ORDER BY s.id",
        )
        .bind(sport_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }
}
