//! Postgres-backed repository for sports.

use sqlx::PgPool;

use super::{bind_all, classify};
use crate::model::{FilterMatch, NewSport, Sport, SportFilter, SportPatch};
use crate::query::{sports_filter_query, QueryBuilder, SqlValue};
use crate::slug::to_slug;
use crate::store::{CatalogError, SportStore};

/// Postgres implementation of [`SportStore`]. Owns all SQL construction and
/// execution for the `sports` table.
pub struct PgSportRepository {
    pool: PgPool,
}

impl PgSportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SportStore for PgSportRepository {
    async fn get_all(&self) -> Result<Vec<Sport>, CatalogError> {
        let (sql, _) = QueryBuilder::new("sports").build_query();
        sqlx::query_as::<_, Sport>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }

    async fn create(&self, sport: &NewSport) -> Result<Sport, CatalogError> {
        let slug = to_slug(&sport.name)?;
        let mut builder = QueryBuilder::new("sports");
        builder.add_insert_data(vec![
            ("name", SqlValue::from(sport.name.as_str())),
            ("slug", SqlValue::from(slug)),
            ("active", SqlValue::Bool(sport.active)),
        ]);
        // Data was staged just above, so the insert render cannot be empty.
        let (sql, params) = builder
            .build_insert_query()
            .ok_or_else(|| CatalogError::Configuration("no insert data staged".into()))?;

        bind_all(sqlx::query_as::<_, Sport>(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn update(&self, id: i32, patch: &SportPatch) -> Result<Sport, CatalogError> {
        let mut builder = QueryBuilder::new("sports");
        builder.add_condition("id", id);
        builder.add_update_data(patch.columns());
        let (sql, params) = builder.build_update_query()?;

        bind_all(sqlx::query_as::<_, Sport>(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?
            .ok_or_else(|| CatalogError::Update(format!("sport {id} not found")))
    }

    async fn set_inactive(&self, id: i32) -> Result<(), CatalogError> {
        let result = sqlx::query("UPDATE sports SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::Update(format!("sport {id} not found")));
        }
        Ok(())
    }

    async fn filter(&self, filter: &SportFilter) -> Result<Vec<FilterMatch>, CatalogError> {
        let (sql, params) = sports_filter_query(filter);
        tracing::debug!(sql = %sql, "filtering sports");
        bind_all(sqlx::query_as::<_, FilterMatch>(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }
}
