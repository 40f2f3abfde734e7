//! Postgres-backed store implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::PgPool` behind an explicit lifecycle:
//! `Uninitialized → Connected → Closed`. Connecting an already-connected
//! handle fails with [`CatalogError::AlreadyConnected`]; using the pool
//! before `connect` or after `close` fails with
//! [`CatalogError::NotConnected`]. The handle is an owned resource injected
//! into the repositories at construction — there is no global pool.
//!
//! Embedded migrations (`migrations/0001_initial_schema.sql`) run as part of
//! `connect`.
//!
//! ## Repository types
//!
//! | Type | Trait |
//! |------|-------|
//! | [`PgSportRepository`] | `SportStore` |
//! | [`PgEventRepository`] | `EventStore` |
//! | [`PgSelectionRepository`] | `SelectionStore` |
//!
//! Statements are rendered by [`crate::query`] with positional `$n`
//! parameters and bound in order via [`bind_all`] — values never appear in
//! the SQL text. Driver errors are classified by [`classify`] into the
//! [`CatalogError`] taxonomy.

mod database;
mod event_repo;
mod selection_repo;
mod sport_repo;
#[cfg(test)]
mod integration_tests;

pub use database::Database;
pub use event_repo::PgEventRepository;
pub use selection_repo::PgSelectionRepository;
pub use sport_repo::PgSportRepository;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Row};

use crate::model::{Event, FilterMatch, Selection, Sport};
use crate::query::SqlValue;
use crate::store::CatalogError;

/// Bind a parameter list to a query in positional order. The `$n`
/// placeholders in the SQL were assigned in the same order the values were
/// appended, so a plain in-order bind keeps them aligned.
pub(crate) fn bind_all<'q, T>(
    mut query: QueryAs<'q, sqlx::Postgres, T, PgArguments>,
    params: &[SqlValue],
) -> QueryAs<'q, sqlx::Postgres, T, PgArguments> {
    for value in params {
        query = match value {
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

/// Classify a driver error into the catalog taxonomy, keeping the original
/// message.
pub(crate) fn classify(err: sqlx::Error) -> CatalogError {
    match &err {
        sqlx::Error::Database(db) => {
            if db.is_foreign_key_violation() {
                CatalogError::ForeignKey(db.message().to_string())
            } else if db.code().as_deref() == Some("57014") {
                // query_canceled
                CatalogError::QueryCanceled(db.message().to_string())
            } else {
                CatalogError::Database(db.message().to_string())
            }
        }
        _ => CatalogError::Database(err.to_string()),
    }
}

fn decode_enum<T: std::str::FromStr<Err = CatalogError>>(
    row: &PgRow,
    column: &'static str,
) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: CatalogError| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl FromRow<'_, PgRow> for Sport {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Sport {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, PgRow> for Event {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Event {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            active: row.try_get("active")?,
            event_type: decode_enum(row, "type")?,
            sport_id: row.try_get("sport_id")?,
            status: decode_enum(row, "status")?,
            scheduled_start: row.try_get("scheduled_start")?,
            actual_start: row.try_get("actual_start")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, PgRow> for Selection {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Selection {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            event_id: row.try_get("event_id")?,
            price: row.try_get("price")?,
            active: row.try_get("active")?,
            outcome: decode_enum(row, "outcome")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, PgRow> for FilterMatch {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(FilterMatch {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            active: row.try_get("active")?,
            threshold: row.try_get("threshold")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::Execute;

    // Builds a query and binds every value variant without executing it.
    #[test]
    fn bind_all_accepts_every_value_variant() {
        let sql = "SELECT * FROM selections \
                   WHERE name = $1 AND active = $2 AND event_id = $3 \
                   AND price = $4 AND created_at = $5";
        let params = vec![
            SqlValue::Text("Home Win".into()),
            SqlValue::Bool(true),
            SqlValue::Int(3),
            SqlValue::Float(1.85),
            SqlValue::Timestamp(Utc::now()),
        ];

        let bound = bind_all(sqlx::query_as::<_, Selection>(sql), &params);
        assert_eq!(bound.sql(), sql);
    }
}
