//! Store trait definitions and the catalog error taxonomy.
//!
//! Each trait abstracts over one entity's table, allowing the Postgres and
//! in-memory backends to be used interchangeably via static dispatch.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` — required by `tokio::spawn` and any
//! transport layer driving these stores.

pub mod memory;
pub mod postgres;

use std::future::Future;

use crate::model::{
    Event, EventFilter, EventPatch, FilterMatch, NewEvent, NewSelection, NewSport, Selection,
    SelectionFilter, SelectionPatch, Sport, SportFilter, SportPatch,
};

/// Errors from the catalog core.
///
/// Driver-specific failures are classified at the store boundary: referential
/// violations become [`CatalogError::ForeignKey`], cancelled statements
/// [`CatalogError::QueryCanceled`] and everything else
/// [`CatalogError::Database`], always with the original message attached.
/// Read failures propagate — no operation swallows an error into an empty
/// result.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("foreign key violation: {0}")]
    ForeignKey(String),
    #[error("update failed: {0}")]
    Update(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("query canceled: {0}")]
    QueryCanceled(String),
    #[error("database is not connected")]
    NotConnected,
    #[error("database is already connected")]
    AlreadyConnected,
}

/// Repository for sports.
pub trait SportStore: Send + Sync {
    fn get_all(&self) -> impl Future<Output = Result<Vec<Sport>, CatalogError>> + Send;
    /// Derives the slug from `name` and inserts; returns the persisted row.
    fn create(&self, sport: &NewSport) -> impl Future<Output = Result<Sport, CatalogError>> + Send;
    /// Applies the present patch fields. Fails with [`CatalogError::Update`]
    /// when no row has the given id.
    fn update(
        &self,
        id: i32,
        patch: &SportPatch,
    ) -> impl Future<Output = Result<Sport, CatalogError>> + Send;
    /// Narrow single-column deactivation used by the cascade.
    fn set_inactive(&self, id: i32) -> impl Future<Output = Result<(), CatalogError>> + Send;
    fn filter(
        &self,
        filter: &SportFilter,
    ) -> impl Future<Output = Result<Vec<FilterMatch>, CatalogError>> + Send;
}

/// Repository for events.
pub trait EventStore: Send + Sync {
    fn get_all(&self) -> impl Future<Output = Result<Vec<Event>, CatalogError>> + Send;
    fn create(&self, event: &NewEvent) -> impl Future<Output = Result<Event, CatalogError>> + Send;
    fn update(
        &self,
        id: i32,
        patch: &EventPatch,
    ) -> impl Future<Output = Result<Event, CatalogError>> + Send;
    fn set_inactive(&self, id: i32) -> impl Future<Output = Result<(), CatalogError>> + Send;
    fn filter(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<FilterMatch>, CatalogError>> + Send;
    /// Count of active events under a sport; feeds the event→sport cascade.
    fn count_active_for_sport(
        &self,
        sport_id: i32,
    ) -> impl Future<Output = Result<i64, CatalogError>> + Send;
    fn parent_sport_id(
        &self,
        event_id: i32,
    ) -> impl Future<Output = Result<i32, CatalogError>> + Send;
}

/// Repository for selections.
pub trait SelectionStore: Send + Sync {
    fn get_all(&self) -> impl Future<Output = Result<Vec<Selection>, CatalogError>> + Send;
    fn create(
        &self,
        selection: &NewSelection,
    ) -> impl Future<Output = Result<Selection, CatalogError>> + Send;
    fn update(
        &self,
        id: i32,
        patch: &SelectionPatch,
    ) -> impl Future<Output = Result<Selection, CatalogError>> + Send;
    fn filter(
        &self,
        filter: &SelectionFilter,
    ) -> impl Future<Output = Result<Vec<Selection>, CatalogError>> + Send;
    /// Count of active selections under an event; feeds the selection→event
    /// cascade.
    fn count_active_for_event(
        &self,
        event_id: i32,
    ) -> impl Future<Output = Result<i64, CatalogError>> + Send;
    fn parent_event_id(
        &self,
        selection_id: i32,
    ) -> impl Future<Output = Result<i32, CatalogError>> + Send;
    fn list_by_event(
        &self,
        event_id: i32,
    ) -> impl Future<Output = Result<Vec<Selection>, CatalogError>> + Send;
    /// Selections under any event of the given sport (join through events).
    fn list_by_sport(
        &self,
        sport_id: i32,
    ) -> impl Future<Output = Result<Vec<Selection>, CatalogError>> + Send;
}
