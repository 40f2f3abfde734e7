//! Sportsbook catalog core.
//!
//! Three linked entities — sports, events, selections — with CRUD access,
//! ad-hoc filtering and an activity cascade: deactivating the last active
//! selection of an event deactivates the event, and deactivating the last
//! active event of a sport deactivates the sport.
//!
//! The crate is transport-agnostic. An embedding binary wires a
//! [`store::postgres::Database`] into the Postgres repositories and hands
//! them to [`service::Catalog`]; tests run the same service over
//! [`store::memory::MemoryDb`]. All SQL is rendered by [`query`] with bound
//! positional parameters — values never appear in statement text.

pub mod config;
pub mod model;
pub mod query;
pub mod service;
pub mod slug;
pub mod store;

pub use model::{
    Event, EventFilter, EventPatch, EventStatus, EventType, FilterMatch, NewEvent, NewSelection,
    NewSport, Selection, SelectionFilter, SelectionOutcome, SelectionPatch, Sport, SportFilter,
    SportPatch,
};
pub use service::{Catalog, CascadeCoordinator};
pub use store::{CatalogError, EventStore, SelectionStore, SportStore};
