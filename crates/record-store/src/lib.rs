//! Durable record store for the order lifecycle engine.
//!
//! This crate provides the storage collaborator the engine depends on:
//! - The record shapes: [`Order`], [`AuditLogEntry`], [`Notification`]
//! - The [`OrderStore`], [`AuditLogStore`], and [`NotificationStore`] traits
//!   (and the [`RecordStore`] supertrait combining all three)
//! - [`InMemoryStore`] for tests and local runs
//! - [`PostgresStore`] backed by `sqlx`

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{AuditLogEntry, Notification, Order};
pub use store::{
    AuditLogStore, NotificationFilter, NotificationStore, OrderFilter, OrderStore, RecordStore,
};
