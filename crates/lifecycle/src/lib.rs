//! Order transition engine.
//!
//! This crate is the sole authority for moving an order between statuses:
//! - [`TransitionEngine::create_order`] persists a new order together with
//!   its creation audit entry and a `NEW_ORDER` notification
//! - [`TransitionEngine::change_status`] validates the requested edge
//!   against the transition table, applies it with compare-and-swap
//!   semantics, and records the audit entry and `STATUS_CHANGE`
//!   notification
//! - [`TransitionEngine::notify`] is the persist-and-publish notification
//!   path reused by the automation scanner
//!
//! The pipeline runs in a fixed order (status write, audit append,
//! notification persist, publish). A failure after the status write cannot
//! be rolled back; it is carried as an [`EngineWarning`] on the returned
//! receipt instead of being swallowed.

pub mod engine;
pub mod error;
pub mod order_number;

pub use engine::{NewOrder, SYSTEM_ACTOR, TransitionEngine, TransitionReceipt};
pub use error::{EngineWarning, LifecycleError};
pub use order_number::generate_order_number;
