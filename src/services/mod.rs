//! Service layer: recurrence expansion, reconciliation, and the class
//! lifecycle orchestration that ties them to the store.

pub mod classes;
pub mod expander;
pub mod reconcile;


#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod reconcile_tests;

pub use classes::{CalendarEvent, CalendarEventStatus, ClassService, CreatedClass, UpdatedClass};
pub use expander::{expand, DEFAULT_HARD_CAP};
pub use reconcile::reconcile;
