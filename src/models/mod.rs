//! Core value types shared across the engine and the API surface.

pub mod time;


pub use time::{normalize_date, TimeOfDay};
