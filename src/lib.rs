//! # Class Scheduling Backend
//!
//! Recurrence expansion and reconciliation engine for a class-scheduling
//! system. The crate turns abstract recurrence rules (daily, weekly,
//! monthly, yearly, custom week-interval) into concrete dated class
//! instances, and keeps stored instances consistent with their rule across
//! edits without destroying manual modifications.
//!
//! ## Architecture
//!
//! - [`api`]: Domain types shared across layers (classes, instances,
//!   recurrence configs)
//! - [`models`]: Wall-clock time-of-day handling and date normalization
//! - [`db`]: Repository traits and the in-memory store implementation
//! - [`services`]: The expansion engine, the reconciler, and the class
//!   lifecycle service
//! - [`http`]: Axum-based REST API (feature `http-server`)

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
