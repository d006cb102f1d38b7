//! Filter, patch, and pagination types for repository operations.
//!
//! These are the compound query shapes the store collaborator is assumed to
//! support: class identity, date ranges, status, and the timestamp
//! inequality that detects touched records.

use chrono::NaiveDate;

use crate::api::{
    ClassId, ClassStatus, InstanceStatus, RecurrenceConfig, TimeOfDay,
};

/// Pagination window (1-based page index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(page: usize, limit: usize) -> Self {
        Page {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }
}

/// Query filter for listing classes.
#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    pub status: Option<ClassStatus>,
    pub is_recurring: Option<bool>,
    pub availability: Option<bool>,
    /// Case-insensitive partial match on title or instructor.
    pub search: Option<String>,
    /// Inclusive date range. Matches one-time classes scheduled inside the
    /// range, and recurring classes whose recurrence window overlaps it.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Query filter for instance operations.
#[derive(Debug, Clone, Default)]
pub struct InstanceFilter {
    pub class_id: Option<ClassId>,
    /// Inclusive lower bound on `scheduled_date`.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `scheduled_date`.
    pub to: Option<NaiveDate>,
    pub status: Option<InstanceStatus>,
    pub start_time: Option<TimeOfDay>,
    /// `Some(true)` matches only instances edited since creation
    /// (`updated_at != created_at`); `Some(false)` only pristine ones.
    pub touched: Option<bool>,
}

impl InstanceFilter {
    pub fn for_class(class_id: ClassId) -> Self {
        InstanceFilter {
            class_id: Some(class_id),
            ..Default::default()
        }
    }

    pub fn from_date(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to_date(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_status(mut self, status: InstanceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_start_time(mut self, start_time: TimeOfDay) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn touched(mut self, touched: bool) -> Self {
        self.touched = Some(touched);
        self
    }
}

/// Field-merge update for a class. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
    pub availability: Option<bool>,
    pub status: Option<ClassStatus>,
    pub is_recurring: Option<bool>,
    pub scheduled_date: Option<NaiveDate>,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub recurrence: Option<RecurrenceConfig>,
}

impl ClassPatch {
    /// Whether this patch touches a field that feeds the recurrence rule,
    /// i.e. whether applying it to a recurring class warrants regeneration.
    pub fn touches_recurrence(&self) -> bool {
        self.recurrence.is_some()
            || self.is_recurring.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
    }
}

/// Field-merge update for a class instance. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct InstancePatch {
    pub scheduled_date: Option<NaiveDate>,
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
    pub status: Option<InstanceStatus>,
}

impl InstancePatch {
    pub fn status(status: InstanceStatus) -> Self {
        InstancePatch {
            status: Some(status),
            ..Default::default()
        }
    }
}
