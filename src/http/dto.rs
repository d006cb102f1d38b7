//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies validate themselves before reaching the service layer, so
//! malformed recurrence configs are rejected with 400 instead of producing
//! empty or surprising expansions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::api::{
    Class, ClassInstance, ClassStatus, InstanceStatus, RecurrenceConfig, RecurrencePattern,
    TimeOfDay, TimeSlot,
};
use crate::api::{DayWiseTimeSlots, MonthlyDayWiseSlot, NewClass};
use crate::db::models::{ClassFilter, ClassPatch, InstanceFilter, InstancePatch, Page};
pub use crate::services::CalendarEvent;

use super::error::AppError;

fn default_true() -> bool {
    true
}

// ===== Validation =====

fn validate_slot(slot: &TimeSlot) -> Result<(), AppError> {
    if slot.start_time >= slot.end_time {
        return Err(AppError::BadRequest(format!(
            "time slot end ({}) must be after start ({})",
            slot.end_time, slot.start_time
        )));
    }
    Ok(())
}

fn validate_slots(slots: &[TimeSlot], context: &str) -> Result<(), AppError> {
    if slots.is_empty() {
        return Err(AppError::BadRequest(format!(
            "{context} requires at least one time slot"
        )));
    }
    slots.iter().try_for_each(validate_slot)
}

fn validate_day_wise(days: &[DayWiseTimeSlots], context: &str) -> Result<(), AppError> {
    if days.is_empty() {
        return Err(AppError::BadRequest(format!(
            "{context} requires at least one weekday entry"
        )));
    }
    for entry in days {
        validate_slots(&entry.time_slots, context)?;
    }
    Ok(())
}

fn validate_monthly(days: &[MonthlyDayWiseSlot]) -> Result<(), AppError> {
    if days.is_empty() {
        return Err(AppError::BadRequest(
            "monthly recurrence requires at least one day entry".to_string(),
        ));
    }
    for entry in days {
        if !(1..=31).contains(&entry.day) {
            return Err(AppError::BadRequest(format!(
                "monthly day must be 1..=31, got {}",
                entry.day
            )));
        }
        validate_slots(&entry.time_slots, "monthly recurrence")?;
    }
    Ok(())
}

/// Validate a recurrence config: window ordering, occurrence count, and the
/// per-type payload constraints.
pub fn validate_recurrence(config: &RecurrenceConfig) -> Result<(), AppError> {
    if let Some(end) = config.end_date {
        if end < config.start_date {
            return Err(AppError::BadRequest(
                "recurrence end date must not precede its start date".to_string(),
            ));
        }
    }
    if config.occurrences == Some(0) {
        return Err(AppError::BadRequest(
            "occurrences must be at least 1".to_string(),
        ));
    }

    match &config.pattern {
        RecurrencePattern::None => Ok(()),
        RecurrencePattern::Daily { time_slots } => validate_slots(time_slots, "daily recurrence"),
        RecurrencePattern::Weekly { day_wise_slots } => {
            validate_day_wise(day_wise_slots, "weekly recurrence")
        }
        RecurrencePattern::Monthly { day_wise_slots } => validate_monthly(day_wise_slots),
        RecurrencePattern::Yearly {
            month,
            day,
            time_slots,
        } => {
            if !(1..=12).contains(month) {
                return Err(AppError::BadRequest(format!(
                    "yearly month must be 1..=12, got {month}"
                )));
            }
            if !(1..=31).contains(day) {
                return Err(AppError::BadRequest(format!(
                    "yearly day must be 1..=31, got {day}"
                )));
            }
            validate_slots(time_slots, "yearly recurrence")
        }
        RecurrencePattern::Custom {
            interval_weeks,
            day_wise_slots,
        } => {
            if !(1..=52).contains(interval_weeks) {
                return Err(AppError::BadRequest(format!(
                    "custom interval must be 1..=52 weeks, got {interval_weeks}"
                )));
            }
            validate_day_wise(day_wise_slots, "custom recurrence")
        }
    }
}

// ===== Class requests =====

/// Request body for creating a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub instructor: String,
    #[serde(default)]
    pub location: Option<String>,
    pub capacity: u32,
    #[serde(default = "default_true")]
    pub availability: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<TimeOfDay>,
    #[serde(default)]
    pub end_time: Option<TimeOfDay>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceConfig>,
}

impl CreateClassRequest {
    /// Validate and convert into the domain type.
    pub fn into_new_class(self) -> Result<NewClass, AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("title must not be empty".to_string()));
        }
        if self.instructor.trim().is_empty() {
            return Err(AppError::BadRequest(
                "instructor must not be empty".to_string(),
            ));
        }
        if self.capacity == 0 {
            return Err(AppError::BadRequest(
                "capacity must be at least 1".to_string(),
            ));
        }

        if self.is_recurring {
            let Some(recurrence) = &self.recurrence else {
                return Err(AppError::BadRequest(
                    "recurring classes require a recurrence config".to_string(),
                ));
            };
            validate_recurrence(recurrence)?;
        } else {
            let (Some(_), Some(start), Some(end)) =
                (self.scheduled_date, self.start_time, self.end_time)
            else {
                return Err(AppError::BadRequest(
                    "one-time classes require scheduled_date, start_time and end_time".to_string(),
                ));
            };
            validate_slot(&TimeSlot::new(start, end))?;
        }

        Ok(NewClass {
            title: self.title,
            description: self.description,
            instructor: self.instructor,
            location: self.location,
            capacity: self.capacity,
            availability: self.availability,
            is_recurring: self.is_recurring,
            scheduled_date: self.scheduled_date,
            start_time: self.start_time,
            end_time: self.end_time,
            recurrence: self.recurrence,
        })
    }
}

/// Request body for updating a class. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClassRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub availability: Option<bool>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<TimeOfDay>,
    #[serde(default)]
    pub end_time: Option<TimeOfDay>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceConfig>,
}

impl UpdateClassRequest {
    pub fn into_patch(self) -> Result<ClassPatch, AppError> {
        if let Some(recurrence) = &self.recurrence {
            validate_recurrence(recurrence)?;
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            validate_slot(&TimeSlot::new(start, end))?;
        }
        Ok(ClassPatch {
            title: self.title,
            description: self.description,
            instructor: self.instructor,
            location: self.location,
            capacity: self.capacity,
            availability: self.availability,
            status: None,
            is_recurring: self.is_recurring,
            scheduled_date: self.scheduled_date,
            start_time: self.start_time,
            end_time: self.end_time,
            recurrence: self.recurrence,
        })
    }
}

/// Request body for transitioning a class's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClassStatusRequest {
    pub status: ClassStatus,
}

// ===== Instance requests =====

/// Request body for patching an instance. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInstanceRequest {
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<TimeOfDay>,
    #[serde(default)]
    pub end_time: Option<TimeOfDay>,
    #[serde(default)]
    pub status: Option<InstanceStatus>,
}

impl UpdateInstanceRequest {
    pub fn into_patch(self) -> Result<InstancePatch, AppError> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            validate_slot(&TimeSlot::new(start, end))?;
        }
        Ok(InstancePatch {
            scheduled_date: self.scheduled_date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
        })
    }
}

/// Request body for transitioning an instance's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInstanceStatusRequest {
    pub status: InstanceStatus,
}

// ===== Query parameters =====

/// Query parameters for listing classes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassListQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub status: Option<ClassStatus>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub availability: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl ClassListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page.unwrap_or(1), self.limit.unwrap_or(20))
    }

    pub fn into_filter(self) -> Result<ClassFilter, AppError> {
        let date_range = match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                return Err(AppError::BadRequest(
                    "'from' must not be after 'to'".to_string(),
                ));
            }
            (Some(from), Some(to)) => Some((from, to)),
            (None, None) => None,
            _ => {
                return Err(AppError::BadRequest(
                    "'from' and 'to' must be given together".to_string(),
                ));
            }
        };
        Ok(ClassFilter {
            status: self.status,
            is_recurring: self.is_recurring,
            availability: self.availability,
            search: self.search,
            date_range,
        })
    }
}

/// Query parameters for listing instances across classes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceListQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<InstanceStatus>,
}

impl InstanceListQuery {
    pub fn into_filter(self) -> InstanceFilter {
        InstanceFilter {
            from: self.from,
            to: self.to,
            status: self.status,
            ..InstanceFilter::default()
        }
    }
}

/// Query parameters for paginating a class's instances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstancePageQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl InstancePageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page.unwrap_or(1), self.limit.unwrap_or(50))
    }
}

/// Query parameters locating an instance by its scheduling details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDetailsQuery {
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<TimeOfDay>,
}

/// Query parameters for the calendar view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl CalendarQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.from > self.to {
            return Err(AppError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
        Ok(())
    }
}

// ===== Responses =====

/// Pagination envelope for list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl PaginationDto {
    pub fn new(page: &Page, total: usize) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: page.total_pages(total),
        }
    }
}

/// Response for class creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassResponse {
    pub class: Class,
    /// Instances materialized from the recurrence config, if any
    pub instances: Vec<ClassInstance>,
}

/// Response for class updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClassResponse {
    pub class: Class,
    /// Instances regenerated because the patch touched scheduling fields
    pub regenerated: Vec<ClassInstance>,
}

/// Response for listing classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassListResponse {
    pub classes: Vec<Class>,
    pub pagination: PaginationDto,
}

/// Response for listing a class's instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceListResponse {
    pub instances: Vec<ClassInstance>,
    pub pagination: PaginationDto,
}

/// Response for instance regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerateResponse {
    pub instances: Vec<ClassInstance>,
    pub count: usize,
}

/// Response for bulk instance updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub modified: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}
