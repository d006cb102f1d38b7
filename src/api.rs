//! Public API surface for the class scheduling backend.
//!
//! This file consolidates the domain types shared by the expansion engine,
//! the repository layer, and the HTTP API. All types derive
//! Serialize/Deserialize for JSON serialization.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::models::TimeOfDay;

/// Class identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub Uuid);

/// Class instance identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl ClassId {
    pub fn new() -> Self {
        ClassId(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for ClassId {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceId {
    pub fn new() -> Self {
        InstanceId(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Day of the week, serialized by its lowercase English name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    /// Offset from Sunday (0..=6), matching the week alignment used by
    /// the custom recurrence pattern.
    pub fn days_from_sunday(self) -> u32 {
        match self {
            DayOfWeek::Sunday => 0,
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

/// A wall-clock time window within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Inclusive start of the slot ("HH:mm")
    pub start_time: TimeOfDay,
    /// Exclusive end of the slot ("HH:mm"); must be after `start_time`
    pub end_time: TimeOfDay,
}

impl TimeSlot {
    pub fn new(start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self {
            start_time,
            end_time,
        }
    }
}

/// Time slots attached to one weekday (weekly and custom patterns).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWiseTimeSlots {
    pub day: DayOfWeek,
    pub time_slots: Vec<TimeSlot>,
}

/// Time slots attached to one day-of-month (monthly pattern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyDayWiseSlot {
    /// Day of the month, 1..=31. Days that do not exist in a given month
    /// (e.g. 31 in February) are skipped for that month.
    pub day: u32,
    pub time_slots: Vec<TimeSlot>,
}

/// The type-specific payload of a recurrence rule.
///
/// Exactly one variant per recurrence type; the legacy monthly flat form
/// (a day list sharing a single slot list) is available through
/// [`RecurrencePattern::monthly_days`], which expands into the day-wise
/// form at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecurrencePattern {
    /// No recurrence; expands to nothing.
    None,
    /// The same slot list every calendar day.
    Daily { time_slots: Vec<TimeSlot> },
    /// Per-weekday slot lists, repeated every week.
    Weekly { day_wise_slots: Vec<DayWiseTimeSlots> },
    /// Per-day-of-month slot lists, repeated every month.
    Monthly {
        day_wise_slots: Vec<MonthlyDayWiseSlot>,
    },
    /// A single month/day each year.
    Yearly {
        /// Calendar month, 1..=12
        month: u32,
        /// Day of the month, 1..=31
        day: u32,
        time_slots: Vec<TimeSlot>,
    },
    /// Per-weekday slot lists repeated every `interval_weeks` weeks,
    /// with weeks aligned to the Sunday on or before the start date.
    Custom {
        interval_weeks: u32,
        day_wise_slots: Vec<DayWiseTimeSlots>,
    },
}

impl RecurrencePattern {
    /// Build a monthly pattern from the legacy flat form: a list of
    /// days-of-month that all share one slot list.
    pub fn monthly_days(days: &[u32], time_slots: Vec<TimeSlot>) -> Self {
        RecurrencePattern::Monthly {
            day_wise_slots: days
                .iter()
                .map(|&day| MonthlyDayWiseSlot {
                    day,
                    time_slots: time_slots.clone(),
                })
                .collect(),
        }
    }

    /// Total number of time slots carried by this pattern's payload.
    /// A pattern with zero slots can never emit an occurrence.
    pub fn slot_count(&self) -> usize {
        match self {
            RecurrencePattern::None => 0,
            RecurrencePattern::Daily { time_slots } | RecurrencePattern::Yearly { time_slots, .. } => {
                time_slots.len()
            }
            RecurrencePattern::Weekly { day_wise_slots }
            | RecurrencePattern::Custom { day_wise_slots, .. } => {
                day_wise_slots.iter().map(|d| d.time_slots.len()).sum()
            }
            RecurrencePattern::Monthly { day_wise_slots } => {
                day_wise_slots.iter().map(|d| d.time_slots.len()).sum()
            }
        }
    }
}

/// An abstract rule describing how a class repeats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// First calendar date the rule applies to.
    pub start_date: NaiveDate,
    /// Optional last calendar date (inclusive) the rule applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Optional maximum number of occurrences to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
    #[serde(flatten)]
    pub pattern: RecurrencePattern,
}

/// Status of a single class instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Scheduled,
    Cancelled,
    Completed,
}

/// Status of a class as a whole.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    Active,
    Cancelled,
    Completed,
}

/// One concrete dated occurrence derived from a class's recurrence rule,
/// before it has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInstance {
    pub class_id: ClassId,
    /// Calendar date of the occurrence (no time component).
    pub scheduled_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub status: InstanceStatus,
}

/// A persisted class instance.
///
/// An instance is an *exception* (exempt from regeneration overwrite) when
/// its status is no longer `scheduled` or it has been edited since creation
/// (`updated_at != created_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInstance {
    pub id: InstanceId,
    pub class_id: ClassId,
    pub scheduled_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub status: InstanceStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ClassInstance {
    /// Whether this instance has been touched since creation or moved out
    /// of the `scheduled` status. Protected instances survive reconciliation.
    pub fn is_exception(&self) -> bool {
        self.status != InstanceStatus::Scheduled || self.updated_at != self.created_at
    }
}

/// A class before it has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClass {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub instructor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub capacity: u32,
    pub availability: bool,
    pub is_recurring: bool,
    /// One-time classes carry their own date and times directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceConfig>,
}

/// A persisted class. Owns zero or more instances; instances are derived
/// projections of the recurrence rule, cascade-deleted with the class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub instructor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub capacity: u32,
    pub availability: bool,
    pub status: ClassStatus,
    pub is_recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceConfig>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
