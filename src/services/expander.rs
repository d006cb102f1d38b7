//! Recurrence expansion engine.
//!
//! Turns an abstract [`RecurrenceConfig`] into a bounded, ordered sequence
//! of concrete unsaved occurrences. Expansion is a pure function of its
//! inputs: no clock access, no store access, and the same config always
//! yields the same sequence. Side effects (persisting the result) belong to
//! the caller.

use chrono::{Datelike, Days, NaiveDate};

use crate::api::{
    ClassId, DayWiseTimeSlots, InstanceStatus, MonthlyDayWiseSlot, NewInstance, RecurrenceConfig,
    RecurrencePattern, TimeSlot,
};

/// Safety ceiling on generated occurrences for configs with neither an end
/// date nor an occurrence count. Guarantees expansion terminates.
pub const DEFAULT_HARD_CAP: u32 = 365;

/// Stop conditions shared by every recurrence kind.
///
/// Generation stops advancing once the running occurrence count reaches the
/// effective limit (`min(occurrences, hard_cap)`) or the candidate date
/// exceeds the config's end date. The count is checked per slot, so a date
/// with several slots can be cut off mid-way when the limit lands there.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    limit: usize,
    end_date: Option<NaiveDate>,
}

impl Bounds {
    fn new(recurrence: &RecurrenceConfig, hard_cap: u32) -> Self {
        let limit = recurrence.occurrences.unwrap_or(hard_cap).min(hard_cap);
        Bounds {
            limit: limit as usize,
            end_date: recurrence.end_date,
        }
    }

    fn allows(&self, date: NaiveDate, emitted: usize) -> bool {
        if emitted >= self.limit {
            return false;
        }
        match self.end_date {
            Some(end) => date <= end,
            None => true,
        }
    }
}

/// Accumulates occurrences while enforcing the bounds policy.
struct Generator {
    class_id: ClassId,
    bounds: Bounds,
    instances: Vec<NewInstance>,
}

impl Generator {
    fn within_bounds(&self, date: NaiveDate) -> bool {
        self.bounds.allows(date, self.instances.len())
    }

    /// Emit one occurrence per slot for a date, stopping mid-way if the
    /// occurrence limit is reached exactly there.
    fn emit_day(&mut self, date: NaiveDate, slots: &[TimeSlot]) {
        for slot in slots {
            if !self.within_bounds(date) {
                break;
            }
            self.instances.push(NewInstance {
                class_id: self.class_id,
                scheduled_date: date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                status: InstanceStatus::Scheduled,
            });
        }
    }
}

/// Expand a recurrence rule into an ordered sequence of unsaved occurrences.
///
/// The output is ascending by `(scheduled_date, start_time)` and never
/// exceeds `min(occurrences, hard_cap)` entries. A pattern whose payload
/// carries no time slots yields an empty sequence rather than an error.
pub fn expand(recurrence: &RecurrenceConfig, class_id: ClassId, hard_cap: u32) -> Vec<NewInstance> {
    let bounds = Bounds::new(recurrence, hard_cap);
    if bounds.limit == 0 || recurrence.pattern.slot_count() == 0 {
        return Vec::new();
    }

    let mut gen = Generator {
        class_id,
        bounds,
        instances: Vec::new(),
    };
    let start = recurrence.start_date;

    match &recurrence.pattern {
        RecurrencePattern::None => {}
        RecurrencePattern::Daily { time_slots } => {
            expand_daily(&mut gen, start, time_slots);
        }
        RecurrencePattern::Weekly { day_wise_slots } => {
            expand_weekly(&mut gen, start, day_wise_slots);
        }
        RecurrencePattern::Monthly { day_wise_slots } => {
            expand_monthly(&mut gen, start, day_wise_slots);
        }
        RecurrencePattern::Yearly {
            month,
            day,
            time_slots,
        } => {
            expand_yearly(&mut gen, start, *month, *day, time_slots);
        }
        RecurrencePattern::Custom {
            interval_weeks,
            day_wise_slots,
        } => {
            expand_custom(&mut gen, start, *interval_weeks, day_wise_slots);
        }
    }

    // Generation order is already chronological per pattern; the sort pins
    // the (scheduled_date, start_time) ordering invariant regardless.
    gen.instances
        .sort_by(|a, b| (a.scheduled_date, a.start_time).cmp(&(b.scheduled_date, b.start_time)));
    gen.instances
}

/// Slots sorted by start time, so the count bound cuts off chronologically.
fn sorted_slots(slots: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut slots = slots.to_vec();
    slots.sort_by_key(|slot| slot.start_time);
    slots
}

/// Index day-wise slot lists by weekday offset from Sunday (0..=6), each
/// list sorted by start time. Later entries for the same weekday win.
fn slots_by_weekday(day_wise: &[DayWiseTimeSlots]) -> [Vec<TimeSlot>; 7] {
    let mut by_day: [Vec<TimeSlot>; 7] = Default::default();
    for entry in day_wise {
        by_day[entry.day.days_from_sunday() as usize] = sorted_slots(&entry.time_slots);
    }
    by_day
}

fn expand_daily(gen: &mut Generator, start: NaiveDate, time_slots: &[TimeSlot]) {
    let slots = sorted_slots(time_slots);
    let mut date = start;
    while gen.within_bounds(date) {
        gen.emit_day(date, &slots);
        let Some(next) = date.succ_opt() else { break };
        date = next;
    }
}

fn expand_weekly(gen: &mut Generator, start: NaiveDate, day_wise: &[DayWiseTimeSlots]) {
    let by_day = slots_by_weekday(day_wise);
    let mut date = start;
    while gen.within_bounds(date) {
        let slots = &by_day[date.weekday().num_days_from_sunday() as usize];
        if !slots.is_empty() {
            gen.emit_day(date, slots);
        }
        let Some(next) = date.succ_opt() else { break };
        date = next;
    }
}

fn expand_monthly(gen: &mut Generator, start: NaiveDate, day_wise: &[MonthlyDayWiseSlot]) {
    // Only days that can exist in some month and actually carry slots can
    // ever emit; without any such entry the loop would never make progress.
    let mut day_slots: Vec<(u32, Vec<TimeSlot>)> = day_wise
        .iter()
        .filter(|entry| (1..=31).contains(&entry.day) && !entry.time_slots.is_empty())
        .map(|entry| (entry.day, sorted_slots(&entry.time_slots)))
        .collect();
    if day_slots.is_empty() {
        return;
    }
    day_slots.sort_by_key(|(day, _)| *day);

    // Iterate month by month from the first day of the start date's month.
    let Some(mut month_start) = NaiveDate::from_ymd_opt(start.year(), start.month(), 1) else {
        return;
    };
    while gen.within_bounds(month_start) {
        for (day, slots) in &day_slots {
            // Skip days that do not exist in this month (e.g. 31 in February).
            let Some(date) = NaiveDate::from_ymd_opt(month_start.year(), month_start.month(), *day)
            else {
                continue;
            };
            if date < start {
                continue;
            }
            if !gen.within_bounds(date) {
                break;
            }
            gen.emit_day(date, slots);
        }
        let Some(next) = next_month_start(month_start) else {
            break;
        };
        month_start = next;
    }
}

fn next_month_start(month_start: NaiveDate) -> Option<NaiveDate> {
    if month_start.month() == 12 {
        NaiveDate::from_ymd_opt(month_start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month_start.year(), month_start.month() + 1, 1)
    }
}

fn expand_yearly(
    gen: &mut Generator,
    start: NaiveDate,
    month: u32,
    day: u32,
    time_slots: &[TimeSlot],
) {
    // A month/day pair that is invalid even in a leap year (e.g. 30 February)
    // can never emit; bail out instead of scanning years forever.
    if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
        return;
    }
    let slots = sorted_slots(time_slots);

    let mut year = start.year();
    loop {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            // 29 February in a non-leap year: roll forward.
            year += 1;
            continue;
        };
        if date < start {
            // First candidate precedes the start date; roll forward one year.
            year += 1;
            continue;
        }
        if !gen.within_bounds(date) {
            break;
        }
        gen.emit_day(date, &slots);
        year += 1;
    }
}

fn expand_custom(
    gen: &mut Generator,
    start: NaiveDate,
    interval_weeks: u32,
    day_wise: &[DayWiseTimeSlots],
) {
    let interval = interval_weeks.max(1) as u64;
    let by_day = slots_by_weekday(day_wise);

    // Week buckets are aligned to the Sunday on or before the start date.
    let Some(mut week_start) =
        start.checked_sub_days(Days::new(start.weekday().num_days_from_sunday() as u64))
    else {
        return;
    };

    let mut week_index: u64 = 0;
    while gen.within_bounds(week_start) {
        if week_index % interval == 0 {
            for offset in 0..7u64 {
                let Some(date) = week_start.checked_add_days(Days::new(offset)) else {
                    break;
                };
                if date < start {
                    continue;
                }
                if !gen.within_bounds(date) {
                    break;
                }
                let slots = &by_day[offset as usize];
                if !slots.is_empty() {
                    gen.emit_day(date, slots);
                }
            }
        }
        let Some(next) = week_start.checked_add_days(Days::new(7)) else {
            break;
        };
        week_start = next;
        week_index += 1;
    }
}
