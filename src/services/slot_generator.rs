use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};

use crate::models::schedule::TimeSlot;
use crate::models::settings::{OptimizerConfig, UserSchedulePreferences};
use crate::services::schedule_utils;

/// Enumerates candidate slots inside the user's work hours across the
/// lookahead window, starting from the planning start instant.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlotGenerator<'a> {
    preferences: &'a UserSchedulePreferences,
    config: &'a OptimizerConfig,
    planning_start: DateTime<FixedOffset>,
}

impl<'a> TimeSlotGenerator<'a> {
    pub fn new(
        preferences: &'a UserSchedulePreferences,
        config: &'a OptimizerConfig,
        planning_start: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            preferences,
            config,
            planning_start,
        }
    }

    fn offset(&self) -> FixedOffset {
        *self.planning_start.offset()
    }

    /// Slots of `duration_minutes` on a single day, stepped by the configured
    /// granularity from work start, stopping before any slot would cross work end.
    /// Yields nothing when the day's bounds or the duration are out of range.
    pub fn slots_for_day(&self, date: NaiveDate, duration_minutes: i64) -> DaySlots {
        let offset = self.offset();
        DaySlots {
            next_start: schedule_utils::at_hour(date, offset, self.preferences.work_start_hour),
            work_end: schedule_utils::at_hour(date, offset, self.preferences.work_end_hour),
            duration: Duration::try_minutes(duration_minutes),
            step: Duration::try_minutes(self.config.slot_granularity_minutes.max(1)),
            not_before: self.planning_start,
        }
    }

    /// Calendar days inside the lookahead window that the user works on.
    pub fn work_days(&self) -> impl Iterator<Item = NaiveDate> + 'a {
        let first = self.planning_start.date_naive();
        let preferences = self.preferences;
        (0..i64::from(self.config.lookahead_days))
            .map_while(move |offset| first.checked_add_signed(Duration::try_days(offset)?))
            .filter(move |date| preferences.is_work_day(date.weekday()))
    }

    /// The full candidate pool for one task, lazily generated day by day.
    pub fn candidates(&self, duration_minutes: i64) -> impl Iterator<Item = TimeSlot> + 'a {
        let generator = *self;
        self.work_days()
            .flat_map(move |date| generator.slots_for_day(date, duration_minutes))
    }

    /// End of the last work day in the lookahead window.
    pub fn horizon_end(&self) -> Option<DateTime<FixedOffset>> {
        let last_offset = i64::from(self.config.lookahead_days.max(1)) - 1;
        let last = self
            .planning_start
            .date_naive()
            .checked_add_signed(Duration::try_days(last_offset)?)?;
        schedule_utils::at_hour(last, self.offset(), self.preferences.work_end_hour)
    }

    /// Work-hour bounds of the day `instant` falls on.
    pub fn work_bounds(
        &self,
        instant: DateTime<FixedOffset>,
    ) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let date = instant.with_timezone(&self.offset()).date_naive();
        Some((
            schedule_utils::at_hour(date, self.offset(), self.preferences.work_start_hour)?,
            schedule_utils::at_hour(date, self.offset(), self.preferences.work_end_hour)?,
        ))
    }

    /// Whether `slot` sits entirely inside one work day's hours, inside the
    /// lookahead window and not before the planning start.
    pub fn fits_work_day(&self, slot: &TimeSlot) -> bool {
        let date = slot.start.with_timezone(&self.offset()).date_naive();
        if !self.preferences.is_work_day(date.weekday()) {
            return false;
        }
        let (Some((work_start, work_end)), Some(horizon)) =
            (self.work_bounds(slot.start), self.horizon_end())
        else {
            return false;
        };
        slot.end > slot.start
            && slot.start >= work_start
            && slot.end <= work_end
            && slot.start >= self.planning_start
            && slot.end <= horizon
    }
}

/// Lazy iterator over one day's candidate slots.
#[derive(Debug, Clone)]
pub struct DaySlots {
    next_start: Option<DateTime<FixedOffset>>,
    work_end: Option<DateTime<FixedOffset>>,
    duration: Option<Duration>,
    step: Option<Duration>,
    not_before: DateTime<FixedOffset>,
}

impl Iterator for DaySlots {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<Self::Item> {
        let work_end = self.work_end?;
        let duration = self.duration.filter(|duration| *duration > Duration::zero())?;
        loop {
            let start = self.next_start.take()?;
            let end = start.checked_add_signed(duration)?;
            if end > work_end {
                return None;
            }
            self.next_start = self.step.and_then(|step| start.checked_add_signed(step));
            if start >= self.not_before {
                return Some(TimeSlot::new(start, end));
            }
        }
    }
}
