//! Next-run calculation for recurring tasks.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use db::{
    models::recurring_task::{CreateRecurringTask, RecurringTask},
    validation::{ValidationError, validate_frequency, validate_interval},
};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// The schedule part of a recurrence rule.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub frequency: Frequency,
    pub interval: u32,
    /// 0 = Sunday
    pub days_of_week: Vec<u32>,
    pub day_of_month: Option<u32>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn parse(
        frequency: &str,
        interval: i64,
        days_of_week: Option<&[u32]>,
        day_of_month: Option<i64>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        validate_frequency(frequency)?;
        validate_interval(interval)?;
        let frequency = Frequency::from_str(frequency)
            .map_err(|_| ValidationError::InvalidFrequency(frequency.to_string()))?;

        Ok(Self {
            frequency,
            interval: u32::try_from(interval).unwrap_or(u32::MAX),
            days_of_week: days_of_week
                .map(|days| days.iter().copied().filter(|d| *d < 7).collect())
                .unwrap_or_default(),
            day_of_month: day_of_month.and_then(|d| u32::try_from(d).ok()).filter(|d| *d >= 1),
            end_date,
        })
    }
}

impl TryFrom<&RecurringTask> for Schedule {
    type Error = ValidationError;

    fn try_from(rule: &RecurringTask) -> Result<Self, Self::Error> {
        Schedule::parse(
            &rule.frequency,
            rule.interval,
            rule.days_of_week.as_deref(),
            rule.day_of_month,
            rule.end_date,
        )
    }
}

impl TryFrom<&CreateRecurringTask> for Schedule {
    type Error = ValidationError;

    fn try_from(rule: &CreateRecurringTask) -> Result<Self, Self::Error> {
        Schedule::parse(
            &rule.frequency,
            rule.interval,
            rule.days_of_week.as_deref(),
            rule.day_of_month,
            rule.end_date,
        )
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// First run strictly after `from`, or `None` once the rule has passed its end date.
pub fn next_run(schedule: &Schedule, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let interval = schedule.interval.max(1);

    let next = match schedule.frequency {
        Frequency::Daily => from.checked_add_days(Days::new(interval as u64))?,
        Frequency::Weekly if schedule.days_of_week.is_empty() => {
            from.checked_add_days(Days::new(7 * interval as u64))?
        }
        Frequency::Weekly => {
            let today = from.weekday().num_days_from_sunday();
            let offset = (1..=7)
                .find(|offset| schedule.days_of_week.contains(&((today + offset) % 7)))?;
            let candidate = from.checked_add_days(Days::new(offset as u64))?;
            // Wrapping into the following week skips the weeks in between.
            if today + offset >= 7 {
                candidate.checked_add_days(Days::new(7 * (interval as u64 - 1)))?
            } else {
                candidate
            }
        }
        Frequency::Monthly => {
            let shifted = from
                .with_day(1)?
                .checked_add_months(Months::new(interval))?;
            let wanted = schedule.day_of_month.unwrap_or(from.day());
            let day = wanted.min(days_in_month(shifted.year(), shifted.month()));
            shifted.with_day(day)?
        }
        Frequency::Yearly => {
            let shifted = from
                .with_day(1)?
                .checked_add_months(Months::new(12 * interval))?;
            let day = from.day().min(days_in_month(shifted.year(), shifted.month()));
            shifted.with_day(day)?
        }
    };

    match schedule.end_date {
        Some(end) if next > end => None,
        _ => Some(next),
    }
}
