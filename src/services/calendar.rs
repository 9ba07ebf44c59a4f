// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Month calendar grid for the class schedule.
//!
//! Weeks start on Sunday. Cells before the first and after the last day of
//! the month are empty so every row has exactly seven cells.

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::models::GymClass;
use crate::time_utils::YearMonth;

pub const DAYS_PER_WEEK: usize = 7;

/// A class taking place on a particular day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassOccurrence {
    pub class_id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub booked: u32,
    pub capacity: u32,
    pub trainer_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day: u32,
    pub classes: Vec<ClassOccurrence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub month: String,
    pub days_in_month: u32,
    /// Rows of seven cells, Sunday first. `None` pads outside the month.
    pub weeks: Vec<Vec<Option<CalendarDay>>>,
}

/// Build the grid for `month`, placing each class on the days it occurs.
pub fn build_month(month: YearMonth, classes: &[GymClass]) -> CalendarMonth {
    let first = month.first_day();
    let days_in_month = month.days_in_month();
    let offset = first.weekday().num_days_from_sunday() as usize;
    let cell_count = (offset + days_in_month as usize).div_ceil(DAYS_PER_WEEK) * DAYS_PER_WEEK;

    let mut cells: Vec<Option<CalendarDay>> = Vec::with_capacity(cell_count);
    cells.resize(offset, None);

    for day in 1..=days_in_month {
        let Some(date) = first.checked_add_days(Days::new(u64::from(day - 1))) else {
            break;
        };

        let mut occurrences: Vec<ClassOccurrence> = classes
            .iter()
            .filter(|c| c.schedule.occurs_on(date))
            .map(|c| ClassOccurrence {
                class_id: c.id.clone(),
                name: c.name.clone(),
                start_time: c.start_time,
                duration_minutes: c.duration_minutes,
                booked: c.booked_client_ids.len() as u32,
                capacity: c.capacity,
                trainer_ids: c.trainer_ids.clone(),
            })
            .collect();
        occurrences.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.name.cmp(&b.name))
        });

        cells.push(Some(CalendarDay {
            date,
            day,
            classes: occurrences,
        }));
    }

    cells.resize(cell_count, None);

    CalendarMonth {
        month: month.to_string(),
        days_in_month,
        weeks: cells
            .chunks(DAYS_PER_WEEK)
            .map(|week| week.to_vec())
            .collect(),
    }
}
