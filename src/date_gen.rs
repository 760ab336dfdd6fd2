use chrono::{Datelike, Duration, Months, NaiveDate};

/// An inclusive calendar window used for temporal aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn dates(&self) -> Vec<NaiveDate> {
        date_range(self.start, self.end)
    }
}

pub struct DateGenerator {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateGenerator {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn generate_date_series(&self) -> Vec<NaiveDate> {
        date_range(self.start, self.end)
    }

    /// Whole calendar months to aggregate over.
    ///
    /// The first window opens on the first month start after the month end following
    /// `start` (so a range starting on a month end skips the next month), the last one is
    /// the month containing `end`. Each window spans its full month even when `end` falls
    /// mid-month.
    pub fn month_windows(&self) -> Vec<DateWindow> {
        let mut windows = Vec::new();

        let Some(rolled) = roll_forward_month_end(self.start) else {
            return windows;
        };
        let Some(mut month_start) = rolled.succ_opt() else {
            return windows;
        };
        let last_start = first_of_month(self.end);

        while month_start <= last_start {
            let Some(month_end) = last_of_month(month_start) else {
                break;
            };
            windows.push(DateWindow {
                start: month_start,
                end: month_end,
            });
            match month_start.checked_add_months(Months::new(1)) {
                Some(next) => month_start = next,
                None => break,
            }
        }

        windows
    }
}

/// Every day from `start` to `end`, both included.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .collect()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date)
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

// Next month end strictly after `date` when `date` is itself a month end.
fn roll_forward_month_end(date: NaiveDate) -> Option<NaiveDate> {
    let end = last_of_month(date)?;
    if end == date {
        last_of_month(date.succ_opt()?)
    } else {
        Some(end)
    }
}
