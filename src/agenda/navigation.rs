//! Agenda date cursor.
//!
//! Holds the date the viewer is looking at and nothing else; it only
//! parameterizes date-scoped reads.

use chrono::{Duration, Local, Months, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgendaCursor {
    current: NaiveDate,
}

impl AgendaCursor {
    pub fn today() -> Self {
        Self {
            current: Local::now().date_naive(),
        }
    }

    pub fn at(date: NaiveDate) -> Self {
        Self { current: date }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn next_week(&mut self) -> NaiveDate {
        self.current += Duration::weeks(1);
        self.current
    }

    pub fn prev_week(&mut self) -> NaiveDate {
        self.current -= Duration::weeks(1);
        self.current
    }

    /// Month steps clamp to the last valid day (Jan 31 -> Feb 28).
    pub fn next_month(&mut self) -> NaiveDate {
        self.current = self
            .current
            .checked_add_months(Months::new(1))
            .unwrap_or(self.current);
        self.current
    }

    pub fn prev_month(&mut self) -> NaiveDate {
        self.current = self
            .current
            .checked_sub_months(Months::new(1))
            .unwrap_or(self.current);
        self.current
    }

    pub fn jump_to(&mut self, date: NaiveDate) -> NaiveDate {
        self.current = date;
        self.current
    }

    pub fn reset_to_today(&mut self) -> NaiveDate {
        self.current = Local::now().date_naive();
        self.current
    }
}
