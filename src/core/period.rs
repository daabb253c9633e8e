use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jun", "Jul", "Aoû", "Sep", "Oct", "Nov", "Déc",
];
const MONTHS_LONG: [&str; 12] = [
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juillet",
    "Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

/// A calendar month, the bucket used by every periodic report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    /// 1..=12
    month: u32,
}

impl Month {
    /// Returns `None` unless `month` is 1..=12
    pub fn new(year: i32, month: u32) -> Option<Month> {
        (1..=12).contains(&month).then_some(Month { year, month })
    }

    pub fn of(date: NaiveDate) -> Month {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(self) -> Month {
        if self.month == 12 {
            Month { year: self.year + 1, month: 1 }
        } else {
            Month { year: self.year, month: self.month + 1 }
        }
    }

    pub fn prev(self) -> Month {
        if self.month == 1 {
            Month { year: self.year - 1, month: 12 }
        } else {
            Month { year: self.year, month: self.month - 1 }
        }
    }

    /// Every month from `first` to `last` inclusive
    pub fn range(first: Month, last: Month) -> impl Iterator<Item = Month> {
        std::iter::successors(Some(first), move |m| (*m < last).then(|| m.next()))
            .take_while(move |m| *m <= last)
    }

    /// The `count` months ending with `self`, oldest first
    pub fn trailing(self, count: usize) -> Vec<Month> {
        let mut months: Vec<Month> = std::iter::successors(Some(self), |m| Some(m.prev()))
            .take(count)
            .collect();
        months.reverse();
        months
    }

    /// The twelve months of a calendar year
    pub fn year_months(year: i32) -> impl Iterator<Item = Month> {
        (1..=12).map(move |month| Month { year, month })
    }

    /// e.g. "Fév"
    pub fn short_name(&self) -> &'static str {
        MONTHS_SHORT[(self.month - 1) as usize]
    }

    /// e.g. "Février 2025"
    pub fn label(&self) -> String {
        format!("{} {}", MONTHS_LONG[(self.month - 1) as usize], self.year)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
