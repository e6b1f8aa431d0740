use chrono::{Datelike, Month, NaiveDate};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Sunday first, matching the grid columns.
pub const WEEKDAY_NAMES: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

pub fn month_name(month: &Month) -> &'static str {
    MONTH_NAMES[month.number_from_month() as usize - 1]
}

pub fn days_of_month(month: &Month, year: i32) -> u32 {
    let this = MonthIndex::new(*month, year);
    match (this.first_day(), (this + 1).first_day()) {
        (Some(begin), Some(end)) => end.signed_duration_since(begin).num_days() as u32,
        _ => 0,
    }
}

/// Canonical `YYYY-MM-DD` key of a day.
pub fn date_key(date: &NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT)?)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthIndex {
    pub index: Month,
    pub year: i32,
}

impl MonthIndex {
    pub fn new(index: Month, year: i32) -> Self {
        MonthIndex { index, year }
    }

    /// `None` if `month` is not within 1..=12 or the month has no
    /// representable first day.
    pub fn from_ymd(year: i32, month: u32) -> Option<Self> {
        month
            .checked_sub(1)
            .and_then(|idx| MONTHS.get(idx as usize))
            .map(|m| MonthIndex::new(*m, year))
            .filter(|index| index.first_day().is_some())
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.index.number_from_month(), 1)
    }

    pub fn num_days(&self) -> u32 {
        days_of_month(&self.index, self.year)
    }

    pub fn next(self) -> Self {
        self.shift(1)
    }

    pub fn prev(self) -> Self {
        self.shift(-1)
    }

    /// Saturates at the first and last month of the `i32` year range.
    pub fn shift(self, months: i32) -> Self {
        let total = i64::from(self.year) * 12 + i64::from(self.index.number_from_month()) - 1
            + i64::from(months);
        let min = i64::from(i32::MIN) * 12;
        let max = i64::from(i32::MAX) * 12 + 11;
        let total = total.clamp(min, max);

        MonthIndex {
            index: MONTHS[total.rem_euclid(12) as usize],
            year: total.div_euclid(12) as i32,
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.index.number_from_month()
    }
}

impl<T: Datelike> From<T> for MonthIndex {
    fn from(date: T) -> Self {
        MonthIndex {
            index: MONTHS[date.month0() as usize],
            year: date.year(),
        }
    }
}

impl Add<u32> for MonthIndex {
    type Output = MonthIndex;
    fn add(self, rhs: u32) -> Self::Output {
        self.shift(rhs as i32)
    }
}

impl Sub<u32> for MonthIndex {
    type Output = MonthIndex;
    fn sub(self, rhs: u32) -> Self::Output {
        self.shift(-(rhs as i32))
    }
}

impl fmt::Display for MonthIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", month_name(&self.index), self.year)
    }
}

/// Parses `YYYY-MM`.
impl FromStr for MonthIndex {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parsed = s
            .trim()
            .split_once('-')
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)))
            .and_then(|(y, m)| MonthIndex::from_ymd(y, m));

        parsed.ok_or_else(|| {
            Error::new(
                ErrorKind::DateParse,
                &format!("'{}' is not a month of the form YYYY-MM", s),
            )
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridCell {
    Blank,
    Day(u32),
}

impl GridCell {
    pub fn day(&self) -> Option<u32> {
        match self {
            GridCell::Blank => None,
            GridCell::Day(day) => Some(*day),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, GridCell::Blank)
    }
}

const GRID_COLUMNS: usize = 7;
const GRID_ROWS: usize = 6;

/// Six weeks of seven days, Sunday first, padded with blanks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthGrid {
    month: MonthIndex,
    rows: [[GridCell; GRID_COLUMNS]; GRID_ROWS],
}

impl MonthGrid {
    pub const COLUMNS: usize = GRID_COLUMNS;
    pub const ROWS: usize = GRID_ROWS;

    pub fn new(month: MonthIndex) -> Self {
        let mut rows = [[GridCell::Blank; Self::COLUMNS]; Self::ROWS];

        if let Some(first) = month.first_day() {
            let offset = first.weekday().num_days_from_sunday() as usize;
            let num_days = month.num_days() as usize;

            for day in 1..=num_days {
                let pos = offset + day - 1;
                if pos >= Self::ROWS * Self::COLUMNS {
                    break;
                }
                rows[pos / Self::COLUMNS][pos % Self::COLUMNS] = GridCell::Day(day as u32);
            }
        }

        MonthGrid { month, rows }
    }

    pub fn month(&self) -> MonthIndex {
        self.month
    }

    pub fn rows(&self) -> &[[GridCell; GRID_COLUMNS]; GRID_ROWS] {
        &self.rows
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> + '_ {
        self.rows.iter().flat_map(|row| row.iter())
    }

    pub fn date_of(&self, cell: &GridCell) -> Option<NaiveDate> {
        cell.day().and_then(|day| {
            NaiveDate::from_ymd_opt(self.month.year, self.month.index.number_from_month(), day)
        })
    }
}

pub fn build_month_grid(year: i32, month: Month) -> MonthGrid {
    MonthGrid::new(MonthIndex::new(month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_2025_grid() {
        let grid = build_month_grid(2025, Month::February);
        let cells: Vec<&GridCell> = grid.cells().collect();

        assert_eq!(grid.rows().len(), 6);
        assert!(grid.rows().iter().all(|row| row.len() == 7));
        assert_eq!(cells.len(), 42);

        let leading = cells.iter().take_while(|c| c.is_blank()).count();
        let trailing = cells.iter().rev().take_while(|c| c.is_blank()).count();
        assert_eq!(leading, 6);
        assert_eq!(trailing, 42 - 6 - 28);
        assert_eq!(*cells[6], GridCell::Day(1));
        assert_eq!(*cells[33], GridCell::Day(28));
    }

    #[test]
    fn month_starting_on_sunday_has_no_leading_blanks() {
        // June 2025 starts on a Sunday
        let grid = build_month_grid(2025, Month::June);
        assert_eq!(grid.rows()[0][0], GridCell::Day(1));
        assert_eq!(grid.cells().filter(|c| !c.is_blank()).count(), 30);
    }

    #[test]
    fn thirty_one_days_spanning_six_weeks() {
        // March 2025 starts on a Saturday and needs all six rows
        let grid = build_month_grid(2025, Month::March);
        assert_eq!(grid.rows()[0][6], GridCell::Day(1));
        assert_eq!(grid.rows()[5][1], GridCell::Day(31));
        assert_eq!(grid.rows()[5][2], GridCell::Blank);
    }

    #[test]
    fn days_of_month_handles_leap_years() {
        assert_eq!(days_of_month(&Month::February, 2024), 29);
        assert_eq!(days_of_month(&Month::February, 2025), 28);
        assert_eq!(days_of_month(&Month::February, 1900), 28);
        assert_eq!(days_of_month(&Month::February, 2000), 29);
        assert_eq!(days_of_month(&Month::December, 2025), 31);
    }

    #[test]
    fn month_index_arithmetic_wraps_years() {
        let jan = MonthIndex::new(Month::January, 2025);
        assert_eq!(jan.prev(), MonthIndex::new(Month::December, 2024));
        assert_eq!(jan + 11, MonthIndex::new(Month::December, 2025));
        assert_eq!(jan + 12, MonthIndex::new(Month::January, 2026));
        assert_eq!(jan + 24, MonthIndex::new(Month::January, 2027));
        assert_eq!(jan - 13, MonthIndex::new(Month::December, 2023));
    }

    #[test]
    fn month_arithmetic_saturates_at_year_limits() {
        let last = MonthIndex::new(Month::December, i32::MAX);
        assert_eq!(last.next(), last);
        assert_eq!(last + 24, last);
        assert_eq!(last.prev(), MonthIndex::new(Month::November, i32::MAX));

        let first = MonthIndex::new(Month::January, i32::MIN);
        assert_eq!(first.prev(), first);
        assert_eq!(first - 1, first);

        let far = MonthIndex::new(Month::January, 300_000_000);
        assert_eq!(far.next(), MonthIndex::new(Month::February, 300_000_000));
        assert_eq!(far.num_days(), 0);
    }

    #[test]
    fn date_keys_are_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        assert_eq!(date_key(&date), "2025-06-05");
        assert_eq!(parse_date_key("2025-06-05").unwrap(), date);
        assert!(parse_date_key("2025-13-01").is_err());
    }

    #[test]
    fn month_index_from_str() {
        assert_eq!(
            "2025-02".parse::<MonthIndex>().unwrap(),
            MonthIndex::new(Month::February, 2025)
        );
        assert!("2025-13".parse::<MonthIndex>().is_err());
        assert!("february".parse::<MonthIndex>().is_err());
        assert!("300000000-01".parse::<MonthIndex>().is_err());
        assert!(MonthIndex::from_ymd(300_000_000, 1).is_none());
        assert_eq!(MonthIndex::new(Month::March, 2025).to_string(), "Março 2025");
    }
}
