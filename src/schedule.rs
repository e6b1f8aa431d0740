//! Fixed rotation tables for the four supported shift schedules.
//!
//! Every schedule cycles through a sequence of situations, one per day of
//! its rotation. A rotation label picks the phase of that cycle by anchoring
//! it to its own reference date.

use chrono::NaiveDate;
use phf::phf_map;
use serde_with::DeserializeFromStr;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::calendar::DATE_KEY_FORMAT;
use crate::error::{Error, ErrorKind, Result};

/// Bumped whenever one of the tables below changes.
pub const TABLE_VERSION: u32 = 1;

pub struct ShiftTable {
    pub name: &'static str,
    pub rotation_length: u32,
    pub rotation_labels: &'static [&'static str],
    pub reference_dates: &'static [&'static str],
    pub situations: &'static [&'static str],
}

static TABLES: [ShiftTable; 4] = [
    ShiftTable {
        name: "4X2X4",
        rotation_length: 10,
        rotation_labels: &["A", "B", "C/G", "D", "E", "F", "H", "I", "T"],
        reference_dates: &[
            "2020-01-02", "2020-01-06", "2020-01-04", "2020-01-08", "2020-01-10",
            "2020-01-10", "2020-01-02", "2020-01-06", "2020-01-08",
        ],
        situations: &["T1", "T2", "T3", "T4", "N1", "N2", "F1", "F2", "F3", "F4"],
    },
    ShiftTable {
        name: "4X2-6X4",
        rotation_length: 16,
        rotation_labels: &["A", "B", "C", "D", "E", "F", "G", "H"],
        reference_dates: &[
            "2020-01-16", "2020-01-02", "2020-01-04", "2020-01-06", "2020-01-08",
            "2020-01-10", "2020-01-12", "2020-01-14",
        ],
        situations: &[
            "T1", "T2", "T3", "T4", "T5", "T6", "F1", "F2", "F3", "F4", "T1", "T2", "T3", "T4",
            "F1", "F2",
        ],
    },
    ShiftTable {
        name: "4X1X3-4X2X4",
        rotation_length: 18,
        rotation_labels: &[
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R",
        ],
        reference_dates: &[
            "2020-01-12", "2020-01-14", "2020-01-16", "2020-01-18", "2020-01-02",
            "2020-01-04", "2020-01-06", "2020-01-08", "2020-01-10", "2020-01-01",
            "2020-01-03", "2020-01-05", "2020-01-07", "2020-01-09", "2020-01-11",
            "2020-01-13", "2020-01-15", "2020-01-17",
        ],
        situations: &[
            "T1", "T2", "T3", "T4", "N1", "F1", "F2", "F3", "T1", "T2", "T3", "T4", "N1", "N2",
            "F1", "F2", "F3", "F4",
        ],
    },
    ShiftTable {
        name: "4X1X3",
        rotation_length: 8,
        rotation_labels: &["O", "P", "Q", "R", "V", "X", "Y", "Z"],
        reference_dates: &[
            "2020-01-06", "2020-01-02", "2020-01-08", "2020-01-04", "2020-01-03",
            "2020-01-07", "2020-01-05", "2020-01-01",
        ],
        situations: &["T1", "T2", "T3", "T4", "N1", "F1", "F2", "F3"],
    },
];

static SCHEDULE_NAMES: phf::Map<&'static str, ScheduleType> = phf_map! {
    "4X2X4" => ScheduleType::FourTwoFour,
    "4X2-6X4" => ScheduleType::FourTwoSixFour,
    "4X1X3-4X2X4" => ScheduleType::FourOneThreeFourTwoFour,
    "4X1X3" => ScheduleType::FourOneThree,
};

impl ShiftTable {
    pub fn rotation_count(&self) -> usize {
        self.rotation_labels.len()
    }

    /// Label of a 1-based rotation index.
    pub fn rotation_label(&self, rotation: usize) -> Option<&'static str> {
        rotation
            .checked_sub(1)
            .and_then(|idx| self.rotation_labels.get(idx))
            .copied()
    }

    /// Reference date string of a 1-based rotation index.
    pub fn reference_date(&self, rotation: usize) -> Option<&'static str> {
        rotation
            .checked_sub(1)
            .and_then(|idx| self.reference_dates.get(idx))
            .copied()
    }

    /// 1-based index of a rotation label such as `"C/G"`.
    pub fn rotation_index(&self, label: &str) -> Option<usize> {
        self.rotation_labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(label))
            .map(|idx| idx + 1)
    }

    pub fn situation_label(&self, offset: u32) -> &'static str {
        self.situations.get(offset as usize).copied().unwrap_or("")
    }

    pub fn validate(&self) -> Result<()> {
        if self.situations.len() != self.rotation_length as usize {
            return Err(Error::new(
                ErrorKind::TableInvariant,
                &format!(
                    "schedule '{}' has {} situations for a rotation of {} days",
                    self.name,
                    self.situations.len(),
                    self.rotation_length
                ),
            ));
        }

        if self.rotation_labels.len() != self.reference_dates.len() {
            return Err(Error::new(
                ErrorKind::TableInvariant,
                &format!(
                    "schedule '{}' has {} rotation labels but {} reference dates",
                    self.name,
                    self.rotation_labels.len(),
                    self.reference_dates.len()
                ),
            ));
        }

        for date in self.reference_dates {
            NaiveDate::parse_from_str(date, DATE_KEY_FORMAT).map_err(|e| {
                Error::from(e).with_msg(&format!(
                    "reference date '{}' of schedule '{}' is not a date",
                    date, self.name
                ))
            })?;
        }

        for label in self.situations {
            if !label.is_empty() {
                label.parse::<Situation>()?;
            }
        }

        Ok(())
    }
}

/// Checks the length invariants of every table. Run once at startup.
pub fn validate_tables() -> Result<()> {
    TABLES.iter().try_for_each(ShiftTable::validate)?;
    log::debug!("Shift tables v{} validated", TABLE_VERSION);
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, DeserializeFromStr)]
pub enum ScheduleType {
    FourTwoFour,
    FourTwoSixFour,
    FourOneThreeFourTwoFour,
    FourOneThree,
}

impl Default for ScheduleType {
    fn default() -> Self {
        ScheduleType::FourTwoFour
    }
}

impl ScheduleType {
    pub const ALL: [ScheduleType; 4] = [
        ScheduleType::FourTwoFour,
        ScheduleType::FourTwoSixFour,
        ScheduleType::FourOneThreeFourTwoFour,
        ScheduleType::FourOneThree,
    ];

    pub fn from_number(number: u8) -> Option<Self> {
        (number as usize)
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx))
            .copied()
    }

    /// 1-based number used in note keys.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn table(self) -> &'static ShiftTable {
        &TABLES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.table().name
    }

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for ScheduleType {
    type Error = Error;
    fn try_from(number: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_number(number).ok_or_else(|| {
            Error::new(
                ErrorKind::ScheduleParse,
                &format!("schedule number {} is not between 1 and 4", number),
            )
        })
    }
}

impl FromStr for ScheduleType {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(number) = s.parse::<u8>() {
            return Self::try_from(number);
        }

        SCHEDULE_NAMES
            .get(s.to_uppercase().as_str())
            .copied()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::ScheduleParse,
                    &format!("'{}' is not a known schedule", s),
                )
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SituationKind {
    Work,
    Off,
    Night,
}

impl SituationKind {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'T' => Some(SituationKind::Work),
            'F' => Some(SituationKind::Off),
            'N' => Some(SituationKind::Night),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            SituationKind::Work => 'T',
            SituationKind::Off => 'F',
            SituationKind::Night => 'N',
        }
    }

    /// Name shown in the legend.
    pub fn name(self) -> &'static str {
        match self {
            SituationKind::Work => "Trabalho",
            SituationKind::Off => "Folga",
            SituationKind::Night => "Noturno",
        }
    }
}

/// A two character situation code like `T1` or `F3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Situation {
    pub kind: SituationKind,
    pub index: u8,
}

impl Situation {
    /// `None` for the empty label.
    pub fn from_label(label: &str) -> Option<Self> {
        label.parse().ok()
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.code(), self.index)
    }
}

impl FromStr for Situation {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(code), Some(index), None) => SituationKind::from_code(code)
                .zip(index.to_digit(10))
                .map(|(kind, index)| Situation {
                    kind,
                    index: index as u8,
                }),
            _ => None,
        };

        parsed.ok_or_else(|| {
            Error::new(
                ErrorKind::TableInvariant,
                &format!("'{}' is not a situation code", s),
            )
        })
    }
}
