use chrono::Datelike;
use std::fmt::{self, Display, Write};

use crate::calendar::WEEKDAY_NAMES;
use crate::context::{CellView, Context, DayView, MonthView};
use crate::schedule::{Situation, SituationKind};

const TODAY_CHAR: char = '*';
const NOTE_CHAR: char = '+';

/// Background colour of a day cell by situation category.
pub fn situation_color(situation: Option<&Situation>) -> &'static str {
    match situation.map(|s| s.kind) {
        Some(SituationKind::Work) => "#CE2E2C",
        Some(SituationKind::Off) => "#2F9E58",
        Some(SituationKind::Night) => "#5D42BF",
        None => "#2D3141",
    }
}

/// `#RRGGBB` as an ANSI 24-bit background escape.
fn ansi_background(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#').filter(|hex| hex.len() == 6)?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    Some(format!(
        "\x1b[48;2;{};{};{}m",
        channel(0)?,
        channel(2)?,
        channel(4)?
    ))
}

const ANSI_RESET: &str = "\x1b[0m";

struct DayCell<'a> {
    cell: &'a CellView,
    colored: bool,
}

impl DayCell<'_> {
    const CELL_WIDTH: usize = 7;
}

impl Display for DayCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell {
            CellView::Blank => write!(f, "{:width$}", "", width = Self::CELL_WIDTH),
            CellView::Day(day) => {
                let background = if self.colored {
                    ansi_background(day.color)
                } else {
                    None
                };
                if let Some(escape) = &background {
                    f.write_str(escape)?;
                }

                let today = if day.is_today { TODAY_CHAR } else { ' ' };
                let note = if day.note.is_some() { NOTE_CHAR } else { ' ' };
                let situation = day.situation.map(|s| s.to_string()).unwrap_or_default();

                write!(
                    f,
                    "{}{:>2}{:<3}{}",
                    today,
                    day.date.day(),
                    format!(" {}", situation),
                    note
                )?;

                if background.is_some() {
                    f.write_str(ANSI_RESET)?;
                }
                Ok(())
            }
        }
    }
}

/// Month grid with header, legend and the notes of the month.
pub struct MonthPane<'a> {
    context: &'a Context,
    view: &'a MonthView,
    colored: bool,
}

impl<'a> MonthPane<'a> {
    pub fn new(context: &'a Context, view: &'a MonthView) -> Self {
        MonthPane {
            context,
            view,
            colored: false,
        }
    }

    /// Paints every day cell with the colour of its situation.
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    fn notes(&self) -> impl Iterator<Item = &DayView> + '_ {
        self.view.days().filter(|day| day.note.is_some())
    }
}

impl Display for MonthPane<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Escala: {} | Letra: {}",
            self.context.schedule(),
            self.context.rotation_label()
        )?;
        writeln!(f, "{}", self.view.month)?;

        let mut header = String::new();
        for name in WEEKDAY_NAMES.iter() {
            write!(header, "{:^width$}", name, width = DayCell::CELL_WIDTH)?;
        }
        writeln!(f, "{}", header.trim_end())?;

        for row in self.view.rows.iter() {
            let mut line = String::new();
            for cell in row.iter() {
                write!(
                    line,
                    "{}",
                    DayCell {
                        cell,
                        colored: self.colored
                    }
                )?;
            }
            writeln!(f, "{}", line.trim_end())?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "T {}  F {}  N {}  {} Hoje  {} Nota",
            SituationKind::Work.name(),
            SituationKind::Off.name(),
            SituationKind::Night.name(),
            TODAY_CHAR,
            NOTE_CHAR
        )?;

        for day in self.notes() {
            writeln!(
                f,
                "{:>2}: {}",
                day.date.day(),
                day.note.as_deref().unwrap_or("")
            )?;
        }

        Ok(())
    }
}
