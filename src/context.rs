use chrono::NaiveDate;

use crate::calendar::{GridCell, MonthGrid, MonthIndex};
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::notes::{NoteKey, NotesMap};
use crate::render::situation_color;
use crate::schedule::{ScheduleType, Situation};
use crate::shift;
use crate::swipe::Swipe;

/// A day of the displayed month with everything needed to draw it.
#[derive(Clone, Debug, PartialEq)]
pub struct DayView {
    pub date: NaiveDate,
    pub offset: Option<u32>,
    pub situation: Option<Situation>,
    /// Background colour of the situation category.
    pub color: &'static str,
    pub is_today: bool,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellView {
    Blank,
    Day(DayView),
}

#[derive(Clone, Debug)]
pub struct MonthView {
    pub month: MonthIndex,
    pub rows: Vec<Vec<CellView>>,
}

impl MonthView {
    pub fn days(&self) -> impl Iterator<Item = &DayView> + '_ {
        self.rows.iter().flatten().filter_map(|cell| match cell {
            CellView::Day(day) => Some(day),
            CellView::Blank => None,
        })
    }
}

/// Selection state of the calendar: active schedule, rotation and month.
#[derive(Clone, Debug)]
pub struct Context {
    schedule: ScheduleType,
    rotation: usize,
    month: MonthIndex,
    today: NaiveDate,
    swipe: Swipe,
}

impl Context {
    /// Starts on the month of `today`. Falls back to the first rotation if
    /// `rotation` does not exist for `schedule`.
    pub fn new(schedule: ScheduleType, rotation: usize, today: NaiveDate) -> Self {
        let rotation = if schedule.table().rotation_label(rotation).is_some() {
            rotation
        } else {
            log::warn!(
                "Rotation {} does not exist for schedule {}, using the first one",
                rotation,
                schedule
            );
            1
        };

        Context {
            schedule,
            rotation,
            month: MonthIndex::from(today),
            today,
            swipe: Swipe::default(),
        }
    }

    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self::new(config.schedule, config.rotation, today)
    }

    pub fn schedule(&self) -> ScheduleType {
        self.schedule
    }

    pub fn rotation(&self) -> usize {
        self.rotation
    }

    pub fn rotation_label(&self) -> &'static str {
        self.schedule
            .table()
            .rotation_label(self.rotation)
            .unwrap_or("-")
    }

    pub fn month(&self) -> MonthIndex {
        self.month
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Changing the schedule always restarts at its first rotation.
    pub fn select_schedule(&mut self, schedule: ScheduleType) {
        self.schedule = schedule;
        self.rotation = 1;
    }

    pub fn next_schedule(&mut self) {
        self.select_schedule(self.schedule.next());
    }

    pub fn prev_schedule(&mut self) {
        self.select_schedule(self.schedule.prev());
    }

    pub fn select_rotation(&mut self, rotation: usize) -> Result<()> {
        if self.schedule.table().rotation_label(rotation).is_none() {
            return Err(Error::new(
                ErrorKind::RotationOutOfRange,
                &format!(
                    "schedule {} has rotations 1 to {}",
                    self.schedule,
                    self.schedule.table().rotation_count()
                ),
            ));
        }

        self.rotation = rotation;
        Ok(())
    }

    pub fn next_rotation(&mut self) {
        let count = self.schedule.table().rotation_count();
        self.rotation = if self.rotation >= count {
            1
        } else {
            self.rotation + 1
        };
    }

    pub fn prev_rotation(&mut self) {
        let count = self.schedule.table().rotation_count();
        self.rotation = if self.rotation <= 1 {
            count
        } else {
            self.rotation - 1
        };
    }

    pub fn select_month(&mut self, month: MonthIndex) {
        self.month = month;
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
    }

    pub fn prev_month(&mut self) {
        self.month = self.month.prev();
    }

    pub fn select_today(&mut self) {
        self.month = MonthIndex::from(self.today);
    }

    pub fn update_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn swipe(&self) -> &Swipe {
        &self.swipe
    }

    pub fn swipe_mut(&mut self) -> &mut Swipe {
        &mut self.swipe
    }

    /// Finishes the settle animation and moves the displayed month if the
    /// swipe was committed.
    pub fn finish_swipe(&mut self) {
        if let Some(step) = self.swipe.transition_end() {
            self.month = self.month.shift(step.months());
        }
    }

    pub fn note_key(&self, date: NaiveDate) -> NoteKey {
        NoteKey::new(date, self.schedule, self.rotation)
    }

    /// Note key of a tapped cell. `None` for blanks and for the tap that
    /// ends a drag.
    pub fn tap(&self, grid: &MonthGrid, cell: &GridCell) -> Option<NoteKey> {
        if self.swipe.did_drag() {
            return None;
        }
        grid.date_of(cell).map(|date| self.note_key(date))
    }

    pub fn day_view(&self, date: NaiveDate, notes: &NotesMap) -> DayView {
        let offset = shift::offset_on(&date, self.schedule, self.rotation);
        let situation = offset.and_then(|offset| {
            Situation::from_label(self.schedule.table().situation_label(offset))
        });

        DayView {
            date,
            offset,
            situation,
            color: situation_color(situation.as_ref()),
            is_today: date == self.today,
            note: notes.lookup(&self.note_key(date)).map(str::to_owned),
        }
    }

    pub fn month_view(&self, month: MonthIndex, notes: &NotesMap) -> MonthView {
        let grid = MonthGrid::new(month);
        let rows = grid
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match grid.date_of(cell) {
                        Some(date) => CellView::Day(self.day_view(date, notes)),
                        None => CellView::Blank,
                    })
                    .collect()
            })
            .collect();

        MonthView { month, rows }
    }

    /// Previous, displayed and next month.
    pub fn filmstrip(&self, notes: &NotesMap) -> [MonthView; 3] {
        [
            self.month_view(self.month.prev(), notes),
            self.month_view(self.month, notes),
            self.month_view(self.month.next(), notes),
        ]
    }
}
