//! Free-text notes keyed by day and by the schedule/rotation pair that was
//! active when the note was written.

pub mod store;

pub use store::{read_notes, FileStore, KeyValueStore, MemoryStore, NoteStore, DEFAULT_STORAGE_KEY};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::date_key;
use crate::error::Result;
use crate::schedule::ScheduleType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoteKey {
    pub date: NaiveDate,
    pub schedule: ScheduleType,
    pub rotation: usize,
}

impl NoteKey {
    pub fn new(date: NaiveDate, schedule: ScheduleType, rotation: usize) -> Self {
        NoteKey {
            date,
            schedule,
            rotation,
        }
    }

    pub fn date_key(&self) -> String {
        date_key(&self.date)
    }

    /// `"<schedule>_<rotation>"`, e.g. `"2_3"`.
    pub fn slot(&self) -> String {
        slot_key(self.schedule.number(), self.rotation)
    }
}

pub fn slot_key(schedule: u8, rotation: usize) -> String {
    format!("{}_{}", schedule, rotation)
}

/// `date key -> slot -> text`. Date entries never hold an empty slot map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotesMap(BTreeMap<String, BTreeMap<String, String>>);

impl NotesMap {
    pub fn new() -> Self {
        NotesMap::default()
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut notes: NotesMap = serde_json::from_str(raw)?;
        notes.0.retain(|_, slots| !slots.is_empty());
        Ok(notes)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of days with at least one note.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn lookup(&self, key: &NoteKey) -> Option<&str> {
        self.lookup_raw(&key.date_key(), &key.slot())
    }

    pub fn lookup_raw(&self, date_key: &str, slot: &str) -> Option<&str> {
        self.0
            .get(date_key)
            .and_then(|slots| slots.get(slot))
            .map(String::as_str)
    }

    /// All notes of a day, whatever schedule they were written under.
    pub fn notes_on<'a>(&'a self, date_key: &str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.0
            .get(date_key)
            .into_iter()
            .flat_map(|slots| slots.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// A copy of `self` with the note set.
    pub fn with_note(&self, key: &NoteKey, text: &str) -> NotesMap {
        let mut next = self.clone();
        next.0
            .entry(key.date_key())
            .or_default()
            .insert(key.slot(), text.to_owned());
        next
    }

    /// A copy of `self` without the note. Drops the day once it is empty.
    pub fn without_note(&self, key: &NoteKey) -> NotesMap {
        let mut next = self.clone();
        let date_key = key.date_key();

        if let Some(slots) = next.0.get_mut(&date_key) {
            slots.remove(&key.slot());
            if slots.is_empty() {
                next.0.remove(&date_key);
            }
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(date: &str, schedule: u8, rotation: usize) -> NoteKey {
        NoteKey::new(
            crate::calendar::parse_date_key(date).unwrap(),
            ScheduleType::from_number(schedule).unwrap(),
            rotation,
        )
    }

    #[test]
    fn notes_are_qualified_by_schedule_and_rotation() {
        let notes = NotesMap::new().with_note(&key("2025-06-15", 2, 3), "dentist");

        assert_eq!(notes.lookup(&key("2025-06-15", 2, 3)), Some("dentist"));
        assert_eq!(notes.lookup(&key("2025-06-15", 2, 4)), None);
        assert_eq!(notes.lookup(&key("2025-06-15", 1, 3)), None);
        assert_eq!(notes.lookup_raw("2025-06-15", "2_3"), Some("dentist"));
    }

    #[test]
    fn with_note_leaves_original_untouched() {
        let before = NotesMap::new();
        let after = before.with_note(&key("2025-01-01", 1, 1), "x");

        assert!(before.is_empty());
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn empty_text_is_kept_as_a_note() {
        let notes = NotesMap::new().with_note(&key("2025-01-01", 1, 1), "");
        assert_eq!(notes.lookup(&key("2025-01-01", 1, 1)), Some(""));
    }

    #[test]
    fn removing_last_slot_drops_the_day() {
        let k = key("2025-06-15", 2, 3);
        let other = key("2025-06-15", 3, 1);
        let notes = NotesMap::new().with_note(&k, "a").with_note(&other, "b");

        let one_left = notes.without_note(&k);
        assert_eq!(one_left.notes_on("2025-06-15").count(), 1);

        let none_left = one_left.without_note(&other);
        assert!(none_left.is_empty());
        assert_eq!(none_left.to_json().unwrap(), "{}");
    }

    #[test]
    fn removing_missing_note_changes_nothing() {
        let notes = NotesMap::new().with_note(&key("2025-06-15", 2, 3), "a");
        assert_eq!(notes.without_note(&key("2025-06-16", 2, 3)), notes);
        assert_eq!(notes.without_note(&key("2025-06-15", 2, 4)), notes);
    }

    #[test]
    fn json_layout() {
        let notes = NotesMap::new().with_note(&key("2025-06-15", 2, 3), "hello");
        let json = notes.to_json().unwrap();

        assert_eq!(json, r#"{"2025-06-15":{"2_3":"hello"}}"#);
        assert_eq!(NotesMap::from_json(&json).unwrap(), notes);
    }

    #[test]
    fn empty_days_are_pruned_on_parse() {
        let notes = NotesMap::from_json(r#"{"2025-06-15":{}}"#).unwrap();
        assert!(notes.is_empty());
        assert!(NotesMap::from_json(r#"{"2025-06-15":{"1_1":3}}"#).is_err());
    }
}
