//! The attendance ledger: `date -> (student -> status)`.
//!
//! A missing entry means "not marked". Each `(date, student)` pair holds at
//! most one status and a new mark replaces the old one. Entries are never
//! removed, including those of students that were later deleted from the
//! directory.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::Absent => "absent",
        }
    }
}

pub type DayRecords = BTreeMap<Uuid, Status>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: BTreeMap<NaiveDate, DayRecords>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status for `(date, student)` and returns the status it replaced.
    pub fn mark(&mut self, date: NaiveDate, student: Uuid, status: Status) -> Option<Status> {
        self.records.entry(date).or_default().insert(student, status)
    }

    pub fn status(&self, date: NaiveDate, student: Uuid) -> Option<Status> {
        self.records
            .get(&date)
            .and_then(|day| day.get(&student))
            .copied()
    }

    pub fn for_date(&self, date: NaiveDate) -> DayRecords {
        self.records.get(&date).cloned().unwrap_or_default()
    }

    pub fn records(&self) -> &BTreeMap<NaiveDate, DayRecords> {
        &self.records
    }

    /// Every marked day of one student, oldest first.
    pub fn history(&self, student: Uuid) -> impl Iterator<Item = (NaiveDate, Status)> + '_ {
        self.records
            .iter()
            .filter_map(move |(date, day)| day.get(&student).map(|status| (*date, *status)))
    }

    /// Total number of marks across all dates.
    pub fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
