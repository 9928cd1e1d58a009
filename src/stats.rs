//! Attendance statistics derived from a snapshot of the directory and ledger.
//!
//! Nothing here is cached; callers recompute on every read. Ledger entries for
//! students missing from the directory are ignored.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::{Ledger, Status};
use crate::models::Student;

/// Number of entries kept in [`StudentHistory::recent`].
pub const RECENT_DAYS: usize = 7;

/// `100 * part / whole` rounded to the nearest integer, halves rounding up. Zero when `whole` is zero.
pub fn rate(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_students: usize,
    pub present: usize,
    pub absent: usize,
    pub unmarked: usize,
    pub rate: u32,
    pub absent_rate: u32,
}

pub fn daily_summary(students: &[Student], ledger: &Ledger, date: NaiveDate) -> DailySummary {
    let enrolled: HashSet<Uuid> = students.iter().map(|s| s.id).collect();
    let day = ledger.for_date(date);

    let (mut present, mut absent) = (0, 0);
    for (student, status) in day.iter() {
        if !enrolled.contains(student) {
            continue;
        }
        match status {
            Status::Present => present += 1,
            Status::Absent => absent += 1,
        }
    }

    let total_students = enrolled.len();
    DailySummary {
        date,
        total_students,
        present,
        absent,
        unmarked: total_students - present - absent,
        rate: rate(present, total_students),
        absent_rate: rate(absent, total_students),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentHistory {
    pub student_id: Uuid,
    pub present: usize,
    pub absent: usize,
    pub total_marked: usize,
    pub rate: u32,
    /// Newest first.
    pub records: Vec<HistoryEntry>,
    pub recent: Vec<HistoryEntry>,
}

pub fn student_history(student_id: Uuid, ledger: &Ledger) -> StudentHistory {
    let mut records: Vec<HistoryEntry> = ledger
        .history(student_id)
        .map(|(date, status)| HistoryEntry { date, status })
        .collect();
    records.sort_by(|a, b| b.date.cmp(&a.date));

    let present = records
        .iter()
        .filter(|entry| entry.status == Status::Present)
        .count();
    let absent = records.len() - present;
    let recent = records.iter().take(RECENT_DAYS).copied().collect();

    StudentHistory {
        student_id,
        present,
        absent,
        total_marked: records.len(),
        rate: rate(present, present + absent),
        records,
        recent,
    }
}

/// One line of the attendance sheet for a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRow {
    pub student_id: Uuid,
    pub name: String,
    pub roll_number: String,
    pub status: Option<Status>,
}

/// The directory in its own order, each student paired with their status on `date`.
pub fn attendance_sheet(students: &[Student], ledger: &Ledger, date: NaiveDate) -> Vec<SheetRow> {
    students
        .iter()
        .map(|student| SheetRow {
            student_id: student.id,
            name: student.name.clone(),
            roll_number: student.roll_number.clone(),
            status: ledger.status(date, student.id),
        })
        .collect()
}
