//! Attendance endpoints: marking, per-date sheets, the raw ledger and the dashboard.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::{Extension, Json};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AdminOnly, Authenticated};
use crate::ledger::{DayRecords, Status};
use crate::state::AppState;
use crate::stats::{attendance_sheet, daily_summary, DailySummary, SheetRow};
use crate::{proceeds, Error, Payload};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(raw: &str) -> Result<NaiveDate, Error> {
    Ok(NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)?)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkAttendance {
    pub date: String,
    pub student_id: Uuid,
    pub status: Status,
}

/// Any student id is accepted, known to the directory or not.
pub async fn mark_attendance(
    AdminOnly(admin): AdminOnly,
    Extension(state): Extension<AppState>,
    mark: Result<Json<MarkAttendance>, JsonRejection>,
) -> Payload<AttendanceMarked> {
    let Json(mark) = mark?;
    let date = parse_date(&mark.date)?;
    let previous = state
        .mark_attendance(date, mark.student_id, mark.status)
        .await?;
    log::info!(
        "{} marked {} {} on {}",
        admin.email,
        mark.student_id,
        mark.status.as_str(),
        date
    );
    proceeds(AttendanceMarked {
        date,
        student_id: mark.student_id,
        status: mark.status,
        previous,
    })
}

pub async fn sheet_for_date(
    Authenticated(_): Authenticated,
    Path(date): Path<String>,
    Extension(state): Extension<AppState>,
) -> Payload<AttendanceSheet> {
    let date = parse_date(&date)?;
    let students = state.directory().list().await?;
    let ledger = state.ledger().await;
    proceeds(AttendanceSheet {
        date,
        rows: attendance_sheet(&students, &ledger, date),
        summary: daily_summary(&students, &ledger, date),
    })
}

pub async fn ledger_records(
    Authenticated(_): Authenticated,
    Extension(state): Extension<AppState>,
) -> Payload<LedgerSnapshot> {
    let records = state.ledger().await.records().clone();
    proceeds(LedgerSnapshot { records })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub date: Option<String>,
}

/// Summary for one day. Non-admin accounts also see their own mark, when a
/// student in the directory shares their email.
pub async fn dashboard(
    Authenticated(session): Authenticated,
    Query(query): Query<DashboardQuery>,
    Extension(state): Extension<AppState>,
) -> Payload<Dashboard> {
    let date = match query.date.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_date(raw)?,
        _ => today(),
    };
    let students = state.directory().list().await?;
    let ledger = state.ledger().await;

    let own_attendance = if session.is_admin() {
        None
    } else {
        students
            .iter()
            .find(|student| student.email == session.email)
            .map(|student| OwnAttendance {
                student_id: student.id,
                name: student.name.clone(),
                status: ledger
                    .status(date, student.id)
                    .map(|status| status.as_str())
                    .unwrap_or("not_marked"),
            })
    };

    proceeds(Dashboard {
        viewer: session.name.clone(),
        is_admin: session.is_admin(),
        summary: daily_summary(&students, &ledger, date),
        own_attendance,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceMarked {
    pub date: NaiveDate,
    pub student_id: Uuid,
    pub status: Status,
    pub previous: Option<Status>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSheet {
    pub date: NaiveDate,
    pub rows: Vec<SheetRow>,
    pub summary: DailySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub records: BTreeMap<NaiveDate, DayRecords>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnAttendance {
    pub student_id: Uuid,
    pub name: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub viewer: String,
    pub is_admin: bool,
    pub summary: DailySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_attendance: Option<OwnAttendance>,
}
