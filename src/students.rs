//! Directory endpoints: listing and profiles for every signed-in account,
//! create/update/delete for admins.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AdminOnly, Authenticated};
use crate::models::{Student, StudentForm};
use crate::state::AppState;
use crate::stats::{student_history, StudentHistory};
use crate::{breaks, proceeds, Error, Payload};

fn student_id(raw: &str) -> Result<Uuid, Error> {
    Ok(Uuid::from_str(raw)?)
}

fn missing(id: Uuid) -> Error {
    Error::not_found(format!("Student `{}` does not exist!", id))
}

pub async fn list_students(
    Authenticated(_): Authenticated,
    Extension(state): Extension<AppState>,
) -> Payload<StudentList> {
    let students: Vec<StudentCard> = state
        .directory()
        .list()
        .await?
        .into_iter()
        .map(StudentCard::from)
        .collect();
    proceeds(StudentList {
        total: students.len(),
        students,
    })
}

pub async fn create_student(
    AdminOnly(admin): AdminOnly,
    Extension(state): Extension<AppState>,
    form: Result<Json<StudentForm>, JsonRejection>,
) -> Payload<StudentCard> {
    let Json(form) = form?;
    form.validate()?;
    let student = state.directory().create(&form).await?;
    log::info!("{} added student {} ({})", admin.email, student.name, student.id);
    proceeds(StudentCard::from(student))
}

pub async fn student_profile(
    Authenticated(_): Authenticated,
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Payload<StudentProfile> {
    let id = student_id(&id)?;
    let student = state.directory().get(id).await?.ok_or_else(|| missing(id))?;
    let history = student_history(student.id, &*state.ledger().await);
    proceeds(StudentProfile {
        student: StudentCard::from(student),
        history,
    })
}

pub async fn update_student(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
    form: Result<Json<StudentForm>, JsonRejection>,
) -> Payload<StudentCard> {
    let id = student_id(&id)?;
    let Json(form) = form?;
    form.validate()?;
    let student = state
        .directory()
        .update(id, &form)
        .await?
        .ok_or_else(|| missing(id))?;
    log::info!("{} updated student {}", admin.email, student.id);
    proceeds(StudentCard::from(student))
}

/// Attendance marks of a deleted student stay in the ledger.
pub async fn delete_student(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<String>,
    Extension(state): Extension<AppState>,
) -> Payload<StudentDeleted> {
    let id = student_id(&id)?;
    if !state.directory().delete(id).await? {
        return breaks(missing(id));
    }
    log::info!("{} deleted student {}", admin.email, id);
    proceeds(StudentDeleted { student_id: id })
}

/// A student as served to clients, with the photo resolved to a displayable URL.
#[derive(Debug, Clone, Serialize)]
pub struct StudentCard {
    #[serde(flatten)]
    pub student: Student,
    pub photo_url: String,
}

impl From<Student> for StudentCard {
    fn from(student: Student) -> Self {
        Self {
            photo_url: student.photo_url(),
            student,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentList {
    pub total: usize,
    pub students: Vec<StudentCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub student: StudentCard,
    pub history: StudentHistory,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDeleted {
    pub student_id: Uuid,
}
