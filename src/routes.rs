use axum::handler::Handler;
use axum::routing::{get, post};
use axum::{Extension, Router};

use crate::state::AppState;
use crate::{attendance, auth, err, students};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::current_session))
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/:id",
            get(students::student_profile)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/attendance", post(attendance::mark_attendance))
        .route("/attendance/:date", get(attendance::sheet_for_date))
        .route("/ledger", get(attendance::ledger_records))
        .route("/dashboard", get(attendance::dashboard))
        .fallback(err::handler404.into_service())
        .layer(Extension(state))
}
