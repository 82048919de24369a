use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        responses::{CreatedResponse, ErrorResponse, MessageResponse},
        students::{ListStudentsQuery, StudentCreate, StudentResponse},
    },
    db::{
        handlers::{Repository, Students},
        models::students::{StudentCreateDBRequest, StudentFilter},
    },
    errors::{Error, Result},
    types::StudentId,
};

#[utoipa::path(
    get,
    path = "/api/students",
    tag = "students",
    summary = "List students",
    description = "All students, most recently added first.",
    params(ListStudentsQuery),
    responses(
        (status = 200, description = "List of students", body = Vec<StudentResponse>),
        (status = 303, description = "Not logged in; redirects to /login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<ListStudentsQuery>,
) -> Result<Json<Vec<StudentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let students = Students::new(&mut conn)
        .list(&StudentFilter {
            room_number: query.room_number,
        })
        .await?;

    Ok(Json(students.into_iter().map(StudentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/students",
    tag = "students",
    summary = "Add student",
    description = "Adds a student and takes one bed in their room.",
    request_body = StudentCreate,
    responses(
        (status = 200, description = "Student added", body = CreatedResponse),
        (status = 400, description = "Missing fields, unknown or full room, or duplicate email or roll number", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_student(State(state): State<AppState>, Json(create): Json<StudentCreate>) -> Result<Json<CreatedResponse>> {
    let request = StudentCreateDBRequest::try_from(create)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let student = Students::new(&mut conn).create(&request).await?;

    info!(student_id = student.id, room_number = %student.room_number, "Student added");
    Ok(Json(CreatedResponse::new("Student added successfully", student.id)))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    tag = "students",
    summary = "Get student",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student details", body = StudentResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_student(State(state): State<AppState>, Path(id): Path<StudentId>) -> Result<Json<StudentResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let student = Students::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(StudentResponse::from(student)))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    tag = "students",
    summary = "Delete student",
    description = "Removes a student and frees their bed. Their payments are kept.",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted", body = MessageResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_student(State(state): State<AppState>, Path(id): Path<StudentId>) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !Students::new(&mut conn).delete(id).await? {
        return Err(Error::NotFound {
            resource: "Student".to_string(),
            id: id.to_string(),
        });
    }

    info!(student_id = id, "Student deleted");
    Ok(Json(MessageResponse::new("Student deleted successfully")))
}
