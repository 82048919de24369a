use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        responses::{CreatedResponse, ErrorResponse, MessageResponse},
        rooms::{ListRoomsQuery, RoomCreate, RoomResponse, RoomStatusUpdate},
    },
    db::{
        handlers::{Repository, Rooms},
        models::rooms::{RoomCreateDBRequest, RoomFilter},
    },
    errors::{Error, Result},
    types::RoomId,
};

fn room_not_found(id: RoomId) -> Error {
    Error::NotFound {
        resource: "Room".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "rooms",
    summary = "List rooms",
    description = "All rooms ordered by room number.",
    params(ListRoomsQuery),
    responses(
        (status = 200, description = "List of rooms", body = Vec<RoomResponse>),
        (status = 303, description = "Not logged in; redirects to /login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_rooms(State(state): State<AppState>, Query(query): Query<ListRoomsQuery>) -> Result<Json<Vec<RoomResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rooms = Rooms::new(&mut conn).list(&RoomFilter { status: query.status }).await?;

    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "rooms",
    summary = "Add room",
    description = "New rooms start empty and available.",
    request_body = RoomCreate,
    responses(
        (status = 200, description = "Room added", body = CreatedResponse),
        (status = 400, description = "Missing fields, non-positive capacity or duplicate room number", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_room(State(state): State<AppState>, Json(create): Json<RoomCreate>) -> Result<Json<CreatedResponse>> {
    let request = RoomCreateDBRequest::try_from(create)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let room = Rooms::new(&mut conn).create(&request).await?;

    info!(room_id = room.id, room_number = %room.room_number, capacity = room.capacity, "Room added");
    Ok(Json(CreatedResponse::new("Room added successfully", room.id)))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "rooms",
    summary = "Get room",
    params(("id" = i64, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room details", body = RoomResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_room(State(state): State<AppState>, Path(id): Path<RoomId>) -> Result<Json<RoomResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let room = Rooms::new(&mut conn).get_by_id(id).await?.ok_or_else(|| room_not_found(id))?;

    Ok(Json(RoomResponse::from(room)))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{id}",
    tag = "rooms",
    summary = "Update room status",
    description = "Only the status can be changed. It must be one of `available`, `full` or `maintenance`.",
    params(("id" = i64, Path, description = "Room ID")),
    request_body = RoomStatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = MessageResponse),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_room_status(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Json(update): Json<RoomStatusUpdate>,
) -> Result<Json<MessageResponse>> {
    let status = update.parse()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Rooms::new(&mut conn)
        .update_status(id, status)
        .await?
        .ok_or_else(|| room_not_found(id))?;

    info!(room_id = id, %status, "Room status updated");
    Ok(Json(MessageResponse::new("Room status updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    tag = "rooms",
    summary = "Delete room",
    description = "Refused while any student is assigned to the room.",
    params(("id" = i64, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room deleted", body = MessageResponse),
        (status = 400, description = "Students still assigned", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_room(State(state): State<AppState>, Path(id): Path<RoomId>) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !Rooms::new(&mut conn).delete(id).await? {
        return Err(room_not_found(id));
    }

    info!(room_id = id, "Room deleted");
    Ok(Json(MessageResponse::new("Room deleted successfully")))
}
