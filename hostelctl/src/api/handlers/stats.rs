use axum::{Json, extract::State};
use tracing::warn;

use crate::{AppState, api::models::stats::DashboardStats, db::handlers::stats};

/// Keep a figure if its query succeeded; otherwise log and drop it.
fn figure<T>(name: &str, result: crate::db::errors::Result<T>) -> Option<T> {
    result
        .inspect_err(|e| warn!(figure = name, error = %e, "Dashboard figure unavailable"))
        .ok()
}

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "dashboard",
    summary = "Dashboard figures",
    description = "Student and room counts plus the total of pending fees. A figure that could not be read is omitted.",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStats),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let (total_students, total_rooms, available_rooms, pending_fees) = tokio::join!(
        stats::total_students(&state.db),
        stats::total_rooms(&state.db),
        stats::available_rooms(&state.db),
        stats::pending_fees(&state.db),
    );

    Json(DashboardStats {
        total_students: figure("totalStudents", total_students),
        total_rooms: figure("totalRooms", total_rooms),
        available_rooms: figure("availableRooms", available_rooms),
        pending_fees: figure("pendingFees", pending_fees),
    })
}
