//! API models for the dashboard summary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Dashboard aggregates. A figure whose query failed is left out rather than failing the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_students: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rooms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_rooms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_fees: Option<f64>,
}
