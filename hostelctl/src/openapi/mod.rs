//! OpenAPI document for the JSON API, served at `/api/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api::{handlers, models};

/// Session cookie security scheme. The cookie is set by `POST /login`.
struct CookieSecurityAddon;

impl Modify for CookieSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "hostel_session",
                    "Session cookie issued by the login form. Requests without a valid session are redirected to /login.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "hostelctl API",
        description = "Students, rooms and fee payments for a hostel office."
    ),
    paths(
        handlers::stats::get_stats,
        handlers::students::list_students,
        handlers::students::create_student,
        handlers::students::get_student,
        handlers::students::delete_student,
        handlers::rooms::list_rooms,
        handlers::rooms::create_room,
        handlers::rooms::get_room,
        handlers::rooms::update_room_status,
        handlers::rooms::delete_room,
        handlers::payments::list_payments,
        handlers::payments::create_payment,
        handlers::payments::get_payment,
        handlers::payments::update_payment_status,
        handlers::payments::delete_payment,
    ),
    components(schemas(
        models::responses::MessageResponse,
        models::responses::CreatedResponse,
        models::responses::ErrorResponse,
        models::stats::DashboardStats,
        models::students::StudentCreate,
        models::students::StudentResponse,
        models::rooms::RoomCreate,
        models::rooms::RoomStatusUpdate,
        models::rooms::RoomResponse,
        models::payments::PaymentCreate,
        models::payments::PaymentStatusUpdate,
        models::payments::PaymentResponse,
        crate::db::models::rooms::RoomStatus,
    )),
    modifiers(&CookieSecurityAddon),
    tags(
        (name = "dashboard", description = "Summary figures"),
        (name = "students", description = "Student records and room assignment"),
        (name = "rooms", description = "Rooms, capacity and status"),
        (name = "payments", description = "Fee payments"),
    )
)]
pub struct ApiDoc;
