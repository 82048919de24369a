//! Test utilities shared by the unit and HTTP tests.
//!
//! Database tests take their pool from `#[sqlx::test]`, which migrates a fresh database per test.

use axum_test::TestServer;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    AppState,
    auth::password::Credential,
    config::Config,
    db::{
        handlers::{Repository, Rooms, Sessions, Students, Users},
        models::{
            payments::PaymentCreateDBRequest,
            rooms::{RoomCreateDBRequest, RoomDBResponse},
            students::{StudentCreateDBRequest, StudentDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::StudentId,
};

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.pool.max_connections = 1;
    config.database.pool.idle_timeout = None;
    config.database.pool.max_lifetime = None;
    config
}

pub fn create_test_state(pool: SqlitePool) -> AppState {
    AppState::builder().db(pool).config(create_test_config()).build()
}

pub async fn create_test_user(pool: &SqlitePool, username: &str, password: &str) -> UserDBResponse {
    let credential = Credential::hash(password).expect("Failed to hash password");
    let mut conn = pool.acquire().await.unwrap();
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            password_hash: credential.as_stored().to_string(),
        })
        .await
        .expect("Failed to create test user")
}

/// Insert a user whose password is stored verbatim, as accounts provisioned before hashing are.
pub async fn insert_legacy_user(pool: &SqlitePool, username: &str, password: &str) -> UserDBResponse {
    sqlx::query_as::<_, UserDBResponse>(
        "INSERT INTO users (username, password, created_at) VALUES (?, ?, ?) RETURNING id, username, password, created_at",
    )
    .bind(username)
    .bind(password)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .expect("Failed to insert legacy user")
}

pub async fn create_test_room(pool: &SqlitePool, room_number: &str, capacity: i64) -> RoomDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Rooms::new(&mut conn)
        .create(&RoomCreateDBRequest {
            room_number: room_number.to_string(),
            capacity,
        })
        .await
        .expect("Failed to create test room")
}

pub fn student_request(roll_number: &str, room_number: &str) -> StudentCreateDBRequest {
    StudentCreateDBRequest {
        name: format!("Student {roll_number}"),
        email: format!("{}@example.com", roll_number.to_lowercase()),
        roll_number: roll_number.to_string(),
        room_number: room_number.to_string(),
        phone: None,
    }
}

pub async fn create_test_student(pool: &SqlitePool, roll_number: &str, room_number: &str) -> StudentDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Students::new(&mut conn)
        .create(&student_request(roll_number, room_number))
        .await
        .expect("Failed to create test student")
}

pub fn payment_request(student_id: StudentId, amount: f64) -> PaymentCreateDBRequest {
    PaymentCreateDBRequest {
        student_id,
        amount,
        payment_type: "hostel_fee".to_string(),
        payment_date: Utc::now().date_naive(),
    }
}

/// `Cookie` header carrying a session token.
pub fn session_cookie_header(config: &Config, token: &str) -> (String, String) {
    ("cookie".to_string(), format!("{}={}", config.auth.session.cookie_name, token))
}

/// The full application router over `pool`, plus a cookie header for a logged-in staff member.
pub async fn create_test_app(pool: SqlitePool) -> (TestServer, (String, String)) {
    let config = create_test_config();
    let user = create_test_user(&pool, "warden", "warden-password").await;

    let mut conn = pool.acquire().await.unwrap();
    let (token, _) = Sessions::new(&mut conn)
        .create_for_user(&user, &config)
        .await
        .expect("Failed to create session");
    drop(conn);

    let cookie = session_cookie_header(&config, &token);
    let state = AppState::builder().db(pool).config(config).build();
    let router = crate::build_router(state).expect("Failed to build router");

    (TestServer::new(router).expect("Failed to create test server"), cookie)
}
