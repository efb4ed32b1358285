#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static HOMESTAY_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Rate limiting interferes with test loops from 127.0.0.1
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        // Cookie jars refuse Secure cookies over plain http
        std::env::set_var("AUTH_COOKIE_SECURE", "false");
        let config = homestay::config::jwt::JwtConfig::from_env().unwrap();
        let _ = homestay::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        homestay::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables (reverse dependency order)
    cleanup_tables(&db).await;

    let email_service = homestay::services::email::EmailService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(homestay::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    TestApp {
        addr: addr_str,
        db,
        client,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "password_reset_tokens",
        "bookings",
        "homestay_facilities",
        "facilities",
        "rooms",
        "homestays",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register an APPROVED user with the given role and log them in.
/// Returns (user_id, access_token).
pub async fn create_approved_user(app: &TestApp, name_prefix: &str, role: &str) -> (i32, String) {
    static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_name = format!("{}_{}", name_prefix, counter);
    let email = format!("{}@test.com", unique_name);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": unique_name,
            "email": email,
            "password": "test_password_123",
            "role": role,
            "verification_status": "APPROVED"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for '{}': status={}, error={}",
            unique_name, status, e
        );
    });
    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register '{}': status={}, body={}",
            unique_name, status, body
        );
    }
    let user_id = body["data"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Register response missing id: {:?}", body))
        as i32;

    let token = login(app, &email, "test_password_123").await;
    (user_id, token)
}

/// Log in and return the access token.
pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse login response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to log in '{}': status={}, body={}", email, status, body);
    }
    body["data"]["access_token"]
        .as_str()
        .expect("Login response missing access_token")
        .to_string()
}

/// Create a homestay with the given capacity and return its ID.
pub async fn create_test_homestay(app: &TestApp, owner_token: &str, total_capacity: i32) -> i32 {
    let counter = HOMESTAY_COUNTER.fetch_add(1, Ordering::SeqCst);

    let resp = app
        .client
        .post(app.url("/homestay"))
        .bearer_auth(owner_token)
        .json(&serde_json::json!({
            "name": format!("Test Homestay {}", counter),
            "description": "A test homestay",
            "location": format!("Test Village {}", counter),
            "total_capacity": total_capacity,
            "check_in": "2026-01-01T14:00:00",
            "check_out": "2026-01-01T11:00:00",
            "rooms": [
                {
                    "name": "Room A",
                    "description": "First room",
                    "price": 100,
                    "adults": 2,
                    "children": 1,
                    "total_people": 3
                },
                {
                    "name": "Room B",
                    "description": "Second room",
                    "price": 150,
                    "adults": 2,
                    "total_people": 2
                }
            ],
            "facilities": ["WiFi", "Parking"]
        }))
        .send()
        .await
        .expect("Failed to create homestay");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create homestay: status={}, body={}", status, body);
    }
    body["data"]["id"].as_i64().expect("Response missing id") as i32
}

/// Create a booking for `total_people` guests, returning the full response body.
pub async fn create_test_booking(
    app: &TestApp,
    guest_token: &str,
    homestay_id: i32,
    total_people: i32,
) -> (reqwest::StatusCode, serde_json::Value) {
    let resp = app
        .client
        .post(app.url("/bookings"))
        .bearer_auth(guest_token)
        .json(&serde_json::json!({
            "homestay_id": homestay_id,
            "check_in": "2026-06-01T14:00:00",
            "check_out": "2026-06-05T11:00:00",
            "adults": total_people,
            "total_people": total_people
        }))
        .send()
        .await
        .expect("Failed to create booking");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse booking response");
    (status, body)
}

/// Fetch a homestay through the API and return its body `data`.
pub async fn get_homestay(app: &TestApp, token: &str, homestay_id: i32) -> serde_json::Value {
    let resp = app
        .client
        .get(app.url(&format!("/homestay/{}", homestay_id)))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to get homestay");

    let body: serde_json::Value = resp.json().await.expect("Failed to parse homestay response");
    body["data"].clone()
}

/// Read a homestay's total_booked counter straight from the database.
pub async fn total_booked(db: &DatabaseConnection, homestay_id: i32) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT total_booked FROM homestays WHERE id = $1",
            vec![homestay_id.into()],
        ))
        .await
        .expect("Failed to query total_booked")
        .expect("Homestay row missing");
    row.try_get::<i32>("", "total_booked")
        .expect("total_booked column missing")
}

/// Read the distinct room statuses of a homestay from the database.
pub async fn room_statuses(db: &DatabaseConnection, homestay_id: i32) -> Vec<String> {
    let rows = db
        .query_all(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT status FROM rooms WHERE homestay_id = $1 ORDER BY id",
            vec![homestay_id.into()],
        ))
        .await
        .expect("Failed to query room statuses");
    rows.into_iter()
        .map(|row| row.try_get::<String>("", "status").expect("status column"))
        .collect()
}

/// Mark rooms of a homestay BOOKED directly, to exercise the cancel reset path.
pub async fn mark_rooms_booked(db: &DatabaseConnection, homestay_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE rooms SET status = 'BOOKED' WHERE homestay_id = $1",
        vec![homestay_id.into()],
    ))
    .await
    .expect("Failed to mark rooms booked");
}
