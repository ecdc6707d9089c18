use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware, Router,
};
use server::db::AppState;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::OnceLock;
use tower::ServiceExt;

/// Tables to truncate before each test run (child tables before parents).
/// `roles` stays: it is seeded reference data.
const ALL_TABLES: &str = "reply_likes, replies, topics, deliveries, lessons_done, \
    enrollments, lessons, offers, courses, refresh_tokens, user_roles, users";

/// One-time flag to ensure we only set up the test database once per process.
static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Set up the test database and override DATABASE_URL so all subsequent pool
/// creation uses the `_test` database instead of the main one.
async fn ensure_test_db() {
    let original_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // Derive test database name
    let (base_url, db_name) = original_url
        .rsplit_once('/')
        .expect("DATABASE_URL must contain a database name");
    let test_db_name = format!("{}_test", db_name);
    let test_url = format!("{}/{}", base_url, test_db_name);

    // Connect to `postgres` to create the test database if needed
    let admin_url = format!("{}/postgres", base_url);
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres admin database");

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&test_db_name)
            .fetch_one(&admin_pool)
            .await
            .expect("Failed to check for test database");

    if !exists {
        // A concurrent test binary may have just created it; tolerate failure.
        let _ = sqlx::query(&format!("CREATE DATABASE \"{}\"", test_db_name))
            .execute(&admin_pool)
            .await;
    }

    admin_pool.close().await;

    // Point DATABASE_URL to the test database for all future pool creation
    std::env::set_var("DATABASE_URL", &test_url);
}

/// Build a pool connected to the test database.
/// On the first call, creates the database, runs migrations, and truncates all
/// tables except the seeded reference data.
async fn test_pool() -> Pool<Postgres> {
    if INITIALIZED.get().is_none() {
        ensure_test_db().await;
    }

    // Use the same pool creation as production (connect_lazy)
    let pool = server::db::create_pool();

    // First call: run migrations + truncate
    if INITIALIZED.set(()).is_ok() {
        server::db::run_migrations(&pool).await;

        sqlx::query(&format!("TRUNCATE {} CASCADE", ALL_TABLES))
            .execute(&pool)
            .await
            .expect("Failed to truncate test tables");
    }

    pool
}

/// Returns the test database pool, or `None` when DATABASE_URL is not set —
/// callers skip their test body in that case so the suite passes without a
/// running PostgreSQL.
#[allow(dead_code)]
pub async fn try_db() -> Option<Pool<Postgres>> {
    let _ = dotenvy::dotenv();
    std::env::set_var("JWT_SECRET", "studyline-integration-test-secret");

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set — skipping database-backed test");
        return None;
    }

    Some(test_pool().await)
}

/// Build a test router with the REST API routes and auth middleware, or
/// `None` when no database is available.
#[allow(dead_code)]
pub async fn try_test_app() -> Option<Router> {
    let pool = try_db().await?;
    let state = AppState { pool };

    let app = server::rest::api_router()
        .route("/health", axum::routing::get(server::health::health_check))
        .layer(middleware::from_fn(
            server::auth::middleware::auth_middleware,
        ))
        .with_state(state);

    Some(app)
}

/// Generate a unique name + email pair for test isolation.
#[allow(dead_code)]
pub fn unique_suffix(prefix: &str) -> (String, String) {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let name = format!("{prefix}_{ts}_{id}");
    let email = format!("{prefix}_{ts}_{id}@test.com");
    (name, email)
}

#[allow(dead_code)]
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[allow(dead_code)]
/// Helper to make a GET request and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

#[allow(dead_code)]
/// Helper to make a GET request with a bearer token.
pub async fn get_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

#[allow(dead_code)]
/// Helper to make a POST request with JSON body.
pub async fn post_json(app: &Router, uri: &str, json: &str) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
    )
    .await
}

#[allow(dead_code)]
/// Helper to make a POST request with JSON body and a bearer token.
pub async fn post_json_with_auth(
    app: &Router,
    uri: &str,
    json: &str,
    token: &str,
) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::from(json.to_string()))
            .unwrap(),
    )
    .await
}

#[allow(dead_code)]
/// Helper to make a PUT request with JSON body and a bearer token.
pub async fn put_json_with_auth(
    app: &Router,
    uri: &str,
    json: &str,
    token: &str,
) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::from(json.to_string()))
            .unwrap(),
    )
    .await
}

#[allow(dead_code)]
/// Helper to make a DELETE request with a bearer token.
pub async fn delete_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// Register a user through the open-registration endpoint.
/// Role ids come from the seeded reference data: 1 = ROLE_STUDENT,
/// 2 = ROLE_INSTRUCTOR, 3 = ROLE_ADMIN.
#[allow(dead_code)]
pub async fn register_user(
    app: &Router,
    name: &str,
    email: &str,
    password: &str,
    role_ids: &[i64],
) -> (StatusCode, String) {
    let roles: Vec<serde_json::Value> = role_ids
        .iter()
        .map(|id| serde_json::json!({ "id": id }))
        .collect();
    let json = serde_json::json!({
        "name": name,
        "email": email,
        "password": password,
        "roles": roles,
    });
    post_json(app, "/api/users", &json.to_string()).await
}

/// Login and return the access token.
#[allow(dead_code)]
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let json = serde_json::json!({ "email": email, "password": password });
    let (status, body) = post_json(app, "/api/auth/login", &json.to_string()).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    value["access_token"].as_str().unwrap().to_string()
}
