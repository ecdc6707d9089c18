use server::{config, db, openapi, telemetry};

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    config::load_config();

    let pool = db::create_pool();
    db::run_migrations(&pool).await;

    let app = openapi::api_router(pool);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await.expect("server error");
}
