use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod audit;
mod database;
mod directory;
mod error;
mod handlers;
mod models;
mod slip;
mod store;
mod workflow;

use handlers::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pool = match database::init().await {
        Ok(pool) => pool,
        Err(e) => {
            error!("failed to initialize database: {e}");
            error!("check DATABASE_URL and ensure PostgreSQL is running");
            std::process::exit(1);
        }
    };

    let state = AppState::new(pool);
    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    info!("server running at http://{bind_addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|origin, _req_head| {
                origin.as_bytes().starts_with(b"http://localhost")
                    || origin.as_bytes().starts_with(b"http://127.0.0.1")
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .route("/api/health", web::get().to(handlers::health_check))
            .service(
                web::scope("/api")
                    .route("/offices", web::get().to(handlers::transfer::list_offices))
                    .route(
                        "/transfers",
                        web::post().to(handlers::transfer::initiate_transfer),
                    )
                    .route(
                        "/transfers",
                        web::get().to(handlers::transfer::list_transfers),
                    )
                    .route(
                        "/transfers/attention",
                        web::get().to(handlers::transfer::awaiting_destination),
                    )
                    .route(
                        "/transfers/{id}",
                        web::get().to(handlers::transfer::get_transfer),
                    )
                    .route(
                        "/transfers/{id}/decision",
                        web::post().to(handlers::transfer::decide_transfer),
                    )
                    .route(
                        "/transfers/{id}/complete",
                        web::post().to(handlers::transfer::complete_transfer),
                    )
                    .route(
                        "/transfers/{id}/slip",
                        web::get().to(handlers::transfer::get_slip),
                    ),
            )
    })
    .bind(&bind_addr)?
    .run()
    .await
}
