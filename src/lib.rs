pub mod application;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::checkout::CheckoutOrchestrator;
use domain::ports::SessionStore;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::checkout::submit_customer_info,
        handlers::checkout::confirm_card_info,
        handlers::checkout::confirm_order,
        handlers::checkout::cancel,
        handlers::checkout::get_session,
        handlers::checkout::activate_card,
    ),
    components(schemas(
        handlers::checkout::CustomerRequest,
        handlers::checkout::OrderLineRequest,
        handlers::checkout::CustomerInfoRequest,
        handlers::checkout::CardInfoRequest,
        handlers::checkout::SubmitResponse,
        handlers::checkout::ConfirmResponse,
        handlers::checkout::CancelResponse,
        handlers::checkout::SessionView,
    ))
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    orchestrator: CheckoutOrchestrator,
    store: Arc<dyn SessionStore>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let store: web::Data<dyn SessionStore> = web::Data::from(store);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(orchestrator.clone()))
            .app_data(store.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/checkout")
                    .route(
                        "/{session_id}/customer-info",
                        web::post().to(handlers::checkout::submit_customer_info),
                    )
                    .route(
                        "/{session_id}/card-info",
                        web::post().to(handlers::checkout::confirm_card_info),
                    )
                    .route(
                        "/{session_id}/confirm",
                        web::post().to(handlers::checkout::confirm_order),
                    )
                    .route(
                        "/{session_id}/cancel",
                        web::post().to(handlers::checkout::cancel),
                    )
                    .route("/{session_id}", web::get().to(handlers::checkout::get_session)),
            )
            .route(
                "/cards/{card_id}/activate",
                web::post().to(handlers::checkout::activate_card),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
