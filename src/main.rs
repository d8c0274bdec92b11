use std::env;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;

use vcard_checkout::application::checkout::CheckoutOrchestrator;
use vcard_checkout::domain::ports::SessionStore;
use vcard_checkout::infrastructure::card_gateway::HttpCardGateway;
use vcard_checkout::infrastructure::order_gateway::HttpOrderGateway;
use vcard_checkout::infrastructure::payment_gateway::HttpPaymentGateway;
use vcard_checkout::infrastructure::session_repo::DieselSessionStore;
use vcard_checkout::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a valid number");

    let order_base = env::var("ORDER_SERVICE_URL").expect("ORDER_SERVICE_URL must be set");
    let card_base = env::var("CARD_SERVICE_URL").expect("CARD_SERVICE_URL must be set");
    let payment_base = env::var("PAYMENT_SERVICE_URL").expect("PAYMENT_SERVICE_URL must be set");
    let gateway_timeout: u64 = env::var("GATEWAY_TIMEOUT_SECS")
        .unwrap_or_else(|_| "10".to_string())
        .parse()
        .expect("GATEWAY_TIMEOUT_SECS must be a valid number");
    let session_ttl_hours: i64 = env::var("SESSION_TTL_HOURS")
        .unwrap_or_else(|_| "24".to_string())
        .parse()
        .expect("SESSION_TTL_HOURS must be a valid number");

    let pool = create_pool(&database_url);
    run_migrations(&pool);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(gateway_timeout))
        .build()
        .expect("Failed to build the upstream HTTP client");

    let orchestrator = CheckoutOrchestrator::new(
        Arc::new(HttpOrderGateway::new(http.clone(), order_base)),
        Arc::new(HttpCardGateway::new(http.clone(), card_base)),
        Arc::new(HttpPaymentGateway::new(http, payment_base)),
    );
    let store: Arc<dyn SessionStore> = Arc::new(DieselSessionStore::new(pool));

    // Abandoned checkouts cannot rely on the cancel handler having run;
    // discard their draft orders before taking traffic.
    match orchestrator
        .sweep_stale(store.as_ref(), chrono::Duration::hours(session_ttl_hours))
        .await
    {
        Ok(0) => {}
        Ok(n) => log::info!("Swept {} stale checkout session(s)", n),
        Err(e) => log::warn!("Stale-session sweep failed: {}", e),
    }

    log::info!("Starting server at http://{}:{}", host, port);

    build_server(orchestrator, store, &host, port)?.await
}
