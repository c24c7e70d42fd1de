//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (event store/bus, projection,
//!   dispatcher, billing provider) and one method per operation
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use cuadre_events::EventBus;
use cuadre_sales::SalesProvider;

use crate::config::StoreSettings;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(sales: Arc<dyn SalesProvider>, settings: StoreSettings) -> Router {
    let (services, bus, projection) = services::build_services(sales, settings);

    // Background subscriber: bus -> projection. Commands also fold their own
    // committed events in synchronously; the projection is idempotent, so
    // seeing the same envelope twice is a no-op.
    {
        let sub = bus.subscribe();
        tokio::task::spawn_blocking(move || loop {
            match sub.recv() {
                Ok(envelope) => {
                    if let Err(e) = projection.apply_envelope(&envelope) {
                        tracing::warn!("history projection apply failed: {e}");
                    }
                }
                Err(_) => break,
            }
        });
    }

    let services = Arc::new(services);

    // Protected routes: require the gateway identity headers.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::identity_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
