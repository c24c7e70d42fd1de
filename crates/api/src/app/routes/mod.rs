use axum::{routing::get, Router};

pub mod cash_balance;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/cash-balance", cash_balance::router())
}
