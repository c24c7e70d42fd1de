use std::sync::Arc;

use cuadre_sales::InMemorySalesProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cuadre_api::telemetry::init();

    let settings = cuadre_api::config::StoreSettings::from_env();
    let sales = Arc::new(InMemorySalesProvider::new());

    let app = cuadre_api::app::build_app(sales, settings).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
