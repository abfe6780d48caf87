use std::net::SocketAddr;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::AppConfig;
use crate::dashboard::{self, page::DASHBOARD_PATH};
use crate::patients;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.public_dir);
    Router::new()
        .route("/", get(root_redirect))
        .merge(dashboard::router())
        .merge(patients::router())
        .fallback_service(assets)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

/// `/` is a plain 302 to the dashboard page.
async fn root_redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, DASHBOARD_PATH)])
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);
    tracing::info!("patient dashboard at http://{}{}", addr, DASHBOARD_PATH);
    axum::serve(listener, app).await?;
    Ok(())
}
