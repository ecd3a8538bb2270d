//! HTTP endpoint serving nearby drop-off locations as GeoJSON.

use std::{net::SocketAddr, sync::Arc};

use _model::LatLng;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::repository::StoreRepository;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn StoreRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CenterQuery {
    center_lat: f64,
    center_lng: f64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/data/dropoffs", get(dropoffs))
        .route("/healthz", get(health))
        .with_state(state)
}

pub async fn serve(listen: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {listen}"))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

/// Serves `app` on a free local port from a background thread.
#[cfg(test)]
pub fn spawn_local(app: Router) -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let listener = TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    addr
}

async fn health() -> &'static str {
    info!("Health check");
    "ok"
}

async fn dropoffs(
    State(state): State<AppState>,
    query: Result<Query<CenterQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(x) => x,
        Err(err) => {
            warn!("Rejected drop-off query: {}", err.body_text());
            return (StatusCode::BAD_REQUEST, err.body_text()).into_response();
        }
    };
    let center = LatLng::new(query.center_lat, query.center_lng);

    match state.repository.nearby(center).await {
        Ok(stores) => {
            info!("{} drop-offs near {center}", stores.features.len());
            Json(stores).into_response()
        }
        Err(err) => {
            error!("Query near {center} failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Couldn't encode results: {err}"),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::Mutex,
    };

    use _model::{Store, StoreCollection, StoreProperties};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::repository::{MemoryRepository, Radius};

    struct Broken;

    #[async_trait]
    impl StoreRepository for Broken {
        async fn nearby(&self, _center: LatLng) -> Result<StoreCollection> {
            Err(anyhow!("connection refused"))
        }
    }

    fn app(repository: impl StoreRepository + 'static) -> Router {
        router(AppState {
            repository: Arc::new(repository),
        })
    }

    fn memory() -> MemoryRepository {
        MemoryRepository::new(
            StoreCollection::new(vec![Store::new(
                None,
                LatLng::new(30.27, -97.74),
                StoreProperties::new(
                    "Recycle & Reuse Drop-off Center",
                    "2514 Business Center Dr",
                    "78744",
                ),
            )]),
            Radius::default(),
        )
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|x| x.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn dropoffs_as_geojson() {
        let (status, content_type, body) = fetch(
            app(memory()),
            "/data/dropoffs?centerLat=30.262129&centerLng=-97.7468",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));

        let stores: StoreCollection = serde_json::from_str(&body).unwrap();
        assert_eq!(stores.features.len(), 1);
        assert!(stores.features[0].properties.extra.contains_key("distance"));
    }

    #[tokio::test]
    async fn bad_parameters() {
        let (status, _, _) = fetch(app(memory()), "/data/dropoffs?centerLat=30.2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) =
            fetch(app(memory()), "/data/dropoffs?centerLat=north&centerLng=-97.7").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repository_failure() {
        let (status, _, body) =
            fetch(app(Broken), "/data/dropoffs?centerLat=30.2&centerLng=-97.7").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Couldn't encode results: connection refused");
    }

    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);

    impl Write for Logs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn requests_are_logged() {
        let logs = Logs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                fetch(app(memory()), "/data/dropoffs?centerLat=30.2").await;
                fetch(app(memory()), "/healthz").await;
                fetch(
                    app(memory()),
                    "/data/dropoffs?centerLat=30.262129&centerLng=-97.7468",
                )
                .await;
            });
        });

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("Rejected drop-off query"), "{logs}");
        assert!(logs.contains("Health check"), "{logs}");
        assert!(logs.contains("1 drop-offs near"), "{logs}");
    }

    #[tokio::test]
    async fn healthz() {
        let (status, _, body) = fetch(app(memory()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
