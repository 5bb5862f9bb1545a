// src/api.rs
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration as StdDuration};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::device::Command;
use crate::error::ApiError;
use crate::monitor::LivenessMonitor;
use crate::registry::Registry;
use crate::types::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

type Peer = Option<ConnectInfo<SocketAddr>>;

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/register", post(register).fallback(only_post))
        .route("/command", get(poll))
        .route("/set-command", post(set_command).fallback(only_post))
        .route("/list", get(list))
        .route("/health", get(health))
        .with_state(registry)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(StdDuration::from_secs(10)))
        .layer(TraceLayer::new_for_http())
}

/// Runs the HTTP server and the liveness monitor until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<Registry>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let monitor = LivenessMonitor::new(Arc::clone(&registry)).spawn();

    info!("==============================================");
    info!("Wake-On-Demand Server v{VERSION}");
    info!("listening on {}", listener.local_addr()?);
    info!("ESP timeout: {:?}", registry.timeout());
    info!("==============================================");

    let app = router(registry).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    monitor.abort();
    info!("server stopped");
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("received shutdown signal, server stopping");
}

// ---------- API HANDLERS ---------- //

async fn register(
    State(registry): State<Arc<Registry>>,
    peer: Peer,
    body: Bytes,
) -> Result<Json<StatusRes>, ApiError> {
    let from = peer_addr(&peer);
    debug!(peer = %from, "register request");

    let req: RegisterReq = decode(&body).map_err(|e| reject("register", &from, e))?;
    if req.id.is_empty() {
        return Err(reject(
            "register",
            &from,
            ApiError::Validation("id cannot be empty".into()),
        ));
    }

    registry.register(&req.id);
    Ok(Json(StatusRes {
        status: "registered".into(),
    }))
}

async fn poll(
    State(registry): State<Arc<Registry>>,
    peer: Peer,
    Query(q): Query<PollQuery>,
) -> Result<Json<PollRes>, ApiError> {
    let from = peer_addr(&peer);
    let id = match q.id {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(reject(
                "poll",
                &from,
                ApiError::Validation("missing id".into()),
            ))
        }
    };

    let command = registry
        .poll_and_clear(&id)
        .map_err(|e| reject("poll", &from, e.into()))?;
    Ok(Json(PollRes {
        command: command.as_str().to_string(),
    }))
}

async fn set_command(
    State(registry): State<Arc<Registry>>,
    peer: Peer,
    body: Bytes,
) -> Result<Json<SetCommandRes>, ApiError> {
    let from = peer_addr(&peer);
    debug!(peer = %from, "set-command request");

    let req: SetCommandReq = decode(&body).map_err(|e| reject("set-command", &from, e))?;
    let accepted = registry
        .set_command(&req.id, Command::parse(&req.command))
        .map_err(|e| reject("set-command", &from, e.into()))?;

    Ok(Json(SetCommandRes {
        status: "queued".into(),
        id: req.id,
        command: accepted.as_str().to_string(),
    }))
}

async fn list(State(registry): State<Arc<Registry>>, peer: Peer) -> Json<ListRes> {
    let esps: Vec<DeviceInfo> = registry.list().into_iter().map(DeviceInfo::from).collect();
    debug!(peer = %peer_addr(&peer), "returned {} ESP(s)", esps.len());
    Json(ListRes { esps })
}

async fn health(State(registry): State<Arc<Registry>>) -> Json<HealthRes> {
    let summary = registry.health_summary();
    Json(HealthRes {
        status: "ok".into(),
        version: VERSION.into(),
        esps: EspCounts {
            total: summary.total,
            online: summary.online,
        },
    })
}

async fn only_post(peer: Peer) -> (StatusCode, &'static str) {
    warn!(peer = %peer_addr(&peer), "method not allowed");
    (StatusCode::METHOD_NOT_ALLOWED, "only POST allowed")
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("rejecting body: {e}");
        ApiError::Validation("invalid JSON".into())
    })
}

fn reject(route: &str, peer: &str, err: ApiError) -> ApiError {
    warn!(route, peer, status = err.status().as_u16(), "{err}");
    err
}

fn peer_addr(peer: &Peer) -> String {
    peer.as_ref()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".into())
}
