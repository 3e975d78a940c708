use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use studyhall_discovery::{DiscoveryError, UpstreamKind};

use super::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct DiscoverRequest {
    topic: Option<String>,
}

/// HTTP status for a failed discovery.
pub fn status_for(err: &DiscoveryError) -> StatusCode {
    match err {
        DiscoveryError::InvalidTopic(_) => StatusCode::BAD_REQUEST,
        DiscoveryError::UpstreamPlanning { kind, .. } => match kind {
            UpstreamKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            UpstreamKind::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            UpstreamKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DiscoveryError::SearchFailure { .. }
        | DiscoveryError::NoPrimaryVideoFound(_)
        | DiscoveryError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn api_discover(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DiscoverRequest>, JsonRejection>,
) -> Response {
    let topic = match body {
        Ok(Json(DiscoverRequest { topic: Some(topic) })) => topic,
        Ok(Json(DiscoverRequest { topic: None })) => {
            return error_response(StatusCode::BAD_REQUEST, "topic is required");
        }
        Err(rejection) => {
            warn!(error = %rejection, "Rejected discover request body");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("discover", %request_id);

    async move {
        let started = Instant::now();
        match state.discovery.discover(&topic).await {
            Ok(result) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Discover request served"
                );
                Json(result).into_response()
            }
            Err(e) => {
                let status = status_for(&e);
                if status.is_server_error() {
                    error!(error = %e, "Discover request failed");
                } else {
                    warn!(error = %e, status = status.as_u16(), "Discover request refused");
                }
                error_response(status, e.to_string())
            }
        }
    }
    .instrument(span)
    .await
}
