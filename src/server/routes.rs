//! Axum router: `POST /predict` and `GET /health`.
//!
//! Error envelope is always `{"error": "..."}`. Validation failures carry their
//! message; internal failures are logged here and answered with a generic text.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::domain::{PredictionResult, RiskLevel, ValidationError};
use crate::error::AppError;
use crate::predict::{HealthStatus, Predictor, ScoreError};

/// Response body of a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub heart_disease_probability: f64,
    pub heart_disease: bool,
    pub risk_level: RiskLevel,
    pub message: &'static str,
}

impl From<PredictionResult> for PredictResponse {
    fn from(r: PredictionResult) -> Self {
        Self {
            heart_disease_probability: round4(r.probability),
            heart_disease: r.heart_disease,
            risk_level: r.risk_level,
            message: r.message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn router(predictor: Arc<Predictor>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(predictor)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, predictor: Arc<Predictor>) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::server(format!("Failed to bind {addr}: {e}")))?;
    info!("listening at http://{addr}");
    info!("  POST /predict - make predictions");
    info!("  GET  /health  - health check");

    axum::serve(listener, router(predictor))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::server(format!("Server error: {e}")))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl-C, shutting down");
}

async fn predict(State(predictor): State<Arc<Predictor>>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let err = ValidationError::InvalidRecord(format!("body is not valid JSON: {e}"));
            return error_response(StatusCode::BAD_REQUEST, err.to_string());
        }
    };

    match predictor.predict(&payload) {
        Ok(result) => (StatusCode::OK, Json(PredictResponse::from(result))).into_response(),
        Err(ScoreError::Validation(e)) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(ScoreError::Internal(detail)) => {
            error!("prediction failed: {detail}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        }
    }
}

async fn health(State(predictor): State<Arc<Predictor>>) -> Json<HealthStatus> {
    Json(predictor.health())
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
