use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::AppState;
use crate::database::HeartbeatOutcome;
use crate::error::AppError;
use crate::result::ApiMessage;

use super::model::{HeartbeatRequest, InstanceList};

/// 记录实例心跳，调用前已经过限流中间件
pub async fn heartbeat(
    State(state): State<AppState>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<Json<ApiMessage>, AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("Rejected heartbeat body: {}", e);
        AppError::InvalidRequestBody
    })?;

    if !req.is_valid() {
        return Err(AppError::InvalidRequestBody);
    }

    let last_seen = chrono::Utc::now().timestamp_millis();
    let outcome = state
        .instances
        .record_heartbeat(req.uuid.trim(), req.version.trim(), last_seen)
        .await?;

    let message = match outcome {
        HeartbeatOutcome::Created => {
            tracing::info!("New instance registered: {} ({})", req.uuid, req.version);
            "Instance created"
        }
        HeartbeatOutcome::Updated => "Instance updated",
    };

    Ok(Json(ApiMessage::new(StatusCode::OK, message)))
}

pub async fn list_instances(
    State(state): State<AppState>,
) -> Result<Json<InstanceList>, AppError> {
    let instances = state.instances.list_all().await?;

    Ok(Json(InstanceList {
        status: StatusCode::OK.as_u16(),
        total: instances.len(),
        instances,
    }))
}
