use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    error::AppError,
    monitor::status_catalog,
    routes::presence::model::{
        HealthResponse, HistoryQuery, HistoryResponse, PresenceListResponse, PresenceQuery,
        StatusListResponse, UpdatePresenceRequest, UpdatePresenceResponse,
    },
};

/// 历史查询默认返回条数
const DEFAULT_HISTORY_LIMIT: usize = 30;

// 发布端上报状态
pub async fn update_presence(
    State(state): State<AppState>,
    payload: Result<Json<UpdatePresenceRequest>, JsonRejection>,
) -> Result<Json<UpdatePresenceResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Malformed presence update: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    })?;

    let (secret, update) = request.into_parts();
    let received_at = state.clock.now();

    match state.store.upsert(&secret, &update, received_at).await {
        Ok(record) => {
            tracing::info!(
                "Presence updated: {} -> {} ({})",
                record.user_key,
                record.status_name,
                record.status_description
            );
            Ok(Json(UpdatePresenceResponse { accepted: true }))
        }
        Err(err) => {
            tracing::warn!("Presence update rejected for {}: {}", update.user_key, err);
            Err(err.into())
        }
    }
}

// 查询单个或全部用户状态
pub async fn query_presence(
    State(state): State<AppState>,
    Query(query): Query<PresenceQuery>,
) -> Response {
    let now = state.clock.now();

    match query.user {
        Some(user) => Json(state.store.resolve(&user, now).await).into_response(),
        None => {
            let users = state
                .store
                .resolve_all(now)
                .await
                .into_iter()
                .map(|p| (p.user.clone(), p))
                .collect();
            Json(PresenceListResponse {
                users,
                timestamp: now,
            })
            .into_response()
        }
    }
}

// 最近的状态变化
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state.store.history().recent(query.user.as_deref(), limit);

    Json(HistoryResponse {
        total: history.len(),
        history,
        filtered_user: query.user.unwrap_or_else(|| "all".into()),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        users: state.store.profiles().len(),
    })
}

// 状态目录
pub async fn status_list() -> Json<StatusListResponse> {
    Json(StatusListResponse {
        status_list: status_catalog(),
    })
}
