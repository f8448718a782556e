use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{
    create_user, get_user, internal, list_users, update_user, user_route, users_route,
};
use shared::{
    domain::{UserId, UserRecord},
    error::{ApiError, ErrorCode},
    protocol::{MutationResponse, NewUser, UserListQuery, UserListResponse, UserPatch},
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use server_api::ApiContext;

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    if settings.seed_demo_users {
        storage.seed_demo_users(settings.demo_user_count).await?;
    }

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "user api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to install ctrl-c handler");
    }
    info!("shutting down");
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(users_route(), get(http_list_users).post(http_create_user))
        .route(user_route(), get(http_get_user).patch(http_update_user))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| into_response(internal(e)))?;
    Ok("ok")
}

async fn http_list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> ApiResult<Json<UserListResponse>> {
    let Query(query) = query.map_err(|rejection| bad_request(rejection.body_text()))?;
    list_users(&state.api, query)
        .await
        .map(Json)
        .map_err(into_response)
}

async fn http_get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserRecord>> {
    get_user(&state.api, &UserId(user_id))
        .await
        .map(Json)
        .map_err(into_response)
}

async fn http_update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    patch: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(patch) = patch.map_err(|rejection| bad_request(rejection.body_text()))?;
    update_user(&state.api, &UserId(user_id), patch)
        .await
        .map(Json)
        .map_err(into_response)
}

async fn http_create_user(
    State(state): State<Arc<AppState>>,
    new_user: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MutationResponse>)> {
    let Json(new_user) = new_user.map_err(|rejection| bad_request(rejection.body_text()))?;
    create_user(&state.api, new_user)
        .await
        .map(|created| (StatusCode::CREATED, Json(created)))
        .map_err(into_response)
}

fn into_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

/// Extractor rejections answer with the same JSON body as handler errors.
fn bad_request(message: String) -> (StatusCode, Json<ApiError>) {
    into_response(ApiError::validation(message))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
