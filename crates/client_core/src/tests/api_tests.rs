use super::*;
use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use shared::{
    domain::{AccountStatus, PersonName, Role, YesNo},
    error::ApiError,
    protocol::{ListMeta, SortOrder},
};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    query: Arc<Mutex<Option<String>>>,
    auth: Arc<Mutex<Option<String>>>,
    patch: Arc<Mutex<Option<UserPatch>>>,
}

fn record(id: &str, status: AccountStatus) -> UserRecord {
    UserRecord::new(UserId::from(id), Role::Admin, "root@example.com", status, Utc::now())
}

async fn list(
    State(captured): State<Captured>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Json<UserListResponse> {
    *captured.query.lock().unwrap() = query;
    *captured.auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    Json(UserListResponse {
        data: vec![record("a1", AccountStatus::Active)],
        meta: ListMeta {
            page: 2,
            limit: 5,
            total: 11,
        },
    })
}

async fn show(Path(user_id): Path<String>) -> Result<Json<UserRecord>, (StatusCode, Json<ApiError>)> {
    if user_id == "a1" {
        return Ok(Json(record("a1", AccountStatus::Blocked)));
    }
    Err((
        StatusCode::NOT_FOUND,
        Json(ApiError::not_found(format!("user {user_id} not found"))),
    ))
}

async fn patch(
    State(captured): State<Captured>,
    Path(user_id): Path<String>,
    Json(body): Json<UserPatch>,
) -> Json<MutationResponse> {
    *captured.patch.lock().unwrap() = Some(body.clone());
    if user_id == "gone" {
        return Json(MutationResponse::rejected("user has been deleted"));
    }
    let mut updated = record(&user_id, AccountStatus::Active);
    updated.status = body.status.unwrap_or(updated.status);
    Json(MutationResponse::ok("user updated", updated))
}

async fn create(Json(new_user): Json<NewUser>) -> (StatusCode, Json<MutationResponse>) {
    let created = record("new-1", new_user.status);
    (
        StatusCode::CREATED,
        Json(MutationResponse::ok("user created", created)),
    )
}

async fn spawn_users_server() -> (String, Captured) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let captured = Captured::default();
    let app = Router::new()
        .route("/api/v1/users", get(list).post(create))
        .route("/api/v1/users/:user_id", get(show).patch(patch))
        .route("/broken", get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }))
        .with_state(captured.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api/v1/"), captured)
}

#[tokio::test]
async fn list_sends_dashboard_query_and_bearer_token() {
    let (base, captured) = spawn_users_server().await;
    let api = UsersApi::new(&base).unwrap().with_access_token("tok-123");
    let query = UserListQuery {
        limit: 5,
        page: 2,
        sort_by: "createdAt".into(),
        sort_order: Some(SortOrder::Desc),
        search_term: Some("ann lee".into()),
        is_delete: Some(YesNo::No),
        author: None,
    };

    let response = api.list_users(&query).await.unwrap();

    assert_eq!(response.data.len(), 1);
    assert_eq!(response.meta.total, 11);
    let sent = captured.query.lock().unwrap().clone().unwrap();
    assert!(sent.contains("limit=5"), "{sent}");
    assert!(sent.contains("page=2"), "{sent}");
    assert!(sent.contains("sortBy=createdAt"), "{sent}");
    assert!(sent.contains("sortOrder=desc"), "{sent}");
    assert!(sent.contains("searchTerm=ann+lee"), "{sent}");
    assert!(sent.contains("isDelete=no"), "{sent}");
    assert!(!sent.contains("author"), "{sent}");
    assert_eq!(
        captured.auth.lock().unwrap().as_deref(),
        Some("Bearer tok-123")
    );
}

#[tokio::test]
async fn unsorted_query_sends_empty_sort_keys_without_token() {
    let (base, captured) = spawn_users_server().await;
    let api = UsersApi::new(&base).unwrap().with_access_token("  ");

    api.list_users(&UserListQuery::default()).await.unwrap();

    let sent = captured.query.lock().unwrap().clone().unwrap();
    assert!(sent.contains("sortBy=&"), "{sent}");
    assert!(sent.contains("sortOrder="), "{sent}");
    assert!(captured.auth.lock().unwrap().is_none());
}

#[tokio::test]
async fn get_user_decodes_record_and_not_found_error() {
    let (base, _) = spawn_users_server().await;
    let api = UsersApi::new(&base).unwrap();

    let found = api.get_user(&UserId::from("a1")).await.unwrap();
    assert_eq!(found.status, AccountStatus::Blocked);

    let err = api.get_user(&UserId::from("zz")).await.unwrap_err();
    match err {
        ClientError::Http {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 404);
            assert_eq!(code, Some(ErrorCode::NotFound));
            assert_eq!(message, "user zz not found");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn update_sends_patch_and_returns_in_band_rejection() {
    let (base, captured) = spawn_users_server().await;
    let api = UsersApi::new(&base).unwrap();

    let ok = api
        .update_user(&UserId::from("a1"), &UserPatch::status(AccountStatus::Deactivate))
        .await
        .unwrap();
    assert!(ok.success);
    assert_eq!(ok.data.map(|r| r.status), Some(AccountStatus::Deactivate));
    assert_eq!(
        captured.patch.lock().unwrap().clone(),
        Some(UserPatch::status(AccountStatus::Deactivate))
    );

    let rejected = api
        .update_user(&UserId::from("gone"), &UserPatch::status(AccountStatus::Active))
        .await
        .unwrap();
    assert!(!rejected.success);
    assert_eq!(rejected.message.as_deref(), Some("user has been deleted"));
}

#[tokio::test]
async fn create_user_accepts_created_status() {
    let (base, _) = spawn_users_server().await;
    let api = UsersApi::new(&base).unwrap();
    let new_user = NewUser {
        role: Role::Trainer,
        email: "coach@example.com".into(),
        name: PersonName {
            first_name: "Kim".into(),
            middle_name: None,
            last_name: "Ode".into(),
        },
        phone_number: None,
        author: None,
        status: AccountStatus::Active,
        img: None,
    };

    let response = api.create_user(&new_user).await.unwrap();
    assert!(response.success);
    assert_eq!(response.message.as_deref(), Some("user created"));
}

#[tokio::test]
async fn non_json_error_falls_back_to_status_reason() {
    let (base, _) = spawn_users_server().await;
    let root = base.trim_end_matches("api/v1/").to_string();
    let api = UsersApi::new(&root).unwrap();
    let url = api.endpoint(&["broken"]).unwrap();

    let response = api.request(reqwest::Method::GET, url).send().await.unwrap();
    let err = decode::<UserRecord>(response).await.unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "Bad Gateway");
}

#[test]
fn endpoint_escapes_segments_and_rejects_opaque_urls() {
    let api = UsersApi::new("http://localhost:8080/api").unwrap();
    let url = api.endpoint(&["users", "a/b c"]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/api/users/a%2Fb%20c");

    assert!(matches!(
        UsersApi::new("mailto:admin@example.com"),
        Err(ClientError::InvalidUrl(_))
    ));
    assert!(matches!(
        UsersApi::new("not a url"),
        Err(ClientError::InvalidUrl(_))
    ));
}
