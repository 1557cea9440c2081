use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug)]
struct RecordedRequest {
    label: &'static str,
    bearer: Option<String>,
    query: Option<String>,
    body: Option<serde_json::Value>,
}

#[derive(Clone, Default)]
struct PlatformState {
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl PlatformState {
    async fn record(
        &self,
        label: &'static str,
        bearer: Option<String>,
        query: Option<String>,
        body: Option<serde_json::Value>,
    ) {
        self.recorded.lock().await.push(RecordedRequest {
            label,
            bearer,
            query,
            body,
        });
    }
}

fn bearer_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn spawn_platform(app: Router) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

#[derive(Deserialize)]
struct FilterQuery {
    space_id: i64,
}

async fn handle_filter(
    State(state): State<PlatformState>,
    Path(app_id): Path<i64>,
    Query(query): Query<FilterQuery>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    state
        .record(
            "filter",
            bearer_of(&headers),
            Some(format!("app_id={app_id}&space_id={}", query.space_id)),
            None,
        )
        .await;
    Json(serde_json::json!({
        "items": [
            {
                "item_id": 17,
                "fields": [
                    { "external_id": "title", "values": [ { "value": "Groceries" } ] },
                    { "external_id": "tasks", "values": [ { "value": { "item_id": 23 } } ] }
                ]
            }
        ]
    }))
}

#[tokio::test]
async fn filter_items_parses_items_and_sends_bearer_auth() {
    let state = PlatformState::default();
    let app = Router::new()
        .route("/item/app/:app_id/filter/", post(handle_filter))
        .with_state(state.clone());
    let base = spawn_platform(app).await.expect("spawn platform");
    let store = HttpItemStore::new(&base, Some("token-123".to_string())).expect("store");

    let items = store.filter_items(AppId(7), SpaceId(9)).await.expect("filter");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_id, ItemId(17));
    assert_eq!(items[0].title().expect("title"), "Groceries");
    assert_eq!(items[0].task_refs(), vec![ItemId(23)]);

    let recorded = state.recorded.lock().await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].label, "filter");
    assert_eq!(recorded[0].query.as_deref(), Some("app_id=7&space_id=9"));
    assert_eq!(recorded[0].bearer.as_deref(), Some("token-123"));
}

async fn handle_create_item(
    State(state): State<PlatformState>,
    Path(app_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state
        .record(
            "create_item",
            bearer_of(&headers),
            Some(format!("app_id={app_id}")),
            Some(body),
        )
        .await;
    Json(serde_json::json!({ "item_id": 77, "fields": [] }))
}

#[tokio::test]
async fn create_item_sends_the_simplified_write_payload() {
    let state = PlatformState::default();
    let app = Router::new()
        .route("/item/app/:app_id", post(handle_create_item))
        .with_state(state.clone());
    let base = spawn_platform(app).await.expect("spawn platform");
    let store = HttpItemStore::new(&base, None).expect("store");

    let fields = FieldsPayload::new().text("title", "Milk").category("status", 2);
    let created = store
        .create_item(AppId(5), SpaceId(9), fields)
        .await
        .expect("create");

    assert_eq!(created.item_id, ItemId(77));

    let recorded = state.recorded.lock().await;
    assert_eq!(recorded[0].query.as_deref(), Some("app_id=5"));
    assert_eq!(recorded[0].bearer, None);
    assert_eq!(
        recorded[0].body,
        Some(serde_json::json!({
            "fields": { "status": [2], "title": "Milk" },
            "space_id": 9
        }))
    );
}

async fn handle_update_item(
    State(state): State<PlatformState>,
    Path(item_id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state
        .record(
            "update_item",
            None,
            Some(format!("item_id={item_id}")),
            Some(body),
        )
        .await;
    Json(serde_json::json!({ "item_id": item_id, "fields": [] }))
}

#[tokio::test]
async fn update_item_fields_replaces_the_whole_field() {
    let state = PlatformState::default();
    let app = Router::new()
        .route("/item/:item_id", put(handle_update_item))
        .with_state(state.clone());
    let base = spawn_platform(app).await.expect("spawn platform");
    let store = HttpItemStore::new(&base, None).expect("store");

    let fields = FieldsPayload::new().references("tasks", vec![ItemId(3), ItemId(5)]);
    store
        .update_item_fields(ItemId(41), fields)
        .await
        .expect("update");

    let recorded = state.recorded.lock().await;
    assert_eq!(recorded[0].query.as_deref(), Some("item_id=41"));
    assert_eq!(
        recorded[0].body,
        Some(serde_json::json!({
            "fields": { "tasks": [ { "value": 3 }, { "value": 5 } ] }
        }))
    );
}

async fn handle_delete_item(
    State(state): State<PlatformState>,
    Path(item_id): Path<i64>,
) -> StatusCode {
    state
        .record("delete_item", None, Some(format!("item_id={item_id}")), None)
        .await;
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn delete_item_issues_delete_by_id() {
    let state = PlatformState::default();
    let app = Router::new()
        .route("/item/:item_id", delete(handle_delete_item))
        .with_state(state.clone());
    let base = spawn_platform(app).await.expect("spawn platform");
    let store = HttpItemStore::new(&base, None).expect("store");

    store.delete_item(ItemId(23)).await.expect("delete");

    let recorded = state.recorded.lock().await;
    assert_eq!(recorded[0].label, "delete_item");
    assert_eq!(recorded[0].query.as_deref(), Some("item_id=23"));
}

async fn handle_orgs(State(state): State<PlatformState>) -> Json<serde_json::Value> {
    state.record("orgs", None, None, None).await;
    Json(serde_json::json!([ { "org_id": 1, "name": "Acme" } ]))
}

async fn handle_create_org(
    State(state): State<PlatformState>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state.record("create_org", None, None, Some(body)).await;
    Json(serde_json::json!({ "org_id": 2, "name": "todo-app-organization" }))
}

async fn handle_spaces(
    State(state): State<PlatformState>,
    Path(org_id): Path<i64>,
) -> Json<serde_json::Value> {
    state
        .record("spaces", None, Some(format!("org_id={org_id}")), None)
        .await;
    Json(serde_json::json!([
        { "space_id": 8, "name": "Employee Network" },
        { "space_id": 9, "name": "todo-app-space" }
    ]))
}

async fn handle_create_space(
    State(state): State<PlatformState>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state.record("create_space", None, None, Some(body)).await;
    Json(serde_json::json!({ "space_id": 10, "name": "todo-app-space" }))
}

#[tokio::test]
async fn workspace_endpoints_round_trip() {
    let state = PlatformState::default();
    let app = Router::new()
        .route("/org/", get(handle_orgs).post(handle_create_org))
        .route("/space/org/:org_id", get(handle_spaces))
        .route("/space/", post(handle_create_space))
        .with_state(state.clone());
    let base = spawn_platform(app).await.expect("spawn platform");
    let store = HttpItemStore::new(&base, None).expect("store");

    let orgs = store.organizations().await.expect("orgs");
    assert_eq!(orgs[0].org_id, OrgId(1));
    assert_eq!(orgs[0].name, "Acme");

    let created_org = store
        .create_organization("todo-app-organization")
        .await
        .expect("create org");
    assert_eq!(created_org.org_id, OrgId(2));

    let spaces = store.spaces(OrgId(1)).await.expect("spaces");
    assert_eq!(spaces.len(), 2);
    assert_eq!(spaces[1].space_id, SpaceId(9));

    let created_space = store
        .create_space("todo-app-space", OrgId(1))
        .await
        .expect("create space");
    assert_eq!(created_space.space_id, SpaceId(10));

    let recorded = state.recorded.lock().await;
    assert_eq!(
        recorded[1].body,
        Some(serde_json::json!({ "name": "todo-app-organization" }))
    );
    assert_eq!(recorded[2].query.as_deref(), Some("org_id=1"));
    assert_eq!(
        recorded[3].body,
        Some(serde_json::json!({ "name": "todo-app-space", "org_id": 1 }))
    );
}

async fn handle_rejected_create(
    State(state): State<PlatformState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    state.record("rejected", None, None, Some(body)).await;
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        "space_id does not exist".to_string(),
    )
}

#[tokio::test]
async fn non_success_statuses_surface_with_status_and_body() {
    let state = PlatformState::default();
    let app = Router::new()
        .route("/item/app/:app_id", post(handle_rejected_create))
        .with_state(state.clone());
    let base = spawn_platform(app).await.expect("spawn platform");
    let store = HttpItemStore::new(&base, None).expect("store");

    let err = store
        .create_item(AppId(5), SpaceId(999), FieldsPayload::new().text("title", "x"))
        .await
        .expect_err("must fail");

    match err {
        StoreError::Api {
            method,
            status,
            body,
            ..
        } => {
            assert_eq!(method, "POST");
            assert_eq!(status, 422);
            assert!(body.contains("space_id does not exist"), "body: {body}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_unparsable_base_urls() {
    let err = HttpItemStore::new("not a url", None).expect_err("must fail");
    assert!(matches!(err, StoreError::BaseUrl { .. }));
}
