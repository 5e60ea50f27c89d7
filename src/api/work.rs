use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::api::errors::ApiError;
use crate::api::helpers::{api_url, load_assignment, require_segment};
use crate::core::state::AppState;
use crate::core::time::submitted_at_now;
use crate::repositories;
use crate::repositories::work::WorkRef;
use crate::schemas::assignment::{SaveWorkResponse, StartWorkRequest, WorkSessionResponse};
use crate::services::assignment::{group_index, StoredAssignment};
use crate::services::identifiers;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:assignment_id/:ccid/:work_key", get(resume_work).put(save_work))
}

pub(crate) async fn start_work(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
    request: Option<Json<StartWorkRequest>>,
) -> Result<Json<WorkSessionResponse>, ApiError> {
    let stored = load_assignment(&state, &assignment_id).await?;
    let request = request.map(|Json(request)| request).unwrap_or_default();

    let ccid = match request.ccid {
        Some(ccid) => {
            require_segment(&ccid, "ccid")?;
            ccid
        }
        None => identifiers::pronounceable_ccid(),
    };
    let work_ref = WorkRef::new(&assignment_id, &ccid, &identifiers::private_key());

    tracing::info!(assignment_id = %assignment_id, ccid = %ccid, "Work started");

    Ok(Json(session_response(&state, &stored, work_ref, None)))
}

async fn resume_work(
    Path((assignment_id, ccid, work_key)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<WorkSessionResponse>, ApiError> {
    let work_ref = parse_work_ref(&assignment_id, &ccid, &work_key)?;
    let stored = load_assignment(&state, &assignment_id).await?;

    let work = repositories::work::find(state.store(), &work_ref)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load work"))?;

    Ok(Json(session_response(&state, &stored, work_ref, work)))
}

async fn save_work(
    Path((assignment_id, ccid, work_key)): Path<(String, String, String)>,
    State(state): State<AppState>,
    Json(mut contents): Json<Value>,
) -> Result<Json<SaveWorkResponse>, ApiError> {
    let work_ref = parse_work_ref(&assignment_id, &ccid, &work_key)?;

    let assignment_exists = repositories::assignments::exists(state.store(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?;
    if !assignment_exists {
        return Err(ApiError::NotFound("Assignment not found".to_string()));
    }

    let Some(fields) = contents.as_object_mut() else {
        return Err(ApiError::BadRequest("Work must be a JSON object".to_string()));
    };

    let submitted_at = submitted_at_now();
    fields.insert("ccid".to_string(), Value::String(work_ref.ccid.clone()));
    fields.insert("submittedAt".to_string(), Value::String(submitted_at.clone()));

    let blob = repositories::work::save(state.store(), &work_ref, &contents)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store work"))?;

    tracing::info!(
        assignment_id = %assignment_id,
        ccid = %work_ref.ccid,
        size = blob.size,
        "Work saved"
    );

    Ok(Json(SaveWorkResponse { submitted_at }))
}

fn parse_work_ref(assignment_id: &str, ccid: &str, work_key: &str) -> Result<WorkRef, ApiError> {
    require_segment(assignment_id, "assignment id")?;
    require_segment(ccid, "ccid")?;
    require_segment(work_key, "work key")?;
    Ok(WorkRef::new(assignment_id, ccid, work_key))
}

fn session_response(
    state: &AppState,
    stored: &StoredAssignment,
    work_ref: WorkRef,
    work: Option<Value>,
) -> WorkSessionResponse {
    let work_url = api_url(
        state,
        &format!("/work/{}/{}/{}", work_ref.assignment_id, work_ref.ccid, work_ref.work_key),
    );

    WorkSessionResponse {
        assignment: stored.without_edit_key(),
        group_index: group_index(&work_ref.ccid, stored.groups.len()),
        edit_key_saved: work.is_some(),
        work,
        ccid: work_ref.ccid,
        work_key: work_ref.work_key,
        work_update_url: work_url.clone(),
        return_to_work_url: work_url,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::services::assignment::group_index;
    use crate::test_support::{self, json_request, read_json};

    async fn create_assignment(app: &axum::Router, text: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/assignments",
                Some(json!({ "assignment": text })),
            ))
            .await
            .expect("save assignment");
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }

    #[tokio::test]
    async fn start_work_mints_ccid_and_routes_to_group() {
        let ctx = test_support::setup_test_context().await;
        let saved = create_assignment(&ctx.app, "a\nb\n---\nc\nd\n---\ne").await;
        let id = saved["id"].as_str().expect("id");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::POST, &format!("/api/v1/assignments/{id}/work"), None))
            .await
            .expect("start work");
        assert_eq!(response.status(), StatusCode::OK);
        let session = read_json(response).await;

        let ccid = session["ccid"].as_str().expect("ccid");
        assert_eq!(ccid.split('-').count(), 4);
        assert_eq!(session["groupIndex"], json!(group_index(ccid, 3)));
        assert!(session["work"].is_null());
        assert_eq!(session["editKeySaved"], false);
        assert!(session["assignment"].get("editKey").is_none());
        assert_eq!(session["assignment"]["groups"].as_array().map(Vec::len), Some(3));

        let work_key = session["workKey"].as_str().expect("work key");
        let expected_url = format!("http://localhost:8000/api/v1/work/{id}/{ccid}/{work_key}");
        assert_eq!(session["workUpdateURL"], expected_url.as_str());
        assert_eq!(session["returnToWorkURL"], expected_url.as_str());
    }

    #[tokio::test]
    async fn start_work_keeps_supplied_ccid() {
        let ctx = test_support::setup_test_context().await;
        let saved = create_assignment(&ctx.app, "a\nb\n---\nc\nd").await;
        let id = saved["id"].as_str().expect("id");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/assignments/{id}/work"),
                Some(json!({ "ccid": "alice" })),
            ))
            .await
            .expect("start work");
        let session = read_json(response).await;

        assert_eq!(session["ccid"], "alice");
        assert_eq!(session["groupIndex"], 0);
    }

    #[tokio::test]
    async fn save_then_resume_work() {
        let ctx = test_support::setup_test_context().await;
        let saved = create_assignment(&ctx.app, "a\nb").await;
        let id = saved["id"].as_str().expect("id");
        let uri = format!("/api/v1/work/{id}/alice/key1");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &uri,
                Some(json!({ "a": { "score": 1.0 }, "ccid": "mallory" })),
            ))
            .await
            .expect("save work");
        assert_eq!(response.status(), StatusCode::OK);
        let saved_work = read_json(response).await;
        let submitted_at = saved_work["submittedAt"].as_str().expect("submittedAt");
        assert!(submitted_at.ends_with('Z'));

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, &uri, None))
            .await
            .expect("resume work");
        assert_eq!(response.status(), StatusCode::OK);
        let session = read_json(response).await;

        assert_eq!(session["work"]["ccid"], "alice");
        assert_eq!(session["work"]["submittedAt"], submitted_at);
        assert_eq!(session["work"]["a"]["score"], 1.0);
        assert_eq!(session["editKeySaved"], true);
        assert_eq!(session["workKey"], "key1");
    }

    #[tokio::test]
    async fn resume_without_saved_work_returns_null() {
        let ctx = test_support::setup_test_context().await;
        let saved = create_assignment(&ctx.app, "a").await;
        let id = saved["id"].as_str().expect("id");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, &format!("/api/v1/work/{id}/bob/nothing"), None))
            .await
            .expect("resume work");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(read_json(response).await["work"].is_null());
    }

    #[tokio::test]
    async fn save_work_rejects_non_object_body() {
        let ctx = test_support::setup_test_context().await;
        let saved = create_assignment(&ctx.app, "a").await;
        let id = saved["id"].as_str().expect("id");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/v1/work/{id}/alice/k1"),
                Some(json!([1, 2, 3])),
            ))
            .await
            .expect("save work");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["detail"], "Work must be a JSON object");
    }

    #[tokio::test]
    async fn work_for_unknown_assignment_is_not_found() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::PUT, "/api/v1/work/NOPE/alice/k1", Some(json!({}))))
            .await
            .expect("save work");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/assignments/NOPE/work", None))
            .await
            .expect("start work");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_path_segments_are_rejected() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/work/A1/ali.ce/k1", None))
            .await
            .expect("resume work");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["detail"], "Invalid ccid");
    }
}
