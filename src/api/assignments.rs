use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::api::errors::ApiError;
use crate::api::helpers::{api_url, load_assignment, require_edit_key};
use crate::api::work;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::work::WorkRef;
use crate::schemas::assignment::{
    SaveAssignmentRequest, SaveAssignmentResponse, SubmissionReview, SubmissionSummary,
    SERVER_FIELDS,
};
use crate::services::assignment::{
    score, AssignmentDocument, AssignmentParser, StoredAssignment, Submission,
};
use crate::services::identifiers;
use crate::services::storage::StorageError;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(save_assignment))
        .route("/:assignment_id", get(public_view))
        .route("/:assignment_id/edit/:edit_key", get(edit_view))
        .route("/:assignment_id/submissions/:edit_key", get(review_submissions))
        .route("/:assignment_id/work", post(work::start_work))
}

async fn save_assignment(
    State(state): State<AppState>,
    Json(payload): Json<SaveAssignmentRequest>,
) -> Result<Json<SaveAssignmentResponse>, ApiError> {
    let SaveAssignmentRequest { assignment: text, id, edit_key, mut extra } = payload;

    let assignment_id = match id {
        Some(id) => {
            let existing = load_assignment(&state, &id).await?;
            require_edit_key(&existing, edit_key.as_deref())?;
            id
        }
        None => identifiers::public_id(),
    };

    let parser = AssignmentParser::new(state.hosts(), state.probe());
    let document = match parser.parse(&text).await {
        Ok(document) => {
            metrics::record_parse("ok");
            document
        }
        Err(err) => {
            metrics::record_parse("error");
            tracing::info!(assignment_id = %assignment_id, error = %err, "Rejected assignment");
            return Err(ApiError::BadRequest(err.to_string()));
        }
    };

    for field in SERVER_FIELDS {
        extra.remove(field);
    }

    let new_edit_key = identifiers::private_key();
    let stored = StoredAssignment {
        groups: document.groups,
        edit_key: Some(new_edit_key.clone()),
        extra,
    };

    let blob = repositories::assignments::save(state.store(), &assignment_id, &stored)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store assignment"))?;

    tracing::info!(
        assignment_id = %assignment_id,
        groups = stored.groups.len(),
        size = blob.size,
        sha256 = %blob.sha256,
        "Assignment saved"
    );

    Ok(Json(SaveAssignmentResponse {
        public_url: api_url(&state, &format!("/assignments/{assignment_id}")),
        private_url: api_url(&state, &format!("/assignments/{assignment_id}/edit/{new_edit_key}")),
        id: assignment_id,
        assignment: stored,
    }))
}

async fn public_view(
    Path(assignment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StoredAssignment>, ApiError> {
    let stored = load_assignment(&state, &assignment_id).await?;
    Ok(Json(stored.without_edit_key()))
}

async fn edit_view(
    Path((assignment_id, edit_key)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<StoredAssignment>, ApiError> {
    let stored = load_assignment(&state, &assignment_id).await?;
    require_edit_key(&stored, Some(&edit_key))?;
    Ok(Json(stored))
}

async fn review_submissions(
    Path((assignment_id, edit_key)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<SubmissionReview>, ApiError> {
    let stored = load_assignment(&state, &assignment_id).await?;
    require_edit_key(&stored, Some(&edit_key))?;

    let refs = repositories::work::list_for_assignment(state.store(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    let document = stored.document();
    let mut review = SubmissionReview::new();
    let mut scored = 0;

    for work_ref in refs {
        let work = match repositories::work::find(state.store(), &work_ref).await {
            Ok(Some(work)) => work,
            Ok(None) => continue,
            Err(err @ (StorageError::InvalidJson { .. } | StorageError::InvalidUtf8(_))) => {
                tracing::warn!(key = %work_ref.storage_key(), error = %err, "Skipping submission");
                continue;
            }
            Err(err) => return Err(ApiError::internal(err, "Failed to load submission")),
        };

        let Some(summary) = summarize(&document, &work_ref, work) else {
            continue;
        };
        scored += 1;
        review.entry(work_ref.ccid).or_default().insert(work_ref.work_key, summary);
    }

    metrics::record_scored(scored);
    tracing::info!(assignment_id = %assignment_id, submissions = scored, "Submissions reviewed");

    Ok(Json(review))
}

fn summarize(
    document: &AssignmentDocument,
    work_ref: &WorkRef,
    mut work: Value,
) -> Option<SubmissionSummary> {
    let Some(fields) = work.as_object_mut() else {
        tracing::warn!(key = %work_ref.storage_key(), "Skipping submission that is not an object");
        return None;
    };
    fields.entry("ccid").or_insert_with(|| Value::String(work_ref.ccid.clone()));

    let submission: Submission = match serde_json::from_value(work) {
        Ok(submission) => submission,
        Err(err) => {
            tracing::warn!(key = %work_ref.storage_key(), error = %err, "Skipping submission");
            return None;
        }
    };

    match score(document, &submission) {
        Ok(score) => Some(SubmissionSummary { score, submitted_at: submission.submitted_at }),
        Err(err) => {
            tracing::warn!(key = %work_ref.storage_key(), error = %err, "Cannot score submission");
            None
        }
    }
}
