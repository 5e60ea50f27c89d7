use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::services::assignment::StoredAssignment;
use crate::services::identifiers;

pub(crate) fn api_url(state: &AppState, path: &str) -> String {
    let api = state.settings().api();
    format!("{}{}{}", api.public_base_url, api.api_v1_str, path)
}

pub(crate) fn require_segment(value: &str, what: &str) -> Result<(), ApiError> {
    if identifiers::is_valid_segment(value) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Invalid {what}")))
    }
}

pub(crate) async fn load_assignment(
    state: &AppState,
    assignment_id: &str,
) -> Result<StoredAssignment, ApiError> {
    require_segment(assignment_id, "assignment id")?;
    repositories::assignments::find(state.store(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))
}

pub(crate) fn require_edit_key(
    assignment: &StoredAssignment,
    edit_key: Option<&str>,
) -> Result<(), ApiError> {
    match edit_key {
        Some(key) if assignment.edit_key_matches(key) => Ok(()),
        Some(_) => Err(ApiError::Forbidden("Edit key does not match")),
        None => Err(ApiError::Forbidden("Edit key required")),
    }
}
