use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::services::assignment::StoredAssignment;

pub(crate) const SERVER_FIELDS: [&str; 5] = ["privateURL", "publicURL", "id", "error", "groups"];

#[derive(Debug, Deserialize)]
pub(crate) struct SaveAssignmentRequest {
    pub(crate) assignment: String,
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default, rename = "editKey")]
    pub(crate) edit_key: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveAssignmentResponse {
    #[serde(flatten)]
    pub(crate) assignment: StoredAssignment,
    pub(crate) id: String,
    #[serde(rename = "publicURL")]
    pub(crate) public_url: String,
    #[serde(rename = "privateURL")]
    pub(crate) private_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartWorkRequest {
    #[serde(default)]
    pub(crate) ccid: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkSessionResponse {
    pub(crate) assignment: StoredAssignment,
    pub(crate) work: Option<Value>,
    pub(crate) ccid: String,
    pub(crate) work_key: String,
    #[serde(rename = "workUpdateURL")]
    pub(crate) work_update_url: String,
    #[serde(rename = "returnToWorkURL")]
    pub(crate) return_to_work_url: String,
    pub(crate) group_index: Option<usize>,
    pub(crate) edit_key_saved: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveWorkResponse {
    #[serde(rename = "submittedAt")]
    pub(crate) submitted_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionSummary {
    pub(crate) score: f64,
    #[serde(rename = "submittedAt")]
    pub(crate) submitted_at: Option<String>,
}

pub(crate) type SubmissionReview = BTreeMap<String, BTreeMap<String, SubmissionSummary>>;
