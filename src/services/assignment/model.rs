use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProblemEntry {
    #[serde(rename = "URL")]
    pub(crate) url: String,
    pub(crate) weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) qid: Option<String>,
}

pub(crate) type ProblemGroup = Vec<ProblemEntry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AssignmentDocument {
    #[serde(alias = "assignment")]
    pub(crate) groups: Vec<ProblemGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Submission {
    pub(crate) ccid: String,
    #[serde(rename = "submittedAt", default, skip_serializing_if = "Option::is_none")]
    pub(crate) submitted_at: Option<String>,
    #[serde(flatten)]
    pub(crate) results: Map<String, Value>,
}

impl Submission {
    pub(crate) fn problem_score(&self, key: &str) -> Option<f64> {
        self.results.get(key).and_then(|result| result.get("score")).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredAssignment {
    #[serde(alias = "assignment")]
    pub(crate) groups: Vec<ProblemGroup>,
    #[serde(rename = "editKey", default, skip_serializing_if = "Option::is_none")]
    pub(crate) edit_key: Option<String>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl StoredAssignment {
    pub(crate) fn document(&self) -> AssignmentDocument {
        AssignmentDocument { groups: self.groups.clone() }
    }

    pub(crate) fn edit_key_matches(&self, candidate: &str) -> bool {
        self.edit_key.as_deref().is_some_and(|key| key == candidate)
    }

    pub(crate) fn without_edit_key(&self) -> Self {
        Self { edit_key: None, ..self.clone() }
    }
}
