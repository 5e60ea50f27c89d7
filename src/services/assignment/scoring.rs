//! Deterministic variant selection and weighted scoring.
//!
//! A student is routed to a group by hashing their `ccid` with the 32-bit
//! polynomial string hash `h = 31 * h + unit` over UTF-16 code units (the
//! `String.hashCode` contract of the JVM) and taking the Euclidean remainder
//! by the group count. Stored assignments were routed with this hash, so
//! changing it reshuffles every student's group.

use serde_json::Value;
use thiserror::Error;

use super::keys::key_of;
use super::model::{AssignmentDocument, Submission};

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ContractViolation {
    #[error("assignment document has no groups")]
    MissingGroups,
    #[error("submission has no ccid")]
    MissingCcid,
    #[error("malformed assignment document: {0}")]
    MalformedDocument(String),
    #[error("malformed submission: {0}")]
    MalformedSubmission(String),
}

pub(crate) fn java_string_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

pub(crate) fn group_index(ccid: &str, group_count: usize) -> Option<usize> {
    let count = i64::try_from(group_count).ok().filter(|count| *count > 0)?;
    let index = i64::from(java_string_hash(ccid)).rem_euclid(count);
    usize::try_from(index).ok()
}

/// Weighted score of `submission` against the student's group. Problems
/// without a sub-result, or with a non-numeric score, contribute nothing.
pub(crate) fn score(
    document: &AssignmentDocument,
    submission: &Submission,
) -> Result<f64, ContractViolation> {
    let group = group_index(&submission.ccid, document.groups.len())
        .and_then(|index| document.groups.get(index))
        .ok_or(ContractViolation::MissingGroups)?;

    let total = group
        .iter()
        .filter_map(|entry| {
            submission.problem_score(&key_of(entry)).map(|score| entry.weight * score)
        })
        .sum();

    Ok(total)
}

#[allow(dead_code)]
pub(crate) fn score_json(document: &Value, submission: &Value) -> Result<f64, ContractViolation> {
    let has_groups = document
        .get("groups")
        .or_else(|| document.get("assignment"))
        .is_some_and(Value::is_array);
    if !has_groups {
        return Err(ContractViolation::MissingGroups);
    }
    if !submission.get("ccid").is_some_and(Value::is_string) {
        return Err(ContractViolation::MissingCcid);
    }

    let document: AssignmentDocument = serde_json::from_value(document.clone())
        .map_err(|err| ContractViolation::MalformedDocument(err.to_string()))?;
    let submission: Submission = serde_json::from_value(submission.clone())
        .map_err(|err| ContractViolation::MalformedSubmission(err.to_string()))?;

    score(&document, &submission)
}
