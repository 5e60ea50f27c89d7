//! Plain-text assignment parser.
//!
//! Groups are separated by a line of three or more hyphens. Every non-blank
//! line of a group declares one problem: a URL or a bare identifier, optionally
//! followed by a weight such as `25%`. Unweighted problems share whatever
//! weight the explicit ones leave over.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::classifier::{
    classify, resolve_identifier, resolve_url, Anchor, ProblemHosts, TokenClass,
};
use super::keys::key_of;
use super::model::{AssignmentDocument, ProblemEntry, ProblemGroup};
use crate::services::probe::ReachabilityProbe;

pub(crate) const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ParseError {
    #[error("No assignments")]
    EmptyInput,
    #[error("No problems given")]
    NoProblems,
    #[error("Bad token: {0}")]
    BadToken(String),
    #[error("Cannot find {0}")]
    Unreachable(String),
    #[error("Sum of weights > 100%")]
    WeightOverflow,
    #[error("Bad weight: {0}")]
    BadWeight(String),
    #[error("Duplicate problem key: {0}")]
    DuplicateKey(String),
}

fn group_separator() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?-u:\s)+-{3,}(?-u:\s)+").expect("Invalid group separator pattern")
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExplicitWeight {
    pub(crate) value: f64,
    pub(crate) written: String,
}

#[derive(Debug)]
enum LineState {
    ExpectingAnchor,
    ExpectingWeightOrDone { anchor: Anchor, weight: Option<ExplicitWeight> },
}

#[derive(Debug)]
struct ParsedLine {
    anchor: Anchor,
    weight: Option<ExplicitWeight>,
}

pub(crate) struct AssignmentParser<'a> {
    hosts: &'a ProblemHosts,
    probe: &'a dyn ReachabilityProbe,
}

impl<'a> AssignmentParser<'a> {
    pub(crate) fn new(hosts: &'a ProblemHosts, probe: &'a dyn ReachabilityProbe) -> Self {
        Self { hosts, probe }
    }

    pub(crate) async fn parse(&self, text: &str) -> Result<AssignmentDocument, ParseError> {
        if text.trim_ascii().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let mut group_texts: Vec<&str> = group_separator().split(text).collect();
        // A trailing separator does not open a new variant.
        while group_texts.last().is_some_and(|group| group.trim_ascii().is_empty()) {
            group_texts.pop();
        }

        let mut groups = Vec::with_capacity(group_texts.len());
        for (index, group_text) in group_texts.into_iter().enumerate() {
            let group = self.parse_group(group_text).await?;
            tracing::debug!(group = index, problems = group.len(), "Parsed problem group");
            groups.push(group);
        }

        Ok(AssignmentDocument { groups })
    }

    async fn parse_group(&self, text: &str) -> Result<ProblemGroup, ParseError> {
        let mut lines = Vec::new();
        for line in text.split('\n').filter(|line| !line.trim_ascii().is_empty()) {
            lines.push(self.parse_line(line).await?);
        }

        if lines.is_empty() {
            return Err(ParseError::NoProblems);
        }

        let explicit: Vec<Option<ExplicitWeight>> =
            lines.iter().map(|line| line.weight.clone()).collect();
        let weights = normalize_weights(&explicit)?;

        let group: ProblemGroup = lines
            .into_iter()
            .zip(weights)
            .map(|(line, weight)| ProblemEntry {
                url: line.anchor.url,
                weight,
                qid: line.anchor.qid,
            })
            .collect();

        ensure_unique_keys(&group)?;
        Ok(group)
    }

    async fn parse_line(&self, line: &str) -> Result<ParsedLine, ParseError> {
        let mut state = LineState::ExpectingAnchor;
        for token in line.split_ascii_whitespace() {
            state = self.advance(state, token).await?;
        }

        match state {
            LineState::ExpectingWeightOrDone { anchor, weight } => {
                Ok(ParsedLine { anchor, weight })
            }
            LineState::ExpectingAnchor => Err(ParseError::NoProblems),
        }
    }

    async fn advance(&self, state: LineState, token: &str) -> Result<LineState, ParseError> {
        match state {
            LineState::ExpectingAnchor => {
                let anchor = match classify(token, true) {
                    TokenClass::Url(url) => resolve_url(url, self.probe).await?,
                    TokenClass::Identifier(id) => {
                        resolve_identifier(id, self.hosts, self.probe).await?
                    }
                    _ => return Err(ParseError::BadToken(token.to_string())),
                };
                Ok(LineState::ExpectingWeightOrDone { anchor, weight: None })
            }
            LineState::ExpectingWeightOrDone { anchor, weight: None } => {
                match classify(token, false) {
                    TokenClass::Percentage { value, written } => {
                        Ok(LineState::ExpectingWeightOrDone {
                            anchor,
                            weight: Some(ExplicitWeight { value, written: written.to_string() }),
                        })
                    }
                    _ => Err(ParseError::BadToken(token.to_string())),
                }
            }
            LineState::ExpectingWeightOrDone { weight: Some(_), .. } => {
                Err(ParseError::BadToken(token.to_string()))
            }
        }
    }
}

/// Resolve the final weight of every entry in a group.
///
/// With unweighted entries present the explicit weights may not exceed 100%
/// and the remainder is split evenly. With every entry weighted, a sum above
/// 100% is scaled down to exactly 100%; a sum at or below 100% is kept as is.
pub(crate) fn normalize_weights(
    weights: &[Option<ExplicitWeight>],
) -> Result<Vec<f64>, ParseError> {
    let mut sum = 0.0;
    let mut unweighted = 0usize;
    for weight in weights {
        match weight {
            None => unweighted += 1,
            Some(explicit) => {
                if explicit.value < 0.0 || explicit.value > 1.0 + WEIGHT_EPSILON {
                    return Err(ParseError::BadWeight(explicit.written.clone()));
                }
                sum += explicit.value;
            }
        }
    }

    if unweighted > 0 {
        if sum > 1.0 + WEIGHT_EPSILON {
            return Err(ParseError::WeightOverflow);
        }
        let share = (1.0 - sum).max(0.0) / unweighted as f64;
        return Ok(weights
            .iter()
            .map(|weight| weight.as_ref().map_or(share, |explicit| explicit.value))
            .collect());
    }

    let scale = if sum > 1.0 + WEIGHT_EPSILON { sum } else { 1.0 };
    Ok(weights
        .iter()
        .map(|weight| weight.as_ref().map_or(0.0, |explicit| explicit.value / scale))
        .collect())
}

fn ensure_unique_keys(group: &[ProblemEntry]) -> Result<(), ParseError> {
    let mut seen = HashSet::with_capacity(group.len());
    for entry in group {
        let key = key_of(entry);
        if !seen.insert(key.clone()) {
            return Err(ParseError::DuplicateKey(key));
        }
    }
    Ok(())
}
