//! Token classification for a single assignment line.
//!
//! Classification is purely lexical. Turning a URL or identifier into a
//! problem anchor needs the reachability probe and lives in [`resolve_url`] and
//! [`resolve_identifier`].

use std::sync::OnceLock;

use regex::Regex;

use super::parser::ParseError;
use crate::services::probe::ReachabilityProbe;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(-[A-Za-z0-9_]+)*$").expect("Invalid identifier pattern")
    })
}

fn percentage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+(\.[0-9]+)?%$").expect("Invalid percentage pattern"))
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenClass<'a> {
    Url(String),
    Identifier(&'a str),
    Percentage { value: f64, written: &'a str },
    Invalid,
}

/// Classify `token`. Anchors (URLs, identifiers) are only recognized while the
/// line is still waiting for one; afterwards only percentages are valid.
pub(crate) fn classify(token: &str, expecting_anchor: bool) -> TokenClass<'_> {
    if expecting_anchor {
        if token.starts_with("https") {
            TokenClass::Url(token.to_string())
        } else if let Some(rest) = token.strip_prefix("http") {
            TokenClass::Url(format!("https{rest}"))
        } else if identifier_pattern().is_match(token) {
            TokenClass::Identifier(token)
        } else {
            TokenClass::Invalid
        }
    } else if percentage_pattern().is_match(token) {
        let written = &token[..token.len() - 1];
        match written.parse::<f64>() {
            Ok(percent) => TokenClass::Percentage { value: percent / 100.0, written },
            Err(_) => TokenClass::Invalid,
        }
    } else {
        TokenClass::Invalid
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProblemHosts {
    pub(crate) interactivities: String,
    pub(crate) repository: String,
}

impl ProblemHosts {
    pub(crate) fn primary_url(&self, id: &str) -> String {
        format!("https://{}/{id}.xhtml", self.interactivities)
    }

    pub(crate) fn fallback_url(&self, id: &str) -> String {
        format!("https://{}/files?repo=wiley&problem={id}", self.repository)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Anchor {
    pub(crate) url: String,
    pub(crate) qid: Option<String>,
}

pub(crate) async fn resolve_url(
    url: String,
    probe: &dyn ReachabilityProbe,
) -> Result<Anchor, ParseError> {
    if probe.exists(&url).await {
        Ok(Anchor { url, qid: None })
    } else {
        Err(ParseError::Unreachable(url))
    }
}

pub(crate) async fn resolve_identifier(
    id: &str,
    hosts: &ProblemHosts,
    probe: &dyn ReachabilityProbe,
) -> Result<Anchor, ParseError> {
    let primary = hosts.primary_url(id);
    if probe.exists(&primary).await {
        return Ok(Anchor { url: primary, qid: Some(id.to_string()) });
    }

    let fallback = hosts.fallback_url(id);
    if probe.exists(&fallback).await {
        Ok(Anchor { url: fallback, qid: Some(id.to_string()) })
    } else {
        Err(ParseError::Unreachable(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeProbe;

    fn hosts() -> ProblemHosts {
        ProblemHosts {
            interactivities: "www.interactivities.ws".to_string(),
            repository: "codecheck.it".to_string(),
        }
    }

    #[test]
    fn https_token_is_kept_verbatim() {
        assert_eq!(
            classify("https://example.com/p.xhtml", true),
            TokenClass::Url("https://example.com/p.xhtml".to_string())
        );
    }

    #[test]
    fn http_token_is_upgraded() {
        assert_eq!(
            classify("http://example.com/p.xhtml", true),
            TokenClass::Url("https://example.com/p.xhtml".to_string())
        );
    }

    #[test]
    fn identifiers_allow_hyphen_joined_segments() {
        assert_eq!(classify("ch01-sec_2-q3", true), TokenClass::Identifier("ch01-sec_2-q3"));
        assert_eq!(classify("42", true), TokenClass::Identifier("42"));
        assert_eq!(classify("-leading", true), TokenClass::Invalid);
        assert_eq!(classify("double--hyphen", true), TokenClass::Invalid);
        assert_eq!(classify("trailing-", true), TokenClass::Invalid);
        assert_eq!(classify("dot.ted", true), TokenClass::Invalid);
    }

    #[test]
    fn percentages_only_after_anchor() {
        assert_eq!(classify("60%", true), TokenClass::Invalid);
        assert_eq!(classify("60%", false), TokenClass::Percentage { value: 0.6, written: "60" });
        assert_eq!(
            classify("12.5%", false),
            TokenClass::Percentage { value: 0.125, written: "12.5" }
        );
    }

    #[test]
    fn malformed_percentages_are_invalid() {
        assert_eq!(classify("60", false), TokenClass::Invalid);
        assert_eq!(classify(".5%", false), TokenClass::Invalid);
        assert_eq!(classify("5.%", false), TokenClass::Invalid);
        assert_eq!(classify("-5%", false), TokenClass::Invalid);
        assert_eq!(classify("https://example.com", false), TokenClass::Invalid);
    }

    #[tokio::test]
    async fn identifier_prefers_interactivities_page() {
        let probe = FakeProbe::reachable(["https://www.interactivities.ws/q1.xhtml"]);
        let anchor = resolve_identifier("q1", &hosts(), &probe)
            .await
            .expect("anchor");

        assert_eq!(anchor.url, "https://www.interactivities.ws/q1.xhtml");
        assert_eq!(anchor.qid.as_deref(), Some("q1"));
        assert_eq!(probe.calls(), vec!["https://www.interactivities.ws/q1.xhtml".to_string()]);
    }

    #[tokio::test]
    async fn identifier_falls_back_to_repository() {
        let probe = FakeProbe::reachable(["https://codecheck.it/files?repo=wiley&problem=q1"]);
        let anchor = resolve_identifier("q1", &hosts(), &probe)
            .await
            .expect("anchor");

        assert_eq!(anchor.url, "https://codecheck.it/files?repo=wiley&problem=q1");
        assert_eq!(anchor.qid.as_deref(), Some("q1"));
        assert_eq!(probe.calls().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_identifier_reports_identifier() {
        let probe = FakeProbe::reachable(Vec::<&str>::new());
        let err = resolve_identifier("q1", &hosts(), &probe)
            .await
            .expect_err("unreachable");

        assert_eq!(err.to_string(), "Cannot find q1");
    }

    #[tokio::test]
    async fn unreachable_url_reports_url() {
        let probe = FakeProbe::reachable(Vec::<&str>::new());
        let err = resolve_url("https://example.com/missing.xhtml".to_string(), &probe)
            .await
            .expect_err("unreachable");

        assert_eq!(err.to_string(), "Cannot find https://example.com/missing.xhtml");
        assert_eq!(probe.calls().len(), 1);
    }
}
