use super::model::ProblemEntry;

/// Join key between a problem entry and a submission's sub-result.
///
/// Entries declared by identifier use the identifier itself. Entries declared
/// by URL use the last path segment with everything outside `[A-Za-z_-]`
/// stripped, so `https://host/p1.xhtml` and `https://host/p2.xhtml` share the
/// key `pxhtml`. Keys must be unique within a group for scoring to be
/// meaningful; the parser rejects groups that violate this.
pub(crate) fn key_of(entry: &ProblemEntry) -> String {
    if let Some(qid) = &entry.qid {
        return qid.clone();
    }

    let last_segment = match entry.url.rfind('/') {
        Some(index) => &entry.url[index + 1..],
        None => entry.url.as_str(),
    };

    last_segment
        .chars()
        .filter(|ch| ch.is_ascii_alphabetic() || *ch == '_' || *ch == '-')
        .collect()
}
