//! Static MIME table keyed by submission/accept type tag.

use crate::types::{AcceptType, SubmissionType};

pub const JSON: &str = "application/json";
pub const TEXT: &str = "text/plain";
pub const URLENCODED: &str = "application/x-www-form-urlencoded";
pub const FORM: &str = "multipart/form-data";

/// Fallback `Accept` value for response types the table does not know.
pub const ANY: &str = "*/*";

pub fn for_submission(kind: SubmissionType) -> &'static str {
    match kind {
        SubmissionType::Json => JSON,
        SubmissionType::Text => TEXT,
        SubmissionType::UrlEncoded => URLENCODED,
        SubmissionType::Form => FORM,
    }
}

pub fn for_accept(kind: &AcceptType) -> &'static str {
    match kind {
        AcceptType::Json => JSON,
        AcceptType::Text => TEXT,
        AcceptType::Other(_) => ANY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_table() {
        assert_eq!(for_submission(SubmissionType::Json), "application/json");
        assert_eq!(for_submission(SubmissionType::Text), "text/plain");
        assert_eq!(
            for_submission(SubmissionType::UrlEncoded),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(for_submission(SubmissionType::Form), "multipart/form-data");
    }

    #[test]
    fn unknown_accept_falls_back_to_any() {
        assert_eq!(for_accept(&AcceptType::Json), JSON);
        assert_eq!(for_accept(&AcceptType::Other("xml".into())), "*/*");
    }
}
