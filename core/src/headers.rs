//! Ordered, case-insensitive outgoing header list.
//!
//! # Design
//! Headers stay a `Vec<(String, String)>` so insertion order is what goes on
//! the wire. `derive` applies the fixed precedence: accept type, submission
//! type, explicit content type, caller headers, and finally the multipart
//! rule that leaves `Content-Type` to the transport.

use crate::content_type;
use crate::options::ContentTypeOverride;
use crate::types::{AcceptType, SubmissionType};

pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the header list for one request.
    pub fn derive(
        submission: SubmissionType,
        accept: &AcceptType,
        content_type: &ContentTypeOverride,
        caller: &[(String, String)],
    ) -> Self {
        let mut headers = Self::new();
        headers.set_accept(accept);
        headers.set_submission(submission);
        match content_type {
            ContentTypeOverride::Derived => {}
            ContentTypeOverride::Explicit(value) => headers.set(CONTENT_TYPE, value),
            ContentTypeOverride::Omit => headers.remove(CONTENT_TYPE),
        }
        for (name, value) in caller {
            headers.set(name, value);
        }
        if submission == SubmissionType::Form {
            headers.remove(CONTENT_TYPE);
        }
        headers
    }

    /// `Accept` from the table, `*/*` for unknown types.
    pub fn set_accept(&mut self, accept: &AcceptType) {
        self.set(ACCEPT, content_type::for_accept(accept));
    }

    /// `Content-Type` from the table; `form` clears it.
    pub fn set_submission(&mut self, submission: SubmissionType) {
        match submission {
            SubmissionType::Form => self.remove(CONTENT_TYPE),
            other => self.set(CONTENT_TYPE, content_type::for_submission(other)),
        }
    }

    /// Replace an existing header in place, or append a new one.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_to_json_both_ways() {
        let h = HeaderList::derive(
            SubmissionType::Json,
            &AcceptType::Json,
            &ContentTypeOverride::Derived,
            &[],
        );
        assert_eq!(
            h.iter().collect::<Vec<_>>(),
            vec![("Accept", "application/json"), ("Content-Type", "application/json")]
        );
    }

    #[test]
    fn unknown_accept_asks_for_anything() {
        let h = HeaderList::derive(
            SubmissionType::Text,
            &AcceptType::Other("blob".into()),
            &ContentTypeOverride::Derived,
            &[],
        );
        assert_eq!(h.get("accept"), Some("*/*"));
        assert_eq!(h.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn explicit_false_removes_content_type() {
        let h = HeaderList::derive(
            SubmissionType::UrlEncoded,
            &AcceptType::Json,
            &ContentTypeOverride::Omit,
            &[],
        );
        assert!(!h.contains(CONTENT_TYPE));
    }

    #[test]
    fn explicit_value_overrides_derived() {
        let h = HeaderList::derive(
            SubmissionType::Json,
            &AcceptType::Json,
            &ContentTypeOverride::Explicit("application/vnd.api+json".into()),
            &[],
        );
        assert_eq!(h.get(CONTENT_TYPE), Some("application/vnd.api+json"));
    }

    #[test]
    fn caller_headers_win_and_keep_position() {
        let h = HeaderList::derive(
            SubmissionType::Json,
            &AcceptType::Json,
            &ContentTypeOverride::Derived,
            &caller(&[("accept", "text/html"), ("X-Trace", "abc")]),
        );
        assert_eq!(
            h.iter().collect::<Vec<_>>(),
            vec![
                ("Accept", "text/html"),
                ("Content-Type", "application/json"),
                ("X-Trace", "abc")
            ]
        );
    }

    #[test]
    fn form_never_keeps_content_type() {
        for headers in [
            caller(&[("Content-Type", "text/plain"), ("X-A", "1")]),
            caller(&[("X-A", "1"), ("content-type", "text/plain")]),
        ] {
            let h = HeaderList::derive(
                SubmissionType::Form,
                &AcceptType::Json,
                &ContentTypeOverride::Explicit("text/plain".into()),
                &headers,
            );
            assert!(!h.contains(CONTENT_TYPE));
            assert_eq!(h.get("x-a"), Some("1"));
        }
    }
}
