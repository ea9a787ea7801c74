//! The remote artifact store.
//!
//! Reconciliation and project comparison only see the [`RemoteStore`] trait.
//! [`http::HttpRemote`] implements it against the platform's REST API.

pub mod http;

#[cfg(test)]
pub mod fake;

use crate::artifact::{Artifact, ProjectSettings, ScriptKind};

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected API response from {endpoint}: {detail}")]
    UnexpectedResponse { endpoint: String, detail: String },
    #[error("Login failed: {0}")]
    Login(String),
}

impl RemoteError {
    pub fn unexpected(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        RemoteError::UnexpectedResponse {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }
}

pub trait RemoteStore {
    /// Every action of every datastore in the project, in listing order, with
    /// the datastore name as container. An empty list is not an error.
    fn list_actions(&self, project_id: &str) -> Result<Vec<Artifact>, RemoteError>;

    /// Every function of the project, in listing order.
    fn list_functions(&self, project_id: &str) -> Result<Vec<Artifact>, RemoteError>;

    /// Fetch one script of an artifact. `Ok(None)` means the remote has no
    /// such script (not found, or an empty script), which is normal.
    fn fetch_script(
        &self,
        artifact: &Artifact,
        kind: ScriptKind,
    ) -> Result<Option<String>, RemoteError>;

    fn project_settings(&self, project_id: &str) -> Result<ProjectSettings, RemoteError>;
}

/// Interpret the body of a script download.
///
/// The download endpoint returns the script as raw text, or a JSON error
/// object. `NOT_FOUND` and the "empty script" system error both mean there is
/// no script; any other JSON body is unexpected.
pub fn classify_script_response(endpoint: &str, body: &str) -> Result<Option<String>, RemoteError> {
    let script = body.trim();
    if script.is_empty() {
        return Ok(None);
    }
    if !script.starts_with('{') {
        return Ok(Some(script.to_string()));
    }

    let json: serde_json::Value = serde_json::from_str(script).map_err(|e| {
        RemoteError::unexpected(endpoint, format!("unparseable JSON body: {e}"))
    })?;

    let error_code = json.get("error_code").and_then(|v| v.as_str());
    let error = json.get("error").and_then(|v| v.as_str());
    match (error_code, error) {
        (Some("NOT_FOUND"), _) => Ok(None),
        (Some("SYSTEM_ERROR"), Some("empty script")) => Ok(None),
        _ => Err(RemoteError::unexpected(endpoint, snippet(script))),
    }
}

/// Shorten a response body for log and error messages.
pub fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 120;
    if body.chars().count() > MAX_CHARS {
        let head: String = body.chars().take(MAX_CHARS).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "/api/v0/actions/a1/actionscripts/download";

    #[test]
    fn raw_script_is_returned_trimmed() {
        let body = "\n\nasync function main(data) {}\n  ";
        assert_eq!(
            classify_script_response(ENDPOINT, body).unwrap(),
            Some("async function main(data) {}".to_string())
        );
    }

    #[test]
    fn blank_body_is_absent() {
        assert_eq!(classify_script_response(ENDPOINT, " \n").unwrap(), None);
    }

    #[test]
    fn not_found_error_is_absent() {
        let body = r#"{"error_code": "NOT_FOUND", "error": "no script"}"#;
        assert_eq!(classify_script_response(ENDPOINT, body).unwrap(), None);
    }

    #[test]
    fn empty_script_system_error_is_absent() {
        let body = r#"{"error_code": "SYSTEM_ERROR", "error": "empty script"}"#;
        assert_eq!(classify_script_response(ENDPOINT, body).unwrap(), None);
    }

    #[test]
    fn other_system_error_is_unexpected() {
        let body = r#"{"error_code": "SYSTEM_ERROR", "error": "database down"}"#;
        assert!(matches!(
            classify_script_response(ENDPOINT, body),
            Err(RemoteError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn json_without_error_code_is_unexpected() {
        let body = r#"{"message": "hello"}"#;
        assert!(matches!(
            classify_script_response(ENDPOINT, body),
            Err(RemoteError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn broken_json_is_unexpected() {
        let body = "{ this is not json";
        let err = classify_script_response(ENDPOINT, body).unwrap_err();
        assert!(err.to_string().contains("unparseable JSON body"));
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let short = snippet(&long);
        assert_eq!(short.len(), 123);
        assert!(short.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }
}
