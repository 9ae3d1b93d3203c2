use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field name -> message, as shown next to form inputs
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("not signed in. Run: deltadesk login --username <name>")]
    NotSignedIn,

    #[error("session expired at {0}. Run: deltadesk login --username <name>")]
    SessionExpired(String),

    #[error("invalid location '{0}': {1}")]
    InvalidLocation(String, String),

    #[error("validation failed: {}", format_field_errors(.0))]
    Validation(FieldErrors),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DeskError>;

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{field}: {msg}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One entry of a FastAPI-style validation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Non-2xx response from the backend.
///
/// `detail` holds the server's human-readable message when the body carried
/// one; `issues` holds per-field validation entries when the body was a
/// validation list.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: reqwest::StatusCode,
    pub detail: Option<String>,
    pub issues: Vec<FieldIssue>,
}

impl ApiError {
    pub fn new(status: reqwest::StatusCode) -> Self {
        Self {
            status,
            detail: None,
            issues: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Parse the error body the backend sends alongside a failure status.
    ///
    /// Accepts `{"detail": "..."}`, `{"message": "..."}` and
    /// `{"detail": [{"loc": [...], "msg": "..."}]}`. Anything else keeps only
    /// the status.
    pub fn from_body(status: reqwest::StatusCode, body: &str) -> Self {
        let mut error = Self::new(status);
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return error;
        };

        match value.get("detail") {
            Some(serde_json::Value::String(s)) => error.detail = Some(s.clone()),
            Some(serde_json::Value::Array(entries)) => {
                error.issues = entries.iter().filter_map(parse_issue).collect();
            }
            _ => {}
        }

        if error.detail.is_none()
            && let Some(message) = value.get("message").and_then(|m| m.as_str())
        {
            error.detail = Some(message.to_string());
        }

        error
    }

    pub fn is_bad_request(&self) -> bool {
        self.status == reqwest::StatusCode::BAD_REQUEST
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == reqwest::StatusCode::UNAUTHORIZED
    }
}

fn parse_issue(entry: &serde_json::Value) -> Option<FieldIssue> {
    let message = entry.get("msg")?.as_str()?.to_string();
    let field = entry
        .get("loc")?
        .as_array()?
        .last()
        .and_then(|segment| match segment {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })?;
    Some(FieldIssue { field, message })
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = self.status.canonical_reason().unwrap_or("Unknown");
        write!(f, "API error ({} {})", self.status.as_u16(), reason)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        for issue in &self.issues {
            write!(f, "\n- {}: {}", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_body_string_detail() {
        let err = ApiError::from_body(StatusCode::BAD_REQUEST, r#"{"detail":"Group exists"}"#);
        assert_eq!(err.detail.as_deref(), Some("Group exists"));
        assert!(err.issues.is_empty());
        assert!(err.is_bad_request());
    }

    #[test]
    fn test_from_body_validation_list() {
        let body = r#"{"detail":[{"loc":["query","user_name"],"msg":"field required","type":"missing"}]}"#;
        let err = ApiError::from_body(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(
            err.issues,
            vec![FieldIssue {
                field: "user_name".to_string(),
                message: "field required".to_string()
            }]
        );
    }

    #[test]
    fn test_from_body_message_fallback() {
        let err = ApiError::from_body(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"boom"}"#);
        assert_eq!(err.detail.as_deref(), Some("boom"));
    }

    #[test]
    fn test_from_body_not_json() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(err.detail.is_none());
        assert_eq!(err.to_string(), "API error (502 Bad Gateway)");
    }

    #[test]
    fn test_validation_display() {
        let mut errors = FieldErrors::new();
        errors.insert("name".to_string(), "This field is required".to_string());
        let err = DeskError::Validation(errors);
        assert_eq!(
            err.to_string(),
            "validation failed: name: This field is required"
        );
    }
}
