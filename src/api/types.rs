//! Result types returned by the translator backend.
//!
//! Bodies are decoded leniently: a field with an unexpected shape is treated
//! as absent so the view can fall back to its placeholder text instead of
//! failing the whole render.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

/// Command value the backend sends when it has no API credentials configured
pub const API_KEY_REQUIRED: &str = "API_KEY_REQUIRED";

#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ExecuteRequest<'a> {
    pub command: &'a str,
    pub working_dir: Option<&'a str>,
}

/// Ordered (component, explanation) pairs describing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Breakdown {
    Structured(Vec<(String, String)>),
    Unavailable,
}

impl Breakdown {
    /// Objects keep their key order; arrays are keyed by index
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self::Structured(
                map.iter()
                    .map(|(component, explanation)| (component.clone(), text_of(explanation)))
                    .collect(),
            ),
            Some(Value::Array(items)) => Self::Structured(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, explanation)| (index.to_string(), text_of(explanation)))
                    .collect(),
            ),
            _ => Self::Unavailable,
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A translated command, current until the next translation replaces it
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub command: String,
    pub explanation: String,
    pub breakdown: Breakdown,
    pub simulation: Option<String>,
    pub safety_warning: Option<String>,
    pub risk_level: Option<i64>,
    pub watermark: Option<String>,
}

impl TranslationResult {
    /// Decode a successful `/translate` body
    ///
    /// # Errors
    /// Returns [`ClientError::Decode`] when the body is not an object or has no
    /// string `command`.
    pub fn from_value(value: &Value) -> ClientResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ClientError::Decode("expected a JSON object".to_string()))?;

        let command = string_field(obj, "command")
            .ok_or_else(|| ClientError::Decode("missing `command` field".to_string()))?;

        Ok(Self {
            command,
            explanation: string_field(obj, "explanation").unwrap_or_default(),
            breakdown: Breakdown::from_value(obj.get("breakdown")),
            simulation: non_empty_field(obj, "simulation"),
            safety_warning: non_empty_field(obj, "safety_warning"),
            risk_level: integer_field(obj, "risk_level"),
            watermark: watermark_field(obj),
        })
    }

    /// The backend answered with the credentials sentinel instead of a command
    #[must_use]
    pub fn requires_credentials(&self) -> bool {
        self.command == API_KEY_REQUIRED
    }
}

/// Outcome of running one command on the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
    pub exit_meaning: Option<String>,
    pub execution_successful: bool,
    pub execution_time: Option<f64>,
    pub error: Option<String>,
    pub system_info: Option<String>,
    pub working_dir: String,
}

impl ExecutionResult {
    /// Decode a successful `/execute` body. `requested_dir` is used when the
    /// server does not report the directory it ran in.
    ///
    /// # Errors
    /// Returns [`ClientError::Decode`] when the body is not a JSON object.
    pub fn from_value(value: &Value, requested_dir: Option<&str>) -> ClientResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ClientError::Decode("expected a JSON object".to_string()))?;

        // Older servers answer with `output` instead of `stdout`
        let stdout = string_field(obj, "stdout")
            .or_else(|| string_field(obj, "output"))
            .unwrap_or_default();
        let stderr = string_field(obj, "stderr").unwrap_or_default();
        let exit_code = integer_field(obj, "exit_code");
        let error = non_empty_field(obj, "error");

        let execution_successful = obj
            .get("execution_successful")
            .and_then(Value::as_bool)
            .unwrap_or(exit_code == Some(0) && error.is_none());

        let working_dir = non_empty_field(obj, "current_directory")
            .or_else(|| non_empty_field(obj, "working_dir"))
            .or_else(|| non_empty_field(obj, "working_directory"))
            .or_else(|| requested_dir.map(str::to_owned))
            .unwrap_or_default();

        Ok(Self {
            stdout,
            stderr,
            exit_code,
            exit_meaning: non_empty_field(obj, "exit_meaning"),
            execution_successful,
            execution_time: obj.get("execution_time").and_then(Value::as_f64),
            error,
            system_info: system_info_field(obj),
            working_dir,
        })
    }
}

/// Pull `error` out of a failure body, if the server sent one
#[must_use]
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn non_empty_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    string_field(obj, key).filter(|s| !s.trim().is_empty())
}

fn integer_field(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `watermark` is either a bare string or `{ dna_signature, authenticated_by }`
fn watermark_field(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("watermark")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            let signature = map.get("dna_signature").and_then(Value::as_str)?;
            match map.get("authenticated_by").and_then(Value::as_str) {
                Some(by) => Some(format!("{signature} ({by})")),
                None => Some(signature.to_string()),
            }
        }
        _ => None,
    }
}

fn system_info_field(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("system_info")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) if !map.is_empty() => Some(
            map.iter()
                .map(|(k, v)| match v {
                    Value::String(s) => format!("{k}: {s}"),
                    other => format!("{k}: {other}"),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_breakdown_keeps_key_order() {
        let body = json!({
            "command": "ls -la /tmp",
            "explanation": "List everything in /tmp",
            "breakdown": { "ls": "list", "-la": "long, all", "/tmp": "target" }
        });
        let result = TranslationResult::from_value(&body).unwrap();
        let Breakdown::Structured(rows) = result.breakdown else {
            panic!("expected structured breakdown");
        };
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["ls", "-la", "/tmp"]);
    }

    #[test]
    fn test_breakdown_array_uses_index_keys() {
        let body = json!({
            "command": "tar -xzf a.tgz",
            "breakdown": ["tar: archive tool", "-xzf: extract gzip file"]
        });
        let result = TranslationResult::from_value(&body).unwrap();
        assert_eq!(
            result.breakdown,
            Breakdown::Structured(vec![
                ("0".to_string(), "tar: archive tool".to_string()),
                ("1".to_string(), "-xzf: extract gzip file".to_string()),
            ])
        );
    }

    #[test]
    fn test_breakdown_not_an_object() {
        let body = json!({ "command": "pwd", "explanation": "", "breakdown": "pwd prints" });
        let result = TranslationResult::from_value(&body).unwrap();
        assert_eq!(result.breakdown, Breakdown::Unavailable);

        let body = json!({ "command": "pwd" });
        let result = TranslationResult::from_value(&body).unwrap();
        assert_eq!(result.breakdown, Breakdown::Unavailable);
        assert!(result.explanation.is_empty());
    }

    #[test]
    fn test_missing_command_is_decode_error() {
        let err = TranslationResult::from_value(&json!({ "explanation": "x" })).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_sentinel_detection() {
        let result = TranslationResult::from_value(&json!({ "command": "API_KEY_REQUIRED" })).unwrap();
        assert!(result.requires_credentials());
    }

    #[test]
    fn test_watermark_shapes() {
        let plain = TranslationResult::from_value(&json!({ "command": "ls", "watermark": "abc" })).unwrap();
        assert_eq!(plain.watermark.as_deref(), Some("abc"));

        let object = TranslationResult::from_value(&json!({
            "command": "ls",
            "watermark": { "dna_signature": "DNA-1", "authenticated_by": "server" }
        }))
        .unwrap();
        assert_eq!(object.watermark.as_deref(), Some("DNA-1 (server)"));
    }

    #[test]
    fn test_execution_defaults_and_directory_fallback() {
        let result = ExecutionResult::from_value(&json!({ "stdout": "hi\n", "exit_code": 0 }), Some("/srv")).unwrap();
        assert_eq!(result.stdout, "hi\n");
        assert!(result.stderr.is_empty());
        assert!(result.execution_successful);
        assert_eq!(result.working_dir, "/srv");

        let reported = ExecutionResult::from_value(
            &json!({ "current_directory": "/home/user", "exit_code": 2, "error": "boom" }),
            Some("/srv"),
        )
        .unwrap();
        assert_eq!(reported.working_dir, "/home/user");
        assert!(!reported.execution_successful);
        assert_eq!(reported.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_system_info_object() {
        let result = ExecutionResult::from_value(
            &json!({ "system_info": { "os": "Linux", "shell": "bash" } }),
            None,
        )
        .unwrap();
        assert_eq!(result.system_info.as_deref(), Some("os: Linux, shell: bash"));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(br#"{"error":"No query provided"}"#).as_deref(), Some("No query provided"));
        assert_eq!(error_message(b"<html>502</html>"), None);
        assert_eq!(error_message(br#"{"error":""}"#), None);
    }
}
