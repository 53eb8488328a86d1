//! HTTP backend against an in-process translator server

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::time::Duration;

use nlcmd::api::{Backend, Breakdown, HttpBackend};
use nlcmd::config::{BackendConfig, Variant};
use nlcmd::error::ClientError;

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn backend(base_url: &str, variant: Variant, timeout_secs: u64) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url: base_url.to_string(),
        variant,
        timeout_secs,
    })
    .unwrap()
}

#[tokio::test]
async fn test_translate_preserves_breakdown_order() {
    let app = Router::new().route(
        "/translate",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["query"], "list all files");
            // Deliberately not alphabetical
            Json(json!({
                "command": "ls -la",
                "explanation": "Lists all files in long format",
                "breakdown": { "ls": "list", "-l": "long format", "-a": "include hidden" },
                "risk_level": 0,
                "watermark": { "dna_signature": "abc123", "authenticated_by": "translator" }
            }))
        }),
    );
    let url = spawn_server(app).await;

    let result = backend(&url, Variant::Linux, 5)
        .translate("list all files")
        .await
        .unwrap();

    assert_eq!(result.command, "ls -la");
    assert_eq!(result.risk_level, Some(0));
    let Breakdown::Structured(rows) = result.breakdown else {
        panic!("expected a structured breakdown");
    };
    let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["ls", "-l", "-a"]);
    assert_eq!(result.watermark.as_deref(), Some("abc123 (translator)"));
}

#[tokio::test]
async fn test_server_error_message_is_verbatim() {
    let app = Router::new().route(
        "/translate",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No query provided" })),
            )
        }),
    );
    let url = spawn_server(app).await;

    let err = backend(&url, Variant::Linux, 5)
        .translate("x")
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "No query provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_without_message_uses_fallback() {
    let app = Router::new().route(
        "/execute",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
    );
    let url = spawn_server(app).await;

    let err = backend(&url, Variant::Linux, 5)
        .execute("ls", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to execute command");
}

#[tokio::test]
async fn test_powershell_endpoints_and_working_dir() {
    let app = Router::new()
        .route(
            "/translate_powershell",
            post(|| async { Json(json!({ "command": "Get-ChildItem", "risk_level": 1 })) }),
        )
        .route(
            "/execute_powershell",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "stdout": format!("ran {}", body["command"].as_str().unwrap_or_default()),
                    "stderr": "",
                    "exit_code": 0,
                    "execution_time": 0.25,
                    "current_directory": body["working_dir"],
                }))
            }),
        );
    let url = spawn_server(app).await;
    let backend = backend(&url, Variant::PowerShell, 5);

    let translation = backend.translate("list files").await.unwrap();
    assert_eq!(translation.command, "Get-ChildItem");

    let execution = backend
        .execute("Get-ChildItem", Some(r"C:\Temp"))
        .await
        .unwrap();
    assert_eq!(execution.stdout, "ran Get-ChildItem");
    assert_eq!(execution.exit_code, Some(0));
    assert!(execution.execution_successful);
    assert_eq!(execution.working_dir, r"C:\Temp");
}

#[tokio::test]
async fn test_hung_backend_times_out() {
    let app = Router::new().route(
        "/translate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "command": "true" }))
        }),
    );
    let url = spawn_server(app).await;

    let err = backend(&url, Variant::Linux, 1)
        .translate("wait")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop so the port is very likely closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(&format!("http://{addr}"), Variant::Linux, 5)
        .translate("anything")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }), "got {err:?}");
    assert!(!err.is_local());
}
