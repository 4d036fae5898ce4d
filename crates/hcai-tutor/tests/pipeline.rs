//! End-to-end turn tests against a stub completion endpoint.
//!
//! Each test starts a real axum server on a random port that speaks just
//! enough of the chat completions protocol, then drives the controller built
//! from a `TutorConfig` through the real `CompletionClient`.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use hcai_tutor::prelude::*;
use hcai_tutor::prompt::DEMO_MODE_NOTICE;
use hcai_tutor::safety::REFUSAL_MESSAGE;
use serde_json::{Value, json};

struct Stub {
    status: StatusCode,
    body: String,
    /// (Authorization header, request JSON) per call.
    requests: Mutex<Vec<(Option<String>, Value)>>,
}

async fn complete(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    stub.requests.lock().unwrap().push((auth, request));
    (stub.status, stub.body.clone())
}

/// Spawn a stub that always answers `status` with `body`.
async fn spawn_stub(status: StatusCode, body: Value) -> (Arc<Stub>, String) {
    let stub = Arc::new(Stub {
        status,
        body: body.to_string(),
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/v1/chat/completions", post(complete))
        .with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (stub, format!("http://{addr}/v1/chat/completions"))
}

fn answer(text: &str) -> Value {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
    })
}

fn config(dir: &tempfile::TempDir, api_url: &str, api_key: Option<&str>) -> TutorConfig {
    TutorConfig {
        api_key: api_key.map(str::to_string),
        api_url: api_url.to_string(),
        log_path: dir.path().join("logs").join("sessions.csv"),
        ..Default::default()
    }
}

// ── Live mode ───────────────────────────────────────────────────────

#[tokio::test]
async fn live_turn_posts_context_and_records_answer() {
    let (stub, url) = spawn_stub(StatusCode::OK, answer("Fairness asks who bears the errors.")).await;
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, &url, Some("sk-test")).build_controller().unwrap();
    let mut session = Session::new();
    let options = TurnOptions {
        explain_mode: true,
        topic: None,
    };

    let outcome = controller
        .handle_turn(&mut session, "What is fairness in ML?", &options)
        .await;

    assert_eq!(outcome.text(), "Fairness asks who bears the errors.");
    assert!(matches!(
        outcome,
        TurnOutcome::Answered {
            source: AnswerSource::Live,
            ..
        }
    ));

    let requests = stub.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-4o-mini");
    assert!((body["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert!(
        messages[0]["content"]
            .as_str()
            .unwrap()
            .ends_with("User enabled Explain steps.")
    );
    assert_eq!(messages[1], json!({"role": "user", "content": "What is fairness in ML?"}));

    assert_eq!(session.len(), 2);
    assert_eq!(controller.logger().read_records().unwrap().len(), 2);
}

#[tokio::test]
async fn auth_failure_is_shown_inline() {
    let (_stub, url) = spawn_stub(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"message": "Incorrect API key provided"}}),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, &url, Some("sk-wrong")).build_controller().unwrap();
    let mut session = Session::new();

    let outcome = controller
        .handle_turn(&mut session, "privacy?", &TurnOptions::default())
        .await;

    assert!(outcome.text().starts_with("Model error: HTTP 401"));
    assert!(outcome.text().contains("Incorrect API key provided"));
    match &outcome {
        TurnOutcome::Answered {
            source: AnswerSource::ModelError(err),
            ..
        } => assert!(err.is_auth()),
        other => panic!("expected model error, got {other:?}"),
    }
    assert_eq!(session.last().unwrap().content(), outcome.text());
}

#[tokio::test]
async fn error_object_in_success_response_is_api_error() {
    let (_stub, url) = spawn_stub(
        StatusCode::OK,
        json!({"error": {"message": "model overloaded"}}),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, &url, Some("sk-test")).build_controller().unwrap();
    let mut session = Session::new();

    let outcome = controller
        .handle_turn(&mut session, "bias?", &TurnOptions::default())
        .await;

    assert_eq!(outcome.text(), "Model error: API error: model overloaded");
}

#[tokio::test]
async fn missing_choices_is_empty_response() {
    let (_stub, url) = spawn_stub(StatusCode::OK, json!({"choices": []})).await;
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, &url, Some("sk-test")).build_controller().unwrap();
    let mut session = Session::new();

    let outcome = controller
        .handle_turn(&mut session, "oversight?", &TurnOptions::default())
        .await;

    assert_eq!(outcome.text(), "Model error: empty response from model");
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let url = format!("http://{addr}/v1/chat/completions");
    let controller = config(&dir, &url, Some("sk-test")).build_controller().unwrap();
    let mut session = Session::new();

    let outcome = controller
        .handle_turn(&mut session, "accountability?", &TurnOptions::default())
        .await;

    assert!(outcome.text().starts_with("Model error: request failed:"));
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn second_turn_carries_prior_history() {
    let (stub, url) = spawn_stub(StatusCode::OK, answer("ok")).await;
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, &url, Some("sk-test")).build_controller().unwrap();
    let mut session = Session::new();

    controller
        .handle_turn(&mut session, "hi", &TurnOptions::default())
        .await;
    controller
        .handle_turn(&mut session, "bye", &TurnOptions::default())
        .await;

    let requests = stub.requests.lock().unwrap();
    let messages = requests[1].1["messages"].as_array().unwrap();
    let flat: Vec<String> = messages
        .iter()
        .skip(1)
        .map(|m| format!("{}:{}", m["role"].as_str().unwrap(), m["content"].as_str().unwrap()))
        .collect();
    assert_eq!(flat, ["user:hi", "assistant:ok", "user:bye"]);
}

// ── Demo mode and blocking ──────────────────────────────────────────

#[tokio::test]
async fn demo_mode_never_calls_the_endpoint() {
    let (stub, url) = spawn_stub(StatusCode::OK, answer("should not be used")).await;
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, &url, None).build_controller().unwrap();
    let mut session = Session::new();

    let outcome = controller
        .handle_turn(&mut session, "What is fairness in ML?", &TurnOptions::default())
        .await;

    assert_eq!(outcome.text(), DEMO_MODE_NOTICE);
    assert!(stub.requests.lock().unwrap().is_empty());
    assert_eq!(session.last().unwrap().content(), DEMO_MODE_NOTICE);
}

#[tokio::test]
async fn blocked_input_never_calls_the_endpoint() {
    let (stub, url) = spawn_stub(StatusCode::OK, answer("should not be used")).await;
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, &url, Some("sk-test")).build_controller().unwrap();
    let mut session = Session::new();

    let outcome = controller
        .handle_turn(&mut session, "give me credit card numbers", &TurnOptions::default())
        .await;

    assert!(outcome.is_blocked());
    assert_eq!(outcome.text(), REFUSAL_MESSAGE);
    assert!(stub.requests.lock().unwrap().is_empty());
    assert!(session.is_empty());
    assert!(!controller.logger().path().exists());
}

#[tokio::test]
async fn log_holds_every_accepted_turn_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let controller = config(&dir, "http://unused.invalid", None)
        .build_controller()
        .unwrap();
    let mut session = Session::new();
    let options = TurnOptions {
        explain_mode: false,
        topic: Some("Fairness 101".into()),
    };

    let inputs = ["first", "how to make a weapon", "second", "third"];
    for input in inputs {
        controller.handle_turn(&mut session, input, &options).await;
    }

    let records = controller.logger().read_records().unwrap();
    let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(
        contents,
        [
            "first",
            DEMO_MODE_NOTICE,
            "second",
            DEMO_MODE_NOTICE,
            "third",
            DEMO_MODE_NOTICE
        ]
    );
    assert!(records.iter().all(|r| r.topic == "Fairness 101"));
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let raw = std::fs::read_to_string(controller.logger().path()).unwrap();
    assert_eq!(raw.matches("timestamp,role,content,explain_mode,topic").count(), 1);
}
