use planwise_sdk::client::PlannerApi;
use planwise_sdk::error::ErrorKind;
use planwise_sdk::http::HttpPlannerClient;
use planwise_sdk::stream::read_reply;
use planwise_sdk::types::{
    CreateSessionRequest, SendMessageRequest, SessionContext, SessionPage, SessionStatus,
};

fn session_json(id: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "owner_id": "user-1",
        "title": title,
        "context": {
            "business_type": "SaaS",
            "target_market": "SMBs",
            "challenge": "retention"
        },
        "status": "active",
        "created_at": 1700000000000i64,
        "updated_at": 1700000000000i64
    })
}

fn session_body(id: &str, title: &str) -> String {
    serde_json::json!({ "session": session_json(id, title) }).to_string()
}

fn create_request() -> CreateSessionRequest {
    CreateSessionRequest {
        title: Some("Churn plan".to_string()),
        context: SessionContext::new("SaaS", "SMBs", "retention"),
    }
}

#[tokio::test]
async fn create_session_parses_envelope_and_sends_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sessions")
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(session_body("sess-1", "Churn plan"))
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "secret-token").unwrap();
    let session = client.create_session(create_request()).await.unwrap();

    assert_eq!(session.id, "sess-1");
    assert_eq!(session.title, "Churn plan");
    assert_eq!(session.status, SessionStatus::Active);
    mock.assert_async().await;
}

#[tokio::test]
async fn create_session_429_classifies_as_rate_limit_with_retry_after() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .with_status(429)
        .with_header("retry-after", "30")
        .with_body(r#"{"code":"RATE_LIMIT_EXCEEDED","message":"Too many requests"}"#)
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let err = client.create_session(create_request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    assert!(err.is_transient());
    match err {
        planwise_sdk::error::PlannerError::RateLimit {
            message,
            retry_after,
        } => {
            assert_eq!(message, "Too many requests");
            assert_eq!(retry_after, Some(30));
        }
        other => panic!("expected RateLimit, got {:?}", other),
    }
}

#[tokio::test]
async fn create_session_5xx_classifies_as_transient_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .with_status(503)
        .with_body(r#"{"code":"UPSTREAM_DOWN","message":"Service unavailable"}"#)
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let err = client.create_session(create_request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert!(err.is_transient());
}

#[tokio::test]
async fn create_session_400_classifies_as_validation() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .with_status(400)
        .with_body(r#"{"code":"INVALID_CONTEXT","message":"challenge is required"}"#)
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let err = client.create_session(create_request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(!err.is_transient());
}

#[tokio::test]
async fn create_session_409_keeps_backend_code_and_is_terminal() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .with_status(409)
        .with_body(r#"{"code":"SESSION_LIMIT_REACHED","message":"Plan allows 3 sessions"}"#)
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let err = client.create_session(create_request()).await.unwrap_err();

    assert!(!err.is_transient());
    match err {
        planwise_sdk::error::PlannerError::Api { status, code, message } => {
            assert_eq!(status, 409);
            assert_eq!(code.as_deref(), Some("SESSION_LIMIT_REACHED"));
            assert_eq!(message, "Plan allows 3 sessions");
        }
        other => panic!("expected Api, got {:?}", other),
    }
}

#[tokio::test]
async fn unparsable_error_body_falls_back_to_raw_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let err = client.create_session(create_request()).await.unwrap_err();

    match err {
        planwise_sdk::error::PlannerError::Server { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "<html>Bad Gateway</html>");
        }
        other => panic!("expected Server, got {:?}", other),
    }
}

#[tokio::test]
async fn send_message_streams_reply_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions/sess-1/messages")
        .with_status(200)
        .with_body("Reduce churn by improving onboarding.")
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let stream = client
        .send_message(
            "sess-1",
            SendMessageRequest {
                message: "How do I reduce churn?".to_string(),
            },
        )
        .await
        .unwrap();

    let mut last_seen = String::new();
    let full = read_reply(stream, |so_far| last_seen = so_far.to_string())
        .await
        .unwrap();

    assert_eq!(full, "Reduce churn by improving onboarding.");
    assert_eq!(last_seen, full);
}

#[tokio::test]
async fn send_message_error_body_classifies_before_streaming() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions/sess-1/messages")
        .with_status(429)
        .with_body(r#"{"code":"USAGE_LIMIT","message":"Monthly message quota reached"}"#)
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let err = match client
        .send_message(
            "sess-1",
            SendMessageRequest {
                message: "hello".to_string(),
            },
        )
        .await
    {
        Ok(_) => panic!("expected send_message to return an error"),
        Err(e) => e,
    };

    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
}

#[tokio::test]
async fn list_sessions_sends_pagination_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/sessions")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("limit".into(), "10".into()),
            mockito::Matcher::UrlEncoded("offset".into(), "20".into()),
        ]))
        .with_status(200)
        .with_body(
            serde_json::json!({
                "sessions": [session_json("sess-1", "A"), session_json("sess-2", "B")]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let sessions = client
        .list_sessions(SessionPage {
            limit: 10,
            offset: 20,
        })
        .await
        .unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[1].id, "sess-2");
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_session_accepts_no_content() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/sessions/sess-1")
        .with_status(204)
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    assert!(client.delete_session("sess-1").await.is_ok());
}

#[tokio::test]
async fn rename_session_patches_title() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/sessions/sess-1")
        .match_body(mockito::Matcher::Json(
            serde_json::json!({"title": "Renamed"}),
        ))
        .with_status(200)
        .with_body(session_body("sess-1", "Renamed"))
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let session = client.rename_session("sess-1", "Renamed").await.unwrap();

    assert_eq!(session.title, "Renamed");
    mock.assert_async().await;
}

#[tokio::test]
async fn archive_session_patches_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/sessions/sess-1")
        .match_body(mockito::Matcher::Json(
            serde_json::json!({"status": "archived"}),
        ))
        .with_status(200)
        .with_body(session_body("sess-1", "Churn plan").replace("\"active\"", "\"archived\""))
        .create_async()
        .await;

    let client = HttpPlannerClient::new(server.url(), "token").unwrap();
    let session = client.archive_session("sess-1").await.unwrap();

    assert_eq!(session.status, SessionStatus::Archived);
    mock.assert_async().await;
}
