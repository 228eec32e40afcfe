//! Full-stack test: engine + real HTTP client against a mock verifier

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{collect_until_terminal, fast_config, init_tracing};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use verification_core::{SessionState, VerificationEngine};
use verifier_client::integration_server::{IntegrationServerClient, IntegrationServerConfig};
use verifier_client::VerifierApi;

/// Spawns a mock integration server whose status endpoint reports the user
/// verified once `verified_after` status polls have happened.
async fn spawn_verifier(verified_after: u32) -> String {
    let status_calls = Arc::new(AtomicU32::new(0));

    let app = Router::new()
        .route(
            "/verify-player",
            post(|Json(body): Json<serde_json::Value>| async move {
                let player = body["playerName"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "success": true,
                    "qrUrl": format!("https://verifier/qr/{player}"),
                    "sessionId": format!("sess-{player}"),
                }))
            }),
        )
        .route(
            "/status/{user}",
            get(move |Path(user): Path<String>| {
                let status_calls = Arc::clone(&status_calls);
                async move {
                    if user == "ping" {
                        return Json(json!({ "verified": false }));
                    }
                    let polls = status_calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Json(json!({ "verified": polls >= verified_after }))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock verifier");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock verifier stopped");
    });

    format!("http://{addr}")
}

fn engine_against(base_url: String) -> (VerificationEngine, flume::Receiver<verification_core::HostEvent>) {
    let client = IntegrationServerClient::new(IntegrationServerConfig::new(base_url));
    VerificationEngine::new(Arc::new(client) as Arc<dyn VerifierApi>, fast_config())
}

#[tokio::test]
async fn verification_completes_over_real_http() {
    init_tracing();
    let base_url = spawn_verifier(3).await;
    let (engine, events) = engine_against(base_url);
    let user = format!("user-{}", Uuid::new_v4());

    let invitation = engine.start_verification(&user).await.unwrap();
    assert_eq!(
        invitation.qr_payload,
        format!("https://verifier/qr/{user}")
    );

    let (terminal, _seen) = collect_until_terminal(&events).await;

    assert_eq!(terminal, SessionState::Verified);
    assert!(engine.is_verified(&user));
    assert_eq!(engine.session_state(&user), None);
}

#[tokio::test]
async fn check_verifier_reports_reachability() {
    let base_url = spawn_verifier(1).await;
    let (engine, _events) = engine_against(base_url);

    assert!(engine.check_verifier().await);
}

#[tokio::test]
async fn check_verifier_reports_an_unreachable_service() {
    // A port with no listener behind it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (engine, _events) = engine_against(format!("http://{addr}"));

    assert!(!engine.check_verifier().await);
}
