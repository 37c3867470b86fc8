use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use notifier::config::schema::{ChannelConfig, SlackWebhookConfig};
use notifier::notify::webhook::SlackWebhookBackend;
use notifier::notify::{ChannelKind, FailureKind, NotificationRequest, NotifierBackend, Outcome};

type Received = Arc<Mutex<Vec<Value>>>;

/// Records every JSON body posted to `/hook` and answers `status`.
async fn spawn_hook(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route(
            "/hook",
            post(|State((received, status)): State<(Received, StatusCode)>, Json(body): Json<Value>| async move {
                received.lock().unwrap().push(body);
                status
            }),
        )
        .with_state((Arc::clone(&received), status));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/hook"), received)
}

fn webhook_config(urls: Vec<String>) -> ChannelConfig {
    ChannelConfig::SlackWebhook(SlackWebhookConfig {
        enabled: true,
        webhook_urls: urls,
        username: "notifier".to_string(),
        icon_emoji: "robot_face".to_string(),
        ..SlackWebhookConfig::default()
    })
}

fn request(channels: &[&str]) -> NotificationRequest {
    NotificationRequest::builder("deploy finished", "all green")
        .recipients(ChannelKind::SlackWebhook, channels.iter().copied())
        .build()
}

async fn send(urls: Vec<String>, channels: &[&str]) -> Outcome {
    let request = request(channels);
    SlackWebhookBackend::with_timeout(Duration::from_secs(5))
        .attempt(&request, request.recipients(ChannelKind::SlackWebhook), &webhook_config(urls))
        .await
}

#[tokio::test]
async fn single_hook_posts_once_per_channel() {
    let (url, received) = spawn_hook(StatusCode::OK).await;

    let outcome = send(vec![url], &["#ops", "#dev"]).await;

    assert_eq!(outcome, Outcome::Success);
    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["channel"], "#ops");
    assert_eq!(bodies[1]["channel"], "#dev");
    assert_eq!(bodies[0]["text"], "deploy finished");
    assert_eq!(bodies[0]["attachments"][0]["text"], "all green");
    assert_eq!(bodies[0]["username"], "notifier");
    assert_eq!(bodies[0]["icon_emoji"], ":robot_face:");
}

#[tokio::test]
async fn default_channel_marker_posts_without_override() {
    let (url, received) = spawn_hook(StatusCode::OK).await;

    let outcome = send(vec![url], &[""]).await;

    assert_eq!(outcome, Outcome::Success);
    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["channel"], "");
}

#[tokio::test]
async fn multiple_hooks_each_post_to_their_default_channel() {
    let (first, first_received) = spawn_hook(StatusCode::OK).await;
    let (second, second_received) = spawn_hook(StatusCode::OK).await;

    let outcome = send(vec![first, second], &["#ignored", "#also-ignored"]).await;

    assert_eq!(outcome, Outcome::Success);
    for received in [first_received, second_received] {
        let bodies = received.lock().unwrap().clone();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["channel"], "");
    }
}

#[tokio::test]
async fn archived_channel_maps_to_its_stage() {
    let (url, _received) = spawn_hook(StatusCode::GONE).await;

    let outcome = send(vec![url], &["#old"]).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::WebhookChannelArchived);
    assert_eq!(outcome.exit_code(), 44);
}

#[tokio::test]
async fn first_failing_hook_stops_the_loop() {
    let (broken, broken_received) = spawn_hook(StatusCode::INTERNAL_SERVER_ERROR).await;
    let (healthy, healthy_received) = spawn_hook(StatusCode::OK).await;

    let outcome = send(vec![broken, healthy], &[""]).await;

    assert_eq!(outcome.failure().unwrap().kind, FailureKind::WebhookServerError);
    assert_eq!(broken_received.lock().unwrap().len(), 1);
    assert!(healthy_received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_hook_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = send(vec![format!("http://{addr}/hook")], &["#ops"]).await;

    assert_eq!(outcome.failure().unwrap().kind, FailureKind::WebhookTransport);
    assert_eq!(outcome.exit_code(), 40);
}

#[tokio::test]
async fn empty_recipient_list_is_no_target() {
    let (url, received) = spawn_hook(StatusCode::OK).await;

    let outcome = send(vec![url], &[]).await;

    assert_eq!(outcome, Outcome::NoTarget);
    assert!(received.lock().unwrap().is_empty());
}
