// Integration tests for web push delivery against a fake push service
// Run with: cargo test --test push_delivery_test

use pwa_push::notifications::push::{
    NotificationPayload, PushSender, PushSubscription, PushSubscriptionStore, SendOutcome,
};
use pwa_push::VapidKeys;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A subscription with real browser-side key material.
fn browser_subscription(endpoint: String) -> PushSubscription {
    let browser_key = VapidKeys::generate();
    PushSubscription::new(endpoint, browser_key.public_key_base64url(), "AAAAAAAAAAAAAAAAAAAAAA")
}

fn notification() -> NotificationPayload {
    NotificationPayload {
        title: "Test".to_string(),
        body: "Hello from the push service".to_string(),
        icon: Some("/icon-192x192.png".to_string()),
        url: None,
    }
}

async fn mount(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string("push service says no"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_send_uses_encrypted_vapid_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/push/live"))
        .and(header("ttl", "60"))
        .and(header("content-encoding", "aes128gcm"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let sender = PushSender::new(VapidKeys::generate(), "mailto:test@example.com", 60).expect("sender");
    let subscription = browser_subscription(format!("{}/push/live", server.uri()));

    let outcome = sender.send(&subscription, b"{\"title\":\"hi\"}").await.expect("send");
    assert_eq!(outcome, SendOutcome::Delivered);
}

#[tokio::test]
async fn test_send_status_mapping() {
    let server = MockServer::start().await;
    mount(&server, "/push/gone", 410).await;
    mount(&server, "/push/missing", 404).await;
    mount(&server, "/push/slow", 429).await;
    mount(&server, "/push/broken", 500).await;

    let sender = PushSender::new(VapidKeys::generate(), "mailto:test@example.com", 60).expect("sender");
    let send = |route: &str| {
        let subscription = browser_subscription(format!("{}{}", server.uri(), route));
        let sender = sender.clone();
        async move { sender.send(&subscription, b"{}").await }
    };

    assert_eq!(send("/push/gone").await.expect("gone"), SendOutcome::Expired);
    assert_eq!(send("/push/missing").await.expect("missing"), SendOutcome::Expired);
    assert_eq!(send("/push/slow").await.expect("slow"), SendOutcome::RateLimited);

    let err = send("/push/broken").await.unwrap_err();
    assert!(err.to_string().contains("HTTP 500"), "{err}");
    assert!(err.to_string().contains("push service says no"), "{err}");
}

#[tokio::test]
async fn test_broadcast_reports_every_outcome() {
    let server = MockServer::start().await;
    mount(&server, "/push/live", 201).await;
    mount(&server, "/push/gone", 410).await;
    mount(&server, "/push/slow", 429).await;
    mount(&server, "/push/broken", 500).await;

    let mut store = PushSubscriptionStore::default();
    for name in ["live", "gone", "slow", "broken"] {
        store.upsert(
            name.to_string(),
            browser_subscription(format!("{}/push/{}", server.uri(), name)),
        );
    }

    // Expired by the push service's own deadline: never contacted
    let mut stale = browser_subscription(format!("{}/push/stale", server.uri()));
    stale.expiration_time = Some(1);
    store.upsert("stale".to_string(), stale);

    let sender = PushSender::new(VapidKeys::generate(), "mailto:test@example.com", 60).expect("sender");
    let mut report = sender.broadcast(&store, &notification()).await.expect("broadcast");
    report.expired.sort();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.rate_limited, 1);
    assert_eq!(report.expired, vec!["gone".to_string(), "stale".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "broken");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 4, "stale subscription must not be contacted");
}
