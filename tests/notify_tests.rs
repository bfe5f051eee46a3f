use crash_restarter::notify::{COLOR_ALERT, COLOR_SUCCESS, NotificationSink, WebhookNotifier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_notification_posts_embed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "embeds": [{
                "title": "Restart",
                "description": "Successfully restarted server Foo.",
                "color": COLOR_SUCCESS,
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(Some(format!("{}/hook", server.uri()))).unwrap();
    notifier
        .notify("Restart", "Successfully restarted server Foo.", COLOR_SUCCESS)
        .await;
}

#[tokio::test]
async fn test_missing_webhook_is_a_silent_noop() {
    let notifier = WebhookNotifier::new(None).unwrap();
    notifier.notify("title", "body", COLOR_ALERT).await;

    let notifier = WebhookNotifier::new(Some(String::new())).unwrap();
    notifier.notify("title", "body", COLOR_ALERT).await;
}

#[tokio::test]
async fn test_delivery_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // Must not panic or propagate; the monitor never reacts to sink
    // failures.
    let notifier = WebhookNotifier::new(Some(server.uri())).unwrap();
    notifier.notify("title", "body", COLOR_ALERT).await;
}
