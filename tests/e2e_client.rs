//! E2E tests of the client plumbing against a mock Radarly server.
//!
//! These tests cover authentication, error extraction, response decoding
//! and rate-limit bookkeeping.

use radarly::parameters::InfluencerParameter;
use radarly::{
    AuthErrorKind, Find, Influencer, Project, RadarlyClient, RadarlyError, RateBucket, Search, User,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn project_body() -> serde_json::Value {
    json!({
        "id": 1234,
        "label": "Cosmetics",
        "docCount": 42,
        "created": "2018-01-01T10:00:00+01:00",
        "focuses": [
            {"id": 1, "label": "Chanel"},
            {"id": 2, "label": "Dior"}
        ],
        "tags": {
            "custom": [{"id": 10, "label": "Product", "values": [
                {"id": 100, "value": "Perfume"}
            ]}]
        },
        "socialAccounts": {"twitter": [{"id": 55}]}
    })
}

async fn client(server: &MockServer) -> RadarlyClient {
    RadarlyClient::new("test-token", &server.uri()).unwrap()
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[tokio::test]
async fn test_find_project_sends_token_and_snake_cases_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/1234.json"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let project = Project::find(&client, 1234).await.unwrap();

    assert_eq!(project.label, "Cosmetics");
    assert_eq!(project.doc_count, Some(42));
    assert_eq!(project.focus_labels()["1"], "Chanel");
    assert_eq!(project.tag_labels()["100"], "Perfume");
    assert_eq!(project.social_accounts[0].platform, "twitter");
}

#[tokio::test]
async fn test_user_me_and_expand_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Jane",
            "email": "jane@example.com",
            "projects": [{"id": 1234, "label": "Cosmetics"}],
            "currentProjectId": 1234
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/1234.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let me = User::find(&client, "me".to_string()).await.unwrap();
    assert_eq!(me.current_project_id, Some(1234));
    assert_eq!(me.projects.len(), 1);

    let project = me.projects[0].expand(&client).await.unwrap();
    assert_eq!(project.id, 1234);
}

#[tokio::test]
async fn test_user_other_than_me_is_rejected_without_request() {
    let server = MockServer::start().await;
    let client = client(&server).await;

    let err = User::find(&client, "42".to_string()).await.unwrap_err();
    assert!(err.is_validation());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

// =============================================================================
// Error Tests
// =============================================================================

#[tokio::test]
async fn test_api_error_message_from_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/9.json"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Project not found"})),
        )
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = Project::find(&client, 9).await.unwrap_err();

    match err {
        RadarlyError::Api {
            status_code,
            message,
            url,
            ..
        } => {
            assert_eq!(status_code, 404);
            assert_eq!(message, "Project not found");
            assert!(url.ends_with("/projects/9.json"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_message_from_html_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/9.json"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_string("<html><head><title>Bad Gateway</title></head></html>"),
        )
        .mount(&server)
        .await;

    let client = client(&server).await;
    let err = Project::find(&client, 9).await.unwrap_err();

    assert!(matches!(
        err,
        RadarlyError::Api { status_code: 502, ref message, .. } if message == "Bad Gateway"
    ));
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[tokio::test]
async fn test_authenticate_then_use_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=my-id"))
        .and(body_string_contains("scope=listening+social"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/1234.json"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
        .expect(1)
        .mount(&server)
        .await;

    let oauth_url = format!("{}/oauth/token", server.uri());
    let base_url = format!("{}/api", server.uri());
    let client = RadarlyClient::authenticate_with(
        &oauth_url,
        &base_url,
        "my-id",
        "my-secret",
        &["listening", "social"],
    )
    .await
    .unwrap();

    let project = Project::find(&client, 1234).await.unwrap();
    assert_eq!(project.label, "Cosmetics");
}

#[tokio::test]
async fn test_authenticate_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_client"})),
        )
        .mount(&server)
        .await;

    let oauth_url = format!("{}/oauth/token", server.uri());
    let err = RadarlyClient::authenticate_with(&oauth_url, &server.uri(), "bad", "bad", &[])
        .await
        .unwrap_err();

    match err {
        RadarlyError::Authentication(kind) => assert_eq!(kind, AuthErrorKind::InvalidClient),
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Rate Limit Tests
// =============================================================================

#[tokio::test]
async fn test_exhausted_bucket_blocks_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/1234.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(project_body())
                .insert_header("x-rate-limit-limit", "5000")
                .insert_header("x-rate-limit-remaining", "0")
                .insert_header("x-rate-limit-reset", "1520000000"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    Project::find(&client, 1234).await.unwrap();

    let quota = *client.rate_limit().quota(RateBucket::Default);
    assert_eq!(quota.remaining, 0);
    assert_eq!(quota.reset, 1520000000);

    let err = Project::find(&client, 1234).await.unwrap_err();
    assert!(matches!(
        err,
        RadarlyError::RateReached {
            bucket: RateBucket::Default
        }
    ));
}

#[tokio::test]
async fn test_buckets_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/influencers.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"users": []}))
                .insert_header("x-rate-limit-remaining", "0"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/1234.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let param = InfluencerParameter::default_search();
    Influencer::fetch_all(&client, 1234, param)
        .await
        .unwrap();

    let rates = client.rate_limit();
    assert_eq!(rates.quota(RateBucket::Slow).remaining, 0);
    assert!(rates.quota(RateBucket::Default).remaining > 0);

    // The slow bucket is exhausted, the default one is not
    Project::find(&client, 1234).await.unwrap();
}
