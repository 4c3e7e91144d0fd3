//! E2E tests using a mock Radarly server.
//!
//! These tests exercise full workflows (paging through searches, updating
//! and downloading publications, computing insights) rather than
//! individual decoders.

use std::collections::BTreeMap;

use radarly::parameters::{
    prelude::*, AnalyticsParameter, InfluencerParameter, LocalizationParameter,
    SearchPublicationParameter, SocialPerformanceParameter,
};
use radarly::{
    Analytics, Fetch, Influencer, Localization, Publication, PublicationKey, PublicationUpdate,
    RadarlyClient, RadarlyError, Search, SocialPerformance, Tone, Update, INFLUENCER_SEARCH_TOTAL,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT_ID: u64 = 1234;

fn client(server: &MockServer) -> RadarlyClient {
    RadarlyClient::new("test-token", &server.uri()).unwrap()
}

fn hit(uid: u64) -> Value {
    json!({
        "uid": uid,
        "origin": {"platform": "twitter"},
        "lang": "en",
        "tone": "neutral",
        "date": "2018-03-07T15:20:00+01:00"
    })
}

// =============================================================================
// Publication Search Tests
// =============================================================================

async fn mount_publication_pages(server: &MockServer) {
    let pages = [(0, vec![1, 2]), (2, vec![3, 4]), (4, vec![5])];
    for (start, uids) in pages {
        let hits: Vec<Value> = uids.into_iter().map(hit).collect();
        Mock::given(method("POST"))
            .and(path("/projects/1234/inbox/search.json"))
            .and(body_partial_json(json!({"start": start, "limit": 2})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"hits": hits, "total": 5})),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_search_single_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/inbox/search.json"))
        .and(body_partial_json(json!({"sortBy": "date", "tones": ["positive"]})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"hits": [hit(1)], "total": 1})),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let mut param = SearchPublicationParameter::default_search();
    param.tones(["positive"]).unwrap();

    let page = Publication::search(&client, PROJECT_ID, &param).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].uid, "1");
    assert_eq!(page.items[0].project_id, PROJECT_ID);
    assert_eq!(page.items[0].platform().unwrap(), "twitter");
}

#[tokio::test]
async fn test_pager_walks_every_page() {
    let server = MockServer::start().await;
    mount_publication_pages(&server).await;

    let client = client(&server);
    let mut param = SearchPublicationParameter::default_search();
    param.pagination(0, 2).unwrap();

    let pager = Publication::fetch_all(&client, PROJECT_ID, param)
        .await
        .unwrap();
    assert_eq!(pager.total(), 5);
    assert_eq!(pager.total_pages(), 3);

    let uids: Vec<String> = pager
        .collect_all()
        .await
        .unwrap()
        .into_iter()
        .map(|publication| publication.uid)
        .collect();
    assert_eq!(uids, vec!["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn test_pager_stops_after_last_page() {
    let server = MockServer::start().await;
    mount_publication_pages(&server).await;

    let client = client(&server);
    let mut param = SearchPublicationParameter::default_search();
    param.pagination(0, 2).unwrap();

    let mut pager = Publication::fetch_all(&client, PROJECT_ID, param)
        .await
        .unwrap();
    let mut count = 0;
    while pager.next().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 5);
    assert_eq!(pager.current_page(), 3);

    // Exhausted pagers keep returning None without new requests
    assert!(pager.next().await.unwrap().is_none());
}

// =============================================================================
// Influencer Tests
// =============================================================================

#[tokio::test]
async fn test_influencer_search_uses_fixed_total() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/influencers.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{
                "user": {"id": 42, "screenName": "jdoe", "platform": "twitter"},
                "count": 12,
                "stats": {"tones": [{"term": "positive", "counts": {"doc": 7}}]}
            }]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let param = InfluencerParameter::default_search();
    let mut pager = Influencer::fetch_all(&client, PROJECT_ID, param)
        .await
        .unwrap();
    assert_eq!(pager.total(), INFLUENCER_SEARCH_TOTAL);

    let influencer = pager.next().await.unwrap().unwrap();
    assert_eq!(influencer.id, "42");
    assert_eq!(influencer.screen_name.as_deref(), Some("jdoe"));
    assert_eq!(influencer.stats["doc"]["tones"]["positive"], json!(7));

    let key = influencer.key().unwrap();
    assert_eq!(key.platform, "twitter");
    assert_eq!(key.project_id, PROJECT_ID);
}

#[tokio::test]
async fn test_influencer_pager_stops_on_empty_page() {
    let server = MockServer::start().await;
    let users: Vec<Value> = (0..25)
        .map(|n| json!({"user": {"id": n, "platform": "twitter"}, "count": 1}))
        .collect();
    Mock::given(method("POST"))
        .and(path("/projects/1234/influencers.json"))
        .and(body_partial_json(json!({"start": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": users})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/influencers.json"))
        .and(body_partial_json(json!({"start": 25})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"user": {"id": 99, "platform": "twitter"}, "count": 1}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/influencers.json"))
        .and(body_partial_json(json!({"start": 50})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let pager = Influencer::fetch_all(&client, PROJECT_ID, InfluencerParameter::default_search())
        .await
        .unwrap();
    assert_eq!(pager.total_pages(), 40);

    let influencers = pager.collect_all().await.unwrap();
    assert_eq!(influencers.len(), 26);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

// =============================================================================
// Publication Update Tests
// =============================================================================

fn key() -> PublicationKey {
    PublicationKey {
        project_id: PROJECT_ID,
        uid: "42".to_string(),
        platform: "twitter".to_string(),
    }
}

#[tokio::test]
async fn test_update_publication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/documents.json"))
        .and(query_param("platform", "twitter"))
        .and(query_param("uid", "42"))
        .and(body_json(json!({
            "tone": "negative",
            "customFields": {"10": ["100"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": 42,
            "origin": {"platform": "twitter"},
            "tone": "negative",
            "customFields": {"10": ["100"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let update = PublicationUpdate {
        tone: Some(Tone::Negative),
        custom_fields: Some(BTreeMap::from([(
            "10".to_string(),
            vec!["100".to_string()],
        )])),
        ..Default::default()
    };
    let publication = Publication::update(&client, key(), update).await.unwrap();

    assert_eq!(publication.tone.as_deref(), Some("negative"));
    assert_eq!(publication.project_id, PROJECT_ID);
}

#[tokio::test]
async fn test_update_not_applied_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/documents.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": 42,
            "tone": "positive",
            "favorite": true
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let update = PublicationUpdate {
        tone: Some(Tone::Negative),
        favorite: Some(true),
        ..Default::default()
    };
    let err = Publication::update(&client, key(), update)
        .await
        .unwrap_err();

    match err {
        RadarlyError::PartialUpdate { fields } => assert_eq!(fields, vec!["tone"]),
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Download Tests
// =============================================================================

#[tokio::test]
async fn test_download_keeps_failures_in_place() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/picture-1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .mount(&server)
        .await;

    let uri = server.uri();
    let publication: Publication = serde_json::from_value(json!({
        "uid": 7,
        "origin": {"platform": "instagram"},
        "media": {
            "image": [format!("{uri}/media/picture-1.jpg"), format!("{uri}/media/missing.png")],
            "video": [{"url": format!("{uri}/media/clip.mp4"), "thumbnail": null}]
        }
    }))
    .unwrap();

    let client = client(&server);
    let dir = tempfile::tempdir().unwrap();
    let files = publication.download(&client, dir.path()).await;

    assert_eq!(files.images.len(), 2);
    let picture = files.images[0].as_ref().unwrap();
    assert_eq!(picture.file_name().unwrap(), "picture-1.jpg");
    assert_eq!(std::fs::read(picture).unwrap(), b"jpeg-bytes");
    assert!(files.images[1].is_none());

    assert_eq!(files.videos.len(), 1);
    let clip = files.videos[0].url.as_ref().unwrap();
    assert_eq!(std::fs::read(clip).unwrap(), b"mp4-bytes");
    assert!(files.videos[0].thumbnail.is_none());
}

// =============================================================================
// Insight Tests
// =============================================================================

#[tokio::test]
async fn test_analytics_occupations_come_from_their_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/insights.json"))
        .and(body_partial_json(json!({"fields": ["tones"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dots": [{
                "date": "2018-01-01",
                "total": 10,
                "stats": {"tones": [{"term": "positive", "counts": {"doc": 4}}]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/insights/occupation.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dots": [{
                "date": "2018-01-01",
                "stats": {"occupations": [{"term": "engineer", "counts": {"doc": 3}}]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut param = AnalyticsParameter::new();
    param.fields(["tones", "occupations"]).unwrap();

    let analytics = Analytics::fetch(&client, PROJECT_ID, &param).await.unwrap();
    assert_eq!(analytics.total["2018-01-01"], json!(10));
    assert_eq!(analytics.stats["tones"]["positive"]["doc"]["2018-01-01"], json!(4));
    assert_eq!(analytics.stats["occupations"]["engineer"]["doc"]["2018-01-01"], json!(3));

    // The occupation request does not carry the field list
    let requests = server.received_requests().await.unwrap();
    let occupation = requests
        .iter()
        .find(|request| request.url.path().ends_with("occupation.json"))
        .unwrap();
    let body: Value = serde_json::from_slice(&occupation.body).unwrap();
    assert!(body.get("fields").is_none());
}

#[tokio::test]
async fn test_social_performance_is_sent_as_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/1234/performance.json"))
        .and(query_param("platform", "twitter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uid": 1, "stats": [{"date": "2018-01-01", "scores": {"engagement": 3}}]},
            {"uid": 2, "stats": []}
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut param = SocialPerformanceParameter::new();
    param
        .platform("twitter")
        .unwrap()
        .date_range("2018-01-01", "2018-01-31")
        .unwrap();

    let query: BTreeMap<String, String> = serde_qs::from_str(&param.query_string()).unwrap();
    assert_eq!(query["platform"], "twitter");
    assert_eq!(query["from"], "2018-01-01T00:00:00");

    let performances = SocialPerformance::fetch(&client, PROJECT_ID, &param)
        .await
        .unwrap();
    assert_eq!(performances.len(), 1);
    assert_eq!(performances[0].uid, "1");
    assert_eq!(performances[0].platform, "twitter");
    assert_eq!(performances[0].rows[0].get("engagement"), Some(&json!(3)));
}

#[tokio::test]
async fn test_localization_route_and_locale() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1234/insights/geo/town.json"))
        .and(query_param("locale", "fr_FR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "geoDigging": [{
                "counts": {"doc": 3},
                "info": {"name": "Paris", "code": "75056"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut param = LocalizationParameter::new();
    param.geo_type("town").unwrap().locale("fr_FR").unwrap();

    let localization = Localization::fetch(&client, PROJECT_ID, &param)
        .await
        .unwrap();
    assert_eq!(localization.len(), 1);
    assert_eq!(localization.places[0].get("name"), Some(&json!("Paris")));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("geo_type").is_none());
    assert!(body.get("locale").is_none());
}
