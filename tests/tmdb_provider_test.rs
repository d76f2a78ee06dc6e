//! TMDB provider tests against a mock HTTP server.

use std::time::Duration;

use assert_matches::assert_matches;
use reelmatch::metadata::providers::TmdbProvider;
use reelmatch::metadata::{CallOutcome, MetadataProvider, ProviderError, RetryPolicy, SearchQuery};
use reelmatch_common::{ExternalId, MediaType};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn provider(server: &MockServer) -> TmdbProvider {
    TmdbProvider::new("test-key", "en-US", Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri())
}

fn search_body() -> serde_json::Value {
    json!({
        "page": 1,
        "results": [
            {
                "id": 1020006,
                "title": "Omen",
                "original_title": "Augure",
                "release_date": "2024-03-13",
                "popularity": 4.2,
                "vote_count": 31
            },
            {
                "id": 55,
                "title": "Omen",
                "original_title": "Omen",
                "release_date": "",
                "vote_count": 2
            }
        ]
    })
}

fn detail_body() -> serde_json::Value {
    json!({
        "id": 1020006,
        "title": "Omen",
        "original_title": "Augure",
        "release_date": "2024-03-13",
        "runtime": 90,
        "vote_average": 6.4,
        "vote_count": 31,
        "imdb_id": "tt21040224",
        "credits": {
            "crew": [
                { "name": "Baloji", "job": "Director" },
                { "name": "Baloji", "job": "Writer" },
                { "name": "Someone Else", "job": "Editor" }
            ]
        }
    })
}

#[tokio::test]
async fn search_sends_key_and_adult_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("query", "Augure"))
        .and(query_param("include_adult", "true"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let hits = provider(&server)
        .await
        .search(SearchQuery {
            text: "Augure",
            media_type: MediaType::Movie,
            include_adult: true,
        })
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "1020006");
    assert_eq!(hits[0].original_title.as_deref(), Some("Augure"));
    assert_eq!(hits[0].release_year, Some(2024));
    assert_eq!(hits[0].vote_count, Some(31));
    assert_eq!(hits[1].release_year, None);
}

#[tokio::test]
async fn tv_search_uses_tv_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/tv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 1396,
                "name": "Breaking Bad",
                "original_name": "Breaking Bad",
                "first_air_date": "2008-01-20"
            }]
        })))
        .mount(&server)
        .await;

    let hits = provider(&server)
        .await
        .search(SearchQuery {
            text: "Breaking Bad",
            media_type: MediaType::Tv,
            include_adult: false,
        })
        .await
        .unwrap();

    assert_eq!(hits[0].title, "Breaking Bad");
    assert_eq!(hits[0].release_year, Some(2008));
}

#[tokio::test]
async fn details_fetch_credits_in_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/1020006"))
        .and(query_param("append_to_response", "credits,external_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body()))
        .expect(1)
        .mount(&server)
        .await;

    let detail = provider(&server)
        .await
        .details("1020006", MediaType::Movie)
        .await
        .unwrap();

    assert_eq!(detail.id, "1020006");
    assert_eq!(detail.directors, vec!["Baloji".to_string()]);
    assert_eq!(detail.runtime_minutes, Some(90));
    assert_eq!(detail.cross_reference_id.as_deref(), Some("tt21040224"));
    assert_eq!(detail.release_year, Some(2024));
}

#[tokio::test]
async fn imdb_lookup_goes_through_find() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/find/tt21040224"))
        .and(query_param("external_source", "imdb_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "movie_results": [{ "id": 1020006 }],
            "tv_results": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/1020006"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body()))
        .expect(1)
        .mount(&server)
        .await;

    let detail = provider(&server)
        .await
        .lookup(&ExternalId::Imdb("tt21040224".into()), MediaType::Movie)
        .await
        .unwrap();

    assert_eq!(detail.id, "1020006");
}

#[tokio::test]
async fn imdb_lookup_without_hits_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/find/tt0000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "movie_results": [],
            "tv_results": []
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .await
        .lookup(&ExternalId::Imdb("tt0000001".into()), MediaType::Movie)
        .await
        .unwrap_err();

    assert_eq!(err, ProviderError::NotFound);
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/401"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/429"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let tmdb = provider(&server).await;
    assert_eq!(
        tmdb.details("404", MediaType::Movie).await.unwrap_err(),
        ProviderError::NotFound
    );
    assert_eq!(
        tmdb.details("401", MediaType::Movie).await.unwrap_err(),
        ProviderError::Unauthorized
    );
    assert_eq!(
        tmdb.details("429", MediaType::Movie).await.unwrap_err(),
        ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(7))
        }
    );
}

#[tokio::test]
async fn rate_limited_search_is_retried_with_growing_delays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tmdb = provider(&server).await;
    let policy = RetryPolicy::new(
        5,
        Duration::from_millis(5),
        1.5,
        Duration::from_secs(1),
    );
    let query = SearchQuery {
        text: "Augure",
        media_type: MediaType::Movie,
        include_adult: true,
    };

    let attempted = policy.run("search", || tmdb.search(query)).await;

    assert_eq!(attempted.attempts, 3);
    assert_eq!(attempted.delays.len(), 2);
    assert!(attempted.delays[1] > attempted.delays[0]);
    assert_matches!(attempted.outcome, CallOutcome::Success(hits) if hits.len() == 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn server_errors_exhaust_the_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/configuration"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let tmdb = provider(&server).await;
    let policy = RetryPolicy::new(3, Duration::from_millis(1), 2.0, Duration::from_millis(10));

    let attempted = policy.run("ping", || tmdb.ping()).await;

    assert_eq!(attempted.attempts, 3);
    assert_matches!(
        attempted.outcome,
        CallOutcome::Terminal(ProviderError::Unavailable { status: 503 })
    );
}
