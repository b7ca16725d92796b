//! Catalog client tests against mock servers.
//!
//! Every test points both the API and the accounts service at one wiremock
//! server; the token endpoint lives at `/api/token`.

use linkdrop_catalog::{CatalogClientError, SpotifyClient, SpotifyConfig};
use linkdrop_core::{
    collect_pages, playlist_pages, CatalogGateway, LinkdropError, PlaylistId, TrackId,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> SpotifyClient {
    let config = SpotifyConfig::new("client-id", "client-secret", "refresh-me", "owner")
        .with_bases(server.uri(), server.uri());
    SpotifyClient::new(config).unwrap()
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn item(id: Option<&str>) -> serde_json::Value {
    match id {
        Some(id) => json!({ "track": { "id": id, "name": format!("Track {id}") } }),
        None => json!({ "track": null }),
    }
}

// =============================================================================
// Authentication Tests
// =============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn first_request_fetches_a_token() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-1").await;

        Mock::given(method("GET"))
            .and(path("/albums/alb/tracks"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "t1" }, { "id": "t2" }],
                "next": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let ids = client.album_tracks("alb").await.unwrap();

        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once_and_retried() {
        let server = MockServer::start().await;
        mount_token(&server, "fresh").await;

        Mock::given(method("GET"))
            .and(path("/albums/alb/tracks"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/albums/alb/tracks"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [{ "id": "t1" }] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.set_access_token("stale").await;

        assert_eq!(client.album_tracks("alb").await.unwrap(), vec!["t1"]);
    }

    #[tokio::test]
    async fn second_401_is_not_retried_again() {
        let server = MockServer::start().await;
        mount_token(&server, "fresh").await;

        Mock::given(method("GET"))
            .and(path("/albums/alb/tracks"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.set_access_token("stale").await;

        let result = client.album_tracks("alb").await;
        assert!(matches!(result, Err(CatalogClientError::AuthRequired)));
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_used_next_time() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("refresh_token=refresh-me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "rotated"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("refresh_token=rotated"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-2",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        assert_eq!(client.refresh_access_token().await.unwrap(), "tok-1");
        assert_eq!(client.current_refresh_token().await, "rotated");

        // No rotation in the second response: keep the last one
        assert_eq!(client.refresh_access_token().await.unwrap(), "tok-2");
        assert_eq!(client.current_refresh_token().await, "rotated");
    }

    #[tokio::test]
    async fn rejected_refresh_token_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.refresh_access_token().await;

        match result {
            Err(CatalogClientError::TokenRefreshFailed(msg)) => assert!(msg.contains("invalid_grant")),
            other => panic!("Expected TokenRefreshFailed, got: {:?}", other),
        }
    }
}

// =============================================================================
// Playlist Resolution Tests
// =============================================================================

mod playlist_resolution {
    use super::*;

    #[tokio::test]
    async fn finds_playlist_case_insensitively_across_pages() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .and(query_param("offset", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "id": "pl-2",
                    "name": "Channel Picks",
                    "external_urls": { "spotify": "https://open.spotify.com/playlist/pl-2" }
                }],
                "next": null
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": "pl-1", "name": "Other", "external_urls": {} }],
                "next": format!("{}/me/playlists?offset=50&limit=50", server.uri())
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let handle = client.resolve_playlist("channel picks").await.unwrap();

        assert_eq!(handle.id, PlaylistId::new("pl-2"));
        assert_eq!(handle.name, "Channel Picks");
        assert_eq!(handle.url, "https://open.spotify.com/playlist/pl-2");
    }

    #[tokio::test]
    async fn creates_playlist_when_missing() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/me/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [], "next": null })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/users/owner/playlists"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "new-pl",
                "name": "Channel Picks",
                "external_urls": { "spotify": "https://open.spotify.com/playlist/new-pl" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let handle = client.resolve_playlist("Channel Picks").await.unwrap();

        assert_eq!(handle.id, PlaylistId::new("new-pl"));
    }
}

// =============================================================================
// Listing Tests
// =============================================================================

mod listing {
    use super::*;

    #[tokio::test]
    async fn pages_concatenate_and_skip_missing_tracks() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/playlists/pl/tracks"))
            .and(query_param("offset", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [item(Some("c")), item(None)],
                "next": null
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/playlists/pl/tracks"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [item(Some("a")), { "track": { "id": null } }, item(Some("b"))],
                "next": format!("{}/playlists/pl/tracks?offset=100&limit=100", server.uri())
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let playlist = PlaylistId::new("pl");
        let ids = collect_pages(playlist_pages(&client, &playlist)).await.unwrap();

        assert_eq!(ids, vec![TrackId::new("a"), TrackId::new("b"), TrackId::new("c")]);
    }

    #[tokio::test]
    async fn foreign_next_link_is_refused() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/playlists/pl/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [item(Some("a"))],
                "next": "https://elsewhere.example.com/page2"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let playlist = PlaylistId::new("pl");
        let result = collect_pages(playlist_pages(&client, &playlist)).await;

        assert!(matches!(result, Err(LinkdropError::Catalog(_))));
    }

    #[tokio::test]
    async fn playlist_len_reads_total() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/playlists/pl/tracks"))
            .and(query_param("fields", "total"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 64 })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.playlist_len(&PlaylistId::new("pl")).await.unwrap(), 64);
    }

    #[tokio::test]
    async fn search_returns_top_hit() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Song X"))
            .and(query_param("type", "track"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": { "items": [{ "id": "xyz", "name": "Song X" }], "next": null }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let hit = CatalogGateway::search_track(&client, "Song X").await.unwrap();

        assert_eq!(hit, Some(TrackId::new("xyz")));
    }

    #[tokio::test]
    async fn search_without_results_is_none() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": { "items": [] }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(CatalogGateway::search_track(&client, "nothing").await.unwrap(), None);
    }
}

// =============================================================================
// Write Tests
// =============================================================================

mod writes {
    use super::*;

    #[tokio::test]
    async fn insert_sends_uris_and_position() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("POST"))
            .and(path("/playlists/pl/tracks"))
            .and(body_json(json!({
                "uris": ["spotify:track:a", "spotify:track:b"],
                "position": 100
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "s1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .insert_tracks(
                &PlaylistId::new("pl"),
                100,
                &[TrackId::new("a"), TrackId::new("b")],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn remove_sends_track_objects() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("DELETE"))
            .and(path("/playlists/pl/tracks"))
            .and(body_json(json!({
                "tracks": [{ "uri": "spotify:track:old" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "snapshot_id": "s2" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        CatalogGateway::remove_tracks(&client, &PlaylistId::new("pl"), &[TrackId::new("old")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_error_becomes_catalog_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("POST"))
            .and(path("/playlists/pl/tracks"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client
            .insert_tracks(&PlaylistId::new("pl"), 0, &[TrackId::new("a")])
            .await;

        match result {
            Err(LinkdropError::Catalog(msg)) => {
                assert!(msg.contains("502"));
                assert!(msg.contains("Bad Gateway"));
            }
            other => panic!("Expected catalog error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        mount_token(&server, "tok").await;

        Mock::given(method("DELETE"))
            .and(path("/playlists/pl/tracks"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client
            .remove_tracks("pl", vec!["spotify:track:a".to_string()])
            .await;

        assert!(matches!(
            result,
            Err(CatalogClientError::RateLimited { retry_after_secs: 7 })
        ));
    }
}
