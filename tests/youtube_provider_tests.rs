use mockito::{Matcher, Server};
use serde_json::json;
use yt_playlist_builder::api::youtube::YouTubeProvider;
use yt_playlist_builder::api::VideoPlatform;
use yt_playlist_builder::builder::build;
use yt_playlist_builder::classify::{classify, ErrorKind, HttpError};
use yt_playlist_builder::credential::Credential;
use yt_playlist_builder::models::{Outcome, PlaylistRequest, SongQuery, Visibility};

fn cred_for(server_url: &str, access: &str, expires_at: Option<i64>) -> Credential {
    Credential {
        access_token: access.into(),
        refresh_token: Some("refresh-yt".into()),
        token_uri: format!("{}/token", server_url),
        client_id: "cid".into(),
        client_secret: "csecret".into(),
        scopes: vec!["https://www.googleapis.com/auth/youtube.force-ssl".into()],
        expires_at,
    }
}

fn search_body(video_id: &str) -> String {
    json!({ "items": [ { "id": { "kind": "youtube#video", "videoId": video_id } } ] }).to_string()
}

#[test]
fn create_playlist_sends_snippet_and_privacy_status() {
    let mut server = Server::new();
    let m = server
        .mock("POST", Matcher::Regex(r"^/playlists(\?|$)".into()))
        .match_query(Matcher::UrlEncoded("part".into(), "snippet,status".into()))
        .match_header("authorization", "Bearer valid")
        .match_body(Matcher::PartialJson(json!({
            "snippet": { "title": "Mix", "description": "d" },
            "status": { "privacyStatus": "public" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"PL123"}"#)
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "valid", None);
    let rt = tokio::runtime::Runtime::new().unwrap();
    let id = rt
        .block_on(provider.create_playlist(&cred, "Mix", "d", Visibility::Public))
        .unwrap();
    assert_eq!(id, "PL123");
    m.assert();
}

#[test]
fn search_requests_one_video_result() {
    let mut server = Server::new();
    let m = server
        .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "Beatles Yesterday".into()),
            Matcher::UrlEncoded("type".into(), "video".into()),
            Matcher::UrlEncoded("maxResults".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_body("vid-1"))
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "valid", None);
    let rt = tokio::runtime::Runtime::new().unwrap();
    let res = rt.block_on(provider.search_top_video(&cred, "Beatles Yesterday")).unwrap();
    assert_eq!(res.as_deref(), Some("vid-1"));
    m.assert();
}

#[test]
fn search_without_items_returns_none() {
    let mut server = Server::new();
    let _m = server
        .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items":[]}"#)
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "valid", None);
    let rt = tokio::runtime::Runtime::new().unwrap();
    let res = rt.block_on(provider.search_top_video(&cred, "nothing")).unwrap();
    assert!(res.is_none());
}

#[test]
fn search_server_error_surfaces_as_http_error() {
    let mut server = Server::new();
    let _m = server
        .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
        .with_status(500)
        .with_body("backend")
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "valid", None);
    let rt = tokio::runtime::Runtime::new().unwrap();
    let err = rt.block_on(provider.search_top_video(&cred, "x")).unwrap_err();
    let http = err.downcast_ref::<HttpError>().expect("http error");
    assert_eq!(http.status, 500);
    assert_eq!(classify(&err), ErrorKind::Http(500));
}

#[test]
fn insert_conflict_and_quota_are_classified() {
    let mut server = Server::new();
    let _conflict = server
        .mock("POST", Matcher::Regex(r"^/playlistItems(\?|$)".into()))
        .match_body(Matcher::PartialJson(json!({ "snippet": { "resourceId": { "videoId": "dup" } } })))
        .with_status(409)
        .with_body(r#"{"error":{"code":409,"errors":[{"reason":"conflict"}]}}"#)
        .create();
    let _quota = server
        .mock("POST", Matcher::Regex(r"^/playlistItems(\?|$)".into()))
        .match_body(Matcher::PartialJson(json!({ "snippet": { "resourceId": { "videoId": "late" } } })))
        .with_status(403)
        .with_body(r#"{"error":{"code":403,"errors":[{"domain":"youtube.quota","reason":"quotaExceeded"}]}}"#)
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "valid", None);
    let rt = tokio::runtime::Runtime::new().unwrap();
    let e1 = rt.block_on(provider.insert_playlist_item(&cred, "PL1", "dup")).unwrap_err();
    assert_eq!(classify(&e1), ErrorKind::Conflict);
    let e2 = rt.block_on(provider.insert_playlist_item(&cred, "PL1", "late")).unwrap_err();
    assert_eq!(classify(&e2), ErrorKind::QuotaExceeded);
}

#[test]
fn expired_token_is_refreshed_without_touching_credential() {
    let mut server = Server::new();
    let token = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh-yt".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "fresh", "expires_in": 3600}).to_string())
        .expect(1)
        .create();
    let search = server
        .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_body("vid-2"))
        .expect(2)
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "stale", Some(0));
    let before = cred.clone();
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        assert_eq!(provider.search_top_video(&cred, "a").await.unwrap().as_deref(), Some("vid-2"));
        // second call reuses the cached refreshed token
        assert_eq!(provider.search_top_video(&cred, "b").await.unwrap().as_deref(), Some("vid-2"));
    });
    assert_eq!(cred, before);
    token.assert();
    search.assert();
}

#[test]
fn unauthorized_response_triggers_one_refresh_and_retry() {
    let mut server = Server::new();
    let _stale = server
        .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
        .match_header("authorization", "Bearer revoked")
        .with_status(401)
        .with_body(r#"{"error":{"code":401}}"#)
        .create();
    let _token = server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "fresh", "expires_in": 3600}).to_string())
        .create();
    let ok = server
        .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_body("vid-3"))
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "revoked", None);
    let rt = tokio::runtime::Runtime::new().unwrap();
    let res = rt.block_on(provider.search_top_video(&cred, "x")).unwrap();
    assert_eq!(res.as_deref(), Some("vid-3"));
    ok.assert();
}

#[test]
fn refresh_failure_is_not_an_http_error() {
    let mut server = Server::new();
    let _token = server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant"}"#)
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "old", Some(0));
    let rt = tokio::runtime::Runtime::new().unwrap();
    let err = rt.block_on(provider.search_top_video(&cred, "x")).unwrap_err();
    assert!(err.to_string().contains("Failed to refresh token"));
    assert!(matches!(classify(&err), ErrorKind::Unexpected(_)));
}

#[test]
fn build_against_api_stops_on_quota() {
    let mut server = Server::new();
    let _create = server
        .mock("POST", Matcher::Regex(r"^/playlists(\?|$)".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"PLQ"}"#)
        .create();
    let mut searches = Vec::new();
    for (song, vid) in [("A", "va"), ("B", "vb")] {
        let m = server
            .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
            .match_query(Matcher::UrlEncoded("q".into(), format!("X {}", song)))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(search_body(vid))
            .create();
        searches.push(m);
    }
    let search_c = server
        .mock("GET", Matcher::Regex(r"^/search(\?|$)".into()))
        .match_query(Matcher::UrlEncoded("q".into(), "X C".into()))
        .with_status(200)
        .with_body(search_body("vc"))
        .expect(0)
        .create();
    let _insert_a = server
        .mock("POST", Matcher::Regex(r"^/playlistItems(\?|$)".into()))
        .match_body(Matcher::PartialJson(json!({ "snippet": { "playlistId": "PLQ", "resourceId": { "videoId": "va" } } })))
        .with_status(200)
        .with_body("{}")
        .create();
    let _insert_b = server
        .mock("POST", Matcher::Regex(r"^/playlistItems(\?|$)".into()))
        .match_body(Matcher::PartialJson(json!({ "snippet": { "resourceId": { "videoId": "vb" } } })))
        .with_status(403)
        .with_body(r#"{"error":{"code":403,"errors":[{"reason":"quotaExceeded"}]}}"#)
        .create();

    let provider = YouTubeProvider::with_base_url(server.url());
    let cred = cred_for(&server.url(), "valid", None);
    let req = PlaylistRequest::new("Q", None, Visibility::Private).unwrap();
    let songs = SongQuery::from_text("A\nB\nC\n");
    let rt = tokio::runtime::Runtime::new().unwrap();
    let res = rt
        .block_on(build(&provider, &req, &songs, "X", false, Some(&cred)))
        .unwrap();

    assert_eq!(res.playlist_id, "PLQ");
    assert!(res.aborted_early);
    let outcomes: Vec<Outcome> = res.log.iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Added, Outcome::QuotaExceeded]);
    search_c.assert();
}
