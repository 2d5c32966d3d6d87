mod common;

use std::time::Duration;

use extstate::clients::PlatformClient;
use mockito::{Matcher, Server};

// The library is built without cfg(test) here, so the user lookup cache is
// live. Cache keys include the user id; keep ids unique per test.

#[tokio::test]
async fn test_found_user_is_served_from_cache() {
    let mut server = Server::new_async().await;
    let users = server
        .mock("GET", "/users")
        .match_query(Matcher::UrlEncoded("id".into(), "8101".into()))
        .match_header("client-id", common::CLIENT_ID)
        .with_status(200)
        .with_body(r#"{"data": [{"id": "8101", "login": "cached", "display_name": "Cached"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let platform =
        PlatformClient::new(&server.url(), common::CLIENT_ID, Duration::from_secs(5)).unwrap();
    let first = platform
        .get_user("8101", "platform-token")
        .await
        .unwrap()
        .expect("user should be found");
    let second = platform
        .get_user("8101", "platform-token")
        .await
        .unwrap()
        .expect("user should be served from cache");

    users.assert_async().await;
    assert_eq!(first, second);
    assert_eq!(second.login.as_deref(), Some("cached"));
}

#[tokio::test]
async fn test_missing_user_is_not_cached() {
    let mut server = Server::new_async().await;
    let users = server
        .mock("GET", "/users")
        .match_query(Matcher::UrlEncoded("id".into(), "8102".into()))
        .with_status(200)
        .with_body(r#"{"data": []}"#)
        .expect(2)
        .create_async()
        .await;

    let platform =
        PlatformClient::new(&server.url(), common::CLIENT_ID, Duration::from_secs(5)).unwrap();
    assert!(platform.get_user("8102", "platform-token").await.unwrap().is_none());
    assert!(platform.get_user("8102", "platform-token").await.unwrap().is_none());

    users.assert_async().await;
}
