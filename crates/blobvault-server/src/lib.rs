//! HTTP server for BlobVault.
//!
//! Exposes the blob repository as a REST API under `/api/v1`. Callers are
//! identified by the `AuthToken` header, which a [`TokenResolver`] maps to a
//! user; requests without the header are anonymous and may only read public
//! blobs.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use auth::{Caller, Credentials, StaticTokenResolver, TokenResolver, AUTH_HEADER};
pub use config::{AuthConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::BlobVaultServer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use blobvault_repo::{BlobRepository, UserId};
    use blobvault_store::FsContentStore;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    const BOUNDARY: &str = "blobvault-test-boundary";

    struct TestApp {
        _dir: tempfile::TempDir,
        router: Router,
    }

    fn app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path().join("storage")).unwrap();
        let repo = BlobRepository::open(dir.path().join("blobs.json"), store).unwrap();
        let tokens = StaticTokenResolver::new()
            .with_token("tok-alice", UserId::parse("alice").unwrap())
            .with_token("tok-bob", UserId::parse("bob").unwrap());
        let router = build_router(AppState::new(repo, Arc::new(tokens)));
        TestApp { _dir: dir, router }
    }

    fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match token {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    impl TestApp {
        async fn send(&self, req: Request<Body>) -> Response {
            self.router.clone().oneshot(req).await.unwrap()
        }

        async fn upload(&self, method: Method, uri: &str, token: Option<&str>, filename: &str, data: &[u8]) -> Response {
            let req = request(method, uri, token)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body("file", filename, data)))
                .unwrap();
            self.send(req).await
        }

        async fn create(&self, token: &str, filename: &str, data: &[u8]) -> String {
            let resp = self.upload(Method::POST, "/api/v1/blob", Some(token), filename, data).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body = json_body(resp).await;
            body["blobId"].as_str().unwrap().to_string()
        }

        async fn get(&self, uri: &str, token: Option<&str>) -> Response {
            self.send(request(Method::GET, uri, token).body(Body::empty()).unwrap())
                .await
        }

        async fn send_json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> Response {
            let req = request(method, uri, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(req).await
        }
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn raw_body(resp: Response) -> Vec<u8> {
        to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn status_endpoint() {
        let app = app();
        let resp = app.get("/api/v1/status", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(raw_body(resp).await, b"Service running");
    }

    #[tokio::test]
    async fn upload_requires_token() {
        let app = app();
        let resp = app.upload(Method::POST, "/api/v1/blob", None, "a.txt", b"x").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected_everywhere() {
        let app = app();
        let resp = app.get("/api/v1/blobs", Some("forged")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_then_download() {
        let app = app();
        let id = app.create("tok-alice", "hello world.txt", b"hello").await;

        let resp = app.get(&format!("/api/v1/blob/{id}"), Some("tok-alice")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains("hello_world.txt"));
        assert_eq!(raw_body(resp).await, b"hello");

        let anonymous = app.get(&format!("/api/v1/blob/{id}"), None).await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
        let stranger = app.get(&format!("/api/v1/blob/{id}"), Some("tok-bob")).await;
        assert_eq!(stranger.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn hash_lists_every_algorithm() {
        let app = app();
        let id = app.create("tok-alice", "h.txt", b"hello").await;
        let resp = app.get(&format!("/api/v1/blob/{id}/hash"), Some("tok-alice")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(
            body[0],
            json!({ "hash_type": "md5", "hexdigest": "5d41402abc4b2a76b9719d911017c592" })
        );
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["hash_type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["md5", "sha1", "sha256", "sha512"]);
    }

    #[tokio::test]
    async fn visibility_controls_anonymous_listing() {
        let app = app();
        let id = app.create("tok-alice", "pub.txt", b"p").await;
        let listed = json_body(app.get("/api/v1/blobs", None).await).await;
        assert_eq!(listed, json!([]));

        let uri = format!("/api/v1/blob/{id}/visibility");
        let resp = app.send_json(Method::PUT, &uri, Some("tok-alice"), json!({ "public": true })).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let listed = json_body(app.get("/api/v1/blobs", None).await).await;
        assert_eq!(listed[0]["blobId"], id.as_str());
        assert!(listed[0]["URL"].as_str().unwrap().ends_with("pub.txt"));

        let again = app.send_json(Method::PUT, &uri, Some("tok-alice"), json!({ "public": true })).await;
        assert_eq!(again.status(), StatusCode::BAD_REQUEST);

        let by_bob = app.send_json(Method::PUT, &uri, Some("tok-bob"), json!({ "public": false })).await;
        assert_eq!(by_bob.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn acl_grant_and_revoke() {
        let app = app();
        let id = app.create("tok-alice", "shared.txt", b"s").await;
        let blob_uri = format!("/api/v1/blob/{id}");
        let acl_uri = format!("/api/v1/blob/{id}/acl");

        let resp = app
            .send_json(Method::POST, &acl_uri, Some("tok-alice"), json!({ "allowed_users": ["bob"] }))
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(app.get(&blob_uri, Some("tok-bob")).await.status(), StatusCode::OK);

        let acl = json_body(app.get(&acl_uri, Some("tok-alice")).await).await;
        assert_eq!(acl, json!({ "user": "alice", "allowed_users": ["alice", "bob"] }));
        assert_eq!(app.get(&acl_uri, Some("tok-bob")).await.status(), StatusCode::FORBIDDEN);

        let revoke = Request::builder()
            .method(Method::DELETE)
            .uri(format!("{acl_uri}/bob"))
            .header(AUTH_HEADER, "tok-alice")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.send(revoke).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(app.get(&blob_uri, Some("tok-bob")).await.status(), StatusCode::FORBIDDEN);

        let missing = Request::builder()
            .method(Method::DELETE)
            .uri(format!("{acl_uri}/carol"))
            .header(AUTH_HEADER, "tok-alice")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.send(missing).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn acl_replace_sets_exact_readers() {
        let app = app();
        let id = app.create("tok-alice", "r.txt", b"r").await;
        let acl_uri = format!("/api/v1/blob/{id}/acl");
        app.send_json(Method::POST, &acl_uri, Some("tok-alice"), json!({ "allowed_users": ["bob", "carol"] }))
            .await;
        let resp = app
            .send_json(Method::PUT, &acl_uri, Some("tok-alice"), json!({ "allowed_users": ["dave"] }))
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let acl = json_body(app.get(&acl_uri, Some("tok-alice")).await).await;
        assert_eq!(acl["allowed_users"], json!(["alice", "dave"]));
    }

    #[tokio::test]
    async fn duplicate_filename_conflicts() {
        let app = app();
        app.create("tok-alice", "dup.txt", b"one").await;
        let resp = app.upload(Method::POST, "/api/v1/blob", Some("tok-bob"), "dup.txt", b"two").await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_replaces_content_and_name() {
        let app = app();
        let id = app.create("tok-alice", "v1.txt", b"first").await;
        let uri = format!("/api/v1/blob/{id}");
        let resp = app.upload(Method::PUT, &uri, Some("tok-alice"), "v2.txt", b"second").await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app.get(&uri, Some("tok-alice")).await;
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains("v2.txt"));
        assert_eq!(raw_body(resp).await, b"second");

        let by_bob = app.upload(Method::PUT, &uri, Some("tok-bob"), "v3.txt", b"third").await;
        assert_eq!(by_bob.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn delete_then_not_found() {
        let app = app();
        let id = app.create("tok-alice", "gone.txt", b"g").await;
        let uri = format!("/api/v1/blob/{id}");
        let delete = |token: &str| {
            request(Method::DELETE, &uri, Some(token))
                .body(Body::empty())
                .unwrap()
        };
        assert_eq!(app.send(delete("tok-bob")).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.send(delete("tok-alice")).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(app.get(&uri, Some("tok-alice")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.send(delete("tok-alice")).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let app = app();
        let resp = app.get("/api/v1/blob/not-a-uuid", Some("tok-alice")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_file_field_is_bad_request() {
        let app = app();
        let req = request(Method::POST, "/api/v1/blob", Some("tok-alice"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body("attachment", "a.txt", b"x")))
            .unwrap();
        assert_eq!(app.send(req).await.status(), StatusCode::BAD_REQUEST);
    }
}
