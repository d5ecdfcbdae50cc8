//! HTTP gateway over a real listener with the in-memory store.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use apikey_gate::algo::pem;
use apikey_gate::auth::Authenticator;
use apikey_gate::config::AuthConfig;
use apikey_gate::gateway::{self, state::AppState};
use apikey_gate::{AlgorithmRegistry, MemoryCredentialStore, SignAlgorithm};

struct TestServer {
    base: String,
    store: Arc<MemoryCredentialStore>,
    client: Client,
}

impl TestServer {
    async fn start(base_path: &str) -> Self {
        let store = Arc::new(MemoryCredentialStore::new());
        let authenticator = Authenticator::new(
            Arc::new(AlgorithmRegistry::with_defaults()),
            store.clone(),
            None,
            Duration::from_secs(300),
        );
        let state = Arc::new(AppState::new(authenticator, AuthConfig::default()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = gateway::router(state, base_path);
        tokio::spawn(async move {
            let _ = gateway::serve(listener, app).await;
        });

        Self {
            base: format!("http://{}{}", addr, base_path.trim_end_matches('/')),
            store,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn create_key(&self, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url("/apikeys"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

fn now_secs() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string()
}

fn sign(alg: &str, private_key_b64: &str, body: &[u8], timestamp: &str) -> String {
    let registry = AlgorithmRegistry::with_defaults();
    let private_key = pem::from_base64(private_key_b64).unwrap();
    let mut message = body.to_vec();
    message.extend_from_slice(timestamp.as_bytes());
    let sig = registry
        .lookup(alg)
        .unwrap()
        .sign(&private_key, &message)
        .unwrap();
    pem::to_base64(&sig)
}

#[tokio::test]
async fn test_issue_then_check() {
    let server = TestServer::start("").await;

    let (status, created) = server
        .create_key(json!({"sub": "alice", "extra": {"team": "ops"}}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("publickey").is_none());
    assert!(created.get("privatekey").is_none());
    let apikey = created["apikey"].as_str().unwrap().to_string();
    assert!(apikey.starts_with("1:"));

    // Header
    let resp = server
        .client
        .post(server.url("/check"))
        .header("X-API-Key", &apikey)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "1");
    assert_eq!(body["sub"], "alice");
    assert_eq!(body["extra"], json!({"team": "ops"}));
    assert!(body.get("verified").is_none());

    // Query string
    let resp = server
        .client
        .post(server.url("/check"))
        .query(&[("apikey", apikey.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .client
        .post(server.url("/check"))
        .header("X-API-Key", "1:zzz")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "unauthorized"}));
}

#[tokio::test]
async fn test_verify_signed_body() {
    let server = TestServer::start("/auth").await;

    let (status, created) = server
        .create_key(json!({"sub": "bob", "alg": "EdDSA"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let apikey = created["apikey"].as_str().unwrap().to_string();
    let private_key = created["privatekey"].as_str().unwrap().to_string();
    assert!(created["publickey"].is_string());

    let body = br#"{"order":42}"#;
    let ts = now_secs();
    let sig = sign("EdDSA", &private_key, body, &ts);

    let resp = server
        .client
        .post(server.url("/verify"))
        .header("X-API-Key", &apikey)
        .header("X-Signature", &sig)
        .header("X-Timestamp", &ts)
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["sub"], "bob");
    assert_eq!(json["verified"], true);

    let resp = server
        .client
        .post(server.url("/verify"))
        .header("X-API-Key", &apikey)
        .header("X-Signature", &sig)
        .header("X-Timestamp", &ts)
        .body(br#"{"order":43}"#.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = server
        .client
        .post(server.url("/verify"))
        .header("X-API-Key", &apikey)
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = server
        .client
        .post(server.url("/verify"))
        .header("X-API-Key", &apikey)
        .header("X-Signature", "!!!")
        .header("X-Timestamp", &ts)
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json, json!({"error": "bad request"}));
}

#[tokio::test]
async fn test_check_or_verify() {
    let server = TestServer::start("").await;
    let (_, created) = server
        .create_key(json!({"sub": "carol", "alg": "ES256"}))
        .await;
    let apikey = created["apikey"].as_str().unwrap().to_string();
    let private_key = created["privatekey"].as_str().unwrap().to_string();

    let resp = server
        .client
        .post(server.url("/checkorverify"))
        .query(&[("apikey", apikey.as_str())])
        .body("payload")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["verified"], false);

    let ts = now_secs();
    let sig = sign("ES256", &private_key, b"payload", &ts);
    let resp = server
        .client
        .post(server.url("/checkorverify"))
        .query(&[
            ("apikey", apikey.as_str()),
            ("signature", sig.as_str()),
            ("timestamp", ts.as_str()),
        ])
        .body("payload")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["verified"], true);
}

#[tokio::test]
async fn test_create_key_validation() {
    let server = TestServer::start("").await;

    let (status, _) = server.create_key(json!({"sub": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.create_key(json!({"sub": "x", "alg": "HS256"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("HS256"));

    let (status, _) = server
        .create_key(json!({"sub": "x", "publickey": "-----BEGIN PUBLIC KEY-----"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let big = "a".repeat(4096);
    let (status, _) = server
        .create_key(json!({"sub": "x", "extra": {"blob": big}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(server.store.is_empty());
}

#[tokio::test]
async fn test_create_key_with_imported_public_key() {
    let server = TestServer::start("").await;
    let keys = AlgorithmRegistry::with_defaults()
        .lookup("ES256K")
        .unwrap()
        .generate()
        .unwrap();
    let public_pem = pem::encode(pem::PUBLIC_KEY_LABEL, &keys.public_key);

    let (status, created) = server
        .create_key(json!({"sub": "dave", "alg": "ES256K", "publickey": public_pem}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("privatekey").is_none());
    assert_eq!(
        created["publickey"].as_str().unwrap(),
        pem::to_base64(&keys.public_key)
    );

    let apikey = created["apikey"].as_str().unwrap().to_string();
    let ts = now_secs();
    let sig = sign("ES256K", &pem::to_base64(&keys.private_key), b"", &ts);
    let resp = server
        .client
        .post(server.url("/verify"))
        .header("X-API-Key", &apikey)
        .header("X-Signature", &sig)
        .header("X-Timestamp", &ts)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_and_get() {
    let server = TestServer::start("").await;
    server
        .create_key(json!({"sub": "erin", "name": "first"}))
        .await;
    server
        .create_key(json!({"sub": "erin", "name": "second", "alg": "RS256"}))
        .await;
    server.create_key(json!({"sub": "frank"})).await;

    let resp = server
        .client
        .post(server.url("/apikeys/search"))
        .json(&json!({"sub": "erin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let found: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|k| k["sub"] == "erin"));
    assert!(found.iter().all(|k| k.get("secret_hash").is_none()));

    let resp = server
        .client
        .get(server.url("/apikeys/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let key: Value = resp.json().await.unwrap();
    assert_eq!(key["id"], 2);
    assert_eq!(key["name"], "second");
    assert_eq!(key["alg"], "RS256");
    assert!(key["key"].is_string());

    let resp = server
        .client
        .get(server.url("/apikeys/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::start("/auth/").await;

    let resp = server
        .client
        .get(server.url("/health/liveness"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .client
        .get(server.url("/health/readiness"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    server.store.set_available(false);

    let resp = server
        .client
        .get(server.url("/health/readiness"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = server
        .client
        .get(server.url("/health/liveness"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
