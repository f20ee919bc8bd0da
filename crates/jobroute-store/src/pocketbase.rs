//! PocketBase HTTP client.

use async_trait::async_trait;
use base64::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::{Filter, Record, RecordPage, RecordStore};

/// Admin credentials used for password authentication.
#[derive(Clone, Default)]
pub struct Credentials {
    pub identity: String,
    pub password: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("password", &"***")
            .finish()
    }
}

/// Authenticated session.
#[derive(Debug, Clone)]
struct Session {
    token: String,
    /// Unix timestamp from the token's `exp` claim.
    expires_at: Option<i64>,
}

impl Session {
    fn new(token: String) -> Self {
        let expires_at = token_expiry(&token);
        Self { token, expires_at }
    }

    fn is_valid(&self, now: i64) -> bool {
        !self.token.is_empty() && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// Read the `exp` claim from a JWT without verifying it.
fn token_expiry(token: &str) -> Option<i64> {
    #[derive(Deserialize)]
    struct Claims {
        exp: Option<i64>,
    }

    let payload = token.split('.').nth(1)?;
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// PocketBase client.
///
/// The session is established lazily by the first call that needs it and
/// reused until it expires or [`PocketBaseClient::reset`] is called.
#[derive(Clone)]
pub struct PocketBaseClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
    session: Arc<RwLock<Option<Session>>>,
}

impl PocketBaseClient {
    /// Create a new client. No request is made until the first call.
    pub fn new(base_url: &str, credentials: Option<Credentials>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Drop the current session; the next call authenticates again.
    pub async fn reset(&self) {
        let mut guard = self.session.write().await;
        if guard.take().is_some() {
            tracing::debug!(url = %self.base_url, "Session cleared");
        }
    }

    /// Check if a valid session is held.
    pub async fn is_connected(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.is_valid(now))
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    /// Current token, authenticating first if needed.
    async fn token(&self) -> StoreResult<String> {
        let now = chrono::Utc::now().timestamp();
        if let Some(session) = self.session.read().await.as_ref() {
            if session.is_valid(now) {
                return Ok(session.token.clone());
            }
        }

        let mut guard = self.session.write().await;
        // Another caller may have authenticated while we waited.
        if let Some(session) = guard.as_ref() {
            if session.is_valid(now) {
                return Ok(session.token.clone());
            }
        }

        let session = self.authenticate().await?;
        let token = session.token.clone();
        *guard = Some(session);
        Ok(token)
    }

    async fn authenticate(&self) -> StoreResult<Session> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            StoreError::Configuration("store credentials are not configured".to_string())
        })?;

        let response = self
            .client
            .post(format!("{}/api/admins/auth-with-password", self.base_url))
            .json(&serde_json::json!({
                "identity": credentials.identity,
                "password": credentials.password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            let reason = if message.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                message
            };
            return Err(StoreError::Auth(reason));
        }

        let auth: AuthResponse = response.json().await?;
        let session = Session::new(auth.token);

        tracing::info!(
            url = %self.base_url,
            identity = %credentials.identity,
            expires_at = ?session.expires_at,
            "Authenticated against record store"
        );

        Ok(session)
    }
}

/// Extract the store's `message` from an error response.
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body)
}

async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RecordStore for PocketBaseClient {
    async fn connect(&self) -> StoreResult<()> {
        self.token().await.map(|_| ())
    }

    async fn create(&self, collection: &str, body: &serde_json::Value) -> StoreResult<Record> {
        let token = self.token().await?;
        let response = self
            .client
            .post(self.records_url(collection))
            .header(reqwest::header::AUTHORIZATION, token)
            .json(body)
            .send()
            .await?;

        let record: Record = check(response).await?.json().await?;
        tracing::trace!(collection, id = %record.id, "Record created");
        Ok(record)
    }

    async fn list(
        &self,
        collection: &str,
        filter: &Filter,
        page: u32,
        per_page: u32,
    ) -> StoreResult<RecordPage> {
        let token = self.token().await?;
        let response = self
            .client
            .get(self.records_url(collection))
            .header(reqwest::header::AUTHORIZATION, token)
            .query(&[
                ("page", page.to_string()),
                ("perPage", per_page.to_string()),
                ("filter", filter.to_string()),
            ])
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let token = self.token().await?;
        let response = self
            .client
            .delete(format!("{}/{}", self.records_url(collection), id))
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await?;

        check(response).await?;
        tracing::trace!(collection, id, "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: i64) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(format!(r#"{{"id":"adm1","exp":{}}}"#, exp));
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn test_client_creation() {
        let client = PocketBaseClient::new("http://localhost:8090/", None, Duration::from_secs(5));
        assert_eq!(client.base_url(), "http://localhost:8090");
        assert_eq!(
            client.records_url("ASWNDUBAI_Job"),
            "http://localhost:8090/api/collections/ASWNDUBAI_Job/records"
        );
    }

    #[test]
    fn test_token_expiry() {
        assert_eq!(token_expiry(&jwt_with_exp(1_900_000_000)), Some(1_900_000_000));
        assert_eq!(token_expiry("not-a-jwt"), None);
    }

    #[test]
    fn test_session_validity() {
        let session = Session::new(jwt_with_exp(1_000));
        assert!(session.is_valid(999));
        assert!(!session.is_valid(1_000));

        let opaque = Session::new("opaque-token".to_string());
        assert!(opaque.is_valid(i64::MAX));

        let empty = Session::new(String::new());
        assert!(!empty.is_valid(0));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("admin@example.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_connect_without_credentials_fails() {
        let client = PocketBaseClient::new("http://127.0.0.1:9", None, Duration::from_secs(1));
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_reset_clears_session() {
        let client = PocketBaseClient::new("http://127.0.0.1:9", None, Duration::from_secs(1));
        *client.session.write().await = Some(Session::new(jwt_with_exp(i64::MAX)));
        assert!(client.is_connected().await);
        assert!(client.connect().await.is_ok());

        client.reset().await;
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_expired_session_is_not_reused() {
        let client = PocketBaseClient::new("http://127.0.0.1:9", None, Duration::from_secs(1));
        *client.session.write().await = Some(Session::new(jwt_with_exp(1_000)));
        assert!(!client.is_connected().await);

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    mod http {
        use super::*;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Mutex;
        use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
        use tokio::net::{TcpListener, TcpStream};

        const EMPTY_PAGE: &str =
            r#"{"page":1,"perPage":500,"totalItems":0,"totalPages":0,"items":[]}"#;
        const NOT_FOUND: &str = r#"{"code":404,"message":"The requested resource wasn't found.","data":{}}"#;

        /// Minimal PocketBase stand-in serving one request per connection.
        struct StubServer {
            auth_status: u16,
            auth_body: String,
            auths: AtomicUsize,
            authorization: Mutex<Vec<String>>,
        }

        impl StubServer {
            async fn start(auth_status: u16, auth_body: String) -> (String, Arc<StubServer>) {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let url = format!("http://{}", listener.local_addr().unwrap());
                let server = Arc::new(StubServer {
                    auth_status,
                    auth_body,
                    auths: AtomicUsize::new(0),
                    authorization: Mutex::new(Vec::new()),
                });

                let handle = server.clone();
                tokio::spawn(async move {
                    while let Ok((stream, _)) = listener.accept().await {
                        let server = handle.clone();
                        tokio::spawn(async move {
                            let _ = server.handle(stream).await;
                        });
                    }
                });

                (url, server)
            }

            fn auths(&self) -> usize {
                self.auths.load(Ordering::SeqCst)
            }

            fn authorization(&self) -> Vec<String> {
                self.authorization.lock().unwrap().clone()
            }

            async fn handle(&self, stream: TcpStream) -> std::io::Result<()> {
                let (read, mut write) = stream.into_split();
                let mut reader = BufReader::new(read);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).await?;

                let mut content_length = 0;
                let mut authorization = String::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).await?;
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        match name.to_ascii_lowercase().as_str() {
                            "content-length" => content_length = value.trim().parse().unwrap_or(0),
                            "authorization" => authorization = value.trim().to_string(),
                            _ => {}
                        }
                    }
                }
                let mut body = vec![0; content_length];
                reader.read_exact(&mut body).await?;

                let path = request_line.split_whitespace().nth(1).unwrap_or_default();
                let (status, payload) = if path == "/api/admins/auth-with-password" {
                    self.auths.fetch_add(1, Ordering::SeqCst);
                    (self.auth_status, self.auth_body.clone())
                } else {
                    self.authorization.lock().unwrap().push(authorization);
                    if path.starts_with("/api/collections/missing/") {
                        (404, NOT_FOUND.to_string())
                    } else {
                        (200, EMPTY_PAGE.to_string())
                    }
                };

                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    payload.len(),
                    payload
                );
                write.write_all(response.as_bytes()).await?;
                write.shutdown().await
            }
        }

        fn client(url: &str) -> PocketBaseClient {
            PocketBaseClient::new(
                url,
                Some(Credentials::new("admin@example.com", "secret")),
                Duration::from_secs(5),
            )
        }

        #[tokio::test]
        async fn test_session_reused_until_reset() {
            let token = jwt_with_exp(4_000_000_000);
            let (url, server) =
                StubServer::start(200, format!(r#"{{"token":"{}","admin":{{}}}}"#, token)).await;
            let client = client(&url);

            client.connect().await.unwrap();
            let filter = Filter::eq("workOrderNumber", "IA-2026-123");
            assert!(client.full_list("jobs", &filter).await.unwrap().is_empty());
            assert!(client.full_list("jobs", &filter).await.unwrap().is_empty());
            assert_eq!(server.auths(), 1);
            assert_eq!(server.authorization(), [token.clone(), token.clone()]);

            client.reset().await;
            client.connect().await.unwrap();
            assert_eq!(server.auths(), 2);
            assert!(client.is_connected().await);
        }

        #[tokio::test]
        async fn test_expired_session_reauthenticates() {
            let token = jwt_with_exp(4_000_000_000);
            let (url, server) =
                StubServer::start(200, format!(r#"{{"token":"{}","admin":{{}}}}"#, token)).await;
            let client = client(&url);
            *client.session.write().await = Some(Session::new(jwt_with_exp(1_000)));

            client
                .first("jobs", &Filter::eq("id", "abc"))
                .await
                .unwrap();
            assert_eq!(server.auths(), 1);
            assert_eq!(server.authorization(), [token]);
        }

        #[tokio::test]
        async fn test_auth_rejection_message() {
            let (url, server) = StubServer::start(
                400,
                r#"{"code":400,"message":"Failed to authenticate.","data":{}}"#.to_string(),
            )
            .await;
            let client = client(&url);

            let err = client.connect().await.unwrap_err();
            assert_eq!(err.to_string(), "Auth failed: Failed to authenticate.");
            assert_eq!(server.auths(), 1);
            assert!(!client.is_connected().await);
        }

        #[tokio::test]
        async fn test_api_error_message() {
            let token = jwt_with_exp(4_000_000_000);
            let (url, _server) =
                StubServer::start(200, format!(r#"{{"token":"{}","admin":{{}}}}"#, token)).await;
            let client = client(&url);

            let err = client.delete("missing", "abc").await.unwrap_err();
            match err {
                StoreError::Api { status, message } => {
                    assert_eq!(status, 404);
                    assert_eq!(message, "The requested resource wasn't found.");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
