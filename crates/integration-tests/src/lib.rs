mod cognito;

use std::sync::Once;
use std::time::Duration;
use std::{net::SocketAddr, path::PathBuf};

use config::Config;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use server::ServeConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use cognito::{CognitoCall, CognitoMock, USER_POOL_ID};

/// Header the API gateway forwards the proxy event in.
const EVENT_HEADER: &str = "x-apigateway-event";

pub fn get_test_cert_paths() -> (PathBuf, PathBuf) {
    let cert_path = PathBuf::from("test-certs/cert.pem");
    let key_path = PathBuf::from("test-certs/key.pem");

    (cert_path, key_path)
}

static INIT: Once = Once::new();

#[ctor::ctor]
fn init_crypto_provider() {
    INIT.call_once(|| {
        rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .expect("Failed to install default crypto provider");
    });
}

/// Test client for making HTTP requests to the test server
#[derive(Clone)]
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
    custom_headers: HeaderMap,
}

impl TestClient {
    /// Create a new test client for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            custom_headers: HeaderMap::new(),
        }
    }

    /// Create a new test client that accepts invalid TLS certificates
    pub fn new_with_tls(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .expect("Failed to create client with invalid cert acceptance");

        Self {
            base_url,
            client,
            custom_headers: HeaderMap::new(),
        }
    }

    /// A client whose requests carry the given authorizer claims, the way the
    /// API gateway forwards them.
    pub fn with_claims(&self, claims: Value) -> Self {
        let event = json!({
            "httpMethod": "ANY",
            "requestContext": {
                "authorizer": { "claims": claims }
            }
        });

        let mut client = self.clone();
        client.push_header(EVENT_HEADER, urlencoding::encode(&event.to_string()));
        client
    }

    /// A client for `username` with the given comma separated groups claim.
    pub fn as_user(&self, username: &str, groups: &str) -> Self {
        self.with_claims(json!({
            "sub": format!("{username}-sub"),
            "username": username,
            "cognito:groups": groups,
        }))
    }

    /// Add a custom header to be included in all requests
    pub fn push_header(&mut self, key: &str, value: impl AsRef<str>) {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).unwrap();
        let header_value = HeaderValue::from_str(value.as_ref()).unwrap();
        self.custom_headers.insert(header_name, header_value);
    }

    /// Send a POST request to the given path with JSON body
    pub async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> reqwest::Response {
        self.request(reqwest::Method::POST, path).json(body).send().await.unwrap()
    }

    /// Send a POST request to the given path with a URL encoded form body
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.request(reqwest::Method::POST, path).form(form).send().await.unwrap()
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.try_get(path).await.unwrap()
    }

    /// Send a GET request to the given path, returning Result instead of panicking
    pub async fn try_get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.request(reqwest::Method::GET, path).send().await
    }

    /// Create a request with the given method and path, including the custom headers
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .headers(self.custom_headers.clone())
    }

    /// Get the base URL of this test client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Status and JSON body of a response.
pub async fn status_and_json(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body = response.json().await.unwrap();

    (status, body)
}

pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    /// Configuration used by this test server
    pub config: Config,
    /// Cancellation tokens for test services (the Cognito mock)
    pub test_service_tokens: Vec<CancellationToken>,
    /// Handle to the server task
    _server_task_handle: tokio::task::JoinHandle<()>,
    /// Shutdown signal for the server
    server_shutdown_signal: CancellationToken,
}

impl TestServer {
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::default()
    }

    /// Start a new test server with the given TOML configuration
    async fn start(config_toml: &str, test_service_tokens: Vec<CancellationToken>) -> Self {
        // Write config to a temporary file and use the proper loader to ensure validation
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, config_toml).unwrap();

        let config = Config::load(&config_path).unwrap();

        // Find an available port
        let mut listener = TcpListener::bind("127.0.0.1:0").await;

        #[allow(clippy::panic)]
        while let Err(e) = listener {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                listener = TcpListener::bind("127.0.0.1:0").await;
            } else {
                panic!("Failed to bind to address: {e}");
            }
        }

        let listener = listener.unwrap();
        let address = listener.local_addr().unwrap();

        // Check if TLS is configured before moving config into spawn task
        let has_tls = config.server.tls.is_some();

        let server_shutdown_signal = CancellationToken::new();

        let serve_config = ServeConfig {
            listen_address: address,
            config: config.clone(),
            shutdown_signal: server_shutdown_signal.clone(),
            log_filter: "server=debug,groups=debug,directory=debug,config=debug,integration_tests=debug".to_string(),
        };

        // Start the server in a background task
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        let server_task_handle = tokio::spawn(async move {
            // Drop the listener so the server can bind to the address
            drop(listener);

            let _ = tx.send(server::serve(serve_config).await);
        });

        // Wait for the server to start up or fail
        tokio::time::sleep(Duration::from_millis(200)).await;

        #[allow(clippy::panic)]
        if let Ok(Err(e)) = rx.try_recv() {
            panic!("Server failed to start: {e}");
        }

        let protocol = if has_tls { "https" } else { "http" };
        let base_url = format!("{protocol}://{address}");

        let client = if has_tls {
            TestClient::new_with_tls(base_url)
        } else {
            TestClient::new(base_url)
        };

        // Verify the server is actually running
        let mut retries = 30;
        let mut last_error = None;

        while retries > 0 {
            match client.try_get(server::HEALTH_PATH).await {
                Ok(_) => break,
                Err(e) => {
                    last_error = Some(e);
                }
            }
            retries -= 1;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if retries == 0 {
            #[allow(clippy::panic)]
            if let Some(e) = last_error {
                panic!("Server failed to become ready after 30 retries. Last error: {e}");
            } else {
                panic!("Server failed to become ready after 30 retries. No specific error.");
            }
        }

        TestServer {
            client,
            address,
            config,
            test_service_tokens,
            _server_task_handle: server_task_handle,
            server_shutdown_signal,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for token in &self.test_service_tokens {
            token.cancel();
        }

        self.server_shutdown_signal.cancel();
    }
}

#[derive(Default)]
pub struct TestServerBuilder {
    config: String,
    /// Cancellation tokens for test services that will be spawned
    test_service_tokens: Vec<CancellationToken>,
}

impl TestServerBuilder {
    /// Spawn the Cognito mock and point the directory configuration at it
    pub async fn spawn_cognito(&mut self, cognito: &CognitoMock) {
        let (address, ct) = cognito.spawn().await;
        self.test_service_tokens.push(ct);

        let config = indoc::formatdoc! {r#"

            [directory]
            user_pool_id = "{USER_POOL_ID}"
            region = "us-east-1"
            access_key_id = "test-access-key"
            secret_access_key = "test-secret-key"
            base_url = "http://{address}"
        "#};

        self.config.push_str(&config);
    }

    pub async fn build(self, config: &str) -> TestServer {
        let mut final_config = config.to_string();

        final_config.push('\n');
        final_config.push_str(&self.config);

        TestServer::start(&final_config, self.test_service_tokens).await
    }
}
