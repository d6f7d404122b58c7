use std::fmt;
use std::time::Duration;

use reqwest::{header, Method, RequestBuilder};
use serde::Serialize;

use crate::{CancellationSignal, ClientOptions, Document, GraylogError, Result};

/// Base URL and basic-auth credentials for one Graylog REST API.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl ClientCredentials {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated JSON client for a REST API rooted at a fixed base URL.
///
/// Every call is a single attempt: failures are returned, never retried.
/// Retrying belongs to [`crate::repeat_until`] and the predicates passed to it.
/// The underlying connection pool lives as long as the client and is released
/// when it is dropped.
pub struct ApiClient {
    http: reqwest::Client,
    credentials: ClientCredentials,
    options: ClientOptions,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish()
    }
}

impl ApiClient {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            options: ClientOptions::default(),
        }
    }

    /// Applies client options such as the per-request timeout.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Issues `GET <base>/<path>` and parses the JSON body.
    pub async fn get(&self, path: &str) -> Result<Document> {
        self.send(self.request(Method::GET, path), None).await
    }

    /// Like [`ApiClient::get`], but gives up with [`GraylogError::Cancelled`]
    /// once `signal` fires.
    pub async fn get_with_signal(
        &self,
        path: &str,
        signal: CancellationSignal,
    ) -> Result<Document> {
        self.send(self.request(Method::GET, path), Some(signal)).await
    }

    /// Issues a GET with URL-encoded query parameters.
    pub async fn get_with_query<K, V>(
        &self,
        path: &str,
        query: &[(K, V)],
        signal: Option<CancellationSignal>,
    ) -> Result<Document>
    where
        K: Serialize,
        V: Serialize,
    {
        let builder = self.request(Method::GET, path).query(query);
        self.send(builder, signal).await
    }

    /// Serializes `body` as JSON and issues `POST <base>/<path>`.
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Document>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send(builder, None).await
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.credentials.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);

        #[cfg(feature = "tracing")]
        tracing::debug!(%method, %url, "sending api request");

        self.http.request(method, url)
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        signal: Option<CancellationSignal>,
    ) -> Result<Document> {
        let request = builder
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(header::ACCEPT, "application/json")
            // Graylog rejects state-changing requests without this header.
            .header("X-Requested-By", "graylog-poll")
            .timeout(Duration::from_millis(self.options.timeout_ms));

        match signal {
            Some(signal) => {
                tokio::select! {
                    biased;
                    () = signal.cancelled() => Err(GraylogError::Cancelled),
                    result = Self::execute(request) => result,
                }
            }
            None => Self::execute(request).await,
        }
    }

    async fn execute(request: RequestBuilder) -> Result<Document> {
        let response = request.send().await.map_err(GraylogError::from_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(GraylogError::from_reqwest)?;

        if !status.is_success() {
            return Err(GraylogError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Document::parse(&body)
    }
}
