use serde_json::json;
use tokio::sync::Mutex;

use crate::{
    not_ready_on_transport, repeat_until, ApiClient, ClientCredentials, Document, GraylogError,
    PollOptions, Result,
};

const INPUT_TITLE: &str = "graylog-poll";
const GELF_UDP_INPUT_TYPE: &str = "org.graylog2.inputs.gelf.udp.GELFUDPInput";

/// Connection settings for a Graylog instance under test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixtureOptions {
    pub host: String,
    /// REST API port.
    pub api_port: u16,
    /// Port of the GELF UDP input the fixture ensures.
    pub log_port: u16,
    pub username: String,
    pub password: String,
    /// Polling used while waiting for the API to come up.
    pub startup_poll: PollOptions,
    /// Polling used for every other wait.
    pub poll: PollOptions,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            api_port: 9000,
            log_port: 12201,
            username: "admin".to_owned(),
            password: "admin".to_owned(),
            startup_poll: PollOptions::new(2_000, 60_000),
            poll: PollOptions::default(),
        }
    }
}

impl FixtureOptions {
    /// Defaults, with the host taken from `GRAYLOG_HOST` when set and non-empty.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(host) = std::env::var("GRAYLOG_HOST") {
            if !host.trim().is_empty() {
                options.host = host.trim().to_owned();
            }
        }
        options
    }

    pub fn api_base_url(&self) -> String {
        format!("http://{}:{}/api/", self.host, self.api_port)
    }
}

/// Setup and observation sequences for tests that log into Graylog.
#[derive(Debug)]
pub struct GraylogFixture {
    client: ApiClient,
    options: FixtureOptions,
}

impl GraylogFixture {
    pub fn new(options: FixtureOptions) -> Self {
        let credentials = ClientCredentials::new(
            options.api_base_url(),
            options.username.clone(),
            options.password.clone(),
        );
        Self {
            client: ApiClient::new(credentials),
            options,
        }
    }

    pub fn from_env() -> Self {
        Self::new(FixtureOptions::from_env())
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn options(&self) -> &FixtureOptions {
        &self.options
    }

    /// Host and port GELF packets should be sent to.
    pub fn log_endpoint(&self) -> (&str, u16) {
        (&self.options.host, self.options.log_port)
    }

    /// Waits for the API, ensures the GELF UDP input and waits for it to run.
    ///
    /// Returns the input id.
    pub async fn initialize(&self) -> Result<String> {
        self.wait_for_api().await?;
        let input_id = self.ensure_udp_input().await?;
        self.wait_for_udp_input(&input_id).await?;
        Ok(input_id)
    }

    /// Polls `system/stats` until the API answers.
    ///
    /// The server may not be listening yet, so transport failures count as
    /// "not ready" here.
    pub async fn wait_for_api(&self) -> Result<()> {
        repeat_until("graylog api", &self.options.startup_poll, |signal| async move {
            not_ready_on_transport(
                self.client
                    .get_with_signal("system/stats", signal)
                    .await
                    .map(|_| true),
            )
        })
        .await
    }

    /// Returns the id of the GELF UDP input bound to the log port, creating it
    /// if none exists.
    pub async fn ensure_udp_input(&self) -> Result<String> {
        let existing = self.client.get("system/inputs").await?;
        let inputs = existing.array_at("inputs").ok_or_else(|| {
            GraylogError::Decode("missing 'inputs' array in system/inputs response".to_owned())
        })?;

        let port = u64::from(self.options.log_port);
        if let Some(input) = inputs
            .iter()
            .find(|input| input.u64_at("attributes.port") == Some(port))
        {
            return input.require_str("id").map(str::to_owned);
        }

        let request = json!({
            "title": INPUT_TITLE,
            "global": true,
            "type": GELF_UDP_INPUT_TYPE,
            "configuration": {
                "bind_address": "0.0.0.0",
                "decompress_size_limit": 8_388_608,
                "override_source": null,
                "port": self.options.log_port,
                "recv_buffer_size": 262_144
            }
        });
        let created = self.client.post("system/inputs", &request).await?;
        created.require_str("id").map(str::to_owned)
    }

    /// Polls the input's state until Graylog reports one.
    ///
    /// A 404 means the state is not registered yet. Transport failures are
    /// fatal: the API has already been reached once.
    pub async fn wait_for_udp_input(&self, input_id: &str) -> Result<()> {
        let path = format!("system/inputstates/{input_id}");
        let condition = format!("input {input_id} state");
        repeat_until(&condition, &self.options.poll, |signal| {
            let path = path.as_str();
            async move {
                match self.client.get_with_signal(path, signal).await {
                    Ok(state) => Ok(!state.is_null()),
                    Err(err) if err.is_not_found() => Ok(false),
                    Err(err) => Err(err),
                }
            }
        })
        .await
    }

    /// Polls the relative search until exactly `count` messages tagged with
    /// `test_id` are visible, and returns their `message` objects.
    ///
    /// Each evaluation replaces the previous result set.
    pub async fn wait_for_messages(&self, test_id: &str, count: usize) -> Result<Vec<Document>> {
        let query = format!("test_id:\"{test_id}\"");
        let params = [("query", query.as_str()), ("range", "60")];
        let condition = format!("{count} message(s) with {query}");
        let messages = Mutex::new(Vec::new());

        repeat_until(&condition, &self.options.poll, |signal| {
            let messages = &messages;
            let params = &params[..];
            async move {
                let result = self
                    .client
                    .get_with_query("search/universal/relative", params, Some(signal))
                    .await?;
                let found = result.array_at("messages").ok_or_else(|| {
                    GraylogError::Decode("missing 'messages' array in search response".to_owned())
                })?;
                let satisfied = found.len() == count;
                *messages.lock().await = found;
                Ok::<_, GraylogError>(satisfied)
            }
        })
        .await?;

        messages
            .into_inner()
            .into_iter()
            .map(|entry| {
                entry
                    .get("message")
                    .cloned()
                    .map(Document::new)
                    .ok_or_else(|| {
                        GraylogError::Decode("search result entry has no 'message'".to_owned())
                    })
            })
            .collect()
    }

    /// Waits for exactly one message tagged with `test_id`.
    pub async fn wait_for_message(&self, test_id: &str) -> Result<Document> {
        let mut messages = self.wait_for_messages(test_id, 1).await?;
        messages
            .pop()
            .ok_or_else(|| GraylogError::Decode("expected one message".to_owned()))
    }
}
