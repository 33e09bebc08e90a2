//! Single-attempt HTTP retrieval and outcome classification

use futures::Stream;
use reqwest::{Client, Response, StatusCode};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::HttpConfig;
use crate::models::{CaughtError, DownloadTarget};

/// Response body of a successful fetch.
///
/// Owns the response, so dropping it at any point closes the connection.
pub struct Body {
    response: Response,
}

impl Body {
    pub fn into_stream(self) -> impl Stream<Item = reqwest::Result<impl AsRef<[u8]>>> {
        self.response.bytes_stream()
    }
}

pub enum FetchOutcome {
    Success(Body),
    Failure(CaughtError),
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(http: &HttpConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder().user_agent(&http.user_agent);
        if let Some(timeout) = http.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Issue one GET for the target. Anything other than a 200 is a failure.
    pub async fn fetch(&self, target: &DownloadTarget) -> FetchOutcome {
        debug!("GET {}", target.uri);

        let response = match self.client.get(&target.uri).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Request for {} failed: {}", target.uri, e);
                return FetchOutcome::Failure(CaughtError::TransportFailure {
                    detail: describe(&e),
                });
            }
        };

        if response.status() != StatusCode::OK {
            debug!("{} answered {}", target.uri, response.status());
            return FetchOutcome::Failure(status_failure(&response));
        }

        FetchOutcome::Success(Body { response })
    }
}

fn status_failure(response: &Response) -> CaughtError {
    let status = response.status();

    let mut header: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in response.headers() {
        header
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    CaughtError::StatusFailure {
        status: format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
        status_code: status.as_u16(),
        header,
    }
}

/// Error text including its source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);

    while let Some(cause) = source {
        let text = cause.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = cause.source();
    }

    detail
}
