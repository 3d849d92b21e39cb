use std::fmt::{Display, Formatter};
use std::str::FromStr;

use async_trait::async_trait;
use derive_more::{Display, From, Into};
use isahc::http::uri::InvalidUri;
use isahc::http::Uri;
use isahc::{AsyncReadResponseExt, HttpClient, Request};
use serde::Deserialize;
use thiserror::Error;

use ledger_wire::entity::LedgerId;
use ledger_wire::envelope::{RequestEnvelope, ResponseEnvelope};

#[derive(Error, From, Debug)]
pub enum TransportError {
    #[error("json decoding: {0}")]
    Json(serde_json::Error),
    #[error("isahc: {0}")]
    Isahc(isahc::Error),
    #[error("http: {0}")]
    Http(isahc::http::Error),
    #[error("unsuccessful request: {0}")]
    UnsuccessfulRequest(String),
}

/// Channel to some node of the target ledger. Node selection, retries and
/// timeouts all live behind this boundary; the query pipeline surfaces
/// failures unchanged.
#[async_trait(?Send)]
pub trait Transport {
    /// Identity of the ledger this channel is connected to, when known.
    /// `None` leaves checksum validation with no target, so it trivially
    /// succeeds.
    fn ledger_id(&self) -> Option<&LedgerId>;

    /// Perform one request/response round trip against the node.
    async fn send(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, TransportError>;
}

#[derive(Debug, Clone, Into, Deserialize)]
#[serde(try_from = "String")]
pub struct Url(Uri);

impl TryFrom<String> for Url {
    type Error = InvalidUrl;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Url::from_str(&value)
    }
}

impl Display for Url {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Display)]
pub enum InvalidUrl {
    Uri(InvalidUri),
    NoScheme,
}

impl FromStr for Url {
    type Err = InvalidUrl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri = Uri::from_str(s).map_err(InvalidUrl::Uri)?;
        if uri.scheme_str().is_none() {
            return Err(InvalidUrl::NoScheme);
        }
        Ok(Url(uri))
    }
}

pub fn with_path(Url(uri): &Url, path: &str) -> Uri {
    isahc::http::uri::Builder::new()
        .scheme(uri.scheme_str().unwrap())
        .authority(uri.authority().unwrap().as_str())
        .path_and_query(path)
        .build()
        .unwrap()
}

/// HTTP channel to a single node's query endpoint.
#[derive(Clone)]
pub struct NodeHttpClient {
    pub client: HttpClient,
    pub base_url: Url,
    pub ledger_id: Option<LedgerId>,
}

impl NodeHttpClient {
    pub fn new(client: HttpClient, base_url: Url, ledger_id: Option<LedgerId>) -> Self {
        Self {
            client,
            base_url,
            ledger_id,
        }
    }
}

#[async_trait(?Send)]
impl Transport for NodeHttpClient {
    fn ledger_id(&self) -> Option<&LedgerId> {
        self.ledger_id.as_ref()
    }

    async fn send(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, TransportError> {
        let request = Request::post(with_path(&self.base_url, "/query"))
            .header("content-type", "application/json")
            .body(serde_json::to_vec(&request)?)?;
        let mut response = self.client.send_async(request).await?;
        if !response.status().is_success() {
            return Err(TransportError::UnsuccessfulRequest(format!(
                "expected 200 from /query, got {}",
                response.status()
            )));
        }
        Ok(response.json::<ResponseEnvelope>().await?)
    }
}
