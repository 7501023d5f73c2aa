use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::types::{ClosestRequest, IssPosition, SatelliteSummary, SearchRequest, TrackedBody};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {error}")]
    Server { status: u16, error: String },
}

/// The position service as the dashboard sees it.
#[allow(async_fn_in_trait)]
pub trait TrackerApi {
    async fn iss_position(&self) -> Result<IssPosition, ClientError>;
    async fn closest_satellites(
        &self,
        request: &ClosestRequest,
    ) -> Result<Vec<TrackedBody>, ClientError>;
    async fn search_satellites(&self, query: &str) -> Result<Vec<SatelliteSummary>, ClientError>;
    async fn satellite_position(&self, id: &str) -> Result<TrackedBody, ClientError>;
}

pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let text = response.text().await.unwrap_or_default();
        Err(server_error(status, &text))
    }
}

fn server_error(status: StatusCode, body: &str) -> ClientError {
    let error = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            message: Some(message),
        }) => format!("{} ({})", error, message),
        Ok(ErrorBody { error, .. }) => error,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.trim().to_string(),
    };
    ClientError::Server {
        status: status.as_u16(),
        error,
    }
}

impl TrackerApi for HttpApi {
    async fn iss_position(&self) -> Result<IssPosition, ClientError> {
        let response = self.http.get(self.url("/get_iss_position")).send().await?;
        Self::decode(response).await
    }

    async fn closest_satellites(
        &self,
        request: &ClosestRequest,
    ) -> Result<Vec<TrackedBody>, ClientError> {
        let response = self
            .http
            .post(self.url("/get_closest_satellites"))
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn search_satellites(&self, query: &str) -> Result<Vec<SatelliteSummary>, ClientError> {
        let request = SearchRequest {
            query: query.to_string(),
        };
        let response = self
            .http
            .post(self.url("/search_satellites"))
            .json(&request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn satellite_position(&self, id: &str) -> Result<TrackedBody, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/get_satellite_position/{}", id)))
            .send()
            .await?;
        Self::decode(response).await
    }
}
