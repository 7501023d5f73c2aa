use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::types::IssPosition;

#[derive(Debug, Error)]
pub enum IssError {
    #[error("ISS feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ISS feed returned malformed data: {0}")]
    Malformed(String),
}

/// Live ISS position from the open-notify feed.
pub struct IssFeed {
    url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OpenNotifyResponse {
    iss_position: OpenNotifyPosition,
    timestamp: i64,
}

// open-notify encodes the coordinates as strings
#[derive(Debug, Deserialize)]
struct OpenNotifyPosition {
    latitude: String,
    longitude: String,
}

impl IssFeed {
    pub fn new(url: String, timeout: Duration) -> Result<Self, IssError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, http })
    }

    pub async fn fetch(&self) -> Result<IssPosition, IssError> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_open_notify(&body)
    }
}

pub fn parse_open_notify(body: &str) -> Result<IssPosition, IssError> {
    let response: OpenNotifyResponse =
        serde_json::from_str(body).map_err(|e| IssError::Malformed(e.to_string()))?;

    let latitude = parse_coordinate(&response.iss_position.latitude)?;
    let longitude = parse_coordinate(&response.iss_position.longitude)?;

    Ok(IssPosition {
        latitude,
        longitude,
        timestamp: response.timestamp,
    })
}

fn parse_coordinate(raw: &str) -> Result<f64, IssError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| IssError::Malformed(format!("bad coordinate {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_payload() {
        let body = r#"{"message": "success", "timestamp": 1594738347,
            "iss_position": {"latitude": "-12.3456", "longitude": "101.0001"}}"#;
        let pos = parse_open_notify(body).unwrap();
        assert_eq!(pos.latitude, -12.3456);
        assert_eq!(pos.longitude, 101.0001);
        assert_eq!(pos.timestamp, 1594738347);
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(
            parse_open_notify("{}"),
            Err(IssError::Malformed(_))
        ));
        let bad = r#"{"timestamp": 1, "iss_position": {"latitude": "north", "longitude": "0"}}"#;
        assert!(matches!(parse_open_notify(bad), Err(IssError::Malformed(_))));
    }
}
