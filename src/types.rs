use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::orbit::{SubPoint, TleEntry};

/// A satellite (or the ISS) at a point in time, as shown on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackedBody {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Kilometres above the WGS-84 ellipsoid.
    pub altitude: f64,
    /// Kilometres per second.
    pub velocity: f64,
}

impl TrackedBody {
    pub fn from_subpoint(entry: &TleEntry, sp: &SubPoint) -> Self {
        Self {
            id: entry.norad_id.to_string(),
            name: entry.name.clone(),
            latitude: sp.latitude_deg,
            longitude: sp.longitude_deg,
            altitude: sp.altitude_km,
            velocity: sp.velocity_km_s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SatelliteSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IssPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Unix seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClosestRequest {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Observer altitude in metres.
    #[serde(default)]
    pub altitude: f64,
    /// Degrees from zenith.
    #[serde(default = "default_radius")]
    pub radius: u32,
}

fn default_radius() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_request_defaults() {
        let req: ClosestRequest =
            serde_json::from_str(r#"{"latitude": 10.5, "longitude": 20}"#).unwrap();
        assert_eq!(req.latitude, 10.5);
        assert_eq!(req.longitude, 20.0);
        assert_eq!(req.altitude, 0.0);
        assert_eq!(req.radius, 10);
    }

    #[test]
    fn tracked_body_wire_shape() {
        let body = TrackedBody {
            id: "25544".into(),
            name: "ISS (ZARYA)".into(),
            latitude: 1.0,
            longitude: 2.0,
            altitude: 420.0,
            velocity: 7.66,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["id"], "25544");
        assert_eq!(value["altitude"], 420.0);
        assert_eq!(value.as_object().unwrap().len(), 6);
    }
}
