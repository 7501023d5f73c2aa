use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::orbit::observer::{WGS84_A_KM, WGS84_E2};
use crate::orbit::{OrbitError, TleEntry};

/// Geodetic point beneath a satellite at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub velocity_km_s: f64,
}

/// TEME position and velocity plus the sidereal angle used to rotate them.
pub(crate) struct StateVector {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub gmst: f64,
}

pub(crate) fn propagate(
    entry: &TleEntry,
    timestamp: DateTime<Utc>,
) -> Result<StateVector, OrbitError> {
    let minutes = entry
        .elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| OrbitError::Propagation(e.to_string()))?;

    let prediction = entry
        .constants
        .propagate(minutes)
        .map_err(|e| OrbitError::Propagation(e.to_string()))?;

    let gmst =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));

    Ok(StateVector {
        position: prediction.position,
        velocity: prediction.velocity,
        gmst,
    })
}

pub fn subpoint(entry: &TleEntry, timestamp: DateTime<Utc>) -> Result<SubPoint, OrbitError> {
    let state = propagate(entry, timestamp)?;
    let ecef = teme_to_ecef_position(state.position, state.gmst);
    let (latitude_deg, longitude_deg, altitude_km) = ecef_to_geodetic(ecef);
    let v = state.velocity;

    Ok(SubPoint {
        latitude_deg,
        longitude_deg,
        altitude_km,
        velocity_km_s: (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt(),
    })
}

pub(crate) fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

/// ECEF (km) to WGS-84 latitude/longitude (degrees) and height (km).
pub(crate) fn ecef_to_geodetic(ecef: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = ecef;
    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    if p < 1e-9 {
        let b = WGS84_A_KM * (1.0 - WGS84_E2).sqrt();
        let lat = if z >= 0.0 { 90.0 } else { -90.0 };
        return (lat, lon.to_degrees(), z.abs() - b);
    }

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut height = 0.0;
    for _ in 0..6 {
        let sin_lat = lat.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        height = p / lat.cos() - n;
        lat = z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
    }

    (lat.to_degrees(), lon.to_degrees(), height)
}
