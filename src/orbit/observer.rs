use thiserror::Error;

// WGS-84
pub(crate) const WGS84_A_KM: f64 = 6378.137;
pub(crate) const WGS84_E2: f64 = 0.006_694_379_990_14;

#[derive(Debug, Error, PartialEq)]
pub enum LocationError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("altitude {0} is not a finite number")]
    Altitude(f64),
}

/// A point on the ground satellites are observed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Observer {
    pub fn new(
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_m: f64,
    ) -> Result<Self, LocationError> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(LocationError::Latitude(latitude_deg));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(LocationError::Longitude(longitude_deg));
        }
        if !altitude_m.is_finite() {
            return Err(LocationError::Altitude(altitude_m));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - WGS84_E2) + alt_km) * sin_lat,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(Observer::new(91.0, 0.0, 0.0), Err(LocationError::Latitude(91.0)));
        assert_eq!(
            Observer::new(0.0, 200.0, 0.0),
            Err(LocationError::Longitude(200.0))
        );
        assert!(Observer::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(Observer::new(0.0, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn accepts_boundaries() {
        assert!(Observer::new(90.0, 180.0, 0.0).is_ok());
        assert!(Observer::new(-90.0, -180.0, 0.0).is_ok());
    }

    #[test]
    fn equator_is_one_earth_radius_out() {
        let pos = Observer::new(0.0, 0.0, 0.0).unwrap().position_ecef_km();
        assert!((pos[0] - WGS84_A_KM).abs() < 1e-9);
        assert!(pos[1].abs() < 1e-9);
        assert!(pos[2].abs() < 1e-9);
    }
}
