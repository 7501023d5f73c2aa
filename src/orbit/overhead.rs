use chrono::{DateTime, Utc};

use crate::orbit::{look_angles, subpoint, Observer, TleEntry};
use crate::types::TrackedBody;

/// Most satellites returned by a single "closest" lookup.
pub const MAX_CLOSEST: usize = 5;

/// Satellites within `radius_deg` of the observer's zenith, lowest first.
pub fn closest_overhead<'a>(
    observer: &Observer,
    entries: impl IntoIterator<Item = &'a TleEntry>,
    timestamp: DateTime<Utc>,
    radius_deg: f64,
    limit: usize,
) -> Vec<TrackedBody> {
    let min_elevation = 90.0 - radius_deg.clamp(0.0, 90.0);
    let mut found = Vec::new();

    for entry in entries {
        let angles = match look_angles(observer, entry, timestamp) {
            Ok(a) => a,
            Err(e) => {
                log::debug!("Skipping {} ({}): {}", entry.name, entry.norad_id, e);
                continue;
            }
        };
        if angles.elevation_deg < min_elevation {
            continue;
        }
        match subpoint(entry, timestamp) {
            Ok(sp) => found.push(TrackedBody::from_subpoint(entry, &sp)),
            Err(e) => log::debug!("Skipping {} ({}): {}", entry.name, entry.norad_id, e),
        }
    }

    found.sort_by(|a, b| a.altitude.total_cmp(&b.altitude));
    found.truncate(limit);
    found
}
