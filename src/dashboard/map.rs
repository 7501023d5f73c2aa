use std::collections::BTreeMap;
use std::fmt;

/// How a marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MarkerKind {
    Iss,
    Nearby,
    Pinned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub kind: MarkerKind,
}

/// The map widget the session draws on.
pub trait MapView {
    type Handle: Clone + PartialEq + fmt::Debug;

    fn add_marker(&mut self, spec: MarkerSpec) -> Self::Handle;
    fn move_marker(&mut self, handle: &Self::Handle, latitude: f64, longitude: f64);
    fn remove_marker(&mut self, handle: &Self::Handle);
    fn center_on(&mut self, latitude: f64, longitude: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Map without a screen: keeps marker state in memory and logs every change.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    next_id: u64,
    markers: BTreeMap<MarkerId, MarkerSpec>,
    center: Option<(f64, f64)>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> impl Iterator<Item = (&MarkerId, &MarkerSpec)> {
        self.markers.iter()
    }

    #[cfg(test)]
    pub fn get(&self, id: &MarkerId) -> Option<&MarkerSpec> {
        self.markers.get(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn center(&self) -> Option<(f64, f64)> {
        self.center
    }
}

impl MapView for HeadlessMap {
    type Handle = MarkerId;

    fn add_marker(&mut self, spec: MarkerSpec) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        log::info!(
            "marker {} added: {} [{}] at {:.3}, {:.3}",
            id,
            spec.label,
            spec.kind,
            spec.latitude,
            spec.longitude
        );
        self.markers.insert(id, spec);
        id
    }

    fn move_marker(&mut self, handle: &MarkerId, latitude: f64, longitude: f64) {
        match self.markers.get_mut(handle) {
            Some(spec) => {
                log::debug!(
                    "marker {} moved: {} to {:.3}, {:.3}",
                    handle,
                    spec.label,
                    latitude,
                    longitude
                );
                spec.latitude = latitude;
                spec.longitude = longitude;
            }
            None => log::warn!("move of unknown marker {}", handle),
        }
    }

    fn remove_marker(&mut self, handle: &MarkerId) {
        if let Some(spec) = self.markers.remove(handle) {
            log::debug!("marker {} removed: {}", handle, spec.label);
        }
    }

    fn center_on(&mut self, latitude: f64, longitude: f64) {
        log::info!("view centered on {:.3}, {:.3}", latitude, longitude);
        self.center = Some((latitude, longitude));
    }
}
