use std::collections::HashSet;

use crate::dashboard::map::{MapView, MarkerKind, MarkerSpec};
use crate::types::{IssPosition, TrackedBody};

/// A marker on the map and the body it shows. `satellite_id` is only set for
/// pinned markers; nearby markers are anonymous and replaced every cycle.
#[derive(Debug, Clone)]
pub struct Marker<H> {
    pub handle: H,
    pub satellite_id: Option<String>,
    pub body: TrackedBody,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearbySummary {
    pub removed: usize,
    pub added: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    Created,
    Moved,
}

/// Keeps the map's markers in step with the latest fetched positions.
pub struct MarkerReconciler<M: MapView> {
    map: M,
    markers: Vec<Marker<M::Handle>>,
    centered: HashSet<String>,
    iss: Option<M::Handle>,
}

impl<M: MapView> MarkerReconciler<M> {
    pub fn new(map: M) -> Self {
        Self {
            map,
            markers: Vec::new(),
            centered: HashSet::new(),
            iss: None,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn markers(&self) -> &[Marker<M::Handle>] {
        &self.markers
    }

    pub fn pinned_ids(&self) -> Vec<String> {
        self.markers
            .iter()
            .filter_map(|m| m.satellite_id.clone())
            .collect()
    }

    pub fn body_for(&self, handle: &M::Handle) -> Option<&TrackedBody> {
        self.markers
            .iter()
            .find(|m| &m.handle == handle)
            .map(|m| &m.body)
    }

    /// Replace the previous batch of nearby markers with `bodies`. Bodies that
    /// already have a pinned marker are left to it.
    pub fn reconcile_nearby(&mut self, bodies: &[TrackedBody]) -> NearbySummary {
        let mut summary = NearbySummary::default();

        let map = &mut self.map;
        self.markers.retain(|m| {
            if m.satellite_id.is_some() {
                return true;
            }
            map.remove_marker(&m.handle);
            summary.removed += 1;
            false
        });

        let mut seen = HashSet::new();
        for body in bodies {
            if self.find_pinned(&body.id).is_some() || !seen.insert(body.id.as_str()) {
                summary.skipped += 1;
                continue;
            }
            let handle = self.map.add_marker(MarkerSpec {
                latitude: body.latitude,
                longitude: body.longitude,
                label: body.name.clone(),
                kind: MarkerKind::Nearby,
            });
            self.markers.push(Marker {
                handle,
                satellite_id: None,
                body: body.clone(),
            });
            summary.added += 1;
        }

        summary
    }

    /// Create or move the pinned marker for `body.id`. The view is centered
    /// only the first time an id is shown.
    pub fn upsert_pinned(&mut self, body: TrackedBody) -> PinOutcome {
        let outcome = match self.find_pinned(&body.id) {
            Some(index) => {
                let marker = &mut self.markers[index];
                self.map
                    .move_marker(&marker.handle, body.latitude, body.longitude);
                marker.body = body.clone();
                PinOutcome::Moved
            }
            None => {
                self.remove_nearby(&body.id);
                let handle = self.map.add_marker(MarkerSpec {
                    latitude: body.latitude,
                    longitude: body.longitude,
                    label: body.name.clone(),
                    kind: MarkerKind::Pinned,
                });
                self.markers.push(Marker {
                    handle,
                    satellite_id: Some(body.id.clone()),
                    body: body.clone(),
                });
                PinOutcome::Created
            }
        };

        if self.centered.insert(body.id.clone()) {
            self.map.center_on(body.latitude, body.longitude);
        }

        outcome
    }

    pub fn remove_pinned(&mut self, id: &str) -> bool {
        match self.find_pinned(id) {
            Some(index) => {
                let marker = self.markers.remove(index);
                self.map.remove_marker(&marker.handle);
                true
            }
            None => false,
        }
    }

    pub fn update_iss(&mut self, position: IssPosition) {
        if let Some(handle) = &self.iss {
            self.map
                .move_marker(handle, position.latitude, position.longitude);
            return;
        }

        let handle = self.map.add_marker(MarkerSpec {
            latitude: position.latitude,
            longitude: position.longitude,
            label: "ISS".to_string(),
            kind: MarkerKind::Iss,
        });
        self.map.center_on(position.latitude, position.longitude);
        self.iss = Some(handle);
    }

    /// Drop nearby markers showing `id`, which is about to get a pinned one.
    fn remove_nearby(&mut self, id: &str) {
        let map = &mut self.map;
        self.markers.retain(|m| {
            let duplicate = m.satellite_id.is_none() && m.body.id == id;
            if duplicate {
                map.remove_marker(&m.handle);
            }
            !duplicate
        });
    }

    fn find_pinned(&self, id: &str) -> Option<usize> {
        self.markers
            .iter()
            .position(|m| m.satellite_id.as_deref() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::map::HeadlessMap;

    fn body(id: &str, lat: f64, lon: f64) -> TrackedBody {
        TrackedBody {
            id: id.to_string(),
            name: format!("SAT {}", id),
            latitude: lat,
            longitude: lon,
            altitude: 500.0,
            velocity: 7.6,
        }
    }

    fn summary(removed: usize, added: usize, skipped: usize) -> NearbySummary {
        NearbySummary {
            removed,
            added,
            skipped,
        }
    }

    fn assert_unique_ids(reconciler: &MarkerReconciler<HeadlessMap>) {
        let ids = reconciler.pinned_ids();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate pinned ids: {:?}", ids);
        let iss = usize::from(reconciler.iss.is_some());
        assert_eq!(reconciler.markers().len() + iss, reconciler.map().len());
    }

    #[test]
    fn nearby_batches_replace_each_other() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());

        let first = reconciler.reconcile_nearby(&[body("A", 0.0, 0.0), body("B", 1.0, 1.0)]);
        assert_eq!(first, summary(0, 2, 0));
        let first_handles: Vec<_> = reconciler.markers().iter().map(|m| m.handle).collect();

        let second = reconciler.reconcile_nearby(&[body("A", 0.5, 0.5)]);
        assert_eq!(second, summary(2, 1, 0));
        for handle in first_handles {
            assert!(reconciler.map().get(&handle).is_none());
        }
        assert_eq!(reconciler.markers().len(), 1);
        assert!(reconciler.markers()[0].satellite_id.is_none());
        assert_unique_ids(&reconciler);
    }

    #[test]
    fn pinned_markers_survive_nearby_cycles() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        reconciler.upsert_pinned(body("A", 0.0, 0.0));
        reconciler.upsert_pinned(body("B", 1.0, 1.0));

        let nearby = reconciler.reconcile_nearby(&[body("A", 0.1, 0.1), body("C", 2.0, 2.0)]);
        assert_eq!(nearby, summary(0, 1, 1));

        let nearby = reconciler.reconcile_nearby(&[body("A", 0.2, 0.2)]);
        assert_eq!(nearby, summary(1, 0, 1));

        let mut pinned = reconciler.pinned_ids();
        pinned.sort();
        assert_eq!(pinned, vec!["A", "B"]);
        assert_unique_ids(&reconciler);
    }

    #[test]
    fn duplicate_ids_in_one_batch_are_drawn_once() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        let nearby = reconciler.reconcile_nearby(&[body("A", 0.0, 0.0), body("A", 0.0, 0.0)]);
        assert_eq!(nearby, summary(0, 1, 1));
    }

    #[test]
    fn upsert_moves_existing_marker_and_centers_once() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        assert_eq!(reconciler.upsert_pinned(body("A", 10.0, 20.0)), PinOutcome::Created);
        assert_eq!(reconciler.map().center(), Some((10.0, 20.0)));

        assert_eq!(reconciler.upsert_pinned(body("A", 11.0, 21.0)), PinOutcome::Moved);
        assert_eq!(reconciler.map().center(), Some((10.0, 20.0)));

        let marker = &reconciler.markers()[0];
        let drawn = reconciler.map().get(&marker.handle).unwrap();
        assert_eq!((drawn.latitude, drawn.longitude), (11.0, 21.0));
        assert_eq!(marker.body.latitude, 11.0);
        assert_eq!(reconciler.markers().len(), 1);
    }

    #[test]
    fn re_pinning_after_removal_does_not_recenter() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        reconciler.upsert_pinned(body("A", 10.0, 20.0));
        reconciler.upsert_pinned(body("B", -5.0, 5.0));
        assert!(reconciler.remove_pinned("A"));
        assert!(!reconciler.remove_pinned("A"));

        reconciler.upsert_pinned(body("A", 30.0, 40.0));
        assert_eq!(reconciler.map().center(), Some((-5.0, 5.0)));
        assert_unique_ids(&reconciler);
    }

    #[test]
    fn pinning_replaces_a_nearby_marker_for_the_same_id() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        reconciler.reconcile_nearby(&[body("A", 0.0, 0.0), body("B", 1.0, 1.0)]);
        let nearby_a = reconciler.markers()[0].handle;

        assert_eq!(reconciler.upsert_pinned(body("A", 0.1, 0.1)), PinOutcome::Created);
        assert!(reconciler.map().get(&nearby_a).is_none());
        assert_eq!(reconciler.map().len(), 2);
        let ids: Vec<_> = reconciler.markers().iter().map(|m| m.body.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_unique_ids(&reconciler);
    }

    #[test]
    fn clicked_marker_resolves_to_its_body() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        reconciler.reconcile_nearby(&[body("C", 3.0, 3.0)]);
        let handle = reconciler.markers()[0].handle;
        assert_eq!(reconciler.body_for(&handle).unwrap().id, "C");
    }

    #[test]
    fn iss_marker_is_created_once_and_moved() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        reconciler.update_iss(IssPosition {
            latitude: 1.0,
            longitude: 2.0,
            timestamp: 0,
        });
        reconciler.update_iss(IssPosition {
            latitude: 3.0,
            longitude: 4.0,
            timestamp: 5,
        });
        assert_eq!(reconciler.map().len(), 1);
        let (_, spec) = reconciler.map().markers().next().unwrap();
        assert_eq!((spec.latitude, spec.longitude), (3.0, 4.0));
        assert_eq!(spec.kind, MarkerKind::Iss);
        assert_eq!(reconciler.map().center(), Some((1.0, 2.0)));

        reconciler.reconcile_nearby(&[]);
        assert_eq!(reconciler.map().len(), 1);
    }

    #[test]
    fn arbitrary_fetch_sequences_keep_ids_unique() {
        let mut reconciler = MarkerReconciler::new(HeadlessMap::new());
        let ids = ["A", "B", "C", "D"];
        for round in 0..40usize {
            let batch: Vec<_> = (0..(round % 5))
                .map(|i| body(ids[(round + i) % ids.len()], i as f64, round as f64))
                .collect();
            if round % 3 == 0 {
                reconciler.upsert_pinned(body(ids[round % ids.len()], 0.0, 0.0));
            }
            if round % 7 == 0 {
                reconciler.remove_pinned(ids[(round / 7) % ids.len()]);
            }
            reconciler.reconcile_nearby(&batch);

            assert_unique_ids(&reconciler);
            let nearby: Vec<_> = reconciler
                .markers()
                .iter()
                .filter(|m| m.satellite_id.is_none())
                .map(|m| m.body.id.clone())
                .collect();
            let unique: HashSet<_> = nearby.iter().collect();
            assert_eq!(nearby.len(), unique.len());
            for id in &nearby {
                assert!(!reconciler.pinned_ids().contains(id));
            }
        }
    }
}
