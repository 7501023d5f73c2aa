use std::time::{Duration, Instant};

use crate::config::DashboardConfig;
use crate::dashboard::client::TrackerApi;
use crate::dashboard::console::Console;
use crate::dashboard::map::MapView;
use crate::dashboard::markers::{MarkerReconciler, PinOutcome};
use crate::dashboard::scheduler::PollScheduler;
use crate::dashboard::search::SearchBox;
use crate::orbit::{LocationError, Observer};
use crate::types::{ClosestRequest, SatelliteSummary, TrackedBody};

pub const INFO_PLACEHOLDER: &str = "Select a satellite to see its details.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshState {
    pub countdown_seconds_remaining: u32,
    pub location_known: bool,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub refresh_secs: u32,
    pub fixed_interval_refresh: bool,
    pub search_debounce: Duration,
    pub radius: u32,
    pub location: Option<Observer>,
}

impl SessionSettings {
    pub fn from_config(config: &DashboardConfig) -> Result<Self, LocationError> {
        Ok(Self {
            refresh_secs: config.refresh_secs(),
            fixed_interval_refresh: config.fixed_interval_refresh,
            search_debounce: config.search_debounce,
            radius: config.radius,
            location: config.observer()?,
        })
    }

    /// Put the observer at command line coordinates. The configured altitude
    /// is kept since the command line has no way to give one.
    pub fn override_position(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), LocationError> {
        let altitude_m = self.location.map_or(0.0, |o| o.altitude_m);
        self.location = Some(Observer::new(latitude, longitude, altitude_m)?);
        Ok(())
    }
}

/// One dashboard: everything the user can see and every action they can take.
pub struct Session<A: TrackerApi, M: MapView> {
    api: A,
    markers: MarkerReconciler<M>,
    scheduler: PollScheduler,
    location: Option<Observer>,
    radius: u32,
    search: SearchBox,
    results: Vec<SatelliteSummary>,
    selected: Option<TrackedBody>,
    console: Console,
    refreshes: u64,
}

impl<A: TrackerApi, M: MapView> Session<A, M> {
    pub fn new(api: A, map: M, settings: SessionSettings) -> Self {
        let mut scheduler = PollScheduler::new(settings.refresh_secs);
        if settings.fixed_interval_refresh {
            scheduler = scheduler.with_fixed_interval(settings.refresh_secs);
        }

        Self {
            api,
            markers: MarkerReconciler::new(map),
            scheduler,
            location: settings.location,
            radius: settings.radius,
            search: SearchBox::new(settings.search_debounce),
            results: Vec::new(),
            selected: None,
            console: Console::default(),
            refreshes: 0,
        }
    }

    pub fn refresh_state(&self) -> RefreshState {
        RefreshState {
            countdown_seconds_remaining: self.scheduler.remaining(),
            location_known: self.location.is_some(),
        }
    }

    pub fn location(&self) -> Option<Observer> {
        self.location
    }

    pub fn markers(&self) -> &MarkerReconciler<M> {
        &self.markers
    }

    pub fn results(&self) -> &[SatelliteSummary] {
        &self.results
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn refresh_period(&self) -> u32 {
        self.scheduler.period()
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    pub fn info_panel(&self) -> String {
        match &self.selected {
            Some(body) => format!(
                "{} ({}) lat {:.4} lon {:.4} alt {:.1} km vel {:.2} km/s",
                body.name, body.id, body.latitude, body.longitude, body.altitude, body.velocity
            ),
            None => INFO_PLACEHOLDER.to_string(),
        }
    }

    /// Advance the clock by one second, refreshing when a trigger fires.
    /// Returns whether a refresh ran.
    pub async fn tick(&mut self) -> bool {
        let outcome = self.scheduler.tick();
        if !outcome.should_refresh() {
            return false;
        }
        if outcome.countdown_fired && outcome.interval_fired {
            log::debug!("countdown and interval triggers coincided, refreshing once");
        }
        self.refresh().await;
        true
    }

    pub fn manual_refresh(&mut self) {
        self.scheduler.force_refresh();
    }

    /// Move the observer. Out-of-range coordinates are reported and ignored.
    pub fn set_location(
        &mut self,
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
    ) -> Result<(), LocationError> {
        match Observer::new(latitude, longitude, altitude_m) {
            Ok(observer) => {
                self.location = Some(observer);
                self.scheduler.force_refresh();
                self.console
                    .info(format!("Location set to {:.4}, {:.4}", latitude, longitude));
                Ok(())
            }
            Err(e) => {
                self.console.error(format!("Location rejected: {}", e));
                Err(e)
            }
        }
    }

    pub fn search_input(&mut self, query: &str, now: Instant) {
        self.search.input(query, now);
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Send the debounced query if its window has passed. Returns whether the
    /// results were touched.
    pub async fn poll_search(&mut self, now: Instant) -> bool {
        let Some(query) = self.search.take_due(now) else {
            return false;
        };

        if query.is_empty() {
            self.results.clear();
            return true;
        }

        match self.api.search_satellites(&query).await {
            Ok(hits) => {
                self.console
                    .info(format!("{} results for {:?}", hits.len(), query));
                self.results = hits;
            }
            Err(e) => self.console.error(format!("Search failed: {}", e)),
        }
        true
    }

    /// Pin a satellite and show it in the info panel.
    pub async fn track(&mut self, id: &str) {
        match self.api.satellite_position(id).await {
            Ok(body) => {
                self.selected = Some(body.clone());
                let name = body.name.clone();
                if self.markers.upsert_pinned(body) == PinOutcome::Created {
                    self.console.info(format!("Tracking {} ({})", name, id));
                }
            }
            Err(e) => self
                .console
                .error(format!("Satellite {} unavailable: {}", id, e)),
        }
    }

    /// Track the `index`-th search result.
    pub async fn pick(&mut self, index: usize) {
        let Some(hit) = self.results.get(index) else {
            self.console
                .error(format!("No search result number {}", index + 1));
            return;
        };
        let id = hit.id.clone();
        self.track(&id).await;
    }

    pub fn untrack(&mut self, id: &str) -> bool {
        let removed = self.markers.remove_pinned(id);
        if removed {
            if self.selected.as_ref().is_some_and(|b| b.id == id) {
                self.selected = None;
            }
            self.console.info(format!("Stopped tracking {}", id));
        }
        removed
    }

    pub fn marker_clicked(&mut self, handle: &M::Handle) -> Option<&TrackedBody> {
        let body = self.markers.body_for(handle)?.clone();
        self.selected = Some(body);
        self.selected.as_ref()
    }

    /// Fetch everything once. Each fetch fails on its own without touching
    /// the state the others produced.
    pub async fn refresh(&mut self) {
        self.refreshes += 1;

        match self.api.iss_position().await {
            Ok(position) => self.markers.update_iss(position),
            Err(e) => self
                .console
                .error(format!("ISS position unavailable: {}", e)),
        }

        if let Some(observer) = self.location {
            let request = ClosestRequest {
                latitude: observer.latitude_deg,
                longitude: observer.longitude_deg,
                altitude: observer.altitude_m,
                radius: self.radius,
            };
            match self.api.closest_satellites(&request).await {
                Ok(bodies) => {
                    let summary = self.markers.reconcile_nearby(&bodies);
                    log::debug!(
                        "nearby markers: {} removed, {} added, {} already pinned",
                        summary.removed,
                        summary.added,
                        summary.skipped
                    );
                }
                Err(e) => self
                    .console
                    .error(format!("Nearby satellites unavailable: {}", e)),
            }
        }

        for id in self.markers.pinned_ids() {
            match self.api.satellite_position(&id).await {
                Ok(body) => {
                    if let Some(selected) = self.selected.as_mut() {
                        if selected.id == body.id {
                            *selected = body.clone();
                        }
                    }
                    self.markers.upsert_pinned(body);
                }
                Err(e) => self
                    .console
                    .error(format!("Satellite {} update failed: {}", id, e)),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::dashboard::map::HeadlessMap;

    fn nearby_ids(session: &Session<FakeApi, HeadlessMap>) -> Vec<String> {
        session
            .markers()
            .markers()
            .iter()
            .filter(|m| m.satellite_id.is_none())
            .map(|m| m.body.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn refreshes_on_first_tick_then_every_ten_seconds() {
        let mut session = session(None);
        let mut refreshed = Vec::new();
        for second in 0..25 {
            if session.tick().await {
                refreshed.push(second);
            }
        }
        assert_eq!(refreshed, vec![0, 10, 20]);
        assert_eq!(session.api.calls_to("iss"), 3);
        assert_eq!(session.api.calls_to("closest"), 0);
        assert_eq!(session.markers().map().len(), 1);
    }

    #[tokio::test]
    async fn fixed_interval_adds_refreshes_but_never_doubles_a_tick() {
        let mut settings = settings(None);
        settings.fixed_interval_refresh = true;
        let mut session = Session::new(FakeApi::default(), HeadlessMap::new(), settings);

        let mut refreshed = Vec::new();
        for second in 0..21 {
            if session.tick().await {
                refreshed.push(second);
            }
        }
        assert_eq!(refreshed, vec![0, 9, 10, 19, 20]);
        assert_eq!(session.refreshes(), 5);
    }

    #[tokio::test]
    async fn manual_refresh_runs_on_the_next_tick() {
        let mut session = session(None);
        session.tick().await;
        assert!(!session.tick().await);

        session.manual_refresh();
        assert_eq!(session.refresh_state().countdown_seconds_remaining, 0);
        assert!(session.tick().await);
        assert_eq!(session.refresh_state().countdown_seconds_remaining, 10);
        assert_eq!(session.refreshes(), 2);
    }

    #[tokio::test]
    async fn setting_location_enables_nearby_fetches() {
        let mut session = session(None);
        session.tick().await;
        assert!(!session.refresh_state().location_known);

        session.set_location(48.5, 2.25, 0.0).unwrap();
        let state = session.refresh_state();
        assert!(state.location_known);
        assert_eq!(state.countdown_seconds_remaining, 0);

        session.api.closest.borrow_mut().push_back(Ok(vec![body("C", 48.0, 2.0)]));
        assert!(session.tick().await);
        assert_eq!(session.api.calls_to("closest 48.5 2.25 0 10"), 1);
        assert_eq!(nearby_ids(&session), vec!["C"]);
    }

    #[tokio::test]
    async fn configured_altitude_reaches_the_closest_request() {
        let yaml = "
dashboard:
  location:
    latitude: 52.5
    longitude: 13.4
    altitude_m: 1200
";
        let config = crate::config::Config::from_str(yaml).unwrap();
        let mut settings = SessionSettings::from_config(&config.dashboard).unwrap();
        let session = Session::new(FakeApi::default(), HeadlessMap::new(), settings.clone());
        assert_eq!(session.location().map(|o| o.altitude_m), Some(1200.0));

        settings.override_position(10.0, 20.0).unwrap();
        let mut session = Session::new(FakeApi::default(), HeadlessMap::new(), settings);
        assert!(session.tick().await);
        assert_eq!(session.api.calls_to("closest 10 20 1200 10"), 1);
    }

    #[test]
    fn override_position_validates_coordinates() {
        let mut settings = settings(None);
        assert_eq!(
            settings.override_position(91.0, 0.0),
            Err(LocationError::Latitude(91.0))
        );
        assert!(settings.location.is_none());

        settings.override_position(1.0, 2.0).unwrap();
        let observer = settings.location.unwrap();
        assert_eq!(
            (observer.latitude_deg, observer.longitude_deg, observer.altitude_m),
            (1.0, 2.0, 0.0)
        );
    }

    #[tokio::test]
    async fn typed_location_keeps_its_altitude() {
        let mut session = session(None);
        session.set_location(-33.9, 18.4, 350.0).unwrap();
        session.tick().await;
        assert_eq!(session.api.calls_to("closest -33.9 18.4 350 10"), 1);
    }

    #[tokio::test]
    async fn out_of_range_location_changes_nothing() {
        let observer = Observer::new(10.0, 20.0, 0.0).unwrap();
        let mut session = session(Some(observer));
        session.tick().await;
        let before = session.refresh_state();

        assert_eq!(
            session.set_location(91.0, 0.0, 0.0),
            Err(LocationError::Latitude(91.0))
        );
        assert_eq!(
            session.set_location(0.0, 200.0, 0.0),
            Err(LocationError::Longitude(200.0))
        );

        assert_eq!(session.refresh_state(), before);
        assert_eq!(session.location(), Some(observer));
        assert_eq!(session.console().errors(), 2);
    }

    #[tokio::test]
    async fn pinned_satellites_persist_when_absent_from_nearby() {
        let observer = Observer::new(0.0, 0.0, 0.0).unwrap();
        let mut session = session(Some(observer));
        session.api.set_position(body("A", 1.0, 1.0));
        session.api.set_position(body("B", 2.0, 2.0));
        session.track("A").await;
        session.track("B").await;

        session
            .api
            .closest
            .borrow_mut()
            .push_back(Ok(vec![body("A", 1.0, 1.0), body("B", 2.0, 2.0), body("C", 3.0, 3.0)]));
        session.refresh().await;
        assert_eq!(nearby_ids(&session), vec!["C"]);

        session.api.closest.borrow_mut().push_back(Ok(vec![body("A", 1.5, 1.5)]));
        session.refresh().await;
        assert!(nearby_ids(&session).is_empty());

        let mut pinned = session.markers().pinned_ids();
        pinned.sort();
        assert_eq!(pinned, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn failed_fetches_leave_markers_alone() {
        let observer = Observer::new(0.0, 0.0, 0.0).unwrap();
        let mut session = session(Some(observer));
        session.api.closest.borrow_mut().push_back(Ok(vec![body("C", 3.0, 3.0)]));
        session.refresh().await;

        session.api.iss.borrow_mut().push_back(Err(down()));
        session.api.closest.borrow_mut().push_back(Err(down()));
        session.refresh().await;

        assert_eq!(nearby_ids(&session), vec!["C"]);
        assert_eq!(session.markers().map().len(), 2);
        assert_eq!(session.console().errors(), 2);
    }

    #[tokio::test]
    async fn refresh_moves_pinned_markers_and_updates_the_info_panel() {
        let mut session = session(None);
        session.api.set_position(body("A", 1.0, 1.0));
        session.track("A").await;
        assert!(session.info_panel().starts_with("SAT A (A) lat 1.0000"));

        session.api.set_position(body("A", 5.0, 6.0));
        session.refresh().await;

        let marker = &session.markers().markers()[0];
        let drawn = session.markers().map().get(&marker.handle).unwrap();
        assert_eq!((drawn.latitude, drawn.longitude), (5.0, 6.0));
        assert!(session.info_panel().starts_with("SAT A (A) lat 5.0000"));
    }

    #[tokio::test]
    async fn failed_pinned_update_keeps_the_last_position() {
        let mut session = session(None);
        session.api.set_position(body("A", 1.0, 2.0));
        session.track("A").await;

        session.api.positions.borrow_mut().remove("A");
        session.refresh().await;

        assert_eq!(session.markers().pinned_ids(), vec!["A"]);
        let marker = &session.markers().markers()[0];
        let drawn = session.markers().map().get(&marker.handle).unwrap();
        assert_eq!((drawn.latitude, drawn.longitude), (1.0, 2.0));
        assert_eq!(session.console().errors(), 1);
        assert!(session
            .console()
            .last()
            .unwrap()
            .message
            .starts_with("Satellite A update failed"));
    }

    #[tokio::test]
    async fn tracking_a_nearby_satellite_replaces_its_nearby_marker() {
        let observer = Observer::new(0.0, 0.0, 0.0).unwrap();
        let mut session = session(Some(observer));
        session.api.closest.borrow_mut().push_back(Ok(vec![body("C", 3.0, 3.0)]));
        session.refresh().await;

        session.api.set_position(body("C", 3.1, 3.1));
        session.track("C").await;

        assert!(nearby_ids(&session).is_empty());
        assert_eq!(session.markers().pinned_ids(), vec!["C"]);
        // ISS plus the pinned marker.
        assert_eq!(session.markers().map().len(), 2);
    }

    #[tokio::test]
    async fn unknown_satellite_is_reported_not_pinned() {
        let mut session = session(None);
        session.track("99999").await;
        assert!(session.markers().pinned_ids().is_empty());
        assert_eq!(session.console().errors(), 1);
        assert_eq!(session.info_panel(), INFO_PLACEHOLDER);
    }

    #[tokio::test]
    async fn search_is_debounced_to_the_last_input() {
        let mut session = session(None);
        let start = Instant::now();
        session.api.search.borrow_mut().push_back(Ok(vec![SatelliteSummary {
            id: "25544".into(),
            name: "ISS (ZARYA)".into(),
        }]));

        session.search_input("is", start);
        session.search_input("iss", start + Duration::from_millis(300));
        assert!(!session.poll_search(start + Duration::from_millis(600)).await);
        assert!(session.poll_search(start + Duration::from_millis(800)).await);

        assert_eq!(session.api.calls_to("search"), 1);
        assert_eq!(session.api.calls_to("search iss"), 1);
        assert_eq!(session.results().len(), 1);
    }

    #[tokio::test]
    async fn blank_search_clears_results_without_a_request() {
        let mut session = session(None);
        let start = Instant::now();
        session.api.search.borrow_mut().push_back(Ok(vec![SatelliteSummary {
            id: "1".into(),
            name: "ONE".into(),
        }]));
        session.search_input("one", start);
        session.poll_search(start + Duration::from_secs(1)).await;
        assert_eq!(session.results().len(), 1);

        session.search_input("   ", start + Duration::from_secs(2));
        assert!(session.poll_search(start + Duration::from_secs(3)).await);
        assert!(session.results().is_empty());
        assert_eq!(session.api.calls_to("search"), 1);
    }

    #[tokio::test]
    async fn picking_a_result_tracks_it() {
        let mut session = session(None);
        let start = Instant::now();
        session.api.set_position(body("25544", 10.0, 10.0));
        session.api.search.borrow_mut().push_back(Ok(vec![SatelliteSummary {
            id: "25544".into(),
            name: "ISS (ZARYA)".into(),
        }]));
        session.search_input("iss", start);
        session.poll_search(start + Duration::from_secs(1)).await;

        session.pick(0).await;
        assert_eq!(session.markers().pinned_ids(), vec!["25544"]);
        assert_eq!(session.markers().map().center(), Some((10.0, 10.0)));

        session.pick(4).await;
        assert_eq!(session.console().errors(), 1);
    }

    #[tokio::test]
    async fn clicking_a_marker_shows_its_body() {
        let observer = Observer::new(0.0, 0.0, 0.0).unwrap();
        let mut session = session(Some(observer));
        session.api.closest.borrow_mut().push_back(Ok(vec![body("C", 3.0, 4.0)]));
        session.refresh().await;
        assert_eq!(session.info_panel(), INFO_PLACEHOLDER);

        let handle = session
            .markers()
            .markers()
            .iter()
            .find(|m| m.body.id == "C")
            .map(|m| m.handle)
            .unwrap();
        assert_eq!(session.marker_clicked(&handle).unwrap().id, "C");
        assert!(session.info_panel().contains("SAT C (C)"));
    }

    #[tokio::test]
    async fn untrack_removes_marker_and_selection() {
        let mut session = session(None);
        session.api.set_position(body("A", 1.0, 1.0));
        session.track("A").await;

        assert!(session.untrack("A"));
        assert!(!session.untrack("A"));
        assert!(session.markers().pinned_ids().is_empty());
        assert_eq!(session.info_panel(), INFO_PLACEHOLDER);
    }
}
