use axum::{extract::State, response::IntoResponse};

use crate::web::state::AppState;

use super::templates::DashboardTemplate;

pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = &state.config.dashboard;
    let location_js = match &dashboard.location {
        Some(loc) => format!("[{}, {}, {}]", loc.latitude, loc.longitude, loc.altitude_m),
        None => "null".to_string(),
    };

    DashboardTemplate {
        refresh_secs: dashboard.refresh_secs(),
        search_debounce_ms: dashboard.search_debounce.as_millis() as u64,
        radius: dashboard.radius,
        location_js,
    }
}
