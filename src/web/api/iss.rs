use axum::{extract::State, Json};
use chrono::Utc;

use crate::orbit::{subpoint, ISS_NORAD_ID};
use crate::types::IssPosition;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/get_iss_position",
    tag = "satellites",
    responses(
        (status = 200, description = "Current ISS position", body = IssPosition),
        (status = 503, description = "ISS feed unavailable", body = ErrorResponse)
    )
)]
pub async fn iss_position(State(state): State<AppState>) -> ApiResult<Json<IssPosition>> {
    let feed_error = match state.iss.fetch().await {
        Ok(position) => return Ok(Json(position)),
        Err(e) => e,
    };

    if !state.config.iss.catalog_fallback {
        return Err(feed_error.into());
    }

    log::warn!("ISS feed failed, propagating from catalog: {}", feed_error);
    if let Err(e) = state.refresh_catalog().await {
        log::warn!("Catalog refresh failed: {}", e);
    }

    let catalog = state.catalog.read().await;
    let Some(entry) = catalog.get(ISS_NORAD_ID) else {
        return Err(feed_error.into());
    };

    let now = Utc::now();
    let sp = subpoint(entry, now)?;
    Ok(Json(IssPosition {
        latitude: sp.latitude_deg,
        longitude: sp.longitude_deg,
        timestamp: now.timestamp(),
    }))
}
