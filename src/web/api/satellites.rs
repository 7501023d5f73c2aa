use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;

use crate::orbit::{closest_overhead, subpoint, Observer, TleEntry, MAX_CLOSEST, MAX_SEARCH_RESULTS};
use crate::types::{ClosestRequest, SatelliteSummary, SearchRequest, TrackedBody};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[utoipa::path(
    post,
    path = "/get_closest_satellites",
    tag = "satellites",
    request_body = ClosestRequest,
    responses(
        (
            status = 200,
            description = "Satellites near the observer's zenith, lowest first",
            body = Vec<TrackedBody>
        ),
        (status = 400, description = "Invalid coordinates or radius", body = ErrorResponse),
        (status = 503, description = "Catalog unavailable", body = ErrorResponse)
    )
)]
pub async fn closest_satellites(
    State(state): State<AppState>,
    payload: Result<Json<ClosestRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<TrackedBody>>> {
    let Json(request) = payload?;

    if request.radius > 90 {
        return Err(ApiError::Validation(format!(
            "radius must be within 0..=90, got {}",
            request.radius
        )));
    }
    let observer = Observer::new(request.latitude, request.longitude, request.altitude)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    state.refresh_catalog().await?;
    let catalog = state.catalog.read().await;

    let bodies = closest_overhead(
        &observer,
        catalog.entries(),
        Utc::now(),
        request.radius as f64,
        MAX_CLOSEST,
    );
    log::debug!(
        "{} satellites within {} deg of zenith at {:.3},{:.3}",
        bodies.len(),
        request.radius,
        observer.latitude_deg,
        observer.longitude_deg
    );

    Ok(Json(bodies))
}

#[utoipa::path(
    post,
    path = "/search_satellites",
    tag = "satellites",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching satellites", body = Vec<SatelliteSummary>),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 503, description = "Catalog unavailable", body = ErrorResponse)
    )
)]
pub async fn search_satellites(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<SatelliteSummary>>> {
    let Json(request) = payload?;

    if request.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".into()));
    }

    state.refresh_catalog().await?;
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.search(&request.query, MAX_SEARCH_RESULTS)))
}

#[utoipa::path(
    get,
    path = "/get_satellite_position/{id}",
    tag = "satellites",
    params(
        ("id" = String, Path, description = "NORAD catalog number (1-5 digits)")
    ),
    responses(
        (status = 200, description = "Current sub-point", body = TrackedBody),
        (status = 400, description = "Invalid satellite ID", body = ErrorResponse),
        (status = 404, description = "Satellite not found in TLE data", body = ErrorResponse),
        (status = 503, description = "CelesTrak unreachable", body = ErrorResponse)
    )
)]
pub async fn satellite_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TrackedBody>> {
    let norad_id =
        parse_norad_id(&id).ok_or_else(|| ApiError::Validation("Invalid satellite ID".into()))?;

    // A stale catalog is not fatal here; the id is looked up on its own below.
    if let Err(e) = state.refresh_catalog().await {
        log::warn!("Catalog refresh failed: {}", e);
    }

    {
        let catalog = state.catalog.read().await;
        if let Some(entry) = catalog.get(norad_id) {
            return locate(entry);
        }
    }

    state.look_up(norad_id).await?;
    let catalog = state.catalog.read().await;
    let entry = catalog
        .get(norad_id)
        .ok_or(ApiError::NotFound("satellite_not_found"))?;
    locate(entry)
}

fn locate(entry: &TleEntry) -> ApiResult<Json<TrackedBody>> {
    let sp = subpoint(entry, Utc::now())?;
    Ok(Json(TrackedBody::from_subpoint(entry, &sp)))
}

fn parse_norad_id(id: &str) -> Option<u32> {
    if id.is_empty() || id.len() > 5 || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}
