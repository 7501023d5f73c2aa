use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use crate::types::{ClosestRequest, IssPosition, SatelliteSummary, SearchRequest, TrackedBody};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::iss::iss_position,
        super::api::satellites::closest_satellites,
        super::api::satellites::search_satellites,
        super::api::satellites::satellite_position,
    ),
    components(
        schemas(
            TrackedBody,
            SatelliteSummary,
            IssPosition,
            ClosestRequest,
            SearchRequest,
            ErrorResponse,
        )
    ),
    info(
        title = "Sat-Watch Position API",
        description = "Live positions for the ISS and catalogued satellites",
        version = "0.1.0"
    ),
    tags(
        (name = "satellites", description = "Satellite and ISS positions")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_position_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/get_iss_position",
            "/get_closest_satellites",
            "/search_satellites",
            "/get_satellite_position/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
