use askama::Template;
use askama_web::WebTemplate;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub refresh_secs: u32,
    pub search_debounce_ms: u64,
    pub radius: u32,
    /// JavaScript literal: `null` or `[lat, lon, altitude_m]`.
    pub location_js: String,
}
