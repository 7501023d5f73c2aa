mod catalog;
mod error;
mod look_angles;
mod observer;
mod overhead;
mod position;
pub(crate) mod tle;

pub use catalog::{Catalog, CatalogError, CatalogSource, MAX_SEARCH_RESULTS};
pub use error::OrbitError;
pub use look_angles::look_angles;
pub use observer::{LocationError, Observer};
pub use overhead::{closest_overhead, MAX_CLOSEST};
pub use position::{subpoint, SubPoint};
pub use tle::{parse_tle_text, TleEntry};

pub const ISS_NORAD_ID: u32 = 25544;
