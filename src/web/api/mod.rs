pub mod error;
pub mod iss;
pub mod satellites;
