pub mod client;
pub mod console;
pub mod map;
pub mod markers;
pub mod runner;
pub mod scheduler;
pub mod search;
pub mod session;

pub use client::HttpApi;
pub use map::HeadlessMap;
pub use session::{Session, SessionSettings};
