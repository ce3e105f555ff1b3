pub mod advisory;
pub mod agent;
pub mod config;
pub mod keywords;
pub mod routing;
pub mod types;

pub use types::*;
