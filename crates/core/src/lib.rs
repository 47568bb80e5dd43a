pub mod config;
pub mod error;
pub mod params;

pub use config::HarnessConfig;
pub use error::*;
pub use params::*;
