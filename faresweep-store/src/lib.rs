pub mod app_config;
pub mod fare_finder;

pub use app_config::Config;
pub use fare_finder::FareFinderClient;
