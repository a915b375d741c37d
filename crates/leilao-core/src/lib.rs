pub mod adapter;
pub mod app_config;
pub mod config;
pub mod error;
pub mod locations;
pub mod model;
pub mod resolver;

pub use adapter::{AdapterError, ListingAdapter};
pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use locations::{load_locations, LocationDescriptor, LocationsFile};
pub use model::{Auction, RawListing, SourceKind};
pub use resolver::Catalog;
