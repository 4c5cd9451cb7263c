pub mod config;
pub mod error;
pub mod location;
pub mod record;

pub use config::LakeConfig;
pub use error::*;
pub use location::RootLocation;
pub use record::*;
