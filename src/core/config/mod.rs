pub mod data;
pub mod io;
pub mod printing;
pub mod resolve;

pub use data::{Config, ConfigKey};
pub use io::ConfigError;
pub use resolve::API_KEY_ENV;
