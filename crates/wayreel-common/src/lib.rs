pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, SocialCredentials};
pub use error::{Result, WayreelError};
