pub mod config;
pub mod error;
pub mod types;

pub use config::{CloudflareConfig, Config, GithubConfig};
pub use error::{Error, Result};
pub use types::*;
